//! Class access checks and school-scoped teacher assignment.
//!
//! # Responsibility
//! - Decide whether an actor may operate on a class.
//! - Create class-teacher assignments only inside one school.
//!
//! # Invariants
//! - Access checks fail closed: missing profile, missing assignment and
//!   store errors all deny.
//! - A school mismatch never reaches the store as a write.

use crate::model::school::{ActorId, Class, ClassId, ClassTeacherAssignment, SchoolId};
use crate::repo::directory_repo::DirectoryRepository;
use crate::repo::RepoResult;
use crate::service::error::{ClassServiceError, ErrorKind};
use log::{error, info, warn};

/// Authorization gate over a directory repository.
pub struct AccessGuard<D: DirectoryRepository> {
    directory: D,
}

impl<D: DirectoryRepository> AccessGuard<D> {
    pub fn new(directory: D) -> Self {
        Self { directory }
    }

    /// Resolves the school of an actor profile.
    pub fn actor_school(&self, actor_id: ActorId) -> RepoResult<Option<SchoolId>> {
        self.directory.actor_school(actor_id)
    }

    pub fn find_class(&self, class_id: ClassId) -> RepoResult<Option<Class>> {
        self.directory.get_class(class_id)
    }

    /// Returns whether `actor_id` may operate on `class_id`.
    ///
    /// With `validate_school`, the actor's school is resolved first and the
    /// assignment only counts when it and the class carry that school. The
    /// assignment lookup itself always runs.
    pub fn verify_class_access(
        &self,
        class_id: ClassId,
        actor_id: ActorId,
        validate_school: bool,
    ) -> bool {
        match self.check_access(class_id, actor_id, validate_school) {
            Ok(allowed) => allowed,
            Err(err) => {
                error!(
                    "event=access_check module=service status=error class_id={class_id} actor_id={actor_id} error={err}"
                );
                false
            }
        }
    }

    /// Like [`Self::verify_class_access`] with school validation, but fails
    /// with `AccessDenied`.
    pub fn require_access(
        &self,
        class_id: ClassId,
        actor_id: ActorId,
    ) -> Result<(), ClassServiceError> {
        self.require_bulk_access(&[class_id], actor_id)
    }

    /// Checks every class and fails naming all denied ones.
    pub fn require_bulk_access(
        &self,
        class_ids: &[ClassId],
        actor_id: ActorId,
    ) -> Result<(), ClassServiceError> {
        let denied = class_ids
            .iter()
            .copied()
            .filter(|&class_id| !self.verify_class_access(class_id, actor_id, true))
            .collect::<Vec<_>>();

        if denied.is_empty() {
            return Ok(());
        }

        warn!(
            "event=access_check module=service status=denied actor_id={actor_id} denied_count={}",
            denied.len()
        );
        Err(ClassServiceError::AccessDenied {
            class_ids: denied,
            actor_id,
        })
    }

    /// Assigns `teacher_id` to `class_id` when both share one school.
    ///
    /// # Errors
    /// - `TeacherNotFound` / `ClassNotFound` when either side is missing.
    /// - `SchoolMismatch` when schools differ; nothing is written.
    /// - `Repo` when the insert fails, including an existing identical row.
    pub fn assign_teacher_to_class(
        &self,
        class_id: ClassId,
        teacher_id: ActorId,
    ) -> Result<(), ClassServiceError> {
        let teacher_school = self
            .directory
            .actor_school(teacher_id)?
            .ok_or(ClassServiceError::TeacherNotFound(teacher_id))?;
        let class = self
            .directory
            .get_class(class_id)?
            .ok_or(ClassServiceError::ClassNotFound(class_id))?;

        if teacher_school != class.school_id {
            warn!(
                "event=teacher_assign module=service status=rejected class_id={class_id} teacher_id={teacher_id} error_code={}",
                ErrorKind::SchoolMismatch
            );
            return Err(ClassServiceError::SchoolMismatch {
                class_id,
                teacher_id,
                teacher_school,
                class_school: class.school_id,
            });
        }

        self.directory
            .insert_assignment(&ClassTeacherAssignment::primary(
                class_id,
                teacher_id,
                teacher_school,
            ))?;
        info!(
            "event=teacher_assign module=service status=ok class_id={class_id} teacher_id={teacher_id} school_id={teacher_school}"
        );
        Ok(())
    }

    /// Removes an assignment. Returns whether one existed.
    pub fn remove_teacher_from_class(
        &self,
        class_id: ClassId,
        teacher_id: ActorId,
    ) -> Result<bool, ClassServiceError> {
        let removed = self.directory.delete_assignment(class_id, teacher_id)?;
        info!(
            "event=teacher_unassign module=service status=ok class_id={class_id} teacher_id={teacher_id} removed={removed}"
        );
        Ok(removed)
    }

    /// Assignment lookup scoped to an already resolved school.
    pub(crate) fn has_assignment(
        &self,
        class_id: ClassId,
        actor_id: ActorId,
        school_id: SchoolId,
    ) -> RepoResult<bool> {
        Ok(self
            .directory
            .find_assignment(class_id, actor_id, Some(school_id))?
            .is_some())
    }

    fn check_access(
        &self,
        class_id: ClassId,
        actor_id: ActorId,
        validate_school: bool,
    ) -> RepoResult<bool> {
        let school_id = if validate_school {
            match self.directory.actor_school(actor_id)? {
                Some(school_id) => Some(school_id),
                None => return Ok(false),
            }
        } else {
            None
        };

        Ok(self
            .directory
            .find_assignment(class_id, actor_id, school_id)?
            .is_some())
    }
}

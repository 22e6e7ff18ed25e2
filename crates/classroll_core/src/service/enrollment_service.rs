//! Enrollment use-case service.
//!
//! # Responsibility
//! - Admit students through the store's atomic admission procedure.
//! - Serve paginated, searchable class rosters behind the access guard.
//! - Remove enrollments one by one or in bulk.
//! - Page through the enrollment audit trail of a class.
//!
//! # Invariants
//! - The service never counts enrollments itself before inserting; capacity
//!   and duplicate decisions belong to the admission procedure.
//! - Precondition failures (`TeacherNotFound`, `AccessDenied`,
//!   `ClassNotFound`) abort before any store mutation.
//! - Nothing is cached between calls.

use crate::model::audit::{AuditAction, AuditEntry};
use crate::model::enrollment::{Boarding, Enrollment, Gender, StudentSummary};
use crate::model::school::{ActorId, ClassId, StudentId};
use crate::repo::directory_repo::DirectoryRepository;
use crate::repo::enrollment_repo::{
    AdmissionRequest, AuditQuery, AvailableQuery, EnrollmentRepository, RosterQuery,
    RosterSortField, SortOrder,
};
use crate::search::pattern::build_roster_filter;
use crate::service::access_guard::AccessGuard;
use crate::service::error::ClassServiceError;
use crate::service::paging::{PageLimits, AUDIT_PAGE_LIMITS};
use crate::service::result_aggregator::{
    aggregate_admissions, aggregate_removals, EnrollmentReport, RemovalReport,
};
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};

/// Single-student enrollment input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrollStudentRequest {
    pub student_id: StudentId,
    /// Epoch ms; the store clock is used when absent.
    #[serde(default)]
    pub enrolled_at: Option<i64>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl EnrollStudentRequest {
    pub fn new(student_id: StudentId) -> Self {
        Self {
            student_id,
            enrolled_at: None,
            notes: None,
        }
    }
}

/// Bulk enrollment input; date and notes apply to every admitted row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkEnrollRequest {
    pub student_ids: Vec<StudentId>,
    #[serde(default)]
    pub enrolled_at: Option<i64>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Roster listing options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RosterPageRequest {
    pub search_term: Option<String>,
    /// 1-based.
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub sort_by: RosterSortField,
    pub sort_order: SortOrder,
}

/// Options for listing students that can still be enrolled.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AvailableStudentsRequest {
    pub search_term: Option<String>,
    pub gender: Option<Gender>,
    pub boarding: Option<Boarding>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

/// One roster page with the totals a UI needs for paging.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RosterListResult {
    pub rows: Vec<StudentSummary>,
    pub total_count: u64,
    /// Effective 1-based page.
    pub page: u32,
    /// Effective page size after normalization.
    pub page_size: u32,
}

/// Audit trail listing options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditHistoryRequest {
    pub action: Option<AuditAction>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditHistoryResult {
    pub entries: Vec<AuditEntry>,
    pub total_count: u64,
    pub page: u32,
    pub page_size: u32,
}

/// Coordinates access checks, admission and roster queries for classes.
pub struct EnrollmentCoordinator<D: DirectoryRepository, E: EnrollmentRepository> {
    guard: AccessGuard<D>,
    enrollments: E,
    page_limits: PageLimits,
}

impl<D: DirectoryRepository, E: EnrollmentRepository> EnrollmentCoordinator<D, E> {
    pub fn new(directory: D, enrollments: E) -> Self {
        Self {
            guard: AccessGuard::new(directory),
            enrollments,
            page_limits: PageLimits::default(),
        }
    }

    /// Overrides roster page-size bounds.
    pub fn with_page_limits(mut self, page_limits: PageLimits) -> Self {
        self.page_limits = page_limits;
        self
    }

    pub fn guard(&self) -> &AccessGuard<D> {
        &self.guard
    }

    /// Admits `student_ids` to `class_id` on behalf of `actor_id`.
    ///
    /// Returns a mix of admissions and typed rejections; a rejection never
    /// aborts the batch.
    pub fn enroll_students(
        &self,
        class_id: ClassId,
        student_ids: &[StudentId],
        actor_id: ActorId,
    ) -> Result<EnrollmentReport, ClassServiceError> {
        let request = BulkEnrollRequest {
            student_ids: student_ids.to_vec(),
            ..BulkEnrollRequest::default()
        };
        self.enroll_students_with(class_id, &request, actor_id)
    }

    /// Bulk enrollment carrying enrollment date and notes.
    pub fn enroll_students_with(
        &self,
        class_id: ClassId,
        request: &BulkEnrollRequest,
        actor_id: ActorId,
    ) -> Result<EnrollmentReport, ClassServiceError> {
        let school_id = self
            .guard
            .actor_school(actor_id)?
            .ok_or(ClassServiceError::TeacherNotFound(actor_id))?;

        if !self.guard.has_assignment(class_id, actor_id, school_id)? {
            warn!(
                "event=enroll_students module=service status=denied class_id={class_id} actor_id={actor_id}"
            );
            return Err(ClassServiceError::AccessDenied {
                class_ids: vec![class_id],
                actor_id,
            });
        }

        let admission = AdmissionRequest {
            class_id,
            student_ids: request.student_ids.clone(),
            actor_id,
            school_id,
            enrolled_at: request.enrolled_at,
            notes: normalize_notes(request.notes.as_deref()),
        };
        let outcomes = self
            .enrollments
            .admit_students(&admission)
            .map_err(|err| {
                error!(
                    "event=enroll_students module=service status=error class_id={class_id} actor_id={actor_id} error_code=admission_failed error={err}"
                );
                ClassServiceError::EnrollmentFailed(err.to_string())
            })?;

        let report = aggregate_admissions(&request.student_ids, outcomes);
        info!(
            "event=enroll_students module=service status=ok class_id={class_id} actor_id={actor_id} requested={} admitted={} rejected={}",
            request.student_ids.len(),
            report.admitted.len(),
            report.rejected.len()
        );
        Ok(report)
    }

    /// Enrolls one student, surfacing its rejection as a typed error.
    pub fn enroll_student(
        &self,
        class_id: ClassId,
        request: &EnrollStudentRequest,
        actor_id: ActorId,
    ) -> Result<(), ClassServiceError> {
        let bulk = BulkEnrollRequest {
            student_ids: vec![request.student_id],
            enrolled_at: request.enrolled_at,
            notes: request.notes.clone(),
        };
        self.enroll_students_with(class_id, &bulk, actor_id)?
            .into_single(request.student_id)
    }

    /// Lists students enrolled in `class_id`.
    ///
    /// Access is verified before any roster query is issued. A blank search
    /// term means no filter at all.
    pub fn get_class_students(
        &self,
        class_id: ClassId,
        actor_id: ActorId,
        request: &RosterPageRequest,
    ) -> Result<RosterListResult, ClassServiceError> {
        self.guard.require_access(class_id, actor_id)?;

        let window = self.page_limits.window(request.page, request.page_size);
        let query = RosterQuery {
            class_id,
            filter: request.search_term.as_deref().and_then(build_roster_filter),
            sort_by: request.sort_by,
            sort_order: request.sort_order,
            offset: window.offset,
            limit: window.page_size,
        };
        let page = self.enrollments.find_roster(&query)?;
        debug!(
            "event=class_roster module=service status=ok class_id={class_id} filtered={} rows={} total={}",
            query.filter.is_some(),
            page.rows.len(),
            page.total_count
        );

        Ok(RosterListResult {
            rows: page.rows,
            total_count: page.total_count,
            page: window.page,
            page_size: window.page_size,
        })
    }

    /// Lists students of the class's school not yet enrolled in it.
    pub fn get_available_students(
        &self,
        class_id: ClassId,
        actor_id: ActorId,
        request: &AvailableStudentsRequest,
    ) -> Result<RosterListResult, ClassServiceError> {
        self.guard.require_access(class_id, actor_id)?;
        let class = self
            .guard
            .find_class(class_id)?
            .ok_or(ClassServiceError::ClassNotFound(class_id))?;

        let window = self.page_limits.window(request.page, request.page_size);
        let query = AvailableQuery {
            class_id,
            school_id: class.school_id,
            filter: request.search_term.as_deref().and_then(build_roster_filter),
            gender: request.gender,
            boarding: request.boarding,
            offset: window.offset,
            limit: window.page_size,
        };
        let page = self.enrollments.find_available(&query)?;

        Ok(RosterListResult {
            rows: page.rows,
            total_count: page.total_count,
            page: window.page,
            page_size: window.page_size,
        })
    }

    /// Removes one enrollment and returns the deleted row.
    pub fn remove_student(
        &self,
        class_id: ClassId,
        student_id: StudentId,
        actor_id: ActorId,
    ) -> Result<Enrollment, ClassServiceError> {
        self.guard.require_access(class_id, actor_id)?;
        self.remove_enrollment(class_id, student_id, actor_id)
    }

    /// Removes several enrollments; one failure does not stop the rest.
    pub fn bulk_remove_students(
        &self,
        class_id: ClassId,
        student_ids: &[StudentId],
        actor_id: ActorId,
    ) -> Result<RemovalReport, ClassServiceError> {
        self.guard.require_access(class_id, actor_id)?;

        let results = student_ids
            .iter()
            .map(|&student_id| {
                let result = self
                    .remove_enrollment(class_id, student_id, actor_id)
                    .map(|_| ());
                (student_id, result)
            })
            .collect::<Vec<_>>();
        Ok(aggregate_removals(results))
    }

    /// Lists audit entries of `class_id`, newest first.
    pub fn get_class_audit_history(
        &self,
        class_id: ClassId,
        actor_id: ActorId,
        request: &AuditHistoryRequest,
    ) -> Result<AuditHistoryResult, ClassServiceError> {
        self.guard.require_access(class_id, actor_id)?;

        let window = AUDIT_PAGE_LIMITS.window(request.page, request.page_size);
        let page = self.enrollments.class_audit_history(&AuditQuery {
            class_id,
            action: request.action,
            offset: window.offset,
            limit: window.page_size,
        })?;

        Ok(AuditHistoryResult {
            entries: page.entries,
            total_count: page.total_count,
            page: window.page,
            page_size: window.page_size,
        })
    }

    fn remove_enrollment(
        &self,
        class_id: ClassId,
        student_id: StudentId,
        actor_id: ActorId,
    ) -> Result<Enrollment, ClassServiceError> {
        let enrollment = self
            .enrollments
            .remove_enrollment(class_id, student_id, actor_id)?
            .ok_or(ClassServiceError::StudentNotEnrolled {
                class_id,
                student_id,
            })?;

        info!(
            "event=remove_student module=service status=ok class_id={class_id} student_id={student_id} actor_id={actor_id}"
        );
        Ok(enrollment)
    }
}

fn normalize_notes(notes: Option<&str>) -> Option<String> {
    notes
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::normalize_notes;

    #[test]
    fn blank_notes_are_dropped() {
        assert_eq!(normalize_notes(None), None);
        assert_eq!(normalize_notes(Some("   ")), None);
        assert_eq!(normalize_notes(Some(" transfer ")), Some("transfer".to_string()));
    }
}

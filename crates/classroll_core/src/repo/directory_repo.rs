//! Identity and authorization lookups.
//!
//! # Responsibility
//! - Resolve actor and class schools.
//! - Read, create and delete class-teacher assignments.
//!
//! # Invariants
//! - Lookups return `None` for absent rows; they never invent defaults.

use crate::model::school::{ActorId, Class, ClassId, ClassTeacherAssignment, SchoolId};
use crate::repo::{parse_uuid, RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension};

/// Row lookups over profiles, classes and `class_teachers`.
pub trait DirectoryRepository {
    /// School of any profile (teacher, admin or student).
    fn actor_school(&self, actor_id: ActorId) -> RepoResult<Option<SchoolId>>;
    fn get_class(&self, class_id: ClassId) -> RepoResult<Option<Class>>;
    /// Finds the assignment row for `(class_id, teacher_id)`.
    ///
    /// With `school_id` set, the row only counts when both the assignment
    /// and the class carry that school.
    fn find_assignment(
        &self,
        class_id: ClassId,
        teacher_id: ActorId,
        school_id: Option<SchoolId>,
    ) -> RepoResult<Option<ClassTeacherAssignment>>;
    fn insert_assignment(&self, assignment: &ClassTeacherAssignment) -> RepoResult<()>;
    /// Returns whether a row was deleted.
    fn delete_assignment(&self, class_id: ClassId, teacher_id: ActorId) -> RepoResult<bool>;
}

/// SQLite-backed directory repository.
pub struct SqliteDirectoryRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteDirectoryRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl DirectoryRepository for SqliteDirectoryRepository<'_> {
    fn actor_school(&self, actor_id: ActorId) -> RepoResult<Option<SchoolId>> {
        let school_id = self
            .conn
            .query_row(
                "SELECT school_id FROM profiles WHERE id = ?1;",
                [actor_id.to_string()],
                |row| row.get::<_, SchoolId>(0),
            )
            .optional()?;
        Ok(school_id)
    }

    fn get_class(&self, class_id: ClassId) -> RepoResult<Option<Class>> {
        let row = self
            .conn
            .query_row(
                "SELECT id, school_id, name, student_capacity FROM classes WHERE id = ?1;",
                [class_id],
                |row| {
                    Ok((
                        row.get::<_, ClassId>("id")?,
                        row.get::<_, SchoolId>("school_id")?,
                        row.get::<_, String>("name")?,
                        row.get::<_, i64>("student_capacity")?,
                    ))
                },
            )
            .optional()?;

        let Some((id, school_id, name, capacity)) = row else {
            return Ok(None);
        };
        let capacity = u32::try_from(capacity).map_err(|_| {
            RepoError::InvalidData(format!(
                "invalid capacity `{capacity}` in classes.student_capacity"
            ))
        })?;

        Ok(Some(Class {
            id,
            school_id,
            name,
            capacity,
        }))
    }

    fn find_assignment(
        &self,
        class_id: ClassId,
        teacher_id: ActorId,
        school_id: Option<SchoolId>,
    ) -> RepoResult<Option<ClassTeacherAssignment>> {
        let row = self
            .conn
            .query_row(
                "SELECT
                    ct.class_id AS class_id,
                    ct.user_id AS user_id,
                    ct.school_id AS school_id,
                    ct.role AS role
                 FROM class_teachers ct
                 INNER JOIN classes c ON c.id = ct.class_id
                 WHERE ct.class_id = ?1
                   AND ct.user_id = ?2
                   AND (?3 IS NULL OR (c.school_id = ?3 AND ct.school_id = ?3));",
                params![class_id, teacher_id.to_string(), school_id],
                |row| {
                    Ok((
                        row.get::<_, ClassId>("class_id")?,
                        row.get::<_, String>("user_id")?,
                        row.get::<_, SchoolId>("school_id")?,
                        row.get::<_, String>("role")?,
                    ))
                },
            )
            .optional()?;

        let Some((class_id, user_id, school_id, role)) = row else {
            return Ok(None);
        };

        Ok(Some(ClassTeacherAssignment {
            class_id,
            teacher_id: parse_uuid(&user_id, "class_teachers.user_id")?,
            school_id,
            role,
        }))
    }

    fn insert_assignment(&self, assignment: &ClassTeacherAssignment) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO class_teachers (class_id, user_id, school_id, role)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                assignment.class_id,
                assignment.teacher_id.to_string(),
                assignment.school_id,
                assignment.role.as_str(),
            ],
        )?;
        Ok(())
    }

    fn delete_assignment(&self, class_id: ClassId, teacher_id: ActorId) -> RepoResult<bool> {
        let changed = self.conn.execute(
            "DELETE FROM class_teachers WHERE class_id = ?1 AND user_id = ?2;",
            params![class_id, teacher_id.to_string()],
        )?;
        Ok(changed > 0)
    }
}

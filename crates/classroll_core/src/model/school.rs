//! Tenant, actor and class records.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Tenant isolation unit.
pub type SchoolId = i64;

/// Stable class identifier.
pub type ClassId = i64;

/// Profile id of the calling staff member, supplied by the session layer.
pub type ActorId = Uuid;

/// Profile id of a student.
pub type StudentId = Uuid;

/// Role stored on a profile row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileRole {
    Admin,
    Teacher,
    Student,
}

impl ProfileRole {
    /// Stable string stored in `profiles.role`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Teacher => "teacher",
            Self::Student => "student",
        }
    }
}

/// Class record as seen by the enrollment core.
///
/// Capacity is fixed when the class is provisioned and never changed here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Class {
    pub id: ClassId,
    pub school_id: SchoolId,
    pub name: String,
    pub capacity: u32,
}

/// Authorization fact: `teacher_id` may manage `class_id`.
///
/// # Invariants
/// - `school_id` equals both the teacher's and the class's school.
/// - Rows are created or deleted, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassTeacherAssignment {
    pub class_id: ClassId,
    pub teacher_id: ActorId,
    pub school_id: SchoolId,
    /// Free-form assignment role, `primary` unless stated otherwise.
    pub role: String,
}

impl ClassTeacherAssignment {
    pub fn primary(class_id: ClassId, teacher_id: ActorId, school_id: SchoolId) -> Self {
        Self {
            class_id,
            teacher_id,
            school_id,
            role: DEFAULT_ASSIGNMENT_ROLE.to_string(),
        }
    }
}

/// Role recorded when a caller does not choose one.
pub const DEFAULT_ASSIGNMENT_ROLE: &str = "primary";

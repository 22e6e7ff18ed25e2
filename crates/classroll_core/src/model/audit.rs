//! Audit trail entries for enrollment changes.

use crate::model::school::{ActorId, ClassId, StudentId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Table named on enrollment audit rows.
pub const ENROLLMENT_AUDIT_TABLE: &str = "class_students";

/// Enrollment change recorded in `audit_logs.action`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    EnrollStudent,
    RemoveStudent,
}

impl AuditAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::EnrollStudent => "enroll_student",
            Self::RemoveStudent => "remove_student",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "enroll_student" => Some(Self::EnrollStudent),
            "remove_student" => Some(Self::RemoveStudent),
            _ => None,
        }
    }

    /// Fields reported as changed by this action.
    pub fn changed_fields(self) -> &'static [&'static str] {
        match self {
            Self::EnrollStudent => &["student_id", "enrollment_date"],
            Self::RemoveStudent => &["removed_at"],
        }
    }
}

/// Record id of an enrollment audit row: `<class_id>-<student_id>`.
pub fn enrollment_record_id(class_id: ClassId, student_id: StudentId) -> String {
    format!("{class_id}-{student_id}")
}

/// One persisted audit row.
///
/// `old_values` is set for removals, `new_values` for enrollments; both hold
/// the serialized [`crate::model::enrollment::Enrollment`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: i64,
    pub table_name: String,
    pub record_id: String,
    pub class_id: ClassId,
    pub action: AuditAction,
    pub changed_fields: Vec<String>,
    pub old_values: Option<Value>,
    pub new_values: Option<Value>,
    pub performed_by: ActorId,
    /// Display name of the actor when the profile still exists.
    pub performed_by_name: Option<String>,
    /// Epoch milliseconds.
    pub performed_at: i64,
}

//! Closed error taxonomy for class access and enrollment.
//!
//! # Invariants
//! - Precondition failures abort a call before any mutation.
//! - Nothing here is retried by the core; retry policy belongs to callers.

use crate::model::school::{ActorId, ClassId, SchoolId, StudentId};
use crate::repo::RepoError;
use crate::service::result_aggregator::Rejection;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Stable error kind exposed to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    TeacherNotFound,
    ClassNotFound,
    SchoolMismatch,
    AccessDenied,
    ClassCapacityExceeded,
    StudentAlreadyEnrolled,
    /// Catch-all for unrecognized procedure failures and store errors.
    EnrollmentFailed,
    StudentNotEnrolled,
}

impl ErrorKind {
    /// Stable wire code.
    pub fn as_code(self) -> &'static str {
        match self {
            Self::TeacherNotFound => "TEACHER_NOT_FOUND",
            Self::ClassNotFound => "CLASS_NOT_FOUND",
            Self::SchoolMismatch => "SCHOOL_MISMATCH",
            Self::AccessDenied => "ACCESS_DENIED",
            Self::ClassCapacityExceeded => "CLASS_CAPACITY_EXCEEDED",
            Self::StudentAlreadyEnrolled => "STUDENT_ALREADY_ENROLLED",
            Self::EnrollmentFailed => "ENROLLMENT_FAILED",
            Self::StudentNotEnrolled => "STUDENT_NOT_ENROLLED",
        }
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_code())
    }
}

/// Service error for class access and enrollment use-cases.
#[derive(Debug)]
pub enum ClassServiceError {
    /// Actor profile (and therefore its school) could not be resolved.
    TeacherNotFound(ActorId),
    ClassNotFound(ClassId),
    /// Cross-tenant assignment attempt; nothing was written.
    SchoolMismatch {
        class_id: ClassId,
        teacher_id: ActorId,
        teacher_school: SchoolId,
        class_school: SchoolId,
    },
    /// Actor lacks an assignment to every listed class.
    AccessDenied {
        class_ids: Vec<ClassId>,
        actor_id: ActorId,
    },
    /// Single-student enrollment was rejected by the admission procedure.
    Rejected(Rejection),
    StudentNotEnrolled {
        class_id: ClassId,
        student_id: StudentId,
    },
    EnrollmentFailed(String),
    Repo(RepoError),
}

impl ClassServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::TeacherNotFound(_) => ErrorKind::TeacherNotFound,
            Self::ClassNotFound(_) => ErrorKind::ClassNotFound,
            Self::SchoolMismatch { .. } => ErrorKind::SchoolMismatch,
            Self::AccessDenied { .. } => ErrorKind::AccessDenied,
            Self::Rejected(rejection) => rejection.reason,
            Self::StudentNotEnrolled { .. } => ErrorKind::StudentNotEnrolled,
            Self::EnrollmentFailed(_) | Self::Repo(_) => ErrorKind::EnrollmentFailed,
        }
    }
}

impl Display for ClassServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TeacherNotFound(actor_id) => write!(f, "teacher profile not found: {actor_id}"),
            Self::ClassNotFound(class_id) => write!(f, "class not found: {class_id}"),
            Self::SchoolMismatch {
                class_id,
                teacher_id,
                teacher_school,
                class_school,
            } => write!(
                f,
                "teacher {teacher_id} (school {teacher_school}) and class {class_id} (school {class_school}) must belong to the same school"
            ),
            Self::AccessDenied {
                class_ids,
                actor_id,
            } => {
                let ids = class_ids
                    .iter()
                    .map(ClassId::to_string)
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "actor {actor_id} has no access to classes: {ids}")
            }
            Self::Rejected(rejection) => write!(
                f,
                "{} for student {}: {}",
                rejection.reason, rejection.student_id, rejection.message
            ),
            Self::StudentNotEnrolled {
                class_id,
                student_id,
            } => write!(f, "student {student_id} is not enrolled in class {class_id}"),
            Self::EnrollmentFailed(message) => write!(f, "enrollment failed: {message}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ClassServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ClassServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

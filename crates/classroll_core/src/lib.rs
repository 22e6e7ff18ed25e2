//! Core domain logic for class rosters.
//! This crate owns teacher-to-class access rules and enrollment admission.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod search;
pub mod service;

pub use config::CoreConfig;
pub use db::{open_db, open_db_in_memory, open_db_with_options, DbError, StoreOptions};
pub use logging::{init_logging, logging_status, LogLevel, LoggingError};
pub use model::audit::{AuditAction, AuditEntry};
pub use model::enrollment::{Boarding, Enrollment, EnrollmentStatus, Gender, StudentSummary};
pub use model::school::{ActorId, Class, ClassId, ClassTeacherAssignment, SchoolId, StudentId};
pub use repo::directory_repo::{DirectoryRepository, SqliteDirectoryRepository};
pub use repo::enrollment_repo::{
    EnrollmentRepository, RosterSortField, SortOrder, SqliteEnrollmentRepository,
};
pub use repo::{RepoError, RepoResult};
pub use search::pattern::{build_roster_filter, escape_pattern};
pub use service::access_guard::AccessGuard;
pub use service::enrollment_service::{
    AuditHistoryRequest, AuditHistoryResult, AvailableStudentsRequest, BulkEnrollRequest,
    EnrollStudentRequest, EnrollmentCoordinator, RosterListResult, RosterPageRequest,
};
pub use service::error::{ClassServiceError, ErrorKind};
pub use service::error_classifier::classify_failure;
pub use service::result_aggregator::{EnrollmentReport, Rejection, RemovalReport};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

//! Store collaborator contracts and SQLite implementations.
//!
//! # Responsibility
//! - Define row lookups, inserts and the atomic admission procedure the
//!   services depend on.
//! - Keep SQL details out of service orchestration.
//!
//! # Invariants
//! - Capacity and uniqueness of enrollments are decided inside one store
//!   transaction, never by the caller.
//! - Filter clauses are parsed and bound as parameters, never spliced into SQL.

use crate::db::DbError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod directory_repo;
pub mod enrollment_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for roster persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    /// Persisted data cannot be converted to a valid read model.
    InvalidData(String),
    /// Filter clause is malformed or names an unsupported field/operator.
    InvalidFilter(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted roster data: {message}"),
            Self::InvalidFilter(message) => write!(f, "invalid filter clause: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::InvalidData(_) => None,
            Self::InvalidFilter(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

pub(crate) fn parse_uuid(value: &str, column: &str) -> RepoResult<uuid::Uuid> {
    uuid::Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{value}` in {column}")))
}

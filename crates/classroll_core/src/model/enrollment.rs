//! Enrollment rows and the roster read models built on top of them.

use crate::model::school::{ClassId, StudentId};
use serde::{Deserialize, Serialize};

/// Lifecycle state stored on an enrollment row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrollmentStatus {
    Active,
    Inactive,
}

impl EnrollmentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "active" => Some(Self::Active),
            "inactive" => Some(Self::Inactive),
            _ => None,
        }
    }
}

/// Student gender as recorded in `student_details`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "male" => Some(Self::Male),
            "female" => Some(Self::Female),
            _ => None,
        }
    }
}

/// Whether a student lives on campus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Boarding {
    Day,
    Boarding,
}

impl Boarding {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Boarding => "boarding",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "day" => Some(Self::Day),
            "boarding" => Some(Self::Boarding),
            _ => None,
        }
    }
}

/// One persisted enrollment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enrollment {
    pub class_id: ClassId,
    pub student_id: StudentId,
    /// Epoch milliseconds.
    pub enrollment_date: i64,
    pub notes: Option<String>,
    pub status: EnrollmentStatus,
}

/// Searchable student projection used by roster listings.
///
/// Enrollment fields are `None` for students listed as available (not yet
/// enrolled).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentSummary {
    pub student_id: StudentId,
    pub full_name: String,
    /// School-issued external id.
    pub nis: Option<String>,
    pub gender: Option<Gender>,
    pub boarding: Option<Boarding>,
    pub enrollment_date: Option<i64>,
    pub notes: Option<String>,
    pub status: Option<EnrollmentStatus>,
}

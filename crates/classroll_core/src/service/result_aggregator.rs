//! Shapes per-item store results into caller-facing reports.
//!
//! # Invariants
//! - Every requested id appears exactly once, either admitted or rejected.
//! - Duplicate ids in a request are matched to outcomes in order.

use crate::model::school::StudentId;
use crate::repo::enrollment_repo::{AdmissionDecision, AdmissionOutcome};
use crate::service::error::{ClassServiceError, ErrorKind};
use crate::service::error_classifier::classify_failure;
use log::warn;
use serde::Serialize;
use std::collections::{HashMap, VecDeque};

const MISSING_OUTCOME_MESSAGE: &str = "admission returned no outcome for student";

/// One student that was not admitted (or not removed).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rejection {
    pub student_id: StudentId,
    pub reason: ErrorKind,
    /// Raw store text, kept for diagnostics.
    pub message: String,
}

/// Result of a bulk enrollment call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EnrollmentReport {
    pub admitted: Vec<StudentId>,
    pub rejected: Vec<Rejection>,
}

impl EnrollmentReport {
    /// Converts the report into the single-student result for `student_id`.
    pub fn into_single(self, student_id: StudentId) -> Result<(), ClassServiceError> {
        if self.admitted.contains(&student_id) {
            return Ok(());
        }
        match self
            .rejected
            .into_iter()
            .find(|rejection| rejection.student_id == student_id)
        {
            Some(rejection) => Err(ClassServiceError::Rejected(rejection)),
            None => Err(ClassServiceError::EnrollmentFailed(
                MISSING_OUTCOME_MESSAGE.to_string(),
            )),
        }
    }
}

/// Result of a bulk removal call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RemovalReport {
    pub removed: Vec<StudentId>,
    pub failed: Vec<Rejection>,
}

/// Matches admission outcomes back to the requested ids.
///
/// Ids without an outcome become `EnrollmentFailed` rejections; outcomes for
/// ids that were never requested are dropped.
pub fn aggregate_admissions(
    requested: &[StudentId],
    outcomes: Vec<AdmissionOutcome>,
) -> EnrollmentReport {
    let mut by_student: HashMap<StudentId, VecDeque<AdmissionDecision>> = HashMap::new();
    for outcome in outcomes {
        by_student
            .entry(outcome.student_id)
            .or_default()
            .push_back(outcome.decision);
    }

    let mut report = EnrollmentReport::default();
    for &student_id in requested {
        let decision = by_student
            .get_mut(&student_id)
            .and_then(VecDeque::pop_front);
        match decision {
            Some(AdmissionDecision::Admitted) => report.admitted.push(student_id),
            Some(AdmissionDecision::Rejected(message)) => report.rejected.push(Rejection {
                student_id,
                reason: classify_failure(&message),
                message,
            }),
            None => report.rejected.push(Rejection {
                student_id,
                reason: ErrorKind::EnrollmentFailed,
                message: MISSING_OUTCOME_MESSAGE.to_string(),
            }),
        }
    }

    let unmatched = by_student.values().map(VecDeque::len).sum::<usize>();
    if unmatched > 0 {
        warn!("event=admission_aggregate module=service status=warn unmatched_outcomes={unmatched}");
    }

    report
}

/// Splits independent per-item results into a removal report.
pub fn aggregate_removals(
    results: impl IntoIterator<Item = (StudentId, Result<(), ClassServiceError>)>,
) -> RemovalReport {
    let mut report = RemovalReport::default();
    for (student_id, result) in results {
        match result {
            Ok(()) => report.removed.push(student_id),
            Err(err) => report.failed.push(Rejection {
                student_id,
                reason: err.kind(),
                message: err.to_string(),
            }),
        }
    }
    report
}

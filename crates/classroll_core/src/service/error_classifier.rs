//! Maps raw store failure text onto [`ErrorKind`].
//!
//! Checks run in a fixed order and only fire on a recognizable phrase; any
//! other text, including empty transport errors, stays `EnrollmentFailed`.

use crate::service::error::ErrorKind;
use once_cell::sync::Lazy;
use regex::Regex;

static CAPACITY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)capacity\s+exceeded").expect("valid capacity regex"));
static ALREADY_ENROLLED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)already\s+enrolled").expect("valid enrolled regex"));
static ACCESS_DENIED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)access\s+denied").expect("valid access regex"));
static CLASS_NOT_FOUND_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)class\s+not\s+found").expect("valid class regex"));

/// Classifies one raw failure message.
pub fn classify_failure(raw: &str) -> ErrorKind {
    if CAPACITY_RE.is_match(raw) {
        ErrorKind::ClassCapacityExceeded
    } else if ALREADY_ENROLLED_RE.is_match(raw) {
        ErrorKind::StudentAlreadyEnrolled
    } else if ACCESS_DENIED_RE.is_match(raw) {
        ErrorKind::AccessDenied
    } else if CLASS_NOT_FOUND_RE.is_match(raw) {
        ErrorKind::ClassNotFound
    } else {
        ErrorKind::EnrollmentFailed
    }
}

#[cfg(test)]
mod tests {
    use super::classify_failure;
    use crate::repo::enrollment_repo::{
        REASON_ACCESS_DENIED, REASON_ALREADY_ENROLLED, REASON_CAPACITY_EXCEEDED,
        REASON_CLASS_NOT_FOUND, REASON_STUDENT_NOT_FOUND,
    };
    use crate::service::error::ErrorKind;

    #[test]
    fn classifies_store_reasons() {
        assert_eq!(
            classify_failure(REASON_CAPACITY_EXCEEDED),
            ErrorKind::ClassCapacityExceeded
        );
        assert_eq!(
            classify_failure(REASON_ALREADY_ENROLLED),
            ErrorKind::StudentAlreadyEnrolled
        );
        assert_eq!(
            classify_failure(REASON_ACCESS_DENIED),
            ErrorKind::AccessDenied
        );
        assert_eq!(
            classify_failure(REASON_CLASS_NOT_FOUND),
            ErrorKind::ClassNotFound
        );
    }

    #[test]
    fn tolerates_case_and_spacing() {
        assert_eq!(
            classify_failure("CAPACITY   EXCEEDED for class 7"),
            ErrorKind::ClassCapacityExceeded
        );
        assert_eq!(
            classify_failure("student Already\nEnrolled"),
            ErrorKind::StudentAlreadyEnrolled
        );
    }

    #[test]
    fn capacity_wins_when_both_phrases_appear() {
        assert_eq!(
            classify_failure("already enrolled; capacity exceeded"),
            ErrorKind::ClassCapacityExceeded
        );
    }

    #[test]
    fn unknown_text_stays_generic() {
        assert_eq!(
            classify_failure(REASON_STUDENT_NOT_FOUND),
            ErrorKind::EnrollmentFailed
        );
        assert_eq!(classify_failure(""), ErrorKind::EnrollmentFailed);
        assert_eq!(
            classify_failure("connection reset by peer"),
            ErrorKind::EnrollmentFailed
        );
        assert_eq!(classify_failure("capacity"), ErrorKind::EnrollmentFailed);
    }
}

mod common;

use classroll_core::repo::enrollment_repo::{
    AdmissionOutcome, AdmissionRequest, AuditPage, AuditQuery, AvailableQuery, RosterPage,
    RosterQuery,
};
use classroll_core::{
    classify_failure, open_db_in_memory, ActorId, AuditAction, AuditHistoryRequest,
    BulkEnrollRequest, ClassId, ClassServiceError, EnrollStudentRequest, Enrollment,
    EnrollmentCoordinator, EnrollmentRepository, ErrorKind, RepoError, RepoResult,
    SqliteDirectoryRepository, SqliteEnrollmentRepository, StudentId,
};
use common::{count_enrollments, insert_school, insert_student, insert_teacher, seed_class};
use rusqlite::{params, Connection};
use uuid::Uuid;

fn coordinator(
    conn: &Connection,
) -> EnrollmentCoordinator<SqliteDirectoryRepository<'_>, SqliteEnrollmentRepository<'_>> {
    EnrollmentCoordinator::new(
        SqliteDirectoryRepository::new(conn),
        SqliteEnrollmentRepository::new(conn),
    )
}

#[test]
fn admits_until_capacity_then_rejects_the_rest() {
    let conn = open_db_in_memory().unwrap();
    let fixture = seed_class(&conn, 2);
    let a = insert_student(&conn, 1, "Ayu", "1001");
    let b = insert_student(&conn, 1, "Budi", "1002");
    let c = insert_student(&conn, 1, "Citra", "1003");

    let report = coordinator(&conn)
        .enroll_students(fixture.class_id, &[a, b, c], fixture.teacher_id)
        .unwrap();

    assert_eq!(report.admitted, vec![a, b]);
    assert_eq!(report.rejected.len(), 1);
    assert_eq!(report.rejected[0].student_id, c);
    assert_eq!(report.rejected[0].reason, ErrorKind::ClassCapacityExceeded);
    assert_eq!(count_enrollments(&conn, fixture.class_id), 2);
}

#[test]
fn rerun_reports_already_enrolled_students() {
    let conn = open_db_in_memory().unwrap();
    let fixture = seed_class(&conn, 5);
    let a = insert_student(&conn, 1, "Ayu", "1001");
    let service = coordinator(&conn);

    service
        .enroll_students(fixture.class_id, &[a], fixture.teacher_id)
        .unwrap();
    let report = service
        .enroll_students(fixture.class_id, &[a], fixture.teacher_id)
        .unwrap();

    assert!(report.admitted.is_empty());
    assert_eq!(report.rejected[0].reason, ErrorKind::StudentAlreadyEnrolled);
    assert_eq!(count_enrollments(&conn, fixture.class_id), 1);
}

#[test]
fn duplicate_ids_in_one_request_are_admitted_once() {
    let conn = open_db_in_memory().unwrap();
    let fixture = seed_class(&conn, 5);
    let a = insert_student(&conn, 1, "Ayu", "1001");

    let report = coordinator(&conn)
        .enroll_students(fixture.class_id, &[a, a], fixture.teacher_id)
        .unwrap();

    assert_eq!(report.admitted, vec![a]);
    assert_eq!(report.rejected.len(), 1);
    assert_eq!(report.rejected[0].reason, ErrorKind::StudentAlreadyEnrolled);
}

#[test]
fn unknown_and_foreign_students_fall_back_to_generic_failure() {
    let conn = open_db_in_memory().unwrap();
    let fixture = seed_class(&conn, 5);
    insert_school(&conn, 2);
    let foreign = insert_student(&conn, 2, "Dewi", "2001");
    let unknown = Uuid::new_v4();

    let report = coordinator(&conn)
        .enroll_students(fixture.class_id, &[unknown, foreign], fixture.teacher_id)
        .unwrap();

    assert!(report.admitted.is_empty());
    assert_eq!(report.rejected.len(), 2);
    for rejection in &report.rejected {
        assert_eq!(rejection.reason, ErrorKind::EnrollmentFailed);
        assert!(rejection.message.contains("not found"));
    }
    assert_eq!(count_enrollments(&conn, fixture.class_id), 0);
}

#[test]
fn empty_request_yields_empty_report() {
    let conn = open_db_in_memory().unwrap();
    let fixture = seed_class(&conn, 5);

    let report = coordinator(&conn)
        .enroll_students(fixture.class_id, &[], fixture.teacher_id)
        .unwrap();

    assert!(report.admitted.is_empty());
    assert!(report.rejected.is_empty());
}

#[test]
fn unknown_actor_is_teacher_not_found_without_writes() {
    let conn = open_db_in_memory().unwrap();
    let fixture = seed_class(&conn, 5);
    let a = insert_student(&conn, 1, "Ayu", "1001");

    let err = coordinator(&conn)
        .enroll_students(fixture.class_id, &[a], Uuid::new_v4())
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::TeacherNotFound);
    assert_eq!(count_enrollments(&conn, fixture.class_id), 0);
}

#[test]
fn unassigned_teacher_is_denied_without_writes() {
    let conn = open_db_in_memory().unwrap();
    let fixture = seed_class(&conn, 5);
    let outsider = insert_teacher(&conn, 1);
    let a = insert_student(&conn, 1, "Ayu", "1001");

    let err = coordinator(&conn)
        .enroll_students(fixture.class_id, &[a], outsider)
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::AccessDenied);
    assert_eq!(count_enrollments(&conn, fixture.class_id), 0);
}

#[test]
fn missing_class_is_denied() {
    let conn = open_db_in_memory().unwrap();
    let fixture = seed_class(&conn, 5);
    let a = insert_student(&conn, 1, "Ayu", "1001");

    let err = coordinator(&conn)
        .enroll_students(404, &[a], fixture.teacher_id)
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::AccessDenied);
}

#[test]
fn enroll_student_persists_date_and_trimmed_notes() {
    let conn = open_db_in_memory().unwrap();
    let fixture = seed_class(&conn, 5);
    let a = insert_student(&conn, 1, "Ayu", "1001");
    let request = EnrollStudentRequest {
        student_id: a,
        enrolled_at: Some(1_700_000_000_000),
        notes: Some("  transferred from 7B ".to_string()),
    };

    coordinator(&conn)
        .enroll_student(fixture.class_id, &request, fixture.teacher_id)
        .unwrap();

    let (enrollment_date, notes, status): (i64, Option<String>, String) = conn
        .query_row(
            "SELECT enrollment_date, notes, status
             FROM class_students
             WHERE class_id = ?1 AND student_id = ?2;",
            params![fixture.class_id, a.to_string()],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .unwrap();
    assert_eq!(enrollment_date, 1_700_000_000_000);
    assert_eq!(notes.as_deref(), Some("transferred from 7B"));
    assert_eq!(status, "active");
}

#[test]
fn bulk_enroll_without_date_uses_store_clock() {
    let conn = open_db_in_memory().unwrap();
    let fixture = seed_class(&conn, 5);
    let a = insert_student(&conn, 1, "Ayu", "1001");
    let request = BulkEnrollRequest {
        student_ids: vec![a],
        enrolled_at: None,
        notes: Some("   ".to_string()),
    };

    coordinator(&conn)
        .enroll_students_with(fixture.class_id, &request, fixture.teacher_id)
        .unwrap();

    let (enrollment_date, notes): (i64, Option<String>) = conn
        .query_row(
            "SELECT enrollment_date, notes FROM class_students WHERE student_id = ?1;",
            [a.to_string()],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .unwrap();
    assert!(enrollment_date > 0);
    assert_eq!(notes, None);
}

#[test]
fn enroll_student_surfaces_rejection_as_typed_error() {
    let conn = open_db_in_memory().unwrap();
    let fixture = seed_class(&conn, 1);
    let a = insert_student(&conn, 1, "Ayu", "1001");
    let b = insert_student(&conn, 1, "Budi", "1002");
    let service = coordinator(&conn);

    service
        .enroll_student(fixture.class_id, &EnrollStudentRequest::new(a), fixture.teacher_id)
        .unwrap();
    let full = service
        .enroll_student(fixture.class_id, &EnrollStudentRequest::new(b), fixture.teacher_id)
        .unwrap_err();
    assert_eq!(full.kind(), ErrorKind::ClassCapacityExceeded);

    let duplicate = service
        .enroll_student(fixture.class_id, &EnrollStudentRequest::new(a), fixture.teacher_id)
        .unwrap_err();
    match duplicate {
        ClassServiceError::Rejected(rejection) => {
            assert_eq!(rejection.student_id, a);
            assert_eq!(rejection.reason, ErrorKind::StudentAlreadyEnrolled);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn capacity_trigger_backstops_direct_inserts() {
    let conn = open_db_in_memory().unwrap();
    let fixture = seed_class(&conn, 1);
    let a = insert_student(&conn, 1, "Ayu", "1001");
    let b = insert_student(&conn, 1, "Budi", "1002");
    let insert = "INSERT INTO class_students (class_id, student_id, enrollment_date)
                  VALUES (?1, ?2, 0);";

    conn.execute(insert, params![fixture.class_id, a.to_string()])
        .unwrap();
    let err = conn
        .execute(insert, params![fixture.class_id, b.to_string()])
        .unwrap_err();

    assert_eq!(classify_failure(&err.to_string()), ErrorKind::ClassCapacityExceeded);
    assert_eq!(count_enrollments(&conn, fixture.class_id), 1);
}

struct FailingEnrollments;

impl EnrollmentRepository for FailingEnrollments {
    fn admit_students(&self, _request: &AdmissionRequest) -> RepoResult<Vec<AdmissionOutcome>> {
        Err(RepoError::InvalidData("connection reset".to_string()))
    }

    fn find_roster(&self, _query: &RosterQuery) -> RepoResult<RosterPage> {
        Ok(RosterPage::default())
    }

    fn find_available(&self, _query: &AvailableQuery) -> RepoResult<RosterPage> {
        Ok(RosterPage::default())
    }

    fn remove_enrollment(
        &self,
        _class_id: ClassId,
        _student_id: StudentId,
        _actor_id: ActorId,
    ) -> RepoResult<Option<Enrollment>> {
        Ok(None)
    }

    fn class_audit_history(&self, _query: &AuditQuery) -> RepoResult<AuditPage> {
        Ok(AuditPage::default())
    }
}

#[test]
fn store_failure_becomes_enrollment_failed() {
    let conn = open_db_in_memory().unwrap();
    let fixture = seed_class(&conn, 5);
    let a = insert_student(&conn, 1, "Ayu", "1001");
    let service = EnrollmentCoordinator::new(SqliteDirectoryRepository::new(&conn), FailingEnrollments);

    let err = service
        .enroll_students(fixture.class_id, &[a], fixture.teacher_id)
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::EnrollmentFailed);
    assert!(err.to_string().contains("connection reset"));
}

#[test]
fn admitted_students_are_audited_and_rejected_ones_are_not() {
    let conn = open_db_in_memory().unwrap();
    let fixture = seed_class(&conn, 1);
    let a = insert_student(&conn, 1, "Ayu", "1001");
    let b = insert_student(&conn, 1, "Budi", "1002");
    let service = coordinator(&conn);
    let request = BulkEnrollRequest {
        student_ids: vec![a, b],
        enrolled_at: Some(1_700_000_000_000),
        notes: Some("new intake".to_string()),
    };

    let report = service
        .enroll_students_with(fixture.class_id, &request, fixture.teacher_id)
        .unwrap();
    assert_eq!(report.admitted, vec![a]);

    let history = service
        .get_class_audit_history(
            fixture.class_id,
            fixture.teacher_id,
            &AuditHistoryRequest::default(),
        )
        .unwrap();
    assert_eq!(history.total_count, 1);
    assert_eq!(history.page_size, 50);

    let entry = &history.entries[0];
    assert_eq!(entry.action, AuditAction::EnrollStudent);
    assert_eq!(entry.table_name, "class_students");
    assert_eq!(entry.record_id, format!("{}-{a}", fixture.class_id));
    assert_eq!(entry.changed_fields, vec!["student_id", "enrollment_date"]);
    assert_eq!(entry.performed_by, fixture.teacher_id);
    assert_eq!(entry.performed_by_name.as_deref(), Some("Teacher"));
    assert!(entry.old_values.is_none());
    let new_values = entry.new_values.as_ref().unwrap();
    assert_eq!(new_values["student_id"], a.to_string());
    assert_eq!(new_values["enrollment_date"], 1_700_000_000_000_i64);
    assert_eq!(new_values["notes"], "new intake");
    assert_eq!(new_values["status"], "active");
    assert!(!history
        .entries
        .iter()
        .any(|entry| entry.record_id.ends_with(&b.to_string())));
}

#[test]
fn denied_enrollment_writes_no_audit_rows() {
    let conn = open_db_in_memory().unwrap();
    let fixture = seed_class(&conn, 5);
    let outsider = insert_teacher(&conn, 1);
    let a = insert_student(&conn, 1, "Ayu", "1001");

    coordinator(&conn)
        .enroll_students(fixture.class_id, &[a], outsider)
        .unwrap_err();
    let audit_rows: i64 = conn
        .query_row("SELECT COUNT(*) FROM audit_logs;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(audit_rows, 0);
}

//! Enrollment store: atomic admission procedure and roster queries.
//!
//! # Responsibility
//! - Admit a batch of students to a class under one write transaction.
//! - Page through enrolled and available students with optional search.
//! - Record an audit row for every admitted or removed enrollment.
//!
//! # Invariants
//! - Admission takes the write lock before its first read, so every
//!   capacity/duplicate decision sees the committed state of competing
//!   writers.
//! - Each requested id yields exactly one outcome, in request order.
//! - Search clauses are parsed and bound as parameters.
//! - Audit rows are written in the same transaction as the change they
//!   describe; a rejected id never leaves one.

use crate::model::audit::{enrollment_record_id, AuditAction, AuditEntry, ENROLLMENT_AUDIT_TABLE};
use crate::model::enrollment::{Boarding, Enrollment, EnrollmentStatus, Gender, StudentSummary};
use crate::model::school::{ActorId, ClassId, ProfileRole, SchoolId, StudentId};
use crate::repo::{parse_uuid, RepoError, RepoResult};
use crate::search::clause::parse_or_clause;
use crate::search::pattern::{FIELD_FULL_NAME, FIELD_NIS, MATCH_OPERATOR};
use rusqlite::types::Value;
use rusqlite::{
    params, params_from_iter, Connection, OptionalExtension, Row, Transaction,
    TransactionBehavior,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};

/// Rejection text for a class that is already full.
pub const REASON_CAPACITY_EXCEEDED: &str = "Class capacity exceeded";
/// Rejection text for a duplicate `(class, student)` pair.
pub const REASON_ALREADY_ENROLLED: &str = "Student already enrolled in this class";
/// Rejection text for an unknown student or one from another school.
pub const REASON_STUDENT_NOT_FOUND: &str = "Student not found or not in same school";
/// Rejection text when the actor may not manage the class.
pub const REASON_ACCESS_DENIED: &str = "Teacher access denied for this class";
pub const REASON_CLASS_NOT_FOUND: &str = "Class not found";

const SUMMARY_SELECT_SQL: &str = "SELECT
    p.id AS student_id,
    p.full_name AS full_name,
    sd.nis AS nis,
    sd.gender AS gender,
    sd.boarding AS boarding";

/// Input of the atomic admission procedure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdmissionRequest {
    pub class_id: ClassId,
    pub student_ids: Vec<StudentId>,
    pub actor_id: ActorId,
    /// School the caller resolved for `actor_id`.
    pub school_id: SchoolId,
    /// Epoch ms stored on admitted rows; `None` uses the store clock.
    pub enrolled_at: Option<i64>,
    pub notes: Option<String>,
}

/// Per-id decision of the admission procedure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdmissionDecision {
    Admitted,
    /// Human-readable reason as produced by the store.
    Rejected(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdmissionOutcome {
    pub student_id: StudentId,
    pub decision: AdmissionDecision,
}

/// Sortable roster columns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RosterSortField {
    FullName,
    Nis,
    #[default]
    EnrollmentDate,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// Query over students enrolled in one class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterQuery {
    pub class_id: ClassId,
    /// Optional `or(...)` filter clause.
    pub filter: Option<String>,
    pub sort_by: RosterSortField,
    pub sort_order: SortOrder,
    pub offset: u32,
    pub limit: u32,
}

/// Query over students of a school not yet enrolled in one class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvailableQuery {
    pub class_id: ClassId,
    pub school_id: SchoolId,
    pub filter: Option<String>,
    pub gender: Option<Gender>,
    pub boarding: Option<Boarding>,
    pub offset: u32,
    pub limit: u32,
}

/// One page of students plus the total number of matches.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RosterPage {
    pub rows: Vec<StudentSummary>,
    pub total_count: u64,
}

/// Query over the enrollment audit trail of one class, newest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditQuery {
    pub class_id: ClassId,
    pub action: Option<AuditAction>,
    pub offset: u32,
    pub limit: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AuditPage {
    pub entries: Vec<AuditEntry>,
    pub total_count: u64,
}

/// Repository interface for enrollment persistence.
pub trait EnrollmentRepository {
    /// Runs the atomic admission procedure.
    ///
    /// Per-id rejections are outcomes, not errors; `Err` means the store
    /// call itself failed and nothing was committed.
    fn admit_students(&self, request: &AdmissionRequest) -> RepoResult<Vec<AdmissionOutcome>>;
    fn find_roster(&self, query: &RosterQuery) -> RepoResult<RosterPage>;
    fn find_available(&self, query: &AvailableQuery) -> RepoResult<RosterPage>;
    /// Deletes one enrollment and audits the removal as `actor_id`.
    ///
    /// Returns the deleted row, or `None` when the pair was not enrolled.
    fn remove_enrollment(
        &self,
        class_id: ClassId,
        student_id: StudentId,
        actor_id: ActorId,
    ) -> RepoResult<Option<Enrollment>>;
    fn class_audit_history(&self, query: &AuditQuery) -> RepoResult<AuditPage>;
}

/// SQLite-backed enrollment repository.
pub struct SqliteEnrollmentRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteEnrollmentRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl EnrollmentRepository for SqliteEnrollmentRepository<'_> {
    fn admit_students(&self, request: &AdmissionRequest) -> RepoResult<Vec<AdmissionOutcome>> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let outcomes = evaluate_admission(&tx, request)?;
        tx.commit()?;
        Ok(outcomes)
    }

    fn find_roster(&self, query: &RosterQuery) -> RepoResult<RosterPage> {
        let mut where_sql = String::from(
            " FROM class_students cs
             INNER JOIN profiles p ON p.id = cs.student_id
             LEFT JOIN student_details sd ON sd.user_id = cs.student_id
             WHERE cs.class_id = ?",
        );
        let mut bind_values: Vec<Value> = vec![Value::Integer(query.class_id)];

        if let Some(clause) = query.filter.as_deref() {
            let (filter_sql, filter_values) = compile_filter(clause)?;
            where_sql.push_str(" AND ");
            where_sql.push_str(&filter_sql);
            bind_values.extend(filter_values);
        }

        let order_column = match query.sort_by {
            RosterSortField::FullName => "p.full_name COLLATE NOCASE",
            RosterSortField::Nis => "sd.nis",
            RosterSortField::EnrollmentDate => "cs.enrollment_date",
        };
        let direction = match query.sort_order {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        };

        let select_sql = format!(
            "{SUMMARY_SELECT_SQL},
                cs.enrollment_date AS enrollment_date,
                cs.notes AS notes,
                cs.status AS status
             {where_sql}
             ORDER BY {order_column} {direction}, cs.student_id ASC
             LIMIT ? OFFSET ?"
        );
        let (rows, total_count) = fetch_page(
            self.conn,
            &where_sql,
            &select_sql,
            bind_values,
            query.offset,
            query.limit,
            parse_summary_row,
        )?;
        Ok(RosterPage { rows, total_count })
    }

    fn find_available(&self, query: &AvailableQuery) -> RepoResult<RosterPage> {
        let mut where_sql = String::from(
            " FROM profiles p
             LEFT JOIN student_details sd ON sd.user_id = p.id
             WHERE p.role = ?
               AND p.school_id = ?
               AND NOT EXISTS (
                 SELECT 1
                 FROM class_students cs
                 WHERE cs.class_id = ?
                   AND cs.student_id = p.id
               )",
        );
        let mut bind_values: Vec<Value> = vec![
            Value::Text(ProfileRole::Student.as_str().to_string()),
            Value::Integer(query.school_id),
            Value::Integer(query.class_id),
        ];

        if let Some(clause) = query.filter.as_deref() {
            let (filter_sql, filter_values) = compile_filter(clause)?;
            where_sql.push_str(" AND ");
            where_sql.push_str(&filter_sql);
            bind_values.extend(filter_values);
        }
        if let Some(gender) = query.gender {
            where_sql.push_str(" AND sd.gender = ?");
            bind_values.push(Value::Text(gender.as_str().to_string()));
        }
        if let Some(boarding) = query.boarding {
            where_sql.push_str(" AND sd.boarding = ?");
            bind_values.push(Value::Text(boarding.as_str().to_string()));
        }

        let select_sql = format!(
            "{SUMMARY_SELECT_SQL},
                NULL AS enrollment_date,
                NULL AS notes,
                NULL AS status
             {where_sql}
             ORDER BY p.full_name COLLATE NOCASE ASC, p.id ASC
             LIMIT ? OFFSET ?"
        );
        let (rows, total_count) = fetch_page(
            self.conn,
            &where_sql,
            &select_sql,
            bind_values,
            query.offset,
            query.limit,
            parse_summary_row,
        )?;
        Ok(RosterPage { rows, total_count })
    }

    fn remove_enrollment(
        &self,
        class_id: ClassId,
        student_id: StudentId,
        actor_id: ActorId,
    ) -> RepoResult<Option<Enrollment>> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let Some(enrollment) = load_enrollment(&tx, class_id, student_id)? else {
            return Ok(None);
        };

        tx.execute(
            "DELETE FROM class_students WHERE class_id = ?1 AND student_id = ?2;",
            params![class_id, student_id.to_string()],
        )?;
        insert_enrollment_audit(&tx, AuditAction::RemoveStudent, &enrollment, actor_id)?;
        tx.commit()?;
        Ok(Some(enrollment))
    }

    fn class_audit_history(&self, query: &AuditQuery) -> RepoResult<AuditPage> {
        let mut where_sql = String::from(
            " FROM audit_logs a
             LEFT JOIN profiles p ON p.id = a.performed_by
             WHERE a.class_id = ?",
        );
        let mut bind_values: Vec<Value> = vec![Value::Integer(query.class_id)];
        if let Some(action) = query.action {
            where_sql.push_str(" AND a.action = ?");
            bind_values.push(Value::Text(action.as_str().to_string()));
        }

        let select_sql = format!(
            "SELECT
                a.id AS id,
                a.table_name AS table_name,
                a.record_id AS record_id,
                a.class_id AS class_id,
                a.action AS action,
                a.changed_fields AS changed_fields,
                a.old_values AS old_values,
                a.new_values AS new_values,
                a.performed_by AS performed_by,
                p.full_name AS performed_by_name,
                a.performed_at AS performed_at
             {where_sql}
             ORDER BY a.performed_at DESC, a.id DESC
             LIMIT ? OFFSET ?"
        );
        let (entries, total_count) = fetch_page(
            self.conn,
            &where_sql,
            &select_sql,
            bind_values,
            query.offset,
            query.limit,
            parse_audit_row,
        )?;
        Ok(AuditPage {
            entries,
            total_count,
        })
    }
}

fn load_enrollment(
    conn: &Connection,
    class_id: ClassId,
    student_id: StudentId,
) -> RepoResult<Option<Enrollment>> {
    let row = conn
        .query_row(
            "SELECT enrollment_date, notes, status
             FROM class_students
             WHERE class_id = ?1 AND student_id = ?2;",
            params![class_id, student_id.to_string()],
            |row| {
                Ok((
                    row.get::<_, i64>("enrollment_date")?,
                    row.get::<_, Option<String>>("notes")?,
                    row.get::<_, String>("status")?,
                ))
            },
        )
        .optional()?;

    let Some((enrollment_date, notes, status)) = row else {
        return Ok(None);
    };

    Ok(Some(Enrollment {
        class_id,
        student_id,
        enrollment_date,
        notes,
        status: parse_status(&status)?,
    }))
}

fn evaluate_admission(
    tx: &Transaction<'_>,
    request: &AdmissionRequest,
) -> RepoResult<Vec<AdmissionOutcome>> {
    let class_row = tx
        .query_row(
            "SELECT school_id, student_capacity FROM classes WHERE id = ?1;",
            [request.class_id],
            |row| Ok((row.get::<_, SchoolId>(0)?, row.get::<_, i64>(1)?)),
        )
        .optional()?;

    let Some((class_school, capacity)) = class_row else {
        return Ok(reject_all(request, REASON_CLASS_NOT_FOUND));
    };

    if class_school != request.school_id
        || !assignment_exists_in_tx(tx, request.class_id, request.actor_id, class_school)?
    {
        return Ok(reject_all(request, REASON_ACCESS_DENIED));
    }

    let mut enrolled: i64 = tx.query_row(
        "SELECT COUNT(*) FROM class_students WHERE class_id = ?1;",
        [request.class_id],
        |row| row.get(0),
    )?;

    let mut outcomes = Vec::with_capacity(request.student_ids.len());
    for &student_id in &request.student_ids {
        let student_key = student_id.to_string();
        let decision = if !student_in_school_in_tx(tx, &student_key, class_school)? {
            AdmissionDecision::Rejected(REASON_STUDENT_NOT_FOUND.to_string())
        } else if enrollment_exists_in_tx(tx, request.class_id, &student_key)? {
            AdmissionDecision::Rejected(REASON_ALREADY_ENROLLED.to_string())
        } else if enrolled >= capacity {
            AdmissionDecision::Rejected(REASON_CAPACITY_EXCEEDED.to_string())
        } else {
            let enrollment_date: i64 = tx.query_row(
                "INSERT INTO class_students (class_id, student_id, enrollment_date, notes, status)
                 VALUES (?1, ?2, COALESCE(?3, strftime('%s', 'now') * 1000), ?4, ?5)
                 RETURNING enrollment_date;",
                params![
                    request.class_id,
                    student_key,
                    request.enrolled_at,
                    request.notes.as_deref(),
                    EnrollmentStatus::Active.as_str(),
                ],
                |row| row.get(0),
            )?;
            let enrollment = Enrollment {
                class_id: request.class_id,
                student_id,
                enrollment_date,
                notes: request.notes.clone(),
                status: EnrollmentStatus::Active,
            };
            insert_enrollment_audit(tx, AuditAction::EnrollStudent, &enrollment, request.actor_id)?;
            enrolled += 1;
            AdmissionDecision::Admitted
        };
        outcomes.push(AdmissionOutcome {
            student_id,
            decision,
        });
    }

    Ok(outcomes)
}

fn insert_enrollment_audit(
    conn: &Connection,
    action: AuditAction,
    enrollment: &Enrollment,
    actor_id: ActorId,
) -> RepoResult<()> {
    let snapshot = json!({
        "class_id": enrollment.class_id,
        "student_id": enrollment.student_id.to_string(),
        "enrollment_date": enrollment.enrollment_date,
        "notes": enrollment.notes,
        "status": enrollment.status.as_str(),
    })
    .to_string();
    let (old_values, new_values) = match action {
        AuditAction::EnrollStudent => (None, Some(snapshot)),
        AuditAction::RemoveStudent => (Some(snapshot), None),
    };

    conn.execute(
        "INSERT INTO audit_logs (
            table_name, record_id, class_id, action, changed_fields,
            old_values, new_values, performed_by
         )
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
        params![
            ENROLLMENT_AUDIT_TABLE,
            enrollment_record_id(enrollment.class_id, enrollment.student_id),
            enrollment.class_id,
            action.as_str(),
            json!(action.changed_fields()).to_string(),
            old_values,
            new_values,
            actor_id.to_string(),
        ],
    )?;
    Ok(())
}

fn reject_all(request: &AdmissionRequest, reason: &str) -> Vec<AdmissionOutcome> {
    request
        .student_ids
        .iter()
        .map(|&student_id| AdmissionOutcome {
            student_id,
            decision: AdmissionDecision::Rejected(reason.to_string()),
        })
        .collect()
}

fn assignment_exists_in_tx(
    tx: &Transaction<'_>,
    class_id: ClassId,
    actor_id: ActorId,
    school_id: SchoolId,
) -> RepoResult<bool> {
    let exists: i64 = tx.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM class_teachers
            WHERE class_id = ?1
              AND user_id = ?2
              AND school_id = ?3
        );",
        params![class_id, actor_id.to_string(), school_id],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn student_in_school_in_tx(
    tx: &Transaction<'_>,
    student_key: &str,
    school_id: SchoolId,
) -> RepoResult<bool> {
    let exists: i64 = tx.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM profiles
            WHERE id = ?1
              AND role = ?2
              AND school_id = ?3
        );",
        params![student_key, ProfileRole::Student.as_str(), school_id],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn enrollment_exists_in_tx(
    tx: &Transaction<'_>,
    class_id: ClassId,
    student_key: &str,
) -> RepoResult<bool> {
    let exists: i64 = tx.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM class_students
            WHERE class_id = ?1
              AND student_id = ?2
        );",
        params![class_id, student_key],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

/// Turns an `or(...)` clause into a parenthesized SQL predicate and binds.
fn compile_filter(clause: &str) -> RepoResult<(String, Vec<Value>)> {
    let conditions =
        parse_or_clause(clause).map_err(|err| RepoError::InvalidFilter(err.to_string()))?;

    let mut predicates = Vec::with_capacity(conditions.len());
    let mut bind_values = Vec::with_capacity(conditions.len());
    for condition in conditions {
        let column = search_column(&condition.field).ok_or_else(|| {
            RepoError::InvalidFilter(format!("unsupported field `{}`", condition.field))
        })?;
        if condition.operator != MATCH_OPERATOR {
            return Err(RepoError::InvalidFilter(format!(
                "unsupported operator `{}`",
                condition.operator
            )));
        }
        // LIKE folds ASCII case only; `ilike` on "élia" does not match "Élia".
        predicates.push(format!("{column} LIKE ?"));
        bind_values.push(Value::Text(condition.pattern));
    }

    Ok((format!("({})", predicates.join(" OR ")), bind_values))
}

fn search_column(field: &str) -> Option<&'static str> {
    match field {
        FIELD_FULL_NAME => Some("p.full_name"),
        FIELD_NIS => Some("sd.nis"),
        _ => None,
    }
}

/// Runs a count and a windowed select sharing one `FROM ... WHERE` tail.
fn fetch_page<T>(
    conn: &Connection,
    where_sql: &str,
    select_sql: &str,
    mut bind_values: Vec<Value>,
    offset: u32,
    limit: u32,
    parse_row: fn(&Row<'_>) -> RepoResult<T>,
) -> RepoResult<(Vec<T>, u64)> {
    let total: i64 = conn.query_row(
        &format!("SELECT COUNT(*){where_sql}"),
        params_from_iter(bind_values.iter()),
        |row| row.get(0),
    )?;
    let total_count = u64::try_from(total)
        .map_err(|_| RepoError::InvalidData(format!("negative row count `{total}`")))?;

    bind_values.push(Value::Integer(i64::from(limit)));
    bind_values.push(Value::Integer(i64::from(offset)));

    let mut stmt = conn.prepare(select_sql)?;
    let mut rows = stmt.query(params_from_iter(bind_values))?;
    let mut parsed = Vec::new();
    while let Some(row) = rows.next()? {
        parsed.push(parse_row(row)?);
    }

    Ok((parsed, total_count))
}

fn parse_summary_row(row: &Row<'_>) -> RepoResult<StudentSummary> {
    let id_text: String = row.get("student_id")?;
    let gender = match row.get::<_, Option<String>>("gender")? {
        Some(value) => Some(Gender::parse(&value).ok_or_else(|| {
            RepoError::InvalidData(format!("invalid gender `{value}` in student_details.gender"))
        })?),
        None => None,
    };
    let boarding = match row.get::<_, Option<String>>("boarding")? {
        Some(value) => Some(Boarding::parse(&value).ok_or_else(|| {
            RepoError::InvalidData(format!(
                "invalid boarding `{value}` in student_details.boarding"
            ))
        })?),
        None => None,
    };
    let status = match row.get::<_, Option<String>>("status")? {
        Some(value) => Some(parse_status(&value)?),
        None => None,
    };

    Ok(StudentSummary {
        student_id: parse_uuid(&id_text, "profiles.id")?,
        full_name: row.get("full_name")?,
        nis: row.get("nis")?,
        gender,
        boarding,
        enrollment_date: row.get("enrollment_date")?,
        notes: row.get("notes")?,
        status,
    })
}

fn parse_audit_row(row: &Row<'_>) -> RepoResult<AuditEntry> {
    let action_text: String = row.get("action")?;
    let action = AuditAction::parse(&action_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid action `{action_text}` in audit_logs.action"))
    })?;
    let changed_fields_text: String = row.get("changed_fields")?;
    let changed_fields = serde_json::from_str::<Vec<String>>(&changed_fields_text).map_err(|err| {
        RepoError::InvalidData(format!("invalid json in audit_logs.changed_fields: {err}"))
    })?;
    let performed_by: String = row.get("performed_by")?;

    Ok(AuditEntry {
        id: row.get("id")?,
        table_name: row.get("table_name")?,
        record_id: row.get("record_id")?,
        class_id: row.get("class_id")?,
        action,
        changed_fields,
        old_values: parse_json_column(row.get("old_values")?, "audit_logs.old_values")?,
        new_values: parse_json_column(row.get("new_values")?, "audit_logs.new_values")?,
        performed_by: parse_uuid(&performed_by, "audit_logs.performed_by")?,
        performed_by_name: row.get("performed_by_name")?,
        performed_at: row.get("performed_at")?,
    })
}

fn parse_json_column(value: Option<String>, column: &str) -> RepoResult<Option<JsonValue>> {
    value
        .map(|text| {
            serde_json::from_str(&text)
                .map_err(|err| RepoError::InvalidData(format!("invalid json in {column}: {err}")))
        })
        .transpose()
}

fn parse_status(value: &str) -> RepoResult<EnrollmentStatus> {
    EnrollmentStatus::parse(value).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid status `{value}` in class_students.status"))
    })
}

#![allow(dead_code)]

use classroll_core::{ActorId, ClassId, SchoolId, StudentId};
use rusqlite::{params, Connection};
use uuid::Uuid;

pub fn insert_school(conn: &Connection, school_id: SchoolId) {
    conn.execute(
        "INSERT INTO schools (id, name) VALUES (?1, ?2);",
        params![school_id, format!("School {school_id}")],
    )
    .unwrap();
}

pub fn insert_teacher(conn: &Connection, school_id: SchoolId) -> ActorId {
    insert_profile(conn, school_id, "teacher", "Teacher")
}

pub fn insert_student(
    conn: &Connection,
    school_id: SchoolId,
    full_name: &str,
    nis: &str,
) -> StudentId {
    insert_student_with(conn, school_id, full_name, nis, "male", "day")
}

pub fn insert_student_with(
    conn: &Connection,
    school_id: SchoolId,
    full_name: &str,
    nis: &str,
    gender: &str,
    boarding: &str,
) -> StudentId {
    let student_id = insert_profile(conn, school_id, "student", full_name);
    conn.execute(
        "INSERT INTO student_details (user_id, nis, gender, boarding)
         VALUES (?1, ?2, ?3, ?4);",
        params![student_id.to_string(), nis, gender, boarding],
    )
    .unwrap();
    student_id
}

pub fn insert_class(
    conn: &Connection,
    class_id: ClassId,
    school_id: SchoolId,
    capacity: u32,
) -> ClassId {
    conn.execute(
        "INSERT INTO classes (id, school_id, name, student_capacity) VALUES (?1, ?2, ?3, ?4);",
        params![class_id, school_id, format!("Class {class_id}"), capacity],
    )
    .unwrap();
    class_id
}

pub fn assign_teacher(conn: &Connection, class_id: ClassId, teacher_id: ActorId, school_id: SchoolId) {
    conn.execute(
        "INSERT INTO class_teachers (class_id, user_id, school_id) VALUES (?1, ?2, ?3);",
        params![class_id, teacher_id.to_string(), school_id],
    )
    .unwrap();
}

pub fn count_enrollments(conn: &Connection, class_id: ClassId) -> i64 {
    conn.query_row(
        "SELECT COUNT(*) FROM class_students WHERE class_id = ?1;",
        [class_id],
        |row| row.get(0),
    )
    .unwrap()
}

pub fn count_assignments(conn: &Connection) -> i64 {
    conn.query_row("SELECT COUNT(*) FROM class_teachers;", [], |row| row.get(0))
        .unwrap()
}

/// School 1 with one teacher assigned to class 10 of the given capacity.
#[derive(Debug, Clone, Copy)]
pub struct Fixture {
    pub school_id: SchoolId,
    pub teacher_id: ActorId,
    pub class_id: ClassId,
}

pub fn seed_class(conn: &Connection, capacity: u32) -> Fixture {
    insert_school(conn, 1);
    let teacher_id = insert_teacher(conn, 1);
    let class_id = insert_class(conn, 10, 1, capacity);
    assign_teacher(conn, class_id, teacher_id, 1);
    Fixture {
        school_id: 1,
        teacher_id,
        class_id,
    }
}

fn insert_profile(conn: &Connection, school_id: SchoolId, role: &str, full_name: &str) -> Uuid {
    let id = Uuid::new_v4();
    conn.execute(
        "INSERT INTO profiles (id, school_id, role, full_name) VALUES (?1, ?2, ?3, ?4);",
        params![id.to_string(), school_id, role, full_name],
    )
    .unwrap();
    id
}

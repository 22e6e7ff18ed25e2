//! Domain model for school-scoped class rosters.
//!
//! # Responsibility
//! - Define identifiers and records shared by repositories and services.
//!
//! # Invariants
//! - Every teacher, student and class belongs to exactly one school.
//! - An enrollment exists at most once per `(class_id, student_id)` pair.

pub mod audit;
pub mod enrollment;
pub mod school;

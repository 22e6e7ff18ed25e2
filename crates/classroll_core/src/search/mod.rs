//! Roster search filters.
//!
//! # Responsibility
//! - Turn free-text search input into a quoted pattern-match filter clause.
//! - Parse filter clauses back into field conditions at the store boundary.
//!
//! # Invariants
//! - A clause built from user text always holds exactly the conditions the
//!   builder chose; the text can only ever land inside a quoted pattern.

pub mod clause;
pub mod pattern;

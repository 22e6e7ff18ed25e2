//! Class access and enrollment use-case services.
//!
//! # Responsibility
//! - Gate class-scoped operations behind the access guard.
//! - Orchestrate repository calls into typed results and errors.
//! - Keep façades (RPC/HTTP/CLI) decoupled from storage details.

pub mod access_guard;
pub mod enrollment_service;
pub mod error;
pub mod error_classifier;
pub mod paging;
pub mod result_aggregator;

//! # aula-core
//!
//! Core types, ports, and error kinds for the academic eligibility engine.
//!
//! This crate provides the foundational types shared across all `aula` crates:
//! - Entity structs for subjects, plans, careers, offerings, enrollments, grades
//! - Status enums with state machine transitions
//! - ID prefix constants
//! - Error kinds and the `StoreError` / `RuleError` types
//! - Result-style outcomes and eligibility verdicts
//! - Adapter ports implemented by persistence backends

pub mod audit_detail;
pub mod entities;
pub mod enums;
pub mod errors;
pub mod identity;
pub mod ids;
pub mod outcomes;
pub mod ports;

/// Maximum number of teachers that may be assigned to one subject.
pub const MAX_TEACHERS_PER_SUBJECT: u32 = 2;

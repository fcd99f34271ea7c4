//! Typed audit detail payloads.
//!
//! Each audit action can carry a structured `detail` JSON blob. These types
//! provide schema validation for the most common detail shapes.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::GradeStatus;

/// Detail for `AuditAction::GradeDrafted`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct GradeDraftedDetail {
    pub offering_id: String,
    pub from: GradeStatus,
    pub to: GradeStatus,
}

/// Detail for `AuditAction::GradesSaved`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct GradesSavedDetail {
    pub records: u32,
}

/// Detail for `AuditAction::Published`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct PublishedDetail {
    pub approved: u32,
    pub failed: u32,
    pub absent: u32,
}

/// Detail for `AuditAction::Assigned` and `AuditAction::Unassigned`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct AssignmentDetail {
    pub teacher_id: String,
    pub subject_id: String,
}

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::PrerequisiteKind;

/// A named curriculum placing subjects at a year and term.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct StudyPlan {
    pub id: String,
    pub name: String,
    pub creation_year: u16,
    /// Duration in years.
    pub duration_years: u8,
    pub created_at: DateTime<Utc>,
}

/// Placement of a subject inside a plan. Unique per `(plan_id, subject_id)`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct PlanSubject {
    pub id: String,
    pub plan_id: String,
    pub subject_id: String,
    pub year_in_plan: u8,
    pub term_in_plan: u8,
}

/// A directed, plan-scoped requirement: `subject_id` requires `required_subject_id`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct PrerequisiteEdge {
    pub id: String,
    pub plan_id: String,
    pub subject_id: String,
    pub required_subject_id: String,
    pub kind: PrerequisiteKind,
    pub created_at: DateTime<Utc>,
}

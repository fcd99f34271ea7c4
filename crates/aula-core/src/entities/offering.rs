use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A scheduled instance of a plan subject taught by an assigned teacher.
///
/// `published` is terminal and monotone: once set, no grade under the
/// offering may change.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct CourseOffering {
    pub id: String,
    pub plan_subject_id: String,
    /// Catalog subject the placement refers to (denormalized for reads).
    pub subject_id: String,
    pub teacher_id: String,
    /// Creating assignment. `None` once the assignment has been removed.
    pub assignment_id: Option<String>,
    pub academic_year: u16,
    pub term: u8,
    pub published: bool,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

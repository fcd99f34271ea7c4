use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A teacher assigned to a subject. At most two per subject.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct TeacherAssignment {
    pub id: String,
    pub teacher_id: String,
    pub subject_id: String,
    pub created_at: DateTime<Utc>,
}

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A student registered in a career.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Student {
    pub id: String,
    pub name: String,
    pub career_id: String,
    /// Inactive students do not count toward a career's active-student total.
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

/// A teacher. `role_active` is cleared when the last subject assignment is removed.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Teacher {
    pub id: String,
    pub name: String,
    pub role_active: bool,
    pub created_at: DateTime<Utc>,
}

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A degree program owned by a department and linked to one study plan.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Career {
    pub id: String,
    pub name: String,
    pub department: String,
    pub plan_id: String,
    pub created_at: DateTime<Utc>,
}

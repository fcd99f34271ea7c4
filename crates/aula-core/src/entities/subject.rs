use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A single course in the catalog, independent of any plan.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Hash)]
pub struct Subject {
    pub id: String,
    /// Catalog code, unique across the catalog (e.g. `"MAT-101"`).
    pub code: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::GradeStatus;

/// The grade of one course enrollment.
///
/// `status` is the saved grade. `draft_status` holds an edit made with
/// `set_grade` that has not been through a batch save yet.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct GradeRecord {
    pub enrollment_id: String,
    pub offering_id: String,
    pub student_id: String,
    pub status: GradeStatus,
    pub draft_status: Option<GradeStatus>,
    pub updated_at: DateTime<Utc>,
}

impl GradeRecord {
    /// Status the record would have after the next save.
    #[must_use]
    pub fn effective_status(&self) -> GradeStatus {
        self.draft_status.unwrap_or(self.status)
    }

    #[must_use]
    pub const fn has_unsaved_edit(&self) -> bool {
        self.draft_status.is_some()
    }
}

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::BoardEnrollmentStatus;

/// A scheduled final-exam session for a subject.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct ExamBoard {
    pub id: String,
    pub subject_id: String,
    pub exam_at: DateTime<Utc>,
    pub cancelled: bool,
    pub created_at: DateTime<Utc>,
}

impl ExamBoard {
    /// A board accepts registrations while it is not cancelled and still ahead of `now`.
    #[must_use]
    pub fn is_open_at(&self, now: DateTime<Utc>) -> bool {
        !self.cancelled && self.exam_at > now
    }
}

/// A student's registration on an exam board. Unique per `(student_id, board_id)`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct BoardEnrollment {
    pub id: String,
    pub student_id: String,
    pub board_id: String,
    pub status: BoardEnrollmentStatus,
    pub created_at: DateTime<Utc>,
}

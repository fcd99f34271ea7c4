use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Identity resolved by the host application's session layer.
///
/// Authentication happens outside the engine; the engine trusts whatever the
/// host resolved.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct SessionIdentity {
    /// Student id of the caller, when the caller is a student.
    pub student_id: Option<String>,
    /// Teacher id of the caller, when the caller is a teacher.
    pub teacher_id: Option<String>,
}

impl SessionIdentity {
    #[must_use]
    pub fn student(id: impl Into<String>) -> Self {
        Self {
            student_id: Some(id.into()),
            teacher_id: None,
        }
    }

    #[must_use]
    pub fn teacher(id: impl Into<String>) -> Self {
        Self {
            student_id: None,
            teacher_id: Some(id.into()),
        }
    }
}

/// Resolves who is calling.
pub trait IdentityProvider: Send + Sync {
    fn current_student(&self) -> Option<String>;
    fn current_teacher(&self) -> Option<String>;
}

impl IdentityProvider for SessionIdentity {
    fn current_student(&self) -> Option<String> {
        self.student_id.clone()
    }

    fn current_teacher(&self) -> Option<String> {
        self.teacher_id.clone()
    }
}

//! ID prefix constants.
//!
//! Every persisted entity gets a prefixed random id of the form
//! `{prefix}-{8 hex chars}`, generated by the database (see `aula-db`).

pub const PREFIX_SUBJECT: &str = "sub";
pub const PREFIX_PLAN: &str = "pln";
pub const PREFIX_PLAN_SUBJECT: &str = "pls";
pub const PREFIX_PREREQUISITE: &str = "prq";
pub const PREFIX_CAREER: &str = "car";
pub const PREFIX_STUDENT: &str = "stu";
pub const PREFIX_TEACHER: &str = "tch";
pub const PREFIX_ASSIGNMENT: &str = "asg";
pub const PREFIX_OFFERING: &str = "off";
pub const PREFIX_ENROLLMENT: &str = "enr";
pub const PREFIX_EXAM_BOARD: &str = "brd";
pub const PREFIX_BOARD_ENROLLMENT: &str = "bde";
pub const PREFIX_AUDIT: &str = "aud";

/// All known prefixes, for exhaustive tests.
pub const ALL_PREFIXES: &[&str] = &[
    PREFIX_SUBJECT,
    PREFIX_PLAN,
    PREFIX_PLAN_SUBJECT,
    PREFIX_PREREQUISITE,
    PREFIX_CAREER,
    PREFIX_STUDENT,
    PREFIX_TEACHER,
    PREFIX_ASSIGNMENT,
    PREFIX_OFFERING,
    PREFIX_ENROLLMENT,
    PREFIX_EXAM_BOARD,
    PREFIX_BOARD_ENROLLMENT,
    PREFIX_AUDIT,
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn prefixes_are_unique_and_three_chars() {
        let mut seen = HashSet::new();
        for prefix in ALL_PREFIXES {
            assert_eq!(prefix.len(), 3, "prefix '{prefix}' should be 3 chars");
            assert!(seen.insert(*prefix), "duplicate prefix '{prefix}'");
        }
    }
}

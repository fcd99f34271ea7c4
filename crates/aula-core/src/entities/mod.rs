//! Entity structs for every record the engine reads or writes.
//!
//! Each entity maps to a table in the libSQL database (see `aula-db` migrations).
//! All structs derive `Serialize`, `Deserialize`, and `JsonSchema` for JSON roundtrip
//! and schema validation.

mod assignment;
mod audit;
mod career;
mod enrollment;
mod exam_board;
mod grade;
mod offering;
mod people;
mod plan;
mod subject;

pub use assignment::TeacherAssignment;
pub use audit::AuditEntry;
pub use career::Career;
pub use enrollment::CourseEnrollment;
pub use exam_board::{BoardEnrollment, ExamBoard};
pub use grade::GradeRecord;
pub use offering::CourseOffering;
pub use people::{Student, Teacher};
pub use plan::{PlanSubject, PrerequisiteEdge, StudyPlan};
pub use subject::Subject;

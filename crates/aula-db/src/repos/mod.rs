//! Repository modules implementing CRUD and aggregate reads for all entities.
//!
//! Each module adds methods to `AulaService` via `impl AulaService` blocks.

pub mod audit;
pub mod career;
pub mod catalog;
pub mod enrollment;
pub mod exam_board;
pub mod grade;
pub mod history;
pub mod offering;
pub mod plan;
pub mod teacher;

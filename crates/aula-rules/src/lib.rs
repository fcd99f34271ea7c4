//! # aula-rules
//!
//! The academic rule engine: who may enroll where, how many teachers a
//! subject may have, what may be deleted, and how grades move from draft to
//! published.
//!
//! - [`EligibilityResolver`]: course and final eligibility verdicts
//! - [`CapacityGuard`]: teacher cap and dependency checks before deletions
//! - [`GradeLifecycle`]: draft, batch save, publish
//! - [`Registrar`]: the facade host applications call, returning `Outcome`s
//!
//! Everything here is generic over the `aula-core` ports. The rules never
//! touch storage directly and keep no state between calls.

pub mod capacity;
pub mod eligibility;
pub mod grades;
pub mod notify;
pub mod registrar;

pub use capacity::CapacityGuard;
pub use eligibility::EligibilityResolver;
pub use grades::GradeLifecycle;
pub use notify::LogNotifier;
pub use registrar::Registrar;

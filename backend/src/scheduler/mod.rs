//! Scheduling core.
//!
//! - [`planner`]: groups a roster, carves bounded batches and round-robins
//!   them over the requested time slots. Pure, no I/O.
//! - [`collision`]: answers "does this student already sit an exam on this
//!   date" from the repository.
//! - [`locks`]: per-date critical sections that keep planning runs and
//!   moves on the same date from interleaving.

pub mod collision;
pub mod locks;
pub mod planner;

pub use collision::CollisionChecker;
pub use locks::{DateGuard, DateLocks};
pub use planner::{
    plan, BatchPlan, NoStudentsReason, PlanError, PlanOutcome, PlanRequest,
};

//! Domain value types shared by the planner, the repositories and the HTTP layer.
//!
//! Repositories translate their storage rows into these types; nothing above
//! `db::repositories` ever sees a raw row.

pub mod exam;
pub mod macros;
pub mod schedule;
pub mod student;

pub use exam::*;
pub use schedule::*;
pub use student::*;

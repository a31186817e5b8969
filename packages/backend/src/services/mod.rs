pub mod locks;
pub mod progress;
pub mod scheduling;

pub use locks::{UserGuard, UserLocks};
pub use scheduling::{Scheduler, SchedulingError};

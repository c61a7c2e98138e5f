//! Source of "now" for due-date scoring.

use ivy_core::Time;

/// Where the engine reads the current time from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Clock {
    /// Wall-clock time
    #[default]
    System,
    /// A pinned instant, for reproducible plans and tests
    Fixed(Time),
}

impl Clock {
    /// Current time according to this clock.
    pub fn now(&self) -> Time {
        match self {
            Clock::System => chrono::Utc::now(),
            Clock::Fixed(t) => *t,
        }
    }
}

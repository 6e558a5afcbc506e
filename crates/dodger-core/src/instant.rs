use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A point in time represented as a number of milliseconds since the start of the
/// controller's clock.
///
/// The controller never reads a wall clock itself: hosts pass the current instant
/// into every call, and tests advance a virtual clock by hand. Millisecond
/// resolution keeps timeout comparisons exact.
#[derive(Serialize, Deserialize, Clone, Debug, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct GameInstant(u64);

impl GameInstant {
    pub fn from_millis(millis: u64) -> Self {
        Self(millis)
    }

    /// Get the underlying number of milliseconds.
    pub fn as_millis(&self) -> u64 {
        self.0
    }

    /// Get the duration between this instant and an earlier one.
    ///
    /// If the other instant is after this instant, the result is 0.
    pub fn saturating_duration_since(&self, earlier: GameInstant) -> Duration {
        Duration::from_millis(self.0.saturating_sub(earlier.0))
    }
}

impl std::ops::Add<Duration> for GameInstant {
    type Output = Self;

    fn add(self, rhs: Duration) -> Self::Output {
        let millis = u64::try_from(rhs.as_millis()).unwrap_or(u64::MAX);
        Self(self.0.saturating_add(millis))
    }
}

impl std::ops::AddAssign<Duration> for GameInstant {
    fn add_assign(&mut self, rhs: Duration) {
        *self = *self + rhs;
    }
}

impl std::fmt::Display for GameInstant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "t={}ms", self.0)
    }
}

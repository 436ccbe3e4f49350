//! Last-known connectivity state.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

/// What the worker last observed about the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Connectivity {
    /// No navigation has completed yet.
    Unknown,
    /// The most recent navigation reached the network.
    Online,
    /// The most recent navigation failed to reach the network.
    Offline,
}

impl Connectivity {
    const fn to_u8(self) -> u8 {
        match self {
            Connectivity::Unknown => 0,
            Connectivity::Online => 1,
            Connectivity::Offline => 2,
        }
    }

    const fn from_u8(value: u8) -> Self {
        match value {
            1 => Connectivity::Online,
            2 => Connectivity::Offline,
            _ => Connectivity::Unknown,
        }
    }
}

impl fmt::Display for Connectivity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Connectivity::Unknown => "unknown",
            Connectivity::Online => "online",
            Connectivity::Offline => "offline",
        };
        f.write_str(name)
    }
}

/// Worker-wide connectivity flag updated by navigation outcomes.
///
/// Last writer wins; concurrent navigations race without coordination.
#[derive(Debug)]
pub struct ConnectivityTracker {
    state: AtomicU8,
}

impl ConnectivityTracker {
    /// Creates a tracker in the [`Connectivity::Unknown`] state.
    pub const fn new() -> Self {
        Self {
            state: AtomicU8::new(Connectivity::Unknown.to_u8()),
        }
    }

    /// Records a navigation outcome and returns the previous state.
    pub fn record(&self, offline: bool) -> Connectivity {
        let next = if offline {
            Connectivity::Offline
        } else {
            Connectivity::Online
        };
        Connectivity::from_u8(self.state.swap(next.to_u8(), Ordering::AcqRel))
    }

    /// Current state.
    pub fn state(&self) -> Connectivity {
        Connectivity::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Whether pages should show the offline indicator.
    ///
    /// [`Connectivity::Unknown`] counts as online.
    pub fn is_offline(&self) -> bool {
        self.state() == Connectivity::Offline
    }
}

impl Default for ConnectivityTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_unknown_and_reports_online() {
        let tracker = ConnectivityTracker::new();
        assert_eq!(tracker.state(), Connectivity::Unknown);
        assert!(!tracker.is_offline());
    }

    #[test]
    fn last_record_wins() {
        let tracker = ConnectivityTracker::new();
        assert_eq!(tracker.record(true), Connectivity::Unknown);
        assert!(tracker.is_offline());
        assert_eq!(tracker.record(false), Connectivity::Offline);
        assert_eq!(tracker.state(), Connectivity::Online);
        assert!(!tracker.is_offline());
    }
}

/// Link state definitions for tracking article URL reachability
use std::fmt;

/// Reachability state of an individual article URL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkState {
    /// Last fetch succeeded (or the URL was never seen)
    Active,

    /// Last fetch failed with a connection error or an HTTP error status
    Inactive,

    /// Last fetch timed out
    Timeout,

    /// Last fetch failed for another request-level reason
    Error,
}

impl LinkState {
    /// Returns true if the URL may be fetched again
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }

    /// Converts the link state to its database string representation
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Timeout => "timeout",
            Self::Error => "error",
        }
    }

    /// Parses a link state from its database string representation
    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "active" => Some(Self::Active),
            "inactive" => Some(Self::Inactive),
            "timeout" => Some(Self::Timeout),
            "error" => Some(Self::Error),
            _ => None,
        }
    }

    /// All link states, in display order
    pub fn all() -> &'static [LinkState] {
        &[Self::Active, Self::Inactive, Self::Timeout, Self::Error]
    }
}

impl fmt::Display for LinkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_string())
    }
}

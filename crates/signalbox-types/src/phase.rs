//! The signal phase shown by a traffic light.

use core::fmt;

use serde::{Deserialize, Serialize};

/// The phase a traffic light is showing.
///
/// Exactly two values exist. A light starts at [`Phase::Red`] and every
/// transition is an unconditional toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Traffic must stop.
    #[default]
    Red,
    /// Traffic may proceed.
    Green,
}

impl Phase {
    /// Return the opposite phase.
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Red => Self::Green,
            Self::Green => Self::Red,
        }
    }

    /// Whether traffic may proceed.
    pub const fn is_green(self) -> bool {
        matches!(self, Self::Green)
    }

    /// Lowercase name of the phase.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Red => "red",
            Self::Green => "green",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_red() {
        assert_eq!(Phase::default(), Phase::Red);
    }

    #[test]
    fn toggle_alternates() {
        assert_eq!(Phase::Red.toggled(), Phase::Green);
        assert_eq!(Phase::Green.toggled(), Phase::Red);
        assert_eq!(Phase::Red.toggled().toggled(), Phase::Red);
    }

    #[test]
    fn only_green_is_green() {
        assert!(Phase::Green.is_green());
        assert!(!Phase::Red.is_green());
    }

    #[test]
    fn serializes_lowercase() {
        let json = serde_json::to_string(&Phase::Green).ok();
        assert_eq!(json.as_deref(), Some("\"green\""));
    }

    #[test]
    fn unknown_name_is_rejected_by_serde() {
        let green: Result<Phase, _> = serde_json::from_str("\"green\"");
        assert_eq!(green.ok(), Some(Phase::Green));
        let amber: Result<Phase, _> = serde_json::from_str("\"amber\"");
        assert!(amber.is_err());
    }
}

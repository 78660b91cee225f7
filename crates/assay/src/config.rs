//! Engine configuration
//!
//! The only knob is the failure severity. It is chosen once, when an
//! [`Assert`](crate::Assert) is constructed, and never changes afterwards.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AssayError;

/// Environment variable consulted by [`Mode::from_env`]
pub const MODE_ENV: &str = "ASSAY_MODE";

/// Failure severity policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Failures are recorded and the test keeps running
    #[default]
    Lenient,
    /// The first failure aborts the test
    Strict,
}

impl Mode {
    /// Map the boolean strictness flag onto a mode
    pub fn from_strict(strict: bool) -> Self {
        if strict {
            Mode::Strict
        } else {
            Mode::Lenient
        }
    }

    /// Check if failures abort the test
    pub fn is_strict(&self) -> bool {
        matches!(self, Mode::Strict)
    }

    /// Read the mode from `ASSAY_MODE`, falling back to the default.
    ///
    /// An unparseable value is logged and ignored.
    pub fn from_env() -> Self {
        match std::env::var(MODE_ENV) {
            Ok(raw) => raw.parse().unwrap_or_else(|e: AssayError| {
                tracing::warn!("Ignoring {}: {}", MODE_ENV, e);
                Mode::default()
            }),
            Err(_) => Mode::default(),
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mode::Lenient => write!(f, "lenient"),
            Mode::Strict => write!(f, "strict"),
        }
    }
}

impl FromStr for Mode {
    type Err = AssayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "lenient" | "soft" | "false" | "0" => Ok(Mode::Lenient),
            "strict" | "hard" | "true" | "1" => Ok(Mode::Strict),
            _ => Err(AssayError::InvalidMode(s.to_string())),
        }
    }
}

impl From<bool> for Mode {
    fn from(strict: bool) -> Self {
        Mode::from_strict(strict)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_from_strict() {
        assert_eq!(Mode::from(true), Mode::Strict);
        assert_eq!(Mode::from(false), Mode::Lenient);
        assert!(Mode::Strict.is_strict());
        assert!(!Mode::default().is_strict());
    }

    #[test]
    fn test_mode_parse() {
        assert_eq!("strict".parse::<Mode>().unwrap(), Mode::Strict);
        assert_eq!(" Lenient ".parse::<Mode>().unwrap(), Mode::Lenient);
        assert_eq!("1".parse::<Mode>().unwrap(), Mode::Strict);
        assert!("loud".parse::<Mode>().is_err());
    }

    #[test]
    fn test_mode_display_roundtrips_through_parse() {
        for mode in [Mode::Lenient, Mode::Strict] {
            assert_eq!(mode.to_string().parse::<Mode>().unwrap(), mode);
        }
    }

    #[test]
    fn test_mode_serde() {
        assert_eq!(serde_json::to_string(&Mode::Strict).unwrap(), "\"strict\"");
        let mode: Mode = serde_json::from_str("\"lenient\"").unwrap();
        assert_eq!(mode, Mode::Lenient);
    }
}

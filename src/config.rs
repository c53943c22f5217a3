use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Result, UschedError};

/// Environment variable consulted for the quantum when no flag is given.
pub const QUANTUM_ENV_VAR: &str = "USPS_QUANTUM_MSEC";

/// Where command lines are read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    Stdin,
    File(PathBuf),
}

/// Resolved scheduler configuration. The quantum is fixed for the lifetime
/// of the run; there is no way to change it once dispatch has started.
#[derive(Debug, Clone)]
pub struct Config {
    pub quantum: Duration,
    pub input: InputSource,
}

impl Config {
    /// Resolve configuration from the CLI flag, the environment, and the
    /// optional commands file. The flag takes precedence over the
    /// environment; with neither present startup fails before any job is
    /// launched.
    pub fn resolve(
        flag_ms: Option<u64>,
        env_ms: Option<&str>,
        file: Option<PathBuf>,
    ) -> Result<Self> {
        let quantum_ms = match (flag_ms, env_ms) {
            (Some(ms), _) => ms,
            (None, Some(raw)) => raw
                .trim()
                .parse::<u64>()
                .map_err(|_| UschedError::InvalidQuantum(raw.to_string()))?,
            (None, None) => return Err(UschedError::MissingQuantum),
        };

        if quantum_ms == 0 {
            return Err(UschedError::InvalidQuantum(quantum_ms.to_string()));
        }

        Ok(Self {
            quantum: Duration::from_millis(quantum_ms),
            input: match file {
                Some(path) => InputSource::File(path),
                None => InputSource::Stdin,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_alone_sets_quantum() {
        let cfg = Config::resolve(Some(250), None, None).unwrap();
        assert_eq!(cfg.quantum, Duration::from_millis(250));
        assert_eq!(cfg.input, InputSource::Stdin);
    }

    #[test]
    fn flag_takes_precedence_over_env() {
        let cfg = Config::resolve(Some(100), Some("900"), None).unwrap();
        assert_eq!(cfg.quantum, Duration::from_millis(100));
    }

    #[test]
    fn env_used_when_flag_absent() {
        let cfg = Config::resolve(None, Some("40"), None).unwrap();
        assert_eq!(cfg.quantum, Duration::from_millis(40));
    }

    #[test]
    fn env_value_is_trimmed() {
        let cfg = Config::resolve(None, Some(" 75 "), None).unwrap();
        assert_eq!(cfg.quantum, Duration::from_millis(75));
    }

    #[test]
    fn missing_quantum_is_an_error() {
        let err = Config::resolve(None, None, None).unwrap_err();
        assert!(matches!(err, UschedError::MissingQuantum));
    }

    #[test]
    fn unparsable_env_is_an_error() {
        let err = Config::resolve(None, Some("fast"), None).unwrap_err();
        assert!(matches!(err, UschedError::InvalidQuantum(_)));
    }

    #[test]
    fn negative_env_is_an_error() {
        let err = Config::resolve(None, Some("-5"), None).unwrap_err();
        assert!(matches!(err, UschedError::InvalidQuantum(_)));
    }

    #[test]
    fn zero_quantum_is_an_error() {
        let err = Config::resolve(Some(0), None, None).unwrap_err();
        assert!(matches!(err, UschedError::InvalidQuantum(_)));
    }

    #[test]
    fn file_argument_selects_file_input() {
        let cfg = Config::resolve(Some(10), None, Some(PathBuf::from("jobs.txt"))).unwrap();
        assert_eq!(cfg.input, InputSource::File(PathBuf::from("jobs.txt")));
    }
}

use crate::error::TreefallError;
use log::warn;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Timeout and retry policy shared by every network collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkPolicy {
    pub timeout_ms: u64,
    /// Total tries per call, the first one included
    pub max_attempts: u32,
    /// Pause before the second try; grows linearly with each retry
    pub backoff_ms: u64,
}

impl Default for NetworkPolicy {
    fn default() -> Self {
        Self {
            timeout_ms: 30_000,
            max_attempts: 3,
            backoff_ms: 500,
        }
    }
}

impl NetworkPolicy {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }
}

/// Runs `call` with the policy timeout, retrying transient failures.
///
/// Permanent errors (see [`TreefallError::is_transient`]) are returned
/// immediately.
pub fn with_retries<T>(
    policy: &NetworkPolicy,
    what: &str,
    mut call: impl FnMut(Duration) -> Result<T, TreefallError>,
) -> Result<T, TreefallError> {
    let attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match call(policy.timeout()) {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() && attempt < attempts => {
                warn!("{} failed (attempt {}/{}): {}", what, attempt, attempts, e);
                std::thread::sleep(policy.backoff() * attempt);
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_policy(max_attempts: u32) -> NetworkPolicy {
        NetworkPolicy {
            timeout_ms: 1_000,
            max_attempts,
            backoff_ms: 0,
        }
    }

    #[test]
    fn test_retries_transient_until_success() -> Result<(), TreefallError> {
        let mut calls = 0;
        let value = with_retries(&fast_policy(3), "lookup", |_| {
            calls += 1;
            if calls < 3 {
                Err(TreefallError::NetworkError("connection reset".into()))
            } else {
                Ok(7)
            }
        })?;
        assert_eq!(value, 7);
        assert_eq!(calls, 3);
        Ok(())
    }

    #[test]
    fn test_gives_up_after_max_attempts() {
        let mut calls = 0;
        let result: Result<(), TreefallError> = with_retries(&fast_policy(2), "lookup", |_| {
            calls += 1;
            Err(TreefallError::NetworkError("timeout".into()))
        });
        assert!(result.is_err());
        assert_eq!(calls, 2);
    }

    #[test]
    fn test_permanent_error_not_retried() {
        let mut calls = 0;
        let result: Result<(), TreefallError> = with_retries(&fast_policy(5), "lookup", |_| {
            calls += 1;
            Err(TreefallError::GeocodeFailed("ZERO_RESULTS".into()))
        });
        assert!(matches!(result, Err(TreefallError::GeocodeFailed(_))));
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_timeout_passed_to_call() -> Result<(), TreefallError> {
        let seen = with_retries(&fast_policy(1), "lookup", Ok)?;
        assert_eq!(seen, Duration::from_secs(1));
        Ok(())
    }

    #[test]
    fn test_policy_deserializes_with_defaults() -> Result<(), TreefallError> {
        let policy: NetworkPolicy = serde_json::from_str(r#"{"max_attempts": 1}"#)
            .map_err(|e| TreefallError::ConfigError(e.to_string()))?;
        assert_eq!(policy.max_attempts, 1);
        assert_eq!(policy.timeout(), Duration::from_secs(30));
        Ok(())
    }
}

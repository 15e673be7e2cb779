//! Error types and retry logic
//!
//! Library errors are typed so callers can tell a malformed frame from a
//! misconfigured shortcut. Transport code works in `anyhow::Result` and
//! retries connection attempts with exponential backoff.

use std::future::Future;
use std::time::Duration;

use anyhow::Result;
use thiserror::Error;
use tokio::time::sleep;

/// Failures while decoding or applying y-sync frames.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("invalid message protocol type: {0}")]
    InvalidMessageType(u8),

    #[error("invalid sync type: {0}")]
    InvalidSyncType(u8),

    #[error("invalid awareness type: {0}")]
    InvalidAwarenessType(u8),

    #[error("malformed frame: {0}")]
    Decode(#[from] yrs::encoding::read::Error),

    #[error("failed to apply document update: {0}")]
    Apply(String),
}

/// Failures while parsing or rendering key chords.
///
/// These signal a programming or configuration mistake (a chord that can
/// never be displayed), not a condition to recover from at runtime.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShortcutError {
    #[error("{0} was not mapped to a character")]
    UnmappedKey(String),

    #[error("empty key chord")]
    Empty,

    #[error("key chord {0:?} has modifiers but no key")]
    MissingKey(String),

    #[error("key chord {0:?} names more than one key")]
    MultipleKeys(String),
}

/// Failures while loading `koso.toml`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("unknown keybinding {0:?}")]
    UnknownBinding(String),

    #[error("keybinding {name:?}: {source}")]
    InvalidBinding {
        name: String,
        #[source]
        source: ShortcutError,
    },
}

/// Retry policy configuration
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of retry attempts
    pub max_attempts: u32,

    /// Initial delay between retries
    pub initial_delay: Duration,

    /// Exponential backoff multiplier
    pub backoff_multiplier: f64,

    /// Maximum delay between retries
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(100),
            backoff_multiplier: 2.0,
            max_delay: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    /// Create a no-retry policy
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Default::default()
        }
    }

    /// Create an aggressive retry policy
    pub fn aggressive() -> Self {
        Self {
            max_attempts: 5,
            initial_delay: Duration::from_millis(50),
            backoff_multiplier: 1.5,
            max_delay: Duration::from_secs(3),
        }
    }

    fn next_delay(&self, delay: Duration) -> Duration {
        Duration::from_secs_f64(
            (delay.as_secs_f64() * self.backoff_multiplier).min(self.max_delay.as_secs_f64()),
        )
    }
}

/// Execute an async operation with retry logic
pub async fn with_retry<F, Fut, T, E>(policy: &RetryPolicy, mut operation: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut attempts = 0;
    let mut delay = policy.initial_delay;

    loop {
        attempts += 1;

        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) => {
                if attempts >= policy.max_attempts {
                    return Err(anyhow::anyhow!(
                        "Operation failed after {} attempts: {}",
                        attempts,
                        e
                    ));
                }

                tracing::warn!(
                    "Attempt {}/{} failed: {}. Retrying in {:?}...",
                    attempts,
                    policy.max_attempts,
                    e,
                    delay
                );

                sleep(delay).await;
                delay = policy.next_delay(delay);
            }
        }
    }
}

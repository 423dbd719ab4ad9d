//! Error types for the ID engine.
//!
//! ## Error Cases
//! - `Config`: the engine was constructed with an unset epoch or an instance
//!   ID wider than 10 bits. Recoverable: fix the [`Options`] and retry.
//! - `Stopped`: an ID was requested from (or a second stop issued to) an
//!   engine that has already been stopped. Terminal for that engine.
//! - `Spawn`: the operating system refused to start the engine's worker
//!   thread.
//!
//! Sequence exhaustion is not an error; the engine absorbs it by waiting for
//! the next millisecond.
//!
//! [`Options`]: crate::Options

/// A result type defaulting to the crate's [`enum@Error`].
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// All error variants that `flurry` can emit.
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// The engine options were rejected at construction time.
    #[error("invalid engine configuration: {0}")]
    Config(#[from] ConfigError),

    /// The engine has been stopped and can no longer issue IDs.
    #[error("engine is stopped")]
    Stopped,

    /// The worker thread could not be started.
    #[error("failed to spawn engine worker: {0}")]
    Spawn(#[source] std::io::Error),
}

/// Construction-time validation failures.
#[derive(thiserror::Error, Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigError {
    /// The epoch was left at its zero value.
    #[error("missing epoch")]
    MissingEpoch,

    /// The instance ID does not fit in the 10-bit field.
    #[error("instance id {instance_id} does not fit in 10 bits (max {max})")]
    InvalidInstanceId { instance_id: u64, max: u64 },
}

impl Error {
    /// Returns `true` if this error reports a stopped engine.
    pub const fn is_stopped(&self) -> bool {
        matches!(self, Self::Stopped)
    }

    /// Returns the configuration failure, if that is what this error is.
    pub const fn as_config(&self) -> Option<&ConfigError> {
        match self {
            Self::Config(e) => Some(e),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_errors_render_their_cause() {
        let err = Error::from(ConfigError::InvalidInstanceId {
            instance_id: 1024,
            max: 1023,
        });
        assert_eq!(
            err.to_string(),
            "invalid engine configuration: instance id 1024 does not fit in 10 bits (max 1023)"
        );
        assert_eq!(
            err.as_config(),
            Some(&ConfigError::InvalidInstanceId {
                instance_id: 1024,
                max: 1023
            })
        );
        assert!(!err.is_stopped());
    }

    #[test]
    fn stopped_is_not_a_config_error() {
        let err = Error::Stopped;
        assert!(err.is_stopped());
        assert!(err.as_config().is_none());
        assert_eq!(err.to_string(), "engine is stopped");
    }
}

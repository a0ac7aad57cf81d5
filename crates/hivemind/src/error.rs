//! # Error Types
//!
//! Everything that can stop a controller, plus the transport error the relay
//! reports. Per-tick failures of user logic are NOT errors at this level: they
//! are logged by the packet loop and swallowed.

use hivemind_shared::GROUP_ID_ENV;
use thiserror::Error;

/// Error returned by user hooks.
pub type HookError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type for user hooks.
pub type HookResult<T> = Result<T, HookError>;

/// Errors reported by a [`Relay`](crate::relay::Relay).
#[derive(Error, Debug)]
pub enum RelayError {
    /// An operation that needs a connection was called before `connect`.
    #[error("relay is not connected")]
    NotConnected,

    /// The host refused a message.
    #[error("message rejected: {0}")]
    Rejected(String),

    /// Socket-level failure.
    #[error("relay i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration errors. Both are fatal at startup.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The required session identifier is missing.
    #[error("{} environment variable is not set", GROUP_ID_ENV)]
    MissingGroupId,

    /// The server port is not a valid TCP port.
    #[error("invalid server port {value:?}")]
    InvalidPort {
        /// Raw value that failed to parse.
        value: String,
    },
}

/// Fatal controller errors.
#[derive(Error, Debug)]
pub enum HivemindError {
    /// Startup configuration was unusable.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The user initialization hook failed. Nothing may run after this.
    #[error("hivemind {unit} failed to initialize: {source}")]
    InitializationFailed {
        /// Best-known identity of the controlled units.
        unit: String,
        /// What the hook reported.
        #[source]
        source: HookError,
    },

    /// [`Controller::run`](crate::controller::Controller::run) was called on a
    /// controller whose session already ended. A controller runs one session.
    #[error("hivemind session already ran; create a new controller")]
    SessionEnded,

    /// The transport failed outside of best-effort sends.
    #[error(transparent)]
    Relay(#[from] RelayError),
}

/// A user hook panicked. The payload is kept as text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("hook panicked: {0}")]
pub struct HookPanicked(pub String);

/// Result type for controller operations.
pub type HivemindResult<T> = Result<T, HivemindError>;

/// Turns a caught panic payload into something loggable.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_group_id_message_names_variable() {
        let message = ConfigError::MissingGroupId.to_string();
        assert!(message.contains(GROUP_ID_ENV));
    }

    #[test]
    fn test_initialization_failure_keeps_source() {
        let err = HivemindError::InitializationFailed {
            unit: "Alpha".into(),
            source: "bad loadout".into(),
        };
        assert_eq!(err.to_string(), "hivemind Alpha failed to initialize: bad loadout");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_panic_message_variants() {
        let static_payload: Box<dyn std::any::Any + Send> = Box::new("boom");
        let owned_payload: Box<dyn std::any::Any + Send> = Box::new(String::from("bang"));
        let other_payload: Box<dyn std::any::Any + Send> = Box::new(7_u8);

        assert_eq!(panic_message(static_payload.as_ref()), "boom");
        assert_eq!(panic_message(owned_payload.as_ref()), "bang");
        assert_eq!(panic_message(other_payload.as_ref()), "non-string panic payload");
    }

    #[test]
    fn test_hook_panicked_boxes_into_hook_error() {
        let err: HookError = Box::new(HookPanicked("boom".into()));
        assert_eq!(err.to_string(), "hook panicked: boom");
        assert!(err.downcast_ref::<HookPanicked>().is_some());
    }
}

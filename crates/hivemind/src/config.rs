//! # Controller Configuration
//!
//! The launcher hands a controller exactly two values through the
//! environment: a required group id and an optional server port. Everything
//! else is chosen by the embedding application.

use hivemind_shared::{DEFAULT_SERVER_PORT, GROUP_ID_ENV, SERVER_PORT_ENV};

use crate::error::ConfigError;
use crate::relay::ConnectionSettings;

/// Controller configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HivemindConfig {
    /// Session identifier issued by the launcher.
    pub group_id: String,
    /// Port the host listens on.
    pub server_port: u16,
    /// Ask the host to forward match communications.
    pub wants_match_communications: bool,
    /// Ask the host to stream ball predictions.
    pub wants_ball_predictions: bool,
}

impl Default for HivemindConfig {
    fn default() -> Self {
        Self {
            group_id: String::new(),
            server_port: DEFAULT_SERVER_PORT,
            wants_match_communications: true,
            wants_ball_predictions: true,
        }
    }
}

impl HivemindConfig {
    /// Creates a configuration for the given group id with default options.
    #[must_use]
    pub fn new(group_id: impl Into<String>) -> Self {
        Self {
            group_id: group_id.into(),
            ..Self::default()
        }
    }

    /// Reads the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// [`ConfigError::MissingGroupId`] if the group id is absent and
    /// [`ConfigError::InvalidPort`] if the port does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Same as [`HivemindConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let group_id = lookup(GROUP_ID_ENV).ok_or(ConfigError::MissingGroupId)?;

        let server_port = match lookup(SERVER_PORT_ENV) {
            Some(value) => value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidPort { value })?,
            None => DEFAULT_SERVER_PORT,
        };

        Ok(Self {
            group_id,
            server_port,
            ..Self::default()
        })
    }

    /// Sets whether match communications are requested.
    #[must_use]
    pub fn with_match_communications(mut self, wanted: bool) -> Self {
        self.wants_match_communications = wanted;
        self
    }

    /// Sets whether ball predictions are requested.
    #[must_use]
    pub fn with_ball_predictions(mut self, wanted: bool) -> Self {
        self.wants_ball_predictions = wanted;
        self
    }

    /// Overrides the server port.
    #[must_use]
    pub fn with_server_port(mut self, port: u16) -> Self {
        self.server_port = port;
        self
    }

    /// What to announce when connecting.
    #[must_use]
    pub fn connection_settings(&self) -> ConnectionSettings {
        ConnectionSettings {
            group_id: self.group_id.clone(),
            wants_match_communications: self.wants_match_communications,
            wants_ball_predictions: self.wants_ball_predictions,
            server_port: self.server_port,
        }
    }
}

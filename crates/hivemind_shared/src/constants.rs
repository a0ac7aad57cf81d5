//! # Session Constants
//!
//! Values the launcher and the controller must agree on.
//!
//! **CRITICAL:** the environment variable names are set by the host's
//! launcher. Renaming them breaks every bot it starts.

/// Environment variable carrying the group/session identifier (required).
pub const GROUP_ID_ENV: &str = "RLBOT_GROUP_ID";

/// Environment variable carrying the server port (optional).
pub const SERVER_PORT_ENV: &str = "RLBOT_SERVER_PORT";

/// Port the host listens on when [`SERVER_PORT_ENV`] is not set.
pub const DEFAULT_SERVER_PORT: u16 = 23234;

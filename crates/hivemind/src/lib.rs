//! # Hivemind
//!
//! One process acting as a single controller for several units, talking to
//! the simulation host through a [`Relay`].
//!
//! ## Architecture
//!
//! - **Handshake**: match settings, field info and player mapping arrive in
//!   any order; initialization runs exactly once, after the last of them
//! - **Packet loop**: newest tick wins, one failing tick never stops the loop
//! - **Render batching**: named, hashed groups with locally-owned bulk clear
//! - **Game state**: sparse index maps become dense desired-state lists
//!
//! ```text
//!            ┌──────────── Controller ────────────┐
//! Relay ────▶│ dispatch ─▶ HandshakeTracker       │
//!            │          ─▶ PacketLoop ─▶ Hivemind │──▶ Relay
//!            │             RenderBatcher          │
//!            └────────────────────────────────────┘
//! ```
//!
//! The library never installs a `tracing` subscriber; that is up to the
//! embedding application.
//!
//! ## Example
//!
//! ```rust,ignore
//! use hivemind::{launch, Hivemind, HivemindContext, HookResult, Outputs};
//! use hivemind_shared::{ControllerState, GamePacket};
//!
//! struct FullThrottle;
//!
//! impl Hivemind for FullThrottle {
//!     fn get_outputs(&mut self, _: &GamePacket, ctx: &mut HivemindContext<'_>) -> HookResult<Outputs> {
//!         let state = ControllerState { throttle: 1.0, ..ControllerState::default() };
//!         Ok(ctx.indices().into_iter().map(|i| (i, state)).collect())
//!     }
//! }
//!
//! fn main() -> std::process::ExitCode {
//!     launch(my_socket_relay(), FullThrottle)
//! }
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod config;
pub mod controller;
pub mod error;
pub mod game_state;
pub mod handshake;
pub mod hooks;
pub mod mailbox;
pub mod match_comm;
pub mod packet_loop;
pub mod relay;
pub mod render;
pub mod roster;

pub use config::HivemindConfig;
pub use controller::{launch, Controller};
pub use error::{
    ConfigError, HivemindError, HivemindResult, HookError, HookPanicked, HookResult, RelayError,
};
pub use game_state::{dense_sequence, GameStateUpdate};
pub use handshake::{Convergence, HandshakeTracker};
pub use hooks::{Hivemind, HivemindContext, Outputs};
pub use mailbox::FrameMailbox;
pub use match_comm::ReceivedComm;
pub use packet_loop::{LoopStats, PacketLoop, TickOutcome};
pub use relay::{ConnectionSettings, MockHost, MockRelay, Received, Relay};
pub use render::{create_color, group_id, RenderBatcher, Renderer, DEFAULT_GROUP_NAME, MAX_GROUP_ID};
pub use roster::{Roster, RosterEntry, UNKNOWN_UNIT};

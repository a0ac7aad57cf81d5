//! # Hooks
//!
//! What an embedding application implements, and what it gets to see.
//!
//! ```text
//! Controller defines:          Application implements:
//! ┌────────────────────┐       ┌─────────────────────┐
//! │ trait Hivemind     │ ←──── │ impl Hivemind       │
//! │ HivemindContext    │ ────▶ │ (passed to hooks)   │
//! └────────────────────┘       └─────────────────────┘
//! ```
//!
//! Every hook runs on the controller's thread. Errors and panics from
//! [`Hivemind::get_outputs`] cost one tick; from [`Hivemind::initialize`]
//! they stop the controller.

use std::collections::BTreeMap;
use std::panic::{catch_unwind, AssertUnwindSafe};

use hivemind_shared::{
    BallPrediction, ControllerState, FieldInfo, GamePacket, MatchSettings, PlayerLoadout,
};

use crate::error::{panic_message, HookPanicked, HookResult};
use crate::game_state::{self, GameStateUpdate};
use crate::handshake::HandshakeTracker;
use crate::match_comm;
use crate::relay::Relay;
use crate::render::{RenderBatcher, Renderer};
use crate::roster::Roster;

/// Inputs for one tick, keyed by player index.
pub type Outputs = BTreeMap<u32, ControllerState>;

/// User control logic for every unit this process controls.
pub trait Hivemind {
    /// Called once, after the handshake completes and before the first tick.
    ///
    /// # Errors
    ///
    /// Any error is fatal to the controller.
    fn initialize(&mut self, ctx: &mut HivemindContext<'_>) -> HookResult<()> {
        let _ = ctx;
        Ok(())
    }

    /// Computes inputs for the controlled units.
    ///
    /// Entries for indices the host rejects are reported and skipped; the
    /// rest are still sent.
    ///
    /// # Errors
    ///
    /// Any error discards this tick's outputs. The next tick runs normally.
    fn get_outputs(&mut self, packet: &GamePacket, ctx: &mut HivemindContext<'_>)
        -> HookResult<Outputs>;

    /// Receives a match communication from any participant.
    ///
    /// # Errors
    ///
    /// Errors are logged and otherwise ignored.
    fn handle_match_communication(
        &mut self,
        ctx: &mut HivemindContext<'_>,
        index: u32,
        team: u32,
        content: &[u8],
        display: Option<&str>,
        team_only: bool,
    ) -> HookResult<()> {
        let _ = (ctx, index, team, content, display, team_only);
        Ok(())
    }

    /// Called once when the controller shuts down, on every exit path.
    fn retire(&mut self) {}
}

/// Runs a hook, turning a panic into a [`HookPanicked`] error.
pub(crate) fn call_hook<T, F>(hook: F) -> HookResult<T>
where
    F: FnOnce() -> HookResult<T>,
{
    match catch_unwind(AssertUnwindSafe(hook)) {
        Ok(result) => result,
        Err(payload) => Err(Box::new(HookPanicked(panic_message(payload.as_ref())))),
    }
}

/// Everything a hook may read or send while it runs.
///
/// Only built once all three handshake payloads are present.
pub struct HivemindContext<'a> {
    relay: &'a mut dyn Relay,
    batcher: &'a mut RenderBatcher,
    match_settings: &'a MatchSettings,
    field_info: &'a FieldInfo,
    team: u32,
    roster: &'a Roster,
    ball_prediction: &'a BallPrediction,
}

impl<'a> HivemindContext<'a> {
    /// Builds a context, or `None` while the handshake is incomplete.
    pub(crate) fn new(
        relay: &'a mut dyn Relay,
        batcher: &'a mut RenderBatcher,
        handshake: &'a HandshakeTracker,
        roster: &'a Roster,
        ball_prediction: &'a BallPrediction,
    ) -> Option<Self> {
        Some(Self {
            match_settings: handshake.match_settings()?,
            field_info: handshake.field_info()?,
            team: handshake.player_mapping()?.team,
            relay,
            batcher,
            roster,
            ball_prediction,
        })
    }

    /// Latest match settings.
    #[must_use]
    pub fn match_settings(&self) -> &MatchSettings {
        self.match_settings
    }

    /// Latest field info.
    #[must_use]
    pub fn field_info(&self) -> &FieldInfo {
        self.field_info
    }

    /// Ball prediction as of the start of this tick. Empty when predictions
    /// are disabled or none has arrived yet.
    #[must_use]
    pub fn ball_prediction(&self) -> &BallPrediction {
        self.ball_prediction
    }

    /// Team of the controlled units.
    #[must_use]
    pub fn team(&self) -> u32 {
        self.team
    }

    /// The controlled units.
    #[must_use]
    pub fn roster(&self) -> &Roster {
        self.roster
    }

    /// Player indices of the controlled units.
    #[must_use]
    pub fn indices(&self) -> Vec<u32> {
        self.roster.indices()
    }

    /// Spawn ids, parallel to [`HivemindContext::indices`].
    #[must_use]
    pub fn spawn_ids(&self) -> Vec<i32> {
        self.roster.spawn_ids()
    }

    /// Names, parallel to [`HivemindContext::indices`].
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.roster.names()
    }

    /// Debug drawing.
    pub fn renderer(&mut self) -> Renderer<'_> {
        Renderer::new(&mut *self.batcher, &mut *self.relay)
    }

    /// Sends a match communication on behalf of unit `index`.
    pub fn send_match_comm(
        &mut self,
        index: u32,
        content: Vec<u8>,
        display: Option<String>,
        team_only: bool,
    ) {
        match_comm::send(&mut *self.relay, index, self.team, content, display, team_only);
    }

    /// Sets balls, cars, game info and console commands in one message.
    pub fn set_game_state(&mut self, update: GameStateUpdate) {
        game_state::write_game_state(&mut *self.relay, update);
    }

    /// Sets the loadout of the unit spawned as `spawn_id`.
    pub fn set_loadout(&mut self, loadout: PlayerLoadout, spawn_id: i32) {
        game_state::write_loadout(&mut *self.relay, loadout, spawn_id);
    }
}

//! # Game State Writer
//!
//! Users address balls and cars by index in sparse maps. The host wants dense
//! lists where position `i` is ball/car `i`, so the gaps are filled with
//! default ("leave unchanged") states.
//!
//! ```text
//! { 3: X }  ──▶  [ default, default, default, X ]
//! { }       ──▶  omitted (empty list), never a list of defaults
//! ```

use std::collections::BTreeMap;

use hivemind_shared::{
    ConsoleCommand, DesiredBallState, DesiredCarState, DesiredGameInfoState, DesiredGameState,
    PlayerLoadout, SetLoadout,
};

use crate::relay::Relay;

/// Converts a sparse index map into a dense sequence of length `max_key + 1`.
///
/// Absent indices get `T::default()`. An empty map yields an empty sequence,
/// and so does a map keyed at `usize::MAX`, whose length is unrepresentable.
#[must_use]
pub fn dense_sequence<T: Default>(sparse: BTreeMap<usize, T>) -> Vec<T> {
    let Some(&max_key) = sparse.keys().next_back() else {
        return Vec::new();
    };
    let Some(len) = max_key.checked_add(1) else {
        tracing::warn!(index = max_key, "desired state index out of range; dropping update");
        return Vec::new();
    };

    let mut dense: Vec<T> = std::iter::repeat_with(T::default).take(len).collect();
    for (index, value) in sparse {
        dense[index] = value;
    }
    dense
}

/// Sparse desired-state request, built up by the caller and converted once.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GameStateUpdate {
    /// Ball index → desired state.
    pub balls: BTreeMap<usize, DesiredBallState>,
    /// Car index → desired state.
    pub cars: BTreeMap<usize, DesiredCarState>,
    /// Match-wide state.
    pub game_info: Option<DesiredGameInfoState>,
    /// Console commands, executed in order.
    pub commands: Vec<ConsoleCommand>,
}

impl GameStateUpdate {
    /// Creates an empty request.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the desired state of ball `index`.
    #[must_use]
    pub fn ball(mut self, index: usize, state: DesiredBallState) -> Self {
        self.balls.insert(index, state);
        self
    }

    /// Sets the desired state of car `index`.
    #[must_use]
    pub fn car(mut self, index: usize, state: DesiredCarState) -> Self {
        self.cars.insert(index, state);
        self
    }

    /// Sets the match-wide state.
    #[must_use]
    pub fn game_info(mut self, state: DesiredGameInfoState) -> Self {
        self.game_info = Some(state);
        self
    }

    /// Appends a console command.
    #[must_use]
    pub fn command(mut self, command: impl Into<String>) -> Self {
        self.commands.push(ConsoleCommand::new(command));
        self
    }

    /// Builds the combined desired-state command.
    #[must_use]
    pub fn into_desired_state(self) -> DesiredGameState {
        DesiredGameState {
            ball_states: dense_sequence(self.balls),
            car_states: dense_sequence(self.cars),
            game_info_state: self.game_info,
            console_commands: self.commands,
        }
    }
}

/// Sends `update` as one desired-state message. Fire and forget: a failed
/// send is logged and dropped.
pub fn write_game_state<R: Relay + ?Sized>(relay: &mut R, update: GameStateUpdate) {
    if let Err(e) = relay.send_game_state(update.into_desired_state()) {
        tracing::warn!(error = %e, "failed to send desired game state");
    }
}

/// Sends a loadout for `spawn_id`. Fire and forget.
///
/// Outside of initialization the host ignores this unless state setting is
/// enabled for the match.
pub fn write_loadout<R: Relay + ?Sized>(relay: &mut R, loadout: PlayerLoadout, spawn_id: i32) {
    if let Err(e) = relay.send_set_loadout(SetLoadout { spawn_id, loadout }) {
        tracing::warn!(spawn_id, error = %e, "failed to send loadout");
    }
}

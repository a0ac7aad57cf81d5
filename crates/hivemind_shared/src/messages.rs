//! Messages exchanged with the simulation host.
//!
//! [`CoreMessage`] flows host → controller, [`InterfaceMessage`] flows
//! controller → host. The controller only inspects the fields it needs for
//! orchestration (spawn ids, indices, team, player count); everything else is
//! carried through to user code untouched.

use serde::{Deserialize, Serialize};

use crate::math::{Rotator, Vec3};
use crate::render::RenderGroup;
use crate::state::{DesiredGameState, SetLoadout};

// =============================================================================
// HANDSHAKE PAYLOADS
// =============================================================================

/// One participant as configured for the match.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerConfiguration {
    /// Display name.
    pub name: String,
    /// Team number (0 = blue, 1 = orange).
    pub team: u32,
    /// Identity that survives respawns.
    pub spawn_id: i32,
}

/// Match-wide settings: map, mutators, participants.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchSettings {
    /// Everyone taking part in the match.
    pub player_configurations: Vec<PlayerConfiguration>,
    /// Map asset name.
    pub game_map_upk: String,
    /// Whether desired-state messages are honoured outside of initialization.
    pub enable_state_setting: bool,
    /// Whether render groups are drawn.
    pub enable_rendering: bool,
}

impl MatchSettings {
    /// Looks up a configured participant by spawn id.
    #[must_use]
    pub fn player_by_spawn_id(&self, spawn_id: i32) -> Option<&PlayerConfiguration> {
        self.player_configurations
            .iter()
            .find(|player| player.spawn_id == spawn_id)
    }
}

/// A boost pad on the field.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BoostPad {
    /// World location.
    pub location: Vec3,
    /// Large (100) pad if true, small pad otherwise.
    pub is_full_boost: bool,
}

/// A goal on the field.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GoalInfo {
    /// Owning team.
    pub team_num: u32,
    /// Centre of the goal mouth.
    pub location: Vec3,
    /// Direction the goal faces.
    pub direction: Vec3,
    /// Goal width.
    pub width: f32,
    /// Goal height.
    pub height: f32,
}

/// Static field geometry.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldInfo {
    /// Boost pads in host order.
    pub boost_pads: Vec<BoostPad>,
    /// Goals in host order.
    pub goals: Vec<GoalInfo>,
}

/// One unit this process is allowed to control.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllableInfo {
    /// Current index into [`GamePacket::players`].
    pub index: u32,
    /// Identity that survives respawns.
    pub spawn_id: i32,
}

/// The player mapping: which units this process controls, and for which team.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllableTeamInfo {
    /// Team all controllables belong to.
    pub team: u32,
    /// Controlled units.
    pub controllables: Vec<ControllableInfo>,
}

// =============================================================================
// STEADY-STATE PAYLOADS
// =============================================================================

/// Inter-unit communication.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchComm {
    /// Index of the sending unit.
    pub index: u32,
    /// Team of the sending unit.
    pub team: u32,
    /// Only deliver to the sender's team.
    pub team_only: bool,
    /// Optional message shown in game.
    pub display: Option<String>,
    /// Arbitrary payload.
    pub content: Vec<u8>,
}

/// One predicted ball position.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PredictionSlice {
    /// Game time of this slice.
    pub game_seconds: f32,
    /// Predicted location.
    pub location: Vec3,
    /// Predicted velocity.
    pub velocity: Vec3,
}

/// Predicted ball path using only field geometry.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BallPrediction {
    /// Slices in time order.
    pub slices: Vec<PredictionSlice>,
}

/// Per-player state inside a tick.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerInfo {
    /// Display name.
    pub name: String,
    /// Identity that survives respawns.
    pub spawn_id: i32,
    /// Team number.
    pub team: u32,
    /// World location.
    pub location: Vec3,
    /// Linear velocity.
    pub velocity: Vec3,
    /// Orientation.
    pub rotation: Rotator,
    /// Boost amount (0-100).
    pub boost: f32,
    /// Currently demolished.
    pub is_demolished: bool,
}

/// Per-ball state inside a tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BallInfo {
    /// World location.
    pub location: Vec3,
    /// Linear velocity.
    pub velocity: Vec3,
}

/// One simulation tick.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GamePacket {
    /// Host frame counter.
    pub frame_num: u32,
    /// Seconds since kickoff.
    pub seconds_elapsed: f32,
    /// All players, indexed by [`ControllableInfo::index`].
    pub players: Vec<PlayerInfo>,
    /// All balls.
    pub balls: Vec<BallInfo>,
}

// =============================================================================
// CONTROL OUTPUT
// =============================================================================

/// Analog and digital inputs for one unit for one tick.
///
/// The default is "hands off": everything zero/false.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ControllerState {
    /// -1 (reverse) to 1 (forward)
    pub throttle: f32,
    /// -1 (left) to 1 (right)
    pub steer: f32,
    /// -1 (nose down) to 1 (nose up)
    pub pitch: f32,
    /// -1 (left) to 1 (right)
    pub yaw: f32,
    /// -1 (left) to 1 (right)
    pub roll: f32,
    /// Jump held
    pub jump: bool,
    /// Boost held
    pub boost: bool,
    /// Handbrake held
    pub handbrake: bool,
    /// Use item held
    pub use_item: bool,
}

/// A [`ControllerState`] addressed to one player index.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerInput {
    /// Target index into [`GamePacket::players`].
    pub player_index: u32,
    /// Inputs to apply.
    pub controller_state: ControllerState,
}

impl PlayerInput {
    /// Creates a new input message.
    #[must_use]
    pub const fn new(player_index: u32, controller_state: ControllerState) -> Self {
        Self {
            player_index,
            controller_state,
        }
    }
}

// =============================================================================
// ENVELOPES
// =============================================================================

/// Everything the host can send to a controller.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum CoreMessage {
    /// Match settings (handshake).
    MatchSettings(MatchSettings),
    /// Field geometry (handshake).
    FieldInfo(FieldInfo),
    /// Player mapping (handshake).
    ControllableTeamInfo(ControllableTeamInfo),
    /// Inter-unit communication.
    MatchComm(MatchComm),
    /// Latest ball prediction.
    BallPrediction(BallPrediction),
    /// One simulation tick.
    GamePacket(GamePacket),
}

/// Everything a controller can send to the host.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum InterfaceMessage {
    /// Apply inputs to one unit.
    PlayerInput(PlayerInput),
    /// Draw (or replace) a render group.
    RenderGroup(RenderGroup),
    /// Remove a render group by id.
    RemoveRenderGroup {
        /// Group id to remove.
        id: u32,
    },
    /// Inter-unit communication.
    MatchComm(MatchComm),
    /// Set the game state.
    DesiredGameState(DesiredGameState),
    /// Set a unit's loadout.
    SetLoadout(SetLoadout),
    /// Handshake finished and user initialization succeeded.
    InitComplete,
}

//! Desired-state and loadout payloads.
//!
//! Every field of a desired state is optional: `None` means "leave as is".
//! A default-constructed state therefore changes nothing, which is what the
//! controller uses to pad sparse index maps.

use serde::{Deserialize, Serialize};

use crate::math::{Rotator, Vec3};

/// Physics overrides for a ball or car.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DesiredPhysics {
    /// Teleport to this location.
    pub location: Option<Vec3>,
    /// Set this orientation.
    pub rotation: Option<Rotator>,
    /// Set this linear velocity.
    pub velocity: Option<Vec3>,
    /// Set this angular velocity.
    pub angular_velocity: Option<Vec3>,
}

/// Desired state for one ball.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DesiredBallState {
    /// Physics overrides.
    pub physics: DesiredPhysics,
}

/// Desired state for one car.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DesiredCarState {
    /// Physics overrides.
    pub physics: DesiredPhysics,
    /// Boost amount (0-100).
    pub boost_amount: Option<f32>,
}

/// Desired match-wide state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DesiredGameInfoState {
    /// Gravity along Z.
    pub world_gravity_z: Option<f32>,
    /// Simulation speed multiplier.
    pub game_speed: Option<f32>,
    /// Pause or resume.
    pub paused: Option<bool>,
    /// End the match.
    pub end_match: Option<bool>,
}

/// A console command executed by the host.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsoleCommand {
    /// Raw command text.
    pub command: String,
}

impl ConsoleCommand {
    /// Wraps a command string.
    #[must_use]
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

/// Combined desired-state command.
///
/// `ball_states` and `car_states` are dense: position `i` addresses ball/car
/// `i`. An empty list means "do not touch this dimension" and is left out of
/// the serialized form.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DesiredGameState {
    /// Dense ball states.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ball_states: Vec<DesiredBallState>,
    /// Dense car states.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub car_states: Vec<DesiredCarState>,
    /// Match-wide state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game_info_state: Option<DesiredGameInfoState>,
    /// Console commands, executed in order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub console_commands: Vec<ConsoleCommand>,
}

/// Cosmetic loadout for one car.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerLoadout {
    /// Primary colour id.
    pub team_color_id: u32,
    /// Secondary colour id.
    pub custom_color_id: u32,
    /// Body id.
    pub car_id: u32,
    /// Decal id.
    pub decal_id: u32,
    /// Wheels id.
    pub wheels_id: u32,
    /// Boost trail id.
    pub boost_id: u32,
    /// Antenna id.
    pub antenna_id: u32,
    /// Topper id.
    pub hat_id: u32,
    /// Paint finish id.
    pub paint_finish_id: u32,
    /// Goal explosion id.
    pub goal_explosion_id: u32,
}

/// Loadout addressed to one spawn id.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetLoadout {
    /// Target unit.
    pub spawn_id: i32,
    /// Loadout to apply.
    pub loadout: PlayerLoadout,
}

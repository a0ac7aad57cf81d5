//! # Hivemind Shared
//!
//! Payload types exchanged between a hivemind controller and the simulation
//! host, plus the handful of constants both sides agree on.
//!
//! ## CRITICAL RULE
//!
//! This crate must NEVER depend on a transport. Framing and serialization
//! belong to the relay; everything here only derives `serde` so that any
//! codec can be plugged in.

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod constants;
pub mod math;
pub mod messages;
pub mod render;
pub mod state;

pub use constants::{DEFAULT_SERVER_PORT, GROUP_ID_ENV, SERVER_PORT_ENV};
pub use math::{Color, Rotator, Vec3};
pub use messages::{
    BallInfo, BallPrediction, BoostPad, ControllableInfo, ControllableTeamInfo, ControllerState,
    CoreMessage, FieldInfo, GamePacket, GoalInfo, InterfaceMessage, MatchComm, MatchSettings,
    PlayerConfiguration, PlayerInfo, PlayerInput, PredictionSlice,
};
pub use render::{
    Line3D, PolyLine3D, Rect2D, Rect3D, RenderAnchor, RenderGroup, RenderMessage, RenderType,
    String2D, String3D, TextHAlign, TextVAlign,
};
pub use state::{
    ConsoleCommand, DesiredBallState, DesiredCarState, DesiredGameInfoState, DesiredGameState,
    DesiredPhysics, PlayerLoadout, SetLoadout,
};

//! # Match Communication Bridge
//!
//! Users see match communications as five plain values; the host sees one
//! structured [`MatchComm`]. This module converts in both directions and does
//! no validation beyond what the types enforce.

use hivemind_shared::MatchComm;

use crate::relay::Relay;

/// Inbound match communication, unpacked.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReceivedComm {
    /// Index of the sending unit.
    pub index: u32,
    /// Team of the sending unit.
    pub team: u32,
    /// Arbitrary payload.
    pub content: Vec<u8>,
    /// Optional message shown in game.
    pub display: Option<String>,
    /// Only delivered to the sender's team.
    pub team_only: bool,
}

impl From<MatchComm> for ReceivedComm {
    fn from(comm: MatchComm) -> Self {
        Self {
            index: comm.index,
            team: comm.team,
            content: comm.content,
            display: comm.display,
            team_only: comm.team_only,
        }
    }
}

/// Packs an outbound communication. `team` is the tracked team id from the
/// player mapping.
#[must_use]
pub fn pack(
    index: u32,
    team: u32,
    content: Vec<u8>,
    display: Option<String>,
    team_only: bool,
) -> MatchComm {
    MatchComm {
        index,
        team,
        team_only,
        display,
        content,
    }
}

/// Packs and sends an outbound communication. Best effort.
pub fn send<R: Relay + ?Sized>(
    relay: &mut R,
    index: u32,
    team: u32,
    content: Vec<u8>,
    display: Option<String>,
    team_only: bool,
) {
    if let Err(e) = relay.send_match_comm(pack(index, team, content, display, team_only)) {
        tracing::warn!(index, error = %e, "failed to send match communication");
    }
}

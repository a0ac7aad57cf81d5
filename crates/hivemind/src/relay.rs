//! # Relay Interface
//!
//! The socket transport is owned by someone else. The controller only needs
//! the surface below: connect once, read one message at a time in blocking or
//! non-blocking mode, send typed messages, disconnect.
//!
//! ```text
//! Controller defines:     Transport implements:
//! ┌─────────────┐         ┌──────────────┐
//! │ trait Relay │ ←────── │ impl Relay   │
//! └─────────────┘         └──────────────┘
//! ```
//!
//! [`MockRelay`] is an in-memory implementation fed by a [`MockHost`]. It is
//! what the tests drive and what embedding applications can use for dry runs.

use std::collections::HashSet;
use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender, TryRecvError};
use hivemind_shared::{
    ControllerState, CoreMessage, DesiredGameState, InterfaceMessage, MatchComm, PlayerInput,
    RenderGroup, SetLoadout,
};
use parking_lot::Mutex;

use crate::error::RelayError;

/// Parameters for [`Relay::connect`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConnectionSettings {
    /// Session identifier issued by the launcher.
    pub group_id: String,
    /// Ask the host to forward match communications.
    pub wants_match_communications: bool,
    /// Ask the host to stream ball predictions.
    pub wants_ball_predictions: bool,
    /// Port the host listens on.
    pub server_port: u16,
}

/// Outcome of one [`Relay::recv`] call.
#[derive(Clone, Debug, PartialEq)]
pub enum Received {
    /// One complete message.
    Message(CoreMessage),
    /// Non-blocking mode and nothing is buffered.
    WouldBlock,
    /// The host closed the connection.
    Closed,
}

/// Transport collaborator.
///
/// All send helpers are best-effort from the controller's point of view: a
/// failure is reported but never retried.
pub trait Relay {
    /// Opens the connection and announces what this client wants.
    ///
    /// # Errors
    ///
    /// Any transport failure while connecting.
    fn connect(&mut self, settings: &ConnectionSettings) -> Result<(), RelayError>;

    /// Switches between blocking and non-blocking reads.
    ///
    /// # Errors
    ///
    /// Any transport failure while reconfiguring the socket.
    fn set_blocking(&mut self, blocking: bool) -> Result<(), RelayError>;

    /// Reads at most one message.
    ///
    /// # Errors
    ///
    /// Any transport failure other than "would block" or "closed".
    fn recv(&mut self) -> Result<Received, RelayError>;

    /// Sends one message.
    ///
    /// # Errors
    ///
    /// Any transport failure while sending.
    fn send(&mut self, message: InterfaceMessage) -> Result<(), RelayError>;

    /// Releases the transport. Called exactly once during teardown.
    fn disconnect(&mut self);

    /// Applies inputs to one unit.
    ///
    /// # Errors
    ///
    /// See [`Relay::send`].
    fn send_player_input(&mut self, input: PlayerInput) -> Result<(), RelayError> {
        self.send(InterfaceMessage::PlayerInput(input))
    }

    /// Draws or replaces a render group.
    ///
    /// # Errors
    ///
    /// See [`Relay::send`].
    fn send_render_group(&mut self, group: RenderGroup) -> Result<(), RelayError> {
        self.send(InterfaceMessage::RenderGroup(group))
    }

    /// Removes a render group.
    ///
    /// # Errors
    ///
    /// See [`Relay::send`].
    fn remove_render_group(&mut self, id: u32) -> Result<(), RelayError> {
        self.send(InterfaceMessage::RemoveRenderGroup { id })
    }

    /// Sends an inter-unit message.
    ///
    /// # Errors
    ///
    /// See [`Relay::send`].
    fn send_match_comm(&mut self, comm: MatchComm) -> Result<(), RelayError> {
        self.send(InterfaceMessage::MatchComm(comm))
    }

    /// Sets the game state.
    ///
    /// # Errors
    ///
    /// See [`Relay::send`].
    fn send_game_state(&mut self, state: DesiredGameState) -> Result<(), RelayError> {
        self.send(InterfaceMessage::DesiredGameState(state))
    }

    /// Sets a unit's loadout.
    ///
    /// # Errors
    ///
    /// See [`Relay::send`].
    fn send_set_loadout(&mut self, loadout: SetLoadout) -> Result<(), RelayError> {
        self.send(InterfaceMessage::SetLoadout(loadout))
    }

    /// Tells the host that initialization finished.
    ///
    /// # Errors
    ///
    /// See [`Relay::send`].
    fn send_init_complete(&mut self) -> Result<(), RelayError> {
        self.send(InterfaceMessage::InitComplete)
    }
}

// ============================================================================
// MOCK IMPLEMENTATION
// ============================================================================

/// What the mock host pushes down the wire.
#[derive(Clone, Debug)]
enum Feed {
    Message(CoreMessage),
    /// Forces one `WouldBlock` in non-blocking mode. Ignored while blocking.
    Stall,
}

/// Observable state shared between a [`MockRelay`] and its [`MockHost`].
#[derive(Debug, Default)]
struct MockState {
    connection: Option<ConnectionSettings>,
    connected: bool,
    blocking: bool,
    blocking_switches: Vec<bool>,
    sent: Vec<InterfaceMessage>,
    rejected_player_indices: HashSet<u32>,
    disconnects: u32,
}

/// In-memory relay.
///
/// Non-blocking reads return [`Received::WouldBlock`] when the feed is empty
/// or a stall was queued; blocking reads wait on the feed. Once every
/// [`MockHost`] is dropped and the feed is drained, reads return
/// [`Received::Closed`].
#[derive(Debug)]
pub struct MockRelay {
    feed: Receiver<Feed>,
    state: Arc<Mutex<MockState>>,
}

/// Host side of a [`MockRelay`]: feeds messages in, inspects what came out.
#[derive(Clone, Debug)]
pub struct MockHost {
    feed: Option<Sender<Feed>>,
    state: Arc<Mutex<MockState>>,
}

impl MockRelay {
    /// Creates a connected pair.
    #[must_use]
    pub fn pair() -> (Self, MockHost) {
        let (sender, receiver) = crossbeam_channel::unbounded();
        let state = Arc::new(Mutex::new(MockState::default()));

        (
            Self {
                feed: receiver,
                state: Arc::clone(&state),
            },
            MockHost {
                feed: Some(sender),
                state,
            },
        )
    }
}

impl Relay for MockRelay {
    fn connect(&mut self, settings: &ConnectionSettings) -> Result<(), RelayError> {
        let mut state = self.state.lock();
        state.connection = Some(settings.clone());
        state.connected = true;
        Ok(())
    }

    fn set_blocking(&mut self, blocking: bool) -> Result<(), RelayError> {
        let mut state = self.state.lock();
        state.blocking = blocking;
        state.blocking_switches.push(blocking);
        Ok(())
    }

    fn recv(&mut self) -> Result<Received, RelayError> {
        let blocking = self.state.lock().blocking;

        if blocking {
            loop {
                match self.feed.recv() {
                    Ok(Feed::Message(message)) => return Ok(Received::Message(message)),
                    Ok(Feed::Stall) => continue,
                    Err(_) => return Ok(Received::Closed),
                }
            }
        }

        match self.feed.try_recv() {
            Ok(Feed::Message(message)) => Ok(Received::Message(message)),
            Ok(Feed::Stall) | Err(TryRecvError::Empty) => Ok(Received::WouldBlock),
            Err(TryRecvError::Disconnected) => Ok(Received::Closed),
        }
    }

    fn send(&mut self, message: InterfaceMessage) -> Result<(), RelayError> {
        let mut state = self.state.lock();
        if !state.connected {
            return Err(RelayError::NotConnected);
        }
        if let InterfaceMessage::PlayerInput(input) = &message {
            if state.rejected_player_indices.contains(&input.player_index) {
                return Err(RelayError::Rejected(format!(
                    "input for player {}",
                    input.player_index
                )));
            }
        }
        state.sent.push(message);
        Ok(())
    }

    fn disconnect(&mut self) {
        let mut state = self.state.lock();
        state.connected = false;
        state.disconnects += 1;
    }
}

impl MockHost {
    fn feed(&self, item: Feed) {
        if let Some(feed) = &self.feed {
            // The receiver only goes away with the relay; nothing to report then.
            let _ = feed.send(item);
        }
    }

    /// Queues a message for the controller. Ignored after [`MockHost::hang_up`].
    pub fn push(&self, message: CoreMessage) {
        self.feed(Feed::Message(message));
    }

    /// Queues a point where a non-blocking read reports "would block".
    pub fn stall(&self) {
        self.feed(Feed::Stall);
    }

    /// Stops feeding. Once every handle has hung up (or been dropped) and the
    /// queue is drained, reads return [`Received::Closed`]. Inspection keeps
    /// working.
    pub fn hang_up(&mut self) {
        self.feed = None;
    }

    /// Makes every future input for `index` fail to send.
    pub fn reject_player_input(&self, index: u32) {
        self.state.lock().rejected_player_indices.insert(index);
    }

    /// Settings passed to the last `connect`.
    #[must_use]
    pub fn connection(&self) -> Option<ConnectionSettings> {
        self.state.lock().connection.clone()
    }

    /// Returns true between `connect` and `disconnect`.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.state.lock().connected
    }

    /// Every blocking-mode switch, in order.
    #[must_use]
    pub fn blocking_switches(&self) -> Vec<bool> {
        self.state.lock().blocking_switches.clone()
    }

    /// Number of `disconnect` calls.
    #[must_use]
    pub fn disconnects(&self) -> u32 {
        self.state.lock().disconnects
    }

    /// Everything the controller sent, in order.
    #[must_use]
    pub fn sent(&self) -> Vec<InterfaceMessage> {
        self.state.lock().sent.clone()
    }

    /// Only the player inputs, in order.
    #[must_use]
    pub fn player_inputs(&self) -> Vec<(u32, ControllerState)> {
        self.state
            .lock()
            .sent
            .iter()
            .filter_map(|message| match message {
                InterfaceMessage::PlayerInput(input) => {
                    Some((input.player_index, input.controller_state))
                }
                _ => None,
            })
            .collect()
    }

    /// Forgets everything sent so far.
    pub fn clear_sent(&self) {
        self.state.lock().sent.clear();
    }
}

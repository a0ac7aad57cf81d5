//! # Controller
//!
//! Composes the handshake, roster, packet loop and render batcher around one
//! relay and one [`Hivemind`].
//!
//! ```text
//! connect ─▶ handshake (any order) ─▶ initialize ─▶ init complete ─▶ tick loop
//!                                                                      │
//!            host closes / fatal error / panic ────────────────────────┘
//!                                  │
//!                                  ▼
//!                       retire() ─▶ disconnect()   (exactly once)
//! ```
//!
//! ## Read Protocol
//!
//! Reads start non-blocking so a backlog drains without stalling. When a read
//! would block:
//!
//! - a tick is waiting: process it
//! - nothing is waiting: switch to blocking and wait for the host
//!
//! The first message read in blocking mode switches back to non-blocking.

use std::process::ExitCode;

use hivemind_shared::CoreMessage;

use crate::config::HivemindConfig;
use crate::error::{HivemindError, HivemindResult};
use crate::handshake::{Convergence, HandshakeTracker};
use crate::hooks::{call_hook, Hivemind, HivemindContext};
use crate::match_comm::ReceivedComm;
use crate::packet_loop::{LoopStats, PacketLoop, TickOutcome};
use crate::relay::{Received, Relay};
use crate::render::RenderBatcher;
use crate::roster::Roster;

/// One hivemind session.
///
/// Dropping a controller whose [`Controller::run`] has started runs teardown
/// if it has not run yet, so a panic unwinding out of the loop still retires
/// the hivemind and releases the relay.
pub struct Controller<R: Relay, H: Hivemind> {
    relay: R,
    hivemind: H,
    config: HivemindConfig,
    handshake: HandshakeTracker,
    roster: Roster,
    packets: PacketLoop,
    batcher: RenderBatcher,
    blocking: bool,
    started: bool,
    retired: bool,
}

impl<R: Relay, H: Hivemind> Controller<R, H> {
    /// Creates a controller. Nothing is sent until [`Controller::run`].
    pub fn new(relay: R, hivemind: H, config: HivemindConfig) -> Self {
        Self {
            relay,
            hivemind,
            config,
            handshake: HandshakeTracker::new(),
            roster: Roster::new(),
            packets: PacketLoop::new(),
            batcher: RenderBatcher::new(),
            blocking: false,
            started: false,
            retired: false,
        }
    }

    /// Connects and drives the session until the host closes the connection.
    ///
    /// Teardown runs before this returns, whatever the outcome. A controller
    /// runs one session; later calls touch nothing.
    ///
    /// # Errors
    ///
    /// Connection failures, relay read failures and a failed initialization.
    /// [`HivemindError::SessionEnded`] if `run` was already called.
    pub fn run(&mut self) -> HivemindResult<()> {
        if self.started {
            tracing::warn!("run called again on a finished hivemind session");
            return Err(HivemindError::SessionEnded);
        }
        self.started = true;
        let result = self.drive();
        self.teardown();
        result
    }

    fn drive(&mut self) -> HivemindResult<()> {
        let settings = self.config.connection_settings();
        self.relay.connect(&settings)?;
        tracing::info!(
            group_id = %settings.group_id,
            port = settings.server_port,
            "hivemind connected"
        );
        self.set_blocking(false)?;

        loop {
            match self.relay.recv()? {
                Received::Message(message) => {
                    if self.blocking {
                        self.set_blocking(false)?;
                    }
                    self.dispatch(message)?;
                }
                Received::WouldBlock => {
                    if self.packets.has_pending() {
                        self.process_pending();
                    } else {
                        self.set_blocking(true)?;
                    }
                }
                Received::Closed => {
                    tracing::info!(stats = ?self.packets.stats(), "host closed the connection");
                    return Ok(());
                }
            }
        }
    }

    fn set_blocking(&mut self, blocking: bool) -> HivemindResult<()> {
        self.relay.set_blocking(blocking)?;
        self.blocking = blocking;
        Ok(())
    }

    /// Routes one inbound message.
    ///
    /// # Errors
    ///
    /// [`HivemindError::InitializationFailed`] if this message completed the
    /// handshake and the initialize hook failed, or a relay error if the
    /// init-complete notice could not be sent.
    pub fn dispatch(&mut self, message: CoreMessage) -> HivemindResult<()> {
        match message {
            CoreMessage::MatchSettings(settings) => {
                self.roster.resolve_names(&settings);
                self.converge(|tracker, init| tracker.on_match_settings(settings, init))
            }
            CoreMessage::FieldInfo(field_info) => {
                self.converge(|tracker, init| tracker.on_field_info(field_info, init))
            }
            CoreMessage::ControllableTeamInfo(mapping) => {
                let appended = self.roster.apply_mapping(&mapping);
                if let Some(settings) = self.handshake.match_settings() {
                    self.roster.resolve_names(settings);
                }
                tracing::debug!(team = mapping.team, appended, "player mapping received");
                self.converge(|tracker, init| tracker.on_player_mapping(mapping, init))
            }
            CoreMessage::MatchComm(comm) => {
                self.deliver_match_comm(ReceivedComm::from(comm));
                Ok(())
            }
            CoreMessage::BallPrediction(prediction) => {
                self.packets.update_prediction(prediction);
                Ok(())
            }
            CoreMessage::GamePacket(packet) => {
                if self.handshake.is_initialized() {
                    self.packets.offer(packet);
                } else {
                    tracing::trace!(frame = packet.frame_num, "dropping tick before initialization");
                }
                Ok(())
            }
        }
    }

    fn converge<F>(&mut self, feed: F) -> HivemindResult<()>
    where
        F: FnOnce(
            &mut HandshakeTracker,
            &mut dyn FnMut(&HandshakeTracker) -> HivemindResult<()>,
        ) -> HivemindResult<Convergence>,
    {
        let Self {
            relay,
            hivemind,
            handshake,
            roster,
            packets,
            batcher,
            ..
        } = self;

        let mut init = |tracker: &HandshakeTracker| {
            initialize(
                &mut *hivemind,
                &mut *relay,
                &mut *batcher,
                tracker,
                roster,
                packets.prediction(),
            )
        };

        if feed(handshake, &mut init)? == Convergence::Initialized {
            self.relay.send_init_complete()?;
            tracing::info!(units = ?self.roster.names(), "hivemind initialized");
        }
        Ok(())
    }

    fn deliver_match_comm(&mut self, comm: ReceivedComm) {
        let Some(mut ctx) = HivemindContext::new(
            &mut self.relay,
            &mut self.batcher,
            &self.handshake,
            &self.roster,
            self.packets.prediction(),
        ) else {
            tracing::debug!(from = comm.index, "dropping match communication before handshake");
            return;
        };

        let hivemind = &mut self.hivemind;
        let result = call_hook(|| {
            hivemind.handle_match_communication(
                &mut ctx,
                comm.index,
                comm.team,
                &comm.content,
                comm.display.as_deref(),
                comm.team_only,
            )
        });
        if let Err(e) = result {
            tracing::warn!(from = comm.index, error = %e, "match communication handler failed");
        }
    }

    /// Processes the waiting tick, if any.
    pub fn process_pending(&mut self) -> Option<TickOutcome> {
        self.packets.tick(
            &mut self.hivemind,
            &mut self.relay,
            &mut self.batcher,
            &self.handshake,
            &self.roster,
        )
    }

    /// Runs `retire` then disconnects, once. No-op before [`Controller::run`].
    fn teardown(&mut self) {
        if !self.started || self.retired {
            return;
        }
        self.retired = true;

        let hivemind = &mut self.hivemind;
        if let Err(e) = call_hook(|| {
            hivemind.retire();
            Ok(())
        }) {
            tracing::error!(units = ?self.roster.names(), error = %e, "hivemind failed to retire");
        }
        self.relay.disconnect();
        tracing::debug!("hivemind disconnected");
    }

    /// Handshake state.
    #[must_use]
    pub fn handshake(&self) -> &HandshakeTracker {
        &self.handshake
    }

    /// Controlled units.
    #[must_use]
    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    /// Tick totals.
    #[must_use]
    pub fn stats(&self) -> LoopStats {
        self.packets.stats()
    }

    /// Ticks overwritten before they could be processed.
    #[must_use]
    pub fn ticks_dropped(&self) -> u64 {
        self.packets.ticks_dropped()
    }

    /// Returns true once teardown has run.
    #[must_use]
    pub fn is_retired(&self) -> bool {
        self.retired
    }

    /// The user logic.
    #[must_use]
    pub fn hivemind(&self) -> &H {
        &self.hivemind
    }

    /// The configuration in use.
    #[must_use]
    pub fn config(&self) -> &HivemindConfig {
        &self.config
    }
}

impl<R: Relay, H: Hivemind> Drop for Controller<R, H> {
    fn drop(&mut self) {
        self.teardown();
    }
}

fn initialize<H: Hivemind + ?Sized>(
    hivemind: &mut H,
    relay: &mut dyn Relay,
    batcher: &mut RenderBatcher,
    tracker: &HandshakeTracker,
    roster: &Roster,
    prediction: &hivemind_shared::BallPrediction,
) -> HivemindResult<()> {
    let result = match HivemindContext::new(relay, batcher, tracker, roster, prediction) {
        Some(mut ctx) => call_hook(|| hivemind.initialize(&mut ctx)),
        None => Err("handshake incomplete".into()),
    };

    result.map_err(|source| {
        let unit = roster.lead_name().to_string();
        tracing::error!(%unit, error = %source, "hivemind failed to initialize");
        HivemindError::InitializationFailed { unit, source }
    })
}

/// Runs a hivemind configured from the environment until the host closes
/// the connection.
///
/// Fatal errors are logged; the returned code tells the launcher whether the
/// session ended cleanly.
pub fn launch<R: Relay, H: Hivemind>(relay: R, hivemind: H) -> ExitCode {
    let config = match HivemindConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "invalid hivemind configuration");
            return ExitCode::FAILURE;
        }
    };

    match Controller::new(relay, hivemind, config).run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "hivemind stopped");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HookResult;
    use crate::hooks::Outputs;
    use crate::relay::{MockHost, MockRelay};
    use hivemind_shared::{
        ControllableInfo, ControllableTeamInfo, FieldInfo, GamePacket, InterfaceMessage,
        MatchComm, MatchSettings, PlayerConfiguration, PlayerInfo,
    };

    #[derive(Default)]
    struct Probe {
        initialized: u32,
        seen_names: Vec<String>,
        comms: Vec<(u32, Vec<u8>)>,
        frames: Vec<u32>,
    }

    impl Hivemind for Probe {
        fn initialize(&mut self, ctx: &mut HivemindContext<'_>) -> HookResult<()> {
            self.initialized += 1;
            self.seen_names = ctx.names();
            Ok(())
        }

        fn get_outputs(
            &mut self,
            packet: &GamePacket,
            _ctx: &mut HivemindContext<'_>,
        ) -> HookResult<Outputs> {
            self.frames.push(packet.frame_num);
            Ok(Outputs::new())
        }

        fn handle_match_communication(
            &mut self,
            _ctx: &mut HivemindContext<'_>,
            index: u32,
            _team: u32,
            content: &[u8],
            _display: Option<&str>,
            _team_only: bool,
        ) -> HookResult<()> {
            self.comms.push((index, content.to_vec()));
            Ok(())
        }
    }

    fn controller() -> (Controller<MockRelay, Probe>, MockHost) {
        let config = HivemindConfig::new("g");
        let (mut relay, host) = MockRelay::pair();
        relay.connect(&config.connection_settings()).unwrap();
        (Controller::new(relay, Probe::default(), config), host)
    }

    fn settings() -> MatchSettings {
        MatchSettings {
            player_configurations: vec![PlayerConfiguration {
                name: "Alpha".into(),
                team: 0,
                spawn_id: 10,
            }],
            ..MatchSettings::default()
        }
    }

    fn mapping() -> ControllableTeamInfo {
        ControllableTeamInfo {
            team: 0,
            controllables: vec![ControllableInfo { index: 0, spawn_id: 10 }],
        }
    }

    #[test]
    fn test_mapping_first_still_resolves_names() {
        let (mut controller, _host) = controller();
        controller.dispatch(CoreMessage::ControllableTeamInfo(mapping())).unwrap();
        controller.dispatch(CoreMessage::FieldInfo(FieldInfo::default())).unwrap();
        assert_eq!(controller.hivemind().initialized, 0);

        controller.dispatch(CoreMessage::MatchSettings(settings())).unwrap();
        assert_eq!(controller.hivemind().initialized, 1);
        assert_eq!(controller.hivemind().seen_names, vec!["Alpha".to_string()]);
    }

    #[test]
    fn test_ticks_before_initialization_are_dropped() {
        let (mut controller, _host) = controller();
        controller
            .dispatch(CoreMessage::GamePacket(GamePacket {
                frame_num: 1,
                players: vec![PlayerInfo::default()],
                ..GamePacket::default()
            }))
            .unwrap();
        assert_eq!(controller.process_pending(), None);
        assert!(controller.hivemind().frames.is_empty());
    }

    #[test]
    fn test_match_comm_before_handshake_is_dropped() {
        let (mut controller, _host) = controller();
        let comm = MatchComm { index: 2, content: vec![1], ..MatchComm::default() };
        controller.dispatch(CoreMessage::MatchComm(comm.clone())).unwrap();
        assert!(controller.hivemind().comms.is_empty());

        controller.dispatch(CoreMessage::MatchSettings(settings())).unwrap();
        controller.dispatch(CoreMessage::FieldInfo(FieldInfo::default())).unwrap();
        controller.dispatch(CoreMessage::ControllableTeamInfo(mapping())).unwrap();
        controller.dispatch(CoreMessage::MatchComm(comm)).unwrap();
        assert_eq!(controller.hivemind().comms, vec![(2, vec![1])]);
    }

    #[test]
    fn test_drop_without_run_does_not_disconnect() {
        let (controller, host) = controller();
        drop(controller);
        assert_eq!(host.disconnects(), 0);
    }

    #[test]
    fn test_second_run_is_rejected_without_reconnecting() {
        let (relay, mut host) = MockRelay::pair();
        host.hang_up();
        let mut controller = Controller::new(relay, Probe::default(), HivemindConfig::new("g"));

        controller.run().unwrap();
        assert!(matches!(controller.run(), Err(HivemindError::SessionEnded)));
        assert!(!host.is_connected());
        assert_eq!(host.disconnects(), 1);

        drop(controller);
        assert_eq!(host.disconnects(), 1);
    }

    #[test]
    fn test_init_complete_sent_once() {
        let (relay, mut host) = MockRelay::pair();
        host.push(CoreMessage::MatchSettings(settings()));
        host.push(CoreMessage::FieldInfo(FieldInfo::default()));
        host.push(CoreMessage::ControllableTeamInfo(mapping()));
        host.push(CoreMessage::ControllableTeamInfo(mapping()));
        host.hang_up();

        let mut controller = Controller::new(relay, Probe::default(), HivemindConfig::new("g"));
        controller.run().unwrap();

        let init_notices = host
            .sent()
            .into_iter()
            .filter(|message| *message == InterfaceMessage::InitComplete)
            .count();
        assert_eq!(init_notices, 1);
        assert_eq!(controller.roster().len(), 1);
    }
}

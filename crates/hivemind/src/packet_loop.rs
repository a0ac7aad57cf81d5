//! # Packet Loop
//!
//! Steady-state tick processing. The controller feeds ticks and predictions
//! in as they arrive; whenever the transport has nothing more buffered it
//! asks for one [`PacketLoop::tick`].
//!
//! ```text
//! recv ─┬─ GamePacket ──────▶ mailbox (newest wins)
//!       ├─ BallPrediction ──▶ latest prediction
//!       └─ would block ─────▶ tick():
//!            1. take newest frame
//!            2. roster fits?           no ─▶ Discarded
//!            3. snapshot prediction
//!            4. get_outputs()          err/panic ─▶ Faulted
//!            5. one PlayerInput per entry, best effort ─▶ Sent
//! ```
//!
//! A faulted tick sends nothing and never stops the loop.

use hivemind_shared::{BallPrediction, GamePacket, PlayerInput};

use crate::handshake::HandshakeTracker;
use crate::hooks::{call_hook, Hivemind, HivemindContext};
use crate::mailbox::FrameMailbox;
use crate::relay::Relay;
use crate::render::RenderBatcher;
use crate::roster::Roster;

/// What happened to one frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// The frame did not cover every controlled index.
    Discarded,
    /// The control hook failed; nothing was sent.
    Faulted,
    /// Outputs were sent.
    Sent {
        /// Inputs the relay accepted.
        delivered: usize,
        /// Inputs the relay refused.
        failed: usize,
    },
}

/// Running totals, for diagnostics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LoopStats {
    /// Frames handed to the control hook successfully.
    pub ticks_processed: u64,
    /// Frames skipped because the roster did not fit.
    pub ticks_discarded: u64,
    /// Frames whose control hook failed.
    pub ticks_faulted: u64,
    /// Individual inputs that failed to send.
    pub inputs_failed: u64,
}

impl LoopStats {
    fn record(&mut self, outcome: TickOutcome) {
        match outcome {
            TickOutcome::Discarded => self.ticks_discarded += 1,
            TickOutcome::Faulted => self.ticks_faulted += 1,
            TickOutcome::Sent { failed, .. } => {
                self.ticks_processed += 1;
                self.inputs_failed += failed as u64;
            }
        }
    }
}

/// Tick state owned by the controller.
#[derive(Debug, Default)]
pub struct PacketLoop {
    mailbox: FrameMailbox<GamePacket>,
    latest_prediction: BallPrediction,
    prediction: BallPrediction,
    stats: LoopStats,
}

impl PacketLoop {
    /// Creates an idle loop.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a tick, replacing any that is still waiting.
    pub fn offer(&mut self, packet: GamePacket) {
        if let Some(stale) = self.mailbox.put(packet) {
            tracing::trace!(frame = stale.frame_num, "dropping stale tick");
        }
    }

    /// Records the newest ball prediction. Hooks see it from the next tick on.
    pub fn update_prediction(&mut self, prediction: BallPrediction) {
        self.latest_prediction = prediction;
    }

    /// Returns true if a tick is waiting.
    #[must_use]
    pub const fn has_pending(&self) -> bool {
        self.mailbox.is_occupied()
    }

    /// Prediction as hooks currently see it.
    #[must_use]
    pub fn prediction(&self) -> &BallPrediction {
        &self.prediction
    }

    /// Running totals.
    #[must_use]
    pub fn stats(&self) -> LoopStats {
        self.stats
    }

    /// Ticks overwritten before they could be processed.
    #[must_use]
    pub fn ticks_dropped(&self) -> u64 {
        self.mailbox.dropped()
    }

    /// Processes the waiting tick, if any.
    pub fn tick<H: Hivemind + ?Sized>(
        &mut self,
        hivemind: &mut H,
        relay: &mut dyn Relay,
        batcher: &mut RenderBatcher,
        handshake: &HandshakeTracker,
        roster: &Roster,
    ) -> Option<TickOutcome> {
        let packet = self.mailbox.take()?;
        let outcome = self.process(&packet, hivemind, relay, batcher, handshake, roster);
        self.stats.record(outcome);
        Some(outcome)
    }

    fn process<H: Hivemind + ?Sized>(
        &mut self,
        packet: &GamePacket,
        hivemind: &mut H,
        relay: &mut dyn Relay,
        batcher: &mut RenderBatcher,
        handshake: &HandshakeTracker,
        roster: &Roster,
    ) -> TickOutcome {
        if !roster.fits(packet.players.len()) {
            tracing::trace!(
                frame = packet.frame_num,
                players = packet.players.len(),
                max_index = ?roster.max_index(),
                "tick does not cover every controlled unit yet"
            );
            return TickOutcome::Discarded;
        }

        self.prediction.clone_from(&self.latest_prediction);

        let Some(mut ctx) =
            HivemindContext::new(&mut *relay, batcher, handshake, roster, &self.prediction)
        else {
            tracing::debug!(frame = packet.frame_num, "tick before handshake completed");
            return TickOutcome::Discarded;
        };

        let outputs = match call_hook(|| hivemind.get_outputs(packet, &mut ctx)) {
            Ok(outputs) => outputs,
            Err(e) => {
                tracing::error!(units = ?roster.names(), error = %e, "hivemind returned an error");
                return TickOutcome::Faulted;
            }
        };

        let mut delivered = 0;
        let mut failed = 0;
        for (index, state) in outputs {
            match relay.send_player_input(PlayerInput::new(index, state)) {
                Ok(()) => delivered += 1,
                Err(e) => {
                    let unit = roster.span_of(index).and_then(tracing::Span::id);
                    tracing::warn!(parent: unit, index, error = %e, "failed to send player input");
                    failed += 1;
                }
            }
        }
        TickOutcome::Sent { delivered, failed }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HookResult;
    use crate::hooks::Outputs;
    use crate::relay::{ConnectionSettings, MockHost, MockRelay};
    use hivemind_shared::{
        ControllableInfo, ControllableTeamInfo, ControllerState, FieldInfo, MatchSettings,
        PlayerInfo, PredictionSlice,
    };

    /// Steers every controlled unit by its frame number and records what it saw.
    #[derive(Default)]
    struct Recorder {
        frames: Vec<u32>,
        predictions: Vec<usize>,
        fail_frames: Vec<u32>,
    }

    impl Hivemind for Recorder {
        fn get_outputs(
            &mut self,
            packet: &GamePacket,
            ctx: &mut HivemindContext<'_>,
        ) -> HookResult<Outputs> {
            self.frames.push(packet.frame_num);
            self.predictions.push(ctx.ball_prediction().slices.len());
            if self.fail_frames.contains(&packet.frame_num) {
                return Err(format!("frame {} is cursed", packet.frame_num).into());
            }
            #[allow(clippy::cast_precision_loss)]
            let steer = packet.frame_num as f32;
            Ok(ctx
                .indices()
                .into_iter()
                .map(|index| (index, ControllerState { steer, ..ControllerState::default() }))
                .collect())
        }
    }

    struct Fixture {
        relay: MockRelay,
        host: MockHost,
        batcher: RenderBatcher,
        handshake: HandshakeTracker,
        roster: Roster,
    }

    impl Fixture {
        fn new(controlled: &[(u32, i32)]) -> Self {
            let (mut relay, host) = MockRelay::pair();
            relay
                .connect(&ConnectionSettings {
                    group_id: "g".into(),
                    wants_match_communications: true,
                    wants_ball_predictions: true,
                    server_port: 1,
                })
                .unwrap();

            let mapping = ControllableTeamInfo {
                team: 0,
                controllables: controlled
                    .iter()
                    .map(|&(index, spawn_id)| ControllableInfo { index, spawn_id })
                    .collect(),
            };
            let mut roster = Roster::new();
            roster.apply_mapping(&mapping);

            let mut handshake = HandshakeTracker::new();
            let ok = |_: &HandshakeTracker| Ok::<(), ()>(());
            handshake.on_match_settings(MatchSettings::default(), ok).unwrap();
            handshake.on_field_info(FieldInfo::default(), ok).unwrap();
            handshake.on_player_mapping(mapping, ok).unwrap();

            Self {
                relay,
                host,
                batcher: RenderBatcher::new(),
                handshake,
                roster,
            }
        }

        fn tick(&mut self, packets: &mut PacketLoop, hivemind: &mut Recorder) -> Option<TickOutcome> {
            packets.tick(hivemind, &mut self.relay, &mut self.batcher, &self.handshake, &self.roster)
        }
    }

    fn packet(frame_num: u32, players: usize) -> GamePacket {
        GamePacket {
            frame_num,
            players: vec![PlayerInfo::default(); players],
            ..GamePacket::default()
        }
    }

    #[test]
    fn test_empty_mailbox_does_nothing() {
        let mut fixture = Fixture::new(&[(0, 1)]);
        let mut packets = PacketLoop::new();
        assert_eq!(fixture.tick(&mut packets, &mut Recorder::default()), None);
    }

    #[test]
    fn test_only_newest_frame_is_processed() {
        let mut fixture = Fixture::new(&[(0, 1)]);
        let mut packets = PacketLoop::new();
        let mut hivemind = Recorder::default();

        packets.offer(packet(1, 2));
        packets.offer(packet(2, 2));
        fixture.tick(&mut packets, &mut hivemind);

        assert_eq!(hivemind.frames, vec![2]);
        assert_eq!(packets.ticks_dropped(), 1);
        assert!(!packets.has_pending());
    }

    #[test]
    fn test_short_frame_is_discarded() {
        let mut fixture = Fixture::new(&[(0, 1), (2, 3)]);
        let mut packets = PacketLoop::new();
        let mut hivemind = Recorder::default();

        packets.offer(packet(1, 2));
        assert_eq!(fixture.tick(&mut packets, &mut hivemind), Some(TickOutcome::Discarded));
        assert!(hivemind.frames.is_empty());
        assert!(fixture.host.sent().is_empty());
    }

    #[test]
    fn test_fault_sends_nothing_and_recovers() {
        let mut fixture = Fixture::new(&[(0, 1), (1, 2)]);
        let mut packets = PacketLoop::new();
        let mut hivemind = Recorder { fail_frames: vec![1], ..Recorder::default() };

        packets.offer(packet(1, 2));
        assert_eq!(fixture.tick(&mut packets, &mut hivemind), Some(TickOutcome::Faulted));
        assert!(fixture.host.player_inputs().is_empty());

        packets.offer(packet(2, 2));
        assert_eq!(
            fixture.tick(&mut packets, &mut hivemind),
            Some(TickOutcome::Sent { delivered: 2, failed: 0 })
        );
        assert_eq!(fixture.host.player_inputs().len(), 2);

        let stats = packets.stats();
        assert_eq!(stats.ticks_faulted, 1);
        assert_eq!(stats.ticks_processed, 1);
    }

    #[test]
    fn test_failed_input_does_not_block_others() {
        let mut fixture = Fixture::new(&[(0, 1), (1, 2), (2, 3)]);
        fixture.host.reject_player_input(1);
        let mut packets = PacketLoop::new();

        packets.offer(packet(5, 3));
        assert_eq!(
            fixture.tick(&mut packets, &mut Recorder::default()),
            Some(TickOutcome::Sent { delivered: 2, failed: 1 })
        );

        let indices: Vec<u32> = fixture.host.player_inputs().into_iter().map(|(i, _)| i).collect();
        assert_eq!(indices, vec![0, 2]);
        assert_eq!(packets.stats().inputs_failed, 1);
    }

    #[test]
    fn test_prediction_snapshot_taken_per_tick() {
        let mut fixture = Fixture::new(&[(0, 1)]);
        let mut packets = PacketLoop::new();
        let mut hivemind = Recorder::default();

        packets.update_prediction(BallPrediction {
            slices: vec![PredictionSlice::default(); 3],
        });
        assert!(packets.prediction().slices.is_empty());

        packets.offer(packet(1, 1));
        fixture.tick(&mut packets, &mut hivemind);
        assert_eq!(hivemind.predictions, vec![3]);
        assert_eq!(packets.prediction().slices.len(), 3);
    }
}

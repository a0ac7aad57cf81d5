//! # Handshake Tracker
//!
//! Three payloads arrive independently and in any order. The first time all
//! three are present the initialization action runs, and only then does the
//! tracker become `initialized`. Nothing resets it.
//!
//! ```text
//!   match settings ─┐
//!   field info ─────┼──▶ all present? ──▶ init() ──ok──▶ INITIALIZED (terminal)
//!   player mapping ─┘                        │
//!                                            └─err──▶ stays pending, caller aborts
//! ```
//!
//! Re-delivery of a payload replaces the stored copy and never re-runs init.

use hivemind_shared::{ControllableTeamInfo, FieldInfo, MatchSettings};

/// Result of feeding one payload into the tracker.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Convergence {
    /// At least one payload is still missing.
    Pending,
    /// This call completed the handshake and the init action succeeded.
    Initialized,
    /// The handshake completed on an earlier call.
    AlreadyInitialized,
}

/// Three-input, one-shot convergence state machine.
#[derive(Debug, Default)]
pub struct HandshakeTracker {
    match_settings: Option<MatchSettings>,
    field_info: Option<FieldInfo>,
    player_mapping: Option<ControllableTeamInfo>,
    initialized: bool,
}

impl HandshakeTracker {
    /// Creates a tracker with nothing received.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            match_settings: None,
            field_info: None,
            player_mapping: None,
            initialized: false,
        }
    }

    /// Stores match settings and converges if possible.
    ///
    /// # Errors
    ///
    /// Whatever `init` returns. The tracker stays uninitialized.
    pub fn on_match_settings<F, E>(&mut self, settings: MatchSettings, init: F) -> Result<Convergence, E>
    where
        F: FnOnce(&Self) -> Result<(), E>,
    {
        self.match_settings = Some(settings);
        self.converge(init)
    }

    /// Stores field info and converges if possible.
    ///
    /// # Errors
    ///
    /// Whatever `init` returns. The tracker stays uninitialized.
    pub fn on_field_info<F, E>(&mut self, field_info: FieldInfo, init: F) -> Result<Convergence, E>
    where
        F: FnOnce(&Self) -> Result<(), E>,
    {
        self.field_info = Some(field_info);
        self.converge(init)
    }

    /// Stores the player mapping and converges if possible.
    ///
    /// # Errors
    ///
    /// Whatever `init` returns. The tracker stays uninitialized.
    pub fn on_player_mapping<F, E>(
        &mut self,
        mapping: ControllableTeamInfo,
        init: F,
    ) -> Result<Convergence, E>
    where
        F: FnOnce(&Self) -> Result<(), E>,
    {
        self.player_mapping = Some(mapping);
        self.converge(init)
    }

    fn converge<F, E>(&mut self, init: F) -> Result<Convergence, E>
    where
        F: FnOnce(&Self) -> Result<(), E>,
    {
        if self.initialized {
            return Ok(Convergence::AlreadyInitialized);
        }
        if !self.is_complete() {
            return Ok(Convergence::Pending);
        }

        init(self)?;
        self.initialized = true;
        Ok(Convergence::Initialized)
    }

    /// Returns true once all three payloads have arrived at least once.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.has_match_settings() && self.has_field_info() && self.has_player_mapping()
    }

    /// Returns true once the init action has run successfully.
    #[inline]
    #[must_use]
    pub const fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Match settings received.
    #[inline]
    #[must_use]
    pub const fn has_match_settings(&self) -> bool {
        self.match_settings.is_some()
    }

    /// Field info received.
    #[inline]
    #[must_use]
    pub const fn has_field_info(&self) -> bool {
        self.field_info.is_some()
    }

    /// Player mapping received.
    #[inline]
    #[must_use]
    pub const fn has_player_mapping(&self) -> bool {
        self.player_mapping.is_some()
    }

    /// Latest match settings.
    #[must_use]
    pub fn match_settings(&self) -> Option<&MatchSettings> {
        self.match_settings.as_ref()
    }

    /// Latest field info.
    #[must_use]
    pub fn field_info(&self) -> Option<&FieldInfo> {
        self.field_info.as_ref()
    }

    /// Latest player mapping.
    #[must_use]
    pub fn player_mapping(&self) -> Option<&ControllableTeamInfo> {
        self.player_mapping.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::convert::Infallible;

    #[derive(Clone, Copy, Debug)]
    enum Payload {
        Settings,
        Field,
        Mapping,
    }

    fn deliver(
        tracker: &mut HandshakeTracker,
        payload: Payload,
        fired: &Cell<u32>,
    ) -> Convergence {
        let init = |t: &HandshakeTracker| -> Result<(), Infallible> {
            assert!(t.is_complete());
            fired.set(fired.get() + 1);
            Ok(())
        };
        let result = match payload {
            Payload::Settings => tracker.on_match_settings(MatchSettings::default(), init),
            Payload::Field => tracker.on_field_info(FieldInfo::default(), init),
            Payload::Mapping => tracker.on_player_mapping(ControllableTeamInfo::default(), init),
        };
        match result {
            Ok(convergence) => convergence,
            Err(never) => match never {},
        }
    }

    #[test]
    fn test_all_orderings_fire_once_after_third() {
        use Payload::{Field, Mapping, Settings};
        let orderings = [
            [Settings, Field, Mapping],
            [Settings, Mapping, Field],
            [Field, Settings, Mapping],
            [Field, Mapping, Settings],
            [Mapping, Settings, Field],
            [Mapping, Field, Settings],
        ];

        for ordering in orderings {
            let mut tracker = HandshakeTracker::new();
            let fired = Cell::new(0);

            assert_eq!(deliver(&mut tracker, ordering[0], &fired), Convergence::Pending);
            assert_eq!(deliver(&mut tracker, ordering[1], &fired), Convergence::Pending);
            assert_eq!(fired.get(), 0, "fired early for {ordering:?}");
            assert_eq!(deliver(&mut tracker, ordering[2], &fired), Convergence::Initialized);
            assert_eq!(fired.get(), 1, "wrong count for {ordering:?}");
            assert!(tracker.is_initialized());
        }
    }

    #[test]
    fn test_redelivery_never_retriggers() {
        let mut tracker = HandshakeTracker::new();
        let fired = Cell::new(0);
        deliver(&mut tracker, Payload::Field, &fired);
        deliver(&mut tracker, Payload::Mapping, &fired);
        deliver(&mut tracker, Payload::Settings, &fired);

        for payload in [Payload::Settings, Payload::Field, Payload::Mapping] {
            assert_eq!(deliver(&mut tracker, payload, &fired), Convergence::AlreadyInitialized);
        }
        assert_eq!(fired.get(), 1);
    }

    #[test]
    fn test_redelivery_before_completion_is_idempotent() {
        let mut tracker = HandshakeTracker::new();
        let fired = Cell::new(0);
        deliver(&mut tracker, Payload::Field, &fired);
        deliver(&mut tracker, Payload::Field, &fired);
        deliver(&mut tracker, Payload::Settings, &fired);
        assert_eq!(fired.get(), 0);
        assert!(!tracker.has_player_mapping());

        assert_eq!(deliver(&mut tracker, Payload::Mapping, &fired), Convergence::Initialized);
        assert_eq!(fired.get(), 1);
    }

    #[test]
    fn test_redelivery_replaces_payload() {
        let mut tracker = HandshakeTracker::new();
        let ok = |_: &HandshakeTracker| Ok::<(), ()>(());
        let first = ControllableTeamInfo { team: 0, controllables: Vec::new() };
        let second = ControllableTeamInfo { team: 1, controllables: Vec::new() };

        tracker.on_player_mapping(first, ok).unwrap();
        tracker.on_player_mapping(second, ok).unwrap();
        assert_eq!(tracker.player_mapping().map(|m| m.team), Some(1));
    }

    #[test]
    fn test_failed_init_stays_uninitialized() {
        let mut tracker = HandshakeTracker::new();
        let ok = |_: &HandshakeTracker| Ok::<(), &str>(());
        tracker.on_match_settings(MatchSettings::default(), ok).unwrap();
        tracker.on_field_info(FieldInfo::default(), ok).unwrap();

        let result = tracker.on_player_mapping(ControllableTeamInfo::default(), |_| Err("nope"));
        assert_eq!(result, Err("nope"));
        assert!(tracker.is_complete());
        assert!(!tracker.is_initialized());
    }
}

//! # Roster
//!
//! The units this process controls. Entries are appended when a player
//! mapping arrives and never removed; `spawn_id` is the stable key, `index`
//! follows whatever the host last reported.

use hivemind_shared::{ControllableTeamInfo, MatchSettings};
use tracing::Span;

/// Identity used in logs before any name is known.
pub const UNKNOWN_UNIT: &str = "Unknown";

/// One controlled unit.
#[derive(Clone, Debug)]
pub struct RosterEntry {
    /// Current index into the tick's player array.
    pub index: u32,
    /// Identity that survives respawns.
    pub spawn_id: i32,
    /// Display name, empty until resolved from match settings.
    pub name: String,
    span: Span,
}

impl RosterEntry {
    fn new(index: u32, spawn_id: i32) -> Self {
        Self {
            index,
            spawn_id,
            name: String::new(),
            span: Span::none(),
        }
    }

    /// Span carrying this unit's name, for scoping per-unit logs.
    #[must_use]
    pub fn span(&self) -> &Span {
        &self.span
    }
}

/// Append-only roster plus the team every entry belongs to.
#[derive(Debug)]
pub struct Roster {
    team: Option<u32>,
    entries: Vec<RosterEntry>,
}

impl Roster {
    /// Creates an empty roster.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            team: None,
            entries: Vec::new(),
        }
    }

    /// Merges a player mapping.
    ///
    /// Known spawn ids get their index updated, unknown ones are appended in
    /// mapping order. Returns how many entries were appended.
    pub fn apply_mapping(&mut self, mapping: &ControllableTeamInfo) -> usize {
        self.team = Some(mapping.team);

        let before = self.entries.len();
        for controllable in &mapping.controllables {
            match self
                .entries
                .iter_mut()
                .find(|entry| entry.spawn_id == controllable.spawn_id)
            {
                Some(entry) => entry.index = controllable.index,
                None => self
                    .entries
                    .push(RosterEntry::new(controllable.index, controllable.spawn_id)),
            }
        }
        self.entries.len() - before
    }

    /// Fills in names (and per-unit spans) from the match's participant list.
    ///
    /// Entries whose spawn id is not listed keep their current name.
    pub fn resolve_names(&mut self, settings: &MatchSettings) {
        for entry in &mut self.entries {
            if let Some(player) = settings.player_by_spawn_id(entry.spawn_id) {
                entry.name.clone_from(&player.name);
                entry.span = tracing::info_span!("unit", name = %player.name, index = entry.index);
            }
        }
    }

    /// Team of the controlled units, once a mapping has arrived.
    #[inline]
    #[must_use]
    pub const fn team(&self) -> Option<u32> {
        self.team
    }

    /// All entries in arrival order.
    #[must_use]
    pub fn entries(&self) -> &[RosterEntry] {
        &self.entries
    }

    /// Player indices, parallel to [`Roster::spawn_ids`] and [`Roster::names`].
    #[must_use]
    pub fn indices(&self) -> Vec<u32> {
        self.entries.iter().map(|entry| entry.index).collect()
    }

    /// Spawn ids, parallel to [`Roster::indices`].
    #[must_use]
    pub fn spawn_ids(&self) -> Vec<i32> {
        self.entries.iter().map(|entry| entry.spawn_id).collect()
    }

    /// Names, parallel to [`Roster::indices`]. Unresolved names are empty.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|entry| entry.name.clone()).collect()
    }

    /// Span of the unit currently at `index`.
    #[must_use]
    pub fn span_of(&self, index: u32) -> Option<&Span> {
        self.entries
            .iter()
            .find(|entry| entry.index == index)
            .map(RosterEntry::span)
    }

    /// Highest player index the controller is responsible for.
    #[must_use]
    pub fn max_index(&self) -> Option<u32> {
        self.entries.iter().map(|entry| entry.index).max()
    }

    /// Returns true if a tick carrying `player_count` players covers every
    /// controlled index.
    #[must_use]
    pub fn fits(&self, player_count: usize) -> bool {
        match self.max_index() {
            Some(max) => usize::try_from(max).map_or(false, |max| max < player_count),
            None => true,
        }
    }

    /// Best-known identity of the first unit, for fatal error reports.
    #[must_use]
    pub fn lead_name(&self) -> &str {
        self.entries
            .iter()
            .map(|entry| entry.name.as_str())
            .find(|name| !name.is_empty())
            .unwrap_or(UNKNOWN_UNIT)
    }

    /// Number of controlled units.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no unit is controlled yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for Roster {
    fn default() -> Self {
        Self::new()
    }
}

//! # Render Batching
//!
//! Debug draws are collected into a named group and shipped as one message.
//! The host replaces a group wholesale when the same id arrives again, so a
//! caller that reopens `"path"` every tick redraws instead of piling up lines.
//!
//! ## Discipline
//!
//! ```text
//! begin_batch("path") ─▶ draw_* … ─▶ end_batch() ─▶ RenderGroup { id: hash("path") }
//! ```
//!
//! - One batch open at a time per batcher. A second `begin_batch` is logged
//!   and ignored; the open batch keeps its id and its draws.
//! - `end_batch` without `begin_batch` is logged and sends nothing.
//! - `draw_*` without an open batch is logged and the draw is dropped.
//! - Bulk clear only touches ids this batcher opened itself.

use std::collections::BTreeSet;
use std::hash::Hasher;

use hivemind_shared::{
    Color, Line3D, PolyLine3D, Rect2D, Rect3D, RenderGroup, RenderMessage, RenderType, String2D,
    String3D,
};
use siphasher::sip::SipHasher13;

use crate::relay::Relay;

/// Group name used when the caller does not pick one.
pub const DEFAULT_GROUP_NAME: &str = "default";

/// Upper bound (exclusive) for group ids. Keeps ids positive on hosts that
/// store them as signed 32-bit integers.
pub const MAX_GROUP_ID: u32 = (i32::MAX / 2) as u32;

/// Deterministic, process-independent id for a group name.
///
/// SipHash-1-3 with all-zero keys over the UTF-8 bytes. The same name maps to
/// the same id in every process, every run.
#[must_use]
pub fn group_id(name: &str) -> u32 {
    let mut hasher = SipHasher13::new();
    hasher.write(name.as_bytes());
    // The modulus is below u32::MAX, the cast cannot truncate.
    #[allow(clippy::cast_possible_truncation)]
    let id = (hasher.finish() % u64::from(MAX_GROUP_ID)) as u32;
    id
}

/// Builds a colour from channels.
#[must_use]
pub const fn create_color(red: u8, green: u8, blue: u8, alpha: u8) -> Color {
    Color::rgba(red, green, blue, alpha)
}

/// Accumulates draw descriptors for one open group at a time.
#[derive(Debug, Default)]
pub struct RenderBatcher {
    /// Id of the open batch, if any.
    current: Option<u32>,
    /// Draws for the open batch, in submission order.
    pending: Vec<RenderMessage>,
    /// Every id this batcher has opened and not cleared.
    owned: BTreeSet<u32>,
}

impl RenderBatcher {
    /// Creates a batcher with nothing open and nothing owned.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            current: None,
            pending: Vec::new(),
            owned: BTreeSet::new(),
        }
    }

    /// Opens a batch under `group_id(name)`.
    ///
    /// Ignored (with an error log) if a batch is already open.
    pub fn begin_batch(&mut self, name: &str) {
        if let Some(open) = self.current {
            tracing::error!(open, requested = name, "begin_batch was called twice without end_batch");
            return;
        }

        let id = group_id(name);
        self.current = Some(id);
        self.owned.insert(id);
    }

    /// Sends the open batch as one render group and closes it.
    ///
    /// Ignored (with an error log) if no batch is open. A failed send is
    /// logged; the batch is closed either way.
    pub fn end_batch<R: Relay + ?Sized>(&mut self, relay: &mut R) {
        let Some(id) = self.current.take() else {
            tracing::error!("end_batch was called without begin_batch first");
            return;
        };

        let group = RenderGroup {
            render_messages: std::mem::take(&mut self.pending),
            id,
        };
        if let Err(e) = relay.send_render_group(group) {
            tracing::warn!(id, error = %e, "failed to send render group");
        }
    }

    /// Opens a batch under [`DEFAULT_GROUP_NAME`].
    pub fn begin_default_batch(&mut self) {
        self.begin_batch(DEFAULT_GROUP_NAME);
    }

    /// Removes the [`DEFAULT_GROUP_NAME`] group.
    pub fn clear_default_batch<R: Relay + ?Sized>(&mut self, relay: &mut R) {
        self.clear_batch(DEFAULT_GROUP_NAME, relay);
    }

    /// Removes the group called `name` from the host and forgets it.
    pub fn clear_batch<R: Relay + ?Sized>(&mut self, name: &str, relay: &mut R) {
        let id = group_id(name);
        if let Err(e) = relay.remove_render_group(id) {
            tracing::warn!(id, error = %e, "failed to remove render group");
        }
        self.owned.remove(&id);
    }

    /// Removes every group this batcher opened. Groups drawn by anyone else
    /// are left alone.
    pub fn clear_all_owned_batches<R: Relay + ?Sized>(&mut self, relay: &mut R) {
        for id in std::mem::take(&mut self.owned) {
            if let Err(e) = relay.remove_render_group(id) {
                tracing::warn!(id, error = %e, "failed to remove render group");
            }
        }
    }

    /// Returns true between `begin_batch` and `end_batch`.
    #[inline]
    #[must_use]
    pub const fn is_rendering(&self) -> bool {
        self.current.is_some()
    }

    /// Id of the open batch.
    #[inline]
    #[must_use]
    pub const fn current_id(&self) -> Option<u32> {
        self.current
    }

    /// Ids opened and not yet cleared, ascending.
    pub fn owned_ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.owned.iter().copied()
    }

    /// Draws queued in the open batch.
    #[must_use]
    pub fn pending(&self) -> &[RenderMessage] {
        &self.pending
    }

    /// Appends one draw descriptor to the open batch.
    pub fn draw(&mut self, render: RenderType) {
        if self.current.is_none() {
            tracing::error!("draw was called without begin_batch first; dropping it");
            return;
        }
        self.pending.push(RenderMessage::from(render));
    }

    /// Screen-space text.
    pub fn draw_string_2d(&mut self, render: String2D) {
        self.draw(RenderType::String2D(render));
    }

    /// World-space text.
    pub fn draw_string_3d(&mut self, render: String3D) {
        self.draw(RenderType::String3D(render));
    }

    /// A single line.
    pub fn draw_line_3d(&mut self, render: Line3D) {
        self.draw(RenderType::Line3D(render));
    }

    /// Connected lines.
    pub fn draw_polyline_3d(&mut self, render: PolyLine3D) {
        self.draw(RenderType::PolyLine3D(render));
    }

    /// Screen-space rectangle.
    pub fn draw_rect_2d(&mut self, render: Rect2D) {
        self.draw(RenderType::Rect2D(render));
    }

    /// World-anchored rectangle.
    pub fn draw_rect_3d(&mut self, render: Rect3D) {
        self.draw(RenderType::Rect3D(render));
    }
}

/// A [`RenderBatcher`] bound to the relay it sends through.
///
/// Handed to user hooks via the controller context.
pub struct Renderer<'a> {
    batcher: &'a mut RenderBatcher,
    relay: &'a mut dyn Relay,
}

impl<'a> Renderer<'a> {
    /// Binds a batcher to a relay.
    pub fn new(batcher: &'a mut RenderBatcher, relay: &'a mut dyn Relay) -> Self {
        Self { batcher, relay }
    }

    /// See [`RenderBatcher::begin_batch`].
    pub fn begin_batch(&mut self, name: &str) {
        self.batcher.begin_batch(name);
    }

    /// See [`RenderBatcher::end_batch`].
    pub fn end_batch(&mut self) {
        self.batcher.end_batch(&mut *self.relay);
    }

    /// See [`RenderBatcher::begin_default_batch`].
    pub fn begin_default_batch(&mut self) {
        self.batcher.begin_default_batch();
    }

    /// See [`RenderBatcher::clear_default_batch`].
    pub fn clear_default_batch(&mut self) {
        self.batcher.clear_default_batch(&mut *self.relay);
    }

    /// See [`RenderBatcher::clear_batch`].
    pub fn clear_batch(&mut self, name: &str) {
        self.batcher.clear_batch(name, &mut *self.relay);
    }

    /// See [`RenderBatcher::clear_all_owned_batches`].
    pub fn clear_all_owned_batches(&mut self) {
        self.batcher.clear_all_owned_batches(&mut *self.relay);
    }

    /// See [`RenderBatcher::is_rendering`].
    #[must_use]
    pub fn is_rendering(&self) -> bool {
        self.batcher.is_rendering()
    }

    /// See [`RenderBatcher::draw`].
    pub fn draw(&mut self, render: RenderType) {
        self.batcher.draw(render);
    }

    /// See [`RenderBatcher::draw_string_2d`].
    pub fn draw_string_2d(&mut self, render: String2D) {
        self.batcher.draw_string_2d(render);
    }

    /// See [`RenderBatcher::draw_string_3d`].
    pub fn draw_string_3d(&mut self, render: String3D) {
        self.batcher.draw_string_3d(render);
    }

    /// See [`RenderBatcher::draw_line_3d`].
    pub fn draw_line_3d(&mut self, render: Line3D) {
        self.batcher.draw_line_3d(render);
    }

    /// See [`RenderBatcher::draw_polyline_3d`].
    pub fn draw_polyline_3d(&mut self, render: PolyLine3D) {
        self.batcher.draw_polyline_3d(render);
    }

    /// See [`RenderBatcher::draw_rect_2d`].
    pub fn draw_rect_2d(&mut self, render: Rect2D) {
        self.batcher.draw_rect_2d(render);
    }

    /// See [`RenderBatcher::draw_rect_3d`].
    pub fn draw_rect_3d(&mut self, render: Rect3D) {
        self.batcher.draw_rect_3d(render);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relay::{ConnectionSettings, MockHost, MockRelay};
    use hivemind_shared::{InterfaceMessage, Vec3};

    fn connected() -> (MockRelay, MockHost) {
        let (mut relay, host) = MockRelay::pair();
        relay
            .connect(&ConnectionSettings {
                group_id: "g".into(),
                wants_match_communications: false,
                wants_ball_predictions: false,
                server_port: 1,
            })
            .unwrap();
        (relay, host)
    }

    fn line() -> Line3D {
        Line3D {
            start: Vec3::ZERO.into(),
            end: Vec3::new(0.0, 0.0, 100.0).into(),
            color: Color::RED,
        }
    }

    #[test]
    fn test_group_id_is_stable() {
        assert_eq!(group_id("x"), group_id("x"));
        assert_ne!(group_id("x"), group_id("y"));
        assert!(group_id("anything at all") < MAX_GROUP_ID);
    }

    #[test]
    fn test_group_id_pinned_values() {
        // Other processes must derive the same ids, so these never change.
        assert_eq!(group_id("x"), 46_728_272);
        assert_eq!(group_id("default"), 1_059_443_610);
        assert_eq!(group_id("ball_path_prediction"), 931_049_882);
    }

    #[test]
    fn test_default_batch_round_trip() {
        let (mut relay, host) = connected();
        let mut batcher = RenderBatcher::new();

        batcher.begin_default_batch();
        assert_eq!(batcher.current_id(), Some(group_id(DEFAULT_GROUP_NAME)));
        batcher.end_batch(&mut relay);
        host.clear_sent();

        batcher.clear_default_batch(&mut relay);
        assert_eq!(
            host.sent(),
            vec![InterfaceMessage::RemoveRenderGroup { id: group_id("default") }]
        );
        assert_eq!(batcher.owned_ids().count(), 0);
    }

    #[test]
    fn test_group_id_independent_of_instance() {
        let mut a = RenderBatcher::new();
        let mut b = RenderBatcher::new();
        a.begin_batch("shared");
        b.begin_batch("shared");
        assert_eq!(a.current_id(), b.current_id());
    }

    #[test]
    fn test_single_line_batch() {
        let (mut relay, host) = connected();
        let mut batcher = RenderBatcher::new();

        batcher.begin_batch("x");
        batcher.draw_line_3d(line());
        batcher.end_batch(&mut relay);

        let sent = host.sent();
        assert_eq!(sent.len(), 1);
        let InterfaceMessage::RenderGroup(group) = &sent[0] else {
            panic!("expected render group, got {:?}", sent[0]);
        };
        assert_eq!(group.id, group_id("x"));
        assert_eq!(group.render_messages, vec![RenderMessage::from(RenderType::Line3D(line()))]);
        assert!(!batcher.is_rendering());
        assert!(batcher.pending().is_empty());
    }

    #[test]
    fn test_double_begin_keeps_first_batch() {
        let mut batcher = RenderBatcher::new();
        batcher.begin_batch("g");
        batcher.draw_line_3d(line());
        batcher.begin_batch("g");
        batcher.begin_batch("other");

        assert_eq!(batcher.current_id(), Some(group_id("g")));
        assert_eq!(batcher.pending().len(), 1);
        assert_eq!(batcher.owned_ids().collect::<Vec<_>>(), vec![group_id("g")]);
    }

    #[test]
    fn test_end_without_begin_sends_nothing() {
        let (mut relay, host) = connected();
        let mut batcher = RenderBatcher::new();
        batcher.end_batch(&mut relay);
        assert!(host.sent().is_empty());
    }

    #[test]
    fn test_draw_without_begin_is_dropped() {
        let (mut relay, host) = connected();
        let mut batcher = RenderBatcher::new();
        batcher.draw_line_3d(line());
        assert!(batcher.pending().is_empty());

        batcher.begin_batch("late");
        batcher.end_batch(&mut relay);
        let sent = host.sent();
        let InterfaceMessage::RenderGroup(group) = &sent[0] else {
            panic!("expected render group");
        };
        assert!(group.render_messages.is_empty());
    }

    #[test]
    fn test_clear_batch_forgets_id() {
        let (mut relay, host) = connected();
        let mut batcher = RenderBatcher::new();
        batcher.begin_batch("a");
        batcher.end_batch(&mut relay);
        host.clear_sent();

        batcher.clear_batch("a", &mut relay);
        assert_eq!(host.sent(), vec![InterfaceMessage::RemoveRenderGroup { id: group_id("a") }]);
        assert_eq!(batcher.owned_ids().count(), 0);
    }

    #[test]
    fn test_clear_all_only_touches_owned() {
        let (mut relay, host) = connected();
        let mut mine = RenderBatcher::new();
        let mut theirs = RenderBatcher::new();

        for name in ["a", "b"] {
            mine.begin_batch(name);
            mine.end_batch(&mut relay);
        }
        theirs.begin_batch("c");
        theirs.end_batch(&mut relay);
        host.clear_sent();

        mine.clear_all_owned_batches(&mut relay);

        let mut removed: Vec<u32> = host
            .sent()
            .into_iter()
            .map(|message| match message {
                InterfaceMessage::RemoveRenderGroup { id } => id,
                other => panic!("unexpected {other:?}"),
            })
            .collect();
        removed.sort_unstable();
        let mut expected = vec![group_id("a"), group_id("b")];
        expected.sort_unstable();

        assert_eq!(removed, expected);
        assert_eq!(mine.owned_ids().count(), 0);
        assert_eq!(theirs.owned_ids().collect::<Vec<_>>(), vec![group_id("c")]);
    }

    #[test]
    fn test_renderer_facade() {
        let (mut relay, host) = connected();
        let mut batcher = RenderBatcher::new();
        {
            let mut renderer = Renderer::new(&mut batcher, &mut relay);
            renderer.begin_batch("facade");
            assert!(renderer.is_rendering());
            renderer.draw_rect_2d(Rect2D::default());
            renderer.end_batch();
        }
        assert_eq!(host.sent().len(), 1);
        assert_eq!(create_color(1, 2, 3, 4), Color::rgba(1, 2, 3, 4));
    }
}

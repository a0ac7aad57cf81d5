//! Debug render payloads.
//!
//! A [`RenderGroup`] replaces any previous group with the same id on the host,
//! so a caller that re-sends the same id every tick redraws rather than
//! accumulates.

use serde::{Deserialize, Serialize};

use crate::math::{Color, Vec3};

/// Where a 3D render is placed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RenderAnchor {
    /// World location.
    pub world: Vec3,
}

impl From<Vec3> for RenderAnchor {
    fn from(world: Vec3) -> Self {
        Self { world }
    }
}

/// Horizontal text alignment.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextHAlign {
    /// Anchor at the left edge.
    #[default]
    Left,
    /// Anchor at the centre.
    Center,
    /// Anchor at the right edge.
    Right,
}

/// Vertical text alignment.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextVAlign {
    /// Anchor at the top edge.
    #[default]
    Top,
    /// Anchor at the centre.
    Center,
    /// Anchor at the bottom edge.
    Bottom,
}

/// A line between two anchors.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Line3D {
    /// Start point.
    pub start: RenderAnchor,
    /// End point.
    pub end: RenderAnchor,
    /// Line colour.
    pub color: Color,
}

/// A connected series of lines.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PolyLine3D {
    /// Points in draw order.
    pub points: Vec<Vec3>,
    /// Line colour.
    pub color: Color,
}

/// Text in screen space. `x`/`y` are fractions of the screen size.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct String2D {
    /// Text to draw.
    pub text: String,
    /// Horizontal position (0..1).
    pub x: f32,
    /// Vertical position (0..1).
    pub y: f32,
    /// Text scale.
    pub scale: f32,
    /// Text colour.
    pub foreground: Color,
    /// Background colour.
    pub background: Color,
    /// Horizontal alignment.
    pub h_align: TextHAlign,
    /// Vertical alignment.
    pub v_align: TextVAlign,
}

/// Text anchored in world space.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct String3D {
    /// Text to draw.
    pub text: String,
    /// Anchor.
    pub anchor: RenderAnchor,
    /// Text scale.
    pub scale: f32,
    /// Text colour.
    pub foreground: Color,
    /// Background colour.
    pub background: Color,
    /// Horizontal alignment.
    pub h_align: TextHAlign,
    /// Vertical alignment.
    pub v_align: TextVAlign,
}

/// Rectangle in screen space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect2D {
    /// Horizontal position (0..1).
    pub x: f32,
    /// Vertical position (0..1).
    pub y: f32,
    /// Width (fraction of screen).
    pub width: f32,
    /// Height (fraction of screen).
    pub height: f32,
    /// Fill colour.
    pub color: Color,
}

/// Screen-aligned rectangle anchored in world space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect3D {
    /// Anchor.
    pub anchor: RenderAnchor,
    /// Width (fraction of screen).
    pub width: f32,
    /// Height (fraction of screen).
    pub height: f32,
    /// Fill colour.
    pub color: Color,
}

/// One typed draw descriptor.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum RenderType {
    /// Screen-space text.
    String2D(String2D),
    /// World-space text.
    String3D(String3D),
    /// Single line.
    Line3D(Line3D),
    /// Connected lines.
    PolyLine3D(PolyLine3D),
    /// Screen-space rectangle.
    Rect2D(Rect2D),
    /// World-anchored rectangle.
    Rect3D(Rect3D),
}

/// Envelope around a [`RenderType`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RenderMessage {
    /// The draw descriptor.
    pub variety: RenderType,
}

impl From<RenderType> for RenderMessage {
    fn from(variety: RenderType) -> Self {
        Self { variety }
    }
}

/// An ordered batch of draw descriptors sent and cleared as one unit.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RenderGroup {
    /// Draw descriptors in submission order.
    pub render_messages: Vec<RenderMessage>,
    /// Group id.
    pub id: u32,
}

#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Color Defense engine.
//!
//! This crate defines the vocabulary that connects the paint canvas, the
//! defense regions, the enemy painter and the session orchestrator. The canvas
//! is an external collaborator reached exclusively through the [`Canvas`]
//! trait; systems read pixel ownership from it, issue paint calls against it,
//! and report what happened by pushing [`RegionEvent`] and [`SessionEvent`]
//! values into caller-provided buffers. Nothing in the engine holds global
//! state: every system receives the canvas and its configuration explicitly.

mod curve;
mod shape;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use curve::{CurveError, CurveKey, ResponseCurve};
pub use glam::Vec2;
pub use shape::{AreaBounds, AreaFootprint, AreaShape};

/// Identifies who owns a canvas pixel.
///
/// Zero marks an unpainted pixel, positive values identify individual players
/// and `-1` marks pixels claimed by the enemy.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct OwnerId(i32);

impl OwnerId {
    /// Owner recorded for pixels nobody has painted yet.
    pub const UNPAINTED: Self = Self(0);
    /// Owner recorded for pixels painted by the enemy.
    pub const ENEMY: Self = Self(-1);

    /// Creates an owner identifier from its raw value.
    #[must_use]
    pub const fn new(value: i32) -> Self {
        Self(value)
    }

    /// Retrieves the raw owner value.
    #[must_use]
    pub const fn get(&self) -> i32 {
        self.0
    }

    /// Reports whether the owner is a specific player.
    #[must_use]
    pub const fn is_player(&self) -> bool {
        self.0 > 0
    }

    /// Reports whether the owner is the enemy.
    #[must_use]
    pub const fn is_enemy(&self) -> bool {
        self.0 == Self::ENEMY.0
    }

    /// Reports whether the pixel has not been painted.
    #[must_use]
    pub const fn is_unpainted(&self) -> bool {
        self.0 == Self::UNPAINTED.0
    }
}

/// RGBA color applied when painting.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PaintColor {
    /// Red channel intensity in the range 0.0..=1.0.
    pub red: f32,
    /// Green channel intensity in the range 0.0..=1.0.
    pub green: f32,
    /// Blue channel intensity in the range 0.0..=1.0.
    pub blue: f32,
    /// Alpha channel intensity in the range 0.0..=1.0.
    pub alpha: f32,
}

impl PaintColor {
    /// Fully transparent black, the color of an untouched canvas.
    pub const TRANSPARENT: Self = Self::new(0.0, 0.0, 0.0, 0.0);

    /// Creates a new color from floating point channels.
    #[must_use]
    pub const fn new(red: f32, green: f32, blue: f32, alpha: f32) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Creates an opaque color from byte RGB values.
    #[must_use]
    pub const fn from_rgb_u8(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red: red as f32 / 255.0,
            green: green as f32 / 255.0,
            blue: blue as f32 / 255.0,
            alpha: 1.0,
        }
    }

    /// Returns the same color with its alpha replaced, clamped to 0.0..=1.0.
    #[must_use]
    pub fn with_alpha(self, alpha: f32) -> Self {
        Self {
            alpha: alpha.clamp(0.0, 1.0),
            ..self
        }
    }
}

impl Default for PaintColor {
    fn default() -> Self {
        Self::TRANSPARENT
    }
}

/// Location of a single canvas pixel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PixelCoord {
    x: u32,
    y: u32,
}

impl PixelCoord {
    /// Creates a new pixel coordinate.
    #[must_use]
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Zero-based column of the pixel.
    #[must_use]
    pub const fn x(&self) -> u32 {
        self.x
    }

    /// Zero-based row of the pixel.
    #[must_use]
    pub const fn y(&self) -> u32 {
        self.y
    }

    /// Point at the middle of the pixel, used for shape membership tests.
    #[must_use]
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x as f32 + 0.5, self.y as f32 + 0.5)
    }
}

/// Dimensions of the canvas measured in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CanvasResolution {
    width: u32,
    height: u32,
}

impl CanvasResolution {
    /// Creates a new resolution descriptor.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Width of the canvas in pixels.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height of the canvas in pixels.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Total number of pixels on the canvas.
    #[must_use]
    pub const fn pixel_count(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Reports whether the pixel lies on the canvas.
    #[must_use]
    pub const fn contains(&self, pixel: PixelCoord) -> bool {
        pixel.x < self.width && pixel.y < self.height
    }

    /// Geometric center of the canvas.
    #[must_use]
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width as f32, self.height as f32) * 0.5
    }

    /// Clamps a point to the canvas extents.
    #[must_use]
    pub fn clamp_point(&self, point: Vec2) -> Vec2 {
        let max = Vec2::new(
            (self.width as f32 - 1.0).max(0.0),
            (self.height as f32 - 1.0).max(0.0),
        );
        point.clamp(Vec2::ZERO, max)
    }

    /// Resolves the pixel covering the provided point, if it lies on the canvas.
    #[must_use]
    pub fn pixel_at(&self, point: Vec2) -> Option<PixelCoord> {
        if !point.is_finite() || point.x < 0.0 || point.y < 0.0 {
            return None;
        }

        let pixel = PixelCoord::new(point.x.floor() as u32, point.y.floor() as u32);
        self.contains(pixel).then_some(pixel)
    }
}

/// Axis-aligned, half-open range of pixels clipped to the canvas.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PixelRect {
    min_x: u32,
    min_y: u32,
    max_x: u32,
    max_y: u32,
}

impl PixelRect {
    /// Creates a rectangle spanning `min` (inclusive) to `max` (exclusive).
    #[must_use]
    pub const fn new(min_x: u32, min_y: u32, max_x: u32, max_y: u32) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Number of pixels covered by the rectangle.
    #[must_use]
    pub const fn area(&self) -> u64 {
        (self.max_x.saturating_sub(self.min_x)) as u64
            * (self.max_y.saturating_sub(self.min_y)) as u64
    }

    /// Iterates the covered pixels row by row.
    pub fn pixels(&self) -> impl Iterator<Item = PixelCoord> {
        let Self {
            min_x,
            min_y,
            max_x,
            max_y,
        } = *self;
        (min_y..max_y).flat_map(move |y| (min_x..max_x).map(move |x| PixelCoord::new(x, y)))
    }
}

/// Raster surface where every pixel records an owner.
///
/// Implementations batch texture updates; callers invoke
/// [`Canvas::flush_pending_updates`] once per logical paint operation rather
/// than once per pixel.
pub trait Canvas {
    /// Canvas dimensions, or `None` while the surface is not ready.
    fn resolution(&self) -> Option<CanvasResolution>;

    /// Owner of the provided pixel. Pixels off the canvas read as unpainted.
    fn owner_at(&self, pixel: PixelCoord) -> OwnerId;

    /// Paints a filled circle, claiming every covered pixel for `owner`.
    fn paint_circle(
        &mut self,
        center: Vec2,
        radius: f32,
        owner: OwnerId,
        color: PaintColor,
        intensity: f32,
    );

    /// Paints a single pixel with an explicit alpha.
    fn paint_with_alpha(
        &mut self,
        pixel: PixelCoord,
        owner: OwnerId,
        intensity: f32,
        color: PaintColor,
        alpha: f32,
    );

    /// Paints several circles as a single batched update.
    fn paint_many_circles(
        &mut self,
        centers: &[Vec2],
        radius: f32,
        owner: OwnerId,
        intensity: f32,
        color: PaintColor,
    );

    /// Clears every pixel inside the footprint that is owned by `owner`.
    fn erase_owner_in_area(&mut self, footprint: &AreaFootprint, owner: OwnerId);

    /// Pushes batched pixel writes to the backing texture.
    fn flush_pending_updates(&mut self);

    /// Owner of the pixel covering the provided point.
    fn owner_at_point(&self, point: Vec2) -> OwnerId {
        self.resolution()
            .and_then(|resolution| resolution.pixel_at(point))
            .map_or(OwnerId::UNPAINTED, |pixel| self.owner_at(pixel))
    }
}

/// Paint tool that stamps onto a canvas.
pub trait Brush: fmt::Debug {
    /// Stamps the brush at the provided position.
    fn paint(
        &mut self,
        canvas: &mut dyn Canvas,
        position: Vec2,
        owner: OwnerId,
        color: PaintColor,
        intensity: f32,
    );

    /// Radius covered by a single stamp.
    fn radius(&self) -> f32;

    /// Stamps the brush at every point of a stroke as one batched update.
    ///
    /// The canvas is flushed once for the whole stroke.
    fn paint_stroke(
        &mut self,
        canvas: &mut dyn Canvas,
        points: &[Vec2],
        owner: OwnerId,
        color: PaintColor,
        intensity: f32,
    ) {
        canvas.paint_many_circles(points, self.radius(), owner, intensity, color);
    }
}

/// Notifications delivered by the canvas layer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CanvasEvent {
    /// A paint stroke finished and its pixels are visible in the ownership buffer.
    StrokeCompleted {
        /// Canvas position where the stroke ended.
        position: Vec2,
        /// Owner that painted the stroke.
        owner: OwnerId,
        /// Intensity the stroke was painted with.
        intensity: f32,
    },
    /// Painting input was suppressed and pending strokes were discarded.
    PaintingSuppressed,
}

/// Unique identifier assigned to a defense region.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RegionId(u32);

impl RegionId {
    /// Creates a new region identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Lifecycle state of a defense region.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RegionStatus {
    /// The region is still converting and can be defended.
    Active,
    /// The time budget ran out before the region was defended.
    FullyChanged,
    /// Players covered enough of the region to save it.
    FullyDefended,
}

impl RegionStatus {
    /// Reports whether the region reached a terminal state.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        !matches!(self, Self::Active)
    }
}

/// Events emitted by a single defense region.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RegionEvent {
    /// The region's change progress was re-evaluated.
    ProgressChanged {
        /// Region that advanced.
        region: RegionId,
        /// Change progress after the update, within 0.0..=1.0.
        progress: f32,
    },
    /// The region crossed the defense threshold.
    Defended {
        /// Region that was defended.
        region: RegionId,
        /// Fraction of the region owned by players when it was defended.
        defended_progress: f32,
    },
    /// The region fully converted to the enemy color.
    Changed {
        /// Region that was lost.
        region: RegionId,
    },
}

/// Run state of a defense session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionState {
    /// The session advances on every tick.
    Running,
    /// Ticks are ignored until the session resumes.
    Paused,
    /// The session finished; no further ticks are processed.
    Ended,
}

/// Events broadcast by the session for presentation layers.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SessionEvent {
    /// The score changed.
    ScoreChanged {
        /// Score after the change.
        score: u32,
    },
    /// The combo counter changed.
    ComboChanged {
        /// Combo after the change.
        combo: u32,
    },
    /// A new defense region appeared.
    RegionSpawned {
        /// Identifier assigned to the region.
        region: RegionId,
        /// Canvas position of the region's center.
        center: Vec2,
        /// Linear size of the region.
        size: f32,
        /// Shape of the region.
        shape: AreaShape,
    },
    /// A region was defended and removed.
    RegionDefended {
        /// Region that was defended.
        region: RegionId,
        /// Fraction of the region owned by players when it was defended.
        defended_progress: f32,
    },
    /// A region converted to the enemy color and was removed.
    RegionChanged {
        /// Region that was lost.
        region: RegionId,
    },
    /// The session switched between running, paused and ended.
    StateChanged {
        /// State that became active.
        state: SessionState,
    },
    /// The session finished.
    GameOver {
        /// Final score.
        score: u32,
    },
}

#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! In-memory paint canvas that tracks pixel ownership.
//!
//! [`PixelCanvas`] is the authoritative ownership buffer used by headless
//! sessions and tests. It implements the engine's [`Canvas`] contract, counts
//! batched writes until they are flushed, and queues [`CanvasEvent`]
//! notifications that the caller forwards to the session.

use color_defense_core::{
    AreaFootprint, AreaShape, Brush, Canvas, CanvasEvent, CanvasResolution, OwnerId, PaintColor,
    PixelCoord, Vec2,
};

/// Ownership and appearance of a single canvas pixel.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PixelState {
    /// Owner that last painted the pixel.
    pub owner: OwnerId,
    /// Color the pixel was painted with, including its alpha.
    pub color: PaintColor,
    /// Intensity of the stroke that painted the pixel.
    pub intensity: f32,
}

/// Dense ownership canvas backed by a flat pixel buffer.
#[derive(Debug)]
pub struct PixelCanvas {
    resolution: Option<CanvasResolution>,
    pixels: Vec<PixelState>,
    pending_updates: usize,
    flushes: u64,
    painting_suppressed: bool,
    events: Vec<CanvasEvent>,
}

impl PixelCanvas {
    /// Creates a blank canvas with the provided dimensions.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        let mut canvas = Self::pending();
        canvas.initialize(CanvasResolution::new(width, height));
        canvas
    }

    /// Creates a canvas whose texture is not ready yet.
    ///
    /// The canvas reports no resolution and ignores paint calls until
    /// [`PixelCanvas::initialize`] is invoked.
    #[must_use]
    pub fn pending() -> Self {
        Self {
            resolution: None,
            pixels: Vec::new(),
            pending_updates: 0,
            flushes: 0,
            painting_suppressed: false,
            events: Vec::new(),
        }
    }

    /// Allocates a blank pixel buffer with the provided resolution.
    pub fn initialize(&mut self, resolution: CanvasResolution) {
        let capacity = usize::try_from(resolution.pixel_count()).unwrap_or(0);
        self.pixels = vec![PixelState::default(); capacity];
        self.resolution = Some(resolution);
        self.pending_updates = 0;
        log::debug!(
            "canvas initialized at {}x{}",
            resolution.width(),
            resolution.height()
        );
    }

    /// Retrieves the state of a single pixel.
    #[must_use]
    pub fn pixel(&self, pixel: PixelCoord) -> Option<PixelState> {
        self.index(pixel)
            .and_then(|index| self.pixels.get(index).copied())
    }

    /// Counts the pixels currently owned by `owner`.
    #[must_use]
    pub fn count_owned(&self, owner: OwnerId) -> usize {
        self.pixels
            .iter()
            .filter(|state| state.owner == owner)
            .count()
    }

    /// Number of pixel writes waiting for the next flush.
    #[must_use]
    pub fn pending_updates(&self) -> usize {
        self.pending_updates
    }

    /// Number of flushes that pushed at least one pixel write.
    #[must_use]
    pub fn flush_count(&self) -> u64 {
        self.flushes
    }

    /// Reports whether player strokes are currently suppressed.
    #[must_use]
    pub fn painting_suppressed(&self) -> bool {
        self.painting_suppressed
    }

    /// Paints a player stroke and queues its completion notification.
    ///
    /// Returns `false` when the stroke was discarded because painting is
    /// suppressed or the canvas is not ready.
    pub fn player_stroke(
        &mut self,
        center: Vec2,
        radius: f32,
        owner: OwnerId,
        color: PaintColor,
        intensity: f32,
    ) -> bool {
        if self.painting_suppressed || self.resolution.is_none() {
            return false;
        }

        self.paint_circle(center, radius, owner, color, intensity);
        self.events.push(CanvasEvent::StrokeCompleted {
            position: center,
            owner,
            intensity,
        });
        true
    }

    /// Toggles suppression of player strokes.
    ///
    /// Entering suppression queues [`CanvasEvent::PaintingSuppressed`].
    pub fn set_painting_suppressed(&mut self, suppressed: bool) {
        if suppressed && !self.painting_suppressed {
            self.events.push(CanvasEvent::PaintingSuppressed);
        }
        self.painting_suppressed = suppressed;
    }

    /// Moves all queued notifications into `out`.
    pub fn drain_events(&mut self, out: &mut Vec<CanvasEvent>) {
        out.append(&mut self.events);
    }

    fn index(&self, pixel: PixelCoord) -> Option<usize> {
        let resolution = self.resolution?;
        if !resolution.contains(pixel) {
            return None;
        }

        let row = usize::try_from(pixel.y()).ok()?;
        let column = usize::try_from(pixel.x()).ok()?;
        let width = usize::try_from(resolution.width()).ok()?;
        Some(row * width + column)
    }

    fn write(&mut self, pixel: PixelCoord, state: PixelState) {
        if let Some(index) = self.index(pixel) {
            if let Some(slot) = self.pixels.get_mut(index) {
                *slot = state;
                self.pending_updates += 1;
            }
        }
    }

    fn stamp_circle(
        &mut self,
        center: Vec2,
        radius: f32,
        owner: OwnerId,
        color: PaintColor,
        intensity: f32,
    ) {
        let Some(resolution) = self.resolution else {
            return;
        };

        let footprint = AreaFootprint::new(AreaShape::Circle, center, radius * 2.0);
        let state = PixelState {
            owner,
            color,
            intensity,
        };
        let covered: Vec<PixelCoord> = footprint.pixels(resolution).collect();
        for pixel in covered {
            self.write(pixel, state);
        }
    }
}

impl Canvas for PixelCanvas {
    fn resolution(&self) -> Option<CanvasResolution> {
        self.resolution
    }

    fn owner_at(&self, pixel: PixelCoord) -> OwnerId {
        self.pixel(pixel)
            .map_or(OwnerId::UNPAINTED, |state| state.owner)
    }

    fn paint_circle(
        &mut self,
        center: Vec2,
        radius: f32,
        owner: OwnerId,
        color: PaintColor,
        intensity: f32,
    ) {
        self.stamp_circle(center, radius, owner, color, intensity);
        self.flush_pending_updates();
    }

    fn paint_with_alpha(
        &mut self,
        pixel: PixelCoord,
        owner: OwnerId,
        intensity: f32,
        color: PaintColor,
        alpha: f32,
    ) {
        self.write(
            pixel,
            PixelState {
                owner,
                color: color.with_alpha(alpha),
                intensity,
            },
        );
    }

    fn paint_many_circles(
        &mut self,
        centers: &[Vec2],
        radius: f32,
        owner: OwnerId,
        intensity: f32,
        color: PaintColor,
    ) {
        for center in centers {
            self.stamp_circle(*center, radius, owner, color, intensity);
        }
        self.flush_pending_updates();
    }

    fn erase_owner_in_area(&mut self, footprint: &AreaFootprint, owner: OwnerId) {
        let Some(resolution) = self.resolution else {
            return;
        };

        let owned: Vec<PixelCoord> = footprint
            .pixels(resolution)
            .filter(|pixel| self.owner_at(*pixel) == owner)
            .collect();
        for pixel in owned {
            self.write(pixel, PixelState::default());
        }
        self.flush_pending_updates();
    }

    fn flush_pending_updates(&mut self) {
        if self.pending_updates == 0 {
            return;
        }

        log::trace!("flushing {} pixel updates", self.pending_updates);
        self.pending_updates = 0;
        self.flushes += 1;
    }
}

/// Brush that stamps filled circles of a fixed radius.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RoundBrush {
    radius: f32,
}

impl RoundBrush {
    /// Creates a brush with the provided radius.
    #[must_use]
    pub fn new(radius: f32) -> Self {
        Self {
            radius: radius.max(0.5),
        }
    }
}

impl Brush for RoundBrush {
    fn paint(
        &mut self,
        canvas: &mut dyn Canvas,
        position: Vec2,
        owner: OwnerId,
        color: PaintColor,
        intensity: f32,
    ) {
        canvas.paint_circle(position, self.radius, owner, color, intensity);
    }

    fn radius(&self) -> f32 {
        self.radius
    }
}

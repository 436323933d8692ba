use std::f32::consts::PI;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::{CanvasResolution, PixelCoord, PixelRect};

/// Geometric outline of a defense region.
///
/// Every variant is measured by a single linear `size`: the diameter of a
/// circle, the side of a square, and the reference length scaled by the ratios
/// of a rectangle.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AreaShape {
    /// Disc whose diameter equals the region size.
    Circle,
    /// Axis-aligned square whose side equals the region size.
    Square,
    /// Axis-aligned rectangle with independently scaled sides.
    Rectangle {
        /// Width as a multiple of the region size.
        width_ratio: f32,
        /// Height as a multiple of the region size.
        height_ratio: f32,
    },
}

impl AreaShape {
    /// Tests whether `point` lies inside the shape placed at `center`.
    #[must_use]
    pub fn contains(self, point: Vec2, center: Vec2, size: f32) -> bool {
        match self {
            Self::Circle => point.distance(center) <= size * 0.5,
            Self::Square | Self::Rectangle { .. } => {
                let half = self.half_extents(size);
                let offset = (point - center).abs();
                offset.x <= half.x && offset.y <= half.y
            }
        }
    }

    /// Analytic pixel area of the shape, used before a real canvas is available.
    #[must_use]
    pub fn estimated_pixel_count(self, size: f32) -> u32 {
        let size = size.max(0.0);
        let area = match self {
            Self::Circle => PI * (size * 0.5) * (size * 0.5),
            Self::Square => size * size,
            Self::Rectangle {
                width_ratio,
                height_ratio,
            } => size * width_ratio.abs() * size * height_ratio.abs(),
        };
        area.round() as u32
    }

    /// Axis-aligned box enclosing the shape placed at `center`.
    #[must_use]
    pub fn bounding_box(self, center: Vec2, size: f32) -> AreaBounds {
        let half = self.half_extents(size);
        AreaBounds {
            min: center - half,
            max: center + half,
        }
    }

    fn half_extents(self, size: f32) -> Vec2 {
        let size = size.max(0.0);
        match self {
            Self::Circle | Self::Square => Vec2::splat(size * 0.5),
            Self::Rectangle {
                width_ratio,
                height_ratio,
            } => Vec2::new(
                size * width_ratio.abs() * 0.5,
                size * height_ratio.abs() * 0.5,
            ),
        }
    }
}

/// Axis-aligned box expressed in canvas units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AreaBounds {
    /// Corner with the smallest coordinates.
    pub min: Vec2,
    /// Corner with the largest coordinates.
    pub max: Vec2,
}

impl AreaBounds {
    /// Pixels touched by the box, clipped to the canvas. Returns `None` when
    /// the box lies entirely off the canvas.
    #[must_use]
    pub fn pixel_rect(&self, resolution: CanvasResolution) -> Option<PixelRect> {
        if !self.min.is_finite() || !self.max.is_finite() {
            return None;
        }

        let min_x = self.min.x.floor().max(0.0) as u32;
        let min_y = self.min.y.floor().max(0.0) as u32;
        let max_x = (self.max.x.ceil().max(0.0) as u32).min(resolution.width());
        let max_y = (self.max.y.ceil().max(0.0) as u32).min(resolution.height());

        (min_x < max_x && min_y < max_y).then(|| PixelRect::new(min_x, min_y, max_x, max_y))
    }
}

/// A shape placed on the canvas.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AreaFootprint {
    /// Outline of the area.
    pub shape: AreaShape,
    /// Canvas position of the area's center.
    pub center: Vec2,
    /// Linear size of the area.
    pub size: f32,
}

impl AreaFootprint {
    /// Places `shape` at `center` with the provided size.
    #[must_use]
    pub const fn new(shape: AreaShape, center: Vec2, size: f32) -> Self {
        Self {
            shape,
            center,
            size,
        }
    }

    /// Tests whether `point` lies inside the footprint.
    #[must_use]
    pub fn contains(&self, point: Vec2) -> bool {
        self.shape.contains(point, self.center, self.size)
    }

    /// Canvas-space bounding box of the footprint.
    #[must_use]
    pub fn bounding_box(&self) -> AreaBounds {
        self.shape.bounding_box(self.center, self.size)
    }

    /// Iterates the canvas pixels whose centers fall inside the footprint.
    pub fn pixels(&self, resolution: CanvasResolution) -> impl Iterator<Item = PixelCoord> + '_ {
        self.bounding_box()
            .pixel_rect(resolution)
            .into_iter()
            .flat_map(|rect| rect.pixels())
            .filter(move |pixel| self.contains(pixel.center()))
    }

    /// Number of canvas pixels covered by the footprint.
    #[must_use]
    pub fn pixel_count(&self, resolution: CanvasResolution) -> u32 {
        let count = self.pixels(resolution).count();
        u32::try_from(count).unwrap_or(u32::MAX)
    }
}

#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Defense regions that convert to the enemy color unless players cover them.
//!
//! A [`ColorChangeRegion`] ages every tick, slowed down by the fraction of its
//! pixels that players own. As it ages the enemy color creeps over the
//! neutral pixels in tenth-sized steps. Covering at least the defense
//! threshold saves the region; running out of time loses it. Both outcomes are
//! terminal and are reported exactly once.

use color_defense_core::{
    AreaFootprint, AreaShape, Canvas, CanvasEvent, OwnerId, PaintColor, RegionEvent, RegionId,
    RegionStatus, ResponseCurve, Vec2,
};
use serde::{Deserialize, Serialize};

/// Time budget used when a region is spawned with a non-positive one.
pub const DEFAULT_TIME_TO_COMPLETE: f32 = 10.0;

/// Lowest fraction of real time a defended region keeps aging at.
pub const MIN_SLOWDOWN_FACTOR: f32 = 0.1;

const AUTO_PAINT_STEPS: f32 = 10.0;
const PROGRESS_EPSILON: f32 = 1e-4;

/// Behaviour shared by every region of a session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegionTuning {
    /// Defended fraction at which a region is saved.
    pub defense_threshold: f32,
    /// Defended fraction reported as a "full" defense in logs.
    pub full_defense_threshold: f32,
    /// How strongly player coverage slows the region down.
    pub paint_slowdown_effect: f32,
    /// Whether the enemy color creeps over the region while it ages.
    pub auto_paint_enabled: bool,
    /// Optional remapping of linear time progress.
    pub progress_curve: Option<ResponseCurve>,
    /// Color painted by the enemy.
    pub enemy_color: PaintColor,
    /// Intensity of the enemy creep.
    pub enemy_intensity: f32,
}

impl Default for RegionTuning {
    fn default() -> Self {
        Self {
            defense_threshold: 0.5,
            full_defense_threshold: 0.9,
            paint_slowdown_effect: 1.0,
            auto_paint_enabled: true,
            progress_curve: None,
            enemy_color: PaintColor::from_rgb_u8(0x6a, 0x1b, 0x9a),
            enemy_intensity: 1.0,
        }
    }
}

/// A spawned defense region and its progress bookkeeping.
#[derive(Clone, Debug)]
pub struct ColorChangeRegion {
    id: RegionId,
    footprint: AreaFootprint,
    tuning: RegionTuning,
    change_progress: f32,
    defended_progress: f32,
    elapsed_time: f32,
    effective_time_to_complete: f32,
    total_pixels_in_area: u32,
    last_paint_step: u8,
    auto_paint_cancelled: bool,
    fully_defended_fired: bool,
    fully_changed_fired: bool,
    enemy_color_erased: bool,
    missing_canvas_reported: bool,
    status: RegionStatus,
}

impl ColorChangeRegion {
    /// Spawns a region covering `footprint`.
    ///
    /// The pixel total is counted on the canvas when it is ready and estimated
    /// from the shape's analytic area otherwise.
    #[must_use]
    pub fn spawn(
        id: RegionId,
        footprint: AreaFootprint,
        time_to_complete: f32,
        tuning: RegionTuning,
        canvas: &dyn Canvas,
    ) -> Self {
        let effective_time_to_complete = if time_to_complete > 0.0 {
            time_to_complete
        } else {
            log::warn!(
                "region {} spawned with time to complete {time_to_complete}; using {DEFAULT_TIME_TO_COMPLETE}s",
                id.get()
            );
            DEFAULT_TIME_TO_COMPLETE
        };

        let counted = canvas
            .resolution()
            .map(|resolution| footprint.pixel_count(resolution))
            .filter(|count| *count > 0);
        let total_pixels_in_area = counted.unwrap_or_else(|| {
            log::warn!(
                "region {} could not be measured on the canvas; estimating its pixel area",
                id.get()
            );
            footprint.shape.estimated_pixel_count(footprint.size)
        });

        Self {
            id,
            footprint,
            tuning,
            change_progress: 0.0,
            defended_progress: 0.0,
            elapsed_time: 0.0,
            effective_time_to_complete,
            total_pixels_in_area,
            last_paint_step: 0,
            auto_paint_cancelled: false,
            fully_defended_fired: false,
            fully_changed_fired: false,
            enemy_color_erased: false,
            missing_canvas_reported: false,
            status: RegionStatus::Active,
        }
    }

    /// Identifier assigned at spawn.
    #[must_use]
    pub const fn id(&self) -> RegionId {
        self.id
    }

    /// Placement of the region on the canvas.
    #[must_use]
    pub const fn footprint(&self) -> &AreaFootprint {
        &self.footprint
    }

    /// Canvas position of the region's center.
    #[must_use]
    pub const fn center(&self) -> Vec2 {
        self.footprint.center
    }

    /// Linear size of the region.
    #[must_use]
    pub const fn size(&self) -> f32 {
        self.footprint.size
    }

    /// Outline of the region.
    #[must_use]
    pub const fn shape(&self) -> AreaShape {
        self.footprint.shape
    }

    /// Fraction of the time budget consumed, within 0.0..=1.0.
    #[must_use]
    pub const fn change_progress(&self) -> f32 {
        self.change_progress
    }

    /// Fraction of the region's pixels owned by players, within 0.0..=1.0.
    #[must_use]
    pub const fn defended_progress(&self) -> f32 {
        self.defended_progress
    }

    /// Seconds of slowed-down time the region has aged.
    #[must_use]
    pub const fn elapsed_time(&self) -> f32 {
        self.elapsed_time
    }

    /// Time budget the region was spawned with.
    #[must_use]
    pub const fn effective_time_to_complete(&self) -> f32 {
        self.effective_time_to_complete
    }

    /// Pixel total used as the denominator of the defended fraction.
    #[must_use]
    pub const fn total_pixels_in_area(&self) -> u32 {
        self.total_pixels_in_area
    }

    /// Progress step at which the enemy color was last applied.
    #[must_use]
    pub fn last_paint_step(&self) -> f32 {
        f32::from(self.last_paint_step) / AUTO_PAINT_STEPS
    }

    /// Reports whether enemy creep stopped for this region.
    #[must_use]
    pub const fn auto_paint_cancelled(&self) -> bool {
        self.auto_paint_cancelled
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn status(&self) -> RegionStatus {
        self.status
    }

    /// Tuning the region was spawned with.
    #[must_use]
    pub const fn tuning(&self) -> &RegionTuning {
        &self.tuning
    }

    /// Reports whether players cover at least the defense threshold.
    #[must_use]
    pub fn is_fully_defended(&self) -> bool {
        self.defended_progress >= self.tuning.defense_threshold
    }

    /// Reports whether the time budget ran out without a successful defense.
    #[must_use]
    pub fn is_fully_changed(&self) -> bool {
        self.change_progress >= 1.0 && !self.is_fully_defended()
    }

    /// Stops enemy creep without ending the region.
    ///
    /// A cancelled region stops aging but keeps scanning coverage so it can
    /// still be defended.
    pub fn cancel_auto_paint(&mut self) {
        self.auto_paint_cancelled = true;
    }

    /// Advances the region by `dt` seconds of real time.
    pub fn update(
        &mut self,
        dt: f32,
        canvas: &mut dyn Canvas,
        out: &mut Vec<RegionEvent>,
    ) -> RegionStatus {
        if self.status.is_terminal() {
            return self.status;
        }

        self.rescan_coverage(canvas);

        if self.auto_paint_cancelled {
            if self.is_fully_defended() {
                self.mark_defended(canvas, out);
            }
            return self.status;
        }

        self.elapsed_time += self.scaled_delta(dt);

        let previous = self.change_progress;
        self.change_progress = self.progress_for_elapsed().max(previous);

        if self.change_progress > previous && self.tuning.auto_paint_enabled {
            self.apply_enemy_paint(canvas);
        }

        out.push(RegionEvent::ProgressChanged {
            region: self.id,
            progress: self.change_progress,
        });

        if self.is_fully_defended() {
            self.mark_defended(canvas, out);
        } else if self.change_progress >= 1.0 {
            self.mark_changed(out);
        }

        self.status
    }

    /// Reacts to a canvas notification between ticks.
    ///
    /// Completed strokes re-scan coverage immediately so a defense registers
    /// before the next tick. Suppressed painting only refreshes coverage.
    pub fn handle_canvas_event(
        &mut self,
        event: &CanvasEvent,
        canvas: &mut dyn Canvas,
        out: &mut Vec<RegionEvent>,
    ) -> RegionStatus {
        if self.status.is_terminal() {
            return self.status;
        }

        self.rescan_coverage(canvas);

        if matches!(event, CanvasEvent::StrokeCompleted { .. }) && self.is_fully_defended() {
            self.mark_defended(canvas, out);
        }

        self.status
    }

    /// Recounts the player-owned pixels inside the region.
    pub fn rescan_coverage(&mut self, canvas: &dyn Canvas) {
        let Some(resolution) = canvas.resolution() else {
            if !self.missing_canvas_reported {
                log::warn!(
                    "region {} cannot scan coverage before the canvas is ready",
                    self.id.get()
                );
                self.missing_canvas_reported = true;
            }
            return;
        };

        if self.total_pixels_in_area == 0 {
            self.defended_progress = 0.0;
            return;
        }

        let owned = self
            .footprint
            .pixels(resolution)
            .filter(|pixel| canvas.owner_at(*pixel).is_player())
            .count();
        let ratio = owned as f32 / self.total_pixels_in_area as f32;
        self.defended_progress = ratio.clamp(0.0, 1.0);
    }

    fn scaled_delta(&self, dt: f32) -> f32 {
        let dt = dt.max(0.0);
        if self.defended_progress > 0.0 {
            let slowdown = (1.0 - self.defended_progress * self.tuning.paint_slowdown_effect)
                .max(MIN_SLOWDOWN_FACTOR);
            dt * slowdown
        } else {
            dt
        }
    }

    fn progress_for_elapsed(&self) -> f32 {
        let mut linear = (self.elapsed_time / self.effective_time_to_complete).clamp(0.0, 1.0);
        if linear >= 1.0 - PROGRESS_EPSILON {
            linear = 1.0;
        }

        match &self.tuning.progress_curve {
            Some(curve) => curve.evaluate(linear).clamp(0.0, 1.0),
            None => linear,
        }
    }

    fn apply_enemy_paint(&mut self, canvas: &mut dyn Canvas) {
        let current_step = paint_step(self.change_progress);
        if current_step <= self.last_paint_step {
            return;
        }

        let Some(resolution) = canvas.resolution() else {
            return;
        };

        let alpha = f32::from(current_step) / AUTO_PAINT_STEPS;
        let targets: Vec<_> = self
            .footprint
            .pixels(resolution)
            .filter(|pixel| !canvas.owner_at(*pixel).is_player())
            .collect();
        for pixel in targets {
            canvas.paint_with_alpha(
                pixel,
                OwnerId::ENEMY,
                self.tuning.enemy_intensity,
                self.tuning.enemy_color,
                alpha,
            );
        }
        canvas.flush_pending_updates();

        self.last_paint_step = current_step;
    }

    fn mark_defended(&mut self, canvas: &mut dyn Canvas, out: &mut Vec<RegionEvent>) {
        if self.fully_defended_fired {
            return;
        }

        if !self.enemy_color_erased {
            canvas.erase_owner_in_area(&self.footprint, OwnerId::ENEMY);
            self.enemy_color_erased = true;
        }

        self.fully_defended_fired = true;
        self.auto_paint_cancelled = true;
        self.status = RegionStatus::FullyDefended;

        log::debug!(
            "region {} defended at {:.1}% coverage (full defense at {:.1}%)",
            self.id.get(),
            self.defended_progress * 100.0,
            self.tuning.full_defense_threshold * 100.0
        );
        out.push(RegionEvent::Defended {
            region: self.id,
            defended_progress: self.defended_progress,
        });
    }

    fn mark_changed(&mut self, out: &mut Vec<RegionEvent>) {
        if self.fully_changed_fired {
            return;
        }

        self.fully_changed_fired = true;
        self.status = RegionStatus::FullyChanged;
        log::debug!(
            "region {} fully changed with {:.1}% coverage",
            self.id.get(),
            self.defended_progress * 100.0
        );
        out.push(RegionEvent::Changed { region: self.id });
    }
}

/// Quantizes change progress to the tenth at which enemy color is applied.
fn paint_step(change_progress: f32) -> u8 {
    let scaled = (change_progress.clamp(0.0, 1.0) * AUTO_PAINT_STEPS + PROGRESS_EPSILON).floor();
    scaled.min(AUTO_PAINT_STEPS) as u8
}

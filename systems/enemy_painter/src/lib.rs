#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Autonomous enemy that roams the canvas and paints it with the enemy color.
//!
//! The painter periodically samples candidate points around itself, scores
//! them by the owner of the pixel underneath, and walks toward the winner
//! while stamping interpolated strokes along its path.

use std::f32::consts::TAU;

use color_defense_core::{Brush, Canvas, CanvasResolution, OwnerId, PaintColor, Vec2};
use color_defense_system_difficulty::LevelParams;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Number of candidate points sampled on every retarget.
pub const CANDIDATE_COUNT: usize = 12;
/// Score assigned to candidates the enemy already owns.
pub const ENEMY_OWNED_SCORE: f32 = 0.1;
/// Half-width of the random jitter added to every candidate score.
pub const SCORE_JITTER: f32 = 0.05;
/// Upper bound on interpolated stamps per movement step.
pub const MAX_STROKE_POINTS: usize = 20;

const ARRIVAL_DISTANCE: f32 = 1.0;
const MIN_SEARCH_RADIUS: f32 = 50.0;
const SEARCH_RADIUS_FACTOR: f32 = 5.0;

/// Static tuning of the enemy painter.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PainterConfig {
    /// Movement speed in canvas pixels per second before the level multiplier.
    pub base_move_speed: f32,
    /// Radius of the fallback circular stamp.
    pub paint_radius: f32,
    /// Seconds between forced retargets.
    pub retarget_interval: f32,
    /// Color the painter stamps with.
    pub color: PaintColor,
}

impl Default for PainterConfig {
    fn default() -> Self {
        Self {
            base_move_speed: 120.0,
            paint_radius: 6.0,
            retarget_interval: 1.5,
            color: PaintColor::from_rgb_u8(0x6a, 0x1b, 0x9a),
        }
    }
}

/// Continuous-position AI that paints the canvas with the enemy color.
#[derive(Debug)]
pub struct EnemyPainter {
    config: PainterConfig,
    level: LevelParams,
    brush: Option<Box<dyn Brush>>,
    current_position: Vec2,
    target_position: Vec2,
    last_painted: Vec2,
    time_until_next_target: f32,
    move_speed: f32,
    stroke_interval: f32,
    paint_radius: f32,
    rng: ChaCha8Rng,
    candidates: Vec<Vec2>,
    stroke_points: Vec<Vec2>,
    missing_canvas_reported: bool,
}

impl EnemyPainter {
    /// Creates a painter standing at `start` that paints with the fallback stamp.
    #[must_use]
    pub fn new(config: PainterConfig, level: LevelParams, start: Vec2, seed: u64) -> Self {
        let mut painter = Self {
            config,
            level,
            brush: None,
            current_position: start,
            target_position: start,
            last_painted: start,
            time_until_next_target: 0.0,
            move_speed: 0.0,
            stroke_interval: 1.0,
            paint_radius: 0.0,
            rng: ChaCha8Rng::seed_from_u64(seed),
            candidates: Vec::with_capacity(CANDIDATE_COUNT),
            stroke_points: Vec::with_capacity(MAX_STROKE_POINTS),
            missing_canvas_reported: false,
        };
        painter.derive_constants();
        painter
    }

    /// Paints through `brush` instead of the fallback stamp.
    #[must_use]
    pub fn with_brush(mut self, brush: Box<dyn Brush>) -> Self {
        self.brush = Some(brush);
        self.derive_constants();
        self
    }

    /// Switches to the tuning of another difficulty level.
    pub fn set_level(&mut self, level: LevelParams) {
        self.level = level;
        self.derive_constants();
    }

    /// Current position on the canvas.
    #[must_use]
    pub const fn position(&self) -> Vec2 {
        self.current_position
    }

    /// Point the painter is walking toward.
    #[must_use]
    pub const fn target(&self) -> Vec2 {
        self.target_position
    }

    /// Active level tuning.
    #[must_use]
    pub const fn level(&self) -> &LevelParams {
        &self.level
    }

    /// Pixels per second the painter moves.
    #[must_use]
    pub const fn move_speed(&self) -> f32 {
        self.move_speed
    }

    /// Radius of a single stamp.
    #[must_use]
    pub const fn paint_radius(&self) -> f32 {
        self.paint_radius
    }

    /// Seconds until the painter is forced to pick a new target.
    #[must_use]
    pub const fn time_until_next_target(&self) -> f32 {
        self.time_until_next_target
    }

    /// Advances the painter by `dt` seconds, moving and painting on `canvas`.
    pub fn update(&mut self, dt: f32, canvas: &mut dyn Canvas) {
        let Some(resolution) = canvas.resolution() else {
            if !self.missing_canvas_reported {
                log::warn!("enemy painter is idle until the canvas is ready");
                self.missing_canvas_reported = true;
            }
            return;
        };

        self.time_until_next_target -= dt.max(0.0);
        let arrived = self.current_position.distance(self.target_position) < ARRIVAL_DISTANCE;
        if self.time_until_next_target <= 0.0 || arrived {
            self.retarget(&*canvas, resolution);
        }

        self.advance(dt);
        self.paint_path(canvas);
    }

    fn derive_constants(&mut self) {
        self.move_speed = self.config.base_move_speed * self.level.move_speed_multiplier.max(0.0);
        self.paint_radius = self
            .brush
            .as_ref()
            .map_or(self.config.paint_radius, |brush| brush.radius())
            .max(0.5);
        self.stroke_interval = (self.paint_radius * 0.5).max(0.5);
    }

    fn retarget(&mut self, canvas: &dyn Canvas, resolution: CanvasResolution) {
        self.sample_candidates(resolution);
        let candidates = std::mem::take(&mut self.candidates);
        if let Some(target) = self.choose_candidate(&candidates, canvas) {
            self.target_position = target;
            log::trace!(
                "enemy painter retargeted to ({:.1}, {:.1})",
                target.x,
                target.y
            );
        }
        self.candidates = candidates;
        self.time_until_next_target = self.config.retarget_interval;
    }

    fn sample_candidates(&mut self, resolution: CanvasResolution) {
        let radius = (self.paint_radius * SEARCH_RADIUS_FACTOR).max(MIN_SEARCH_RADIUS);
        self.candidates.clear();
        for _ in 0..CANDIDATE_COUNT {
            let angle = self.rng.gen_range(0.0..TAU);
            let distance = radius * self.rng.gen::<f32>().sqrt();
            let offset = Vec2::new(angle.cos(), angle.sin()) * distance;
            self.candidates
                .push(resolution.clamp_point(self.current_position + offset));
        }
    }

    /// Picks the best-scoring candidate, or the last one when the painter misses.
    fn choose_candidate(&mut self, candidates: &[Vec2], canvas: &dyn Canvas) -> Option<Vec2> {
        let last = *candidates.last()?;
        if self.rng.gen::<f32>() < self.level.miss_rate {
            return Some(last);
        }

        let mut best: Option<(f32, Vec2)> = None;
        for candidate in candidates {
            let owner = canvas.owner_at_point(*candidate);
            let score = self.score_owner(owner) + self.rng.gen_range(-SCORE_JITTER..=SCORE_JITTER);
            match best {
                Some((best_score, _)) if best_score >= score => {}
                _ => best = Some((score, *candidate)),
            }
        }

        best.map(|(_, candidate)| candidate)
    }

    fn score_owner(&self, owner: OwnerId) -> f32 {
        if owner.is_player() {
            self.level.repaint_player_weight
        } else if owner.is_enemy() {
            ENEMY_OWNED_SCORE
        } else {
            self.level.focus_unpainted_weight
        }
    }

    fn advance(&mut self, dt: f32) {
        let offset = self.target_position - self.current_position;
        let distance = offset.length();
        let step = self.move_speed * dt.max(0.0);

        if distance <= step {
            self.current_position = self.target_position;
        } else if distance > 0.0 {
            self.current_position += offset / distance * step;
        }
    }

    fn paint_path(&mut self, canvas: &mut dyn Canvas) {
        let delta = self.current_position - self.last_painted;
        let distance = delta.length();
        if distance <= f32::EPSILON {
            return;
        }

        let steps = ((distance / self.stroke_interval).ceil() as usize).clamp(1, MAX_STROKE_POINTS);
        self.stroke_points.clear();
        for index in 1..=steps {
            let t = index as f32 / steps as f32;
            self.stroke_points.push(self.last_painted + delta * t);
        }

        match self.brush.as_deref_mut() {
            Some(brush) => brush.paint_stroke(
                canvas,
                &self.stroke_points,
                OwnerId::ENEMY,
                self.config.color,
                1.0,
            ),
            None => canvas.paint_many_circles(
                &self.stroke_points,
                self.paint_radius,
                OwnerId::ENEMY,
                1.0,
                self.config.color,
            ),
        }

        self.last_painted = self.current_position;
    }
}

#[cfg(test)]
mod tests {
    use super::{EnemyPainter, PainterConfig, MAX_STROKE_POINTS};
    use color_defense_canvas::{PixelCanvas, RoundBrush};
    use color_defense_core::{
        AreaFootprint, Canvas, CanvasResolution, OwnerId, PaintColor, PixelCoord, Vec2,
    };
    use color_defense_system_difficulty::LevelParams;

    fn precise_level() -> LevelParams {
        LevelParams {
            move_speed_multiplier: 1.0,
            focus_unpainted_weight: 2.0,
            repaint_player_weight: 1.0,
            miss_rate: 0.0,
        }
    }

    fn enemy_canvas() -> PixelCanvas {
        let mut canvas = PixelCanvas::new(64, 64);
        let resolution = canvas.resolution().expect("canvas ready");
        let pixels: Vec<PixelCoord> = resolution_pixels(resolution).collect();
        for pixel in pixels {
            canvas.paint_with_alpha(pixel, OwnerId::ENEMY, 1.0, PaintColor::TRANSPARENT, 1.0);
        }
        canvas.flush_pending_updates();
        canvas
    }

    fn resolution_pixels(resolution: CanvasResolution) -> impl Iterator<Item = PixelCoord> {
        (0..resolution.height())
            .flat_map(move |y| (0..resolution.width()).map(move |x| PixelCoord::new(x, y)))
    }

    #[derive(Default)]
    struct RecordingCanvas {
        batches: Vec<usize>,
        flushes: usize,
    }

    impl Canvas for RecordingCanvas {
        fn resolution(&self) -> Option<CanvasResolution> {
            Some(CanvasResolution::new(4_096, 4_096))
        }

        fn owner_at(&self, _pixel: PixelCoord) -> OwnerId {
            OwnerId::UNPAINTED
        }

        fn paint_circle(&mut self, _: Vec2, _: f32, _: OwnerId, _: PaintColor, _: f32) {}

        fn paint_with_alpha(&mut self, _: PixelCoord, _: OwnerId, _: f32, _: PaintColor, _: f32) {
        }

        fn paint_many_circles(
            &mut self,
            centers: &[Vec2],
            _: f32,
            _: OwnerId,
            _: f32,
            _: PaintColor,
        ) {
            self.batches.push(centers.len());
        }

        fn erase_owner_in_area(&mut self, _: &AreaFootprint, _: OwnerId) {}

        fn flush_pending_updates(&mut self) {
            self.flushes += 1;
        }
    }

    #[test]
    fn prefers_the_single_unpainted_candidate() {
        let mut canvas = enemy_canvas();
        let unpainted = Vec2::new(40.5, 12.5);
        canvas.paint_with_alpha(
            PixelCoord::new(40, 12),
            OwnerId::UNPAINTED,
            0.0,
            PaintColor::TRANSPARENT,
            0.0,
        );

        let mut painter = EnemyPainter::new(
            PainterConfig::default(),
            precise_level(),
            Vec2::new(32.0, 32.0),
            0x5eed,
        );

        for round in 0..200 {
            let mut candidates: Vec<Vec2> = (0..11)
                .map(|index| Vec2::new(2.5 + index as f32 * 5.0, 50.5))
                .collect();
            candidates.insert(round % 12, unpainted);
            assert_eq!(painter.choose_candidate(&candidates, &canvas), Some(unpainted));
        }
    }

    #[test]
    fn certain_miss_takes_the_last_candidate() {
        let canvas = enemy_canvas();
        let level = LevelParams {
            miss_rate: 1.0,
            ..precise_level()
        };
        let mut painter =
            EnemyPainter::new(PainterConfig::default(), level, Vec2::new(32.0, 32.0), 7);
        let candidates = [Vec2::new(1.0, 1.0), Vec2::new(2.0, 2.0), Vec2::new(3.0, 3.0)];
        assert_eq!(
            painter.choose_candidate(&candidates, &canvas),
            Some(Vec2::new(3.0, 3.0))
        );
    }

    #[test]
    fn movement_never_overshoots_target() {
        let mut painter = EnemyPainter::new(
            PainterConfig::default(),
            precise_level(),
            Vec2::new(10.0, 10.0),
            1,
        );
        painter.target_position = Vec2::new(12.0, 10.0);
        painter.advance(1.0);
        assert_eq!(painter.position(), Vec2::new(12.0, 10.0));

        painter.target_position = Vec2::new(112.0, 10.0);
        painter.advance(0.5);
        assert!((painter.position().x - 72.0).abs() < 1e-4);
    }

    #[test]
    fn painting_follows_the_path() {
        let mut canvas = PixelCanvas::new(200, 200);
        let mut painter = EnemyPainter::new(
            PainterConfig::default(),
            precise_level(),
            Vec2::new(20.0, 100.0),
            3,
        );
        painter.time_until_next_target = 10.0;
        painter.target_position = Vec2::new(180.0, 100.0);

        painter.update(0.5, &mut canvas);

        assert!((painter.position().x - 80.0).abs() < 1e-3);
        for x in [25.0, 50.0, 79.0] {
            assert!(
                canvas.owner_at_point(Vec2::new(x, 100.0)).is_enemy(),
                "expected enemy paint at x={x}"
            );
        }
        assert!(canvas.owner_at_point(Vec2::new(120.0, 100.0)).is_unpainted());
        assert_eq!(canvas.count_owned(OwnerId::new(1)), 0);
    }

    #[test]
    fn long_steps_cap_interpolated_stamps() {
        let mut canvas = RecordingCanvas::default();
        let config = PainterConfig {
            base_move_speed: 10_000.0,
            ..PainterConfig::default()
        };
        let mut painter = EnemyPainter::new(config, precise_level(), Vec2::new(0.0, 0.0), 9);
        painter.time_until_next_target = 10.0;
        painter.target_position = Vec2::new(2_000.0, 0.0);

        painter.update(1.0, &mut canvas);

        assert_eq!(canvas.batches, vec![MAX_STROKE_POINTS]);
        assert_eq!(canvas.flushes, 0);
    }

    #[test]
    fn brush_replaces_fallback_stamp() {
        let mut canvas = PixelCanvas::new(200, 200);
        let mut painter = EnemyPainter::new(
            PainterConfig::default(),
            precise_level(),
            Vec2::new(100.0, 100.0),
            4,
        )
        .with_brush(Box::new(RoundBrush::new(12.0)));
        assert!((painter.paint_radius() - 12.0).abs() < f32::EPSILON);

        painter.time_until_next_target = 10.0;
        painter.target_position = Vec2::new(110.0, 100.0);
        painter.update(1.0, &mut canvas);

        assert!(canvas.owner_at_point(Vec2::new(110.0, 111.0)).is_enemy());
    }

    #[test]
    fn brush_stroke_flushes_once_per_step() {
        let mut canvas = PixelCanvas::new(400, 200);
        let mut painter = EnemyPainter::new(
            PainterConfig::default(),
            precise_level(),
            Vec2::new(20.0, 100.0),
            6,
        )
        .with_brush(Box::new(RoundBrush::new(6.0)));
        painter.time_until_next_target = 10.0;
        painter.target_position = Vec2::new(380.0, 100.0);

        let flushes_before = canvas.flush_count();
        painter.update(0.5, &mut canvas);

        assert_eq!(canvas.flush_count(), flushes_before + 1);
        assert_eq!(canvas.pending_updates(), 0);
        assert!(canvas.owner_at_point(Vec2::new(50.0, 100.0)).is_enemy());
    }

    #[test]
    fn arriving_at_target_triggers_retarget() {
        let mut canvas = PixelCanvas::new(200, 200);
        let mut painter = EnemyPainter::new(
            PainterConfig::default(),
            precise_level(),
            Vec2::new(100.0, 100.0),
            11,
        );
        painter.time_until_next_target = 10.0;
        painter.target_position = Vec2::new(100.5, 100.0);

        painter.update(0.01, &mut canvas);

        assert!((painter.time_until_next_target() - 1.5).abs() < 1e-6);
        let search = painter.target().distance(Vec2::new(100.0, 100.0));
        assert!(search <= 50.0 + 1e-3);
    }

    #[test]
    fn pending_canvas_keeps_painter_idle() {
        let mut canvas = PixelCanvas::pending();
        let mut painter = EnemyPainter::new(
            PainterConfig::default(),
            precise_level(),
            Vec2::new(5.0, 5.0),
            2,
        );
        painter.update(1.0, &mut canvas);
        assert_eq!(painter.position(), Vec2::new(5.0, 5.0));
    }

    #[test]
    fn level_scales_move_speed() {
        let mut painter = EnemyPainter::new(
            PainterConfig::default(),
            precise_level(),
            Vec2::ZERO,
            0,
        );
        painter.set_level(LevelParams {
            move_speed_multiplier: 2.5,
            ..precise_level()
        });
        assert!((painter.move_speed() - 300.0).abs() < 1e-4);
    }
}

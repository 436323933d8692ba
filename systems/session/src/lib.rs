#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Session orchestration for the color defense mode.
//!
//! [`ColorDefenseSession`] owns the active regions and the optional enemy
//! painter. Every tick it resolves the current difficulty, spawns regions on
//! cadence, advances each region against the shared canvas and converts region
//! outcomes into score and combo changes reported as [`SessionEvent`]s.

mod settings;

pub use settings::SessionSettings;

use color_defense_core::{
    AreaFootprint, AreaShape, Canvas, CanvasEvent, CanvasResolution, RegionEvent, RegionId,
    SessionEvent, SessionState, Vec2,
};
use color_defense_system_difficulty::{self as difficulty, ResolvedDifficulty};
use color_defense_system_enemy_painter::EnemyPainter;
use color_defense_system_regions::ColorChangeRegion;
use rand::{seq::SliceRandom, Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Candidate positions drawn, the first included, before a spawn is blended
/// away from the player.
pub const SPAWN_AVOIDANCE_ATTEMPTS: usize = 10;

/// Running totals describing a session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SessionStats {
    /// Regions spawned so far.
    pub regions_spawned: u32,
    /// Regions players defended.
    pub regions_defended: u32,
    /// Regions that fully changed.
    pub regions_changed: u32,
    /// Longest combo reached.
    pub best_combo: u32,
}

/// Orchestrates regions, scoring and the enemy painter for one session.
#[derive(Debug)]
pub struct ColorDefenseSession {
    settings: SessionSettings,
    state: SessionState,
    regions: Vec<ColorChangeRegion>,
    painter: Option<EnemyPainter>,
    painter_seed: u64,
    score: u32,
    combo: u32,
    game_time: f32,
    spawn_timer: f32,
    next_region: u32,
    last_player_paint: Option<Vec2>,
    stats: SessionStats,
    rng: ChaCha8Rng,
    region_events: Vec<RegionEvent>,
    missing_canvas_reported: bool,
}

impl ColorDefenseSession {
    /// Creates a running session from `settings`, seeding every random choice
    /// from `seed`.
    #[must_use]
    pub fn new(settings: SessionSettings, seed: u64) -> Self {
        let settings = settings.sanitized();
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let painter_seed = rng.gen();

        Self {
            settings,
            state: SessionState::Running,
            regions: Vec::new(),
            painter: None,
            painter_seed,
            score: 0,
            combo: 0,
            game_time: 0.0,
            spawn_timer: 0.0,
            next_region: 1,
            last_player_paint: None,
            stats: SessionStats::default(),
            rng,
            region_events: Vec::new(),
            missing_canvas_reported: false,
        }
    }

    /// Settings the session runs with, after sanitizing.
    #[must_use]
    pub const fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    /// Current run state.
    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// Current score.
    #[must_use]
    pub const fn score(&self) -> u32 {
        self.score
    }

    /// Consecutive defenses since the last lost region.
    #[must_use]
    pub const fn combo(&self) -> u32 {
        self.combo
    }

    /// Seconds of session time elapsed.
    #[must_use]
    pub const fn game_time(&self) -> f32 {
        self.game_time
    }

    /// Fraction of the session duration elapsed, within 0.0..=1.0.
    #[must_use]
    pub fn progress(&self) -> f32 {
        (self.game_time / self.settings.game_duration).clamp(0.0, 1.0)
    }

    /// Reports whether the session reached its end.
    #[must_use]
    pub fn is_game_over(&self) -> bool {
        self.state == SessionState::Ended
    }

    /// Regions that are still active.
    #[must_use]
    pub fn regions(&self) -> &[ColorChangeRegion] {
        &self.regions
    }

    /// Enemy painter, once it has been placed on a ready canvas.
    #[must_use]
    pub const fn painter(&self) -> Option<&EnemyPainter> {
        self.painter.as_ref()
    }

    /// Running totals for summaries.
    #[must_use]
    pub const fn stats(&self) -> SessionStats {
        self.stats
    }

    /// Canvas position of the most recent player stroke.
    #[must_use]
    pub const fn last_player_paint(&self) -> Option<Vec2> {
        self.last_player_paint
    }

    /// Tunables in effect at the current session time.
    #[must_use]
    pub fn current_difficulty(&self) -> ResolvedDifficulty {
        difficulty::resolve(
            self.settings.difficulty.as_ref(),
            self.game_time,
            self.settings.game_duration,
            self.settings.session_defaults(),
        )
    }

    /// Suspends ticking until [`ColorDefenseSession::resume`] is called.
    pub fn pause(&mut self, out: &mut Vec<SessionEvent>) {
        if self.state == SessionState::Running {
            self.set_state(SessionState::Paused, out);
        }
    }

    /// Resumes a paused session.
    pub fn resume(&mut self, out: &mut Vec<SessionEvent>) {
        if self.state == SessionState::Paused {
            self.set_state(SessionState::Running, out);
        }
    }

    /// Ends the session, tearing down every active region.
    pub fn end(&mut self, out: &mut Vec<SessionEvent>) {
        if self.state == SessionState::Ended {
            return;
        }

        self.regions.clear();
        self.set_state(SessionState::Ended, out);
        log::info!(
            "session ended after {:.1}s with score {} ({} defended, {} changed)",
            self.game_time,
            self.score,
            self.stats.regions_defended,
            self.stats.regions_changed
        );
        out.push(SessionEvent::GameOver { score: self.score });
    }

    /// Advances the session by `dt` seconds.
    pub fn update(&mut self, dt: f32, canvas: &mut dyn Canvas, out: &mut Vec<SessionEvent>) {
        if self.state != SessionState::Running {
            return;
        }

        let dt = dt.max(0.0);
        self.game_time += dt;
        self.spawn_timer += dt;

        if self.game_time >= self.settings.game_duration {
            self.end(out);
            return;
        }

        let resolved = self.current_difficulty();
        let capacity = usize::try_from(resolved.max_areas_on_screen).unwrap_or(usize::MAX);
        if self.spawn_timer >= resolved.spawn_interval && self.regions.len() < capacity {
            if let Some(resolution) = self.canvas_resolution(&*canvas) {
                self.spawn_region(&resolved, resolution, &*canvas, out);
                self.spawn_timer = 0.0;
            }
        }

        for region in &mut self.regions {
            let _ = region.update(dt, canvas, &mut self.region_events);
        }
        self.settle_regions(out);

        self.update_painter(dt, canvas);
    }

    /// Forwards a canvas notification to every active region.
    ///
    /// Player strokes are remembered for spawn avoidance, and any defense they
    /// complete is scored before this call returns.
    pub fn handle_canvas_event(
        &mut self,
        event: &CanvasEvent,
        canvas: &mut dyn Canvas,
        out: &mut Vec<SessionEvent>,
    ) {
        if self.state == SessionState::Ended {
            return;
        }

        if let CanvasEvent::StrokeCompleted {
            position, owner, ..
        } = event
        {
            if owner.is_player() {
                self.last_player_paint = Some(*position);
            }
        }

        for region in &mut self.regions {
            let _ = region.handle_canvas_event(event, canvas, &mut self.region_events);
        }
        self.settle_regions(out);
    }

    fn set_state(&mut self, state: SessionState, out: &mut Vec<SessionEvent>) {
        self.state = state;
        out.push(SessionEvent::StateChanged { state });
    }

    fn canvas_resolution(&mut self, canvas: &dyn Canvas) -> Option<CanvasResolution> {
        let resolution = canvas.resolution();
        if resolution.is_none() && !self.missing_canvas_reported {
            log::warn!("canvas is not ready; region spawns are on hold");
            self.missing_canvas_reported = true;
        }
        resolution
    }

    fn spawn_region(
        &mut self,
        resolved: &ResolvedDifficulty,
        resolution: CanvasResolution,
        canvas: &dyn Canvas,
        out: &mut Vec<SessionEvent>,
    ) {
        let shape = self.pick_shape();
        let size = resolved.area_size;
        let center = self.spawn_position(resolution);
        let id = RegionId::new(self.next_region);
        self.next_region += 1;

        let footprint = AreaFootprint::new(shape, center, size);
        let region = ColorChangeRegion::spawn(
            id,
            footprint,
            resolved.time_to_complete,
            self.settings.region.clone(),
            canvas,
        );
        log::debug!(
            "spawned region {} ({shape:?}, size {size:.0}) at ({:.0}, {:.0}) with {} pixels",
            id.get(),
            center.x,
            center.y,
            region.total_pixels_in_area()
        );

        self.regions.push(region);
        self.stats.regions_spawned += 1;
        out.push(SessionEvent::RegionSpawned {
            region: id,
            center,
            size,
            shape,
        });
    }

    fn pick_shape(&mut self) -> AreaShape {
        self.settings
            .shapes
            .choose(&mut self.rng)
            .copied()
            .unwrap_or(AreaShape::Circle)
    }

    fn spawn_position(&mut self, resolution: CanvasResolution) -> Vec2 {
        let bounds = SpawnBounds::new(resolution, self.settings.spawn_margin);
        let mut candidate = bounds.sample(&mut self.rng);

        let avoid = match self.last_player_paint {
            Some(player) if self.settings.avoid_player_on_spawn => player,
            _ => return candidate,
        };

        let min_distance = self.settings.min_spawn_distance_from_player;
        for attempt in 1..=SPAWN_AVOIDANCE_ATTEMPTS {
            if candidate.distance(avoid) >= min_distance {
                return candidate;
            }
            if attempt < SPAWN_AVOIDANCE_ATTEMPTS {
                candidate = bounds.sample(&mut self.rng);
            }
        }

        let mirrored = resolution.center() * 2.0 - avoid;
        let blended = candidate.lerp(mirrored, self.settings.spawn_avoidance_weight);
        bounds.clamp(blended)
    }

    fn settle_regions(&mut self, out: &mut Vec<SessionEvent>) {
        let mut events = std::mem::take(&mut self.region_events);
        for event in events.drain(..) {
            match event {
                RegionEvent::Defended {
                    region,
                    defended_progress,
                } => self.award_defense(region, defended_progress, out),
                RegionEvent::Changed { region } => self.penalize_change(region, out),
                RegionEvent::ProgressChanged { .. } => {}
            }
        }
        self.region_events = events;

        self.regions.retain(|region| !region.status().is_terminal());
    }

    fn award_defense(
        &mut self,
        region: RegionId,
        defended_progress: f32,
        out: &mut Vec<SessionEvent>,
    ) {
        self.combo += 1;
        let points = defense_points(&self.settings, defended_progress, self.combo);
        self.score = self.score.saturating_add(points);
        self.stats.regions_defended += 1;
        self.stats.best_combo = self.stats.best_combo.max(self.combo);

        log::debug!(
            "region {} defended for {points} points (combo {})",
            region.get(),
            self.combo
        );
        out.push(SessionEvent::RegionDefended {
            region,
            defended_progress,
        });
        out.push(SessionEvent::ComboChanged { combo: self.combo });
        out.push(SessionEvent::ScoreChanged { score: self.score });
    }

    fn penalize_change(&mut self, region: RegionId, out: &mut Vec<SessionEvent>) {
        self.score = self
            .score
            .saturating_sub(self.settings.penalty_per_changed_area);
        self.stats.regions_changed += 1;

        log::debug!("region {} changed; score now {}", region.get(), self.score);
        out.push(SessionEvent::RegionChanged { region });
        if self.combo != 0 {
            self.combo = 0;
            out.push(SessionEvent::ComboChanged { combo: 0 });
        }
        out.push(SessionEvent::ScoreChanged { score: self.score });
    }

    fn update_painter(&mut self, dt: f32, canvas: &mut dyn Canvas) {
        if !self.settings.enemy_enabled {
            return;
        }

        if self.painter.is_none() {
            let Some(resolution) = canvas.resolution() else {
                return;
            };
            let painter = EnemyPainter::new(
                self.settings.painter.clone(),
                self.settings.enemy_level_params(),
                resolution.center(),
                self.painter_seed,
            );
            self.painter = Some(painter);
        }

        if let Some(painter) = self.painter.as_mut() {
            painter.update(dt, canvas);
        }
    }
}

/// Points awarded for a defense at `defended_progress` with the given combo.
///
/// Defenses short of full coverage earn a bonus for every unit of coverage
/// above the threshold.
#[must_use]
pub fn defense_points(settings: &SessionSettings, defended_progress: f32, combo: u32) -> u32 {
    let partial = if defended_progress < 1.0 {
        let surplus = (defended_progress - settings.region.defense_threshold).max(0.0);
        (surplus * settings.partial_defense_score_multiplier).round() as u32
    } else {
        0
    };

    settings
        .score_per_defended_area
        .saturating_add(partial)
        .saturating_add(combo.saturating_mul(settings.combo_bonus_per_defense))
}

/// Rectangle region centers are sampled from.
#[derive(Clone, Copy, Debug)]
struct SpawnBounds {
    min: Vec2,
    max: Vec2,
}

impl SpawnBounds {
    fn new(resolution: CanvasResolution, margin: f32) -> Self {
        let extent = Vec2::new(resolution.width() as f32, resolution.height() as f32);
        let margin = Vec2::splat(margin.max(0.0)).min(extent * 0.5);
        Self {
            min: margin,
            max: extent - margin,
        }
    }

    fn sample(&self, rng: &mut ChaCha8Rng) -> Vec2 {
        Vec2::new(
            sample_axis(rng, self.min.x, self.max.x),
            sample_axis(rng, self.min.y, self.max.y),
        )
    }

    fn clamp(&self, point: Vec2) -> Vec2 {
        point.clamp(self.min, self.max)
    }
}

fn sample_axis(rng: &mut ChaCha8Rng, min: f32, max: f32) -> f32 {
    if max > min {
        rng.gen_range(min..=max)
    } else {
        min
    }
}

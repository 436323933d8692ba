use color_defense_core::AreaShape;
use color_defense_system_difficulty::{
    DifficultyPhase, DifficultyTable, LevelParams, SessionDefaults,
};
use color_defense_system_enemy_painter::PainterConfig;
use color_defense_system_regions::{RegionTuning, DEFAULT_TIME_TO_COMPLETE};
use serde::{Deserialize, Serialize};

/// Configuration injected into a [`crate::ColorDefenseSession`] at construction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Length of the session in seconds.
    pub game_duration: f32,
    /// Seconds between region spawns when no phase overrides it.
    pub spawn_interval: f32,
    /// Maximum concurrent regions when no phase overrides it.
    pub max_areas_on_screen: u32,
    /// Linear size of spawned regions when no phase overrides it.
    pub area_size: f32,
    /// Seconds an undefended region needs to change when no phase overrides it.
    pub time_to_complete: f32,
    /// Minimum distance kept between a region center and the canvas edge.
    pub spawn_margin: f32,
    /// Shapes new regions are drawn from.
    pub shapes: Vec<AreaShape>,
    /// Behaviour shared by every spawned region.
    pub region: RegionTuning,
    /// Points awarded for every defended region.
    pub score_per_defended_area: u32,
    /// Points per unit of coverage above the defense threshold.
    pub partial_defense_score_multiplier: f32,
    /// Points removed when a region fully changes.
    pub penalty_per_changed_area: u32,
    /// Extra points per combo step on every defense.
    pub combo_bonus_per_defense: u32,
    /// Bias new regions away from the last player stroke.
    pub avoid_player_on_spawn: bool,
    /// Distance from the last player stroke a spawn tries to keep.
    pub min_spawn_distance_from_player: f32,
    /// Blend toward the far side of the canvas once resampling gives up.
    pub spawn_avoidance_weight: f32,
    /// Difficulty phases and enemy levels; `None` keeps the session defaults.
    pub difficulty: Option<DifficultyTable>,
    /// Whether an enemy painter roams the canvas.
    pub enemy_enabled: bool,
    /// Difficulty level used to tune the enemy painter.
    pub enemy_level: u32,
    /// Static enemy painter tuning.
    pub painter: PainterConfig,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            game_duration: 120.0,
            spawn_interval: 3.0,
            max_areas_on_screen: 3,
            area_size: 120.0,
            time_to_complete: DEFAULT_TIME_TO_COMPLETE,
            spawn_margin: 80.0,
            shapes: vec![
                AreaShape::Circle,
                AreaShape::Square,
                AreaShape::Rectangle {
                    width_ratio: 1.5,
                    height_ratio: 0.75,
                },
            ],
            region: RegionTuning::default(),
            score_per_defended_area: 100,
            partial_defense_score_multiplier: 100.0,
            penalty_per_changed_area: 50,
            combo_bonus_per_defense: 10,
            avoid_player_on_spawn: true,
            min_spawn_distance_from_player: 150.0,
            spawn_avoidance_weight: 0.5,
            difficulty: Some(default_difficulty()),
            enemy_enabled: true,
            enemy_level: 2,
            painter: PainterConfig::default(),
        }
    }
}

impl SessionSettings {
    /// Returns a copy with malformed values replaced by safe ones.
    ///
    /// Every correction is logged as a warning.
    #[must_use]
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();

        positive_or(&mut self.game_duration, defaults.game_duration, "game_duration");
        positive_or(&mut self.spawn_interval, defaults.spawn_interval, "spawn_interval");
        positive_or(&mut self.area_size, defaults.area_size, "area_size");
        positive_or(
            &mut self.time_to_complete,
            defaults.time_to_complete,
            "time_to_complete",
        );
        if self.max_areas_on_screen == 0 {
            log::warn!("max_areas_on_screen must be at least 1; using 1");
            self.max_areas_on_screen = 1;
        }
        if !(self.spawn_margin >= 0.0) {
            log::warn!("spawn_margin {} is negative; using 0", self.spawn_margin);
            self.spawn_margin = 0.0;
        }

        unit_interval(&mut self.region.defense_threshold, "defense_threshold");
        unit_interval(
            &mut self.region.full_defense_threshold,
            "full_defense_threshold",
        );
        if !(self.region.paint_slowdown_effect >= 0.0) {
            log::warn!(
                "paint_slowdown_effect {} is negative; using 0",
                self.region.paint_slowdown_effect
            );
            self.region.paint_slowdown_effect = 0.0;
        }
        unit_interval(&mut self.spawn_avoidance_weight, "spawn_avoidance_weight");

        if !(self.partial_defense_score_multiplier >= 0.0) {
            log::warn!("partial_defense_score_multiplier is negative; using 0");
            self.partial_defense_score_multiplier = 0.0;
        }
        if self.shapes.is_empty() {
            log::warn!("no region shapes configured; regions will be circles");
        }
        if self.enemy_level == 0 {
            log::warn!("enemy_level starts at 1; using 1");
            self.enemy_level = 1;
        }

        if let Some(table) = self.difficulty.as_mut() {
            for (index, level) in table.levels.iter_mut().enumerate() {
                let label = format!("levels[{index}].miss_rate");
                unit_interval(&mut level.miss_rate, &label);
            }
        }

        self
    }

    /// Values the difficulty table falls back to.
    #[must_use]
    pub fn session_defaults(&self) -> SessionDefaults {
        SessionDefaults {
            spawn_interval: self.spawn_interval,
            max_areas_on_screen: self.max_areas_on_screen,
            area_size: self.area_size,
            time_to_complete: self.time_to_complete,
        }
    }

    /// Enemy painter tuning for the configured level.
    #[must_use]
    pub fn enemy_level_params(&self) -> LevelParams {
        match &self.difficulty {
            Some(table) => table.level(self.enemy_level),
            None => {
                log::warn!("no difficulty table configured; using fallback painter weights");
                LevelParams::default()
            }
        }
    }
}

fn positive_or(value: &mut f32, fallback: f32, name: &str) {
    if !(*value > 0.0) {
        log::warn!("{name} must be positive, got {value}; using {fallback}");
        *value = fallback;
    }
}

fn unit_interval(value: &mut f32, name: &str) {
    let clamped = if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) };
    if clamped != *value {
        log::warn!("{name} {value} is outside 0..=1; using {clamped}");
        *value = clamped;
    }
}

/// Three escalating phases and three enemy levels.
fn default_difficulty() -> DifficultyTable {
    let phase = |start_time: f32, end_time: f32, spawn_interval, max_areas_on_screen, area_size| {
        DifficultyPhase {
            start_time,
            end_time,
            spawn_interval,
            max_areas_on_screen,
            area_size,
            time_to_complete: 0.0,
            ..DifficultyPhase::default()
        }
    };

    DifficultyTable {
        scaling: Default::default(),
        phases: vec![
            phase(0.0, 30.0, 4.0, 2, 140.0),
            phase(30.0, 60.0, 3.0, 3, 120.0),
            phase(60.0, 120.0, 2.0, 4, 100.0),
        ],
        levels: vec![
            LevelParams {
                move_speed_multiplier: 0.8,
                focus_unpainted_weight: 2.0,
                repaint_player_weight: 0.5,
                miss_rate: 0.25,
            },
            LevelParams::default(),
            LevelParams {
                move_speed_multiplier: 1.3,
                focus_unpainted_weight: 2.5,
                repaint_player_weight: 1.5,
                miss_rate: 0.05,
            },
        ],
    }
}

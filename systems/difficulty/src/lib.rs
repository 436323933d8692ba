#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Difficulty scaling for defense sessions.
//!
//! A [`DifficultyTable`] resolves the spawn cadence, concurrent region cap,
//! region size and time budget for the current moment of a session, either by
//! looking up a time-windowed [`DifficultyPhase`] or by evaluating a
//! difficulty curve. It also stores the level-indexed [`LevelParams`] that
//! tune the enemy painter.

use color_defense_core::{CurveKey, ResponseCurve};
use serde::{Deserialize, Serialize};

/// Tunables active during a window of session time.
///
/// Zero for any of the spawn interval, region cap, area size or time budget
/// means "inherit the session default".
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DifficultyPhase {
    /// Session time in seconds at which the phase begins (inclusive).
    pub start_time: f32,
    /// Session time in seconds at which the phase ends (exclusive).
    pub end_time: f32,
    /// Seconds between region spawns.
    pub spawn_interval: f32,
    /// Maximum number of regions active at once.
    pub max_areas_on_screen: u32,
    /// Linear size of spawned regions.
    pub area_size: f32,
    /// Seconds a region takes to fully change when undefended.
    pub time_to_complete: f32,
    /// Presentation hint for how aggressively the enemy color spreads.
    pub color_change_rate: f32,
    /// Presentation hint for how fast enemy color animations play.
    pub color_change_speed: f32,
}

impl DifficultyPhase {
    /// Reports whether `game_time` falls inside the phase window.
    #[must_use]
    pub fn contains(&self, game_time: f32) -> bool {
        game_time >= self.start_time && game_time < self.end_time
    }
}

impl Default for DifficultyPhase {
    fn default() -> Self {
        Self {
            start_time: 0.0,
            end_time: 0.0,
            spawn_interval: 0.0,
            max_areas_on_screen: 0,
            area_size: 0.0,
            time_to_complete: 0.0,
            color_change_rate: 1.0,
            color_change_speed: 1.0,
        }
    }
}

/// Enemy painter tuning for a single difficulty level.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelParams {
    /// Multiplier applied to the painter's base movement speed.
    pub move_speed_multiplier: f32,
    /// Score given to unpainted candidate targets.
    pub focus_unpainted_weight: f32,
    /// Score given to candidate targets owned by a player.
    pub repaint_player_weight: f32,
    /// Probability in 0.0..=1.0 that the painter ignores its best candidate.
    pub miss_rate: f32,
}

impl Default for LevelParams {
    fn default() -> Self {
        Self {
            move_speed_multiplier: 1.0,
            focus_unpainted_weight: 2.0,
            repaint_player_weight: 1.0,
            miss_rate: 0.1,
        }
    }
}

/// Parameters of curve-based difficulty scaling.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CurveScaling {
    /// Curve over normalized session time; outputs 1.0 for "no extra difficulty"
    /// and 2.0 for "full multiplier".
    pub curve: ResponseCurve,
    /// Difficulty multiplier reached when the curve outputs 2.0.
    pub max_multiplier: f32,
    /// Spawn interval at multiplier 1.0.
    pub base_spawn_interval: f32,
    /// Spawn interval approached as the multiplier grows.
    pub min_spawn_interval: f32,
}

impl Default for CurveScaling {
    fn default() -> Self {
        let ramp = ResponseCurve::new(vec![CurveKey::new(0.0, 1.0), CurveKey::new(1.0, 2.0)])
            .unwrap_or_else(|_| ResponseCurve::linear());
        Self {
            curve: ramp,
            max_multiplier: 3.0,
            base_spawn_interval: 4.0,
            min_spawn_interval: 1.0,
        }
    }
}

/// How the table derives tunables from session time.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum DifficultyScaling {
    /// Look up the phase whose window contains the current time.
    #[default]
    TimeBased,
    /// Evaluate a difficulty curve over normalized session time.
    Curve(CurveScaling),
}

/// Values used wherever the table does not override them.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SessionDefaults {
    /// Seconds between region spawns.
    pub spawn_interval: f32,
    /// Maximum number of regions active at once.
    pub max_areas_on_screen: u32,
    /// Linear size of spawned regions.
    pub area_size: f32,
    /// Seconds a region takes to fully change when undefended.
    pub time_to_complete: f32,
}

/// Tunables in effect at a specific moment of the session.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResolvedDifficulty {
    /// Seconds between region spawns.
    pub spawn_interval: f32,
    /// Maximum number of regions active at once.
    pub max_areas_on_screen: u32,
    /// Linear size of spawned regions.
    pub area_size: f32,
    /// Seconds a region takes to fully change when undefended.
    pub time_to_complete: f32,
    /// Presentation hint copied from the active phase.
    pub color_change_rate: f32,
    /// Presentation hint copied from the active phase.
    pub color_change_speed: f32,
    /// Difficulty multiplier; always 1.0 for time-based scaling.
    pub multiplier: f32,
    /// Index of the phase that supplied the values, if any.
    pub phase_index: Option<usize>,
}

impl ResolvedDifficulty {
    fn from_defaults(defaults: SessionDefaults) -> Self {
        Self {
            spawn_interval: defaults.spawn_interval,
            max_areas_on_screen: defaults.max_areas_on_screen,
            area_size: defaults.area_size,
            time_to_complete: defaults.time_to_complete,
            color_change_rate: 1.0,
            color_change_speed: 1.0,
            multiplier: 1.0,
            phase_index: None,
        }
    }
}

/// Read-only difficulty configuration for a session.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DifficultyTable {
    /// Scaling mode used to resolve tunables.
    pub scaling: DifficultyScaling,
    /// Phases ordered by start time.
    pub phases: Vec<DifficultyPhase>,
    /// Enemy painter tuning indexed from level 1.
    pub levels: Vec<LevelParams>,
}

impl DifficultyTable {
    /// Finds the phase containing `game_time`, falling back to the last phase
    /// once the session outlives every window.
    #[must_use]
    pub fn phase_at(&self, game_time: f32) -> Option<(usize, &DifficultyPhase)> {
        self.phases
            .iter()
            .enumerate()
            .find(|(_, phase)| phase.contains(game_time))
            .or_else(|| self.phases.iter().enumerate().last())
    }

    /// Resolves the tunables in effect at `game_time`.
    #[must_use]
    pub fn resolve(
        &self,
        game_time: f32,
        game_duration: f32,
        defaults: SessionDefaults,
    ) -> ResolvedDifficulty {
        match &self.scaling {
            DifficultyScaling::TimeBased => self.resolve_phase(game_time, defaults),
            DifficultyScaling::Curve(scaling) => {
                resolve_curve(scaling, game_time, game_duration, defaults)
            }
        }
    }

    /// Enemy painter tuning for `level`, clamped to the table bounds.
    #[must_use]
    pub fn level(&self, level: u32) -> LevelParams {
        if self.levels.is_empty() {
            log::warn!("difficulty table has no levels; using fallback painter weights");
            return LevelParams::default();
        }

        let index = usize::try_from(level.max(1) - 1)
            .unwrap_or(usize::MAX)
            .min(self.levels.len() - 1);
        self.levels[index]
    }

    fn resolve_phase(&self, game_time: f32, defaults: SessionDefaults) -> ResolvedDifficulty {
        let Some((index, phase)) = self.phase_at(game_time) else {
            return ResolvedDifficulty::from_defaults(defaults);
        };

        ResolvedDifficulty {
            spawn_interval: inherit(phase.spawn_interval, defaults.spawn_interval),
            max_areas_on_screen: if phase.max_areas_on_screen == 0 {
                defaults.max_areas_on_screen
            } else {
                phase.max_areas_on_screen
            },
            area_size: inherit(phase.area_size, defaults.area_size),
            time_to_complete: inherit(phase.time_to_complete, defaults.time_to_complete),
            color_change_rate: phase.color_change_rate,
            color_change_speed: phase.color_change_speed,
            multiplier: 1.0,
            phase_index: Some(index),
        }
    }
}

/// Resolves tunables for an optional table, using session defaults when the
/// table is missing.
#[must_use]
pub fn resolve(
    table: Option<&DifficultyTable>,
    game_time: f32,
    game_duration: f32,
    defaults: SessionDefaults,
) -> ResolvedDifficulty {
    table.map_or_else(
        || ResolvedDifficulty::from_defaults(defaults),
        |table| table.resolve(game_time, game_duration, defaults),
    )
}

/// Multiplier produced by curve-based scaling at `game_time`.
///
/// Never drops below 1.0 so the spawn interval cannot exceed its base value.
#[must_use]
pub fn difficulty_multiplier(scaling: &CurveScaling, game_time: f32, game_duration: f32) -> f32 {
    let normalized = if game_duration > 0.0 {
        (game_time / game_duration).clamp(0.0, 1.0)
    } else {
        1.0
    };
    let shaped = scaling.curve.evaluate(normalized);
    let multiplier = 1.0 + (shaped - 1.0) * (scaling.max_multiplier - 1.0);
    multiplier.max(1.0)
}

fn resolve_curve(
    scaling: &CurveScaling,
    game_time: f32,
    game_duration: f32,
    defaults: SessionDefaults,
) -> ResolvedDifficulty {
    let multiplier = difficulty_multiplier(scaling, game_time, game_duration);
    let blend = (1.0 - 1.0 / multiplier).clamp(0.0, 1.0);
    let spawn_interval = lerp(
        scaling.base_spawn_interval,
        scaling.min_spawn_interval,
        blend,
    );

    ResolvedDifficulty {
        spawn_interval,
        multiplier,
        ..ResolvedDifficulty::from_defaults(defaults)
    }
}

fn inherit(value: f32, default: f32) -> f32 {
    if value > 0.0 {
        value
    } else {
        default
    }
}

fn lerp(from: f32, to: f32, t: f32) -> f32 {
    from + (to - from) * t
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEFAULTS: SessionDefaults = SessionDefaults {
        spawn_interval: 3.0,
        max_areas_on_screen: 2,
        area_size: 120.0,
        time_to_complete: 15.0,
    };

    fn phased_table() -> DifficultyTable {
        DifficultyTable {
            scaling: DifficultyScaling::TimeBased,
            phases: vec![
                DifficultyPhase {
                    start_time: 0.0,
                    end_time: 30.0,
                    spawn_interval: 5.0,
                    max_areas_on_screen: 1,
                    ..DifficultyPhase::default()
                },
                DifficultyPhase {
                    start_time: 30.0,
                    end_time: 60.0,
                    spawn_interval: 2.0,
                    max_areas_on_screen: 4,
                    area_size: 80.0,
                    time_to_complete: 8.0,
                    color_change_rate: 1.5,
                    color_change_speed: 2.0,
                },
            ],
            levels: Vec::new(),
        }
    }

    #[test]
    fn picks_phase_containing_time() {
        let resolved = phased_table().resolve(12.0, 90.0, DEFAULTS);
        assert_eq!(resolved.phase_index, Some(0));
        assert_eq!(resolved.spawn_interval, 5.0);
        assert_eq!(resolved.max_areas_on_screen, 1);
    }

    #[test]
    fn zero_phase_values_inherit_session_defaults() {
        let resolved = phased_table().resolve(12.0, 90.0, DEFAULTS);
        assert_eq!(resolved.area_size, DEFAULTS.area_size);
        assert_eq!(resolved.time_to_complete, DEFAULTS.time_to_complete);
    }

    #[test]
    fn phase_end_is_exclusive() {
        let resolved = phased_table().resolve(30.0, 90.0, DEFAULTS);
        assert_eq!(resolved.phase_index, Some(1));
        assert_eq!(resolved.area_size, 80.0);
        assert_eq!(resolved.time_to_complete, 8.0);
    }

    #[test]
    fn time_beyond_last_phase_uses_last_phase() {
        let resolved = phased_table().resolve(75.0, 90.0, DEFAULTS);
        assert_eq!(resolved.phase_index, Some(1));
        assert_eq!(resolved.max_areas_on_screen, 4);
        assert_eq!(resolved.color_change_speed, 2.0);
    }

    #[test]
    fn empty_table_and_missing_table_use_defaults() {
        let empty = DifficultyTable::default();
        assert_eq!(
            empty.resolve(5.0, 60.0, DEFAULTS),
            ResolvedDifficulty::from_defaults(DEFAULTS)
        );
        assert_eq!(
            resolve(None, 5.0, 60.0, DEFAULTS),
            ResolvedDifficulty::from_defaults(DEFAULTS)
        );
    }

    #[test]
    fn curve_scaling_shortens_spawn_interval() {
        let table = DifficultyTable {
            scaling: DifficultyScaling::Curve(CurveScaling::default()),
            ..DifficultyTable::default()
        };

        let start = table.resolve(0.0, 100.0, DEFAULTS);
        assert!((start.multiplier - 1.0).abs() < 1e-6);
        assert!((start.spawn_interval - 4.0).abs() < 1e-6);

        // curve(0.5) = 1.5 -> multiplier 2.0 -> blend 0.5
        let midway = table.resolve(50.0, 100.0, DEFAULTS);
        assert!((midway.multiplier - 2.0).abs() < 1e-6);
        assert!((midway.spawn_interval - 2.5).abs() < 1e-6);

        let end = table.resolve(100.0, 100.0, DEFAULTS);
        assert!((end.multiplier - 3.0).abs() < 1e-6);
        assert!((end.spawn_interval - 2.0).abs() < 1e-6);
        assert_eq!(end.area_size, DEFAULTS.area_size);
        assert_eq!(end.time_to_complete, DEFAULTS.time_to_complete);
    }

    #[test]
    fn level_lookup_clamps_to_table_bounds() {
        let table = DifficultyTable {
            levels: vec![
                LevelParams {
                    miss_rate: 0.4,
                    ..LevelParams::default()
                },
                LevelParams {
                    miss_rate: 0.2,
                    ..LevelParams::default()
                },
                LevelParams {
                    miss_rate: 0.0,
                    ..LevelParams::default()
                },
            ],
            ..DifficultyTable::default()
        };

        assert_eq!(table.level(0).miss_rate, 0.4);
        assert_eq!(table.level(2).miss_rate, 0.2);
        assert_eq!(table.level(99).miss_rate, 0.0);
    }

    #[test]
    fn empty_level_table_falls_back() {
        assert_eq!(DifficultyTable::default().level(3), LevelParams::default());
    }
}

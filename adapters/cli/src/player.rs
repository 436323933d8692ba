//! Scripted stand-in for a human painter.

use color_defense_canvas::PixelCanvas;
use color_defense_core::{OwnerId, PaintColor, Vec2};
use color_defense_system_session::ColorDefenseSession;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

const STROKE_RADIUS: f32 = 14.0;
const FASTEST_STROKE_INTERVAL: f32 = 0.05;

/// Player that keeps stroking whichever region is closest to being lost.
#[derive(Debug)]
pub(crate) struct ScriptedPlayer {
    owner: OwnerId,
    color: PaintColor,
    stroke_interval: Option<f32>,
    aim_error: f32,
    cooldown: f32,
    strokes: u32,
    rng: ChaCha8Rng,
}

impl ScriptedPlayer {
    /// Creates a player whose cadence and aim scale with `skill` in 0.0..=1.0.
    pub(crate) fn new(skill: f32, seed: u64) -> Self {
        let skill = skill.clamp(0.0, 1.0);
        let stroke_interval = (skill > 0.0).then(|| FASTEST_STROKE_INTERVAL / skill);

        Self {
            owner: OwnerId::new(1),
            color: PaintColor::from_rgb_u8(0x1e, 0x88, 0xe5),
            stroke_interval,
            aim_error: 1.0 - skill,
            cooldown: 0.0,
            strokes: 0,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Owner id the player paints with.
    pub(crate) const fn owner(&self) -> OwnerId {
        self.owner
    }

    /// Strokes painted so far.
    pub(crate) const fn strokes(&self) -> u32 {
        self.strokes
    }

    /// Paints at most one stroke once the cooldown has elapsed.
    pub(crate) fn tick(
        &mut self,
        dt: f32,
        session: &ColorDefenseSession,
        canvas: &mut PixelCanvas,
    ) {
        let Some(interval) = self.stroke_interval else {
            return;
        };

        self.cooldown -= dt;
        if self.cooldown > 0.0 {
            return;
        }
        self.cooldown += interval;

        let target = session
            .regions()
            .iter()
            .max_by(|a, b| a.change_progress().total_cmp(&b.change_progress()));
        let Some(region) = target else {
            return;
        };

        let reach = region.size() * 0.5 * (0.35 + self.aim_error);
        let offset = Vec2::new(
            self.rng.gen_range(-1.0..=1.0),
            self.rng.gen_range(-1.0..=1.0),
        ) * reach;

        if canvas.player_stroke(
            region.center() + offset,
            STROKE_RADIUS,
            self.owner,
            self.color,
            1.0,
        ) {
            self.strokes += 1;
        }
    }
}

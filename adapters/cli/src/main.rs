#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs a headless Color Defense session.
//!
//! The binary loads [`SessionSettings`] from TOML, plays a whole session
//! against the enemy painter with a scripted player and prints a summary.

mod player;

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use clap::Parser;
use color_defense_canvas::PixelCanvas;
use color_defense_core::{OwnerId, SessionEvent};
use color_defense_system_session::{ColorDefenseSession, SessionSettings};

use crate::player::ScriptedPlayer;

/// Command-line arguments accepted by the `color-defense` binary.
#[derive(Debug, Parser)]
#[command(name = "color-defense", about = "Runs a headless color defense session")]
struct CliArgs {
    /// TOML file with session settings; built-in defaults otherwise.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Seed for every random choice made by the session and the player.
    #[arg(long, default_value_t = 0x00c0_10de)]
    seed: u64,
    /// Overrides the configured session length in seconds.
    #[arg(long)]
    duration: Option<f32>,
    /// Simulation step in seconds.
    #[arg(long, default_value_t = 1.0 / 30.0)]
    dt: f32,
    /// Canvas width in pixels.
    #[arg(long, default_value_t = 960)]
    width: u32,
    /// Canvas height in pixels.
    #[arg(long, default_value_t = 540)]
    height: u32,
    /// Scripted player skill between 0.0 (idle) and 1.0 (fast and accurate).
    #[arg(long, default_value_t = 0.6)]
    player_skill: f32,
    /// Prints the default settings as TOML and exits.
    #[arg(long)]
    print_default_config: bool,
}

/// Totals reported once the session ends.
#[derive(Debug)]
struct Summary {
    score: u32,
    best_combo: u32,
    spawned: u32,
    defended: u32,
    changed: u32,
    strokes: u32,
    ticks: u64,
    player_share: f64,
    enemy_share: f64,
}

/// Entry point for the Color Defense command-line interface.
fn main() -> Result<()> {
    let _ = env_logger::Builder::from_default_env().try_init();
    let args = CliArgs::parse();

    if args.print_default_config {
        let rendered = toml::to_string_pretty(&SessionSettings::default())
            .context("failed to render default settings as toml")?;
        print!("{rendered}");
        return Ok(());
    }

    validate(&args)?;

    let mut settings = match &args.config {
        Some(path) => load_settings(path)?,
        None => SessionSettings::default(),
    };
    if let Some(duration) = args.duration {
        settings.game_duration = duration;
    }

    let summary = run(settings, &args);
    print_summary(&summary);
    Ok(())
}

fn validate(args: &CliArgs) -> Result<()> {
    if !(args.dt.is_finite() && args.dt > 0.0) {
        bail!("--dt must be a positive number of seconds, got {}", args.dt);
    }
    if args.width == 0 || args.height == 0 {
        bail!(
            "canvas size must be non-zero, got {}x{}",
            args.width,
            args.height
        );
    }
    if !(0.0..=1.0).contains(&args.player_skill) {
        bail!(
            "--player-skill must be within 0.0..=1.0, got {}",
            args.player_skill
        );
    }
    Ok(())
}

fn load_settings(path: &Path) -> Result<SessionSettings> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read settings at {}", path.display()))?;
    parse_settings(&contents)
        .with_context(|| format!("invalid settings in {}", path.display()))
}

fn parse_settings(contents: &str) -> Result<SessionSettings> {
    toml::from_str(contents).context("failed to parse settings toml contents")
}

fn run(settings: SessionSettings, args: &CliArgs) -> Summary {
    let mut session = ColorDefenseSession::new(settings, args.seed);
    let mut canvas = PixelCanvas::new(args.width, args.height);
    let mut player = ScriptedPlayer::new(args.player_skill, args.seed.rotate_left(17));

    let mut events = Vec::new();
    let mut canvas_events = Vec::new();
    let mut ticks = 0_u64;

    while !session.is_game_over() {
        session.update(args.dt, &mut canvas, &mut events);
        player.tick(args.dt, &session, &mut canvas);

        canvas.drain_events(&mut canvas_events);
        for event in canvas_events.drain(..) {
            session.handle_canvas_event(&event, &mut canvas, &mut events);
        }

        for event in events.drain(..) {
            report(&event);
        }
        ticks += 1;
    }

    let stats = session.stats();
    let pixels = f64::from(args.width) * f64::from(args.height);
    Summary {
        score: session.score(),
        best_combo: stats.best_combo,
        spawned: stats.regions_spawned,
        defended: stats.regions_defended,
        changed: stats.regions_changed,
        strokes: player.strokes(),
        ticks,
        player_share: canvas.count_owned(player.owner()) as f64 / pixels,
        enemy_share: canvas.count_owned(OwnerId::ENEMY) as f64 / pixels,
    }
}

fn report(event: &SessionEvent) {
    match event {
        SessionEvent::RegionSpawned {
            region,
            center,
            shape,
            ..
        } => log::info!(
            "region {} spawned as {shape:?} at ({:.0}, {:.0})",
            region.get(),
            center.x,
            center.y
        ),
        SessionEvent::RegionDefended {
            region,
            defended_progress,
        } => log::info!(
            "region {} defended with {:.0}% coverage",
            region.get(),
            defended_progress * 100.0
        ),
        SessionEvent::RegionChanged { region } => {
            log::info!("region {} lost to the enemy", region.get());
        }
        SessionEvent::GameOver { score } => log::info!("game over with score {score}"),
        SessionEvent::ScoreChanged { .. }
        | SessionEvent::ComboChanged { .. }
        | SessionEvent::StateChanged { .. } => log::trace!("{event:?}"),
    }
}

fn print_summary(summary: &Summary) {
    println!("score:            {}", summary.score);
    println!("best combo:       {}", summary.best_combo);
    println!(
        "regions:          {} spawned, {} defended, {} changed",
        summary.spawned, summary.defended, summary.changed
    );
    println!("player strokes:   {}", summary.strokes);
    println!("ticks:            {}", summary.ticks);
    println!(
        "canvas coverage:  {:.1}% player, {:.1}% enemy",
        summary.player_share * 100.0,
        summary.enemy_share * 100.0
    );
}

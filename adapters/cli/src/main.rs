#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that plays Beast levels headlessly.

mod level_transfer;
mod text_backend;

use std::{fs, path::PathBuf, time::Duration};

use anyhow::{bail, Context, Result};
use beast_core::{Direction, Event, GameState, LevelDescription};
use beast_rendering::{FrameControl, FrameInput, Palette, Presentation, RenderingBackend, Scene};
use beast_simulation::{Simulation, SimulationConfig};
use beast_system_beast_ai as beast_ai;
use beast_system_hatching as hatching;
use beast_world::Rules;
use clap::Parser;
use log::{debug, info};

use crate::text_backend::TextBackend;

const TILE_LENGTH: f32 = 32.0;

const DEMO_LEVEL: &str = "\
####################
#P.....B.....H.....#
#..BBB.....B...B...#
#..B.....####...E..#
#..B..H..#..B......#
#.....BB.#..B..S...#
#..E.....#.........#
#....B........BB...#
#..........H.......#
####################
";

/// Plays a Beast level from the command line.
#[derive(Parser, Debug)]
#[command(name = "beast", version, about = "Push blocks, crush beasts.", long_about = None)]
struct Args {
    /// JSON level document to play.
    #[arg(long, value_name = "PATH", conflicts_with_all = ["ascii", "share"])]
    level: Option<PathBuf>,

    /// ASCII map to play.
    #[arg(long, value_name = "PATH", conflicts_with = "share")]
    ascii: Option<PathBuf>,

    /// Level share string (`beast:v1:<W>x<H>:<payload>`).
    #[arg(long, value_name = "STRING")]
    share: Option<String>,

    /// Print the share string for the selected level and exit.
    #[arg(long)]
    export: bool,

    /// Scripted input, one token per frame: n, ne, e, se, s, sw, w, nw,
    /// `wait`, `respawn` or `restart`.
    #[arg(long, value_name = "TOKENS", default_value = "")]
    moves: String,

    /// Number of frames to simulate.
    #[arg(long, default_value_t = 600)]
    frames: usize,

    /// Wall-clock milliseconds per frame.
    #[arg(long, default_value_t = 50)]
    frame_ms: u64,

    /// Speed multiplier overriding the level's own setting.
    #[arg(long)]
    speed: Option<f32>,

    /// Seed for the beast movement generator.
    #[arg(long)]
    seed: Option<u64>,

    /// Lives at the start of the level.
    #[arg(long, default_value_t = 3)]
    lives: u32,

    /// Milliseconds to wait before respawning automatically after a death.
    #[arg(long, default_value_t = 1_000)]
    respawn_ms: u64,

    /// Print every frame instead of only the last one.
    #[arg(long)]
    show_frames: bool,
}

/// Entry point for the Beast command-line interface.
fn main() -> Result<()> {
    let args = Args::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let level = load_level(&args)?;
    if args.export {
        println!("{}", level_transfer::encode(&level)?);
        return Ok(());
    }

    let script = parse_script(&args.moves)?;
    let mut simulation =
        Simulation::new(level, simulation_config(&args)).context("failed to load level")?;
    info!(
        "playing '{}' at one tick per {:?}",
        simulation.level().name,
        simulation.tick_interval()
    );

    let palette = Palette::default();
    let scene = Scene::from_snapshot(&simulation.snapshot(), &palette, TILE_LENGTH)?;
    let presentation = Presentation::new(
        format!("Beast - {}", simulation.level().name),
        palette.empty,
        scene,
    );
    let backend = TextBackend::new(
        std::io::stdout().lock(),
        args.frames,
        Duration::from_millis(args.frame_ms),
        script,
        args.show_frames,
    );

    backend.run(presentation, |dt, input, scene| {
        if input.restart {
            simulation.reset().context("failed to restart level")?;
        }
        if input.respawn {
            log_events(&simulation.trigger_respawn());
        }
        if let Some(direction) = input.direction {
            simulation.enqueue_move(direction);
        }
        log_events(&simulation.advance(dt));
        scene.update(&simulation.snapshot(), &palette)?;

        Ok(if simulation.game_state().is_terminal() {
            FrameControl::Exit
        } else {
            FrameControl::Continue
        })
    })?;

    print_summary(&simulation);
    Ok(())
}

fn load_level(args: &Args) -> Result<LevelDescription> {
    if let Some(path) = &args.level {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        return LevelDescription::from_json(&text)
            .with_context(|| format!("invalid level document {}", path.display()));
    }
    if let Some(path) = &args.ascii {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        return LevelDescription::from_ascii(&name, &text)
            .with_context(|| format!("invalid ASCII map {}", path.display()));
    }
    if let Some(share) = &args.share {
        return level_transfer::decode(share).context("invalid share string");
    }
    LevelDescription::from_ascii("Demo", DEMO_LEVEL).context("built-in level is invalid")
}

fn simulation_config(args: &Args) -> SimulationConfig {
    let mut beast_ai = beast_ai::Config::default();
    if let Some(seed) = args.seed {
        beast_ai = beast_ai.with_rng_seed(seed);
    }
    let rules = Rules::new(args.lives, Rules::default().player_move_cooldown());
    let mut config = SimulationConfig::new(rules, beast_ai, hatching::Config::default())
        .with_auto_respawn(Duration::from_millis(args.respawn_ms));
    if let Some(speed) = args.speed {
        config = config.with_speed(speed);
    }
    config
}

fn parse_script(moves: &str) -> Result<Vec<FrameInput>> {
    moves
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|token| !token.is_empty())
        .map(|token| {
            let input = match token.to_ascii_lowercase().as_str() {
                "wait" | "." => FrameInput::default(),
                "respawn" => FrameInput {
                    respawn: true,
                    ..FrameInput::default()
                },
                "restart" => FrameInput {
                    restart: true,
                    ..FrameInput::default()
                },
                other => match Direction::parse(other) {
                    Some(direction) => FrameInput {
                        direction: Some(direction),
                        ..FrameInput::default()
                    },
                    None => bail!("unknown move '{token}'"),
                },
            };
            Ok(input)
        })
        .collect()
}

fn log_events(events: &[Event]) {
    for event in events {
        debug!("{event:?}");
    }
}

fn print_summary(simulation: &Simulation) {
    let summary = simulation.summary();
    match simulation.game_state() {
        GameState::LevelComplete => {
            println!(
                "Level complete in {}: {} beasts, score {}, time bonus {}, total {}",
                summary.formatted_elapsed(),
                summary.beasts_defeated,
                summary.score,
                summary.time_bonus,
                summary.total()
            );
        }
        GameState::GameOver => {
            println!(
                "Game over after {}: score {}",
                summary.formatted_elapsed(),
                summary.score
            );
        }
        GameState::Playing | GameState::PausedAfterDeath => {
            println!(
                "Stopped after {}: score {}, {} beasts left, {} lives",
                summary.formatted_elapsed(),
                summary.score,
                simulation.remaining_beasts(),
                simulation.lives()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_tokens_map_to_frame_inputs() {
        let script = parse_script("e, NE wait\trespawn,restart").expect("valid script");
        assert_eq!(script.len(), 5);
        assert_eq!(script[0].direction, Some(Direction::East));
        assert_eq!(script[1].direction, Some(Direction::NorthEast));
        assert_eq!(script[2], FrameInput::default());
        assert!(script[3].respawn);
        assert!(script[4].restart);
    }

    #[test]
    fn unknown_tokens_are_rejected() {
        let error = parse_script("e,jump").expect_err("jump is not a move");
        assert_eq!(error.to_string(), "unknown move 'jump'");
    }

    #[test]
    fn demo_level_is_playable() {
        let level = LevelDescription::from_ascii("Demo", DEMO_LEVEL).expect("demo parses");
        assert_eq!(level.width, 20);
        assert_eq!(level.beasts, 3);
        assert_eq!(level.super_beasts, 1);
        assert_eq!(level.eggs, 2);
    }

    #[test]
    fn arguments_map_onto_the_simulation_config() {
        let args = Args::parse_from(["beast", "--lives", "5", "--speed", "2", "--seed", "7"]);
        let config = simulation_config(&args);
        assert_eq!(config.rules().lives(), 5);
        assert_eq!(config.beast_ai().rng_seed(), 7);
        assert_eq!(config.auto_respawn(), Some(Duration::from_secs(1)));
    }
}

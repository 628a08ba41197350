#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Tick orchestration for a single Beast level.
//!
//! [`Simulation`] owns the world together with the pure systems and runs them
//! in a fixed order every tick: the clock advances, one queued player move is
//! applied, ripe eggs hatch, beasts step in ascending id order, and finally
//! the world resolves the win and loss conditions. Hosts feed wall-clock time
//! through [`Simulation::advance`] and drain the returned events.

use std::{collections::VecDeque, time::Duration};

use beast_core::{
    level::{MAX_GAME_SPEED, MIN_GAME_SPEED},
    Command, Direction, Event, GameState, LevelDescription, LevelError, LevelSummary,
    WorldSnapshot,
};
use beast_system_beast_ai::{self as beast_ai, BeastAi};
use beast_system_hatching::{self as hatching, Hatching};
use beast_world::{self as world, query, Rules, World};
use log::{debug, info, warn};

/// Tick interval at a speed multiplier of `1.0`.
pub const BASE_TICK_INTERVAL: Duration = Duration::from_millis(100);

/// Shortest tick interval regardless of the speed multiplier.
pub const MIN_TICK_INTERVAL: Duration = Duration::from_millis(20);

/// Upper bound on ticks run by a single [`Simulation::advance`] call.
pub const MAX_TICKS_PER_ADVANCE: u32 = 8;

/// Default capacity of the pending input queue.
pub const DEFAULT_INPUT_QUEUE_LEN: usize = 4;

/// Tick interval for the given speed multiplier.
///
/// The multiplier is clamped to `[0.1, 5.0]` and the result never drops
/// below [`MIN_TICK_INTERVAL`].
#[must_use]
pub fn tick_interval_for(speed: f32) -> Duration {
    scale_interval(BASE_TICK_INTERVAL, speed).max(MIN_TICK_INTERVAL)
}

fn scale_interval(base: Duration, speed: f32) -> Duration {
    let speed = if speed.is_finite() {
        speed.clamp(MIN_GAME_SPEED, MAX_GAME_SPEED)
    } else {
        1.0
    };
    let nanos = (base.as_nanos() as f64 / f64::from(speed)).round();
    Duration::from_nanos(nanos as u64)
}

/// Configuration for a simulation, composed from the world and system configs.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimulationConfig {
    rules: Rules,
    beast_ai: beast_ai::Config,
    hatching: hatching::Config,
    speed_override: Option<f32>,
    input_queue_len: usize,
    auto_respawn: Option<Duration>,
}

impl SimulationConfig {
    /// Creates a configuration from the individual component configs.
    #[must_use]
    pub const fn new(rules: Rules, beast_ai: beast_ai::Config, hatching: hatching::Config) -> Self {
        Self {
            rules,
            beast_ai,
            hatching,
            speed_override: None,
            input_queue_len: DEFAULT_INPUT_QUEUE_LEN,
            auto_respawn: None,
        }
    }

    /// Replaces the level's own speed multiplier.
    #[must_use]
    pub const fn with_speed(mut self, speed: f32) -> Self {
        self.speed_override = Some(speed);
        self
    }

    /// Changes how many directional inputs may wait for the next tick.
    #[must_use]
    pub const fn with_input_queue_len(mut self, input_queue_len: usize) -> Self {
        self.input_queue_len = input_queue_len;
        self
    }

    /// Respawns the player automatically once it has been dead for `delay`.
    #[must_use]
    pub const fn with_auto_respawn(mut self, delay: Duration) -> Self {
        self.auto_respawn = Some(delay);
        self
    }

    /// Rules handed to the world.
    #[must_use]
    pub const fn rules(&self) -> Rules {
        self.rules
    }

    /// Beast AI settings at a speed multiplier of `1.0`.
    #[must_use]
    pub const fn beast_ai(&self) -> beast_ai::Config {
        self.beast_ai
    }

    /// Hatching settings.
    #[must_use]
    pub const fn hatching(&self) -> hatching::Config {
        self.hatching
    }

    /// Capacity of the pending input queue.
    #[must_use]
    pub const fn input_queue_len(&self) -> usize {
        self.input_queue_len
    }

    /// Delay before an automatic respawn, if enabled.
    #[must_use]
    pub const fn auto_respawn(&self) -> Option<Duration> {
        self.auto_respawn
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self::new(
            Rules::default(),
            beast_ai::Config::default(),
            hatching::Config::default(),
        )
    }
}

/// Runs one level: owns the world, its systems and the pending player input.
#[derive(Debug)]
pub struct Simulation {
    level: LevelDescription,
    config: SimulationConfig,
    world: World,
    beast_ai: BeastAi,
    hatching: Hatching,
    input: VecDeque<Direction>,
    tick_interval: Duration,
    accumulator: Duration,
    paused_for: Duration,
}

impl Simulation {
    /// Builds a simulation for the provided level.
    pub fn new(level: LevelDescription, config: SimulationConfig) -> Result<Self, LevelError> {
        let world = World::new(&level, config.rules())?;
        let speed = config.speed_override.unwrap_or_else(|| level.speed());
        let (beast_ai, hatching) = build_systems(&config, speed);
        let tick_interval = tick_interval_for(speed);
        debug!("tick interval {:?} at speed {}", tick_interval, speed);
        Ok(Self {
            level,
            config,
            world,
            beast_ai,
            hatching,
            input: VecDeque::with_capacity(config.input_queue_len()),
            tick_interval,
            accumulator: Duration::ZERO,
            paused_for: Duration::ZERO,
        })
    }

    /// Queues a directional intent for a later tick.
    ///
    /// When the queue is full the oldest intent is dropped.
    pub fn enqueue_move(&mut self, direction: Direction) {
        if self.config.input_queue_len() == 0 {
            return;
        }
        while self.input.len() >= self.config.input_queue_len() {
            if let Some(dropped) = self.input.pop_front() {
                warn!("input queue full, dropping {:?}", dropped);
            }
        }
        self.input.push_back(direction);
    }

    /// Number of intents waiting for a tick.
    #[must_use]
    pub fn queued_moves(&self) -> usize {
        self.input.len()
    }

    /// Brings the player back after a death. Ignored in any other state.
    pub fn trigger_respawn(&mut self) -> Vec<Event> {
        let mut events = Vec::new();
        world::apply(&mut self.world, Command::Respawn, &mut events);
        if !events.is_empty() {
            self.input.clear();
            self.accumulator = Duration::ZERO;
            self.paused_for = Duration::ZERO;
        }
        events
    }

    /// Runs exactly one tick. Returns no events unless the game is playing.
    pub fn tick(&mut self) -> Vec<Event> {
        let mut events = Vec::new();
        if query::game_state(&self.world) != GameState::Playing {
            return events;
        }

        world::apply(
            &mut self.world,
            Command::Tick {
                dt: self.tick_interval,
            },
            &mut events,
        );

        if query::player_ready(&self.world) {
            if let Some(direction) = self.input.pop_front() {
                world::apply(
                    &mut self.world,
                    Command::MovePlayer { direction },
                    &mut events,
                );
            }
        }

        let mut commands = Vec::new();
        self.hatching
            .handle(&events, &query::egg_view(&self.world), &mut commands);
        self.apply_commands(&mut commands, &mut events);

        self.beast_ai.handle(
            &events,
            &query::beast_view(&self.world),
            &query::terrain_view(&self.world),
            query::player_cell(&self.world),
            &mut commands,
        );
        self.apply_commands(&mut commands, &mut events);

        world::apply(&mut self.world, Command::ResolveTick, &mut events);
        events
    }

    /// Feeds host time into the simulation and runs every tick that became due.
    ///
    /// At most [`MAX_TICKS_PER_ADVANCE`] ticks run per call. Surplus backlog is
    /// discarded.
    pub fn advance(&mut self, elapsed: Duration) -> Vec<Event> {
        let mut events = Vec::new();

        if query::game_state(&self.world) == GameState::PausedAfterDeath {
            self.paused_for = self.paused_for.saturating_add(elapsed);
            if let Some(delay) = self.config.auto_respawn() {
                if self.paused_for >= delay {
                    events.extend(self.trigger_respawn());
                }
            }
            return events;
        }

        self.accumulator = self.accumulator.saturating_add(elapsed);
        let mut ticks = 0;
        while self.accumulator >= self.tick_interval && ticks < MAX_TICKS_PER_ADVANCE {
            self.accumulator -= self.tick_interval;
            events.extend(self.tick());
            ticks += 1;
            if query::game_state(&self.world) != GameState::Playing {
                self.accumulator = Duration::ZERO;
                break;
            }
        }
        if self.accumulator >= self.tick_interval {
            debug!("dropping {:?} of tick backlog", self.accumulator);
            self.accumulator = Duration::ZERO;
        }
        events
    }

    /// Restarts the level from its description with fresh systems.
    pub fn reset(&mut self) -> Result<(), LevelError> {
        self.world = World::new(&self.level, self.config.rules())?;
        let speed = self
            .config
            .speed_override
            .unwrap_or_else(|| self.level.speed());
        let (beast_ai, hatching) = build_systems(&self.config, speed);
        self.beast_ai = beast_ai;
        self.hatching = hatching;
        self.input.clear();
        self.accumulator = Duration::ZERO;
        self.paused_for = Duration::ZERO;
        info!("level {:?} reset", self.level.name);
        Ok(())
    }

    /// Lives left.
    #[must_use]
    pub fn lives(&self) -> u32 {
        query::lives(&self.world)
    }

    /// Coarse game state.
    #[must_use]
    pub fn game_state(&self) -> GameState {
        query::game_state(&self.world)
    }

    /// Reports whether every beast has been defeated.
    #[must_use]
    pub fn is_level_completed(&self) -> bool {
        self.game_state() == GameState::LevelComplete
    }

    /// Cumulative score.
    #[must_use]
    pub fn score(&self) -> u64 {
        query::score(&self.world)
    }

    /// Beasts left to defeat.
    #[must_use]
    pub fn remaining_beasts(&self) -> u32 {
        query::remaining_beasts(&self.world)
    }

    /// Simulated duration of one tick.
    #[must_use]
    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    /// Level description the simulation was built from.
    #[must_use]
    pub fn level(&self) -> &LevelDescription {
        &self.level
    }

    /// Read-only access to the authoritative world.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Captures everything a renderer needs to draw one frame.
    #[must_use]
    pub fn snapshot(&self) -> WorldSnapshot {
        query::snapshot(&self.world)
    }

    /// End-of-level figures including the time bonus.
    #[must_use]
    pub fn summary(&self) -> LevelSummary {
        query::summary(&self.world)
    }

    fn apply_commands(&mut self, commands: &mut Vec<Command>, events: &mut Vec<Event>) {
        for command in commands.drain(..) {
            world::apply(&mut self.world, command, events);
        }
    }
}

fn build_systems(config: &SimulationConfig, speed: f32) -> (BeastAi, Hatching) {
    let ai_config = config.beast_ai();
    let ai_config =
        ai_config.with_step_interval(scale_interval(ai_config.step_interval(), speed));
    (
        BeastAi::new(ai_config),
        Hatching::new(config.hatching()),
    )
}

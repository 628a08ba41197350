#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Beast AI system that chooses a direction for every beast whose cooldown elapsed.
//!
//! Beasts within the sensing radius chase the player most of the time by
//! closing the larger of the two axis gaps, falling back to the other axis
//! when the preferred cell is obstructed. Otherwise they wander into one of
//! the open neighbouring cells. Each attempt re-rolls the beast's cooldown
//! around the configured step interval, so beasts drift out of lockstep.

use std::{collections::BTreeMap, time::Duration};

use beast_core::{
    BeastId, BeastKind, BeastView, CellCoord, Command, Direction, Event, Terrain, TerrainView,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

const DEFAULT_STEP_INTERVAL: Duration = Duration::from_millis(600);
const DEFAULT_SENSING_RADIUS: u32 = 10;
const DEFAULT_AGGRESSION: f64 = 0.75;
const DEFAULT_RNG_SEED: u64 = 0x5eed_b3a5_7c0f_fee1;
const COOLDOWN_JITTER_MIN: f64 = 0.8;
const COOLDOWN_JITTER_MAX: f64 = 1.2;

/// Configuration parameters required to construct the beast AI system.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Config {
    step_interval: Duration,
    sensing_radius: u32,
    aggression: f64,
    rng_seed: u64,
}

impl Config {
    /// Creates a new configuration.
    ///
    /// `aggression` is the probability of chasing a sensed player and is
    /// clamped to `[0, 1]` when the system is built.
    #[must_use]
    pub const fn new(
        step_interval: Duration,
        sensing_radius: u32,
        aggression: f64,
        rng_seed: u64,
    ) -> Self {
        Self {
            step_interval,
            sensing_radius,
            aggression,
            rng_seed,
        }
    }

    /// Nominal time between two attempts of the same beast.
    #[must_use]
    pub const fn step_interval(&self) -> Duration {
        self.step_interval
    }

    /// Euclidean distance, in cells, within which beasts notice the player.
    #[must_use]
    pub const fn sensing_radius(&self) -> u32 {
        self.sensing_radius
    }

    /// Probability that a beast sensing the player moves toward it.
    #[must_use]
    pub const fn aggression(&self) -> f64 {
        self.aggression
    }

    /// Seed for the deterministic random stream.
    #[must_use]
    pub const fn rng_seed(&self) -> u64 {
        self.rng_seed
    }

    /// Returns a copy with a different step interval.
    #[must_use]
    pub const fn with_step_interval(mut self, step_interval: Duration) -> Self {
        self.step_interval = step_interval;
        self
    }

    /// Returns a copy with a different seed.
    #[must_use]
    pub const fn with_rng_seed(mut self, rng_seed: u64) -> Self {
        self.rng_seed = rng_seed;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(
            DEFAULT_STEP_INTERVAL,
            DEFAULT_SENSING_RADIUS,
            DEFAULT_AGGRESSION,
            DEFAULT_RNG_SEED,
        )
    }
}

/// Pure system that reacts to elapsed time and emits beast step commands.
#[derive(Debug)]
pub struct BeastAi {
    step_interval: Duration,
    sensing_radius: u32,
    aggression: f64,
    rng: ChaCha8Rng,
    cooldowns: BTreeMap<BeastId, Duration>,
}

impl BeastAi {
    /// Creates a new beast AI using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        let aggression = if config.aggression.is_nan() {
            0.0
        } else {
            config.aggression.clamp(0.0, 1.0)
        };
        Self {
            step_interval: config.step_interval,
            sensing_radius: config.sensing_radius,
            aggression,
            rng: ChaCha8Rng::seed_from_u64(config.rng_seed),
            cooldowns: BTreeMap::new(),
        }
    }

    /// Consumes world events and the current beast layout to emit step commands.
    ///
    /// Commands are produced in ascending beast id order.
    pub fn handle(
        &mut self,
        events: &[Event],
        beast_view: &BeastView,
        terrain_view: &TerrainView<'_>,
        player: CellCoord,
        out: &mut Vec<Command>,
    ) {
        let elapsed = events
            .iter()
            .filter_map(|event| match event {
                Event::TimeAdvanced { dt } => Some(*dt),
                _ => None,
            })
            .fold(Duration::ZERO, Duration::saturating_add);
        if elapsed.is_zero() {
            return;
        }

        self.cooldowns
            .retain(|id, _| beast_view.iter().any(|beast| beast.id == *id));

        for beast in beast_view.iter() {
            let cooldown = match self.cooldowns.get(&beast.id) {
                Some(cooldown) => *cooldown,
                None => self.roll_cooldown(),
            };
            let cooldown = cooldown.saturating_sub(elapsed);
            if !cooldown.is_zero() {
                let _ = self.cooldowns.insert(beast.id, cooldown);
                continue;
            }

            let surroundings = Surroundings {
                terrain: terrain_view,
                beasts: beast_view,
                kind: beast.kind,
            };
            let direction = self.choose_direction(beast.cell, player, &surroundings);
            out.push(Command::StepBeast {
                beast_id: beast.id,
                direction,
            });
            let next = self.roll_cooldown();
            let _ = self.cooldowns.insert(beast.id, next);
        }
    }

    fn roll_cooldown(&mut self) -> Duration {
        let factor = self
            .rng
            .gen_range(COOLDOWN_JITTER_MIN..=COOLDOWN_JITTER_MAX);
        self.step_interval.mul_f64(factor)
    }

    fn choose_direction(
        &mut self,
        beast: CellCoord,
        player: CellCoord,
        surroundings: &Surroundings<'_, '_>,
    ) -> Direction {
        let radius = u64::from(self.sensing_radius);
        let senses_player = beast.distance_squared(player) <= radius * radius;
        if senses_player && self.rng.gen_bool(self.aggression) {
            let chase = chase_directions(beast, player)
                .into_iter()
                .flatten()
                .find(|direction| surroundings.is_open(beast, *direction));
            if let Some(direction) = chase {
                return direction;
            }
        }

        let open: Vec<Direction> = Direction::ALL
            .into_iter()
            .filter(|direction| surroundings.is_open(beast, *direction))
            .collect();
        if open.is_empty() {
            return Direction::ALL[self.rng.gen_range(0..Direction::ALL.len())];
        }
        open[self.rng.gen_range(0..open.len())]
    }
}

/// What a single beast can see around itself when picking a step.
struct Surroundings<'t, 'b> {
    terrain: &'t TerrainView<'t>,
    beasts: &'b BeastView,
    kind: BeastKind,
}

impl Surroundings<'_, '_> {
    /// A neighbour is open when it lies on the grid, holds no other beast and
    /// is not solid. Sliding beasts push blocks, so blocks are open to them.
    fn is_open(&self, from: CellCoord, direction: Direction) -> bool {
        let Some(cell) = from.step(direction) else {
            return false;
        };
        let Some(terrain) = self.terrain.terrain(cell) else {
            return false;
        };
        if self.beasts.iter().any(|beast| beast.cell == cell) {
            return false;
        }
        !terrain.is_solid() || (terrain == Terrain::Block && self.kind.slides())
    }
}

impl Default for BeastAi {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

/// Cardinal steps toward the target: the axis with the larger gap first,
/// then the other axis. Ties favour the row axis. An axis already aligned
/// with the target yields no step.
fn chase_directions(from: CellCoord, to: CellCoord) -> [Option<Direction>; 2] {
    let dx = i64::from(to.column()) - i64::from(from.column());
    let dy = i64::from(to.row()) - i64::from(from.row());
    let horizontal = match dx.signum() {
        1 => Some(Direction::East),
        -1 => Some(Direction::West),
        _ => None,
    };
    let vertical = match dy.signum() {
        1 => Some(Direction::South),
        -1 => Some(Direction::North),
        _ => None,
    };
    if dx.abs() > dy.abs() {
        [horizontal, vertical]
    } else {
        [vertical, horizontal]
    }
}

#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Beast chase engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems and
//! hosts to react to deterministically. Systems consume event streams, query
//! immutable snapshots, and respond exclusively with new command batches.

pub mod level;

use std::time::Duration;

use serde::{Deserialize, Serialize};

pub use level::{CellTag, LevelDescription, LevelError};

/// Points awarded for defeating a regular or hatched beast.
pub const BEAST_SCORE: u64 = 100;

/// Points awarded for defeating a super beast.
pub const SUPER_BEAST_SCORE: u64 = 200;

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Requests that the player attempt a single step in the given direction.
    MovePlayer {
        /// Direction of travel for the attempted step.
        direction: Direction,
    },
    /// Requests that a beast attempt a move in the specified direction.
    StepBeast {
        /// Identifier of the beast attempting to move.
        beast_id: BeastId,
        /// Direction of travel for the attempted move.
        direction: Direction,
    },
    /// Requests that an egg hatch into a new beast.
    HatchEgg {
        /// Identifier of the egg that reached its hatch time.
        egg_id: EggId,
    },
    /// Closes the current tick by evaluating the win and loss conditions.
    ResolveTick,
    /// Requests that the player re-enter the level after losing a life.
    Respawn,
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Confirms that the player moved between two cells.
    PlayerMoved {
        /// Cell the player occupied before moving.
        from: CellCoord,
        /// Cell the player occupies after moving.
        to: CellCoord,
    },
    /// Confirms that a chain of blocks shifted one cell.
    BlocksPushed {
        /// Cell the nearest block occupied before the push.
        head: CellCoord,
        /// Direction the chain travelled.
        direction: Direction,
        /// Number of blocks in the chain.
        count: u32,
    },
    /// Confirms that a beast moved between two cells.
    BeastMoved {
        /// Identifier of the beast that moved.
        beast_id: BeastId,
        /// Cell the beast occupied before moving.
        from: CellCoord,
        /// Cell the beast occupies after moving.
        to: CellCoord,
    },
    /// Announces that a beast was crushed and removed from the level.
    BeastDefeated {
        /// Identifier of the defeated beast.
        beast_id: BeastId,
        /// Subtype of the defeated beast.
        kind: BeastKind,
        /// Cell where the beast was crushed.
        cell: CellCoord,
    },
    /// Reports the new cumulative score.
    ScoreChanged {
        /// Score after the change was applied.
        score: u64,
    },
    /// Confirms that an egg hatched into a new beast.
    EggHatched {
        /// Identifier of the egg that hatched.
        egg_id: EggId,
        /// Identifier allocated to the hatched beast.
        beast_id: BeastId,
        /// Cell shared by the egg and the new beast.
        cell: CellCoord,
    },
    /// Reports that a beast reached the player during the current tick.
    PlayerCaught {
        /// Cell where the player was caught.
        cell: CellCoord,
    },
    /// Announces that the player lost a life.
    PlayerDied {
        /// Lives left after the loss.
        lives_remaining: u32,
    },
    /// Confirms that the player re-entered the level.
    PlayerRespawned {
        /// Cell the player was relocated to.
        cell: CellCoord,
    },
    /// Announces that the coarse game state changed.
    GameStateChanged {
        /// State that became active.
        state: GameState,
    },
    /// Fires once when the last remaining beast is gone.
    LevelCompleted,
    /// Fires once when the player runs out of lives.
    GameOver,
}

/// Coarse game states polled by the surrounding interface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameState {
    /// Ticks advance the simulation.
    Playing,
    /// The player lost a life and awaits a respawn trigger.
    PausedAfterDeath,
    /// No lives remain; terminal for the level.
    GameOver,
    /// Every beast was defeated; terminal for the level.
    LevelComplete,
}

impl GameState {
    /// Reports whether the state ends the current level.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::GameOver | Self::LevelComplete)
    }
}

/// Compass directions available to actors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Direction {
    /// Movement toward decreasing row indices.
    North,
    /// Diagonal movement up and to the right.
    NorthEast,
    /// Movement toward increasing column indices.
    East,
    /// Diagonal movement down and to the right.
    SouthEast,
    /// Movement toward increasing row indices.
    South,
    /// Diagonal movement down and to the left.
    SouthWest,
    /// Movement toward decreasing column indices.
    West,
    /// Diagonal movement up and to the left.
    NorthWest,
}

impl Direction {
    /// All eight compass directions in clockwise order starting at north.
    pub const ALL: [Direction; 8] = [
        Direction::North,
        Direction::NorthEast,
        Direction::East,
        Direction::SouthEast,
        Direction::South,
        Direction::SouthWest,
        Direction::West,
        Direction::NorthWest,
    ];

    /// The four orthogonal directions.
    pub const CARDINALS: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    /// Column and row offsets applied by a single step.
    #[must_use]
    pub const fn offset(self) -> (i32, i32) {
        match self {
            Self::North => (0, -1),
            Self::NorthEast => (1, -1),
            Self::East => (1, 0),
            Self::SouthEast => (1, 1),
            Self::South => (0, 1),
            Self::SouthWest => (-1, 1),
            Self::West => (-1, 0),
            Self::NorthWest => (-1, -1),
        }
    }

    /// Direction pointing the opposite way.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::North => Self::South,
            Self::NorthEast => Self::SouthWest,
            Self::East => Self::West,
            Self::SouthEast => Self::NorthWest,
            Self::South => Self::North,
            Self::SouthWest => Self::NorthEast,
            Self::West => Self::East,
            Self::NorthWest => Self::SouthEast,
        }
    }

    /// Parses the short compass notation used by scripts and input bindings.
    ///
    /// Accepts `n`, `ne`, `e`, `se`, `s`, `sw`, `w`, `nw` and the aliases
    /// `up`, `down`, `left`, `right`, case-insensitively.
    #[must_use]
    pub fn parse(token: &str) -> Option<Self> {
        let lowered = token.trim().to_ascii_lowercase();
        let direction = match lowered.as_str() {
            "n" | "up" => Self::North,
            "ne" | "up-right" => Self::NorthEast,
            "e" | "right" => Self::East,
            "se" | "down-right" => Self::SouthEast,
            "s" | "down" => Self::South,
            "sw" | "down-left" => Self::SouthWest,
            "w" | "left" => Self::West,
            "nw" | "up-left" => Self::NorthWest,
            _ => return None,
        };
        Some(direction)
    }
}

/// Unique identifier assigned to a beast.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BeastId(u32);

impl BeastId {
    /// Creates a new beast identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to an egg.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EggId(u32);

impl EggId {
    /// Creates a new egg identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the egg identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Location of a single grid cell expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    column: u32,
    row: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Neighbouring cell one step away in the given direction.
    ///
    /// Returns `None` when the step would leave the top or left edge. Steps
    /// past the bottom or right edge produce a coordinate that callers must
    /// still bounds-check against the grid.
    #[must_use]
    pub fn step(self, direction: Direction) -> Option<CellCoord> {
        let (dx, dy) = direction.offset();
        let column = self.column.checked_add_signed(dx)?;
        let row = self.row.checked_add_signed(dy)?;
        Some(CellCoord::new(column, row))
    }

    /// Squared Euclidean distance between two cell coordinates.
    #[must_use]
    pub fn distance_squared(self, other: CellCoord) -> u64 {
        let dx = u64::from(self.column().abs_diff(other.column()));
        let dy = u64::from(self.row().abs_diff(other.row()));
        dx * dx + dy * dy
    }
}

/// Static terrain occupying a grid cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Terrain {
    /// Open floor that actors may enter.
    #[default]
    Empty,
    /// Immovable wall.
    Wall,
    /// Pushable block.
    Block,
}

impl Terrain {
    /// Reports whether the terrain stops displacement outright.
    #[must_use]
    pub const fn is_solid(self) -> bool {
        matches!(self, Self::Wall | Self::Block)
    }
}

/// Beast subtypes with distinct defeat rules and movement styles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BeastKind {
    /// Regular beast that steps one cell at a time.
    Beast,
    /// Armoured beast that must be wedged against a wall to be crushed.
    SuperBeast,
    /// Beast hatched from an egg that slides until obstructed.
    HatchedBeast,
}

impl BeastKind {
    /// Points awarded when a beast of this kind is defeated.
    #[must_use]
    pub const fn defeat_score(self) -> u64 {
        match self {
            Self::Beast | Self::HatchedBeast => BEAST_SCORE,
            Self::SuperBeast => SUPER_BEAST_SCORE,
        }
    }

    /// Reports whether the beast slides through open cells instead of stepping.
    #[must_use]
    pub const fn slides(self) -> bool {
        matches!(self, Self::HatchedBeast)
    }
}

/// Kinds of actors tracked separately from terrain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActorKind {
    /// The single player-controlled actor.
    Player,
    /// A beast of the given subtype.
    Beast(BeastKind),
    /// An unhatched egg.
    Egg,
}

/// Actor removed or killed by a crushing move.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Victim {
    /// The player was caught or crushed.
    Player,
    /// A beast was defeated.
    Beast {
        /// Identifier of the defeated beast.
        id: BeastId,
        /// Subtype of the defeated beast.
        kind: BeastKind,
    },
}

/// Result of resolving a single movement attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MoveOutcome {
    /// The mover advanced into a free cell.
    Moved,
    /// Nothing changed.
    Blocked,
    /// The mover advanced after shifting a chain of blocks.
    Pushed {
        /// Number of blocks that shifted.
        chain: u32,
    },
    /// The move defeated or killed one or more actors.
    Crushed {
        /// Actors that were defeated by the move.
        victims: Vec<Victim>,
    },
}

impl MoveOutcome {
    /// Reports whether the attempt left the world untouched.
    #[must_use]
    pub fn is_blocked(&self) -> bool {
        matches!(self, Self::Blocked)
    }
}

/// Immutable representation of a single beast used for queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BeastSnapshot {
    /// Unique identifier assigned to the beast.
    pub id: BeastId,
    /// Grid cell currently occupied by the beast.
    pub cell: CellCoord,
    /// Subtype of the beast.
    pub kind: BeastKind,
}

/// Read-only snapshot describing all beasts within the level.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BeastView {
    snapshots: Vec<BeastSnapshot>,
}

impl BeastView {
    /// Creates a new beast view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<BeastSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured beast snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &BeastSnapshot> {
        self.snapshots.iter()
    }

    /// Number of beasts captured by the view.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view contains no beasts.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<BeastSnapshot> {
        self.snapshots
    }
}

/// Immutable representation of a single egg used for queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EggSnapshot {
    /// Unique identifier assigned to the egg.
    pub id: EggId,
    /// Grid cell occupied by the egg.
    pub cell: CellCoord,
    /// Simulated time elapsed since the egg was laid.
    pub age: Duration,
}

/// Read-only snapshot describing all unhatched eggs.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EggView {
    snapshots: Vec<EggSnapshot>,
}

impl EggView {
    /// Creates a new egg view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<EggSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured egg snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &EggSnapshot> {
        self.snapshots.iter()
    }

    /// Number of eggs captured by the view.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view contains no eggs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

/// Read-only view into the dense terrain grid.
#[derive(Clone, Copy, Debug)]
pub struct TerrainView<'a> {
    cells: &'a [Terrain],
    columns: u32,
    rows: u32,
}

impl<'a> TerrainView<'a> {
    /// Captures a new terrain view backed by the provided row-major slice.
    #[must_use]
    pub fn new(cells: &'a [Terrain], columns: u32, rows: u32) -> Self {
        Self {
            cells,
            columns,
            rows,
        }
    }

    /// Terrain stored at the provided cell, or `None` when out of bounds.
    #[must_use]
    pub fn terrain(&self, cell: CellCoord) -> Option<Terrain> {
        self.index(cell)
            .and_then(|index| self.cells.get(index).copied())
    }

    /// Reports whether the cell lies inside the grid.
    #[must_use]
    pub fn contains(&self, cell: CellCoord) -> bool {
        cell.column() < self.columns && cell.row() < self.rows
    }

    /// Returns an iterator over all cells in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = Terrain> + 'a {
        self.cells.iter().copied()
    }

    /// Provides the dimensions of the underlying terrain grid.
    #[must_use]
    pub const fn dimensions(&self) -> (u32, u32) {
        (self.columns, self.rows)
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        if self.contains(cell) {
            let row = usize::try_from(cell.row()).ok()?;
            let column = usize::try_from(cell.column()).ok()?;
            let width = usize::try_from(self.columns).ok()?;
            Some(row * width + column)
        } else {
            None
        }
    }
}

/// Complete read-only picture of a level, sampled once per rendered frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorldSnapshot {
    /// Number of columns in the grid.
    pub columns: u32,
    /// Number of rows in the grid.
    pub rows: u32,
    /// Row-major terrain cells.
    pub terrain: Vec<Terrain>,
    /// Cell occupied by the player.
    pub player: CellCoord,
    /// Beasts currently active.
    pub beasts: BeastView,
    /// Eggs that have not hatched yet.
    pub eggs: EggView,
    /// Coarse game state.
    pub state: GameState,
    /// Lives left.
    pub lives: u32,
    /// Cumulative score.
    pub score: u64,
    /// Beasts that still need to be defeated.
    pub remaining_beasts: u32,
}

impl WorldSnapshot {
    /// Terrain view over the captured cells.
    #[must_use]
    pub fn terrain_view(&self) -> TerrainView<'_> {
        TerrainView::new(&self.terrain, self.columns, self.rows)
    }

    /// Actor drawn at the provided cell, preferring beasts over the player.
    #[must_use]
    pub fn actor_at(&self, cell: CellCoord) -> Option<ActorKind> {
        if let Some(beast) = self.beasts.iter().find(|beast| beast.cell == cell) {
            return Some(ActorKind::Beast(beast.kind));
        }
        if self.player == cell {
            return Some(ActorKind::Player);
        }
        if self.eggs.iter().any(|egg| egg.cell == cell) {
            return Some(ActorKind::Egg);
        }
        None
    }
}

/// Maximum bonus awarded for finishing a level instantly.
pub const MAX_TIME_BONUS: u32 = 500;

/// Completion time at which the time bonus reaches zero.
pub const TIME_BONUS_WINDOW: Duration = Duration::from_secs(300);

/// Each level number adds one tenth to the final score.
const LEVEL_MULTIPLIER_STEPS: u64 = 10;

/// End-of-level figures reported to the surrounding interface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelSummary {
    /// Simulated time spent in the level.
    pub elapsed: Duration,
    /// Beasts defeated during the level.
    pub beasts_defeated: u32,
    /// Cumulative score from crushing beasts.
    pub score: u64,
    /// Bonus earned for a fast finish.
    pub time_bonus: u32,
    /// Campaign position of the level, `0` when the level is unnumbered.
    pub level: u32,
}

impl LevelSummary {
    /// Builds a summary, deriving the time bonus from the elapsed time.
    #[must_use]
    pub fn new(elapsed: Duration, beasts_defeated: u32, score: u64, level: u32) -> Self {
        Self {
            elapsed,
            beasts_defeated,
            score,
            time_bonus: time_bonus(elapsed),
            level,
        }
    }

    /// Final score: score plus time bonus, raised by 10% per level and rounded down.
    #[must_use]
    pub fn total(&self) -> u64 {
        let base = self.score.saturating_add(u64::from(self.time_bonus));
        base.saturating_mul(LEVEL_MULTIPLIER_STEPS + u64::from(self.level))
            / LEVEL_MULTIPLIER_STEPS
    }

    /// Elapsed time rendered as `MM:SS`.
    #[must_use]
    pub fn formatted_elapsed(&self) -> String {
        format_elapsed(self.elapsed)
    }
}

/// Bonus that decays linearly from [`MAX_TIME_BONUS`] to zero over [`TIME_BONUS_WINDOW`].
#[must_use]
pub fn time_bonus(elapsed: Duration) -> u32 {
    let window = TIME_BONUS_WINDOW.as_secs_f64();
    let penalty = (elapsed.as_secs_f64() * f64::from(MAX_TIME_BONUS) / window).floor();
    if penalty >= f64::from(MAX_TIME_BONUS) {
        0
    } else {
        MAX_TIME_BONUS - penalty as u32
    }
}

/// Formats a duration as zero-padded `MM:SS`.
#[must_use]
pub fn format_elapsed(elapsed: Duration) -> String {
    let seconds = elapsed.as_secs();
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

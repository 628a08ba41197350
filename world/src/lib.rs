#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state for a single Beast level.

mod crush;
mod grid;
mod movement;
mod respawn;

use std::time::Duration;

use beast_core::{
    BeastId, BeastKind, CellCoord, CellTag, Command, Direction, EggId, Event, GameState,
    LevelDescription, LevelError, MoveOutcome,
};
use log::{debug, info, warn};

use grid::TerrainGrid;
pub use movement::{MovePolicy, Mover};

const DEFAULT_LIVES: u32 = 3;
const DEFAULT_PLAYER_MOVE_COOLDOWN: Duration = Duration::from_millis(150);

/// Tunable rules applied by the world while resolving commands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rules {
    lives: u32,
    player_move_cooldown: Duration,
}

impl Rules {
    /// Creates a new rule set.
    #[must_use]
    pub const fn new(lives: u32, player_move_cooldown: Duration) -> Self {
        Self {
            lives,
            player_move_cooldown,
        }
    }

    /// Lives granted at the start of a level.
    #[must_use]
    pub const fn lives(&self) -> u32 {
        self.lives
    }

    /// Minimum simulated time between two player steps.
    #[must_use]
    pub const fn player_move_cooldown(&self) -> Duration {
        self.player_move_cooldown
    }
}

impl Default for Rules {
    fn default() -> Self {
        Self::new(DEFAULT_LIVES, DEFAULT_PLAYER_MOVE_COOLDOWN)
    }
}

/// Represents the authoritative state of one level.
#[derive(Debug)]
pub struct World {
    number: u32,
    rules: Rules,
    terrain: TerrainGrid,
    player: Player,
    beasts: Vec<Beast>,
    eggs: Vec<Egg>,
    next_beast_id: u32,
    state: GameState,
    lives: u32,
    score: u64,
    remaining_beasts: u32,
    beasts_defeated: u32,
    clock: Duration,
    player_caught: bool,
}

impl World {
    /// Builds the initial state of a level from its description.
    pub fn new(level: &LevelDescription, rules: Rules) -> Result<Self, LevelError> {
        level.validate()?;

        let mut terrain = TerrainGrid::new(level.width, level.height);
        let mut spawn = None;
        let mut beasts = Vec::new();
        let mut eggs = Vec::new();
        let mut next_beast_id = 0;
        let mut next_egg_id = 0;

        for (cell, tag) in level.cells() {
            terrain.set(cell, tag.terrain());
            if let Some(kind) = tag.beast_kind() {
                beasts.push(Beast {
                    id: BeastId::new(next_beast_id),
                    cell,
                    kind,
                });
                next_beast_id += 1;
                continue;
            }
            match tag {
                CellTag::Player => spawn = Some(cell),
                CellTag::Egg => {
                    eggs.push(Egg {
                        id: EggId::new(next_egg_id),
                        cell,
                        laid_at: Duration::ZERO,
                    });
                    next_egg_id += 1;
                }
                _ => {}
            }
        }

        let spawn = spawn.ok_or(LevelError::MissingPlayer)?;
        warn_on_count_mismatch(level, &beasts, &eggs);

        let remaining_beasts = u32::try_from(beasts.len()).unwrap_or(u32::MAX);
        info!(
            "loaded level {:?}: {}x{}, {} beasts, {} eggs",
            level.name,
            level.width,
            level.height,
            beasts.len(),
            eggs.len()
        );

        Ok(Self {
            number: level.number.unwrap_or(0),
            rules,
            terrain,
            player: Player {
                cell: spawn,
                spawn,
                since_last_move: rules.player_move_cooldown(),
            },
            beasts,
            eggs,
            next_beast_id,
            state: GameState::Playing,
            lives: rules.lives(),
            score: 0,
            remaining_beasts,
            beasts_defeated: 0,
            clock: Duration::ZERO,
            player_caught: false,
        })
    }

    fn beast(&self, beast_id: BeastId) -> Option<&Beast> {
        self.beasts.iter().find(|beast| beast.id == beast_id)
    }

    fn beast_index(&self, beast_id: BeastId) -> Option<usize> {
        self.beasts.iter().position(|beast| beast.id == beast_id)
    }

    fn egg_index(&self, egg_id: EggId) -> Option<usize> {
        self.eggs.iter().position(|egg| egg.id == egg_id)
    }

    /// Actor standing on the cell. Beasts shadow a caught player.
    fn occupant(&self, cell: CellCoord) -> Option<Occupant> {
        if let Some(beast) = self.beasts.iter().find(|beast| beast.cell == cell) {
            return Some(Occupant::Beast {
                id: beast.id,
                kind: beast.kind,
            });
        }
        if self.player.cell == cell {
            return Some(Occupant::Player);
        }
        self.eggs
            .iter()
            .find(|egg| egg.cell == cell)
            .map(|egg| Occupant::Egg(egg.id))
    }

    fn catch_player(&mut self, out_events: &mut Vec<Event>) {
        if self.player_caught {
            return;
        }
        self.player_caught = true;
        debug!("player caught at {:?}", self.player.cell);
        out_events.push(Event::PlayerCaught {
            cell: self.player.cell,
        });
    }

    fn set_state(&mut self, state: GameState, out_events: &mut Vec<Event>) {
        if self.state == state {
            return;
        }
        info!("game state {:?} -> {:?}", self.state, state);
        self.state = state;
        out_events.push(Event::GameStateChanged { state });
    }

    fn resolve_tick(&mut self, out_events: &mut Vec<Event>) {
        if self.remaining_beasts == 0 {
            self.set_state(GameState::LevelComplete, out_events);
            out_events.push(Event::LevelCompleted);
            return;
        }
        let player_cell = self.player.cell;
        if self.beasts.iter().any(|beast| beast.cell == player_cell) {
            self.catch_player(out_events);
        }
        if !self.player_caught {
            return;
        }

        self.lives = self.lives.saturating_sub(1);
        out_events.push(Event::PlayerDied {
            lives_remaining: self.lives,
        });
        if self.lives > 0 {
            self.set_state(GameState::PausedAfterDeath, out_events);
        } else {
            self.set_state(GameState::GameOver, out_events);
            out_events.push(Event::GameOver);
        }
    }

    fn hatch_egg(&mut self, egg_id: EggId, out_events: &mut Vec<Event>) {
        let Some(index) = self.egg_index(egg_id) else {
            return;
        };
        let egg = self.eggs.remove(index);
        let beast_id = BeastId::new(self.next_beast_id);
        self.next_beast_id += 1;
        self.beasts.push(Beast {
            id: beast_id,
            cell: egg.cell,
            kind: BeastKind::HatchedBeast,
        });
        self.remaining_beasts = self.remaining_beasts.saturating_add(1);
        debug!("egg {:?} hatched into beast {:?}", egg_id, beast_id);
        out_events.push(Event::EggHatched {
            egg_id,
            beast_id,
            cell: egg.cell,
        });
    }

    fn step_beast(
        &mut self,
        beast_id: BeastId,
        direction: Direction,
        out_events: &mut Vec<Event>,
    ) {
        let Some(kind) = self.beast(beast_id).map(|beast| beast.kind) else {
            return;
        };
        let policy = MovePolicy::for_beast(kind);
        let mover = Mover::Beast(beast_id);

        if !kind.slides() {
            let _ = movement::attempt_move(self, mover, direction, policy, out_events);
            return;
        }

        let (columns, rows) = self.terrain.dimensions();
        for _ in 0..columns.max(rows) {
            let outcome = movement::attempt_move(self, mover, direction, policy, out_events);
            if outcome != MoveOutcome::Moved {
                break;
            }
        }
    }

    fn move_player(&mut self, direction: Direction, out_events: &mut Vec<Event>) {
        if self.player_caught || self.player.since_last_move < self.rules.player_move_cooldown() {
            return;
        }
        let outcome =
            movement::attempt_move(self, Mover::Player, direction, MovePolicy::PLAYER, out_events);
        if !outcome.is_blocked() {
            self.player.since_last_move = Duration::ZERO;
        }
    }

    fn respawn(&mut self, out_events: &mut Vec<Event>) {
        let cell = respawn::select_cell(self);
        self.player.cell = cell;
        self.player.since_last_move = self.rules.player_move_cooldown();
        self.player_caught = false;
        info!("player respawned at {:?}", cell);
        out_events.push(Event::PlayerRespawned { cell });
        self.set_state(GameState::Playing, out_events);
    }
}

/// Applies the provided command to the world, mutating state deterministically.
///
/// Commands that do not make sense in the current state are ignored.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Respawn => {
            if world.state == GameState::PausedAfterDeath {
                world.respawn(out_events);
            }
        }
        _ if world.state != GameState::Playing => {}
        Command::Tick { dt } => {
            world.clock = world.clock.saturating_add(dt);
            world.player.since_last_move = world.player.since_last_move.saturating_add(dt);
            out_events.push(Event::TimeAdvanced { dt });
        }
        Command::MovePlayer { direction } => world.move_player(direction, out_events),
        Command::StepBeast {
            beast_id,
            direction,
        } => world.step_beast(beast_id, direction, out_events),
        Command::HatchEgg { egg_id } => world.hatch_egg(egg_id, out_events),
        Command::ResolveTick => world.resolve_tick(out_events),
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::time::Duration;

    use beast_core::{
        BeastSnapshot, BeastView, CellCoord, EggSnapshot, EggView, GameState, LevelSummary,
        TerrainView, WorldSnapshot,
    };

    use super::World;

    pub use crate::crush::{has_backing, is_wedged};
    pub use crate::respawn::is_safe_cell;

    /// Grid dimensions as `(columns, rows)`.
    #[must_use]
    pub fn dimensions(world: &World) -> (u32, u32) {
        world.terrain.dimensions()
    }

    /// Exposes a read-only view of the terrain grid.
    #[must_use]
    pub fn terrain_view(world: &World) -> TerrainView<'_> {
        world.terrain.view()
    }

    /// Cell currently occupied by the player.
    #[must_use]
    pub fn player_cell(world: &World) -> CellCoord {
        world.player.cell
    }

    /// Reports whether the player's move throttle has elapsed.
    #[must_use]
    pub fn player_ready(world: &World) -> bool {
        !world.player_caught && world.player.since_last_move >= world.rules.player_move_cooldown()
    }

    /// Reports whether a beast reached the player since the last resolution.
    #[must_use]
    pub fn player_caught(world: &World) -> bool {
        world.player_caught
    }

    /// Captures a read-only view of the active beasts.
    #[must_use]
    pub fn beast_view(world: &World) -> BeastView {
        BeastView::from_snapshots(
            world
                .beasts
                .iter()
                .map(|beast| BeastSnapshot {
                    id: beast.id,
                    cell: beast.cell,
                    kind: beast.kind,
                })
                .collect(),
        )
    }

    /// Captures a read-only view of the unhatched eggs and their ages.
    #[must_use]
    pub fn egg_view(world: &World) -> EggView {
        EggView::from_snapshots(
            world
                .eggs
                .iter()
                .map(|egg| EggSnapshot {
                    id: egg.id,
                    cell: egg.cell,
                    age: world.clock.saturating_sub(egg.laid_at),
                })
                .collect(),
        )
    }

    /// Coarse game state.
    #[must_use]
    pub fn game_state(world: &World) -> GameState {
        world.state
    }

    /// Lives left.
    #[must_use]
    pub fn lives(world: &World) -> u32 {
        world.lives
    }

    /// Cumulative score.
    #[must_use]
    pub fn score(world: &World) -> u64 {
        world.score
    }

    /// Beasts that must still be defeated to complete the level.
    #[must_use]
    pub fn remaining_beasts(world: &World) -> u32 {
        world.remaining_beasts
    }

    /// Beasts defeated so far.
    #[must_use]
    pub fn beasts_defeated(world: &World) -> u32 {
        world.beasts_defeated
    }

    /// Simulated time elapsed since the level started.
    #[must_use]
    pub fn elapsed(world: &World) -> Duration {
        world.clock
    }

    /// End-of-level figures derived from the current counters.
    #[must_use]
    pub fn summary(world: &World) -> LevelSummary {
        LevelSummary::new(
            world.clock,
            world.beasts_defeated,
            world.score,
            world.number,
        )
    }

    /// Captures everything a renderer needs to draw one frame.
    #[must_use]
    pub fn snapshot(world: &World) -> WorldSnapshot {
        let (columns, rows) = world.terrain.dimensions();
        WorldSnapshot {
            columns,
            rows,
            terrain: world.terrain.cells().to_vec(),
            player: world.player.cell,
            beasts: beast_view(world),
            eggs: egg_view(world),
            state: world.state,
            lives: world.lives,
            score: world.score,
            remaining_beasts: world.remaining_beasts,
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct Player {
    cell: CellCoord,
    spawn: CellCoord,
    since_last_move: Duration,
}

#[derive(Clone, Copy, Debug)]
struct Beast {
    id: BeastId,
    cell: CellCoord,
    kind: BeastKind,
}

#[derive(Clone, Copy, Debug)]
struct Egg {
    id: EggId,
    cell: CellCoord,
    laid_at: Duration,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Occupant {
    Player,
    Beast { id: BeastId, kind: BeastKind },
    Egg(EggId),
}

fn warn_on_count_mismatch(level: &LevelDescription, beasts: &[Beast], eggs: &[Egg]) {
    let count = |kind: BeastKind| beasts.iter().filter(|beast| beast.kind == kind).count();
    let declared = [
        ("beasts", level.beasts as usize, count(BeastKind::Beast)),
        (
            "super beasts",
            level.super_beasts as usize,
            count(BeastKind::SuperBeast),
        ),
        ("eggs", level.eggs as usize, eggs.len()),
    ];
    for (label, expected, actual) in declared {
        if expected != actual {
            warn!(
                "level {:?} declares {} {} but the map holds {}",
                level.name, expected, label, actual
            );
        }
    }
}

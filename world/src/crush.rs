//! Backing checks and defeat bookkeeping.

use beast_core::{BeastKind, CellCoord, Direction, Event, Terrain, Victim};
use log::debug;

use crate::World;

/// Reports whether something stops displacement beyond `cell` in `direction`.
///
/// The map edge, walls, blocks and any actor (eggs included) count as backing.
#[must_use]
pub fn has_backing(world: &World, cell: CellCoord, direction: Direction) -> bool {
    let Some(next) = world.terrain.neighbour(cell, direction) else {
        return true;
    };
    match world.terrain.get(next) {
        Some(Terrain::Empty) => world.occupant(next).is_some(),
        _ => true,
    }
}

/// Reports whether a cell is pinned along one cardinal axis.
///
/// One side must be a wall or the map edge while the opposite side is a
/// block, a wall or the map edge.
#[must_use]
pub fn is_wedged(world: &World, cell: CellCoord) -> bool {
    [Direction::North, Direction::East].into_iter().any(|direction| {
        let near = side(world, cell, direction);
        let far = side(world, cell, direction.opposite());
        (near.is_wall() && far.is_solid()) || (far.is_wall() && near.is_solid())
    })
}

pub(crate) fn can_defeat(
    world: &World,
    cell: CellCoord,
    kind: BeastKind,
    direction: Direction,
) -> bool {
    if !has_backing(world, cell, direction) {
        return false;
    }
    match kind {
        BeastKind::SuperBeast => is_wedged(world, cell),
        BeastKind::Beast | BeastKind::HatchedBeast => true,
    }
}

/// Removes defeated beasts and credits their score. Player victims are caught.
pub(crate) fn resolve_crush(
    world: &mut World,
    victims: &[Victim],
    out_events: &mut Vec<Event>,
) -> Vec<Victim> {
    let mut defeated = Vec::with_capacity(victims.len());
    for victim in victims {
        match *victim {
            Victim::Player => world.catch_player(out_events),
            Victim::Beast { id, kind } => {
                let Some(index) = world.beast_index(id) else {
                    continue;
                };
                let beast = world.beasts.remove(index);
                world.score = world.score.saturating_add(kind.defeat_score());
                world.remaining_beasts = world.remaining_beasts.saturating_sub(1);
                world.beasts_defeated = world.beasts_defeated.saturating_add(1);
                debug!("beast {:?} ({:?}) crushed at {:?}", id, kind, beast.cell);
                out_events.push(Event::BeastDefeated {
                    beast_id: id,
                    kind,
                    cell: beast.cell,
                });
                out_events.push(Event::ScoreChanged { score: world.score });
            }
        }
        defeated.push(*victim);
    }
    defeated
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Side {
    Edge,
    Wall,
    Block,
    Open,
}

impl Side {
    fn is_wall(self) -> bool {
        matches!(self, Self::Edge | Self::Wall)
    }

    fn is_solid(self) -> bool {
        !matches!(self, Self::Open)
    }
}

fn side(world: &World, cell: CellCoord, direction: Direction) -> Side {
    match world
        .terrain
        .neighbour(cell, direction)
        .and_then(|next| world.terrain.get(next))
    {
        None => Side::Edge,
        Some(Terrain::Wall) => Side::Wall,
        Some(Terrain::Block) => Side::Block,
        Some(Terrain::Empty) => Side::Open,
    }
}

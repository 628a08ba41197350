use beast_core::{BeastId, BeastKind, CellCoord, Direction, Event, MoveOutcome, Terrain, Victim};
use log::debug;

use crate::{crush, Occupant, World};

/// Actor attempting a move.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Mover {
    /// The player.
    Player,
    /// The beast with the given identifier.
    Beast(BeastId),
}

/// Capabilities granted to a mover while its step is resolved.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MovePolicy {
    pushes_blocks: bool,
    crushes_beasts: bool,
    kills_player: bool,
}

impl MovePolicy {
    /// Player: pushes block chains and crushes backed beasts.
    pub const PLAYER: Self = Self::new(true, true, false);

    /// Regular and super beasts: cannot push, crush backed beasts they walk
    /// into and kill the player on contact.
    pub const BEAST: Self = Self::new(false, true, true);

    /// Hatched beasts: push, crush and kill the player.
    pub const HATCHED_BEAST: Self = Self::new(true, true, true);

    const fn new(pushes_blocks: bool, crushes_beasts: bool, kills_player: bool) -> Self {
        Self {
            pushes_blocks,
            crushes_beasts,
            kills_player,
        }
    }

    /// Policy used for a beast of the given kind.
    #[must_use]
    pub const fn for_beast(kind: BeastKind) -> Self {
        match kind {
            BeastKind::Beast | BeastKind::SuperBeast => Self::BEAST,
            BeastKind::HatchedBeast => Self::HATCHED_BEAST,
        }
    }

    /// Whether the mover may shift block chains.
    #[must_use]
    pub const fn pushes_blocks(&self) -> bool {
        self.pushes_blocks
    }

    /// Whether the mover may defeat beasts that have backing.
    #[must_use]
    pub const fn crushes_beasts(&self) -> bool {
        self.crushes_beasts
    }

    /// Whether touching the player kills it.
    #[must_use]
    pub const fn kills_player(&self) -> bool {
        self.kills_player
    }
}

/// Resolves one single-cell step. Blocked attempts leave the world untouched.
pub(crate) fn attempt_move(
    world: &mut World,
    mover: Mover,
    direction: Direction,
    policy: MovePolicy,
    out_events: &mut Vec<Event>,
) -> MoveOutcome {
    let Some(from) = mover_cell(world, mover) else {
        return MoveOutcome::Blocked;
    };
    let Some(target) = world.terrain.neighbour(from, direction) else {
        return MoveOutcome::Blocked;
    };

    match world.terrain.get(target) {
        Some(Terrain::Empty) => enter(world, mover, from, target, direction, policy, out_events),
        Some(Terrain::Block) if policy.pushes_blocks() => {
            push(world, mover, from, target, direction, policy, out_events)
        }
        _ => MoveOutcome::Blocked,
    }
}

fn enter(
    world: &mut World,
    mover: Mover,
    from: CellCoord,
    target: CellCoord,
    direction: Direction,
    policy: MovePolicy,
    out_events: &mut Vec<Event>,
) -> MoveOutcome {
    match world.occupant(target) {
        None => {
            relocate(world, mover, from, target, out_events);
            MoveOutcome::Moved
        }
        Some(Occupant::Player) if policy.kills_player() => {
            relocate(world, mover, from, target, out_events);
            world.catch_player(out_events);
            MoveOutcome::Crushed {
                victims: vec![Victim::Player],
            }
        }
        Some(Occupant::Beast { id, kind })
            if policy.crushes_beasts() && crush::can_defeat(world, target, kind, direction) =>
        {
            let victims = crush::resolve_crush(world, &[Victim::Beast { id, kind }], out_events);
            relocate(world, mover, from, target, out_events);
            MoveOutcome::Crushed { victims }
        }
        _ => MoveOutcome::Blocked,
    }
}

fn push(
    world: &mut World,
    mover: Mover,
    from: CellCoord,
    head: CellCoord,
    direction: Direction,
    policy: MovePolicy,
    out_events: &mut Vec<Event>,
) -> MoveOutcome {
    let mut chain: u32 = 1;
    let mut tail = head;
    let beyond = loop {
        let Some(next) = world.terrain.neighbour(tail, direction) else {
            return MoveOutcome::Blocked;
        };
        match world.terrain.get(next) {
            Some(Terrain::Block) => {
                chain += 1;
                tail = next;
            }
            Some(Terrain::Empty) => break next,
            _ => return MoveOutcome::Blocked,
        }
    };

    // A caught player shares its cell with the beast that reached it.
    let occupant = if world.player.cell == beyond {
        Some(Occupant::Player)
    } else {
        world.occupant(beyond)
    };
    let victims = match occupant {
        None => Vec::new(),
        Some(Occupant::Beast { id, kind })
            if policy.crushes_beasts() && crush::can_defeat(world, beyond, kind, direction) =>
        {
            crush::resolve_crush(world, &[Victim::Beast { id, kind }], out_events)
        }
        Some(Occupant::Player)
            if policy.kills_player() && crush::has_backing(world, beyond, direction) =>
        {
            // The chain cannot share a cell with the player, so nothing shifts.
            world.catch_player(out_events);
            return MoveOutcome::Crushed {
                victims: vec![Victim::Player],
            };
        }
        _ => return MoveOutcome::Blocked,
    };

    world.terrain.set(beyond, Terrain::Block);
    world.terrain.set(head, Terrain::Empty);
    debug!("pushed {} blocks from {:?} {:?}", chain, head, direction);
    out_events.push(Event::BlocksPushed {
        head,
        direction,
        count: chain,
    });
    relocate(world, mover, from, head, out_events);

    if victims.is_empty() {
        MoveOutcome::Pushed { chain }
    } else {
        MoveOutcome::Crushed { victims }
    }
}

fn mover_cell(world: &World, mover: Mover) -> Option<CellCoord> {
    match mover {
        Mover::Player => Some(world.player.cell),
        Mover::Beast(beast_id) => world.beast(beast_id).map(|beast| beast.cell),
    }
}

fn relocate(
    world: &mut World,
    mover: Mover,
    from: CellCoord,
    to: CellCoord,
    out_events: &mut Vec<Event>,
) {
    match mover {
        Mover::Player => {
            world.player.cell = to;
            out_events.push(Event::PlayerMoved { from, to });
        }
        Mover::Beast(beast_id) => {
            if let Some(index) = world.beast_index(beast_id) {
                world.beasts[index].cell = to;
                out_events.push(Event::BeastMoved { beast_id, from, to });
            }
        }
    }
}

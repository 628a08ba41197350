use std::time::Duration;

use beast_core::{
    BeastId, BeastKind, CellCoord, Command, Direction, Event, GameState, LevelDescription, Terrain,
};
use beast_world::{self as world, query, Rules, World};

fn load(map: &str) -> World {
    let level = LevelDescription::from_ascii("movement", map).expect("valid level");
    World::new(&level, Rules::default()).expect("world")
}

fn apply_all(world: &mut World, commands: impl IntoIterator<Item = Command>) -> Vec<Event> {
    let mut events = Vec::new();
    for command in commands {
        world::apply(world, command, &mut events);
    }
    events
}

fn move_player(world: &mut World, direction: Direction) -> Vec<Event> {
    apply_all(
        world,
        [
            Command::Tick {
                dt: Duration::from_millis(150),
            },
            Command::MovePlayer { direction },
        ],
    )
    .into_iter()
    .filter(|event| !matches!(event, Event::TimeAdvanced { .. }))
    .collect()
}

fn terrain_at(world: &World, column: u32, row: u32) -> Option<Terrain> {
    query::terrain_view(world).terrain(CellCoord::new(column, row))
}

#[test]
fn simple_push_moves_block_ahead_of_player() {
    let mut world = load(".....\n.PB..\n.....\n.....\n.....\n");

    let events = move_player(&mut world, Direction::East);
    assert_eq!(query::player_cell(&world), CellCoord::new(2, 1));
    assert_eq!(terrain_at(&world, 3, 1), Some(Terrain::Block));
    assert_eq!(terrain_at(&world, 2, 1), Some(Terrain::Empty));
    assert_eq!(
        events,
        vec![
            Event::BlocksPushed {
                head: CellCoord::new(2, 1),
                direction: Direction::East,
                count: 1,
            },
            Event::PlayerMoved {
                from: CellCoord::new(1, 1),
                to: CellCoord::new(2, 1),
            },
        ]
    );

    let _ = move_player(&mut world, Direction::East);
    assert_eq!(query::player_cell(&world), CellCoord::new(3, 1));
    assert_eq!(terrain_at(&world, 4, 1), Some(Terrain::Block));

    let events = move_player(&mut world, Direction::East);
    assert!(events.is_empty(), "block at the edge cannot move");
    assert_eq!(query::player_cell(&world), CellCoord::new(3, 1));
}

#[test]
fn chain_of_blocks_shifts_as_a_unit() {
    let mut world = load("#######\n#PBBB.#\n#######\n");

    let events = move_player(&mut world, Direction::East);
    assert!(events.contains(&Event::BlocksPushed {
        head: CellCoord::new(2, 1),
        direction: Direction::East,
        count: 3,
    }));
    assert_eq!(query::player_cell(&world), CellCoord::new(2, 1));
    for column in 3..=5 {
        assert_eq!(terrain_at(&world, column, 1), Some(Terrain::Block));
    }

    let before = query::snapshot(&world);
    let events = move_player(&mut world, Direction::East);
    assert!(events.is_empty());
    assert_eq!(query::snapshot(&world).terrain, before.terrain);
    assert_eq!(query::player_cell(&world), CellCoord::new(2, 1));
}

#[test]
fn walls_and_edges_block_without_mutation() {
    let mut world = load("P#\n..\n");
    let before = query::snapshot(&world);

    for direction in [Direction::North, Direction::West, Direction::East, Direction::NorthWest] {
        assert!(move_player(&mut world, direction).is_empty());
    }

    let after = query::snapshot(&world);
    assert_eq!(after.terrain, before.terrain);
    assert_eq!(after.player, before.player);
    assert_eq!(after.score, before.score);
}

#[test]
fn chains_stopped_by_a_wall_or_the_edge_stay_put() {
    for map in ["#####\n#PBB#\n#####\n", "PBBB\n"] {
        let mut world = load(map);
        let before = query::snapshot(&world);

        assert!(move_player(&mut world, Direction::East).is_empty(), "{map}");
        assert_eq!(query::snapshot(&world).terrain, before.terrain, "{map}");
        assert_eq!(query::player_cell(&world), before.player, "{map}");
        assert!(query::player_ready(&world));
    }
}

#[test]
fn beast_crushed_against_wall() {
    let mut world = load(".....\n.PH#.\n.....\n");

    let events = move_player(&mut world, Direction::East);

    assert_eq!(query::player_cell(&world), CellCoord::new(2, 1));
    assert_eq!(query::score(&world), 100);
    assert_eq!(query::remaining_beasts(&world), 0);
    assert_eq!(query::beasts_defeated(&world), 1);
    assert!(query::beast_view(&world).is_empty());
    assert_eq!(
        events,
        vec![
            Event::BeastDefeated {
                beast_id: BeastId::new(0),
                kind: BeastKind::Beast,
                cell: CellCoord::new(2, 1),
            },
            Event::ScoreChanged { score: 100 },
            Event::PlayerMoved {
                from: CellCoord::new(1, 1),
                to: CellCoord::new(2, 1),
            },
        ]
    );
}

#[test]
fn beast_without_backing_blocks_the_player() {
    let mut world = load(".....\n.PH..\n.....\n");
    let before = query::snapshot(&world);

    let events = move_player(&mut world, Direction::East);

    assert!(events.is_empty());
    assert_eq!(query::snapshot(&world), before);
    assert!(query::player_ready(&world));
}

#[test]
fn pushed_block_crushes_beast_backed_by_another_beast() {
    let mut world = load(".......\n.......\n.PBHH..\n.......\n.......\n");

    let events = move_player(&mut world, Direction::East);

    assert!(events.iter().any(|event| matches!(
        event,
        Event::BeastDefeated {
            kind: BeastKind::Beast,
            ..
        }
    )));
    assert_eq!(query::remaining_beasts(&world), 1);
    assert_eq!(terrain_at(&world, 3, 2), Some(Terrain::Block));
    assert_eq!(query::player_cell(&world), CellCoord::new(2, 2));
}

#[test]
fn super_beast_survives_when_backed_only_by_a_beast() {
    let mut world = load(".......\n.......\n.PBSH..\n.......\n.......\n");
    let before = query::snapshot(&world);

    let events = move_player(&mut world, Direction::East);

    assert!(events.is_empty());
    assert_eq!(query::snapshot(&world), before);
    assert_eq!(query::remaining_beasts(&world), 2);
}

#[test]
fn super_beast_wedged_against_wall_is_worth_double() {
    let mut world = load("......\n.PBS#.\n......\n");

    let events = move_player(&mut world, Direction::East);

    assert!(events.contains(&Event::ScoreChanged { score: 200 }));
    assert_eq!(query::remaining_beasts(&world), 0);
    assert_eq!(terrain_at(&world, 3, 1), Some(Terrain::Block));
}

#[test]
fn eggs_block_movement_and_back_beasts() {
    let mut world = load("......\n..E...\n.PHE..\n");

    let events = move_player(&mut world, Direction::East);
    assert!(events.iter().any(|event| matches!(event, Event::BeastDefeated { .. })));
    assert_eq!(query::egg_view(&world).len(), 2);

    let mut world = load("......\n.PE...\n......\n");
    assert!(move_player(&mut world, Direction::East).is_empty());
}

#[test]
fn regular_beast_cannot_push_blocks() {
    let mut world = load("P.....\n..HB..\n");
    let events = apply_all(
        &mut world,
        [Command::StepBeast {
            beast_id: BeastId::new(0),
            direction: Direction::East,
        }],
    );
    assert!(events.is_empty());
    assert_eq!(terrain_at(&world, 3, 1), Some(Terrain::Block));
}

#[test]
fn beast_walking_into_a_backed_beast_crushes_it() {
    let mut world = load("P....\n.HH#.\n");
    let events = apply_all(
        &mut world,
        [Command::StepBeast {
            beast_id: BeastId::new(0),
            direction: Direction::East,
        }],
    );

    assert_eq!(
        events,
        vec![
            Event::BeastDefeated {
                beast_id: BeastId::new(1),
                kind: BeastKind::Beast,
                cell: CellCoord::new(2, 1),
            },
            Event::ScoreChanged { score: 100 },
            Event::BeastMoved {
                beast_id: BeastId::new(0),
                from: CellCoord::new(1, 1),
                to: CellCoord::new(2, 1),
            },
        ]
    );
    assert_eq!(query::remaining_beasts(&world), 1);
    assert_eq!(query::score(&world), 100);
}

#[test]
fn beast_cannot_crush_an_unwedged_super_beast() {
    let mut world = load("P....\n.HS#.\n");
    let before = query::snapshot(&world);
    let events = apply_all(
        &mut world,
        [Command::StepBeast {
            beast_id: BeastId::new(0),
            direction: Direction::East,
        }],
    );

    assert!(events.is_empty());
    assert_eq!(query::snapshot(&world), before);
}

#[test]
fn hatched_beast_slides_across_the_whole_row() {
    let mut world = load("X.......\nP.......\n");
    let events = apply_all(
        &mut world,
        [Command::StepBeast {
            beast_id: BeastId::new(0),
            direction: Direction::East,
        }],
    );

    let moves = events
        .iter()
        .filter(|event| matches!(event, Event::BeastMoved { .. }))
        .count();
    assert_eq!(moves, 7);
    let beast = query::beast_view(&world).into_vec()[0];
    assert_eq!(beast.cell, CellCoord::new(7, 0));
}

#[test]
fn hatched_beast_slides_and_pushes_once() {
    let mut world = load("P.......\nX...B...\n");
    let events = apply_all(
        &mut world,
        [Command::StepBeast {
            beast_id: BeastId::new(0),
            direction: Direction::East,
        }],
    );

    let moves = events
        .iter()
        .filter(|event| matches!(event, Event::BeastMoved { .. }))
        .count();
    assert_eq!(moves, 4);
    assert!(events.contains(&Event::BlocksPushed {
        head: CellCoord::new(4, 1),
        direction: Direction::East,
        count: 1,
    }));
    let beast = query::beast_view(&world).into_vec()[0];
    assert_eq!(beast.cell, CellCoord::new(4, 1));
    assert_eq!(terrain_at(&world, 5, 1), Some(Terrain::Block));
}

#[test]
fn beast_contact_kills_player_once_per_tick() {
    let mut world = load("#####\n#PH.#\n#####\n");

    let events = apply_all(
        &mut world,
        [
            Command::StepBeast {
                beast_id: BeastId::new(0),
                direction: Direction::West,
            },
            Command::ResolveTick,
        ],
    );

    assert_eq!(
        events,
        vec![
            Event::BeastMoved {
                beast_id: BeastId::new(0),
                from: CellCoord::new(2, 1),
                to: CellCoord::new(1, 1),
            },
            Event::PlayerCaught {
                cell: CellCoord::new(1, 1),
            },
            Event::PlayerDied { lives_remaining: 2 },
            Event::GameStateChanged {
                state: GameState::PausedAfterDeath,
            },
        ]
    );
    assert_eq!(query::game_state(&world), GameState::PausedAfterDeath);

    let events = apply_all(&mut world, [Command::Respawn]);
    assert_eq!(
        events,
        vec![
            Event::PlayerRespawned {
                cell: CellCoord::new(2, 1),
            },
            Event::GameStateChanged {
                state: GameState::Playing,
            },
        ]
    );
    assert!(!query::player_caught(&world));
}

#[test]
fn clearing_the_last_beast_completes_the_level_without_a_death() {
    let mut world = load("#####\n#PH##\n#####\n");

    let mut events = move_player(&mut world, Direction::East);
    events.extend(apply_all(&mut world, [Command::ResolveTick]));

    assert!(events.contains(&Event::LevelCompleted));
    assert!(!events
        .iter()
        .any(|event| matches!(event, Event::PlayerDied { .. })));
    assert!(query::game_state(&world).is_terminal());
    assert_eq!(query::lives(&world), 3);
}

#[test]
fn numbered_levels_raise_the_final_total() {
    let mut level = LevelDescription::from_ascii("numbered", "#####\n#PH##\n#####\n")
        .expect("valid level");
    level.number = Some(3);
    let mut world = World::new(&level, Rules::default()).expect("world");

    let _ = move_player(&mut world, Direction::East);
    let _ = apply_all(&mut world, [Command::ResolveTick]);

    let summary = query::summary(&world);
    assert_eq!(summary.level, 3);
    assert_eq!(summary.score, 100);
    assert_eq!(summary.time_bonus, 500);
    assert_eq!(summary.total(), 780);
}

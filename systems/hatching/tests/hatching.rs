use std::time::Duration;

use beast_core::{BeastKind, CellCoord, Command, Event, LevelDescription};
use beast_system_hatching::{Config, Hatching};
use beast_world::{self as world, query, Rules, World};

const TICK: Duration = Duration::from_millis(100);

fn run_tick(world: &mut World, hatching: &mut Hatching) -> Vec<Event> {
    let mut events = Vec::new();
    world::apply(world, Command::Tick { dt: TICK }, &mut events);
    let mut commands = Vec::new();
    hatching.handle(&events, &query::egg_view(world), &mut commands);
    for command in commands {
        world::apply(world, command, &mut events);
    }
    events
}

#[test]
fn egg_hatches_in_place_after_duration() {
    let level = LevelDescription::from_ascii("nest", "P....\n..E..\n").expect("valid level");
    let mut world = World::new(&level, Rules::default()).expect("world");
    let mut hatching = Hatching::new(Config::new(Duration::from_secs(1)));
    assert_eq!(query::remaining_beasts(&world), 0);

    for _ in 0..9 {
        let events = run_tick(&mut world, &mut hatching);
        assert!(!events
            .iter()
            .any(|event| matches!(event, Event::EggHatched { .. })));
    }
    assert_eq!(query::egg_view(&world).len(), 1);

    let events = run_tick(&mut world, &mut hatching);
    assert!(events
        .iter()
        .any(|event| matches!(event, Event::EggHatched { cell, .. } if *cell == CellCoord::new(2, 1))));

    assert!(query::egg_view(&world).is_empty());
    let beasts = query::beast_view(&world).into_vec();
    assert_eq!(beasts.len(), 1);
    assert_eq!(beasts[0].kind, BeastKind::HatchedBeast);
    assert_eq!(beasts[0].cell, CellCoord::new(2, 1));
    assert_eq!(query::remaining_beasts(&world), 1);
}

#[test]
fn hatched_beasts_receive_fresh_ids() {
    let level = LevelDescription::from_ascii("nest", "PH..\nE..E\n").expect("valid level");
    let mut world = World::new(&level, Rules::default()).expect("world");
    let mut hatching = Hatching::new(Config::new(TICK));

    let events = run_tick(&mut world, &mut hatching);

    let hatched: Vec<_> = events
        .iter()
        .filter_map(|event| match event {
            Event::EggHatched { beast_id, .. } => Some(beast_id.get()),
            _ => None,
        })
        .collect();
    assert_eq!(hatched, vec![1, 2]);
    assert_eq!(query::remaining_beasts(&world), 3);
}

#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Hatching system that turns ripe eggs into beasts.

use std::time::Duration;

use beast_core::{Command, EggView, Event};

const DEFAULT_HATCH_DURATION: Duration = Duration::from_secs(10);

/// Configuration parameters required to construct the hatching system.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    hatch_duration: Duration,
}

impl Config {
    /// Creates a new configuration with the provided incubation time.
    #[must_use]
    pub const fn new(hatch_duration: Duration) -> Self {
        Self { hatch_duration }
    }

    /// Simulated time an egg needs before it hatches.
    #[must_use]
    pub const fn hatch_duration(&self) -> Duration {
        self.hatch_duration
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(DEFAULT_HATCH_DURATION)
    }
}

/// Pure system that emits hatch commands for eggs past their incubation time.
#[derive(Debug)]
pub struct Hatching {
    hatch_duration: Duration,
}

impl Hatching {
    /// Creates a new hatching system using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            hatch_duration: config.hatch_duration,
        }
    }

    /// Emits one hatch command per ripe egg once time has advanced.
    pub fn handle(&mut self, events: &[Event], egg_view: &EggView, out: &mut Vec<Command>) {
        if !events
            .iter()
            .any(|event| matches!(event, Event::TimeAdvanced { .. }))
        {
            return;
        }

        out.extend(
            egg_view
                .iter()
                .filter(|egg| egg.age >= self.hatch_duration)
                .map(|egg| Command::HatchEgg { egg_id: egg.id }),
        );
    }
}

impl Default for Hatching {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use beast_core::{CellCoord, EggId, EggSnapshot};

    fn eggs(ages: &[u64]) -> EggView {
        EggView::from_snapshots(
            ages.iter()
                .zip(0u32..)
                .map(|(age, id)| EggSnapshot {
                    id: EggId::new(id),
                    cell: CellCoord::new(id, 0),
                    age: Duration::from_millis(*age),
                })
                .collect(),
        )
    }

    #[test]
    fn only_ripe_eggs_hatch() {
        let mut hatching = Hatching::new(Config::new(Duration::from_secs(2)));
        let mut commands = Vec::new();
        hatching.handle(
            &[Event::TimeAdvanced {
                dt: Duration::from_millis(100),
            }],
            &eggs(&[1_999, 2_000, 5_000]),
            &mut commands,
        );
        assert_eq!(
            commands,
            vec![
                Command::HatchEgg {
                    egg_id: EggId::new(1)
                },
                Command::HatchEgg {
                    egg_id: EggId::new(2)
                },
            ]
        );
    }

    #[test]
    fn idle_without_time_advancing() {
        let mut hatching = Hatching::new(Config::default());
        let mut commands = Vec::new();
        hatching.handle(&[], &eggs(&[60_000]), &mut commands);
        assert!(commands.is_empty());
    }
}

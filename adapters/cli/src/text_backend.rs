//! Headless rendering backend that prints scenes as ASCII.

use std::{collections::VecDeque, io::Write, time::Duration};

use anyhow::{Context, Result};
use beast_core::{ActorKind, BeastKind, CellTag, Terrain};
use beast_rendering::{FrameControl, FrameInput, Presentation, RenderingBackend, Scene};

/// Drives a scripted session for a fixed number of frames.
#[derive(Debug)]
pub(crate) struct TextBackend<W> {
    out: W,
    max_frames: usize,
    frame_dt: Duration,
    script: VecDeque<FrameInput>,
    show_frames: bool,
}

impl<W: Write> TextBackend<W> {
    pub(crate) fn new(
        out: W,
        max_frames: usize,
        frame_dt: Duration,
        script: Vec<FrameInput>,
        show_frames: bool,
    ) -> Self {
        Self {
            out,
            max_frames,
            frame_dt,
            script: script.into(),
            show_frames,
        }
    }
}

impl<W: Write> RenderingBackend for TextBackend<W> {
    fn run<F>(mut self, presentation: Presentation, mut update_scene: F) -> Result<()>
    where
        F: FnMut(Duration, FrameInput, &mut Scene) -> Result<FrameControl>,
    {
        let Presentation {
            window_title,
            mut scene,
            ..
        } = presentation;
        writeln!(self.out, "{window_title}").context("failed to write title")?;

        for frame in 0..self.max_frames {
            let input = self.script.pop_front().unwrap_or_default();
            let control = update_scene(self.frame_dt, input, &mut scene)
                .with_context(|| format!("failed to update frame {frame}"))?;
            if self.show_frames {
                writeln!(self.out, "-- frame {frame}").context("failed to write frame")?;
                self.out
                    .write_all(render_scene(&scene).as_bytes())
                    .context("failed to write frame")?;
            }
            if control == FrameControl::Exit {
                break;
            }
        }

        if !self.show_frames {
            self.out
                .write_all(render_scene(&scene).as_bytes())
                .context("failed to write final frame")?;
        }
        self.out.flush().context("failed to flush output")
    }
}

/// Draws the scene as one line per row followed by the HUD.
pub(crate) fn render_scene(scene: &Scene) -> String {
    let grid = &scene.tile_grid;
    let width = grid.columns as usize;
    let mut glyphs = vec![CellTag::Empty.glyph(); width * grid.rows as usize];

    for tile in &scene.tiles {
        let index = tile.cell.row() as usize * width + tile.cell.column() as usize;
        if let Some(glyph) = glyphs.get_mut(index) {
            *glyph = terrain_tag(tile.terrain).glyph();
        }
    }
    for sprite in &scene.sprites {
        let Some(cell) = grid.world_to_cell(sprite.position) else {
            continue;
        };
        let index = cell.row() as usize * width + cell.column() as usize;
        if let Some(glyph) = glyphs.get_mut(index) {
            *glyph = actor_tag(sprite.actor).glyph();
        }
    }

    let mut text = String::with_capacity(glyphs.len() + grid.rows as usize + 64);
    for row in glyphs.chunks(width.max(1)) {
        text.extend(row.iter());
        text.push('\n');
    }
    text.push_str(&scene.hud.status_line());
    text.push('\n');
    text
}

const fn terrain_tag(terrain: Terrain) -> CellTag {
    match terrain {
        Terrain::Empty => CellTag::Empty,
        Terrain::Wall => CellTag::Wall,
        Terrain::Block => CellTag::Block,
    }
}

const fn actor_tag(actor: ActorKind) -> CellTag {
    match actor {
        ActorKind::Player => CellTag::Player,
        ActorKind::Beast(BeastKind::Beast) => CellTag::Beast,
        ActorKind::Beast(BeastKind::SuperBeast) => CellTag::SuperBeast,
        ActorKind::Beast(BeastKind::HatchedBeast) => CellTag::HatchedBeast,
        ActorKind::Egg => CellTag::Egg,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use beast_core::{Direction, LevelDescription};
    use beast_rendering::{Color, Palette};
    use beast_world::{query, Rules, World};

    const MAP: &str = "#####\n#P.H#\n#.BE#\n#####\n";

    fn scene() -> Scene {
        let level = LevelDescription::from_ascii("text", MAP).expect("valid level");
        let world = World::new(&level, Rules::default()).expect("world");
        Scene::from_snapshot(&query::snapshot(&world), &Palette::default(), 8.0).expect("scene")
    }

    #[test]
    fn renders_the_initial_map_back_to_ascii() {
        let text = render_scene(&scene());
        assert_eq!(
            text,
            format!("{MAP}score 0 | lives 3 | beasts 1 | playing\n")
        );
    }

    #[test]
    fn backend_feeds_scripted_input_and_stops_on_exit() {
        let presentation = Presentation::new("Beast - text", Color::from_hex(0), scene());
        let script = vec![
            FrameInput {
                direction: Some(Direction::East),
                ..FrameInput::default()
            },
            FrameInput::default(),
        ];
        let mut output = Vec::new();
        let mut seen = Vec::new();

        TextBackend::new(&mut output, 10, Duration::from_millis(50), script, true)
            .run(presentation, |dt, input, _scene| {
                seen.push((dt, input.direction));
                Ok(if seen.len() == 3 {
                    FrameControl::Exit
                } else {
                    FrameControl::Continue
                })
            })
            .expect("backend runs");

        assert_eq!(
            seen,
            vec![
                (Duration::from_millis(50), Some(Direction::East)),
                (Duration::from_millis(50), None),
                (Duration::from_millis(50), None),
            ]
        );
        let output = String::from_utf8(output).expect("utf-8 output");
        assert!(output.starts_with("Beast - text\n-- frame 0\n"));
        assert!(output.contains("-- frame 2\n"));
        assert!(!output.contains("-- frame 3\n"));
    }

    #[test]
    fn update_errors_carry_the_frame_number() {
        let presentation = Presentation::new("Beast", Color::from_hex(0), scene());
        let error = TextBackend::new(Vec::new(), 5, Duration::from_millis(10), Vec::new(), false)
            .run(presentation, |_, _, _| Err(anyhow::anyhow!("boom")))
            .expect_err("update failure propagates");
        assert_eq!(error.to_string(), "failed to update frame 0");
    }
}

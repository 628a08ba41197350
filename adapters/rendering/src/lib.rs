#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared rendering contracts for Beast adapters.

use anyhow::Result as AnyResult;
use beast_core::{ActorKind, BeastKind, CellCoord, Direction, GameState, Terrain, WorldSnapshot};
use glam::Vec2;
use std::time::Duration;
use thiserror::Error;

/// RGBA color used when presenting frames.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    /// Red channel intensity in the range 0.0..=1.0.
    pub red: f32,
    /// Green channel intensity in the range 0.0..=1.0.
    pub green: f32,
    /// Blue channel intensity in the range 0.0..=1.0.
    pub blue: f32,
    /// Alpha channel intensity in the range 0.0..=1.0.
    pub alpha: f32,
}

impl Color {
    /// Creates a new color from floating point channels.
    #[must_use]
    pub const fn new(red: f32, green: f32, blue: f32, alpha: f32) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Creates an opaque color from byte RGB values.
    #[must_use]
    pub const fn from_rgb_u8(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red: red as f32 / 255.0,
            green: green as f32 / 255.0,
            blue: blue as f32 / 255.0,
            alpha: 1.0,
        }
    }

    /// Creates an opaque color from a packed `0xRRGGBB` value.
    #[must_use]
    pub const fn from_hex(rgb: u32) -> Self {
        Self::from_rgb_u8((rgb >> 16) as u8, (rgb >> 8) as u8, rgb as u8)
    }

    /// Returns a new color lightened towards white by the provided amount.
    #[must_use]
    pub fn lighten(self, amount: f32) -> Self {
        let amount = amount.clamp(0.0, 1.0);

        Self {
            red: lighten_channel(self.red, amount),
            green: lighten_channel(self.green, amount),
            blue: lighten_channel(self.blue, amount),
            alpha: self.alpha,
        }
    }
}

fn lighten_channel(channel: f32, amount: f32) -> f32 {
    channel + (1.0 - channel) * amount
}

/// Colors assigned to every terrain type and actor.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Palette {
    /// Open floor.
    pub empty: Color,
    /// Immovable walls.
    pub wall: Color,
    /// Pushable blocks.
    pub block: Color,
    /// The player.
    pub player: Color,
    /// Regular beasts.
    pub beast: Color,
    /// Super beasts.
    pub super_beast: Color,
    /// Beasts hatched from eggs.
    pub hatched_beast: Color,
    /// Unhatched eggs.
    pub egg: Color,
}

impl Palette {
    /// Color used to fill a terrain cell.
    #[must_use]
    pub const fn terrain(&self, terrain: Terrain) -> Color {
        match terrain {
            Terrain::Empty => self.empty,
            Terrain::Wall => self.wall,
            Terrain::Block => self.block,
        }
    }

    /// Color used to draw an actor sprite.
    #[must_use]
    pub const fn actor(&self, actor: ActorKind) -> Color {
        match actor {
            ActorKind::Player => self.player,
            ActorKind::Beast(BeastKind::Beast) => self.beast,
            ActorKind::Beast(BeastKind::SuperBeast) => self.super_beast,
            ActorKind::Beast(BeastKind::HatchedBeast) => self.hatched_beast,
            ActorKind::Egg => self.egg,
        }
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            empty: Color::from_hex(0x000000),
            wall: Color::from_hex(0xeab308),
            block: Color::from_hex(0x1a472a),
            player: Color::from_hex(0x3b82f6),
            beast: Color::from_hex(0xef4444),
            super_beast: Color::from_hex(0x9333ea),
            hatched_beast: Color::from_hex(0xff8800),
            egg: Color::from_hex(0xeab308),
        }
    }
}

/// Input gathered by adapters before updating the scene.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct FrameInput {
    /// Movement requested by the player on this frame, if any.
    pub direction: Option<Direction>,
    /// Whether the player asked to respawn after a death.
    pub respawn: bool,
    /// Whether the player asked to restart the level.
    pub restart: bool,
}

/// Signals whether a backend should keep presenting frames.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameControl {
    /// Render the updated scene and request another frame.
    Continue,
    /// Stop after rendering the updated scene.
    Exit,
}

/// Geometry of the cell grid expressed in world units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TileGridPresentation {
    /// Number of columns contained in the grid.
    pub columns: u32,
    /// Number of rows contained in the grid.
    pub rows: u32,
    /// Side length of a single cell expressed in world units.
    pub tile_length: f32,
    /// Color used when drawing grid lines.
    pub line_color: Color,
}

impl TileGridPresentation {
    /// Creates a new tile grid descriptor.
    ///
    /// Returns an error when `tile_length` is not a positive finite number.
    pub fn new(
        columns: u32,
        rows: u32,
        tile_length: f32,
        line_color: Color,
    ) -> Result<Self, RenderingError> {
        if !tile_length.is_finite() || tile_length <= 0.0 {
            return Err(RenderingError::InvalidTileLength { tile_length });
        }

        Ok(Self {
            columns,
            rows,
            tile_length,
            line_color,
        })
    }

    /// Calculates the total width of the grid.
    #[must_use]
    pub fn width(&self) -> f32 {
        self.columns as f32 * self.tile_length
    }

    /// Calculates the total height of the grid.
    #[must_use]
    pub fn height(&self) -> f32 {
        self.rows as f32 * self.tile_length
    }

    /// World position of the top-left corner of a cell.
    #[must_use]
    pub fn cell_origin(&self, cell: CellCoord) -> Vec2 {
        Vec2::new(cell.column() as f32, cell.row() as f32) * self.tile_length
    }

    /// World position of the centre of a cell.
    #[must_use]
    pub fn cell_center(&self, cell: CellCoord) -> Vec2 {
        self.cell_origin(cell) + Vec2::splat(self.tile_length * 0.5)
    }

    /// Cell containing the provided world position, or `None` outside the grid.
    #[must_use]
    pub fn world_to_cell(&self, position: Vec2) -> Option<CellCoord> {
        if position.x < 0.0 || position.y < 0.0 {
            return None;
        }
        let scaled = (position / self.tile_length).floor();
        let column = scaled.x as u32;
        let row = scaled.y as u32;
        if column >= self.columns || row >= self.rows {
            return None;
        }
        Some(CellCoord::new(column, row))
    }
}

/// Terrain cell filled with its palette color.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TilePresentation {
    /// Grid cell covered by the tile.
    pub cell: CellCoord,
    /// Terrain occupying the cell.
    pub terrain: Terrain,
    /// Fill color.
    pub color: Color,
}

/// Actor drawn on top of the terrain.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpritePresentation {
    /// Grid cell the actor occupies.
    pub cell: CellCoord,
    /// Centre of the sprite in world units.
    pub position: Vec2,
    /// Actor drawn by the sprite.
    pub actor: ActorKind,
    /// Fill color.
    pub color: Color,
}

/// Status values shown next to the board.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HudPresentation {
    /// Cumulative score.
    pub score: u64,
    /// Lives left.
    pub lives: u32,
    /// Beasts still to defeat.
    pub remaining_beasts: u32,
    /// Coarse game state.
    pub state: GameState,
}

impl HudPresentation {
    /// Single-line textual summary of the HUD.
    #[must_use]
    pub fn status_line(&self) -> String {
        let state = match self.state {
            GameState::Playing => "playing",
            GameState::PausedAfterDeath => "caught",
            GameState::GameOver => "game over",
            GameState::LevelComplete => "level complete",
        };
        format!(
            "score {} | lives {} | beasts {} | {state}",
            self.score, self.lives, self.remaining_beasts
        )
    }
}

/// Scene description combining the tile grid, terrain, actors and HUD.
#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
    /// Grid geometry.
    pub tile_grid: TileGridPresentation,
    /// Terrain tiles in row-major order.
    pub tiles: Vec<TilePresentation>,
    /// Actors ordered back to front: eggs, the player, then beasts.
    pub sprites: Vec<SpritePresentation>,
    /// Status values.
    pub hud: HudPresentation,
}

impl Scene {
    /// Builds a scene from a world snapshot.
    pub fn from_snapshot(
        snapshot: &WorldSnapshot,
        palette: &Palette,
        tile_length: f32,
    ) -> Result<Self, RenderingError> {
        let tile_grid = TileGridPresentation::new(
            snapshot.columns,
            snapshot.rows,
            tile_length,
            palette.empty.lighten(0.2),
        )?;
        let mut scene = Self {
            tile_grid,
            tiles: Vec::new(),
            sprites: Vec::new(),
            hud: hud(snapshot),
        };
        scene.update(snapshot, palette)?;
        Ok(scene)
    }

    /// Replaces the scene contents with a newer snapshot of the same level.
    pub fn update(
        &mut self,
        snapshot: &WorldSnapshot,
        palette: &Palette,
    ) -> Result<(), RenderingError> {
        let expected = snapshot.columns as usize * snapshot.rows as usize;
        if snapshot.terrain.len() != expected {
            return Err(RenderingError::TerrainSizeMismatch {
                expected,
                actual: snapshot.terrain.len(),
            });
        }
        self.tile_grid.columns = snapshot.columns;
        self.tile_grid.rows = snapshot.rows;

        self.tiles.clear();
        let columns = snapshot.columns.max(1);
        self.tiles
            .extend(snapshot.terrain.iter().zip(0u32..).map(|(terrain, index)| {
                TilePresentation {
                    cell: CellCoord::new(index % columns, index / columns),
                    terrain: *terrain,
                    color: palette.terrain(*terrain),
                }
            }));

        let grid = self.tile_grid;
        let sprite = |cell: CellCoord, actor: ActorKind| SpritePresentation {
            cell,
            position: grid.cell_center(cell),
            actor,
            color: palette.actor(actor),
        };
        self.sprites.clear();
        self.sprites.extend(
            snapshot
                .eggs
                .iter()
                .map(|egg| sprite(egg.cell, ActorKind::Egg)),
        );
        self.sprites
            .push(sprite(snapshot.player, ActorKind::Player));
        self.sprites.extend(
            snapshot
                .beasts
                .iter()
                .map(|beast| sprite(beast.cell, ActorKind::Beast(beast.kind))),
        );
        self.hud = hud(snapshot);
        Ok(())
    }

    /// Topmost sprite drawn at the provided cell.
    #[must_use]
    pub fn sprite_at(&self, cell: CellCoord) -> Option<&SpritePresentation> {
        self.sprites.iter().rev().find(|sprite| sprite.cell == cell)
    }
}

fn hud(snapshot: &WorldSnapshot) -> HudPresentation {
    HudPresentation {
        score: snapshot.score,
        lives: snapshot.lives,
        remaining_beasts: snapshot.remaining_beasts,
        state: snapshot.state,
    }
}

/// Presentation descriptor consumed by rendering backends.
#[derive(Clone, Debug, PartialEq)]
pub struct Presentation {
    /// Title shown by the backend.
    pub window_title: String,
    /// Solid color used to clear each frame.
    pub clear_color: Color,
    /// Scene content that should be displayed.
    pub scene: Scene,
}

impl Presentation {
    /// Constructs a new presentation descriptor.
    #[must_use]
    pub fn new<T>(window_title: T, clear_color: Color, scene: Scene) -> Self
    where
        T: Into<String>,
    {
        Self {
            window_title: window_title.into(),
            clear_color,
            scene,
        }
    }
}

/// Rendering backend capable of presenting Beast scenes.
pub trait RenderingBackend {
    /// Runs the rendering backend until the update closure asks it to stop.
    ///
    /// The provided `update_scene` closure receives the frame delta and the
    /// input captured by the backend, and refreshes the scene from the
    /// simulation before it is drawn.
    fn run<F>(self, presentation: Presentation, update_scene: F) -> AnyResult<()>
    where
        F: FnMut(Duration, FrameInput, &mut Scene) -> AnyResult<FrameControl>;
}

/// Errors that can occur when constructing rendering descriptors.
#[derive(Debug, Error, PartialEq)]
pub enum RenderingError {
    /// Cells must have a positive finite side length.
    #[error("tile_length must be positive and finite (received {tile_length})")]
    InvalidTileLength {
        /// Provided length that failed validation.
        tile_length: f32,
    },
    /// The snapshot terrain does not cover the declared grid.
    #[error("snapshot holds {actual} terrain cells but the grid needs {expected}")]
    TerrainSizeMismatch {
        /// Cells implied by the snapshot dimensions.
        expected: usize,
        /// Cells actually present.
        actual: usize,
    },
}

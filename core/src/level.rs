//! Level descriptions supplied by the surrounding application.
//!
//! A description is the flat, external view of a level: a row-major grid of
//! [`CellTag`] values plus declared entity counts and a speed multiplier. It
//! can be decoded from the JSON documents produced by the level editor or from
//! compact ASCII maps.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{BeastKind, CellCoord, Terrain};

/// Smallest accepted speed multiplier.
pub const MIN_GAME_SPEED: f32 = 0.1;

/// Largest accepted speed multiplier.
pub const MAX_GAME_SPEED: f32 = 5.0;

const DEFAULT_LEVEL_NAME: &str = "Untitled";

/// Flat tag describing the initial content of a single cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CellTag {
    /// Starting cell of the player.
    Player,
    /// Regular beast.
    Beast,
    /// Super beast.
    SuperBeast,
    /// Beast that starts out already hatched.
    HatchedBeast,
    /// Egg that hatches after a delay.
    Egg,
    /// Pushable block.
    Block,
    /// Immovable wall.
    Wall,
    /// Open floor.
    #[default]
    Empty,
}

impl CellTag {
    /// Decodes a single ASCII map glyph.
    #[must_use]
    pub const fn from_glyph(glyph: char) -> Option<Self> {
        let tag = match glyph {
            '#' => Self::Wall,
            '.' | ' ' => Self::Empty,
            'P' => Self::Player,
            'H' => Self::Beast,
            'S' => Self::SuperBeast,
            'X' => Self::HatchedBeast,
            'E' => Self::Egg,
            'B' => Self::Block,
            _ => return None,
        };
        Some(tag)
    }

    /// Glyph used when writing the tag back into an ASCII map.
    #[must_use]
    pub const fn glyph(self) -> char {
        match self {
            Self::Wall => '#',
            Self::Empty => '.',
            Self::Player => 'P',
            Self::Beast => 'H',
            Self::SuperBeast => 'S',
            Self::HatchedBeast => 'X',
            Self::Egg => 'E',
            Self::Block => 'B',
        }
    }

    /// Terrain left in the cell once actors are lifted off the grid.
    #[must_use]
    pub const fn terrain(self) -> Terrain {
        match self {
            Self::Wall => Terrain::Wall,
            Self::Block => Terrain::Block,
            _ => Terrain::Empty,
        }
    }

    /// Beast subtype spawned by the tag, if any.
    #[must_use]
    pub const fn beast_kind(self) -> Option<BeastKind> {
        match self {
            Self::Beast => Some(BeastKind::Beast),
            Self::SuperBeast => Some(BeastKind::SuperBeast),
            Self::HatchedBeast => Some(BeastKind::HatchedBeast),
            _ => None,
        }
    }
}

/// Errors raised while decoding or validating a level description.
#[derive(Debug, Error)]
pub enum LevelError {
    /// Width or height is zero.
    #[error("level dimensions must be non-zero, got {width}x{height}")]
    ZeroDimensions {
        /// Declared width.
        width: u32,
        /// Declared height.
        height: u32,
    },
    /// The map does not have `height` rows.
    #[error("map has {actual} rows but the level declares a height of {expected}")]
    RowCountMismatch {
        /// Declared height.
        expected: u32,
        /// Rows present in the map.
        actual: usize,
    },
    /// A map row does not have `width` cells.
    #[error("map row {row} has {actual} cells but the level declares a width of {expected}")]
    ColumnCountMismatch {
        /// Zero-based row index.
        row: usize,
        /// Declared width.
        expected: u32,
        /// Cells present in the row.
        actual: usize,
    },
    /// No cell is tagged as the player.
    #[error("level has no player start")]
    MissingPlayer,
    /// More than one cell is tagged as the player.
    #[error("level has more than one player start (second at column {column}, row {row})")]
    MultiplePlayers {
        /// Column of the second player tag.
        column: u32,
        /// Row of the second player tag.
        row: u32,
    },
    /// An ASCII map contains a glyph with no meaning.
    #[error("unknown map glyph {glyph:?} at column {column}, row {row}")]
    UnknownGlyph {
        /// Offending character.
        glyph: char,
        /// Column of the glyph.
        column: usize,
        /// Zero-based line of the glyph in the source text.
        row: usize,
    },
    /// The JSON document could not be decoded.
    #[error("malformed level document")]
    Json(#[from] serde_json::Error),
}

/// Immutable description of a level as supplied by the host application.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelDescription {
    /// Display name of the level.
    #[serde(default = "default_name")]
    pub name: String,
    /// Number of columns.
    pub width: u32,
    /// Number of rows.
    pub height: u32,
    /// Row-major cell tags, one inner vector per row.
    pub map: Vec<Vec<CellTag>>,
    /// Declared number of regular beasts.
    #[serde(default)]
    pub beasts: u32,
    /// Declared number of super beasts.
    #[serde(default)]
    pub super_beasts: u32,
    /// Declared number of eggs.
    #[serde(default)]
    pub eggs: u32,
    /// Simulation speed multiplier.
    #[serde(default = "default_speed")]
    pub game_speed: f32,
    /// Campaign position of the level. Each step adds 10% to the final score.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<u32>,
}

fn default_name() -> String {
    DEFAULT_LEVEL_NAME.to_owned()
}

fn default_speed() -> f32 {
    1.0
}

impl LevelDescription {
    /// Decodes and validates a JSON level document.
    pub fn from_json(text: &str) -> Result<Self, LevelError> {
        let description: Self = serde_json::from_str(text)?;
        description.validate()?;
        Ok(description)
    }

    /// Decodes and validates an ASCII map.
    ///
    /// Empty lines are ignored while spaces are empty cells. Declared entity
    /// counts are derived from the glyphs and the speed multiplier defaults
    /// to `1.0`.
    pub fn from_ascii(name: &str, text: &str) -> Result<Self, LevelError> {
        let mut map = Vec::new();
        for (row, line) in text.lines().enumerate() {
            let line = line.trim_end_matches('\r');
            if line.is_empty() {
                continue;
            }
            let mut cells = Vec::with_capacity(line.len());
            for (column, glyph) in line.chars().enumerate() {
                let tag = CellTag::from_glyph(glyph).ok_or(LevelError::UnknownGlyph {
                    glyph,
                    column,
                    row,
                })?;
                cells.push(tag);
            }
            map.push(cells);
        }

        let height = u32::try_from(map.len()).unwrap_or(u32::MAX);
        let width = map
            .first()
            .map_or(0, |row| u32::try_from(row.len()).unwrap_or(u32::MAX));
        let count = |wanted: CellTag| -> u32 {
            let total = map.iter().flatten().filter(|tag| **tag == wanted).count();
            u32::try_from(total).unwrap_or(u32::MAX)
        };

        let description = Self {
            name: if name.is_empty() {
                default_name()
            } else {
                name.to_owned()
            },
            width,
            height,
            beasts: count(CellTag::Beast),
            super_beasts: count(CellTag::SuperBeast),
            eggs: count(CellTag::Egg),
            game_speed: default_speed(),
            number: None,
            map,
        };
        description.validate()?;
        Ok(description)
    }

    /// Renders the map as ASCII, one line per row.
    #[must_use]
    pub fn to_ascii(&self) -> String {
        let mut text = String::new();
        for row in &self.map {
            text.extend(row.iter().map(|tag| tag.glyph()));
            text.push('\n');
        }
        text
    }

    /// Checks dimensions and the single-player requirement.
    pub fn validate(&self) -> Result<(), LevelError> {
        if self.width == 0 || self.height == 0 {
            return Err(LevelError::ZeroDimensions {
                width: self.width,
                height: self.height,
            });
        }
        if self.map.len() != self.height as usize {
            return Err(LevelError::RowCountMismatch {
                expected: self.height,
                actual: self.map.len(),
            });
        }
        for (row, cells) in self.map.iter().enumerate() {
            if cells.len() != self.width as usize {
                return Err(LevelError::ColumnCountMismatch {
                    row,
                    expected: self.width,
                    actual: cells.len(),
                });
            }
        }

        let mut players = self.cells().filter(|(_, tag)| *tag == CellTag::Player);
        if players.next().is_none() {
            return Err(LevelError::MissingPlayer);
        }
        if let Some((cell, _)) = players.next() {
            return Err(LevelError::MultiplePlayers {
                column: cell.column(),
                row: cell.row(),
            });
        }
        Ok(())
    }

    /// Speed multiplier clamped to the supported range.
    #[must_use]
    pub fn speed(&self) -> f32 {
        if self.game_speed.is_finite() {
            self.game_speed.clamp(MIN_GAME_SPEED, MAX_GAME_SPEED)
        } else {
            1.0
        }
    }

    /// Iterates every cell with its tag in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = (CellCoord, CellTag)> + '_ {
        self.map.iter().zip(0u32..).flat_map(|(cells, row)| {
            cells
                .iter()
                .zip(0u32..)
                .map(move |(tag, column)| (CellCoord::new(column, row), *tag))
        })
    }
}

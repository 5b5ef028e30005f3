//! Text grid parsing for authored level layouts.

use beatcrawl_core::{CellCoord, EnemyKind, EntityRole, Item, TileKind, WallShape};
use thiserror::Error;

/// Errors that abort level construction.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum LevelError {
    /// The grid description contained no rows or only empty rows.
    #[error("level grid is empty")]
    EmptyGrid,
    /// A row's width differs from the first row's width.
    #[error("row {row} is {found} columns wide; expected {expected}")]
    RaggedRow {
        /// Zero-based index of the offending row.
        row: u32,
        /// Width established by the first row.
        expected: u32,
        /// Width found on the offending row.
        found: u32,
    },
    /// The grid contained a character with no tile or entity meaning.
    #[error("unknown character '{character}' at ({column}, {row})")]
    UnknownCharacter {
        /// Character that could not be interpreted.
        character: char,
        /// Column where the character appeared.
        column: u32,
        /// Row where the character appeared.
        row: u32,
    },
    /// The grid placed more than one player.
    #[error("second player at ({column}, {row}); a level holds at most one player")]
    DuplicatePlayer {
        /// Column of the second player marker.
        column: u32,
        /// Row of the second player marker.
        row: u32,
    },
}

/// Entity authored into the level grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Placement {
    /// Role of the placed entity.
    pub role: EntityRole,
    /// Cell the entity starts on.
    pub cell: CellCoord,
}

/// Parsed, not yet contextualized, level description.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Level {
    width: u32,
    height: u32,
    tiles: Vec<TileKind>,
    placements: Vec<Placement>,
    player_items: Vec<Item>,
}

impl Level {
    /// Parses a rectangular character grid.
    ///
    /// Entity markers are replaced with empty floor and recorded as
    /// placements in row-major order, which later fixes their identifiers.
    pub fn parse<S: AsRef<str>>(rows: &[S]) -> Result<Self, LevelError> {
        let expected = rows
            .first()
            .map(|row| row.as_ref().chars().count())
            .unwrap_or(0);
        if expected == 0 {
            return Err(LevelError::EmptyGrid);
        }

        let width = to_u32(expected);
        let height = to_u32(rows.len());
        let mut tiles = Vec::with_capacity(expected * rows.len());
        let mut placements = Vec::new();
        let mut has_player = false;

        for (row_index, row) in rows.iter().enumerate() {
            let row_index = to_u32(row_index);
            let found = to_u32(row.as_ref().chars().count());
            if found != width {
                return Err(LevelError::RaggedRow {
                    row: row_index,
                    expected: width,
                    found,
                });
            }

            for (column, character) in row.as_ref().chars().enumerate() {
                let column = to_u32(column);
                if let Some(tile) = tile_for(character) {
                    tiles.push(tile);
                    continue;
                }

                let Some(role) = role_for(character) else {
                    return Err(LevelError::UnknownCharacter {
                        character,
                        column,
                        row: row_index,
                    });
                };

                if role == EntityRole::Player {
                    if has_player {
                        return Err(LevelError::DuplicatePlayer {
                            column,
                            row: row_index,
                        });
                    }
                    has_player = true;
                }

                tiles.push(TileKind::Empty);
                placements.push(Placement {
                    role,
                    cell: CellCoord::new(column, row_index),
                });
            }
        }

        Ok(Self {
            width,
            height,
            tiles,
            placements,
            player_items: Vec::new(),
        })
    }

    /// Sets the items the player starts the level with.
    #[must_use]
    pub fn with_player_items(mut self, items: Vec<Item>) -> Self {
        self.player_items = items;
        self
    }

    /// Number of columns in the grid.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Number of rows in the grid.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Authored tiles in row-major order.
    #[must_use]
    pub fn tiles(&self) -> &[TileKind] {
        &self.tiles
    }

    /// Entities authored into the grid, in scan order.
    #[must_use]
    pub fn placements(&self) -> &[Placement] {
        &self.placements
    }

    /// Items granted to the player at load time.
    #[must_use]
    pub fn player_items(&self) -> &[Item] {
        &self.player_items
    }
}

fn tile_for(character: char) -> Option<TileKind> {
    let tile = match character {
        '.' => TileKind::Empty,
        '#' => TileKind::Wall(WallShape::Plain),
        '%' => TileKind::Wall(WallShape::BackWall),
        '[' => TileKind::Wall(WallShape::LeftVertical),
        ']' => TileKind::Wall(WallShape::RightVertical),
        '<' => TileKind::Wall(WallShape::FrontCornerLeft),
        '>' => TileKind::Wall(WallShape::FrontCornerRight),
        '{' => TileKind::Wall(WallShape::BackCornerLeft),
        '}' => TileKind::Wall(WallShape::BackCornerRight),
        'o' => TileKind::Pit(WallShape::Plain),
        '_' => TileKind::Pit(WallShape::BackWall),
        _ => return None,
    };
    Some(tile)
}

fn role_for(character: char) -> Option<EntityRole> {
    let role = match character {
        'p' => EntityRole::Player,
        's' => EntityRole::Enemy(EnemyKind::Snake),
        'r' => EntityRole::Enemy(EnemyKind::Rat),
        'k' => EntityRole::Key,
        'd' => EntityRole::Door { open: false },
        'X' => EntityRole::Exit,
        _ => return None,
    };
    Some(role)
}

fn to_u32(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

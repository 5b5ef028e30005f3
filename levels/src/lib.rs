#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Puzzle catalogue and construction of the world, timeline and palette for
//! a selected puzzle.
//!
//! Catalogues are TOML documents holding a `version` field and a list of
//! `[[puzzle]]` tables. Every puzzle is validated as soon as the catalogue is
//! parsed, so a loaded [`Catalog`] only ever hands out buildable puzzles.

use std::collections::BTreeSet;

use beatcrawl_core::{Input, Item};
use beatcrawl_system_timeline::{Palette, Timeline, Track, TrackColor};
use beatcrawl_world::{Level, LevelError, World};
use log::info;
use serde::Deserialize;
use thiserror::Error;

const SUPPORTED_CATALOG_VERSION: u32 = 1;
const BUILTIN_CATALOG: &str = include_str!("../puzzles.toml");

const TRACK_STYLES: [(&str, TrackColor); 3] = [
    ("A", TrackColor::from_rgb(0x99, 0x55, 0x55)),
    ("B", TrackColor::from_rgb(0x55, 0x99, 0x55)),
    ("C", TrackColor::from_rgb(0x55, 0x55, 0x99)),
];

/// Errors raised while loading a puzzle catalogue.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The document is not valid catalogue TOML.
    #[error("failed to parse puzzle catalogue")]
    Parse(#[from] toml::de::Error),
    /// The catalogue declares a version this build cannot read.
    #[error("unsupported catalogue version {found}; expected {expected}")]
    UnsupportedVersion {
        /// Version found in the document.
        found: u32,
        /// Version this build reads.
        expected: u32,
    },
    /// Two puzzles share a name.
    #[error("puzzle `{0}` is defined more than once")]
    DuplicatePuzzle(String),
    /// No puzzle carries the requested name.
    #[error("no puzzle named `{0}`")]
    UnknownPuzzle(String),
    /// The puzzle grid could not be parsed.
    #[error("puzzle `{puzzle}` has an invalid grid")]
    InvalidLevel {
        /// Puzzle whose grid failed.
        puzzle: String,
        /// Parser failure.
        #[source]
        source: LevelError,
    },
    /// The puzzle declares no tracks.
    #[error("puzzle `{0}` declares no tracks")]
    NoTracks(String),
    /// The puzzle declares more tracks than there are track styles.
    #[error("puzzle `{puzzle}` declares {count} tracks; at most {max} are supported")]
    TooManyTracks {
        /// Offending puzzle.
        puzzle: String,
        /// Declared track count.
        count: usize,
        /// Supported track count.
        max: usize,
    },
    /// A track would never advance.
    #[error("track {track} of puzzle `{puzzle}` has zero length")]
    ZeroLengthTrack {
        /// Offending puzzle.
        puzzle: String,
        /// Index of the track.
        track: usize,
    },
    /// A palette sequence has no inputs.
    #[error("sequence {sequence} of puzzle `{puzzle}` is empty")]
    EmptySequence {
        /// Offending puzzle.
        puzzle: String,
        /// Index of the sequence.
        sequence: usize,
    },
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Document {
    version: u32,
    #[serde(default, rename = "puzzle")]
    puzzles: Vec<Puzzle>,
}

/// Authored puzzle: a dungeon grid, its track lengths and its palette.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Puzzle {
    name: String,
    grid: Vec<String>,
    track_lengths: Vec<u32>,
    sequences: Vec<Vec<Input>>,
    #[serde(default)]
    player_items: Vec<Item>,
}

impl Puzzle {
    /// Display name of the puzzle.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Grid rows, top to bottom.
    #[must_use]
    pub fn grid(&self) -> &[String] {
        &self.grid
    }

    /// Loop length of every track, in lane order.
    #[must_use]
    pub fn track_lengths(&self) -> &[u32] {
        &self.track_lengths
    }

    /// Input sequences offered by the palette.
    #[must_use]
    pub fn sequences(&self) -> &[Vec<Input>] {
        &self.sequences
    }

    /// Items the player starts with.
    #[must_use]
    pub fn player_items(&self) -> &[Item] {
        &self.player_items
    }

    /// Parses the grid into a level carrying the puzzle's starting items.
    pub fn level(&self) -> Result<Level, CatalogError> {
        Level::parse(&self.grid)
            .map(|level| level.with_player_items(self.player_items.clone()))
            .map_err(|source| CatalogError::InvalidLevel {
                puzzle: self.name.clone(),
                source,
            })
    }

    /// Builds the initial world for the puzzle.
    pub fn build_world(&self) -> Result<World, CatalogError> {
        let world = World::from_level(&self.level()?);
        info!("loaded puzzle `{}`", self.name);
        Ok(world)
    }

    /// Builds an empty timeline with one styled track per declared length.
    pub fn build_timeline(&self) -> Result<Timeline, CatalogError> {
        self.check_tracks()?;
        let tracks = self
            .track_lengths
            .iter()
            .zip(TRACK_STYLES)
            .map(|(length, (name, color))| Track::new(name, color, *length))
            .collect();
        Ok(Timeline::new(tracks))
    }

    /// Builds the palette holding every authored sequence, none placed.
    #[must_use]
    pub fn build_palette(&self) -> Palette {
        Palette::new(self.sequences.clone())
    }

    fn check_tracks(&self) -> Result<(), CatalogError> {
        if self.track_lengths.is_empty() {
            return Err(CatalogError::NoTracks(self.name.clone()));
        }
        if self.track_lengths.len() > TRACK_STYLES.len() {
            return Err(CatalogError::TooManyTracks {
                puzzle: self.name.clone(),
                count: self.track_lengths.len(),
                max: TRACK_STYLES.len(),
            });
        }
        if let Some(track) = self.track_lengths.iter().position(|length| *length == 0) {
            return Err(CatalogError::ZeroLengthTrack {
                puzzle: self.name.clone(),
                track,
            });
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), CatalogError> {
        self.check_tracks()?;
        if let Some(sequence) = self.sequences.iter().position(Vec::is_empty) {
            return Err(CatalogError::EmptySequence {
                puzzle: self.name.clone(),
                sequence,
            });
        }
        let _ = self.level()?;
        Ok(())
    }
}

/// Validated, ordered collection of puzzles.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Catalog {
    puzzles: Vec<Puzzle>,
}

impl Catalog {
    /// Parses and validates a catalogue document.
    pub fn from_toml(contents: &str) -> Result<Self, CatalogError> {
        let document: Document = toml::from_str(contents)?;
        if document.version != SUPPORTED_CATALOG_VERSION {
            return Err(CatalogError::UnsupportedVersion {
                found: document.version,
                expected: SUPPORTED_CATALOG_VERSION,
            });
        }

        let mut names = BTreeSet::new();
        for puzzle in &document.puzzles {
            if !names.insert(puzzle.name.as_str()) {
                return Err(CatalogError::DuplicatePuzzle(puzzle.name.clone()));
            }
            puzzle.validate()?;
        }

        Ok(Self {
            puzzles: document.puzzles,
        })
    }

    /// Catalogue shipped with the game.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_toml(BUILTIN_CATALOG)
    }

    /// Puzzles in authored order.
    #[must_use]
    pub fn puzzles(&self) -> &[Puzzle] {
        &self.puzzles
    }

    /// Looks up a puzzle by name.
    pub fn get(&self, name: &str) -> Result<&Puzzle, CatalogError> {
        self.puzzles
            .iter()
            .find(|puzzle| puzzle.name == name)
            .ok_or_else(|| CatalogError::UnknownPuzzle(name.to_owned()))
    }
}

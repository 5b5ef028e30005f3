#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Beatcrawl engine.
//!
//! This crate defines the message surface that connects the sequencer, the
//! authoritative world, and pure systems. The playback manager submits
//! [`Command`] values describing desired mutations, the world executes those
//! commands via its `apply` entry point, and then reports [`Event`] values
//! that adapters translate into sound cues or presentation updates. Systems
//! consume immutable snapshots and respond exclusively with new command
//! batches.

use std::ops::Add;

use serde::{Deserialize, Serialize};

/// Symbols that can be authored into a track event, one per beat.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Input {
    /// No-op for the beat.
    Empty,
    /// Step toward decreasing row indices.
    Up,
    /// Step toward increasing row indices.
    Down,
    /// Step toward decreasing column indices.
    Left,
    /// Step toward increasing column indices.
    Right,
    /// Use the currently selected inventory item.
    UseItem,
    /// Rotate the inventory selection to the next item.
    CycleItem,
    /// Spend the turn without moving.
    Wait,
}

impl Input {
    /// Signed unit delta contributed by a directional input.
    #[must_use]
    pub const fn delta(self) -> Option<Delta> {
        match self {
            Self::Up => Some(Delta::new(0, -1)),
            Self::Down => Some(Delta::new(0, 1)),
            Self::Left => Some(Delta::new(-1, 0)),
            Self::Right => Some(Delta::new(1, 0)),
            Self::Empty | Self::UseItem | Self::CycleItem | Self::Wait => None,
        }
    }
}

/// Signed single-step displacement on the grid.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Delta {
    dx: i32,
    dy: i32,
}

impl Delta {
    /// Displacement that leaves an entity where it stands.
    pub const ZERO: Self = Self::new(0, 0);

    /// Creates a new delta from column and row offsets.
    #[must_use]
    pub const fn new(dx: i32, dy: i32) -> Self {
        Self { dx, dy }
    }

    /// Column offset.
    #[must_use]
    pub const fn dx(&self) -> i32 {
        self.dx
    }

    /// Row offset.
    #[must_use]
    pub const fn dy(&self) -> i32 {
        self.dy
    }

    /// Reports whether the delta describes no displacement at all.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.dx == 0 && self.dy == 0
    }
}

impl Add for Delta {
    type Output = Delta;

    fn add(self, rhs: Delta) -> Delta {
        Delta::new(self.dx + rhs.dx, self.dy + rhs.dy)
    }
}

/// Cardinal directions used by enemies when stepping along a path.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Movement toward decreasing row indices.
    North,
    /// Movement toward increasing column indices.
    East,
    /// Movement toward increasing row indices.
    South,
    /// Movement toward decreasing column indices.
    West,
}

impl Direction {
    /// Unit delta travelled when stepping in this direction.
    #[must_use]
    pub const fn delta(self) -> Delta {
        match self {
            Self::North => Delta::new(0, -1),
            Self::East => Delta::new(1, 0),
            Self::South => Delta::new(0, 1),
            Self::West => Delta::new(-1, 0),
        }
    }

    /// Direction that leads from `from` to an orthogonally adjacent `to`.
    #[must_use]
    pub fn between(from: CellCoord, to: CellCoord) -> Option<Self> {
        let column_diff = from.column().abs_diff(to.column());
        let row_diff = from.row().abs_diff(to.row());

        if column_diff + row_diff != 1 {
            return None;
        }

        if column_diff == 1 {
            if to.column() > from.column() {
                Some(Self::East)
            } else {
                Some(Self::West)
            }
        } else if to.row() > from.row() {
            Some(Self::South)
        } else {
            Some(Self::North)
        }
    }
}

/// Stable identifier assigned to an entity when the level is loaded.
///
/// Identifiers survive snapshot round-trips, so systems may hold on to them
/// across beats.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(u32);

impl EntityId {
    /// Creates a new entity identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Location of a single grid cell expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    column: u32,
    row: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Cell reached by applying `delta`, or `None` when it leaves the
    /// non-negative quadrant. Upper bounds are checked by the world.
    #[must_use]
    pub fn offset(self, delta: Delta) -> Option<CellCoord> {
        let column = self.column.checked_add_signed(delta.dx())?;
        let row = self.row.checked_add_signed(delta.dy())?;
        Some(Self::new(column, row))
    }
}

/// Species of hostile entities.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnemyKind {
    /// Snake enemy.
    Snake,
    /// Rat enemy.
    Rat,
}

/// Closed set of behaviours an entity can take part in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityRole {
    /// The entity steered by the sequencer.
    Player,
    /// Hostile entity that chases and attacks the player.
    Enemy(EnemyKind),
    /// Pickup that opens every door when collected.
    Key,
    /// Door that blocks movement until opened.
    Door {
        /// Whether the door has been opened and may be walked through.
        open: bool,
    },
    /// Goal the player is trying to reach.
    Exit,
}

impl EntityRole {
    /// Reports whether other entities may share this entity's cell.
    #[must_use]
    pub const fn is_passable(self) -> bool {
        matches!(self, Self::Door { open: true })
    }

    /// Reports whether the role is hostile.
    #[must_use]
    pub const fn is_enemy(self) -> bool {
        matches!(self, Self::Enemy(_))
    }
}

/// Items the player may carry and use.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Item {
    /// Restores the carrier to full health. Consumed on use.
    Potion,
}

/// Oriented sub-variant selected for walls and pits by contextualization.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WallShape {
    /// Free-standing segment with no particular orientation.
    Plain,
    /// Upper-left corner seen from the front.
    BackCornerLeft,
    /// Upper-right corner seen from the front.
    BackCornerRight,
    /// Lower-left corner facing the camera.
    FrontCornerLeft,
    /// Lower-right corner facing the camera.
    FrontCornerRight,
    /// Horizontal run along the back of a room.
    BackWall,
    /// Vertical run bounding a room on the left.
    LeftVertical,
    /// Vertical run bounding a room on the right.
    RightVertical,
}

impl WallShape {
    /// Neighbourhood code used by the contextualization pattern table.
    ///
    /// Front corners are never referenced by the table and report `0`, the
    /// same code as a cell outside the category.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Plain => 1,
            Self::BackCornerLeft => 2,
            Self::BackCornerRight => 3,
            Self::BackWall => 4,
            Self::LeftVertical => 5,
            Self::RightVertical => 6,
            Self::FrontCornerLeft | Self::FrontCornerRight => 0,
        }
    }

    /// Offset of the shape within its category's tile strip.
    #[must_use]
    pub const fn strip_offset(self) -> u32 {
        match self {
            Self::Plain => 0,
            Self::BackCornerLeft => 1,
            Self::BackCornerRight => 2,
            Self::FrontCornerLeft => 3,
            Self::FrontCornerRight => 4,
            Self::BackWall => 5,
            Self::LeftVertical => 6,
            Self::RightVertical => 7,
        }
    }
}

/// Static tile categories that compose the level grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TileKind {
    /// Walkable floor.
    Empty,
    /// Impassable wall segment.
    Wall(WallShape),
    /// Impassable pit segment.
    Pit(WallShape),
}

impl TileKind {
    /// Reports whether the tile blocks entity movement.
    #[must_use]
    pub const fn is_solid(self) -> bool {
        !matches!(self, Self::Empty)
    }
}

/// Commands that express all permissible world mutations during a turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    /// Requests that the player attempt a single move by the provided delta.
    ///
    /// A zero delta is an explicit wait: the turn is spent in place.
    MovePlayer {
        /// Net displacement resolved from all tracks for the beat.
        delta: Delta,
    },
    /// Requests that an enemy advance a single step in the specified direction.
    StepEnemy {
        /// Identifier of the enemy attempting to move.
        enemy: EntityId,
        /// Direction of travel for the attempted step.
        direction: Direction,
    },
    /// Requests that an enemy strike the player.
    AttackPlayer {
        /// Identifier of the attacking enemy.
        attacker: EntityId,
    },
    /// Requests that the player use the selected inventory item.
    UseItem,
    /// Requests that the player's inventory selection advance by one slot.
    CycleItem,
}

/// Events reported by the world after processing commands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Event {
    /// Confirms that the player moved between two cells.
    PlayerMoved {
        /// Cell the player occupied before moving.
        from: CellCoord,
        /// Cell the player occupies after the move.
        to: CellCoord,
    },
    /// Reports that the player's move was rejected.
    PlayerBlocked {
        /// Entity occupying the destination, if any. `None` for walls and
        /// grid bounds.
        blocker: Option<EntityId>,
    },
    /// Confirms that the player struck and removed an enemy.
    EnemyKilled {
        /// Identifier of the removed enemy.
        enemy: EntityId,
        /// Cell the enemy occupied.
        cell: CellCoord,
    },
    /// Confirms that the player collected a key.
    KeyCollected {
        /// Identifier of the removed key.
        key: EntityId,
    },
    /// Announces that every door in the level has been opened.
    DoorsOpened {
        /// Number of doors that changed from closed to open.
        count: u32,
    },
    /// Announces that the player bumped into the exit.
    ExitReached {
        /// Identifier of the exit entity.
        exit: EntityId,
    },
    /// Confirms that an enemy moved between two cells.
    EnemyAdvanced {
        /// Identifier of the enemy that advanced.
        enemy: EntityId,
        /// Cell the enemy occupied before moving.
        from: CellCoord,
        /// Cell the enemy occupies after the move.
        to: CellCoord,
    },
    /// Reports that an enemy hit the player.
    PlayerHit {
        /// Identifier of the attacking enemy.
        attacker: EntityId,
        /// Player health remaining after the hit.
        health: u32,
    },
    /// Confirms that the player consumed an item.
    ItemUsed {
        /// Item that was consumed.
        item: Item,
        /// Player health after the item took effect.
        health: u32,
    },
    /// Reports the inventory slot selected after cycling.
    ItemSelected {
        /// Zero-based slot index now selected.
        slot: usize,
    },
}

impl Event {
    /// Sound cue the audio collaborator should play for this event, if any.
    #[must_use]
    pub const fn sound_cue(&self) -> Option<SoundCue> {
        match self {
            Self::EnemyKilled { .. } | Self::PlayerHit { .. } => Some(SoundCue::Hit),
            Self::KeyCollected { .. } => Some(SoundCue::Key),
            _ => None,
        }
    }
}

/// Discrete sounds requested by the simulation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SoundCue {
    /// Something was struck.
    Hit,
    /// A key was picked up.
    Key,
}

/// Fire-and-forget sink for sound cues.
///
/// The simulation never waits on the sink; implementations queue or drop
/// cues as they see fit.
pub trait AudioSink {
    /// Requests playback of the provided cue.
    fn play(&mut self, cue: SoundCue);
}

impl AudioSink for Vec<SoundCue> {
    fn play(&mut self, cue: SoundCue) {
        self.push(cue);
    }
}

/// Forwards the sound cue of every event in `events` to `audio`.
pub fn dispatch_sound_cues(events: &[Event], audio: &mut dyn AudioSink) {
    for cue in events.iter().filter_map(Event::sound_cue) {
        audio.play(cue);
    }
}

/// Immutable representation of a single enemy used by AI queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EnemySnapshot {
    /// Identifier assigned to the enemy.
    pub id: EntityId,
    /// Species of the enemy.
    pub kind: EnemyKind,
    /// Grid cell currently occupied by the enemy.
    pub cell: CellCoord,
    /// Remaining health. Enemies with zero health are inert.
    pub health: u32,
}

/// Read-only snapshot describing all enemies within the level.
#[derive(Clone, Debug, Default)]
pub struct EnemyView {
    snapshots: Vec<EnemySnapshot>,
}

impl EnemyView {
    /// Creates a new enemy view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<EnemySnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured enemy snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &EnemySnapshot> {
        self.snapshots.iter()
    }
}

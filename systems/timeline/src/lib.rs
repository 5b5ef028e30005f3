#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authored looping input tracks and per-beat input resolution.
//!
//! A [`Timeline`] holds one [`Track`] per sequencer lane. Each track loops
//! every `repeat_length` beats and carries non-overlapping [`TrackEvent`]s,
//! one [`Input`] per covered beat. Edits go through [`Timeline::place`] and
//! [`Timeline::remove`], which report the [`TimelineEdit`] the playback
//! cache must be invalidated for.

mod palette;

use std::collections::BTreeSet;

use beatcrawl_core::{Delta, Input};
use log::warn;
use thiserror::Error;

pub use palette::{Palette, Sequence};

/// Identifier of a palette sequence, carried by the track event placed from it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SequenceId(u32);

impl SequenceId {
    /// Creates a new sequence identifier with the provided numeric value.
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

/// Reasons an edit to the timeline may be rejected.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum PlacementError {
    /// The track index does not exist.
    #[error("track {track} does not exist")]
    UnknownTrack {
        /// Index that was requested.
        track: usize,
    },
    /// The sequence carries no inputs.
    #[error("cannot place an empty sequence")]
    EmptySequence,
    /// The event would extend past the track's loop.
    #[error("event at beat {time} lasting {duration} beats exceeds track length {repeat_length}")]
    ExceedsTrack {
        /// Requested start offset.
        time: u32,
        /// Length of the event.
        duration: u32,
        /// Loop length of the track.
        repeat_length: u32,
    },
    /// The event would overlap an event already on the track.
    #[error("beats [{time}, {end}) overlap the event at [{existing_time}, {existing_end})")]
    Overlap {
        /// Requested start offset.
        time: u32,
        /// Exclusive end of the requested range.
        end: u32,
        /// Start offset of the conflicting event.
        existing_time: u32,
        /// Exclusive end of the conflicting event.
        existing_end: u32,
    },
    /// The palette has no sequence with this identifier.
    #[error("sequence {0:?} is not part of the palette")]
    UnknownSequence(SequenceId),
    /// The sequence is already on a track.
    #[error("sequence {0:?} is already placed")]
    AlreadyPlaced(SequenceId),
    /// The track carries no event placed from this sequence.
    #[error("sequence {0:?} is not placed on that track")]
    NotPlaced(SequenceId),
}

/// Presentation color assigned to a track.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TrackColor {
    red: u8,
    green: u8,
    blue: u8,
}

impl TrackColor {
    /// Creates a new track color from byte RGB components.
    #[must_use]
    pub const fn from_rgb(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// Red component of the color.
    #[must_use]
    pub const fn red(&self) -> u8 {
        self.red
    }

    /// Green component of the color.
    #[must_use]
    pub const fn green(&self) -> u8 {
        self.green
    }

    /// Blue component of the color.
    #[must_use]
    pub const fn blue(&self) -> u8 {
        self.blue
    }
}

/// Contiguous span of beats on a track carrying one input per beat.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrackEvent {
    sequence: SequenceId,
    time: u32,
    inputs: Vec<Input>,
}

impl TrackEvent {
    /// Creates an event starting at local beat `time`.
    #[must_use]
    pub fn new(sequence: SequenceId, time: u32, inputs: Vec<Input>) -> Self {
        Self {
            sequence,
            time,
            inputs,
        }
    }

    /// Palette sequence the event was placed from.
    #[must_use]
    pub const fn sequence(&self) -> SequenceId {
        self.sequence
    }

    /// Start offset within the track loop.
    #[must_use]
    pub const fn time(&self) -> u32 {
        self.time
    }

    /// Number of beats covered.
    #[must_use]
    pub fn duration(&self) -> u32 {
        u32::try_from(self.inputs.len()).unwrap_or(u32::MAX)
    }

    /// Exclusive end offset within the track loop.
    #[must_use]
    pub fn end(&self) -> u32 {
        self.time.saturating_add(self.duration())
    }

    /// Inputs in beat order.
    #[must_use]
    pub fn inputs(&self) -> &[Input] {
        &self.inputs
    }

    /// Input authored for `local_beat`, if the event covers it.
    #[must_use]
    pub fn input_at(&self, local_beat: u32) -> Option<Input> {
        let offset = local_beat.checked_sub(self.time)?;
        self.inputs.get(usize::try_from(offset).ok()?).copied()
    }

    fn overlaps(&self, time: u32, end: u32) -> bool {
        time < self.end() && self.time < end
    }
}

/// Looping lane of authored events.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Track {
    name: String,
    color: TrackColor,
    repeat_length: u32,
    events: Vec<TrackEvent>,
}

impl Track {
    /// Creates an empty track that loops every `repeat_length` beats.
    ///
    /// A zero length is treated as a single-beat loop.
    #[must_use]
    pub fn new(name: impl Into<String>, color: TrackColor, repeat_length: u32) -> Self {
        Self {
            name: name.into(),
            color,
            repeat_length: repeat_length.max(1),
            events: Vec::new(),
        }
    }

    /// Display name of the track.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Display color of the track.
    #[must_use]
    pub const fn color(&self) -> TrackColor {
        self.color
    }

    /// Number of beats after which the track wraps.
    #[must_use]
    pub const fn repeat_length(&self) -> u32 {
        self.repeat_length
    }

    /// Events ordered by start offset.
    #[must_use]
    pub fn events(&self) -> &[TrackEvent] {
        &self.events
    }

    /// Position of a global beat within the track loop.
    #[must_use]
    pub const fn local_beat(&self, global_beat: u32) -> u32 {
        global_beat % self.repeat_length
    }

    /// Input the track produces on `global_beat`.
    #[must_use]
    pub fn input_at(&self, global_beat: u32) -> Input {
        let local = self.local_beat(global_beat);
        self.events
            .iter()
            .find_map(|event| event.input_at(local))
            .unwrap_or(Input::Empty)
    }

    /// Checks whether an event of `duration` beats fits at `time`.
    pub fn check_placement(&self, time: u32, duration: u32) -> Result<(), PlacementError> {
        if duration == 0 {
            return Err(PlacementError::EmptySequence);
        }

        let end = time.saturating_add(duration);
        if end > self.repeat_length {
            return Err(PlacementError::ExceedsTrack {
                time,
                duration,
                repeat_length: self.repeat_length,
            });
        }

        if let Some(existing) = self.events.iter().find(|event| event.overlaps(time, end)) {
            return Err(PlacementError::Overlap {
                time,
                end,
                existing_time: existing.time,
                existing_end: existing.end(),
            });
        }

        Ok(())
    }

    /// Snaps a continuous drop position (in beats) onto the track.
    ///
    /// The position is wrapped into the loop, clamped so the event fits, and
    /// rounded to the nearest beat.
    #[must_use]
    pub fn snap_drop(&self, position: f64, duration: u32) -> u32 {
        let wrapped = position.max(0.0) % f64::from(self.repeat_length);
        let latest = f64::from(self.repeat_length.saturating_sub(duration));
        wrapped.min(latest).round() as u32
    }

    fn insert(&mut self, event: TrackEvent) {
        let position = self
            .events
            .iter()
            .position(|existing| existing.time > event.time)
            .unwrap_or(self.events.len());
        self.events.insert(position, event);
    }
}

/// Beat range touched by a committed edit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimelineEdit {
    /// Index of the edited track.
    pub track: usize,
    /// Local start offset of the edited event.
    pub time: u32,
    /// Number of beats covered by the edited event.
    pub duration: u32,
}

impl TimelineEdit {
    /// Earliest global beat whose resolved input may have changed.
    ///
    /// Every track starts its first loop at global beat zero, so the edited
    /// offset is also the first global beat it applies to.
    #[must_use]
    pub const fn earliest_affected_beat(&self) -> u32 {
        self.time
    }
}

/// Candidate placement computed while a sequence is being dragged.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DropTarget {
    /// Track under the pointer.
    pub track: usize,
    /// Snapped start offset, in beats.
    pub time: u32,
    /// Whether dropping here would be accepted.
    pub is_valid: bool,
}

/// Ordered collection of tracks for the loaded puzzle.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Timeline {
    tracks: Vec<Track>,
}

impl Timeline {
    /// Creates a timeline from the provided tracks.
    #[must_use]
    pub fn new(tracks: Vec<Track>) -> Self {
        Self { tracks }
    }

    /// Tracks in lane order.
    #[must_use]
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    /// Track at `index`, if present.
    #[must_use]
    pub fn track(&self, index: usize) -> Option<&Track> {
        self.tracks.get(index)
    }

    /// Places an event on a track after validating it.
    pub fn place(
        &mut self,
        track: usize,
        time: u32,
        sequence: SequenceId,
        inputs: Vec<Input>,
    ) -> Result<TimelineEdit, PlacementError> {
        let Some(lane) = self.tracks.get_mut(track) else {
            return Err(PlacementError::UnknownTrack { track });
        };

        let event = TrackEvent::new(sequence, time, inputs);
        let duration = event.duration();
        if let Err(error) = lane.check_placement(time, duration) {
            warn!("placement on track {track} rejected: {error}");
            return Err(error);
        }

        lane.insert(event);
        Ok(TimelineEdit {
            track,
            time,
            duration,
        })
    }

    /// Removes the event placed from `sequence` off a track.
    pub fn remove(
        &mut self,
        track: usize,
        sequence: SequenceId,
    ) -> Result<(TimelineEdit, TrackEvent), PlacementError> {
        let Some(lane) = self.tracks.get_mut(track) else {
            return Err(PlacementError::UnknownTrack { track });
        };
        let Some(position) = lane
            .events
            .iter()
            .position(|event| event.sequence == sequence)
        else {
            return Err(PlacementError::NotPlaced(sequence));
        };

        let event = lane.events.remove(position);
        let edit = TimelineEdit {
            track,
            time: event.time,
            duration: event.duration(),
        };
        Ok((edit, event))
    }

    /// Evaluates where a dragged sequence would land.
    ///
    /// Returns `None` when the pointer is not over a track.
    #[must_use]
    pub fn preview(&self, track: usize, position: f64, duration: u32) -> Option<DropTarget> {
        let lane = self.tracks.get(track)?;
        let time = lane.snap_drop(position, duration);
        Some(DropTarget {
            track,
            time,
            is_valid: lane.check_placement(time, duration).is_ok(),
        })
    }

    /// Distinct non-empty inputs produced by all tracks on `global_beat`.
    #[must_use]
    pub fn inputs_at(&self, global_beat: u32) -> BTreeSet<Input> {
        self.tracks
            .iter()
            .map(|track| track.input_at(global_beat))
            .filter(|input| *input != Input::Empty)
            .collect()
    }

    /// Resolves the combined action for `global_beat`.
    #[must_use]
    pub fn plan(&self, global_beat: u32) -> TurnPlan {
        TurnPlan::from_inputs(&self.inputs_at(global_beat))
    }
}

/// Action resolved from every track for a single beat.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TurnPlan {
    /// Whether the inventory selection advances before moving.
    pub cycle_item: bool,
    /// Whether the selected item is used before moving.
    pub use_item: bool,
    /// Player move for the beat. `None` is a rest beat with no turn at all;
    /// `Some(Delta::ZERO)` is an explicit wait that still spends the turn.
    pub movement: Option<Delta>,
}

impl TurnPlan {
    /// Combines the distinct inputs reported for a beat.
    ///
    /// `Wait` overrides every directional input. Otherwise the directional
    /// deltas are summed, and a net zero delta is a rest beat.
    #[must_use]
    pub fn from_inputs(inputs: &BTreeSet<Input>) -> Self {
        let movement = if inputs.contains(&Input::Wait) {
            Some(Delta::ZERO)
        } else {
            let net = inputs
                .iter()
                .filter_map(|input| input.delta())
                .fold(Delta::ZERO, |net, delta| net + delta);
            (!net.is_zero()).then_some(net)
        };

        Self {
            cycle_item: inputs.contains(&Input::CycleItem),
            use_item: inputs.contains(&Input::UseItem),
            movement,
        }
    }

    /// Reports whether the beat does nothing at all.
    #[must_use]
    pub const fn is_rest(&self) -> bool {
        !self.cycle_item && !self.use_item && self.movement.is_none()
    }
}

//! Pool of authored sequences the player drags onto tracks.

use beatcrawl_core::Input;
use log::debug;

use crate::{PlacementError, SequenceId, Timeline, TimelineEdit};

/// Fixed run of inputs offered by the puzzle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Sequence {
    id: SequenceId,
    inputs: Vec<Input>,
}

impl Sequence {
    /// Identifier of the sequence within its palette.
    #[must_use]
    pub const fn id(&self) -> SequenceId {
        self.id
    }

    /// Inputs in beat order.
    #[must_use]
    pub fn inputs(&self) -> &[Input] {
        &self.inputs
    }

    /// Number of beats the sequence covers once placed.
    #[must_use]
    pub fn duration(&self) -> u32 {
        u32::try_from(self.inputs.len()).unwrap_or(u32::MAX)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct Slot {
    sequence: Sequence,
    placed_on: Option<usize>,
}

/// Sequences available to the player, each placeable at most once.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Palette {
    slots: Vec<Slot>,
}

impl Palette {
    /// Creates a palette whose sequence identifiers follow the provided order.
    #[must_use]
    pub fn new(sequences: Vec<Vec<Input>>) -> Self {
        let slots = sequences
            .into_iter()
            .zip(0_u32..)
            .map(|(inputs, id)| Slot {
                sequence: Sequence {
                    id: SequenceId::new(id),
                    inputs,
                },
                placed_on: None,
            })
            .collect();
        Self { slots }
    }

    /// Every sequence in palette order, placed or not.
    pub fn sequences(&self) -> impl Iterator<Item = &Sequence> + '_ {
        self.slots.iter().map(|slot| &slot.sequence)
    }

    /// Sequences that are still waiting to be placed.
    pub fn available(&self) -> impl Iterator<Item = &Sequence> + '_ {
        self.slots
            .iter()
            .filter(|slot| slot.placed_on.is_none())
            .map(|slot| &slot.sequence)
    }

    /// Looks up a sequence by identifier.
    #[must_use]
    pub fn sequence(&self, id: SequenceId) -> Option<&Sequence> {
        self.slot(id).map(|slot| &slot.sequence)
    }

    /// Track the sequence currently sits on, if any.
    #[must_use]
    pub fn placement(&self, id: SequenceId) -> Option<usize> {
        self.slot(id).and_then(|slot| slot.placed_on)
    }

    /// Moves a sequence from the palette onto a track.
    pub fn place_onto(
        &mut self,
        timeline: &mut Timeline,
        id: SequenceId,
        track: usize,
        time: u32,
    ) -> Result<TimelineEdit, PlacementError> {
        let slot = self
            .slots
            .get_mut(index(id))
            .ok_or(PlacementError::UnknownSequence(id))?;
        if slot.placed_on.is_some() {
            return Err(PlacementError::AlreadyPlaced(id));
        }

        let edit = timeline.place(track, time, id, slot.sequence.inputs.clone())?;
        slot.placed_on = Some(track);
        debug!("sequence {} placed on track {track} at beat {time}", id.get());
        Ok(edit)
    }

    /// Returns a placed sequence from its track to the palette.
    pub fn lift_from(
        &mut self,
        timeline: &mut Timeline,
        id: SequenceId,
    ) -> Result<TimelineEdit, PlacementError> {
        let slot = self
            .slots
            .get_mut(index(id))
            .ok_or(PlacementError::UnknownSequence(id))?;
        let track = slot.placed_on.ok_or(PlacementError::NotPlaced(id))?;

        let (edit, _) = timeline.remove(track, id)?;
        slot.placed_on = None;
        debug!("sequence {} lifted from track {track}", id.get());
        Ok(edit)
    }

    fn slot(&self, id: SequenceId) -> Option<&Slot> {
        self.slots.get(index(id))
    }
}

fn index(id: SequenceId) -> usize {
    usize::try_from(id.get()).unwrap_or(usize::MAX)
}

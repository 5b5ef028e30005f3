//! Glue that owns one loaded puzzle and routes edits, ticks and sound cues.

use std::time::Duration;

use beatcrawl_core::{dispatch_sound_cues, AudioSink, Event};
use beatcrawl_levels::{CatalogError, Puzzle};
use beatcrawl_system_playback::{Config as PlaybackConfig, PlaybackManager};
use beatcrawl_system_playhead::{Config as PlayheadConfig, Playhead};
use beatcrawl_system_timeline::{Palette, PlacementError, SequenceId, Timeline};
use beatcrawl_world::World;

/// Live state of a single puzzle attempt.
#[derive(Debug)]
pub(crate) struct Session<A> {
    world: World,
    timeline: Timeline,
    palette: Palette,
    playback: PlaybackManager,
    playhead: Playhead,
    audio: A,
    exit_reached: bool,
}

impl<A: AudioSink> Session<A> {
    /// Builds the world, an empty timeline and a full palette for `puzzle`.
    pub(crate) fn load(
        puzzle: &Puzzle,
        playback: PlaybackConfig,
        playhead: PlayheadConfig,
        audio: A,
    ) -> Result<Self, CatalogError> {
        let world = puzzle.build_world()?;
        let timeline = puzzle.build_timeline()?;
        let initial = world.export_snapshot();

        Ok(Self {
            world,
            timeline,
            palette: puzzle.build_palette(),
            playback: PlaybackManager::new(playback, initial),
            playhead: Playhead::new(playhead),
            audio,
            exit_reached: false,
        })
    }

    /// Swaps in another puzzle, resetting the cache, palette and playhead.
    ///
    /// The session is left untouched when the puzzle cannot be built.
    pub(crate) fn reload(&mut self, puzzle: &Puzzle) -> Result<(), CatalogError> {
        let world = puzzle.build_world()?;
        let timeline = puzzle.build_timeline()?;

        self.playback.reset(world, &mut self.world);
        self.timeline = timeline;
        self.palette = puzzle.build_palette();
        self.playhead = Playhead::new(self.playhead.config());
        self.exit_reached = false;
        Ok(())
    }

    pub(crate) fn world(&self) -> &World {
        &self.world
    }

    pub(crate) fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub(crate) fn playhead(&self) -> &Playhead {
        &self.playhead
    }

    pub(crate) fn playhead_mut(&mut self) -> &mut Playhead {
        &mut self.playhead
    }

    pub(crate) fn audio(&self) -> &A {
        &self.audio
    }

    /// Whether the player has bumped into an exit during this session.
    pub(crate) fn exit_reached(&self) -> bool {
        self.exit_reached
    }

    /// Drops a palette sequence onto a track and reloads the shown beat.
    pub(crate) fn place(
        &mut self,
        sequence: SequenceId,
        track: usize,
        time: u32,
    ) -> Result<(), PlacementError> {
        let edit = self
            .palette
            .place_onto(&mut self.timeline, sequence, track, time)?;
        self.playback.timeline_edited(edit, &mut self.world);
        self.resync();
        Ok(())
    }

    /// Returns a placed sequence to the palette and reloads the shown beat.
    pub(crate) fn lift(&mut self, sequence: SequenceId) -> Result<(), PlacementError> {
        let edit = self.palette.lift_from(&mut self.timeline, sequence)?;
        self.playback.timeline_edited(edit, &mut self.world);
        self.resync();
        Ok(())
    }

    /// Advances the playhead and animation by one frame.
    pub(crate) fn tick(&mut self, dt: Duration) {
        let mut events = Vec::new();
        self.playhead.tick(
            dt,
            &mut self.world,
            &self.timeline,
            &mut self.playback,
            &mut events,
        );
        self.world.animate(dt);
        self.handle_events(&events);
    }

    fn resync(&mut self) {
        let mut events = Vec::new();
        self.playhead.resync(
            &mut self.world,
            &self.timeline,
            &mut self.playback,
            &mut events,
        );
        self.handle_events(&events);
    }

    fn handle_events(&mut self, events: &[Event]) {
        if events
            .iter()
            .any(|event| matches!(event, Event::ExitReached { .. }))
        {
            self.exit_reached = true;
        }
        dispatch_sound_cues(events, &mut self.audio);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use beatcrawl_core::{CellCoord, SoundCue};
    use beatcrawl_levels::Catalog;
    use beatcrawl_system_playback::InvalidationPolicy;
    use beatcrawl_world::query;

    const CATALOG: &str = r########"
        version = 1

        [[puzzle]]
        name = "Hall"
        track_lengths = [4, 2]
        sequences = [["right", "right"], ["wait"], ["left"]]
        grid = ["#######", "#p.s.X#", "#######"]
    "########;

    fn session() -> Session<Vec<SoundCue>> {
        let catalog = Catalog::from_toml(CATALOG).expect("catalogue");
        Session::load(
            catalog.get("Hall").expect("puzzle"),
            PlaybackConfig::new(InvalidationPolicy::EarliestAffectedBeat),
            PlayheadConfig::new(0.5),
            Vec::new(),
        )
        .expect("session")
    }

    fn player_cell(session: &Session<Vec<SoundCue>>) -> CellCoord {
        query::player(session.world()).expect("player").cell()
    }

    #[test]
    fn combat_plays_hit_cues() {
        let mut session = session();
        session
            .place(SequenceId::new(0), 0, 0)
            .expect("placement");
        session.playhead_mut().press_play();

        for _ in 0..90 {
            session.tick(Duration::from_millis(16));
        }

        assert_eq!(session.playhead().beat(), 2);
        assert_eq!(session.audio(), &vec![SoundCue::Hit, SoundCue::Hit]);
        assert_eq!(query::enemy_view(session.world()).iter().count(), 0);
        assert!(!session.exit_reached());
    }

    #[test]
    fn placement_at_current_beat_updates_world() {
        let mut session = session();
        session.playhead_mut().begin_drag();
        session.playhead_mut().drag_to(2.0);
        session.tick(Duration::from_millis(16));
        assert_eq!(player_cell(&session), CellCoord::new(1, 1));

        session
            .place(SequenceId::new(2), 1, 1)
            .expect("placement");
        assert_eq!(player_cell(&session), CellCoord::new(1, 1));

        session.lift(SequenceId::new(2)).expect("lift");
        session
            .place(SequenceId::new(0), 0, 0)
            .expect("placement");
        assert_eq!(player_cell(&session), CellCoord::new(2, 1));
    }

    #[test]
    fn rejected_placement_leaves_session_untouched() {
        let mut session = session();
        session
            .place(SequenceId::new(0), 0, 1)
            .expect("placement");

        assert!(matches!(
            session.place(SequenceId::new(1), 0, 2),
            Err(PlacementError::Overlap { .. })
        ));
        assert!(matches!(
            session.place(SequenceId::new(0), 1, 0),
            Err(PlacementError::AlreadyPlaced(_))
        ));
        assert_eq!(session.timeline().tracks()[0].events().len(), 1);
    }

    #[test]
    fn reload_switches_to_puzzle_with_other_dimensions() {
        let mut session = session();
        session
            .place(SequenceId::new(0), 0, 0)
            .expect("placement");
        session.playhead_mut().press_play();
        for _ in 0..40 {
            session.tick(Duration::from_millis(16));
        }
        assert_eq!(session.playhead().beat(), 1);

        let catalog = Catalog::builtin().expect("catalogue");
        let cellar = catalog.get("Cellar").expect("puzzle");
        session.reload(cellar).expect("reload");

        let expected = cellar.build_world().expect("world");
        assert_eq!(query::dimensions(session.world()), query::dimensions(&expected));
        assert_eq!(
            player_cell(&session),
            query::player(&expected).expect("player").cell()
        );
        let (columns, rows) = query::dimensions(session.world());
        assert!(query::entities(session.world())
            .all(|entity| entity.cell().column() < columns && entity.cell().row() < rows));
        assert_eq!(session.playhead().beat(), 0);
        assert!(session
            .timeline()
            .tracks()
            .iter()
            .all(|track| track.events().is_empty()));

        session
            .place(SequenceId::new(0), 0, 0)
            .expect("placement after reload");
    }
}

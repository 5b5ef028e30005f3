#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Beat-indexed replay of the timeline with memoized world snapshots.
//!
//! The manager keeps `snapshots[b]` as the world state after resolving global
//! beats `0..b`, so `snapshots[0]` is always the authored initial state.
//! Requests for a cached beat reload the stored snapshot; requests past the
//! cache replay forward from the last cached snapshot and append every
//! intermediate result.

use beatcrawl_core::{Command, Event};
use beatcrawl_system_enemy_ai::EnemyAi;
use beatcrawl_system_timeline::{Timeline, TimelineEdit, TurnPlan};
use beatcrawl_world::{self as world, query, Snapshot, World};
use log::{debug, info};

/// Strategy used to drop cached snapshots after a timeline edit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum InvalidationPolicy {
    /// Drop every cached beat on any edit.
    #[default]
    Full,
    /// Keep snapshots that were resolved before the edit's first affected beat.
    EarliestAffectedBeat,
}

/// Configuration applied to the playback manager.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Config {
    invalidation: InvalidationPolicy,
}

impl Config {
    /// Creates a new playback configuration.
    #[must_use]
    pub const fn new(invalidation: InvalidationPolicy) -> Self {
        Self { invalidation }
    }

    /// Invalidation strategy used for timeline edits.
    #[must_use]
    pub const fn invalidation(&self) -> InvalidationPolicy {
        self.invalidation
    }
}

/// Owns the snapshot cache and resolves beats on demand.
#[derive(Debug)]
pub struct PlaybackManager {
    config: Config,
    initial: Snapshot,
    snapshots: Vec<Snapshot>,
    enemy_ai: EnemyAi,
}

impl PlaybackManager {
    /// Creates a manager whose beat zero is the provided initial state.
    #[must_use]
    pub fn new(config: Config, initial: Snapshot) -> Self {
        Self {
            config,
            snapshots: vec![initial.clone()],
            initial,
            enemy_ai: EnemyAi::new(),
        }
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> Config {
        self.config
    }

    /// Authored initial state every replay starts from.
    #[must_use]
    pub fn initial(&self) -> &Snapshot {
        &self.initial
    }

    /// Number of cached snapshots, including the initial one.
    #[must_use]
    pub fn snapshot_count(&self) -> usize {
        self.snapshots.len()
    }

    /// Cached snapshot for `beat`, if it has been resolved.
    #[must_use]
    pub fn cached(&self, beat: usize) -> Option<&Snapshot> {
        self.snapshots.get(beat)
    }

    /// Swaps in a freshly built world and clears every cached beat.
    ///
    /// The whole world is replaced, grid included, so a puzzle with different
    /// dimensions can be loaded into the same manager.
    pub fn reset(&mut self, fresh: World, world: &mut World) {
        let initial = fresh.export_snapshot();
        *world = fresh;
        self.snapshots.clear();
        self.snapshots.push(initial.clone());
        self.initial = initial;
        info!("playback reset to a new initial state");
    }

    /// Loads the state shown at `beat` into the world.
    ///
    /// Negative beats clamp to zero. When the beat has to be replayed, only
    /// the events of the final resolved beat are appended to `out_events`;
    /// cache hits append nothing.
    pub fn ensure(
        &mut self,
        beat: i64,
        world: &mut World,
        timeline: &Timeline,
        out_events: &mut Vec<Event>,
    ) {
        let target = usize::try_from(beat.max(0)).unwrap_or(usize::MAX);
        if self.snapshots.is_empty() {
            self.snapshots.push(self.initial.clone());
        }

        if let Some(cached) = self.snapshots.get(target) {
            debug!("beat {target} served from cache");
            world.apply_snapshot(cached);
            return;
        }

        let Some(last) = self.snapshots.last() else {
            return;
        };
        world.apply_snapshot(last);

        let first = self.snapshots.len();
        debug!("replaying beats {} through {}", first - 1, target - 1);

        let mut events = Vec::new();
        for index in first..=target {
            events.clear();
            let resolved = u32::try_from(index - 1).unwrap_or(u32::MAX);
            self.resolve_turn(world, timeline.plan(resolved), &mut events);
            self.snapshots.push(world.export_snapshot());
        }

        out_events.extend(events);
    }

    /// Drops cached snapshots from `beat` onward and reloads the previous one.
    ///
    /// Invalidating from zero clears the cache and reloads the initial state.
    /// Beats past the cache leave both the cache and the world untouched.
    pub fn invalidate_from(&mut self, beat: usize, world: &mut World) {
        if beat > self.snapshots.len() {
            return;
        }

        self.snapshots.truncate(beat);
        let restored = self.snapshots.last().unwrap_or(&self.initial);
        world.apply_snapshot(restored);
        info!(
            "snapshots invalidated from beat {beat}, {} remain cached",
            self.snapshots.len()
        );
    }

    /// Invalidates the cache after a committed timeline edit.
    pub fn timeline_edited(&mut self, edit: TimelineEdit, world: &mut World) {
        let from = match self.config.invalidation {
            InvalidationPolicy::Full => 0,
            InvalidationPolicy::EarliestAffectedBeat => {
                usize::try_from(edit.earliest_affected_beat())
                    .map_or(0, |beat| beat.saturating_add(1))
            }
        };
        self.invalidate_from(from, world);
    }

    fn resolve_turn(&mut self, world: &mut World, plan: TurnPlan, events: &mut Vec<Event>) {
        if plan.cycle_item {
            world::apply(world, Command::CycleItem, events);
        }
        if plan.use_item {
            world::apply(world, Command::UseItem, events);
        }

        let Some(delta) = plan.movement else {
            return;
        };
        world::apply(world, Command::MovePlayer { delta }, events);

        let enemies = query::enemy_view(world);
        let player = query::player(world).map(|player| player.cell());
        let mut commands = Vec::new();
        self.enemy_ai.handle(
            &enemies,
            player,
            query::dimensions(world),
            |cell| query::solid_at(world, cell),
            &mut commands,
        );

        for command in commands {
            world::apply(world, command, events);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use beatcrawl_core::{CellCoord, Input};
    use beatcrawl_system_timeline::{SequenceId, Track, TrackColor};
    use beatcrawl_world::Level;

    fn setup(rows: &[&str], length: u32, inputs: Vec<Input>) -> (World, Timeline) {
        let world = World::from_level(&Level::parse(rows).expect("level"));
        let mut timeline = Timeline::new(vec![Track::new(
            "A",
            TrackColor::from_rgb(0x99, 0x55, 0x55),
            length,
        )]);
        let _ = timeline
            .place(0, 0, SequenceId::new(0), inputs)
            .expect("placement");
        (world, timeline)
    }

    fn player_cell(world: &World) -> CellCoord {
        query::player(world).expect("player").cell()
    }

    #[test]
    fn beat_zero_is_initial_state() {
        let (mut world, timeline) = setup(&["p..."], 3, vec![Input::Right; 3]);
        let mut manager = PlaybackManager::new(Config::default(), world.export_snapshot());
        let mut events = Vec::new();

        manager.ensure(2, &mut world, &timeline, &mut events);
        manager.ensure(0, &mut world, &timeline, &mut events);
        assert_eq!(player_cell(&world), CellCoord::new(0, 0));

        manager.ensure(-5, &mut world, &timeline, &mut events);
        assert_eq!(player_cell(&world), CellCoord::new(0, 0));
        assert_eq!(manager.snapshot_count(), 3);
    }

    #[test]
    fn replay_only_reports_final_beat() {
        let (mut world, timeline) = setup(&["p..."], 3, vec![Input::Right; 3]);
        let mut manager = PlaybackManager::new(Config::default(), world.export_snapshot());
        let mut events = Vec::new();

        manager.ensure(3, &mut world, &timeline, &mut events);

        assert_eq!(
            events,
            vec![Event::PlayerMoved {
                from: CellCoord::new(2, 0),
                to: CellCoord::new(3, 0),
            }]
        );

        events.clear();
        manager.ensure(3, &mut world, &timeline, &mut events);
        assert!(events.is_empty());
    }

    #[test]
    fn rest_beat_skips_enemy_turn() {
        let (mut world, timeline) = setup(&["p..s"], 2, vec![Input::Empty, Input::Wait]);
        let mut manager = PlaybackManager::new(Config::default(), world.export_snapshot());
        let mut events = Vec::new();

        manager.ensure(1, &mut world, &timeline, &mut events);
        assert!(events.is_empty());

        manager.ensure(2, &mut world, &timeline, &mut events);
        assert!(matches!(events.as_slice(), [Event::EnemyAdvanced { .. }]));
    }

    #[test]
    fn reset_replaces_initial_state() {
        let (mut world, timeline) = setup(&["p..."], 3, vec![Input::Right; 3]);
        let mut manager = PlaybackManager::new(Config::default(), world.export_snapshot());
        let mut events = Vec::new();
        manager.ensure(3, &mut world, &timeline, &mut events);

        let other = World::from_level(&Level::parse(&["...p"]).expect("level"));
        manager.reset(other, &mut world);

        assert_eq!(manager.snapshot_count(), 1);
        assert_eq!(player_cell(&world), CellCoord::new(3, 0));
    }

    #[test]
    fn reset_adopts_new_grid_dimensions() {
        let (mut world, timeline) = setup(&["p.."], 3, vec![Input::Right; 3]);
        let mut manager = PlaybackManager::new(Config::default(), world.export_snapshot());
        let mut events = Vec::new();
        manager.ensure(2, &mut world, &timeline, &mut events);

        let larger = World::from_level(
            &Level::parse(&["#####", "#...#", "#..p#", "#####"]).expect("level"),
        );
        manager.reset(larger, &mut world);

        let (columns, rows) = query::dimensions(&world);
        let player = player_cell(&world);
        assert_eq!((columns, rows), (5, 4));
        assert_eq!(player, CellCoord::new(3, 2));
        assert!(player.column() < columns && player.row() < rows);
        assert!(query::solid_at(&world, CellCoord::new(0, 0)));

        manager.ensure(1, &mut world, &timeline, &mut events);
        assert_eq!(player_cell(&world), CellCoord::new(3, 2));
        assert_eq!(manager.snapshot_count(), 2);
    }

    #[test]
    fn partial_invalidation_keeps_earlier_beats() {
        let (mut world, mut timeline) = setup(&["p......"], 6, vec![Input::Right]);
        let config = Config::new(InvalidationPolicy::EarliestAffectedBeat);
        let mut manager = PlaybackManager::new(config, world.export_snapshot());
        let mut events = Vec::new();
        manager.ensure(6, &mut world, &timeline, &mut events);

        let edit = timeline
            .place(0, 3, SequenceId::new(1), vec![Input::Right])
            .expect("placement");
        manager.timeline_edited(edit, &mut world);

        assert_eq!(manager.snapshot_count(), 4);
        assert_eq!(player_cell(&world), CellCoord::new(1, 0));
    }
}

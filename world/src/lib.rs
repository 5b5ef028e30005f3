#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Beatcrawl.
//!
//! The world owns the static tile grid and every entity. It is mutated only
//! through [`apply`] (and the [`move_entity`] primitive it is built on) or by
//! loading a [`Snapshot`] captured earlier. Presentation code reads it through
//! the [`query`] module.

mod contextualize;
mod level;

use std::{collections::BTreeMap, time::Duration};

use beatcrawl_core::{
    CellCoord, Command, Delta, EnemyKind, EntityId, EntityRole, Event, Item, TileKind,
};
use log::debug;

pub use level::{Level, LevelError, Placement};

const PLAYER_HEALTH: u32 = 3;
const DEFAULT_HEALTH: u32 = 1;

const FLOOR_TILE: u32 = 68;
const WALL_STRIP: u32 = 16;
const PIT_STRIP: u32 = 32;

const PLAYER_TILE: u32 = 5;
const GHOST_TILE: u32 = 25;
const SNAKE_TILE: u32 = 6;
const RAT_TILE: u32 = 7;
const KEY_TILE: u32 = 8;
const DOOR_CLOSED_TILE: u32 = 9;
const DOOR_OPEN_TILE: u32 = 10;
const EXIT_TILE: u32 = 11;

const SHOWN_DECAY_RATE: f32 = 15.0;

/// Static grid tile together with its presentation index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Tile {
    kind: TileKind,
    index: u32,
}

impl Tile {
    fn at(kind: TileKind, cell: CellCoord) -> Self {
        let index = match kind {
            TileKind::Empty => floor_variant(cell),
            TileKind::Wall(shape) => WALL_STRIP + shape.strip_offset(),
            TileKind::Pit(shape) => PIT_STRIP + shape.strip_offset(),
        };
        Self { kind, index }
    }

    /// Category and orientation of the tile.
    #[must_use]
    pub const fn kind(&self) -> TileKind {
        self.kind
    }

    /// Index into the tile sheet used when drawing the tile.
    #[must_use]
    pub const fn index(&self) -> u32 {
        self.index
    }

    /// Reports whether the tile blocks entity movement.
    #[must_use]
    pub const fn is_solid(&self) -> bool {
        self.kind.is_solid()
    }
}

/// Interpolated position used only for drawing.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ShownPosition {
    /// Horizontal position measured in tiles.
    pub x: f32,
    /// Vertical position measured in tiles.
    pub y: f32,
}

impl ShownPosition {
    fn at(cell: CellCoord) -> Self {
        Self {
            x: cell.column() as f32,
            y: cell.row() as f32,
        }
    }
}

/// Ordered item list with a selected slot.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Inventory {
    items: Vec<Item>,
    selected: usize,
}

impl Inventory {
    /// Creates an inventory holding `items` with the first slot selected.
    #[must_use]
    pub fn new(items: Vec<Item>) -> Self {
        Self { items, selected: 0 }
    }

    /// Items currently carried.
    #[must_use]
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// Zero-based index of the selected slot.
    #[must_use]
    pub const fn selected_slot(&self) -> usize {
        self.selected
    }

    /// Item in the selected slot, if any.
    #[must_use]
    pub fn selected(&self) -> Option<Item> {
        self.items.get(self.selected).copied()
    }

    fn cycle(&mut self) -> Option<usize> {
        if self.items.is_empty() {
            return None;
        }
        self.selected = (self.selected + 1) % self.items.len();
        Some(self.selected)
    }

    fn take_selected(&mut self) -> Option<Item> {
        if self.selected >= self.items.len() {
            return None;
        }
        let item = self.items.remove(self.selected);
        if self.selected >= self.items.len() {
            self.selected = 0;
        }
        Some(item)
    }
}

/// Dynamic occupant of the grid.
///
/// Equality compares simulation state only; the shown position is
/// presentation data and never participates.
#[derive(Clone, Debug)]
pub struct Entity {
    id: EntityId,
    cell: CellCoord,
    shown: ShownPosition,
    health: u32,
    max_health: u32,
    role: EntityRole,
    tile_index: u32,
    inventory: Inventory,
}

impl PartialEq for Entity {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.cell == other.cell
            && self.health == other.health
            && self.max_health == other.max_health
            && self.role == other.role
            && self.tile_index == other.tile_index
            && self.inventory == other.inventory
    }
}

impl Eq for Entity {}

impl Entity {
    fn spawn(id: EntityId, placement: Placement, items: &[Item]) -> Self {
        let (max_health, tile_index) = match placement.role {
            EntityRole::Player => (PLAYER_HEALTH, PLAYER_TILE),
            EntityRole::Enemy(EnemyKind::Snake) => (DEFAULT_HEALTH, SNAKE_TILE),
            EntityRole::Enemy(EnemyKind::Rat) => (DEFAULT_HEALTH, RAT_TILE),
            EntityRole::Key => (DEFAULT_HEALTH, KEY_TILE),
            EntityRole::Door { open: false } => (DEFAULT_HEALTH, DOOR_CLOSED_TILE),
            EntityRole::Door { open: true } => (DEFAULT_HEALTH, DOOR_OPEN_TILE),
            EntityRole::Exit => (DEFAULT_HEALTH, EXIT_TILE),
        };
        let inventory = if placement.role == EntityRole::Player {
            Inventory::new(items.to_vec())
        } else {
            Inventory::default()
        };

        Self {
            id,
            cell: placement.cell,
            shown: ShownPosition::at(placement.cell),
            health: max_health,
            max_health,
            role: placement.role,
            tile_index,
            inventory,
        }
    }

    /// Stable identifier of the entity.
    #[must_use]
    pub const fn id(&self) -> EntityId {
        self.id
    }

    /// Grid cell the entity occupies.
    #[must_use]
    pub const fn cell(&self) -> CellCoord {
        self.cell
    }

    /// Interpolated drawing position.
    #[must_use]
    pub const fn shown(&self) -> ShownPosition {
        self.shown
    }

    /// Remaining health.
    #[must_use]
    pub const fn health(&self) -> u32 {
        self.health
    }

    /// Health the entity starts with and can be restored to.
    #[must_use]
    pub const fn max_health(&self) -> u32 {
        self.max_health
    }

    /// Reports whether the entity has run out of health.
    #[must_use]
    pub const fn is_dead(&self) -> bool {
        self.health == 0
    }

    /// Behavioural role of the entity.
    #[must_use]
    pub const fn role(&self) -> EntityRole {
        self.role
    }

    /// Items carried by the entity. Empty for everything but the player.
    #[must_use]
    pub const fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    /// Tile index to draw, substituting the ghost tile for a dead player.
    #[must_use]
    pub fn display_tile(&self) -> u32 {
        if self.role == EntityRole::Player && self.is_dead() {
            GHOST_TILE
        } else {
            self.tile_index
        }
    }

    fn restore_from(&mut self, stored: &Entity) {
        let shown = self.shown;
        self.clone_from(stored);
        self.shown = shown;
    }
}

/// Immutable copy of every entity at a beat boundary.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Snapshot {
    entities: BTreeMap<EntityId, Entity>,
}

impl Snapshot {
    /// Entities captured by the snapshot in identifier order.
    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    /// Entity captured under `id`, if present.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    /// Player captured by the snapshot, if present.
    #[must_use]
    pub fn player(&self) -> Option<&Entity> {
        self.entities
            .values()
            .find(|entity| entity.role == EntityRole::Player)
    }

    /// Number of captured entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Reports whether the snapshot captured no entities.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

/// Represents the authoritative Beatcrawl world state.
#[derive(Clone, Debug)]
pub struct World {
    width: u32,
    height: u32,
    tiles: Vec<Tile>,
    entities: BTreeMap<EntityId, Entity>,
    player: Option<EntityId>,
}

impl World {
    /// Builds a world from a parsed level, contextualizing walls and pits.
    #[must_use]
    pub fn from_level(level: &Level) -> Self {
        let width = level.width();
        let height = level.height();
        let mut kinds = level.tiles().to_vec();
        contextualize::contextualize(&mut kinds, width, height);

        let tiles = kinds
            .iter()
            .enumerate()
            .map(|(offset, kind)| Tile::at(*kind, cell_at(width, offset)))
            .collect();

        let mut entities = BTreeMap::new();
        let mut player = None;
        for (index, placement) in level.placements().iter().enumerate() {
            let id = EntityId::new(u32::try_from(index).unwrap_or(u32::MAX));
            if placement.role == EntityRole::Player {
                player = Some(id);
            }
            let _ = entities.insert(id, Entity::spawn(id, *placement, level.player_items()));
        }

        debug!(
            "world built: {width}x{height} tiles, {} entities",
            entities.len()
        );

        Self {
            width,
            height,
            tiles,
            entities,
            player,
        }
    }

    /// Captures a deep copy of every entity without touching the world.
    #[must_use]
    pub fn export_snapshot(&self) -> Snapshot {
        Snapshot {
            entities: self.entities.clone(),
        }
    }

    /// Replaces the live entity set with the snapshot's contents.
    ///
    /// Entities absent from the snapshot are dropped, surviving entities are
    /// updated in place and keep their shown position so they can animate
    /// toward the restored cell, and missing entities are recreated.
    pub fn apply_snapshot(&mut self, snapshot: &Snapshot) {
        self.entities
            .retain(|id, _| snapshot.entities.contains_key(id));

        for (id, stored) in &snapshot.entities {
            match self.entities.get_mut(id) {
                Some(live) => live.restore_from(stored),
                None => {
                    let _ = self.entities.insert(*id, stored.clone());
                }
            }
        }

        self.player = self
            .entities
            .values()
            .find(|entity| entity.role == EntityRole::Player)
            .map(|entity| entity.id);
    }

    /// Eases shown positions toward grid positions.
    pub fn animate(&mut self, dt: Duration) {
        let dt = dt.as_secs_f32();
        for entity in self.entities.values_mut() {
            let target = ShownPosition::at(entity.cell);
            entity.shown.x = exp_decay(entity.shown.x, target.x, SHOWN_DECAY_RATE, dt);
            entity.shown.y = exp_decay(entity.shown.y, target.y, SHOWN_DECAY_RATE, dt);
        }
    }

    fn tile(&self, cell: CellCoord) -> Option<&Tile> {
        if !self.contains(cell) {
            return None;
        }
        let width = usize::try_from(self.width).ok()?;
        let column = usize::try_from(cell.column()).ok()?;
        let row = usize::try_from(cell.row()).ok()?;
        self.tiles.get(row * width + column)
    }

    fn contains(&self, cell: CellCoord) -> bool {
        cell.column() < self.width && cell.row() < self.height
    }

    fn remove_entity(&mut self, id: EntityId) -> Option<Entity> {
        let removed = self.entities.remove(&id);
        if self.player == Some(id) {
            self.player = None;
        }
        removed
    }

    fn live_enemy(&self, id: EntityId) -> Option<&Entity> {
        self.entities
            .get(&id)
            .filter(|entity| entity.role.is_enemy() && !entity.is_dead())
    }

    fn open_doors(&mut self) -> u32 {
        let mut opened = 0;
        for entity in self.entities.values_mut() {
            if entity.role == (EntityRole::Door { open: false }) {
                entity.role = EntityRole::Door { open: true };
                entity.tile_index = DOOR_OPEN_TILE;
                opened += 1;
            }
        }
        opened
    }
}

/// Attempts to move `entity` by a single step.
///
/// The move is rejected when the destination lies outside the grid, is a
/// solid tile, or is occupied by any entity other than an open door. In the
/// last case the occupant is returned so the caller can resolve combat or
/// pickups; in every other case the result is `None`, whether or not the
/// entity moved.
pub fn move_entity(world: &mut World, entity: EntityId, delta: Delta) -> Option<EntityId> {
    let from = world.entities.get(&entity)?.cell;
    let destination = from.offset(delta)?;

    if world.tile(destination).map_or(true, Tile::is_solid) {
        return None;
    }

    if let Some(blocker) = world.entities.values().find(|other| {
        other.id != entity && other.cell == destination && !other.role.is_passable()
    }) {
        return Some(blocker.id);
    }

    if let Some(moving) = world.entities.get_mut(&entity) {
        moving.cell = destination;
    }
    None
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::MovePlayer { delta } => move_player(world, delta, out_events),
        Command::StepEnemy { enemy, direction } => {
            let Some(from) = world.live_enemy(enemy).map(Entity::cell) else {
                return;
            };
            let _ = move_entity(world, enemy, direction.delta());
            let to = world.entities.get(&enemy).map_or(from, Entity::cell);
            if to != from {
                out_events.push(Event::EnemyAdvanced { enemy, from, to });
            }
        }
        Command::AttackPlayer { attacker } => {
            if world.live_enemy(attacker).is_none() {
                return;
            }
            let Some(player) = world.player.and_then(|id| world.entities.get_mut(&id)) else {
                return;
            };
            player.health = player.health.saturating_sub(1);
            out_events.push(Event::PlayerHit {
                attacker,
                health: player.health,
            });
        }
        Command::UseItem => {
            let Some(player) = world.player.and_then(|id| world.entities.get_mut(&id)) else {
                return;
            };
            if player.is_dead() {
                return;
            }
            let Some(item) = player.inventory.take_selected() else {
                return;
            };
            match item {
                Item::Potion => player.health = player.max_health,
            }
            out_events.push(Event::ItemUsed {
                item,
                health: player.health,
            });
        }
        Command::CycleItem => {
            let Some(player) = world.player.and_then(|id| world.entities.get_mut(&id)) else {
                return;
            };
            if let Some(slot) = player.inventory.cycle() {
                out_events.push(Event::ItemSelected { slot });
            }
        }
    }
}

fn move_player(world: &mut World, delta: Delta, out_events: &mut Vec<Event>) {
    let Some(player_id) = world.player else {
        debug!("move ignored: level has no player");
        return;
    };
    let Some(from) = world
        .entities
        .get(&player_id)
        .filter(|player| !player.is_dead())
        .map(Entity::cell)
    else {
        return;
    };

    let collision = move_entity(world, player_id, delta);
    let to = world.entities.get(&player_id).map_or(from, Entity::cell);
    if to != from {
        out_events.push(Event::PlayerMoved { from, to });
    }

    let Some(collided) = collision.and_then(|id| world.entities.get(&id)) else {
        if to == from && !delta.is_zero() {
            out_events.push(Event::PlayerBlocked { blocker: None });
        }
        return;
    };

    let (id, role, cell) = (collided.id, collided.role, collided.cell);
    match role {
        EntityRole::Enemy(_) => {
            let _ = world.remove_entity(id);
            out_events.push(Event::EnemyKilled { enemy: id, cell });
        }
        EntityRole::Key => {
            let _ = world.remove_entity(id);
            out_events.push(Event::KeyCollected { key: id });
            let count = world.open_doors();
            out_events.push(Event::DoorsOpened { count });
        }
        EntityRole::Exit => out_events.push(Event::ExitReached { exit: id }),
        EntityRole::Player | EntityRole::Door { .. } => {
            out_events.push(Event::PlayerBlocked { blocker: Some(id) });
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use beatcrawl_core::{CellCoord, EnemySnapshot, EnemyView, EntityId, EntityRole};

    use super::{Entity, Tile, World};

    /// Width and height of the grid in tiles.
    #[must_use]
    pub fn dimensions(world: &World) -> (u32, u32) {
        (world.width, world.height)
    }

    /// Reports whether the cell lies within the grid.
    #[must_use]
    pub fn in_bounds(world: &World, cell: CellCoord) -> bool {
        world.contains(cell)
    }

    /// Reports whether the cell blocks movement. Cells outside the grid do.
    #[must_use]
    pub fn solid_at(world: &World, cell: CellCoord) -> bool {
        world.tile(cell).map_or(true, Tile::is_solid)
    }

    /// Tile stored at the cell, if it lies within the grid.
    #[must_use]
    pub fn tile_at(world: &World, cell: CellCoord) -> Option<Tile> {
        world.tile(cell).copied()
    }

    /// Rows of tiles from top to bottom.
    pub fn tile_rows(world: &World) -> impl Iterator<Item = &[Tile]> {
        let width = usize::try_from(world.width).unwrap_or(1).max(1);
        world.tiles.chunks(width)
    }

    /// Entities occupying the cell, in identifier order.
    #[must_use]
    pub fn entities_at(world: &World, cell: CellCoord) -> Vec<EntityId> {
        world
            .entities
            .values()
            .filter(|entity| entity.cell == cell)
            .map(|entity| entity.id)
            .collect()
    }

    /// Every live entity in identifier order.
    pub fn entities(world: &World) -> impl Iterator<Item = &Entity> {
        world.entities.values()
    }

    /// Entity stored under `id`, if present.
    #[must_use]
    pub fn entity(world: &World, id: EntityId) -> Option<&Entity> {
        world.entities.get(&id)
    }

    /// Player entity, if the level has one.
    #[must_use]
    pub fn player(world: &World) -> Option<&Entity> {
        world.player.and_then(|id| world.entities.get(&id))
    }

    /// Captures a read-only view of the enemies inhabiting the level.
    #[must_use]
    pub fn enemy_view(world: &World) -> EnemyView {
        let snapshots = world
            .entities
            .values()
            .filter_map(|entity| match entity.role {
                EntityRole::Enemy(kind) => Some(EnemySnapshot {
                    id: entity.id,
                    kind,
                    cell: entity.cell,
                    health: entity.health,
                }),
                _ => None,
            })
            .collect();
        EnemyView::from_snapshots(snapshots)
    }
}

fn exp_decay(current: f32, target: f32, decay: f32, dt: f32) -> f32 {
    target + (current - target) * (-decay * dt).exp()
}

fn floor_variant(cell: CellCoord) -> u32 {
    let seed = (u64::from(cell.column()) << 32) | u64::from(cell.row());
    let mixed = seed
        .wrapping_mul(6_364_136_223_846_793_005)
        .wrapping_add(1);
    FLOOR_TILE + u32::from((mixed >> 33) & 1 == 1)
}

fn cell_at(width: u32, offset: usize) -> CellCoord {
    let offset = u32::try_from(offset).unwrap_or(u32::MAX);
    let width = width.max(1);
    CellCoord::new(offset % width, offset / width)
}

#[cfg(test)]
mod tests {
    use super::*;
    use beatcrawl_core::Direction;

    fn world(rows: &[&str]) -> World {
        World::from_level(&Level::parse(rows).expect("valid level"))
    }

    fn player_cell(world: &World) -> CellCoord {
        query::player(world).expect("player").cell()
    }

    #[test]
    fn wall_blocks_move_without_collision() {
        let mut world = world(&["####", "#p##", "####"]);
        let player = query::player(&world).expect("player").id();

        let collision = move_entity(&mut world, player, Delta::new(1, 0));

        assert_eq!(collision, None);
        assert_eq!(player_cell(&world), CellCoord::new(1, 1));
    }

    #[test]
    fn occupied_cell_reports_occupant() {
        let mut world = world(&["p.s"]);
        let player = query::player(&world).expect("player").id();
        let _ = move_entity(&mut world, player, Delta::new(1, 0));

        let collision = move_entity(&mut world, player, Delta::new(1, 0));

        assert_eq!(collision, Some(EntityId::new(1)));
        assert_eq!(player_cell(&world), CellCoord::new(1, 0));
    }

    #[test]
    fn player_strike_removes_enemy_and_stays_put() {
        let mut world = world(&["ps."]);
        let mut events = Vec::new();

        apply(
            &mut world,
            Command::MovePlayer {
                delta: Delta::new(1, 0),
            },
            &mut events,
        );

        assert_eq!(player_cell(&world), CellCoord::new(0, 0));
        assert!(query::entity(&world, EntityId::new(1)).is_none());
        assert_eq!(
            events,
            vec![Event::EnemyKilled {
                enemy: EntityId::new(1),
                cell: CellCoord::new(1, 0),
            }]
        );
    }

    #[test]
    fn key_pickup_opens_every_door() {
        let mut world = world(&["pkd.d"]);
        let mut events = Vec::new();

        apply(
            &mut world,
            Command::MovePlayer {
                delta: Delta::new(1, 0),
            },
            &mut events,
        );

        assert_eq!(player_cell(&world), CellCoord::new(0, 0));
        assert!(query::entity(&world, EntityId::new(1)).is_none());
        for door in [EntityId::new(2), EntityId::new(3)] {
            let door = query::entity(&world, door).expect("door survives");
            assert_eq!(door.role(), EntityRole::Door { open: true });
            assert_eq!(door.display_tile(), DOOR_OPEN_TILE);
        }
        assert_eq!(events[1], Event::DoorsOpened { count: 2 });

        events.clear();
        for _ in 0..2 {
            apply(
                &mut world,
                Command::MovePlayer {
                    delta: Delta::new(1, 0),
                },
                &mut events,
            );
        }
        assert_eq!(player_cell(&world), CellCoord::new(2, 0));
        assert_eq!(query::entities_at(&world, CellCoord::new(2, 0)).len(), 2);
    }

    #[test]
    fn closed_door_blocks_and_reports() {
        let mut world = world(&["pd."]);
        let mut events = Vec::new();

        apply(
            &mut world,
            Command::MovePlayer {
                delta: Delta::new(1, 0),
            },
            &mut events,
        );

        assert_eq!(
            events,
            vec![Event::PlayerBlocked {
                blocker: Some(EntityId::new(1))
            }]
        );
    }

    #[test]
    fn attack_floors_player_health_at_zero() {
        let mut world = world(&["ps"]);
        let mut events = Vec::new();

        for _ in 0..5 {
            apply(
                &mut world,
                Command::AttackPlayer {
                    attacker: EntityId::new(1),
                },
                &mut events,
            );
        }

        let player = query::player(&world).expect("dead player stays");
        assert_eq!(player.health(), 0);
        assert_eq!(player.display_tile(), GHOST_TILE);
        assert_eq!(events.len(), 5);
    }

    #[test]
    fn dead_player_is_inert_but_blocks() {
        let mut world = world(&["p.s"]);
        let mut events = Vec::new();
        for _ in 0..PLAYER_HEALTH {
            apply(
                &mut world,
                Command::AttackPlayer {
                    attacker: EntityId::new(1),
                },
                &mut events,
            );
        }
        events.clear();

        apply(
            &mut world,
            Command::MovePlayer {
                delta: Delta::new(1, 0),
            },
            &mut events,
        );
        assert!(events.is_empty());

        apply(
            &mut world,
            Command::StepEnemy {
                enemy: EntityId::new(1),
                direction: Direction::West,
            },
            &mut events,
        );
        apply(
            &mut world,
            Command::StepEnemy {
                enemy: EntityId::new(1),
                direction: Direction::West,
            },
            &mut events,
        );
        let enemy = query::entity(&world, EntityId::new(1)).expect("enemy");
        assert_eq!(enemy.cell(), CellCoord::new(1, 0));
    }

    #[test]
    fn attack_without_player_is_ignored() {
        let mut world = world(&["s.."]);
        let mut events = Vec::new();

        apply(
            &mut world,
            Command::AttackPlayer {
                attacker: EntityId::new(0),
            },
            &mut events,
        );

        assert!(events.is_empty());
    }

    #[test]
    fn potion_restores_health_and_is_consumed() {
        let level = Level::parse(&["ps"])
            .expect("valid level")
            .with_player_items(vec![Item::Potion]);
        let mut world = World::from_level(&level);
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::AttackPlayer {
                attacker: EntityId::new(1),
            },
            &mut events,
        );

        apply(&mut world, Command::UseItem, &mut events);

        let player = query::player(&world).expect("player");
        assert_eq!(player.health(), PLAYER_HEALTH);
        assert!(player.inventory().items().is_empty());
        assert_eq!(
            events.last(),
            Some(&Event::ItemUsed {
                item: Item::Potion,
                health: PLAYER_HEALTH,
            })
        );
    }

    #[test]
    fn cycling_wraps_selection() {
        let level = Level::parse(&["p"])
            .expect("valid level")
            .with_player_items(vec![Item::Potion, Item::Potion]);
        let mut world = World::from_level(&level);
        let mut events = Vec::new();

        apply(&mut world, Command::CycleItem, &mut events);
        apply(&mut world, Command::CycleItem, &mut events);

        assert_eq!(
            events,
            vec![
                Event::ItemSelected { slot: 1 },
                Event::ItemSelected { slot: 0 },
            ]
        );
    }

    #[test]
    fn snapshot_round_trip_is_a_no_op() {
        let mut world = world(&["p.s", "k.d"]);
        let before = world.export_snapshot();

        world.apply_snapshot(&before);

        assert_eq!(world.export_snapshot(), before);
        assert_eq!(query::player(&world).map(Entity::id), Some(EntityId::new(0)));
    }

    #[test]
    fn applying_older_snapshot_restores_removed_entities() {
        let mut world = world(&["ps."]);
        let before = world.export_snapshot();
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::MovePlayer {
                delta: Delta::new(1, 0),
            },
            &mut events,
        );
        assert_eq!(query::entities(&world).count(), 1);

        world.apply_snapshot(&before);

        assert_eq!(world.export_snapshot(), before);
    }

    #[test]
    fn restoring_keeps_shown_position_for_animation() {
        let mut world = world(&["p.."]);
        let before = world.export_snapshot();
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::MovePlayer {
                delta: Delta::new(1, 0),
            },
            &mut events,
        );
        world.animate(Duration::from_secs(5));
        let after = world.export_snapshot();

        world.apply_snapshot(&before);

        let player = query::player(&world).expect("player");
        assert_eq!(player.cell(), CellCoord::new(0, 0));
        assert!(player.shown().x > 0.9);
        assert_eq!(after.player().map(Entity::cell), Some(CellCoord::new(1, 0)));
    }

    #[test]
    fn floor_tiles_use_two_variants() {
        let world = world(&["........", "........"]);
        let indices: std::collections::BTreeSet<u32> = query::tile_rows(&world)
            .flatten()
            .map(Tile::index)
            .collect();
        assert!(indices.iter().all(|index| (FLOOR_TILE..=FLOOR_TILE + 1).contains(index)));
    }
}

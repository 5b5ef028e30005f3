#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic enemy system that chases the player and proposes attacks.

mod navigation;

use beatcrawl_core::{CellCoord, Command, Direction, EnemyView};

use navigation::{NavigationField, UNREACHABLE};

/// Pure system that turns an enemy view into step and attack commands.
///
/// Paths only consider static obstacles, so every command for a beat can be
/// planned from the same view. The world still validates each step against
/// current occupancy when the commands are applied in order.
#[derive(Debug, Default)]
pub struct EnemyAi {
    field: NavigationField,
}

impl EnemyAi {
    /// Creates a new enemy system with an empty navigation workspace.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Emits one command per live enemy that can act this beat.
    ///
    /// An enemy next to the player attacks; an enemy with a route to the
    /// player steps one cell along it; an enemy with no route idles. Nothing
    /// is emitted when `player` is `None`.
    pub fn handle<F>(
        &mut self,
        enemies: &EnemyView,
        player: Option<CellCoord>,
        dimensions: (u32, u32),
        is_solid: F,
        out: &mut Vec<Command>,
    ) where
        F: Fn(CellCoord) -> bool,
    {
        let Some(player) = player else {
            return;
        };

        let (columns, rows) = dimensions;
        self.field.rebuild_with(columns, rows, player, is_solid);

        for enemy in enemies.iter() {
            if enemy.health == 0 {
                continue;
            }

            let Some(distance) = self.field.distance(enemy.cell) else {
                continue;
            };

            // Walled off from the player: the enemy idles rather than attacking.
            if distance == UNREACHABLE {
                continue;
            }

            if distance <= 1 {
                out.push(Command::AttackPlayer { attacker: enemy.id });
                continue;
            }

            let Some(direction) = self
                .field
                .downhill(enemy.cell)
                .and_then(|next| Direction::between(enemy.cell, next))
            else {
                continue;
            };

            out.push(Command::StepEnemy {
                enemy: enemy.id,
                direction,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use beatcrawl_core::{EnemyKind, EnemySnapshot, EntityId};

    fn snake(id: u32, cell: CellCoord, health: u32) -> EnemySnapshot {
        EnemySnapshot {
            id: EntityId::new(id),
            kind: EnemyKind::Snake,
            cell,
            health,
        }
    }

    #[test]
    fn no_player_emits_nothing() {
        let mut ai = EnemyAi::new();
        let view = EnemyView::from_snapshots(vec![snake(1, CellCoord::new(0, 0), 1)]);
        let mut out = Vec::new();

        ai.handle(&view, None, (3, 3), |_| false, &mut out);

        assert!(out.is_empty());
    }

    #[test]
    fn dead_enemies_are_inert() {
        let mut ai = EnemyAi::new();
        let view = EnemyView::from_snapshots(vec![snake(1, CellCoord::new(0, 1), 0)]);
        let mut out = Vec::new();

        ai.handle(&view, Some(CellCoord::new(0, 0)), (3, 3), |_| false, &mut out);

        assert!(out.is_empty());
    }

    #[test]
    fn commands_follow_identifier_order() {
        let mut ai = EnemyAi::new();
        let view = EnemyView::from_snapshots(vec![
            snake(7, CellCoord::new(2, 2), 1),
            snake(3, CellCoord::new(1, 0), 1),
        ]);
        let mut out = Vec::new();

        ai.handle(&view, Some(CellCoord::new(0, 0)), (3, 3), |_| false, &mut out);

        assert_eq!(
            out,
            vec![
                Command::AttackPlayer {
                    attacker: EntityId::new(3)
                },
                Command::StepEnemy {
                    enemy: EntityId::new(7),
                    direction: Direction::North,
                },
            ]
        );
    }
}

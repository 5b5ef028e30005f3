//! Distance field toward the player used to pick enemy steps.

use std::collections::VecDeque;

use beatcrawl_core::CellCoord;

/// Distance recorded for cells the search never reached.
pub(crate) const UNREACHABLE: u16 = u16::MAX;

/// Dense orthogonal-distance grid seeded from a single goal cell.
///
/// The field is rebuilt with a reverse breadth-first search over the static
/// obstacle mask, so following strictly decreasing distances from any cell
/// traces one shortest path to the goal. Neighbours are always visited in
/// north, east, south, west order, which makes the chosen path a pure
/// function of the mask.
#[derive(Clone, Debug, Default)]
pub(crate) struct NavigationField {
    width: u32,
    height: u32,
    distances: Vec<u16>,
}

impl NavigationField {
    /// Rebuilds the navigation distances using a reverse breadth-first search.
    pub(crate) fn rebuild_with<F>(&mut self, width: u32, height: u32, goal: CellCoord, is_blocked: F)
    where
        F: Fn(CellCoord) -> bool,
    {
        let width_usize = usize::try_from(width).unwrap_or(0);
        let height_usize = usize::try_from(height).unwrap_or(0);
        let cell_count = width_usize.checked_mul(height_usize).unwrap_or(0);

        self.width = width;
        self.height = height;

        if cell_count == 0 {
            self.distances.clear();
            return;
        }

        if self.distances.len() != cell_count {
            self.distances = vec![UNREACHABLE; cell_count];
        } else {
            self.distances.fill(UNREACHABLE);
        }

        if goal.column() >= width || goal.row() >= height {
            return;
        }
        let Some(goal_index) = index(width_usize, goal) else {
            return;
        };
        self.distances[goal_index] = 0;

        let mut queue = VecDeque::from([goal]);
        while let Some(cell) = queue.pop_front() {
            let Some(current_index) = index(width_usize, cell) else {
                continue;
            };
            let current_distance = self.distances[current_index];

            if current_distance >= UNREACHABLE.saturating_sub(1) {
                continue;
            }

            let next_distance = current_distance + 1;

            for neighbor in neighbors(cell, width, height) {
                if is_blocked(neighbor) {
                    continue;
                }

                let Some(neighbor_index) = index(width_usize, neighbor) else {
                    continue;
                };

                if self.distances[neighbor_index] <= next_distance {
                    continue;
                }

                self.distances[neighbor_index] = next_distance;
                queue.push_back(neighbor);
            }
        }
    }

    /// Distance captured for the provided cell, if it lies within the field.
    #[must_use]
    pub(crate) fn distance(&self, cell: CellCoord) -> Option<u16> {
        if cell.column() >= self.width || cell.row() >= self.height {
            return None;
        }

        let width = usize::try_from(self.width).ok()?;
        index(width, cell).and_then(|offset| self.distances.get(offset).copied())
    }

    /// First neighbour of `cell` one step closer to the goal.
    #[must_use]
    pub(crate) fn downhill(&self, cell: CellCoord) -> Option<CellCoord> {
        let current = self.distance(cell)?;
        if current == 0 || current == UNREACHABLE {
            return None;
        }

        neighbors(cell, self.width, self.height)
            .find(|neighbor| self.distance(*neighbor) == Some(current - 1))
    }
}

fn neighbors(cell: CellCoord, width: u32, height: u32) -> impl Iterator<Item = CellCoord> {
    let mut candidates = [None; 4];
    let mut count = 0;

    if let Some(row) = cell.row().checked_sub(1) {
        candidates[count] = Some(CellCoord::new(cell.column(), row));
        count += 1;
    }

    if let Some(column) = cell.column().checked_add(1) {
        if column < width {
            candidates[count] = Some(CellCoord::new(column, cell.row()));
            count += 1;
        }
    }

    if let Some(row) = cell.row().checked_add(1) {
        if row < height {
            candidates[count] = Some(CellCoord::new(cell.column(), row));
            count += 1;
        }
    }

    if let Some(column) = cell.column().checked_sub(1) {
        candidates[count] = Some(CellCoord::new(column, cell.row()));
        count += 1;
    }

    candidates.into_iter().take(count).flatten()
}

fn index(width: usize, cell: CellCoord) -> Option<usize> {
    let column = usize::try_from(cell.column()).ok()?;
    let row = usize::try_from(cell.row()).ok()?;
    row.checked_mul(width)?.checked_add(column)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rebuild_with_sets_goal_cell_to_zero() {
        let mut field = NavigationField::default();

        field.rebuild_with(3, 4, CellCoord::new(1, 2), |_| false);

        assert_eq!(field.distance(CellCoord::new(1, 2)), Some(0));
        assert_eq!(field.distance(CellCoord::new(1, 1)), Some(1));
        assert_eq!(field.distance(CellCoord::new(1, 0)), Some(2));
        assert_eq!(field.distance(CellCoord::new(0, 0)), Some(3));
    }

    #[test]
    fn rebuild_with_respects_walls() {
        let mut field = NavigationField::default();
        let wall = CellCoord::new(1, 1);

        field.rebuild_with(3, 4, CellCoord::new(1, 2), |cell| cell == wall);

        assert_eq!(field.distance(wall), Some(UNREACHABLE));
        assert_eq!(field.distance(CellCoord::new(1, 0)), Some(4));
        assert_eq!(field.distance(CellCoord::new(0, 1)), Some(2));
    }

    #[test]
    fn downhill_prefers_north_then_east() {
        let mut field = NavigationField::default();
        field.rebuild_with(3, 3, CellCoord::new(2, 0), |_| false);

        assert_eq!(
            field.downhill(CellCoord::new(0, 2)),
            Some(CellCoord::new(0, 1))
        );
        assert_eq!(
            field.downhill(CellCoord::new(1, 0)),
            Some(CellCoord::new(2, 0))
        );
        assert_eq!(field.downhill(CellCoord::new(2, 0)), None);
    }

    #[test]
    fn downhill_is_none_for_unreachable_cells() {
        let mut field = NavigationField::default();
        let wall_column = 1;
        field.rebuild_with(3, 1, CellCoord::new(0, 0), |cell| cell.column() == wall_column);

        assert_eq!(field.downhill(CellCoord::new(2, 0)), None);
    }
}

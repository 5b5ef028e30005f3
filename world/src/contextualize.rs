//! Orientation pass that picks wall and pit sub-variants from their surroundings.

use beatcrawl_core::{TileKind, WallShape};

const WINDOW: usize = 3;

/// Rewrites every wall and pit in `tiles` with the shape its 3x3
/// neighbourhood selects.
///
/// Cells are visited in row-major order and rewritten in place, so the
/// neighbours above and to the left contribute their already resolved shape
/// while the remaining neighbours contribute their authored shape. Cells
/// outside the grid, and cells of another category, count as absent.
pub(crate) fn contextualize(tiles: &mut [TileKind], width: u32, height: u32) {
    for row in 0..height {
        for column in 0..width {
            let Some(index) = index(width, column, row) else {
                continue;
            };
            let Some(tile) = tiles.get(index).copied() else {
                continue;
            };

            let resolved = match tile {
                TileKind::Empty => continue,
                TileKind::Wall(_) => {
                    TileKind::Wall(select_shape(neighbourhood(tiles, width, height, column, row, is_wall)))
                }
                TileKind::Pit(_) => {
                    TileKind::Pit(select_shape(neighbourhood(tiles, width, height, column, row, is_pit)))
                }
            };
            tiles[index] = resolved;
        }
    }
}

fn neighbourhood(
    tiles: &[TileKind],
    width: u32,
    height: u32,
    column: u32,
    row: u32,
    category: fn(TileKind) -> Option<WallShape>,
) -> [[u8; WINDOW]; WINDOW] {
    let mut codes = [[0; WINDOW]; WINDOW];
    for (dy, line) in codes.iter_mut().enumerate() {
        for (dx, code) in line.iter_mut().enumerate() {
            let Some(sample_column) = (column + dx as u32).checked_sub(1) else {
                continue;
            };
            let Some(sample_row) = (row + dy as u32).checked_sub(1) else {
                continue;
            };
            if sample_column >= width || sample_row >= height {
                continue;
            }
            *code = index(width, sample_column, sample_row)
                .and_then(|offset| tiles.get(offset).copied())
                .and_then(category)
                .map_or(0, WallShape::code);
        }
    }
    codes
}

fn select_shape(codes: [[u8; WINDOW]; WINDOW]) -> WallShape {
    match codes {
        [_, [_, 1, 1], [_, 1, _]] => WallShape::BackCornerLeft,
        [_, [4, 1, _], [_, 1, _]] => WallShape::BackCornerRight,
        [[_, 5, _], [_, 1, 1], _] => WallShape::FrontCornerLeft,
        [[_, 6, _], [1, 1, _], _] => WallShape::FrontCornerRight,
        [_, [2 | 4, _, _], _] => WallShape::BackWall,
        [[_, 5 | 2, _], [_, 1, _], _] => WallShape::LeftVertical,
        [[_, 6 | 3, _], [_, 1, _], _] => WallShape::RightVertical,
        _ => WallShape::Plain,
    }
}

fn is_wall(tile: TileKind) -> Option<WallShape> {
    match tile {
        TileKind::Wall(shape) => Some(shape),
        _ => None,
    }
}

fn is_pit(tile: TileKind) -> Option<WallShape> {
    match tile {
        TileKind::Pit(shape) => Some(shape),
        _ => None,
    }
}

fn index(width: u32, column: u32, row: u32) -> Option<usize> {
    let width = usize::try_from(width).ok()?;
    let column = usize::try_from(column).ok()?;
    let row = usize::try_from(row).ok()?;
    row.checked_mul(width)?.checked_add(column)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::Level;

    fn shapes(rows: &[&str]) -> Vec<Vec<Option<WallShape>>> {
        let level = Level::parse(rows).expect("valid level");
        let mut tiles = level.tiles().to_vec();
        contextualize(&mut tiles, level.width(), level.height());
        tiles
            .chunks(level.width() as usize)
            .map(|line| line.iter().map(|tile| is_wall(*tile)).collect())
            .collect()
    }

    #[test]
    fn closed_room_gets_oriented_corners_and_sides() {
        use WallShape::*;

        let resolved = shapes(&["#####", "#...#", "#####"]);

        assert_eq!(
            resolved[0],
            vec![
                Some(BackCornerLeft),
                Some(BackWall),
                Some(BackWall),
                Some(BackWall),
                Some(BackCornerRight),
            ]
        );
        assert_eq!(resolved[1][0], Some(LeftVertical));
        assert_eq!(resolved[1][4], Some(RightVertical));
        assert_eq!(resolved[2][0], Some(FrontCornerLeft));
        assert_eq!(resolved[2][2], Some(Plain));
        assert_eq!(resolved[2][4], Some(FrontCornerRight));
    }

    #[test]
    fn isolated_wall_defaults_to_plain() {
        let resolved = shapes(&["...", ".#.", "..."]);
        assert_eq!(resolved[1][1], Some(WallShape::Plain));
    }

    #[test]
    fn pits_ignore_neighbouring_walls() {
        let level = Level::parse(&["##", "oo"]).expect("valid level");
        let mut tiles = level.tiles().to_vec();
        contextualize(&mut tiles, level.width(), level.height());

        assert!(tiles[2..].iter().all(|tile| matches!(tile, TileKind::Pit(_))));
        assert_eq!(tiles[2], TileKind::Pit(WallShape::Plain));
    }

    #[test]
    fn pass_is_deterministic() {
        let rows = ["#######", "#..#..#", "#.###.#", "#######"];
        assert_eq!(shapes(&rows), shapes(&rows));
    }
}

//! Plain-text frame of the dungeon and sequencer used by the headless adapter.

use std::fmt::Write as _;

use beatcrawl_core::{EnemyKind, EntityRole, Input, TileKind};
use beatcrawl_system_playhead::Playhead;
use beatcrawl_system_timeline::Timeline;
use beatcrawl_world::{query, Entity, World};

/// Renders the grid, the player status line and one row per track.
pub(crate) fn frame(world: &World, timeline: &Timeline, playhead: &Playhead) -> String {
    let mut out = String::new();
    for line in grid(world) {
        out.push_str(&line);
        out.push('\n');
    }

    match query::player(world) {
        Some(player) => {
            let _ = writeln!(
                out,
                "health {}/{}  items {:?}",
                player.health(),
                player.max_health(),
                player.inventory().items()
            );
        }
        None => out.push_str("no player\n"),
    }

    let _ = writeln!(
        out,
        "beat {} ({:?})",
        playhead.beat(),
        playhead.transport()
    );
    let current = u32::try_from(playhead.beat().max(0)).unwrap_or(u32::MAX);
    for track in timeline.tracks() {
        let local = track.local_beat(current);
        let lane: String = (0..track.repeat_length())
            .map(|beat| {
                let glyph = input_glyph(track.input_at(beat));
                if beat == local {
                    format!("[{glyph}]")
                } else {
                    format!(" {glyph} ")
                }
            })
            .collect();
        let _ = writeln!(out, "{} |{lane}|", track.name());
    }

    out
}

/// Character rows of the grid with entities drawn over their tiles.
pub(crate) fn grid(world: &World) -> Vec<String> {
    let mut rows: Vec<Vec<char>> = query::tile_rows(world)
        .map(|row| row.iter().map(|tile| tile_glyph(tile.kind())).collect())
        .collect();

    let mut entities: Vec<&Entity> = query::entities(world).collect();
    entities.sort_by_key(|entity| draw_layer(entity));
    for entity in entities {
        let cell = entity.cell();
        let (Ok(row), Ok(column)) = (usize::try_from(cell.row()), usize::try_from(cell.column()))
        else {
            continue;
        };
        if let Some(slot) = rows.get_mut(row).and_then(|row| row.get_mut(column)) {
            *slot = entity_glyph(entity);
        }
    }

    rows.into_iter().map(|row| row.into_iter().collect()).collect()
}

/// Entities on higher layers are drawn over those sharing their cell.
fn draw_layer(entity: &Entity) -> u8 {
    match entity.role() {
        EntityRole::Door { open: true } | EntityRole::Exit => 0,
        EntityRole::Door { open: false } | EntityRole::Key => 1,
        EntityRole::Enemy(_) => 2,
        EntityRole::Player => 3,
    }
}

fn tile_glyph(kind: TileKind) -> char {
    match kind {
        TileKind::Empty => '.',
        TileKind::Wall(_) => '#',
        TileKind::Pit(_) => 'o',
    }
}

fn entity_glyph(entity: &Entity) -> char {
    match entity.role() {
        EntityRole::Player if entity.is_dead() => 'g',
        EntityRole::Player => 'p',
        EntityRole::Enemy(EnemyKind::Snake) => 's',
        EntityRole::Enemy(EnemyKind::Rat) => 'r',
        EntityRole::Key => 'k',
        EntityRole::Door { open: false } => 'd',
        EntityRole::Door { open: true } => '\'',
        EntityRole::Exit => 'X',
    }
}

fn input_glyph(input: Input) -> char {
    match input {
        Input::Empty => '.',
        Input::Up => '^',
        Input::Down => 'v',
        Input::Left => '<',
        Input::Right => '>',
        Input::UseItem => 'u',
        Input::CycleItem => 'c',
        Input::Wait => '-',
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use beatcrawl_core::{CellCoord, Command, Delta};
    use beatcrawl_system_playhead::Config;
    use beatcrawl_system_timeline::{SequenceId, Track, TrackColor};
    use beatcrawl_world::Level;

    #[test]
    fn grid_draws_entities_over_tiles() {
        let world = World::from_level(&Level::parse(&["#####", "#pkd#", "#o.X#"]).expect("level"));

        assert_eq!(grid(&world), vec!["#####", "#pkd#", "#o.X#"]);
    }

    #[test]
    fn player_is_drawn_over_an_open_door() {
        let mut world = World::from_level(&Level::parse(&["pkd."]).expect("level"));
        let mut events = Vec::new();
        for _ in 0..3 {
            beatcrawl_world::apply(
                &mut world,
                Command::MovePlayer {
                    delta: Delta::new(1, 0),
                },
                &mut events,
            );
        }

        assert_eq!(
            query::player(&world).expect("player").cell(),
            CellCoord::new(2, 0)
        );
        assert_eq!(grid(&world), vec!["..p."]);
    }

    #[test]
    fn frame_marks_playhead_on_each_lane() {
        let world = World::from_level(&Level::parse(&["p."]).expect("level"));
        let mut timeline = Timeline::new(vec![Track::new(
            "A",
            TrackColor::from_rgb(0x99, 0x55, 0x55),
            3,
        )]);
        let _ = timeline
            .place(0, 1, SequenceId::new(0), vec![Input::Right, Input::Wait])
            .expect("placement");
        let playhead = Playhead::new(Config::default());

        let rendered = frame(&world, &timeline, &playhead);

        assert!(rendered.starts_with("p.\nhealth 3/3"));
        assert!(rendered.ends_with("A |[.] >  - |\n"));
    }
}

#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs a Beatcrawl puzzle headlessly.
//!
//! ```bash
//! beatcrawl --puzzle "Locked Door" --place A:0:0 --place A:2:2 --beats 12
//! beatcrawl --puzzle Beginnings --puzzle Cellar --place A:0:0
//! ```

mod audio;
mod render;
mod session;

use std::{fs, path::PathBuf, str::FromStr, time::Duration};

use anyhow::{bail, Context, Result};
use beatcrawl_levels::{Catalog, Puzzle};
use beatcrawl_system_playback::{Config as PlaybackConfig, InvalidationPolicy};
use beatcrawl_system_playhead::Config as PlayheadConfig;
use beatcrawl_system_timeline::SequenceId;
use clap::{Parser, ValueEnum};
use env_logger::Env;
use log::{info, warn};

use audio::LogAudio;
use session::Session;

const FRAME: Duration = Duration::from_millis(16);
const MAX_FRAMES: u32 = 1_000_000;

/// Headless Beatcrawl runner.
#[derive(Debug, Parser)]
#[command(name = "beatcrawl", version)]
#[command(about = "Place input sequences on the sequencer and watch the dungeon play out")]
struct Args {
    /// Puzzle catalogue to load instead of the built-in one
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Puzzle to play; repeat to run the same placements on several puzzles
    #[arg(long = "puzzle", default_value = "Beginnings")]
    puzzles: Vec<String>,

    /// Sequence placement as TRACK:BEAT:SEQUENCE, e.g. `A:0:1`
    #[arg(long = "place")]
    placements: Vec<PlacementArg>,

    /// Sequence to return to the palette after all placements
    #[arg(long = "lift")]
    lifts: Vec<u32>,

    /// Beat to play up to before printing the final frame
    #[arg(long, default_value_t = 10)]
    beats: u32,

    /// Wall-clock length of one beat
    #[arg(long, default_value_t = 0.5)]
    seconds_per_beat: f64,

    /// Play at double speed
    #[arg(long)]
    fast_forward: bool,

    /// Snapshot invalidation strategy used after edits
    #[arg(long, value_enum, default_value_t = Invalidation::Full)]
    invalidation: Invalidation,

    /// List the puzzles in the catalogue and exit
    #[arg(long)]
    list: bool,

    /// Enable debug logging unless `RUST_LOG` says otherwise
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Invalidation {
    Full,
    Earliest,
}

impl From<Invalidation> for InvalidationPolicy {
    fn from(value: Invalidation) -> Self {
        match value {
            Invalidation::Full => Self::Full,
            Invalidation::Earliest => Self::EarliestAffectedBeat,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct PlacementArg {
    track: usize,
    beat: u32,
    sequence: SequenceId,
}

impl FromStr for PlacementArg {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let mut parts = value.split(':');
        let (Some(track), Some(beat), Some(sequence), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(format!("expected TRACK:BEAT:SEQUENCE, got `{value}`"));
        };

        let track = parse_track(track)?;
        let beat = beat
            .parse()
            .map_err(|_| format!("invalid beat `{beat}`"))?;
        let sequence = sequence
            .parse()
            .map(SequenceId::new)
            .map_err(|_| format!("invalid sequence `{sequence}`"))?;

        Ok(Self {
            track,
            beat,
            sequence,
        })
    }
}

fn parse_track(value: &str) -> Result<usize, String> {
    if let Ok(index) = value.parse() {
        return Ok(index);
    }
    match value {
        "A" | "a" => Ok(0),
        "B" | "b" => Ok(1),
        "C" | "c" => Ok(2),
        _ => Err(format!("invalid track `{value}`")),
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let default_filter = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter)).init();

    let catalog = load_catalog(args.catalog.as_ref())?;
    if args.list {
        for puzzle in catalog.puzzles() {
            println!("{}", puzzle.name());
        }
        return Ok(());
    }

    if args.seconds_per_beat <= 0.0 {
        bail!("--seconds-per-beat must be positive");
    }

    let (first, rest) = args
        .puzzles
        .split_first()
        .context("no puzzle selected")?;
    let mut session = Session::load(
        select(&catalog, first)?,
        PlaybackConfig::new(args.invalidation.into()),
        PlayheadConfig::new(args.seconds_per_beat),
        LogAudio::default(),
    )
    .context("failed to load puzzle")?;
    run(&mut session, first, &args)?;

    for name in rest {
        session
            .reload(select(&catalog, name)?)
            .with_context(|| format!("failed to reload into puzzle `{name}`"))?;
        run(&mut session, name, &args)?;
    }

    info!("{} sound cues played", session.audio().played());
    Ok(())
}

fn select<'a>(catalog: &'a Catalog, name: &str) -> Result<&'a Puzzle> {
    catalog
        .get(name)
        .with_context(|| format!("failed to select puzzle `{name}`"))
}

/// Applies the edits, plays up to the target beat and prints the final frame.
fn run(session: &mut Session<LogAudio>, name: &str, args: &Args) -> Result<()> {
    for placement in &args.placements {
        session
            .place(placement.sequence, placement.track, placement.beat)
            .with_context(|| format!("failed to apply placement {placement:?}"))?;
    }
    for sequence in &args.lifts {
        session
            .lift(SequenceId::new(*sequence))
            .with_context(|| format!("failed to lift sequence {sequence}"))?;
    }

    if args.fast_forward {
        session.playhead_mut().press_fast_forward();
    } else {
        session.playhead_mut().press_play();
    }

    let target = i64::from(args.beats);
    let mut frames = 0;
    while session.playhead().beat() < target {
        if frames == MAX_FRAMES {
            warn!("stopped after {MAX_FRAMES} frames short of beat {target}");
            break;
        }
        session.tick(FRAME);
        frames += 1;
    }

    if args.puzzles.len() > 1 {
        println!("== {name}");
    }
    print!(
        "{}",
        render::frame(session.world(), session.timeline(), session.playhead())
    );
    if session.exit_reached() {
        println!("exit reached");
    }
    Ok(())
}

fn load_catalog(path: Option<&PathBuf>) -> Result<Catalog> {
    let Some(path) = path else {
        return Catalog::builtin().context("built-in puzzle catalogue is invalid");
    };
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read puzzle catalogue at {}", path.display()))?;
    Catalog::from_toml(&contents)
        .with_context(|| format!("failed to load puzzle catalogue at {}", path.display()))
}

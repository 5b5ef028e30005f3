#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Transport controls that move a continuous playhead across the timeline.

use std::time::Duration;

use beatcrawl_core::Event;
use beatcrawl_system_playback::PlaybackManager;
use beatcrawl_system_timeline::Timeline;
use beatcrawl_world::World;
use log::debug;

const DEFAULT_SECONDS_PER_BEAT: f64 = 0.5;

/// Automatic motion applied to the playhead between ticks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Transport {
    /// The playhead holds still.
    #[default]
    Stopped,
    /// The playhead advances one beat per beat period.
    Playing,
    /// The playhead moves backwards at normal speed.
    Rewinding,
    /// The playhead advances at double speed.
    FastForwarding,
}

impl Transport {
    /// Beats travelled per beat period.
    #[must_use]
    pub const fn rate(self) -> f64 {
        match self {
            Self::Stopped => 0.0,
            Self::Playing => 1.0,
            Self::Rewinding => -1.0,
            Self::FastForwarding => 2.0,
        }
    }
}

/// Configuration applied to the playhead.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Config {
    seconds_per_beat: f64,
}

impl Config {
    /// Creates a new playhead configuration.
    #[must_use]
    pub const fn new(seconds_per_beat: f64) -> Self {
        Self { seconds_per_beat }
    }

    /// Wall-clock length of one beat.
    #[must_use]
    pub const fn seconds_per_beat(&self) -> f64 {
        self.seconds_per_beat
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(DEFAULT_SECONDS_PER_BEAT)
    }
}

/// Continuous timeline position plus its transport state.
///
/// Every time the integer beat under the playhead changes, the playback
/// manager is asked to load that beat into the world.
#[derive(Clone, Debug)]
pub struct Playhead {
    config: Config,
    position: f64,
    transport: Transport,
    dragging: bool,
    loaded_beat: i64,
}

impl Playhead {
    /// Creates a stopped playhead at beat zero.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            position: 0.0,
            transport: Transport::Stopped,
            dragging: false,
            loaded_beat: 0,
        }
    }

    /// Configuration the playhead was created with.
    #[must_use]
    pub const fn config(&self) -> Config {
        self.config
    }

    /// Continuous position in beats.
    #[must_use]
    pub const fn position(&self) -> f64 {
        self.position
    }

    /// Integer beat under the playhead.
    #[must_use]
    pub fn beat(&self) -> i64 {
        self.position.floor() as i64
    }

    /// Current transport state.
    #[must_use]
    pub const fn transport(&self) -> Transport {
        self.transport
    }

    /// Reports whether the position is being set by a pointer.
    #[must_use]
    pub const fn is_dragging(&self) -> bool {
        self.dragging
    }

    /// Toggles between stopped and playing; stops any other motion.
    pub fn press_play(&mut self) {
        self.set_transport(match self.transport {
            Transport::Stopped => Transport::Playing,
            _ => Transport::Stopped,
        });
    }

    /// Toggles between stopped and rewinding; stops any other motion.
    pub fn press_rewind(&mut self) {
        self.set_transport(match self.transport {
            Transport::Stopped => Transport::Rewinding,
            _ => Transport::Stopped,
        });
    }

    /// Toggles fast-forward on top of playback.
    ///
    /// Pressing it while rewinding switches to normal playback.
    pub fn press_fast_forward(&mut self) {
        self.set_transport(match self.transport {
            Transport::Stopped | Transport::Playing => Transport::FastForwarding,
            Transport::FastForwarding | Transport::Rewinding => Transport::Playing,
        });
    }

    /// Hands position control to a pointer.
    pub fn begin_drag(&mut self) {
        self.dragging = true;
    }

    /// Moves the playhead to the pointer's projected position, clamped at zero.
    pub fn drag_to(&mut self, position: f64) {
        if self.dragging {
            self.position = position.max(0.0);
        }
    }

    /// Returns position control to the transport.
    pub fn end_drag(&mut self) {
        self.dragging = false;
    }

    /// Advances the playhead and loads the beat under it when it changes.
    pub fn tick(
        &mut self,
        dt: Duration,
        world: &mut World,
        timeline: &Timeline,
        playback: &mut PlaybackManager,
        out_events: &mut Vec<Event>,
    ) {
        if !self.dragging {
            let travelled =
                self.transport.rate() * dt.as_secs_f64() / self.config.seconds_per_beat;
            self.position += travelled;
            if self.position <= 0.0 {
                self.position = 0.0;
                if self.transport == Transport::Rewinding {
                    self.set_transport(Transport::Stopped);
                }
            }
        }

        let beat = self.beat();
        if beat != self.loaded_beat {
            self.loaded_beat = beat;
            playback.ensure(beat, world, timeline, out_events);
        }
    }

    /// Reloads the beat under the playhead, typically after a timeline edit.
    pub fn resync(
        &mut self,
        world: &mut World,
        timeline: &Timeline,
        playback: &mut PlaybackManager,
        out_events: &mut Vec<Event>,
    ) {
        self.loaded_beat = self.beat();
        playback.ensure(self.loaded_beat, world, timeline, out_events);
    }

    fn set_transport(&mut self, transport: Transport) {
        if transport != self.transport {
            debug!("transport {:?} -> {transport:?}", self.transport);
            self.transport = transport;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn play_toggles_and_stops_other_motion() {
        let mut playhead = Playhead::new(Config::default());
        playhead.press_play();
        assert_eq!(playhead.transport(), Transport::Playing);
        playhead.press_play();
        assert_eq!(playhead.transport(), Transport::Stopped);

        playhead.press_rewind();
        playhead.press_play();
        assert_eq!(playhead.transport(), Transport::Stopped);
    }

    #[test]
    fn rewind_and_fast_forward_exclude_each_other() {
        let mut playhead = Playhead::new(Config::default());
        playhead.press_rewind();
        assert_eq!(playhead.transport(), Transport::Rewinding);
        playhead.press_fast_forward();
        assert_eq!(playhead.transport(), Transport::Playing);

        playhead.press_play();
        playhead.press_fast_forward();
        assert_eq!(playhead.transport(), Transport::FastForwarding);
        playhead.press_rewind();
        assert_eq!(playhead.transport(), Transport::Stopped);
    }

    #[test]
    fn fast_forward_toggles_with_playing() {
        let mut playhead = Playhead::new(Config::default());
        playhead.press_play();
        playhead.press_fast_forward();
        assert_eq!(playhead.transport(), Transport::FastForwarding);
        assert_eq!(playhead.transport().rate(), 2.0);
        playhead.press_fast_forward();
        assert_eq!(playhead.transport(), Transport::Playing);
    }

    #[test]
    fn drag_clamps_at_zero_and_requires_drag_mode() {
        let mut playhead = Playhead::new(Config::default());
        playhead.drag_to(4.0);
        assert_eq!(playhead.position(), 0.0);

        playhead.begin_drag();
        playhead.drag_to(-3.5);
        assert_eq!(playhead.position(), 0.0);
        playhead.drag_to(2.75);
        assert_eq!(playhead.beat(), 2);
        playhead.end_drag();
        assert!(!playhead.is_dragging());
    }
}

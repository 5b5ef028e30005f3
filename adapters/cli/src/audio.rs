use beatcrawl_core::{AudioSink, SoundCue};
use log::info;

/// Audio collaborator for headless runs: logs every cue instead of playing it.
#[derive(Debug, Default)]
pub(crate) struct LogAudio {
    played: usize,
}

impl LogAudio {
    /// Number of cues received so far.
    #[must_use]
    pub(crate) fn played(&self) -> usize {
        self.played
    }
}

impl AudioSink for LogAudio {
    fn play(&mut self, cue: SoundCue) {
        self.played += 1;
        info!("sound cue: {cue:?}");
    }
}

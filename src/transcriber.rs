use crate::transcript::{no_segments, Segments};

use std::path::Path;

use log::{error, info};

/// Speech-to-text engine producing word-level timestamps.
pub trait SpeechRecognizer {
    fn transcribe(&self, audio: &Path) -> anyhow::Result<Segments>;
}

/// Runs `recognizer` on `audio`, containing any failure.
///
/// A failed transcription is logged and yields no segments, so the run
/// continues with nothing to caption instead of aborting.
pub fn transcribe(recognizer: &dyn SpeechRecognizer, audio: &Path) -> Segments {
    info!("Starting audio transcription with word-level timestamps...");
    match recognizer.transcribe(audio) {
        Ok(segments) => {
            info!("Transcription completed with word-level timestamps.");
            segments
        }
        Err(err) => {
            error!("Error during transcription: {:#}", err);
            no_segments()
        }
    }
}

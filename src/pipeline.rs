use crate::audio::AudioExtractor;
use crate::cues::CueBuilder;
use crate::error::SubtitlerError;
use crate::parser;
use crate::serialiser;
use crate::transcriber::{self, SpeechRecognizer};

use std::path::PathBuf;

use anyhow::{Context, Result};
use log::{info, warn};

pub struct PipelineOpts {
    pub video: PathBuf,
    pub output: PathBuf,
    pub audio: PathBuf,
    pub verify: bool,
}

/// Extracts, transcribes and captions `opts.video`, returning the number of
/// cues written to `opts.output`.
///
/// The transient audio file is removed once writing has been attempted.
/// Extraction failures abort before anything is written.
pub fn run(
    opts: &PipelineOpts,
    extractor: &dyn AudioExtractor,
    recognizer: &dyn SpeechRecognizer,
) -> Result<usize> {
    info!("Starting audio extraction...");
    extractor.extract(&opts.video, &opts.audio)?;
    info!(
        "Audio extraction completed. Audio file saved to: {}",
        opts.audio.display()
    );

    let segments = transcriber::transcribe(recognizer, &opts.audio);

    info!("Starting SRT file writing with word-level timestamps...");
    let mut emitted: Vec<(usize, String)> = Vec::new();
    let cues = CueBuilder::new(segments).inspect(|cue| {
        if opts.verify {
            emitted.push((cue.index, cue.text.clone()));
        }
    });
    let written = serialiser::serialise(cues, &opts.output);

    let cleanup = std::fs::remove_file(&opts.audio).context(format!(
        "Failed to remove audio file: '{}'",
        opts.audio.display()
    ));
    let written = written?;
    cleanup?;
    info!("Cleanup completed.");

    if written == 0 {
        warn!("No text segments found. Check audio or transcription parameters.");
    }
    info!("SRT file written to {} ({} cues).", opts.output.display(), written);

    if opts.verify {
        verify(opts, &emitted)?;
    }
    Ok(written)
}

/// Reads `opts.output` back and checks it holds exactly the `emitted`
/// cues, by index and text, in order.
fn verify(opts: &PipelineOpts, emitted: &[(usize, String)]) -> Result<()> {
    let data = std::fs::read_to_string(&opts.output)
        .context(format!("Failed to open output file: '{}'", opts.output.display()))?;
    let cues = parser::parse(&data)
        .context(format!("Failed to verify '{}'", opts.output.display()))?;
    if cues.len() != emitted.len() {
        return Err(SubtitlerError::VerificationFailed {
            expected: emitted.len(),
            found: cues.len(),
        }
        .into());
    }
    for (position, (cue, (index, text))) in cues.iter().zip(emitted).enumerate() {
        if cue.index != *index || cue.text != *text {
            return Err(SubtitlerError::CueMismatch {
                index: position + 1,
                expected: format!("#{} {:?}", index, text),
                found: format!("#{} {:?}", cue.index, cue.text),
            }
            .into());
        }
    }
    info!("Verified {} cues in {}.", emitted.len(), opts.output.display());
    Ok(())
}

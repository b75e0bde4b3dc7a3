use std::error::Error;
use std::fmt;
use std::path::PathBuf;
use std::process::ExitStatus;

#[derive(Debug)]
pub enum SubtitlerError {
    ParseError(String),
    ExtractionFailed { tool: String, status: ExitStatus },
    ModelNotFound(PathBuf),
    UnsupportedAudio(String),
    VerificationFailed { expected: usize, found: usize },
    CueMismatch { index: usize, expected: String, found: String },
}

impl Error for SubtitlerError {}

impl fmt::Display for SubtitlerError {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SubtitlerError::ParseError(msg) => write!(fmt, "{}", msg),
            SubtitlerError::ExtractionFailed { tool, status } => {
                write!(fmt, "'{}' exited unsuccessfully ({})", tool, status)
            }
            SubtitlerError::ModelNotFound(path) => {
                write!(fmt, "Whisper model not found at: {}", path.display())
            }
            SubtitlerError::UnsupportedAudio(msg) => write!(fmt, "Unsupported audio: {}", msg),
            SubtitlerError::VerificationFailed { expected, found } => write!(
                fmt,
                "Subtitle file contains {} cues, expected {}",
                found, expected
            ),
            SubtitlerError::CueMismatch {
                index,
                expected,
                found,
            } => write!(
                fmt,
                "Cue {} reads back as {}, expected {}",
                index, found, expected
            ),
        }
    }
}

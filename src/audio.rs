use crate::error::SubtitlerError;

use std::path::Path;
use std::process::Command;

use anyhow::{Context, Result};
use log::debug;

/// Sample rate the recognition engine expects.
pub const SAMPLE_RATE: u32 = 16_000;

/// Demuxes the audio track of a media file into a standalone audio file.
pub trait AudioExtractor {
    fn extract(&self, video: &Path, audio: &Path) -> Result<()>;
}

/// Extracts audio by running an external `ffmpeg` binary.
///
/// ffmpeg's default stream selection picks the best audio stream; every
/// other stream is dropped and the audio is written as 16 kHz mono PCM WAV.
#[derive(Debug, Clone)]
pub struct FfmpegExtractor {
    binary: String,
}

impl FfmpegExtractor {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    fn command(&self, video: &Path, audio: &Path) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.arg("-nostdin")
            .arg("-hide_banner")
            .arg("-loglevel")
            .arg("error")
            .arg("-y")
            .arg("-i")
            .arg(video)
            .arg("-vn")
            .arg("-sn")
            .arg("-dn")
            .arg("-ac")
            .arg("1")
            .arg("-ar")
            .arg(SAMPLE_RATE.to_string())
            .arg("-c:a")
            .arg("pcm_s16le")
            .arg(audio);
        cmd
    }
}

impl Default for FfmpegExtractor {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

impl AudioExtractor for FfmpegExtractor {
    fn extract(&self, video: &Path, audio: &Path) -> Result<()> {
        std::fs::File::open(video)
            .context(format!("Failed to open input file: '{}'", video.display()))?;

        let mut cmd = self.command(video, audio);
        debug!("Running {:?}", cmd);
        let status = cmd
            .status()
            .context(format!("Failed to execute '{}'", self.binary))?;

        if !status.success() {
            return Err(SubtitlerError::ExtractionFailed {
                tool: self.binary.clone(),
                status,
            })
            .context(format!(
                "Failed to extract audio from '{}'",
                video.display()
            ));
        }
        Ok(())
    }
}

use crate::audio::SAMPLE_RATE;
use crate::error::SubtitlerError;
use crate::transcriber::SpeechRecognizer;
use crate::transcript::{Segments, TimedSegment, TimedWord};

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use log::{debug, info, warn};
use regex::Regex;
use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters, WhisperState};

const BEAM_SIZE: i32 = 5;

/// Markers such as `[_BEG_]`, `[_TT_150]` or `<|endoftext|>`.
const SPECIAL_TOKEN: &str = r"^(\[_[A-Z]+_?\d*\]|<\|[^|]*\|>)$";

/// Speech recognizer using whisper.cpp via whisper-rs.
///
/// Runs on the CPU with 8-bit quantized weights when available, decoding with
/// a beam of 5 and per-token timestamps that are merged back into words.
#[derive(Debug, Clone)]
pub struct WhisperRecognizer {
    model: String,
    models_dir: PathBuf,
    language: String,
    threads: usize,
}

impl WhisperRecognizer {
    pub fn new(
        model: impl Into<String>,
        models_dir: impl Into<PathBuf>,
        language: impl Into<String>,
        threads: usize,
    ) -> Self {
        Self {
            model: model.into(),
            models_dir: models_dir.into(),
            language: language.into(),
            threads: threads.max(1),
        }
    }

    fn load(&self) -> Result<WhisperContext> {
        let model_path = resolve_model(&self.model, &self.models_dir)?;
        info!("Loading whisper model from {}", model_path.display());
        if !is_quantized(&model_path) {
            warn!(
                "{} is not an 8-bit (q8_0) model, inference runs at full precision",
                model_path.display()
            );
        }

        let mut ctx_params = WhisperContextParameters::default();
        ctx_params.use_gpu(false);
        let ctx = WhisperContext::new_with_params(
            model_path.to_str().ok_or_else(|| anyhow!("Invalid model path"))?,
            ctx_params,
        )
        .map_err(|e| anyhow!("Failed to load Whisper model: {e}"))?;

        info!("Whisper model loaded for CPU inference.");
        Ok(ctx)
    }

    fn params(&self) -> FullParams<'_, '_> {
        let mut params = FullParams::new(SamplingStrategy::BeamSearch {
            beam_size: BEAM_SIZE,
            patience: -1.0,
        });
        params.set_language(Some(&self.language));
        params.set_translate(false);
        params.set_token_timestamps(true);
        params.set_print_special(false);
        params.set_print_progress(false);
        params.set_print_realtime(false);
        params.set_print_timestamps(false);
        params.set_n_threads(self.threads as i32);
        params
    }
}

impl SpeechRecognizer for WhisperRecognizer {
    fn transcribe(&self, audio: &Path) -> Result<Segments> {
        let special = Regex::new(SPECIAL_TOKEN).context("Invalid special token pattern")?;
        let ctx = self.load()?;
        let samples = read_wav_samples(audio)?;

        let mut state = ctx
            .create_state()
            .map_err(|e| anyhow!("Failed to create Whisper state: {e}"))?;
        state
            .full(self.params(), &samples)
            .map_err(|e| anyhow!("Whisper inference failed: {e}"))?;

        let total = state.full_n_segments();
        debug!("Whisper produced {} segments", total);
        Ok(Box::new(WhisperSegments {
            state,
            next: 0,
            total,
            special,
        }))
    }
}

/// Resolves a model identifier to a ggml model file.
///
/// An existing file path is used as-is. A size name such as `small` is looked
/// up in `models_dir`, preferring the `q8_0` quantization.
pub fn resolve_model(model: &str, models_dir: &Path) -> Result<PathBuf> {
    let direct = Path::new(model);
    if direct.is_file() {
        return Ok(direct.to_path_buf());
    }

    let quantized = models_dir.join(format!("ggml-{}-q8_0.bin", model));
    if quantized.is_file() {
        return Ok(quantized);
    }
    let full = models_dir.join(format!("ggml-{}.bin", model));
    if full.is_file() {
        return Ok(full);
    }
    Err(SubtitlerError::ModelNotFound(quantized).into())
}

/// Whether `path` names 8-bit quantized weights, e.g. `ggml-small-q8_0.bin`.
pub fn is_quantized(path: &Path) -> bool {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .map_or(false, |stem| stem.ends_with("q8_0"))
}

/// Reads 16 kHz mono 16-bit PCM into normalized samples.
pub fn read_wav_samples(path: &Path) -> Result<Vec<f32>> {
    let mut reader = hound::WavReader::open(path)
        .context(format!("Failed to open audio file: '{}'", path.display()))?;
    let spec = reader.spec();

    if spec.channels != 1 {
        return Err(SubtitlerError::UnsupportedAudio(format!(
            "expected 1 channel, found {}",
            spec.channels
        ))
        .into());
    }
    if spec.sample_rate != SAMPLE_RATE {
        return Err(SubtitlerError::UnsupportedAudio(format!(
            "expected {} Hz sample rate, found {} Hz",
            SAMPLE_RATE, spec.sample_rate
        ))
        .into());
    }
    if spec.bits_per_sample != 16 || spec.sample_format != hound::SampleFormat::Int {
        return Err(SubtitlerError::UnsupportedAudio(format!(
            "expected 16-bit integer samples, found {}-bit {:?}",
            spec.bits_per_sample, spec.sample_format
        ))
        .into());
    }

    reader
        .samples::<i16>()
        .map(|sample| sample.map(|s| s as f32 / i16::MAX as f32))
        .collect::<Result<Vec<f32>, _>>()
        .context("Failed to decode audio samples")
}

/// Lazily converts decoded segments into timed words, one segment per call.
struct WhisperSegments {
    state: WhisperState,
    next: i32,
    total: i32,
    special: Regex,
}

impl Iterator for WhisperSegments {
    type Item = TimedSegment;

    fn next(&mut self) -> Option<TimedSegment> {
        while self.next < self.total {
            let seg_idx = self.next;
            self.next += 1;

            let segment = match self.state.get_segment(seg_idx) {
                Some(s) => s,
                None => continue,
            };

            let mut tokens = Vec::new();
            for tok_idx in 0..segment.n_tokens() {
                let token = match segment.get_token(tok_idx) {
                    Some(t) => t,
                    None => continue,
                };
                let text = match token.to_str() {
                    Ok(t) => t,
                    Err(e) => {
                        debug!("Skipping undecodable token in segment {}: {}", seg_idx, e);
                        continue;
                    }
                };
                let data = token.token_data();
                tokens.push(Token {
                    text: text.to_string(),
                    start: data.t0 as f64 / 100.0,
                    end: data.t1 as f64 / 100.0,
                });
            }

            return Some(TimedSegment::new(words_from_tokens(tokens, &self.special)));
        }
        None
    }
}

#[derive(Debug)]
struct Token {
    text: String,
    start: f64,
    end: f64,
}

/// Merges sub-word tokens into words.
///
/// A token with leading whitespace starts a new word; any other token is
/// appended to the word before it.
fn words_from_tokens(tokens: Vec<Token>, special: &Regex) -> Vec<TimedWord> {
    let mut words: Vec<TimedWord> = Vec::new();
    for token in tokens {
        let trimmed = token.text.trim();
        if trimmed.is_empty() || special.is_match(trimmed) {
            continue;
        }

        let starts_word = token.text.starts_with(char::is_whitespace);
        match words.last_mut() {
            Some(word) if !starts_word => {
                word.text.push_str(&token.text);
                word.end = word.end.max(token.end);
            }
            _ => words.push(TimedWord::new(token.text, token.start, token.end)),
        }
    }
    words
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(text: &str, start: f64, end: f64) -> Token {
        Token {
            text: text.to_string(),
            start,
            end,
        }
    }

    fn special() -> Regex {
        Regex::new(SPECIAL_TOKEN).unwrap()
    }

    #[test]
    fn test_special_tokens_are_recognized() {
        let re = special();
        for marker in ["[_BEG_]", "[_SOT_]", "[_TT_150]", "<|endoftext|>", "<|en|>", "<|0.00|>"] {
            assert!(re.is_match(marker), "{marker} should be special");
        }
        for word in ["Hello", "[music]", "a|b", "<b>"] {
            assert!(!re.is_match(word), "{word} should not be special");
        }
    }

    #[test]
    fn test_tokens_merge_into_words() {
        let tokens = vec![
            token("[_BEG_]", 0.0, 0.0),
            token(" Hel", 0.0, 0.3),
            token("lo", 0.3, 0.5),
            token(",", 0.5, 0.55),
            token(" world", 0.6, 1.0),
            token(".", 1.0, 1.1),
            token("<|endoftext|>", 1.1, 1.1),
        ];

        let words = words_from_tokens(tokens, &special());

        assert_eq!(
            words,
            vec![
                TimedWord::new(" Hello,", 0.0, 0.55),
                TimedWord::new(" world.", 0.6, 1.1),
            ]
        );
    }

    #[test]
    fn test_first_token_without_space_starts_word() {
        let words = words_from_tokens(vec![token("Yes", 0.0, 0.2)], &special());
        assert_eq!(words, vec![TimedWord::new("Yes", 0.0, 0.2)]);
    }

    #[test]
    fn test_resolve_prefers_quantized_model() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("ggml-small.bin"), b"").unwrap();
        std::fs::write(dir.path().join("ggml-small-q8_0.bin"), b"").unwrap();

        let path = resolve_model("small", dir.path()).unwrap();

        assert_eq!(path, dir.path().join("ggml-small-q8_0.bin"));
    }

    #[test]
    fn test_resolve_falls_back_to_full_precision() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("ggml-tiny.bin"), b"").unwrap();

        let path = resolve_model("tiny", dir.path()).unwrap();

        assert_eq!(path, dir.path().join("ggml-tiny.bin"));
        assert!(!is_quantized(&path));
    }

    #[test]
    fn test_is_quantized_checks_file_name() {
        assert!(is_quantized(Path::new("models/ggml-small-q8_0.bin")));
        assert!(is_quantized(Path::new("ggml-large-v3-q8_0.bin")));
        assert!(!is_quantized(Path::new("models/ggml-small.bin")));
        assert!(!is_quantized(Path::new("models/ggml-small-q5_0.bin")));
        assert!(!is_quantized(Path::new("q8_0/ggml-base.bin")));
    }

    #[test]
    fn test_resolve_accepts_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("custom.bin");
        std::fs::write(&file, b"").unwrap();

        let path = resolve_model(file.to_str().unwrap(), Path::new("/nonexistent")).unwrap();

        assert_eq!(path, file);
    }

    #[test]
    fn test_resolve_missing_model_error_message() {
        let err = resolve_model("medium", Path::new("/nonexistent")).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("not found"), "Expected 'not found' in error, got: {msg}");
    }

    #[test]
    fn test_missing_model_fails_transcription() {
        let recognizer = WhisperRecognizer::new("large", "/nonexistent", "en", 1);
        assert!(recognizer.transcribe(Path::new("audio.wav")).is_err());
    }

    #[test]
    fn test_read_wav_rejects_stereo() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stereo.wav");
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: SAMPLE_RATE,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        writer.write_sample(0i16).unwrap();
        writer.write_sample(0i16).unwrap();
        writer.finalize().unwrap();

        let err = read_wav_samples(&path).unwrap_err();

        assert!(matches!(
            err.downcast_ref::<SubtitlerError>(),
            Some(SubtitlerError::UnsupportedAudio(_))
        ));
    }

    #[test]
    fn test_read_wav_normalizes_samples() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mono.wav");
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: SAMPLE_RATE,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for s in [0i16, i16::MAX, -i16::MAX] {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();

        let samples = read_wav_samples(&path).unwrap();

        assert_eq!(samples, vec![0.0, 1.0, -1.0]);
    }

    #[test]
    #[ignore] // Requires a whisper model in ./models
    fn test_transcribe_silence_does_not_crash() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("silence.wav");
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: SAMPLE_RATE,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for _ in 0..SAMPLE_RATE * 2 {
            writer.write_sample(0i16).unwrap();
        }
        writer.finalize().unwrap();

        let recognizer = WhisperRecognizer::new("tiny", "models", "en", 2);
        let segments = recognizer.transcribe(&path).expect("Transcription should not error");

        for segment in segments {
            for word in segment.words {
                assert!(word.start <= word.end);
            }
        }
    }
}

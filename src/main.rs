mod audio;
mod cues;
mod error;
mod parser;
mod pipeline;
mod serialiser;
mod srt;
mod transcriber;
mod transcript;
mod whisper;

use crate::audio::FfmpegExtractor;
use crate::pipeline::PipelineOpts;
use crate::whisper::WhisperRecognizer;

use std::path::PathBuf;
use std::time::Instant;

use anyhow::Result;
use clap::Parser;
use log::info;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run() {
        Ok(()) => (),
        Err(err) => {
            eprintln!("An error occurred: {}", err);
            for cause in err.chain().skip(1) {
                eprintln!("    {}", cause);
            }
            std::process::exit(1);
        }
    }
}

#[derive(Parser)]
#[command(about = "Generate SRT subtitles from the speech in a video")]
struct Cli {
    #[arg(value_name = "INPUT", help = "The video file to transcribe.")]
    input: PathBuf,
    #[arg(value_name = "OUTPUT", help = "The SRT file to write.")]
    output: PathBuf,
    #[arg(
        short,
        long,
        default_value = "en",
        help = "Language spoken in the video."
    )]
    language: String,
    #[arg(
        short,
        long,
        default_value = "small",
        help = "Whisper model size (tiny, base, small, medium, large) or path to a model file."
    )]
    model: String,
    #[arg(
        long,
        value_name = "DIR",
        env = "WHISPER_MODELS_DIR",
        default_value = "models",
        help = "Directory holding ggml-<size>[-q8_0].bin model files."
    )]
    models_dir: PathBuf,
    #[arg(
        long,
        value_name = "FILE",
        default_value = "audio.wav",
        help = "Where to store the extracted audio. Removed when done."
    )]
    audio: PathBuf,
    #[arg(
        long,
        value_name = "PATH",
        env = "FFMPEG_PATH",
        default_value = "ffmpeg",
        help = "The ffmpeg binary used to extract audio."
    )]
    ffmpeg: String,
    #[arg(
        short,
        long,
        default_value_t = default_threads(),
        help = "Number of threads used for inference."
    )]
    threads: usize,
    #[arg(long, help = "Re-read the written file and check the cue count.")]
    verify: bool,
}

fn default_threads() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .min(8)
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    info!("--- Starting transcription process ---");
    let started = Instant::now();

    let extractor = FfmpegExtractor::new(cli.ffmpeg);
    let recognizer = WhisperRecognizer::new(cli.model, cli.models_dir, cli.language, cli.threads);
    let opts = PipelineOpts {
        video: cli.input,
        output: cli.output,
        audio: cli.audio,
        verify: cli.verify,
    };
    pipeline::run(&opts, &extractor, &recognizer)?;

    info!(
        "--- Process completed in {:.2} seconds ---",
        started.elapsed().as_secs_f64()
    );
    Ok(())
}

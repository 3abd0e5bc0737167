//! Quietwave CLI
//!
//! Runs a Demucs-style ONNX denoiser over an audio file.
//!
//! # Usage
//!
//! ```bash
//! # Denoise a recording (any Symphonia-supported format) to a 16 kHz WAV
//! quietwave denoise --model denoiser.onnx --input noisy.mp3 --output clean.wav
//!
//! # Prefer CUDA, fall back to CPU
//! quietwave denoise --model denoiser.onnx --input noisy.wav --output clean.wav --target cuda,cpu
//!
//! # Settings can also come from the environment or a .env file
//! QUIETWAVE_MODEL_PATH=denoiser.onnx INPUT_AUDIO=noisy.wav OUTPUT_AUDIO=clean.wav quietwave denoise
//!
//! # Show the model's declared slots and the binding the session picks
//! quietwave inspect --model denoiser.onnx --json
//!
//! # Length the network will actually see for a given input
//! quietwave valid-length 16000
//! ```

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use quietwave::config::{ConfigOverrides, DenoiseConfig, ModelProfile, ENV_PROFILE};
use quietwave::inspect::ModelReport;
use quietwave::{DenoiseSession, Denoiser};

#[derive(Parser)]
#[command(name = "quietwave")]
#[command(about = "Length-aligned ONNX inference for Demucs-style waveform denoisers")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Model selection shared by commands that open a session.
///
/// Unset flags fall back to QUIETWAVE_MODEL_PATH (then MODEL_PATH),
/// QUIETWAVE_TARGETS and QUIETWAVE_PROFILE.
#[derive(clap::Args)]
struct ModelArgs {
    /// Path to the .onnx denoiser
    #[arg(short, long)]
    model: Option<PathBuf>,

    /// Execution targets in preference order (comma separated, default cpu)
    #[arg(short, long)]
    target: Option<String>,

    /// JSON model profile (defaults to <model>.json when present)
    #[arg(long)]
    profile: Option<PathBuf>,
}

impl ModelArgs {
    fn resolve(self) -> anyhow::Result<DenoiseConfig> {
        let config = DenoiseConfig::resolve(ConfigOverrides {
            model_path: self.model,
            targets: self.target,
            profile: self.profile,
        })?;
        Ok(config)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Denoise an audio file and write a mono float WAV
    Denoise {
        #[command(flatten)]
        model: ModelArgs,

        /// Noisy input audio
        #[arg(short, long, env = "INPUT_AUDIO")]
        input: PathBuf,

        /// Output .wav path
        #[arg(short, long, env = "OUTPUT_AUDIO")]
        output: PathBuf,
    },

    /// Print the model's metadata, declared inputs/outputs and resolved binding
    Inspect {
        #[command(flatten)]
        model: ModelArgs,

        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Print the aligned length for an input of `samples` samples
    ValidLength {
        /// Input length in samples
        samples: usize,

        /// JSON model profile (defaults to QUIETWAVE_PROFILE, then the standard topology)
        #[arg(long)]
        profile: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Denoise { model, input, output } => {
            let config = model.resolve()?;
            tracing::info!(
                "Loading {} (sample rate {} Hz, topology {:?})",
                config.model_path.display(),
                config.profile.sample_rate,
                config.profile.topology
            );

            let mut denoiser = Denoiser::open(&config.model_path, &config.targets, config.profile.topology)
                .with_context(|| format!("Failed to open model {}", config.model_path.display()))?
                .with_sample_rate(config.profile.sample_rate);

            let report = denoiser
                .denoise_file(&input, &output)
                .with_context(|| format!("Failed to denoise {}", input.display()))?;
            denoiser.close();

            println!("Denoised {} -> {}", input.display(), output.display());
            println!("  Source: {} Hz, {} channel(s)", report.source_rate, report.source_channels);
            println!("  Samples: {}", report.samples);
            println!("  Denoising time: {:.2}ms", report.elapsed.as_secs_f64() * 1000.0);
        }

        Commands::Inspect { model, json } => {
            let config = model.resolve()?;
            let mut session = DenoiseSession::open(&config.model_path, &config.targets)
                .with_context(|| format!("Failed to open model {}", config.model_path.display()))?;
            let report = ModelReport::from_session(&session);
            session.close();

            if json {
                println!("{}", report.to_json()?);
            } else {
                println!("{}", report);
            }
        }

        Commands::ValidLength { samples, profile } => {
            let profile = match profile.or_else(|| std::env::var_os(ENV_PROFILE).map(PathBuf::from)) {
                Some(path) => ModelProfile::load(&path)?,
                None => ModelProfile::default(),
            };
            println!("{}", profile.topology.valid_length(samples));
        }
    }

    Ok(())
}

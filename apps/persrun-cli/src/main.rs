use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use glam::Vec3;
use persrun_common::Anchor;
use persrun_session::{Session, SessionConfig, SessionInspector};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "persrun-cli", about = "CLI tool for persrun level streaming")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and the built-in default config
    Info,
    /// Load and validate a session config
    Check {
        /// YAML or JSON config file
        path: PathBuf,
    },
    /// Run a headless session and print its summary
    Simulate {
        /// Config file; the built-in default when omitted
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Simulated seconds
        #[arg(short, long, default_value = "30")]
        seconds: f32,
        /// Frames per simulated second
        #[arg(long, default_value = "60")]
        fps: u32,
        /// Override the selection seed
        #[arg(long)]
        seed: Option<u64>,
        /// Second at which to revive the runner elsewhere
        #[arg(long, requires = "jump_to")]
        jump_at: Option<f32>,
        /// X position to revive the runner at
        #[arg(long, requires = "jump_at")]
        jump_to: Option<f32>,
    },
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<SessionConfig> {
    match path {
        Some(p) => SessionConfig::load(p).with_context(|| format!("loading {}", p.display())),
        None => Ok(SessionConfig::default()),
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("persrun-cli v{}", env!("CARGO_PKG_VERSION"));
            print!("{}", SessionConfig::default().to_yaml_string()?);
        }
        Commands::Check { path } => {
            let config = load_config(Some(&path))?;
            config.validate()?;
            println!(
                "{}: OK ({} segments, {} projectiles)",
                path.display(),
                config.segments.len(),
                config.projectiles.len()
            );
        }
        Commands::Simulate {
            config,
            seconds,
            fps,
            seed,
            jump_at,
            jump_to,
        } => {
            anyhow::ensure!(fps > 0, "fps must be positive");
            anyhow::ensure!(
                seconds.is_finite() && seconds >= 0.0,
                "seconds must be a non-negative number"
            );
            let mut config = load_config(config.as_ref())?;
            if let Some(seed) = seed {
                config.seed = seed;
            }
            let dt = Duration::from_secs_f32(1.0 / fps as f32);
            let frames = (seconds * fps as f32).round() as u64;
            let jump_frame = jump_at.map(|t| (t * fps as f32).round() as u64);

            let mut session = Session::new(config)?;
            println!("{}", SessionInspector::summary(&session));
            for frame in 0..frames {
                if jump_frame == Some(frame) {
                    if let Some(x) = jump_to {
                        let y = session.runner().position().map_or(0.0, |p| p.y);
                        session.revive_at(Vec3::new(x, y, 0.0));
                    }
                }
                let report = session.update(dt)?;
                if !report.placed.is_empty() || !report.reclaimed.is_empty() {
                    tracing::debug!(
                        frame,
                        placed = report.placed.len(),
                        reclaimed = report.reclaimed.len(),
                        "level changed"
                    );
                }
            }
            session.stop();
            println!("{}", SessionInspector::summary(&session));
            for (id, x) in SessionInspector::segment_layout(&session) {
                println!("  {id} at x={x:.1}");
            }
        }
    }

    Ok(())
}

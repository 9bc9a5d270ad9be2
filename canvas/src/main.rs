//! pinchdraw: replay recorded hand landmarks through the drawing core.
//!
//! Prints interaction events and periodic status as s-expressions.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use pinchdraw::config::CanvasConfig;
use pinchdraw::interaction::default_layout;
use pinchdraw::runtime::{self, LoopConfig, Recording, Session};

#[derive(Parser, Debug)]
#[command(name = "pinchdraw", version, about = "Hand-gesture drawing core (replay driver)")]
struct Cli {
    /// Landmark recording to replay (one s-expression per line)
    #[arg(long)]
    replay: PathBuf,

    /// Canvas width in pixels
    #[arg(long, default_value_t = 1280.0)]
    width: f32,

    /// Canvas height in pixels
    #[arg(long, default_value_t = 720.0)]
    height: f32,

    /// Target tick rate in Hz
    #[arg(long, default_value_t = pinchdraw::config::TARGET_TICK_HZ)]
    tick_hz: f64,

    /// Don't mirror the camera image horizontally
    #[arg(long)]
    no_mirror: bool,

    /// Exit after N seconds even if the recording isn't finished
    #[arg(long)]
    exit_after: Option<u64>,

    /// Print session status every N ticks (0 = only at exit)
    #[arg(long, default_value_t = 0)]
    status_every: u64,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pinchdraw=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    info!("pinchdraw v{} starting", env!("CARGO_PKG_VERSION"));

    if cli.width <= 0.0 || cli.height <= 0.0 {
        anyhow::bail!("canvas size must be positive, got {}x{}", cli.width, cli.height);
    }
    if !(cli.tick_hz > 0.0) {
        anyhow::bail!("tick rate must be positive, got {}", cli.tick_hz);
    }

    let config = CanvasConfig {
        width: cli.width,
        height: cli.height,
        mirror: !cli.no_mirror,
        tick_hz: cli.tick_hz,
    };

    let recording = Recording::load(&cli.replay)
        .with_context(|| format!("loading recording {}", cli.replay.display()))?;
    if recording.is_empty() {
        anyhow::bail!("recording {} has no frames", cli.replay.display());
    }

    let layout = default_layout(config.width, config.height);
    let (camera, detector) = recording.into_sources();
    let mut session =
        Session::start(camera, detector, config).context("starting drawing session")?;

    runtime::install_signal_handlers();

    let loop_config = LoopConfig {
        exit_after: cli.exit_after.map(Duration::from_secs),
        stop_when_finished: true,
    };
    let status_every = cli.status_every;
    let reason = runtime::run_event_loop(&mut session, &layout, &loop_config, |session, events| {
        for event in events {
            println!("{}", event.to_sexp());
        }
        if status_every > 0 && session.gate().taken % status_every == 0 {
            println!("{}", session.status_sexp());
        }
    })
    .context("running tick loop")?;

    println!("{}", session.status_sexp());
    info!("pinchdraw exiting ({})", reason.as_str());
    Ok(())
}

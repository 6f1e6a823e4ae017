//! gesture-guard - Hand gesture moderation for live video
//!
//! Main entry point for the CLI application. Replays recorded detector output
//! (JSON lines) through the guard pipeline and logs what it decides.

use clap::Parser;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use gesture_guard::{
    config::Config,
    emotion::{EmotionSmoother, EmotionStatus},
    input::FrameReader,
    GuardPipeline,
};

/// gesture-guard - Hand gesture moderation for live video
#[derive(Parser, Debug)]
#[command(name = "gesture-guard", version, about, long_about = None)]
struct Args {
    /// Recorded frames (JSON lines), `-` for stdin
    input: Option<PathBuf>,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Escalation state file (overrides config)
    #[arg(short, long)]
    state_file: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Clear today's record when the session ends
    #[arg(long)]
    reset_on_exit: bool,

    /// Clear today's record and exit
    #[arg(long)]
    reset: bool,

    /// Print today's statistics and exit
    #[arg(long)]
    stats: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::builder()
                .with_default_directive(log_level.into())
                .from_env_lossy(),
        )
        .init();

    info!("Starting {} v{}", gesture_guard::NAME, gesture_guard::VERSION);

    // Load configuration
    let mut config = if let Some(ref path) = args.config {
        Config::from_file(path)?
    } else {
        Config::load()?
    };

    // Apply CLI overrides
    if let Some(ref path) = args.state_file {
        config.escalation.state_file = path.clone();
    }

    config.validate()?;

    info!("State file: {}", config.escalation.state_file.display());
    info!("Rule table: {:?}", config.classifier.table);
    info!(
        "Disallowed: {}",
        config
            .debounce
            .disallowed
            .iter()
            .map(|g| g.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );

    let mut pipeline = GuardPipeline::from_config(&config);

    if args.reset {
        pipeline.reset();
        info!("Today's record cleared");
        return Ok(());
    }

    if args.stats {
        let stats = pipeline.statistics();
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    let input = args.input.clone().unwrap_or_else(|| PathBuf::from("-"));
    run_replay(&config, &mut pipeline, &input)?;

    let stats = pipeline.shutdown_session(args.reset_on_exit);
    println!("{}", serde_json::to_string_pretty(&stats)?);

    info!("gesture-guard stopped");
    Ok(())
}

/// Feed every recorded frame through the pipeline
fn run_replay(config: &Config, pipeline: &mut GuardPipeline, input: &Path) -> anyhow::Result<()> {
    let mut emotion = EmotionSmoother::new(&config.emotion);
    let mut frames = 0usize;
    let mut blackout_logged = false;

    info!("Reading frames from {}", input.display());

    for packet in FrameReader::open(input)? {
        let packet = match packet {
            Ok(packet) => packet,
            Err(gesture_guard::GuardError::Io(e)) => return Err(e.into()),
            Err(e) => {
                warn!("Skipping frame: {}", e);
                continue;
            }
        };
        frames += 1;

        let hands = packet.hand_keypoints();
        let decision = pipeline.process_frame(&hands, &packet.faces, packet.width, packet.height);

        if let Some(gesture) = decision.confirmed {
            info!(
                "Frame {}: {} confirmed, {} today ({})",
                frames, gesture, decision.disallowed_count, decision.penalty_level
            );
        }

        if decision.alert {
            // Terminal bell stands in for the warning sound
            eprint!("\x07");
            warn!("Frame {}: high warning, face masking enabled", frames);
        }

        if decision.blackout && !blackout_logged {
            warn!("Frame {}: stream paused", frames);
            blackout_logged = true;
        }

        for (i, hand) in decision.hands.iter().enumerate() {
            if let Some(region) = hand.region {
                debug!(
                    "Frame {}: mask hand {} at {:?} grid {:?}",
                    frames, i, region.bounds, region.grid
                );
            }
        }

        if emotion.should_analyze() {
            emotion.push(packet.emotion_scores());
            if let EmotionStatus::Stable(reading) = emotion.status() {
                debug!(
                    "Frame {}: emotion {} ({:.1}%)",
                    frames, reading.emotion, reading.confidence
                );
            }
        }
    }

    info!("Processed {} frames", frames);
    Ok(())
}

use clap::{Parser, Subcommand};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use vast_player::testing::{FakeMedia, FakeSurface};
use vast_player::{
    AdError, BeaconConfig, BeaconDispatcher, FetchConfig, HttpBeaconDispatcher, HttpFetcher,
    LogDispatcher, MediaEvent, PlayerConfig, SessionState, StandardPlayer, async_api,
};

/// VAST ad inspector and playback simulator
#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a VAST file or URL into an ad descriptor
    Parse {
        /// Path to the VAST file or URL
        #[arg(short, long)]
        input: String,

        /// Print the descriptor as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Play a VAST ad against a simulated timeline and report every beacon
    Simulate {
        /// Path to the VAST file or URL
        #[arg(short, long)]
        input: String,

        /// Media duration in seconds (defaults to the VAST <Duration>, then 30)
        #[arg(short, long)]
        duration: Option<f64>,

        /// Seconds between simulated time updates
        #[arg(long, default_value_t = 1.0)]
        step: f64,

        /// Press skip at this position
        #[arg(long)]
        skip_at: Option<f64>,

        /// Number of clicks to simulate right after start
        #[arg(long, default_value_t = 0)]
        clicks: u32,

        /// Actually send beacons instead of logging them
        #[arg(long)]
        send: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Parse { input, json } => {
            let fetcher = HttpFetcher::new(FetchConfig::default())?;
            let descriptor = async_api::load_descriptor(&fetcher, &input).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&descriptor)?);
            } else {
                println!("{:#?}", descriptor);
            }
        }
        Commands::Simulate {
            input,
            duration,
            step,
            skip_at,
            clicks,
            send,
        } => {
            if !step.is_finite() || step <= 0.0 {
                return Err(AdError::Config(format!("step must be positive, got {}", step)).into());
            }

            let dispatcher: Arc<dyn BeaconDispatcher> = if send {
                Arc::new(HttpBeaconDispatcher::current(BeaconConfig::default())?)
            } else {
                Arc::new(LogDispatcher)
            };

            let mut player = StandardPlayer::new(
                PlayerConfig::new(input),
                FakeSurface::new(),
                FakeMedia::new(),
                dispatcher,
            )?;
            let fetcher = HttpFetcher::new(FetchConfig::default())?;
            player.load(&fetcher).await?;

            let duration = duration
                .or_else(|| player.session().descriptor().and_then(|d| d.duration_seconds))
                .unwrap_or(30.0);

            player.handle_media_event(MediaEvent::Playing);
            for _ in 0..clicks {
                if let Some(url) = player.click() {
                    println!("Click-through: {}", url);
                }
            }

            let mut position = 0.0;
            while position < duration && player.state() == SessionState::Playing {
                position = (position + step).min(duration);
                player.handle_media_event(MediaEvent::TimeUpdate { position, duration });

                if skip_at.is_some_and(|at| position >= at) && player.skip().is_some() {
                    println!("Skipped at {:.1}s", position);
                }
            }
            player.handle_media_event(MediaEvent::Ended);

            println!("Final state: {}", player.state());
            player.destroy();

            if send {
                // Give in-flight beacons a moment before the runtime shuts down
                tokio::time::sleep(Duration::from_secs(1)).await;
            }
        }
    }

    Ok(())
}

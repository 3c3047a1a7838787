//! # padwatch
//!
//! Watches a Linux gamepad and logs the events the engine derives from it.
//!
//! Press, release, hold and auto-repeat events are logged as they fire, and
//! the processed stick and trigger values are logged periodically.

use anyhow::Result;
use std::rc::Rc;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use gamepad_dynamics::config::Config;
use gamepad_dynamics::controller::evdev::{EvdevGamepad, EvdevMapper};
use gamepad_dynamics::controller::Gamepad;
use gamepad_dynamics::event::{EventArgs, EventListener};

/// Seconds between axis status log messages
const STATUS_INTERVAL_SECS: u64 = 5;

/// Number of ticks between axis status log messages
fn status_interval_ticks(tick_rate_hz: u32) -> u64 {
    u64::from(tick_rate_hz.max(1)) * STATUS_INTERVAL_SECS
}

/// Logs one fired gamepad event.
fn log_event(source: &str, args: &EventArgs) {
    match args {
        EventArgs::Repeat(repeat) => info!(
            "{} #{} (next in {:?})",
            source, repeat.repeat_count, repeat.current_repeat_delay
        ),
        EventArgs::Button(button) if button.is_pressed() => {
            info!("{} (held {:?})", source, button.duration_in_state())
        }
        _ => info!("{}", source),
    }
}

/// Main entry point for padwatch
///
/// # Control Flow
///
/// 1. **Initialization**
///    - Set up logging with tracing subscriber
///    - Load the configuration file given as the first argument, or defaults
///    - Open the configured evdev node, or the first gamepad found
///
/// 2. **Main Loop**
///    - Fold evdev events into the current raw sample as they arrive
///    - Tick the gamepad at `tick_rate_hz` with the measured elapsed time
///    - Log fired events, and axis values every few seconds
///    - Handle Ctrl+C for graceful shutdown
///
/// # Errors
///
/// Returns error if the configuration is invalid or no gamepad can be opened.
///
/// # Examples
///
/// ```bash
/// RUST_LOG=debug cargo run --release -- padwatch.toml
/// ```
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("padwatch v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = match std::env::args().nth(1) {
        Some(path) => {
            info!("Loading configuration from {}", path);
            Config::load(&path)?
        }
        None => {
            info!("No configuration file given, using defaults");
            Config::default()
        }
    };

    let device = if config.device.path.is_empty() {
        EvdevGamepad::open()?
    } else {
        EvdevGamepad::open_path(&config.device.path)?
    };
    info!(
        "Watching {} at {}",
        device.name().unwrap_or("unnamed gamepad"),
        device.device_path()
    );
    debug!("Supported buttons: {:?}", device.supported_buttons());

    let mut stream = device.into_event_stream()?;
    let mut mapper = EvdevMapper::new();

    let mut gamepad = Gamepad::from_config(&config)?;
    let listener: EventListener = Rc::new(log_event);
    gamepad.add_listener(listener);
    gamepad.connect();

    let mut ticker = interval(config.tick_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let status_ticks = status_interval_ticks(config.device.tick_rate_hz);
    let mut tick_count: u64 = 0;
    let mut last_tick = Instant::now();

    info!("Ticking at {}Hz", config.device.tick_rate_hz);
    info!("Press Ctrl+C to exit");

    loop {
        tokio::select! {
            event = stream.next_event() => {
                match event {
                    Ok(event) => mapper.process_event(&event),
                    Err(e) => {
                        warn!("Gamepad read failed: {}", e);
                        gamepad.disconnect();
                        break;
                    }
                }
            }

            _ = ticker.tick() => {
                let now = Instant::now();
                let elapsed = now - last_tick;
                last_tick = now;

                if let Err(e) = gamepad.update(&mapper.sample(), elapsed) {
                    debug!("Tick rejected: {}", e);
                    continue;
                }

                tick_count += 1;
                if tick_count % status_ticks == 0 {
                    let left = gamepad.left_stick_mut().effective()?;
                    let right = gamepad.right_stick_mut().effective()?;
                    let l2 = gamepad.left_trigger_mut().effective()?;
                    let r2 = gamepad.right_trigger_mut().effective()?;
                    info!(
                        "Sticks L({:.2}, {:.2}) R({:.2}, {:.2}), triggers L2 {:.2} R2 {:.2}",
                        left.x, left.y, right.x, right.y, l2, r2
                    );
                }
            }

            // Handle Ctrl+C for graceful shutdown
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down...");
                break;
            }
        }
    }

    info!("Total ticks: {}", tick_count);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_interval_constant() {
        assert_eq!(STATUS_INTERVAL_SECS, 5);
    }

    #[test]
    fn test_status_interval_ticks() {
        assert_eq!(status_interval_ticks(120), 600);
        assert_eq!(status_interval_ticks(1000), 5000);
        // A zero rate never divides by zero in the loop.
        assert_eq!(status_interval_ticks(0), 5);
    }

    #[test]
    fn test_default_tick_period() {
        let config = Config::default();
        assert_eq!(config.tick_interval().as_micros(), 8333);
    }
}

//! Host shell for the cardbridge.
//!
//! Wires the real hardware (hidapi backend, serial forwarder) to a
//! [`DeviceSession`], prints the session's log events to stdout and runs
//! until Ctrl-C, at which point the device is removed and the loop shut
//! down cleanly.

use anyhow::Context;
use cardbridge_core::constants::{
    DEFAULT_DEVICE_IDENTITY, DEFAULT_POLL_INTERVAL_MS, DEFAULT_SERIAL_PORT,
    DEFAULT_WRITE_TIMEOUT_MS,
};
use cardbridge_core::{LogEvent, LogRouter, SessionConfig};
use cardbridge_hardware::devices::{AnyHidBackend, AnyTagSink};
use cardbridge_hardware::{HidApiBackend, SerialForwarder};
use cardbridge_session::DeviceSession;
use clap::Parser;
use std::path::PathBuf;
use tokio::sync::mpsc;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Bridge a USB-HID RFID card reader onto a legacy serial port.
#[derive(Debug, Parser)]
#[command(name = "cardbridge", version = cardbridge_core::VERSION, about)]
struct Cli {
    /// HID device path substring identifying the reader.
    #[arg(long, default_value = DEFAULT_DEVICE_IDENTITY)]
    device_id: String,

    /// Serial port the decoded tags are written to.
    #[arg(long, default_value = DEFAULT_SERIAL_PORT)]
    serial_port: String,

    /// Card poll interval in milliseconds.
    #[arg(long, default_value_t = DEFAULT_POLL_INTERVAL_MS)]
    poll_interval_ms: u64,

    /// Serial write timeout in milliseconds.
    #[arg(long, default_value_t = DEFAULT_WRITE_TIMEOUT_MS)]
    write_timeout_ms: u64,

    /// Directory the daily error log file is written to.
    #[arg(long, default_value = ".")]
    log_dir: PathBuf,

    /// Show debug-verbosity session messages.
    #[arg(long)]
    debug: bool,
}

impl Cli {
    fn into_config(self) -> SessionConfig {
        SessionConfig {
            device_identity: self.device_id,
            serial_port: self.serial_port,
            poll_interval_ms: self.poll_interval_ms,
            write_timeout_ms: self.write_timeout_ms,
            debug: self.debug,
            log_dir: self.log_dir,
        }
    }
}

/// Print session log events the way an operator watches them: one
/// timestamped line per event.
async fn print_log_events(mut events: mpsc::Receiver<LogEvent>) {
    while let Some(event) = events.recv().await {
        println!(
            "{} [{}] {}",
            event.timestamp.format("%d.%m.%Y %H:%M:%S"),
            event.level,
            event.message
        );
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let config = Cli::parse().into_config();
    debug!(?config, "starting cardbridge");

    let (log, log_rx) = LogRouter::new(config.debug, config.log_dir.clone());
    tokio::spawn(print_log_events(log_rx));

    let backend = AnyHidBackend::HidApi(HidApiBackend::new().context("initializing hidapi")?);
    let sink = AnyTagSink::Serial(SerialForwarder::new(
        &config.serial_port,
        config.write_timeout(),
    ));

    let (mut session, handle) =
        DeviceSession::new(config, backend, sink, log).context("configuring session")?;

    // A missing reader is not fatal at startup; the loop's poll timer keeps
    // probing for the device and attaches it once it appears.
    if let Err(e) = session.connect().await {
        debug!(error = %e, "initial connect failed, waiting for device");
    }

    let run = tokio::spawn(session.run());

    tokio::signal::ctrl_c()
        .await
        .context("waiting for Ctrl-C")?;

    handle.remove_device().await?;
    handle.shutdown().await?;
    run.await.context("session loop panicked")?;

    Ok(())
}

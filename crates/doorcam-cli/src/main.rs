//! doorcam endpoint
//!
//! Runs the access controller and the camera endpoints against simulated
//! peripherals. Tokens and camera faults are injected from stdin.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use doorcam_cli::simulate::{PLACEHOLDER_JPEG, feed_frames, load_frames};
use doorcam_cli::{Devices, Simulator, start};
use doorcam_core::EndpointConfig;
use doorcam_hardware::devices::{AnyActuator, AnyCamera, AnyCredentialReader, AnyNetworkLink};
use doorcam_hardware::mock::{MockActuator, MockCamera, MockLink, MockReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// SSID handed to the simulated link when the configuration has none.
const SIMULATED_SSID: &str = "doorcam-sim";

/// Door access controller and camera endpoint
#[derive(Parser, Debug)]
#[command(name = "doorcam")]
#[command(version, about, long_about = None)]
struct Args {
    /// TOML configuration file (defaults are used when omitted)
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Log filter, e.g. `debug` or `doorcam_access=trace` (also: RUST_LOG)
    #[arg(long, value_name = "FILTER")]
    log_level: Option<String>,

    /// Directory of JPEG files served by the simulated camera
    #[arg(long, value_name = "DIR")]
    frames_dir: Option<PathBuf>,
}

fn init_tracing(level: Option<&str>) -> anyhow::Result<()> {
    let filter = match level {
        Some(level) => EnvFilter::try_new(level)
            .with_context(|| format!("invalid log filter {level:?}"))?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };

    tracing_subscriber::fmt().with_env_filter(filter).init();
    Ok(())
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<EndpointConfig> {
    let config = match path {
        Some(path) => EndpointConfig::load(path)
            .with_context(|| format!("failed to load configuration from {}", path.display()))?,
        None => EndpointConfig::default(),
    };
    config.validate().context("invalid configuration")?;
    Ok(config)
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.log_level.as_deref())?;

    info!("doorcam v{}", doorcam_core::VERSION);

    let mut config = load_config(args.config.as_ref())?;
    if config.network.ssid.is_empty() {
        warn!(ssid = SIMULATED_SSID, "No SSID configured, using the simulated network");
        config.network.ssid = SIMULATED_SSID.to_string();
    }

    let frames = match &args.frames_dir {
        Some(dir) => load_frames(dir)?,
        None => vec![PLACEHOLDER_JPEG.to_vec()],
    };

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to build runtime")?;

    runtime.block_on(run(config, frames))
}

async fn run(config: EndpointConfig, frames: Vec<Vec<u8>>) -> anyhow::Result<()> {
    let (reader, reader_handle) = MockReader::new();
    let (actuator, _relay) = MockActuator::new();
    let (camera, camera_handle) = MockCamera::new();
    info!(frames = frames.len(), "Loaded simulated camera frames");
    feed_frames(&camera_handle, frames);

    let devices = Devices {
        reader: AnyCredentialReader::Mock(reader),
        actuator: AnyActuator::Mock(actuator),
        camera: AnyCamera::Mock(camera),
        link: AnyNetworkLink::Mock(MockLink::new()),
    };
    let mut dispatcher = start(&config, devices).await?;

    // The handles stay alive here so the reader is not disconnected when
    // stdin closes.
    let simulator = Simulator::new(reader_handle, camera_handle);
    let input = simulator.clone();
    tokio::spawn(async move {
        let stdin = tokio::io::BufReader::new(tokio::io::stdin());
        if let Err(e) = input.run(stdin).await {
            warn!(error = %e, "Failed to read simulator input");
        }
    });
    info!("Type `help` for simulator commands");

    dispatcher
        .run(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "Failed to listen for Ctrl-C");
                std::future::pending::<()>().await;
            }
            info!("Shutdown requested");
        })
        .await;

    drop(simulator);
    Ok(())
}

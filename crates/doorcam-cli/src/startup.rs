//! Bring-up: relay, camera, network association, listeners.
//!
//! Nothing binds before the link reports association.

use std::net::IpAddr;
use std::time::Duration;

use anyhow::Context;
use doorcam_access::{AccessController, AccessSettings, HttpAuthorizer};
use doorcam_camera::{CaptureService, StreamService};
use doorcam_core::{EndpointConfig, NetworkCredentials};
use doorcam_hardware::{Actuator, Camera, CredentialReader, DeviceInfo, NetworkLink};
use doorcam_network::HttpListener;
use tracing::{debug, info, warn};

use crate::dispatch::{DispatchSettings, Dispatcher};

/// Peripherals handed to [`start`].
#[derive(Debug)]
pub struct Devices<R, A, C, L> {
    pub reader: R,
    pub actuator: A,
    pub camera: C,
    pub link: L,
}

/// Join the network and wait until the link is up.
///
/// Polls every `poll` with no upper bound; wrap in a timeout if one is
/// wanted.
pub async fn await_association<L: NetworkLink>(
    link: &mut L,
    credentials: &NetworkCredentials,
    poll: Duration,
) -> doorcam_hardware::Result<Option<IpAddr>> {
    info!(ssid = %credentials.ssid, "Connecting to network");
    link.associate(credentials).await?;

    let mut attempts: u32 = 0;
    while !link.is_associated().await {
        attempts += 1;
        debug!(attempts, "Waiting for network association");
        tokio::time::sleep(poll).await;
    }

    let address = link.local_ip();
    info!(address = ?address, attempts, "Network associated");
    Ok(address)
}

/// Bind the stream and capture listeners.
pub async fn bind_listeners(
    config: &EndpointConfig,
) -> anyhow::Result<(HttpListener, HttpListener)> {
    let stream_addr = config.stream_addr().context("invalid stream listener address")?;
    let capture_addr = config.capture_addr().context("invalid capture listener address")?;

    let stream = HttpListener::bind(stream_addr, "stream")
        .await
        .with_context(|| format!("failed to bind stream listener on {stream_addr}"))?;
    let capture = HttpListener::bind(capture_addr, "capture")
        .await
        .with_context(|| format!("failed to bind capture listener on {capture_addr}"))?;

    Ok((stream, capture))
}

fn log_device(role: &str, info: doorcam_hardware::Result<DeviceInfo>) {
    match info {
        Ok(info) => info!(role, device = %info, "Device ready"),
        Err(e) => warn!(role, error = %e, "Device info unavailable"),
    }
}

/// Bring the endpoint up and return its dispatcher.
pub async fn start<R, A, C, L>(
    config: &EndpointConfig,
    devices: Devices<R, A, C, L>,
) -> anyhow::Result<Dispatcher<R, A, HttpAuthorizer, C>>
where
    R: CredentialReader,
    A: Actuator,
    C: Camera,
    L: NetworkLink,
{
    let Devices {
        reader,
        actuator,
        mut camera,
        mut link,
    } = devices;

    log_device("reader", reader.get_info().await);
    log_device("relay", actuator.get_info().await);
    log_device("camera", camera.get_info().await);

    let authorizer =
        HttpAuthorizer::from_config(config).context("failed to build authorization client")?;
    let access = AccessController::new(
        reader,
        actuator,
        authorizer,
        AccessSettings::from_config(config),
    )
    .await
    .context("failed to initialize door relay")?;

    camera
        .configure(&config.camera)
        .await
        .context("camera initialization failed")?;
    let (width, height) = config.camera.frame_size.dimensions();
    info!(
        frame_size = ?config.camera.frame_size,
        width,
        height,
        jpeg_quality = config.camera.jpeg_quality,
        frame_buffers = config.camera.frame_buffers,
        "Camera configured"
    );

    await_association(&mut link, &config.network, config.association_poll())
        .await
        .context("network association failed")?;

    let (stream_listener, capture_listener) = bind_listeners(config).await?;
    let capture = CaptureService::from_config(config).context("failed to build upload client")?;

    info!(
        stream = ?stream_listener.local_addr().ok(),
        capture = ?capture_listener.local_addr().ok(),
        remote = %config.remote_base_url,
        "Endpoint ready"
    );

    Ok(Dispatcher::new(
        access,
        camera,
        stream_listener,
        capture_listener,
        StreamService::from_config(config),
        capture,
        DispatchSettings::from_config(config),
    ))
}

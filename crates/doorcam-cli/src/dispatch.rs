//! The endpoint's single control loop.
//!
//! Every iteration advances the access loop by one step, fills the next
//! frame slot of the active stream session if it is due, then waits briefly
//! on both listeners. Everything runs on one task; the only long waits are
//! the authorization round trip, the unlock pulse, request-head reads and
//! capture uploads, and each of those is bounded.
//!
//! While a stream session is active the stream listener is not polled, so a
//! second viewer queues in the backlog until the first one leaves.

use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;

use doorcam_access::{AccessController, AccessState, Authorizer};
use doorcam_camera::{CaptureService, FrameOutcome, StreamEnd, StreamService, StreamSession};
use doorcam_core::EndpointConfig;
use doorcam_core::constants::{CAPTURE_PATH, STREAM_PATH};
use doorcam_hardware::{Actuator, Camera, CredentialReader};
use doorcam_network::{HttpConnection, HttpListener, HttpResponse};
use futures::FutureExt;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Timing of the dispatch loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchSettings {
    /// Limit for reading a request head once a client is accepted.
    pub read_timeout: Duration,

    /// Longest wait on the listeners while the access loop is idle.
    pub idle_tick: Duration,
}

impl DispatchSettings {
    pub fn from_config(config: &EndpointConfig) -> Self {
        Self {
            read_timeout: config.request_read_timeout(),
            idle_tick: config.idle_tick(),
        }
    }
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self::from_config(&EndpointConfig::default())
    }
}

/// Listener a connection arrived on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Stream,
    Capture,
}

impl Route {
    /// The one path served on this listener.
    pub fn path(&self) -> &'static str {
        match self {
            Route::Stream => STREAM_PATH,
            Route::Capture => CAPTURE_PATH,
        }
    }
}

/// Owns every service of the endpoint and drives them from one loop.
pub struct Dispatcher<R, A, Z, C>
where
    R: CredentialReader,
    A: Actuator,
    Z: Authorizer,
    C: Camera,
{
    access: AccessController<R, A, Z>,
    camera: C,
    stream_listener: HttpListener,
    capture_listener: HttpListener,
    stream: StreamService,
    capture: CaptureService,
    settings: DispatchSettings,
    session: Option<StreamSession>,
    iterations: u64,
}

impl<R, A, Z, C> Dispatcher<R, A, Z, C>
where
    R: CredentialReader,
    A: Actuator,
    Z: Authorizer,
    C: Camera,
{
    pub fn new(
        access: AccessController<R, A, Z>,
        camera: C,
        stream_listener: HttpListener,
        capture_listener: HttpListener,
        stream: StreamService,
        capture: CaptureService,
        settings: DispatchSettings,
    ) -> Self {
        Self {
            access,
            camera,
            stream_listener,
            capture_listener,
            stream,
            capture,
            settings,
            session: None,
            iterations: 0,
        }
    }

    /// Run until `shutdown` completes.
    ///
    /// Shutdown is checked between iterations, so a pulse in progress always
    /// finishes and the relay is left released.
    pub async fn run<F>(&mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        info!(
            stream = ?self.stream_listener.local_addr().ok(),
            capture = ?self.capture_listener.local_addr().ok(),
            "Dispatcher running"
        );

        loop {
            self.run_once().await;
            if shutdown.as_mut().now_or_never().is_some() {
                break;
            }
        }

        self.stop().await;
        info!(iterations = self.iterations, "Dispatcher stopped");
    }

    /// One loop iteration.
    pub async fn run_once(&mut self) {
        self.iterations += 1;

        let state = self.access.step().await;
        self.advance_stream().await;

        let deadline = self.wait_deadline(state);
        self.poll_listeners(deadline).await;
    }

    /// Close the active stream session, if any.
    pub async fn stop(&mut self) {
        if let Some(session) = self.session.take() {
            session.close(StreamEnd::Shutdown).await;
        }
    }

    async fn advance_stream(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if !session.is_due() {
            return;
        }

        if let FrameOutcome::Ended(end) = session.send_frame(&mut self.camera).await {
            if let Some(session) = self.session.take() {
                session.close(end).await;
            }
        }
    }

    fn wait_deadline(&self, state: AccessState) -> Instant {
        let now = Instant::now();

        // A scan in progress moves on without waiting
        if !matches!(state, AccessState::Idle | AccessState::Cooldown) {
            return now;
        }

        let idle = now + self.settings.idle_tick;
        match &self.session {
            Some(session) => idle.min(session.next_frame_at()),
            None => idle,
        }
    }

    async fn poll_listeners(&mut self, deadline: Instant) {
        let streaming = self.session.is_some();

        let accepted = tokio::select! {
            biased;
            result = self.capture_listener.accept() => Some((Route::Capture, result)),
            result = self.stream_listener.accept(), if !streaming => Some((Route::Stream, result)),
            _ = tokio::time::sleep_until(deadline) => None,
        };

        match accepted {
            Some((route, Ok(connection))) => self.handle(route, connection).await,
            Some((route, Err(e))) => warn!(route = ?route, error = %e, "Accept failed"),
            None => {}
        }
    }

    async fn handle(&mut self, route: Route, mut connection: HttpConnection) {
        let peer = connection.peer_addr();

        let head = match connection.read_head(self.settings.read_timeout).await {
            Ok(head) => head,
            Err(e) => {
                warn!(peer = %peer, route = ?route, error = %e, "Failed to read request");
                return;
            }
        };
        debug!(peer = %peer, method = %head.method, path = %head.path, "Request");

        if head.method != "GET" || head.path != route.path() {
            info!(peer = %peer, method = %head.method, path = %head.path, "Unknown route");
            reply(connection, &HttpResponse::not_found(&head.path)).await;
            return;
        }

        match route {
            Route::Stream => match self.stream.open(connection).await {
                Ok(session) => self.session = Some(session),
                Err(e) => warn!(peer = %peer, error = %e, "Failed to open stream"),
            },
            Route::Capture => self.capture.serve(&mut self.camera, connection).await,
        }
    }

    pub fn access(&self) -> &AccessController<R, A, Z> {
        &self.access
    }

    pub fn camera(&self) -> &C {
        &self.camera
    }

    /// Whether a stream client is being served.
    pub fn is_streaming(&self) -> bool {
        self.session.is_some()
    }

    pub fn stream_addr(&self) -> doorcam_network::Result<SocketAddr> {
        self.stream_listener.local_addr()
    }

    pub fn capture_addr(&self) -> doorcam_network::Result<SocketAddr> {
        self.capture_listener.local_addr()
    }

    pub fn iterations(&self) -> u64 {
        self.iterations
    }
}

async fn reply(mut connection: HttpConnection, response: &HttpResponse) {
    let peer = connection.peer_addr();
    if let Err(e) = connection.respond(response).await {
        warn!(peer = %peer, error = %e, "Failed to send response");
    }
    if let Err(e) = connection.close().await {
        debug!(peer = %peer, error = %e, "Error closing connection");
    }
}

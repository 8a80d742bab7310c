//! Mock camera for testing and development.
//!
//! Frames come from a script of queued outcomes, then from an optional
//! repeating frame. The mock enforces the configured number of frame
//! buffers, so a caller that forgets to release eventually sees capture
//! failures, just like the real driver.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use doorcam_core::CameraSettings;
use tracing::warn;

use crate::{
    HardwareError, Result,
    traits::{Camera, Frame},
    types::DeviceInfo,
};

/// Mock image sensor.
///
/// # Examples
///
/// ```
/// use doorcam_hardware::mock::MockCamera;
/// use doorcam_hardware::traits::{Camera, FrameLease};
///
/// #[tokio::main]
/// async fn main() -> doorcam_hardware::Result<()> {
///     let (mut camera, handle) = MockCamera::new();
///     handle.push_frame(vec![0xFF, 0xD8, 0xFF, 0xD9]);
///
///     {
///         let lease = FrameLease::acquire(&mut camera).await?;
///         assert_eq!(lease.data(), &[0xFF, 0xD8, 0xFF, 0xD9]);
///         assert_eq!(handle.outstanding(), 1);
///     }
///
///     assert_eq!(handle.released(), 1);
///     assert_eq!(handle.outstanding(), 0);
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockCamera {
    name: String,
    state: Arc<Mutex<CameraState>>,
}

#[derive(Debug)]
struct CameraState {
    /// Scripted outcomes, `None` is a failed capture
    script: VecDeque<Option<Vec<u8>>>,

    /// Frame handed out once the script is exhausted
    repeating: Option<Vec<u8>>,

    settings: CameraSettings,
    next_sequence: u64,
    captured: usize,
    released: usize,
    failures: usize,
    outstanding: Vec<u64>,
}

impl MockCamera {
    /// Create a new mock camera with the default name.
    pub fn new() -> (Self, MockCameraHandle) {
        Self::with_name("Mock Camera".to_string())
    }

    /// Create a new mock camera with a custom name.
    pub fn with_name(name: String) -> (Self, MockCameraHandle) {
        let state = Arc::new(Mutex::new(CameraState {
            script: VecDeque::new(),
            repeating: None,
            settings: CameraSettings::default(),
            next_sequence: 0,
            captured: 0,
            released: 0,
            failures: 0,
            outstanding: Vec::new(),
        }));

        let camera = Self {
            name,
            state: Arc::clone(&state),
        };

        (camera, MockCameraHandle { state })
    }

    fn state(&self) -> MutexGuard<'_, CameraState> {
        lock(&self.state)
    }
}

impl Default for MockCamera {
    fn default() -> Self {
        Self::new().0
    }
}

fn lock(state: &Mutex<CameraState>) -> MutexGuard<'_, CameraState> {
    // A panicking test thread must not hide the counters from the others.
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl Camera for MockCamera {
    async fn configure(&mut self, settings: &CameraSettings) -> Result<()> {
        if settings.frame_buffers == 0 {
            return Err(HardwareError::initialization_failed(
                "at least one frame buffer is required",
            ));
        }
        self.state().settings = settings.clone();
        Ok(())
    }

    async fn capture(&mut self) -> Result<Frame> {
        let mut state = self.state();

        if state.outstanding.len() >= usize::from(state.settings.frame_buffers) {
            state.failures += 1;
            return Err(HardwareError::capture("no free frame buffer"));
        }

        let data = match state.script.pop_front() {
            Some(Some(data)) => data,
            Some(None) => {
                state.failures += 1;
                return Err(HardwareError::capture("sensor returned no frame"));
            }
            None => match &state.repeating {
                Some(data) => data.clone(),
                None => {
                    state.failures += 1;
                    return Err(HardwareError::capture("sensor returned no frame"));
                }
            },
        };

        let sequence = state.next_sequence;
        state.next_sequence += 1;
        state.captured += 1;
        state.outstanding.push(sequence);

        Ok(Frame::new(data, sequence))
    }

    fn release(&mut self, frame: Frame) {
        let mut state = self.state();

        match state.outstanding.iter().position(|&seq| seq == frame.sequence) {
            Some(index) => {
                state.outstanding.swap_remove(index);
                state.released += 1;
            }
            None => warn!(sequence = frame.sequence, "Released a frame that was not outstanding"),
        }
    }

    async fn get_info(&self) -> Result<DeviceInfo> {
        Ok(DeviceInfo::new(self.name.clone(), "Mock")
            .with_firmware_version(env!("CARGO_PKG_VERSION")))
    }
}

/// Handle for scripting a mock camera and inspecting its buffer accounting.
#[derive(Debug, Clone)]
pub struct MockCameraHandle {
    state: Arc<Mutex<CameraState>>,
}

impl MockCameraHandle {
    /// Queue one successful capture.
    pub fn push_frame(&self, data: Vec<u8>) {
        lock(&self.state).script.push_back(Some(data));
    }

    /// Queue one failed capture.
    pub fn push_failure(&self) {
        lock(&self.state).script.push_back(None);
    }

    /// Frame to hand out whenever the script is empty.
    pub fn set_repeating_frame(&self, data: Vec<u8>) {
        lock(&self.state).repeating = Some(data);
    }

    /// Number of frames handed out.
    pub fn captured(&self) -> usize {
        lock(&self.state).captured
    }

    /// Number of frames handed back.
    pub fn released(&self) -> usize {
        lock(&self.state).released
    }

    /// Number of failed capture attempts.
    pub fn failures(&self) -> usize {
        lock(&self.state).failures
    }

    /// Number of frames currently held by callers.
    pub fn outstanding(&self) -> usize {
        lock(&self.state).outstanding.len()
    }

    /// Settings applied by the last `configure` call.
    pub fn settings(&self) -> CameraSettings {
        lock(&self.state).settings.clone()
    }
}

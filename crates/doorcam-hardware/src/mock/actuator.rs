//! Mock lock relay.
//!
//! Records every engage/release pair with its timestamps so tests can check
//! pulse widths under a paused clock.

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::time::Instant;

use crate::{HardwareError, Result, traits::Actuator, types::DeviceInfo};

/// One completed or in-progress unlock pulse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pulse {
    pub engaged_at: Instant,
    pub released_at: Option<Instant>,
}

impl Pulse {
    /// Width of a completed pulse.
    pub fn width(&self) -> Option<std::time::Duration> {
        self.released_at.map(|released| released - self.engaged_at)
    }
}

#[derive(Debug, Default)]
struct ActuatorState {
    engaged: bool,
    pulses: Vec<Pulse>,
    fail_next_engage: bool,
    fail_next_release: bool,
}

/// Mock relay.
#[derive(Debug)]
pub struct MockActuator {
    name: String,
    state: Arc<Mutex<ActuatorState>>,
}

impl MockActuator {
    /// Create a new mock relay, released.
    pub fn new() -> (Self, MockActuatorHandle) {
        Self::with_name("Mock Door Relay".to_string())
    }

    /// Create a new mock relay with a custom name.
    pub fn with_name(name: String) -> (Self, MockActuatorHandle) {
        let state = Arc::new(Mutex::new(ActuatorState::default()));
        let actuator = Self {
            name,
            state: Arc::clone(&state),
        };
        (actuator, MockActuatorHandle { state })
    }

    fn state(&self) -> MutexGuard<'_, ActuatorState> {
        lock(&self.state)
    }
}

impl Default for MockActuator {
    fn default() -> Self {
        Self::new().0
    }
}

fn lock(state: &Mutex<ActuatorState>) -> MutexGuard<'_, ActuatorState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl Actuator for MockActuator {
    async fn engage(&mut self) -> Result<()> {
        let mut state = self.state();

        if std::mem::take(&mut state.fail_next_engage) {
            return Err(HardwareError::actuator("relay did not engage"));
        }
        if !state.engaged {
            state.engaged = true;
            state.pulses.push(Pulse {
                engaged_at: Instant::now(),
                released_at: None,
            });
        }
        Ok(())
    }

    async fn release(&mut self) -> Result<()> {
        let mut state = self.state();

        if std::mem::take(&mut state.fail_next_release) {
            return Err(HardwareError::actuator("relay did not release"));
        }
        if state.engaged {
            state.engaged = false;
            if let Some(pulse) = state.pulses.last_mut() {
                pulse.released_at = Some(Instant::now());
            }
        }
        Ok(())
    }

    fn is_engaged(&self) -> bool {
        self.state().engaged
    }

    async fn get_info(&self) -> Result<DeviceInfo> {
        Ok(DeviceInfo::new(self.name.clone(), "Mock")
            .with_firmware_version(env!("CARGO_PKG_VERSION")))
    }
}

/// Handle for inspecting and faulting a mock relay.
#[derive(Debug, Clone)]
pub struct MockActuatorHandle {
    state: Arc<Mutex<ActuatorState>>,
}

impl MockActuatorHandle {
    /// Whether the relay is currently driven.
    pub fn is_engaged(&self) -> bool {
        lock(&self.state).engaged
    }

    /// Every pulse so far, oldest first.
    pub fn pulses(&self) -> Vec<Pulse> {
        lock(&self.state).pulses.clone()
    }

    /// Number of times the relay was engaged.
    pub fn pulse_count(&self) -> usize {
        lock(&self.state).pulses.len()
    }

    /// Make the next `engage` call fail.
    pub fn fail_next_engage(&self) {
        lock(&self.state).fail_next_engage = true;
    }

    /// Make the next `release` call fail.
    pub fn fail_next_release(&self) {
        lock(&self.state).fail_next_release = true;
    }
}

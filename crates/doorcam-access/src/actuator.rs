//! Fixed-width unlock pulse on top of an [`Actuator`].

use std::time::Duration;

use doorcam_hardware::Actuator;
use tracing::{debug, error, info};

use crate::error::Result;

/// Drives the lock relay for exactly one pulse width per call.
///
/// The relay is released at construction and after every pulse, including
/// pulses whose engage step failed.
#[derive(Debug)]
pub struct ActuatorDriver<A: Actuator> {
    actuator: A,
    pulse_width: Duration,
    pulses: u64,
}

impl<A: Actuator> ActuatorDriver<A> {
    /// Take ownership of the relay and drive it to the locked level.
    pub async fn new(mut actuator: A, pulse_width: Duration) -> Result<Self> {
        actuator.release().await?;
        debug!(pulse_width_ms = pulse_width.as_millis() as u64, "Actuator ready");

        Ok(Self {
            actuator,
            pulse_width,
            pulses: 0,
        })
    }

    /// Engage, hold for the pulse width, release.
    ///
    /// # Errors
    ///
    /// Returns the engage or release error. After an engage error the relay
    /// is still released before returning.
    pub async fn pulse(&mut self) -> Result<()> {
        if let Err(e) = self.actuator.engage().await {
            error!(error = %e, "Actuator failed to engage");
            if let Err(release_err) = self.actuator.release().await {
                error!(error = %release_err, "Actuator failed to release after engage error");
            }
            return Err(e.into());
        }

        self.pulses += 1;
        info!(pulse = self.pulses, "Actuator engaged");

        tokio::time::sleep(self.pulse_width).await;

        self.actuator.release().await?;
        debug!(pulse = self.pulses, "Actuator released");
        Ok(())
    }

    /// Number of pulses that engaged the relay.
    pub fn pulse_count(&self) -> u64 {
        self.pulses
    }

    pub fn pulse_width(&self) -> Duration {
        self.pulse_width
    }

    pub fn is_engaged(&self) -> bool {
        self.actuator.is_engaged()
    }

    pub fn actuator(&self) -> &A {
        &self.actuator
    }
}

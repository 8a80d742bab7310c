//! Credential-to-actuation loop.
//!
//! [`AccessController::step`] advances the flow by exactly one state and
//! returns. Only two steps can take noticeable time: the authorization round
//! trip (bounded by the transport timeout) and the unlock pulse (bounded by
//! the pulse width). Everything else is a non-blocking poll, so the caller
//! can interleave listener work between steps.
//!
//! Nothing here is fatal. Reader faults skip the iteration, extraction
//! failures fall back to `Idle`, and authorization failures are denials.

use std::time::Duration;

use doorcam_core::{CredentialId, EndpointConfig, Verdict};
use doorcam_hardware::{Actuator, CredentialReader};
use tracing::{debug, info, warn};

use crate::actuator::ActuatorDriver;
use crate::authorizer::Authorizer;
use crate::error::Result;
use crate::state_machine::{AccessState, StateMachine};

/// Timing knobs of the access loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessSettings {
    pub pulse_width: Duration,
    pub debounce: Duration,

    /// Whether a denial also enters the cooldown.
    pub cooldown_on_denial: bool,
}

impl AccessSettings {
    pub fn from_config(config: &EndpointConfig) -> Self {
        Self {
            pulse_width: config.pulse_width(),
            debounce: config.debounce(),
            cooldown_on_denial: config.cooldown_on_denial,
        }
    }
}

impl Default for AccessSettings {
    fn default() -> Self {
        Self::from_config(&EndpointConfig::default())
    }
}

/// Access control loop over a reader, a lock relay and an authorizer.
#[derive(Debug)]
pub struct AccessController<R, A, Z>
where
    R: CredentialReader,
    A: Actuator,
    Z: Authorizer,
{
    reader: R,
    actuator: ActuatorDriver<A>,
    authorizer: Z,
    machine: StateMachine,
    settings: AccessSettings,

    /// Identifier carried from extraction to authorization.
    pending: Option<CredentialId>,

    last_verdict: Option<Verdict>,
    ignored_tokens: u64,
}

impl<R, A, Z> AccessController<R, A, Z>
where
    R: CredentialReader,
    A: Actuator,
    Z: Authorizer,
{
    /// Build the loop, releasing the relay before anything else happens.
    pub async fn new(reader: R, actuator: A, authorizer: Z, settings: AccessSettings) -> Result<Self> {
        let actuator = ActuatorDriver::new(actuator, settings.pulse_width).await?;

        Ok(Self {
            reader,
            actuator,
            authorizer,
            machine: StateMachine::new(),
            settings,
            pending: None,
            last_verdict: None,
            ignored_tokens: 0,
        })
    }

    /// Advance the flow by one state and return the state reached.
    pub async fn step(&mut self) -> AccessState {
        match self.machine.current_state() {
            AccessState::Idle => self.poll_reader().await,
            AccessState::TokenDetected => self.extract_identifier().await,
            AccessState::IdentifierExtracted => self.enter(AccessState::AwaitingAuthorization),
            AccessState::AwaitingAuthorization => self.authorize().await,
            AccessState::DoorOpen => self.open_door().await,
            AccessState::Rejected => self.reject(),
            AccessState::Cooldown => self.cool_down().await,
        }
        self.machine.current_state()
    }

    async fn poll_reader(&mut self) {
        match self.reader.is_token_present().await {
            Ok(true) => self.enter(AccessState::TokenDetected),
            Ok(false) => {}
            Err(e) if e.is_transient() => debug!(error = %e, "Reader poll failed"),
            Err(e) => warn!(error = %e, "Reader poll failed"),
        }
    }

    async fn extract_identifier(&mut self) {
        let extracted: Result<CredentialId> = match self.reader.read_uid().await {
            Ok(raw) => CredentialId::from_uid_bytes(&raw).map_err(Into::into),
            Err(e) => Err(e.into()),
        };

        match extracted {
            Ok(id) => {
                info!(uid = %id, bytes = id.byte_len(), "Scanned UID");
                self.pending = Some(id);
                self.enter(AccessState::IdentifierExtracted);
            }
            Err(e) => {
                warn!(error = %e, "Failed to extract identifier");
                self.enter(AccessState::Idle);
            }
        }
    }

    async fn authorize(&mut self) {
        let Some(id) = self.pending.take() else {
            warn!("No identifier to authorize, returning to Idle");
            self.machine.reset();
            return;
        };

        let verdict = self.authorizer.authorize(&id).await;

        if let Err(e) = self.reader.halt().await {
            warn!(uid = %id, error = %e, "Failed to halt token");
        }

        if verdict.is_approved() {
            info!(uid = %id, "UID approved");
            self.enter(AccessState::DoorOpen);
        } else {
            info!(uid = %id, verdict = %verdict, payload = %verdict.payload(), "UID rejected");
            self.enter(AccessState::Rejected);
        }
        self.last_verdict = Some(verdict);
    }

    async fn open_door(&mut self) {
        match self.actuator.pulse().await {
            Ok(()) => info!(pulses = self.actuator.pulse_count(), "Door opened"),
            Err(e) => warn!(error = %e, "Door pulse failed"),
        }
        self.enter_cooldown();
    }

    fn reject(&mut self) {
        if self.settings.cooldown_on_denial {
            self.enter_cooldown();
        } else {
            self.enter(AccessState::Idle);
        }
    }

    async fn cool_down(&mut self) {
        match self.machine.check_and_handle_timeout() {
            Ok(Some(transition)) => {
                debug!(from = %transition.from, to = %transition.to, "Cooldown over");
                return;
            }
            Ok(None) => {}
            Err(e) => {
                warn!(error = %e, "Cooldown timeout transition rejected");
                self.machine.reset();
                return;
            }
        }

        // Swallow anything presented during the dead-time.
        match self.reader.is_token_present().await {
            Ok(true) => {
                let uid = self.reader.read_uid().await.ok();
                if let Err(e) = self.reader.halt().await {
                    debug!(error = %e, "Failed to halt ignored token");
                }
                self.ignored_tokens += 1;
                debug!(uid = ?uid, "Ignoring token during cooldown");
            }
            Ok(false) => {}
            Err(e) => debug!(error = %e, "Reader poll failed during cooldown"),
        }
    }

    fn enter_cooldown(&mut self) {
        self.enter(AccessState::Cooldown);
        self.machine.set_timeout(self.settings.debounce);
        debug!(remaining = ?self.cooldown_remaining(), "Cooldown started");
    }

    fn enter(&mut self, state: AccessState) {
        match self.machine.transition_to(state) {
            Ok(transition) => debug!(from = %transition.from, to = %transition.to, "State transition"),
            Err(e) => {
                warn!(error = %e, "Rejected state transition, resetting");
                self.machine.reset();
            }
        }
    }

    pub fn state(&self) -> AccessState {
        self.machine.current_state()
    }

    pub fn machine(&self) -> &StateMachine {
        &self.machine
    }

    pub fn settings(&self) -> &AccessSettings {
        &self.settings
    }

    /// Verdict of the most recent authorization.
    pub fn last_verdict(&self) -> Option<&Verdict> {
        self.last_verdict.as_ref()
    }

    /// Pulses issued so far.
    pub fn pulse_count(&self) -> u64 {
        self.actuator.pulse_count()
    }

    /// Tokens swallowed during cooldown.
    pub fn ignored_tokens(&self) -> u64 {
        self.ignored_tokens
    }

    /// Time left until the cooldown ends.
    pub fn cooldown_remaining(&self) -> Option<Duration> {
        match self.state() {
            AccessState::Cooldown => self.machine.time_remaining(),
            _ => None,
        }
    }

    pub fn reader(&self) -> &R {
        &self.reader
    }
}

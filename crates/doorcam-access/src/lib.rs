//! Access control for the doorcam endpoint.
//!
//! This crate contains the state machine and the loop that turns a token in
//! the reader field into an authorization round trip and, on approval, one
//! unlock pulse.

pub mod actuator;
pub mod authorizer;
pub mod controller;
pub mod error;
pub mod state_machine;

pub use actuator::ActuatorDriver;
pub use authorizer::{Authorizer, HttpAuthorizer};
pub use controller::{AccessController, AccessSettings};
pub use error::{AccessError, Result};
pub use state_machine::{AccessState, StateMachine, StateTransition};

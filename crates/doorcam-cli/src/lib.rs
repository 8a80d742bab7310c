//! Endpoint assembly for the `doorcam` binary.
//!
//! [`startup::start`] brings the peripherals and the network up and returns
//! a [`Dispatcher`], which runs the access loop and both camera listeners on
//! a single task. [`simulate`] drives the mock peripherals from operator
//! input.

pub mod dispatch;
pub mod simulate;
pub mod startup;

pub use dispatch::{DispatchSettings, Dispatcher, Route};
pub use simulate::{Command, CommandError, Simulator};
pub use startup::{Devices, await_association, bind_listeners, start};

//! Mock device implementations for testing and development.
//!
//! This module provides simulated peripherals that can be controlled
//! programmatically without requiring physical hardware.

pub mod actuator;
pub mod camera;
pub mod link;
pub mod reader;

// Re-export commonly used types
pub use actuator::{MockActuator, MockActuatorHandle, Pulse};
pub use camera::{MockCamera, MockCameraHandle};
pub use link::MockLink;
pub use reader::{MockReader, MockReaderHandle};

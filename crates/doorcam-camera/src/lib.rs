//! Camera endpoints of the doorcam node.
//!
//! Two services share one camera: [`StreamService`] pushes a paced MJPEG
//! stream to a single client and [`CaptureService`] grabs one frame, uploads
//! it to the remote service and relays the answer.
//!
//! Neither service keeps a frame past the request that captured it; every
//! frame goes through a [`doorcam_hardware::FrameLease`].

pub mod capture;
pub mod stream;

pub use capture::CaptureService;
pub use stream::{FrameOutcome, StreamEnd, StreamService, StreamSession, encode_part};

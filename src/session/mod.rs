//! Live session model
//!
//! Records for the sessions the transport layer keeps in the directory,
//! and the control surface it exposes for terminating them. The overlay
//! only reads records; all mutation belongs to the owning transport.

pub mod control;
pub mod record;

pub use control::{ControlError, SessionControl};
pub use record::{SessionId, SessionRecord, TransportKind};

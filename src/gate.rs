//! Publish and playback authorization
//!
//! The gate is invoked by the event hooks before a publish or playback
//! session is allowed to proceed. It only returns a decision; terminating
//! a rejected session is the caller's job.

use crate::channels::ChannelDirectory;
use crate::path::parse_stream_path;

/// Why an attempt was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Stream path did not parse into a channel key
    MalformedPath,
    /// Channel is not in the configured directory
    UnknownChannel,
    /// Supplied publish credential does not match the configured one
    CredentialMismatch,
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RejectReason::MalformedPath => write!(f, "malformed stream path"),
            RejectReason::UnknownChannel => write!(f, "unknown channel"),
            RejectReason::CredentialMismatch => write!(f, "credential mismatch"),
        }
    }
}

/// Outcome of an authorization check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Let the session proceed
    Accept,
    /// Terminate the session
    Reject(RejectReason),
}

impl Decision {
    /// Check whether the attempt was accepted
    pub fn is_accept(&self) -> bool {
        matches!(self, Decision::Accept)
    }
}

/// Access control gate for publish and playback attempts
#[derive(Debug, Clone)]
pub struct AccessGate {
    channels: ChannelDirectory,
}

impl AccessGate {
    /// Create a gate over a channel directory
    pub fn new(channels: ChannelDirectory) -> Self {
        Self { channels }
    }

    /// The directory this gate checks against
    pub fn channels(&self) -> &ChannelDirectory {
        &self.channels
    }

    /// Authorize a publish attempt
    ///
    /// The supplied credential must equal the configured one exactly. A
    /// channel configured without a credential only accepts publishes that
    /// carry none.
    pub fn authorize_publish(&self, path: &str, credential: Option<&str>) -> Decision {
        let key = match parse_stream_path(path) {
            Ok(key) => key,
            Err(_) => return Decision::Reject(RejectReason::MalformedPath),
        };

        let Some(access) = self.channels.lookup(&key) else {
            return Decision::Reject(RejectReason::UnknownChannel);
        };

        if access.publish.as_deref() != credential {
            return Decision::Reject(RejectReason::CredentialMismatch);
        }

        Decision::Accept
    }

    /// Authorize a playback attempt
    ///
    /// Viewers are not authenticated; the channel only has to exist in the
    /// directory.
    pub fn authorize_playback(&self, path: &str) -> Decision {
        let key = match parse_stream_path(path) {
            Ok(key) => key,
            Err(_) => return Decision::Reject(RejectReason::MalformedPath),
        };

        if !self.channels.exists(&key) {
            return Decision::Reject(RejectReason::UnknownChannel);
        }

        Decision::Accept
    }
}

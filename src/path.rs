//! Stream path parsing
//!
//! RTMP and FLV clients identify a channel with an opaque path of the form
//! `/<application>/<channel>`. Everything in this crate that needs to know
//! which channel a session belongs to goes through [`parse_stream_path`].

use thiserror::Error;

/// Error returned for a stream path that does not name a channel
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Path is missing the leading slash, a segment, or has an empty segment
    #[error("malformed stream path: {0:?}")]
    Malformed(String),
}

/// Unique identifier for a channel (application + channel name)
///
/// Equality is exact string match on both fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChannelKey {
    /// Application name (e.g., "live")
    pub app: String,
    /// Channel name (e.g., "room1")
    pub channel: String,
}

impl ChannelKey {
    /// Create a new channel key
    pub fn new(app: impl Into<String>, channel: impl Into<String>) -> Self {
        Self {
            app: app.into(),
            channel: channel.into(),
        }
    }

    /// Rebuild the stream path this key was parsed from
    pub fn stream_path(&self) -> String {
        format!("/{}/{}", self.app, self.channel)
    }
}

impl std::fmt::Display for ChannelKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.app, self.channel)
    }
}

/// Parse a stream path into a [`ChannelKey`]
///
/// Strips the leading slash, splits once on the next slash: the first
/// segment is the application, the remainder is the channel. The channel
/// segment may itself contain slashes; the application segment cannot.
/// Parsing is total: either both components are extracted or the path is
/// rejected.
pub fn parse_stream_path(path: &str) -> Result<ChannelKey, ParseError> {
    let malformed = || ParseError::Malformed(path.to_string());

    let rest = path.strip_prefix('/').ok_or_else(malformed)?;
    let (app, channel) = rest.split_once('/').ok_or_else(malformed)?;

    if app.is_empty() || channel.is_empty() {
        return Err(malformed());
    }

    Ok(ChannelKey::new(app, channel))
}

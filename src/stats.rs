//! Per-channel statistics
//!
//! Value objects computed from a directory snapshot and the current
//! timestamp, returned and discarded per query.

use std::sync::Arc;

use serde::Serialize;
use tokio::time::Instant;

use crate::path::ChannelKey;
use crate::session::SessionRecord;

/// Liveness, audience, and rate figures for one channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChannelStats {
    /// Whether a publisher is currently live on the channel
    #[serde(rename = "isLive")]
    pub is_live: bool,
    /// Number of sessions playing the channel
    pub viewers: u64,
    /// Seconds since publishing began, rounded up
    pub duration: u64,
    /// Time-averaged publisher ingest rate in kbit/s, rounded up
    ///
    /// Computed from cumulative bytes since connect, not a sliding window:
    /// a long-lived session with a recent stall still reports its long-run
    /// average.
    pub bitrate: u64,
}

impl ChannelStats {
    /// Stats for a channel with no live publisher
    pub const OFFLINE: ChannelStats = ChannelStats {
        is_live: false,
        viewers: 0,
        duration: 0,
        bitrate: 0,
    };
}

/// Compute the stats for one channel
///
/// `publisher` is the session currently publishing to the channel, located
/// through the directory's publisher lookup. Viewers are counted over the
/// full session set by exact play-path match, independent of the
/// aggregator's grouping.
pub fn compute(
    key: &ChannelKey,
    publisher: Option<&SessionRecord>,
    sessions: &[Arc<SessionRecord>],
    now: Instant,
) -> ChannelStats {
    let play_path = key.stream_path();

    let viewers = sessions
        .iter()
        .filter(|s| s.play_path().as_deref() == Some(play_path.as_str()))
        .count() as u64;

    let mut duration = 0;
    let mut bitrate = 0;

    if let Some(publisher) = publisher {
        if let Some(started) = publisher.publish_started_at() {
            let millis = now.saturating_duration_since(started).as_millis() as u64;
            duration = millis.div_ceil(1000);
            if duration > 0 {
                bitrate = (publisher.bytes_in() * 8).div_ceil(duration * 1024);
            }
        }
    }

    ChannelStats {
        is_live: publisher.is_some(),
        viewers,
        duration,
        bitrate,
    }
}

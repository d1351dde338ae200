//! Channel aggregation over the live session set
//!
//! Channel membership is not stored anywhere; it is derived on demand by
//! scanning a snapshot of the session directory. Each query call rebuilds
//! the full per-channel view and discards it when the response is written.

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::path::{parse_stream_path, ChannelKey};
use crate::session::{SessionId, SessionRecord};

/// Publisher as reported by the query surface
#[derive(Debug, Clone, Serialize)]
pub struct PublisherInfo {
    /// Application name
    pub app: String,
    /// Channel name
    pub channel: String,
    /// Session ID on this server
    #[serde(rename = "serverId")]
    pub server_id: SessionId,
    /// When the connection was accepted
    #[serde(rename = "connectCreated")]
    pub connect_created: DateTime<Utc>,
    /// Bytes read from the publisher since connect
    pub bytes: u64,
    /// Publisher's remote address
    pub ip: IpAddr,
}

/// Subscriber as reported by the query surface
#[derive(Debug, Clone, Serialize)]
pub struct SubscriberInfo {
    /// Application name
    pub app: String,
    /// Channel name
    pub channel: String,
    /// Session ID on this server
    #[serde(rename = "serverId")]
    pub server_id: SessionId,
    /// When the connection was accepted
    #[serde(rename = "connectCreated")]
    pub connect_created: DateTime<Utc>,
    /// Bytes written to the subscriber since connect
    pub bytes: u64,
    /// Subscriber's remote address
    pub ip: IpAddr,
    /// Transport tag: "rtmp", "http", or "ws"
    pub protocol: &'static str,
}

/// Derived per-channel view, recomputed per query
#[derive(Debug, Clone, Default, Serialize)]
pub struct ChannelSnapshot {
    /// The session publishing into the channel, if any
    pub publisher: Option<PublisherInfo>,
    /// Sessions playing from the channel, in directory iteration order
    pub subscribers: Vec<SubscriberInfo>,
}

/// Aggregate a session snapshot into per-channel views
///
/// Every running session with a parseable publish-or-play path claims an
/// entry for its channel, so a channel with viewers but no publisher still
/// appears. Sessions whose path fails to parse are skipped, never errors.
/// The upstream directory admits at most one publisher per channel; should
/// that ever break, the last publisher scanned wins.
pub fn snapshot(sessions: &[Arc<SessionRecord>]) -> HashMap<ChannelKey, ChannelSnapshot> {
    let mut channels: HashMap<ChannelKey, ChannelSnapshot> = HashMap::new();

    let running: Vec<&Arc<SessionRecord>> =
        sessions.iter().filter(|s| s.is_starting()).collect();

    for session in &running {
        let Some(path) = session.channel_path() else {
            continue;
        };
        let Ok(key) = parse_stream_path(&path) else {
            continue;
        };
        channels.entry(key).or_default();
    }

    for session in running.iter().filter(|s| s.is_publishing()) {
        let Some(path) = session.publish_path() else {
            continue;
        };
        let Ok(key) = parse_stream_path(&path) else {
            continue;
        };

        let publisher = PublisherInfo {
            app: key.app.clone(),
            channel: key.channel.clone(),
            server_id: session.id(),
            connect_created: session.connected_at(),
            bytes: session.bytes_in(),
            ip: session.remote_addr().ip(),
        };
        channels.entry(key).or_default().publisher = Some(publisher);
    }

    for session in &running {
        let Some(path) = session.play_path() else {
            continue;
        };
        let Ok(key) = parse_stream_path(&path) else {
            continue;
        };

        let subscriber = SubscriberInfo {
            app: key.app.clone(),
            channel: key.channel.clone(),
            server_id: session.id(),
            connect_created: session.connected_at(),
            bytes: session.bytes_out(),
            ip: session.remote_addr().ip(),
            protocol: session.transport().protocol_tag(),
        };
        channels.entry(key).or_default().subscribers.push(subscriber);
    }

    channels
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::TransportKind;
    use std::net::{Ipv4Addr, SocketAddr};

    fn session(id: SessionId, transport: TransportKind) -> Arc<SessionRecord> {
        let addr = SocketAddr::new(Ipv4Addr::new(10, 0, 0, id as u8).into(), 1935);
        Arc::new(SessionRecord::new(id, transport, addr))
    }

    #[test]
    fn test_publisher_and_subscribers_grouped_by_channel() {
        let publisher = session(1, TransportKind::Rtmp);
        publisher.start_publish("/live/room1");
        publisher.add_bytes_in(1000);

        let rtmp_viewer = session(2, TransportKind::Rtmp);
        rtmp_viewer.start_play("/live/room1");
        rtmp_viewer.add_bytes_out(500);

        let http_viewer = session(3, TransportKind::HttpFlv);
        http_viewer.start_play("/live/room1");

        let sessions = vec![publisher, rtmp_viewer, http_viewer];
        let channels = snapshot(&sessions);

        assert_eq!(channels.len(), 1);
        let snap = &channels[&ChannelKey::new("live", "room1")];

        let publisher = snap.publisher.as_ref().unwrap();
        assert_eq!(publisher.server_id, 1);
        assert_eq!(publisher.bytes, 1000);
        assert_eq!(publisher.app, "live");
        assert_eq!(publisher.channel, "room1");

        assert_eq!(snap.subscribers.len(), 2);
        let by_id = |id| snap.subscribers.iter().find(|s| s.server_id == id).unwrap();
        assert_eq!(by_id(2).protocol, "rtmp");
        assert_eq!(by_id(2).bytes, 500);
        assert_eq!(by_id(3).protocol, "http");
    }

    #[test]
    fn test_viewer_only_channel_appears_without_publisher() {
        let viewer = session(1, TransportKind::WebSocketFlv);
        viewer.start_play("/live/quiet");

        let channels = snapshot(&[viewer]);
        let snap = &channels[&ChannelKey::new("live", "quiet")];

        assert!(snap.publisher.is_none());
        assert_eq!(snap.subscribers.len(), 1);
        assert_eq!(snap.subscribers[0].protocol, "ws");
    }

    #[test]
    fn test_unparseable_paths_are_skipped() {
        let bad = session(1, TransportKind::Rtmp);
        bad.start_play("no-slash");

        let idle = session(2, TransportKind::Rtmp);

        let channels = snapshot(&[bad, idle]);
        assert!(channels.is_empty());
    }

    #[test]
    fn test_stopped_sessions_are_excluded() {
        let done = session(1, TransportKind::Rtmp);
        done.start_publish("/live/room1");
        done.stop();

        let channels = snapshot(&[done]);
        assert!(channels.is_empty());
    }

    #[test]
    fn test_last_publisher_wins_on_duplicate() {
        let first = session(1, TransportKind::Rtmp);
        first.start_publish("/live/room1");
        let second = session(2, TransportKind::Rtmp);
        second.start_publish("/live/room1");

        let channels = snapshot(&[first, second]);
        let snap = &channels[&ChannelKey::new("live", "room1")];

        // One of the two ends up as the publisher; the entry is never split.
        let publisher = snap.publisher.as_ref().unwrap();
        assert!(publisher.server_id == 1 || publisher.server_id == 2);
        assert_eq!(channels.len(), 1);
    }

    #[test]
    fn test_channels_are_independent() {
        let a = session(1, TransportKind::Rtmp);
        a.start_publish("/live/a");
        let b = session(2, TransportKind::Rtmp);
        b.start_publish("/vod/b");

        let channels = snapshot(&[a, b]);

        assert_eq!(channels.len(), 2);
        assert!(channels[&ChannelKey::new("live", "a")].publisher.is_some());
        assert!(channels[&ChannelKey::new("vod", "b")].publisher.is_some());
    }
}

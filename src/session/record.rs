//! Per-session records observed by the overlay
//!
//! A [`SessionRecord`] is owned and mutated by the transport layer that
//! created the connection. The overlay reads point-in-time views of it:
//! byte counters are relaxed atomics, the activity block sits behind a
//! short-lived lock, and nothing here ever suspends.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tokio::time::Instant;

/// Unique session identifier allocated by the connection layer
pub type SessionId = u64;

/// Transport a session arrived over
///
/// Closed set of the transports the server speaks. Byte counters and peer
/// addresses are uniform on the record; the variant only decides the tag
/// reported by the query surface and whether a watchdog is needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    /// RTMP over a raw TCP socket
    Rtmp,
    /// FLV over a plain HTTP response
    HttpFlv,
    /// FLV over a WebSocket
    WebSocketFlv,
}

impl TransportKind {
    /// Short protocol tag used in query output
    pub fn protocol_tag(self) -> &'static str {
        match self {
            TransportKind::Rtmp => "rtmp",
            TransportKind::HttpFlv => "http",
            TransportKind::WebSocketFlv => "ws",
        }
    }

    /// Whether sessions on this transport need the idle watchdog
    ///
    /// Raw RTMP sockets give no signal when the peer silently goes away;
    /// the HTTP-carried transports surface peer death themselves.
    pub fn needs_watchdog(self) -> bool {
        matches!(self, TransportKind::Rtmp)
    }
}

/// What a session is currently doing
#[derive(Debug, Clone, Default)]
struct Activity {
    /// Session is running (set at creation, cleared on stop)
    starting: bool,
    /// Stream path this session publishes to
    publish_path: Option<String>,
    /// Publishing has actually begun
    publishing: bool,
    /// Stream path this session plays from
    play_path: Option<String>,
    /// When publishing began
    publish_started_at: Option<Instant>,
}

/// A live session as kept in the directory
#[derive(Debug)]
pub struct SessionRecord {
    id: SessionId,
    transport: TransportKind,
    remote_addr: SocketAddr,
    connected_at: DateTime<Utc>,
    bytes_in: AtomicU64,
    bytes_out: AtomicU64,
    last_activity: RwLock<Instant>,
    activity: RwLock<Activity>,
}

impl SessionRecord {
    /// Create a record for a freshly accepted connection
    pub fn new(id: SessionId, transport: TransportKind, remote_addr: SocketAddr) -> Self {
        Self {
            id,
            transport,
            remote_addr,
            connected_at: Utc::now(),
            bytes_in: AtomicU64::new(0),
            bytes_out: AtomicU64::new(0),
            last_activity: RwLock::new(Instant::now()),
            activity: RwLock::new(Activity {
                starting: true,
                ..Activity::default()
            }),
        }
    }

    /// Session ID
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Transport kind
    pub fn transport(&self) -> TransportKind {
        self.transport
    }

    /// Remote peer address
    pub fn remote_addr(&self) -> SocketAddr {
        self.remote_addr
    }

    /// Wall-clock time the connection was accepted
    pub fn connected_at(&self) -> DateTime<Utc> {
        self.connected_at
    }

    /// Cumulative bytes read from the peer since connect
    pub fn bytes_in(&self) -> u64 {
        self.bytes_in.load(Ordering::Relaxed)
    }

    /// Cumulative bytes written to the peer since connect
    pub fn bytes_out(&self) -> u64 {
        self.bytes_out.load(Ordering::Relaxed)
    }

    /// Record inbound traffic
    pub fn add_bytes_in(&self, bytes: u64) {
        self.bytes_in.fetch_add(bytes, Ordering::Relaxed);
        self.touch();
    }

    /// Record outbound traffic
    pub fn add_bytes_out(&self, bytes: u64) {
        self.bytes_out.fetch_add(bytes, Ordering::Relaxed);
        self.touch();
    }

    /// Mark transport activity, resetting the idle clock
    pub fn touch(&self) {
        *self.last_activity.write() = Instant::now();
    }

    /// How long the transport has been silent
    pub fn idle_for(&self) -> Duration {
        self.last_activity.read().elapsed()
    }

    /// Mark the session as publishing to `path`
    pub fn start_publish(&self, path: impl Into<String>) {
        let mut activity = self.activity.write();
        activity.publish_path = Some(path.into());
        activity.publishing = true;
        activity.publish_started_at = Some(Instant::now());
    }

    /// Mark the session as playing from `path`
    pub fn start_play(&self, path: impl Into<String>) {
        self.activity.write().play_path = Some(path.into());
    }

    /// Mark the session as stopped
    ///
    /// Safe to call more than once; the second call is a no-op.
    pub fn stop(&self) {
        let mut activity = self.activity.write();
        activity.starting = false;
        activity.publishing = false;
    }

    /// Whether the session is running
    pub fn is_starting(&self) -> bool {
        self.activity.read().starting
    }

    /// Whether the session is actively publishing
    pub fn is_publishing(&self) -> bool {
        self.activity.read().publishing
    }

    /// Stream path this session publishes to, if any
    pub fn publish_path(&self) -> Option<String> {
        self.activity.read().publish_path.clone()
    }

    /// Stream path this session plays from, if any
    pub fn play_path(&self) -> Option<String> {
        self.activity.read().play_path.clone()
    }

    /// When publishing began, if it has
    pub fn publish_started_at(&self) -> Option<Instant> {
        self.activity.read().publish_started_at
    }

    /// The stream path that ties this session to a channel
    ///
    /// Publish path when present, play path otherwise.
    pub fn channel_path(&self) -> Option<String> {
        let activity = self.activity.read();
        activity
            .publish_path
            .clone()
            .or_else(|| activity.play_path.clone())
    }
}

//! Access-control and live-telemetry overlay for multi-tenant media
//! streaming servers.
//!
//! A server hosts many channels, each identified by an application name
//! and a channel name and carrying one publisher and any number of
//! viewers. This crate sits on top of the server's connection layer and
//! provides:
//!
//! - an access gate that checks publish attempts against a configured
//!   credential table and playback attempts against channel existence;
//! - an idle watchdog for the transport that cannot detect dead peers on
//!   its own;
//! - a live view of which channels are up, who is watching, and at what
//!   rate, derived on demand from the session directory and exposed over
//!   a read-only HTTP query API.
//!
//! # Architecture
//!
//! ```text
//!   connection events                 query requests
//!   (pre/post/done)                   GET /channels[...]
//!         │                                 │
//!         ▼                                 ▼
//!   ┌──────────┐   ┌───────────┐   ┌────────────────────┐
//!   │ Overlay  │──►│ AccessGate│   │ snapshot / stats   │
//!   │  hooks   │   └───────────┘   └─────────┬──────────┘
//!   │          │──►┌───────────┐             │ derives per-channel
//!   └────┬─────┘   │ Watchdog  │             │ view on every call
//!        │         └───────────┘             ▼
//!        │      ┌────────────────────────────────────┐
//!        └─────►│ SessionDirectory (live session set)│
//!               └────────────────────────────────────┘
//! ```
//!
//! Channel membership is never stored: every query rescans a point-in-time
//! snapshot of the live session set, so there is no per-channel table to
//! drift out of sync with reality.
//!
//! The media relay itself (frame buffering and fan-out), the wire protocol
//! handshakes, and session lifecycle management are external collaborators
//! reached through the [`directory::SessionDirectory`] and
//! [`session::SessionControl`] traits.

pub mod channels;
pub mod directory;
pub mod gate;
pub mod http;
pub mod overlay;
pub mod path;
pub mod session;
pub mod snapshot;
pub mod stats;
pub mod watchdog;

pub use channels::{ChannelAccess, ChannelDirectory, ConfigError};
pub use directory::{SessionDirectory, SessionRegistry};
pub use gate::{AccessGate, Decision, RejectReason};
pub use overlay::{Overlay, PublishArgs};
pub use path::{parse_stream_path, ChannelKey, ParseError};
pub use session::{ControlError, SessionControl, SessionId, SessionRecord, TransportKind};
pub use snapshot::{snapshot, ChannelSnapshot, PublisherInfo, SubscriberInfo};
pub use stats::ChannelStats;
pub use watchdog::{IdleWatchdog, WatchdogGuard, DEFAULT_IDLE_TIMEOUT};

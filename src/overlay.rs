//! Event hooks tying the overlay together
//!
//! [`Overlay`] is the context object a host wires into its connection
//! event dispatcher. It owns the access gate, the idle watchdog, and a
//! handle to the session directory, and is passed explicitly wherever it
//! is needed rather than living as process-global state.
//!
//! The hooks mirror the dispatcher's event set: `pre`/`post`/`done` for
//! connect, publish, and play. Only the `pre` hooks make decisions; the
//! rest exist for their logs.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::channels::ChannelDirectory;
use crate::directory::SessionDirectory;
use crate::gate::{AccessGate, Decision};
use crate::session::SessionId;
use crate::watchdog::{IdleWatchdog, WatchdogGuard};

/// Argument bag a publish attempt carries
#[derive(Debug, Clone, Default)]
pub struct PublishArgs {
    /// Credential supplied alongside the publish request
    pub password: Option<String>,
}

/// Access-control and telemetry overlay for one server instance
pub struct Overlay {
    gate: AccessGate,
    watchdog: IdleWatchdog,
    directory: Arc<dyn SessionDirectory>,
    guards: Mutex<HashMap<SessionId, WatchdogGuard>>,
}

impl Overlay {
    /// Create an overlay with the default watchdog threshold
    pub fn new(channels: ChannelDirectory, directory: Arc<dyn SessionDirectory>) -> Self {
        Self::with_watchdog(channels, directory, IdleWatchdog::new())
    }

    /// Create an overlay with a custom watchdog
    pub fn with_watchdog(
        channels: ChannelDirectory,
        directory: Arc<dyn SessionDirectory>,
        watchdog: IdleWatchdog,
    ) -> Self {
        Self {
            gate: AccessGate::new(channels),
            watchdog,
            directory,
            guards: Mutex::new(HashMap::new()),
        }
    }

    /// The session directory this overlay observes
    pub fn directory(&self) -> &Arc<dyn SessionDirectory> {
        &self.directory
    }

    /// The access gate
    pub fn gate(&self) -> &AccessGate {
        &self.gate
    }

    /// A connection has been accepted
    ///
    /// Arms the idle watchdog for transports that need one. Must run on a
    /// tokio runtime (the watchdog spawns its timer task).
    pub fn on_pre_connect(&self, id: SessionId) {
        let Some(session) = self.directory.session(id) else {
            tracing::warn!(session_id = id, "pre connect for unknown session");
            return;
        };

        tracing::info!(
            session_id = id,
            peer = %session.remote_addr(),
            transport = session.transport().protocol_tag(),
            "pre connect"
        );

        if session.transport().needs_watchdog() {
            if let Some(control) = self.directory.control(id) {
                let guard = self.watchdog.attach(session, control);
                self.guards.lock().insert(id, guard);
            }
        }
    }

    /// A connection has completed its handshake
    pub fn on_post_connect(&self, id: SessionId) {
        tracing::debug!(session_id = id, "post connect");
    }

    /// A connection has ended
    pub fn on_done_connect(&self, id: SessionId) {
        tracing::info!(session_id = id, "done connect");
        // Dropping the guard disarms the watchdog.
        self.guards.lock().remove(&id);
    }

    /// A publish attempt is about to start
    ///
    /// Returns the gate's decision; on reject the session is also told to
    /// abort through its control handle.
    pub fn on_pre_publish(&self, id: SessionId, path: &str, args: &PublishArgs) -> Decision {
        tracing::info!(session_id = id, path = %path, "pre publish");

        let decision = self.gate.authorize_publish(path, args.password.as_deref());
        if let Decision::Reject(reason) = decision {
            tracing::warn!(session_id = id, path = %path, reason = %reason, "publish rejected");
            self.reject(id);
        }
        decision
    }

    /// A publish has started
    pub fn on_post_publish(&self, id: SessionId, path: &str) {
        tracing::info!(session_id = id, path = %path, "post publish");
    }

    /// A publish has ended
    pub fn on_done_publish(&self, id: SessionId, path: &str) {
        tracing::info!(session_id = id, path = %path, "done publish");
    }

    /// A playback attempt is about to start
    pub fn on_pre_play(&self, id: SessionId, path: &str) -> Decision {
        tracing::info!(session_id = id, path = %path, "pre play");

        let decision = self.gate.authorize_playback(path);
        if let Decision::Reject(reason) = decision {
            tracing::warn!(session_id = id, path = %path, reason = %reason, "play rejected");
            self.reject(id);
        }
        decision
    }

    /// A playback has started
    pub fn on_post_play(&self, id: SessionId, path: &str) {
        tracing::info!(session_id = id, path = %path, "post play");
    }

    /// A playback has ended
    pub fn on_done_play(&self, id: SessionId, path: &str) {
        tracing::info!(session_id = id, path = %path, "done play");
    }

    fn reject(&self, id: SessionId) {
        if let Some(control) = self.directory.control(id) {
            control.reject();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::SessionRegistry;
    use crate::gate::RejectReason;
    use crate::session::{ControlError, SessionControl, SessionRecord, TransportKind};
    use std::net::{IpAddr, Ipv4Addr, SocketAddr};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Default)]
    struct RecordingControl {
        rejects: AtomicUsize,
        stops: AtomicUsize,
        closes: AtomicUsize,
    }

    impl SessionControl for RecordingControl {
        fn reject(&self) {
            self.rejects.fetch_add(1, Ordering::SeqCst);
        }

        fn stop(&self) -> Result<(), ControlError> {
            self.stops.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn close(&self) -> Result<(), ControlError> {
            self.closes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn channels() -> ChannelDirectory {
        ChannelDirectory::from_json(r#"{"live": {"room1": {"publish": "secret"}}}"#).unwrap()
    }

    fn add_session(
        registry: &SessionRegistry,
        id: SessionId,
        transport: TransportKind,
    ) -> (Arc<SessionRecord>, Arc<RecordingControl>) {
        let addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 1935);
        let record = Arc::new(SessionRecord::new(id, transport, addr));
        let control = Arc::new(RecordingControl::default());
        registry.insert(Arc::clone(&record), control.clone());
        (record, control)
    }

    #[tokio::test]
    async fn test_pre_publish_accepts_and_rejects() {
        let registry = Arc::new(SessionRegistry::new());
        let (_record, control) = add_session(&registry, 1, TransportKind::Rtmp);
        let overlay = Overlay::new(channels(), registry);

        let args = PublishArgs {
            password: Some("secret".into()),
        };
        assert_eq!(overlay.on_pre_publish(1, "/live/room1", &args), Decision::Accept);
        assert_eq!(control.rejects.load(Ordering::SeqCst), 0);

        let args = PublishArgs {
            password: Some("wrong".into()),
        };
        assert_eq!(
            overlay.on_pre_publish(1, "/live/room1", &args),
            Decision::Reject(RejectReason::CredentialMismatch)
        );
        assert_eq!(control.rejects.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_pre_play_rejects_unknown_channel() {
        let registry = Arc::new(SessionRegistry::new());
        let (_record, control) = add_session(&registry, 1, TransportKind::HttpFlv);
        let overlay = Overlay::new(channels(), registry);

        assert_eq!(overlay.on_pre_play(1, "/live/room1"), Decision::Accept);
        assert_eq!(
            overlay.on_pre_play(1, "/live/unknown"),
            Decision::Reject(RejectReason::UnknownChannel)
        );
        assert_eq!(control.rejects.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_watchdog_attached_only_to_rtmp() {
        let registry = Arc::new(SessionRegistry::new());
        let (_rtmp, rtmp_control) = add_session(&registry, 1, TransportKind::Rtmp);
        let (_flv, flv_control) = add_session(&registry, 2, TransportKind::HttpFlv);

        let overlay = Overlay::with_watchdog(
            channels(),
            registry,
            IdleWatchdog::with_timeout(Duration::from_secs(20)),
        );
        overlay.on_pre_connect(1);
        overlay.on_pre_connect(2);

        tokio::time::sleep(Duration::from_secs(25)).await;

        assert_eq!(rtmp_control.stops.load(Ordering::SeqCst), 1);
        assert_eq!(rtmp_control.closes.load(Ordering::SeqCst), 1);
        assert_eq!(flv_control.stops.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_done_connect_disarms_watchdog() {
        let registry = Arc::new(SessionRegistry::new());
        let (_record, control) = add_session(&registry, 1, TransportKind::Rtmp);

        let overlay = Overlay::with_watchdog(
            channels(),
            registry,
            IdleWatchdog::with_timeout(Duration::from_secs(20)),
        );
        overlay.on_pre_connect(1);
        overlay.on_done_connect(1);

        tokio::time::sleep(Duration::from_secs(60)).await;

        assert_eq!(control.stops.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_post_and_done_hooks_are_log_only() {
        let registry = Arc::new(SessionRegistry::new());
        let (_record, control) = add_session(&registry, 1, TransportKind::Rtmp);
        let overlay = Overlay::new(channels(), registry);

        overlay.on_post_connect(1);
        overlay.on_post_publish(1, "/live/room1");
        overlay.on_done_publish(1, "/live/room1");
        overlay.on_post_play(1, "/live/room1");
        overlay.on_done_play(1, "/live/room1");

        assert_eq!(control.rejects.load(Ordering::SeqCst), 0);
        assert_eq!(control.stops.load(Ordering::SeqCst), 0);
    }
}

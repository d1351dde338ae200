//! Read-only query surface
//!
//! Two endpoints over the live session directory:
//!
//! - `GET /channels` — every live channel with its publisher and
//!   subscriber list, as nested `app -> channel -> snapshot` JSON.
//! - `GET /channels/{app}/{channel}` — liveness, viewer count, duration,
//!   and bitrate for one channel. Unknown channels answer with the
//!   all-zero stats object, never an error status.
//!
//! Both recompute their answer from a directory snapshot per request;
//! nothing is cached between calls.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use tokio::time::Instant;

use crate::directory::SessionDirectory;
use crate::path::ChannelKey;
use crate::snapshot::{snapshot, ChannelSnapshot};
use crate::stats::{self, ChannelStats};

/// Shared state for the query handlers
#[derive(Clone)]
struct ApiState {
    directory: Arc<dyn SessionDirectory>,
}

/// Build the query API router over a session directory
pub fn router(directory: Arc<dyn SessionDirectory>) -> Router {
    Router::new()
        .route("/channels", get(all_channels))
        .route("/channels/{app}/{channel}", get(channel_stats))
        .with_state(ApiState { directory })
}

async fn all_channels(
    State(state): State<ApiState>,
) -> Json<BTreeMap<String, BTreeMap<String, ChannelSnapshot>>> {
    let sessions = state.directory.sessions();
    let channels = snapshot(&sessions);

    let mut out: BTreeMap<String, BTreeMap<String, ChannelSnapshot>> = BTreeMap::new();
    for (key, snap) in channels {
        out.entry(key.app).or_default().insert(key.channel, snap);
    }

    tracing::debug!(sessions = sessions.len(), "served channel directory");

    Json(out)
}

async fn channel_stats(
    Path((app, channel)): Path<(String, String)>,
    State(state): State<ApiState>,
) -> Json<ChannelStats> {
    let key = ChannelKey::new(app, channel);
    let stream_path = key.stream_path();

    let publisher = state
        .directory
        .publisher_id(&stream_path)
        .and_then(|id| state.directory.session(id));
    let sessions = state.directory.sessions();

    Json(stats::compute(
        &key,
        publisher.as_deref(),
        &sessions,
        Instant::now(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::SessionRegistry;
    use crate::session::{ControlError, SessionControl, SessionRecord, TransportKind};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use std::net::{IpAddr, Ipv4Addr, SocketAddr};
    use tower::ServiceExt;

    struct NoopControl;

    impl SessionControl for NoopControl {
        fn reject(&self) {}

        fn stop(&self) -> Result<(), ControlError> {
            Ok(())
        }

        fn close(&self) -> Result<(), ControlError> {
            Ok(())
        }
    }

    fn add_session(
        registry: &SessionRegistry,
        id: u64,
        transport: TransportKind,
    ) -> Arc<SessionRecord> {
        let addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::new(10, 0, 0, id as u8)), 1935);
        let record = Arc::new(SessionRecord::new(id, transport, addr));
        registry.insert(Arc::clone(&record), Arc::new(NoopControl));
        record
    }

    async fn get_json(router: Router, uri: &str) -> serde_json::Value {
        let response = router
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_all_channels_shape() {
        let registry = Arc::new(SessionRegistry::new());

        let publisher = add_session(&registry, 1, TransportKind::Rtmp);
        publisher.start_publish("/live/room1");
        publisher.add_bytes_in(4096);

        let viewer = add_session(&registry, 2, TransportKind::HttpFlv);
        viewer.start_play("/live/room1");
        viewer.add_bytes_out(2048);

        let body = get_json(router(registry), "/channels").await;
        let room = &body["live"]["room1"];

        assert_eq!(room["publisher"]["serverId"], 1);
        assert_eq!(room["publisher"]["bytes"], 4096);
        assert_eq!(room["publisher"]["ip"], "10.0.0.1");
        assert_eq!(room["subscribers"].as_array().unwrap().len(), 1);
        assert_eq!(room["subscribers"][0]["protocol"], "http");
        assert_eq!(room["subscribers"][0]["bytes"], 2048);
    }

    #[tokio::test]
    async fn test_all_channels_empty_directory() {
        let registry = Arc::new(SessionRegistry::new());

        let body = get_json(router(registry), "/channels").await;

        assert_eq!(body, serde_json::json!({}));
    }

    #[tokio::test]
    async fn test_channel_stats_live() {
        let registry = Arc::new(SessionRegistry::new());

        let publisher = add_session(&registry, 1, TransportKind::Rtmp);
        publisher.start_publish("/live/room1");

        let viewer = add_session(&registry, 2, TransportKind::WebSocketFlv);
        viewer.start_play("/live/room1");

        let body = get_json(router(registry), "/channels/live/room1").await;

        assert_eq!(body["isLive"], true);
        assert_eq!(body["viewers"], 1);
    }

    #[tokio::test]
    async fn test_channel_stats_unknown_channel_is_all_zero() {
        let registry = Arc::new(SessionRegistry::new());

        let body = get_json(router(registry), "/channels/live/nothing").await;

        assert_eq!(
            body,
            serde_json::json!({
                "isLive": false,
                "viewers": 0,
                "duration": 0,
                "bitrate": 0,
            })
        );
    }
}

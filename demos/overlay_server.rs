//! Overlay demo with a simulated session directory
//!
//! Run with: cargo run --example overlay_server [BIND_ADDR]
//!
//! Stands up the query API over an in-memory session registry, drives the
//! event hooks the way a streaming server's dispatcher would, and keeps a
//! fake publisher and viewer alive so the endpoints have something to show:
//!
//!   curl http://localhost:8000/channels
//!   curl http://localhost:8000/channels/live/room1
//!
//! The channel table accepts publishes to live/room1 with password "secret".

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use streamgate::{
    ChannelDirectory, ChannelKey, ControlError, Overlay, PublishArgs, SessionControl,
    SessionRecord, SessionRegistry, TransportKind,
};

/// Control handle for the simulated sessions; nothing to tear down
struct SimControl;

impl SessionControl for SimControl {
    fn reject(&self) {
        println!("session rejected");
    }

    fn stop(&self) -> Result<(), ControlError> {
        Ok(())
    }

    fn close(&self) -> Result<(), ControlError> {
        Ok(())
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let bind_addr: SocketAddr = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "0.0.0.0:8000".to_string())
        .parse()
        .expect("invalid bind address");

    let mut channels = ChannelDirectory::new();
    channels.insert(ChannelKey::new("live", "room1"), Some("secret".into()));

    let registry = Arc::new(SessionRegistry::new());
    let overlay = Arc::new(Overlay::new(channels, registry.clone()));

    // Simulated publisher over RTMP.
    let publisher = Arc::new(SessionRecord::new(
        1,
        TransportKind::Rtmp,
        "203.0.113.10:52001".parse().unwrap(),
    ));
    registry.insert(publisher.clone(), Arc::new(SimControl));
    overlay.on_pre_connect(1);

    let args = PublishArgs {
        password: Some("secret".into()),
    };
    let decision = overlay.on_pre_publish(1, "/live/room1", &args);
    println!("publish decision: {:?}", decision);
    publisher.start_publish("/live/room1");
    overlay.on_post_publish(1, "/live/room1");

    // Simulated viewer over HTTP-FLV.
    let viewer = Arc::new(SessionRecord::new(
        2,
        TransportKind::HttpFlv,
        "198.51.100.7:41002".parse().unwrap(),
    ));
    registry.insert(viewer.clone(), Arc::new(SimControl));
    overlay.on_pre_connect(2);
    overlay.on_pre_play(2, "/live/room1");
    viewer.start_play("/live/room1");
    overlay.on_post_play(2, "/live/room1");

    // Feed the counters so duration and bitrate move.
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(Duration::from_secs(1)).await;
            publisher.add_bytes_in(250_000);
            viewer.add_bytes_out(250_000);
        }
    });

    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .expect("failed to bind");
    println!("query API listening on http://{bind_addr}");

    axum::serve(listener, streamgate::http::router(registry))
        .await
        .expect("server error");
}

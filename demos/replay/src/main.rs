//! Replays a scripted matchmaking conversation through a coordinator.
//!
//! ```text
//! cargo run -p replay                       # built-in happy path
//! cargo run -p replay -- my-script.json     # your own script
//! RUST_LOG=matchline_session=debug cargo run -p replay
//! ```
//!
//! A script is a JSON array of steps. Each step has an `at` offset in
//! milliseconds and is either an inbound message (`route` + `payload`) or a
//! local action (`findMatch`, `accept`, `cancelSearch`, `disconnect`).

use std::time::Duration;

use matchline::prelude::*;
use matchline::protocol::{Codec, JsonCodec};
use serde::Deserialize;
use serde_json::Value;
use tokio::time::Instant;
use tracing::info;
use tracing_subscriber::EnvFilter;

const BUILT_IN_SCRIPT: &str = include_str!("../scripts/happy_path.json");

// ---------------------------------------------------------------------------
// Script
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct Step {
    at: u64,
    #[serde(flatten)]
    kind: StepKind,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StepKind {
    Message { route: String, payload: Value },
    Action(Action),
}

#[derive(Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
enum Action {
    #[serde(rename_all = "camelCase")]
    FindMatch { matchmaking_type: MatchmakingType },
    Accept,
    CancelSearch,
    Disconnect,
}

// ---------------------------------------------------------------------------
// Collaborators that only log
// ---------------------------------------------------------------------------

struct LoggingLink;

impl ServerLink for LoggingLink {
    async fn send(&self, request: ServerRequest) -> Result<(), LinkError> {
        let bytes = JsonCodec.encode(&request).map_err(|e| LinkError::Rejected(e.to_string()))?;
        info!(body = %String::from_utf8_lossy(&bytes), "-> server");
        Ok(())
    }
}

struct LoggingLauncher;

impl GameLauncher for LoggingLauncher {
    async fn set_config(&self, config: Option<GameLaunchConfig>) -> Result<(), LaunchError> {
        match config {
            Some(config) => info!(
                game_id = %config.setup.game_id,
                map = %config.setup.map.name,
                host = %config.setup.host.name,
                "-> game: setConfig"
            ),
            None => info!("-> game: setConfig (teardown)"),
        }
        Ok(())
    }

    async fn set_routes(&self, game_id: GameId, routes: Vec<Value>) -> Result<(), LaunchError> {
        info!(%game_id, routes = routes.len(), "-> game: setRoutes");
        Ok(())
    }

    async fn start_when_ready(&self, game_id: GameId) -> Result<(), LaunchError> {
        info!(%game_id, "-> game: startWhenReady");
        Ok(())
    }

    async fn download_map(&self, hash: String, format: String, url: String) -> Result<(), LaunchError> {
        info!(%hash, %format, %url, "-> game: downloadMap");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("replay=info,matchline=info,matchline_session=info")),
        )
        .init();

    let script = match std::env::args().nth(1) {
        Some(path) => std::fs::read_to_string(path)?,
        None => BUILT_IN_SCRIPT.to_string(),
    };
    let steps: Vec<Step> = serde_json::from_str(&script)?;

    let identity = LocalIdentity::with_client_id(UserId(7), "alice", ClientId("replay-client".into()));
    let (handle, mut ui) =
        MatchCoordinator::spawn(MatchmakingConfig::default(), identity, LoggingLink, LoggingLauncher);

    tokio::spawn(async move {
        while let Some(event) = ui.recv().await {
            match event {
                UiEvent::Snapshot(s) => info!(
                    phase = %s.phase,
                    accept = s.accept_ticks_remaining,
                    accepted = s.accepted_players,
                    of = s.num_players,
                    countdown = s.countdown_ticks_remaining,
                    "ui: snapshot"
                ),
                other => info!(event = ?other, "ui"),
            }
        }
    });

    let start = Instant::now();
    let mut last = 0;
    for step in steps {
        last = last.max(step.at);
        tokio::time::sleep_until(start + Duration::from_millis(step.at)).await;
        match step.kind {
            StepKind::Message { route, payload } => {
                handle.deliver(InboundMessage { route, payload }).await?;
            }
            StepKind::Action(Action::FindMatch { matchmaking_type }) => {
                handle.find_match(matchmaking_type).await?;
            }
            StepKind::Action(Action::Accept) => handle.accept_match().await?,
            StepKind::Action(Action::CancelSearch) => handle.cancel_search().await?,
            StepKind::Action(Action::Disconnect) => handle.disconnect().await?,
        }
    }

    tokio::time::sleep_until(start + Duration::from_millis(last) + Duration::from_millis(500)).await;
    let snapshot = handle.snapshot().await?;
    info!(phase = %snapshot.phase, failure = ?snapshot.failure_reason, "replay finished");

    handle.shutdown().await?;
    Ok(())
}

//! Integration tests for the coordinator actor with fake collaborators.
//!
//! Uses `start_paused = true` so Tokio auto-advances the clock whenever
//! every task is idle. `settle()` lets the actor and the tasks it spawned
//! run to completion without reaching the next timer tick.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use matchline::prelude::*;
use matchline::session::LOAD_FAILED_NOTICE;
use serde_json::{Value, json};

// =========================================================================
// Fakes
// =========================================================================

#[derive(Clone, Default)]
struct FakeLink {
    sent: Arc<Mutex<Vec<String>>>,
}

impl ServerLink for FakeLink {
    async fn send(&self, request: ServerRequest) -> Result<(), LinkError> {
        self.sent.lock().unwrap().push(request.name().to_string());
        Ok(())
    }
}

#[derive(Clone, Default)]
struct FakeLauncher {
    calls: Arc<Mutex<Vec<String>>>,
    reject_start: bool,
    /// How long handing a config to the game process takes.
    config_delay: Option<Duration>,
}

impl FakeLauncher {
    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn count(&self, call: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| *c == call).count()
    }

    /// Calls that configure, start, or tear down the game, in order.
    fn launch_calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.starts_with("setConfig:") || c.starts_with("start:"))
            .cloned()
            .collect()
    }
}

impl GameLauncher for FakeLauncher {
    async fn set_config(&self, config: Option<GameLaunchConfig>) -> Result<(), LaunchError> {
        match config {
            Some(c) => {
                if let Some(delay) = self.config_delay {
                    tokio::time::sleep(delay).await;
                }
                self.record(format!("setConfig:{}", c.setup.game_id))
            }
            None => self.record("setConfig:none".to_string()),
        }
        Ok(())
    }

    async fn set_routes(&self, game_id: GameId, routes: Vec<Value>) -> Result<(), LaunchError> {
        self.record(format!("setRoutes:{game_id}:{}", routes.len()));
        Ok(())
    }

    async fn start_when_ready(&self, game_id: GameId) -> Result<(), LaunchError> {
        if self.reject_start {
            return Err(LaunchError::Rejected("game process crashed".into()));
        }
        self.record(format!("start:{game_id}"));
        Ok(())
    }

    async fn download_map(&self, hash: String, _format: String, _url: String) -> Result<(), LaunchError> {
        self.record(format!("downloadMap:{hash}"));
        Ok(())
    }
}

// =========================================================================
// Helpers
// =========================================================================

const CLIENT_ROUTE: &str = "/matchmaking/1/client-1";

struct Harness {
    handle: CoordinatorHandle,
    ui: UiEvents,
    link: FakeLink,
    launcher: FakeLauncher,
}

impl Harness {
    fn new() -> Self {
        Self::with_launcher(FakeLauncher::default())
    }

    fn with_launcher(launcher: FakeLauncher) -> Self {
        let link = FakeLink::default();
        let identity = LocalIdentity::with_client_id(UserId(1), "alice", ClientId("client-1".into()));
        let (handle, ui) = MatchCoordinator::spawn(
            MatchmakingConfig::default(),
            identity,
            link.clone(),
            launcher.clone(),
        );
        Self {
            handle,
            ui,
            link,
            launcher,
        }
    }

    async fn event(&self, payload: Value) {
        self.deliver(CLIENT_ROUTE, payload).await;
    }

    async fn deliver(&self, route: &str, payload: Value) {
        self.handle
            .deliver(InboundMessage {
                route: route.into(),
                payload,
            })
            .await
            .unwrap();
        settle().await;
    }

    async fn phase(&self) -> MatchPhase {
        self.handle.snapshot().await.unwrap().phase
    }

    fn drain_ui(&mut self) -> Vec<UiEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.ui.try_recv() {
            events.push(event);
        }
        events
    }

    fn sent(&self) -> Vec<String> {
        self.link.sent.lock().unwrap().clone()
    }

    /// Queue, get matched, accept, and receive the assignment.
    async fn to_countdown(&self) {
        self.handle.find_match(MatchmakingType::Match1v1).await.unwrap();
        settle().await;
        self.event(match_found()).await;
        self.handle.accept_match().await.unwrap();
        settle().await;
        self.event(json!({"type": "playerAccepted", "acceptedPlayers": 2}))
            .await;
        self.event(match_ready()).await;
    }
}

async fn settle() {
    tokio::time::sleep(Duration::from_millis(10)).await;
}

fn match_found() -> Value {
    json!({"type": "matchFound", "matchmakingType": "1v1", "numPlayers": 2})
}

fn match_ready() -> Value {
    json!({
        "type": "matchReady",
        "setup": {"gameId": "game-1", "seed": 42},
        "resultCode": "rc",
        "chosenMap": {
            "id": "map-1",
            "hash": "abc123",
            "name": "Fighting Spirit",
            "mapData": {"format": "scx"},
            "mapUrl": "https://maps.example/abc123.scx",
        },
        "slots": [
            {"id": "s1", "name": "alice", "race": "p", "type": "human", "userId": 1},
            {"id": "s2", "name": "bob", "race": "z", "type": "human", "userId": 2},
        ],
    })
}

fn start_when_ready() -> Value {
    json!({"type": "startWhenReady", "gameId": "game-1"})
}

// =========================================================================
// Happy path
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_full_match_launches_once() {
    let h = Harness::new();

    h.handle.find_match(MatchmakingType::Match1v1).await.unwrap();
    settle().await;
    assert_eq!(h.phase().await, MatchPhase::Finding);

    h.event(match_found()).await;
    assert_eq!(h.phase().await, MatchPhase::MatchFound);

    h.handle.accept_match().await.unwrap();
    settle().await;
    // The server confirmed the accept request.
    assert_eq!(h.phase().await, MatchPhase::AwaitingOthers);

    h.event(json!({"type": "playerAccepted", "acceptedPlayers": 2}))
        .await;
    h.event(match_ready()).await;
    let snapshot = h.handle.snapshot().await.unwrap();
    assert_eq!(snapshot.phase, MatchPhase::Ready(ReadyStage::Countdown));
    assert_eq!(snapshot.accepted_players, 2);
    assert_eq!(snapshot.countdown_ticks_remaining, 5);
    assert_eq!(h.launcher.count("downloadMap:abc123"), 1);

    h.event(start_when_ready()).await;
    h.event(start_when_ready()).await;
    assert_eq!(h.phase().await, MatchPhase::Ready(ReadyStage::Launching));
    assert_eq!(h.launcher.count("setConfig:game-1"), 1);
    assert_eq!(h.launcher.count("start:game-1"), 1);

    h.event(json!({"type": "gameStarted"})).await;
    assert_eq!(h.phase().await, MatchPhase::Active);
    assert_eq!(h.sent(), vec!["findMatch", "acceptMatch"]);
}

#[tokio::test(start_paused = true)]
async fn test_ui_stream_follows_the_match() {
    let mut h = Harness::new();
    h.to_countdown().await;

    let events = h.drain_ui();
    assert!(events.contains(&UiEvent::AttentionRequired));
    assert!(events.contains(&UiEvent::Cue(Cue::MatchFound)));
    assert!(events.contains(&UiEvent::OpenAcceptPrompt));
    assert!(events.contains(&UiEvent::CloseDialog));
    assert!(events.contains(&UiEvent::Navigate(View::Countdown)));
    assert!(matches!(
        events.last(),
        Some(UiEvent::Snapshot(s)) if s.phase == MatchPhase::Ready(ReadyStage::Countdown)
    ));
}

#[tokio::test(start_paused = true)]
async fn test_countdown_ticks_down() {
    let h = Harness::new();
    h.to_countdown().await;

    tokio::time::sleep(Duration::from_secs(2)).await;
    let snapshot = h.handle.snapshot().await.unwrap();
    assert_eq!(snapshot.countdown_ticks_remaining, 3);

    // Reaching zero is a cue; the phase waits for the server.
    tokio::time::sleep(Duration::from_secs(5)).await;
    let snapshot = h.handle.snapshot().await.unwrap();
    assert_eq!(snapshot.countdown_ticks_remaining, 0);
    assert_eq!(snapshot.phase, MatchPhase::Ready(ReadyStage::Countdown));
}

#[tokio::test(start_paused = true)]
async fn test_set_routes_forwarded_to_launcher() {
    let h = Harness::new();
    h.to_countdown().await;

    h.event(json!({"type": "setRoutes", "gameId": "game-1", "routes": [{"for": 2}]}))
        .await;
    assert_eq!(h.launcher.count("setRoutes:game-1:1"), 1);
}

// =========================================================================
// Accept window
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_accept_window_expires_then_returns_to_idle() {
    let h = Harness::new();
    h.handle.find_match(MatchmakingType::Match1v1).await.unwrap();
    settle().await;
    h.event(match_found()).await;

    tokio::time::sleep(Duration::from_secs(3)).await;
    let snapshot = h.handle.snapshot().await.unwrap();
    assert_eq!(snapshot.accept_ticks_remaining, 12);
    assert_eq!(snapshot.phase, MatchPhase::MatchFound);

    tokio::time::sleep(Duration::from_secs(12)).await;
    let snapshot = h.handle.snapshot().await.unwrap();
    assert_eq!(snapshot.phase, MatchPhase::FailedToAccept);
    assert_eq!(
        snapshot.failure_reason.as_deref(),
        Some("Failed to accept the match in time.")
    );

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(h.phase().await, MatchPhase::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_retry_during_fallback_cancels_it() {
    let h = Harness::new();
    h.handle.find_match(MatchmakingType::Match1v1).await.unwrap();
    settle().await;
    h.event(match_found()).await;
    tokio::time::sleep(Duration::from_secs(16)).await;
    assert_eq!(h.phase().await, MatchPhase::FailedToAccept);

    h.handle.find_match(MatchmakingType::Match1v1).await.unwrap();
    settle().await;
    assert_eq!(h.phase().await, MatchPhase::Finding);

    // The old fallback would have fired here.
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(h.phase().await, MatchPhase::Finding);
    assert_eq!(h.sent(), vec!["findMatch", "findMatch"]);
}

// =========================================================================
// Cancellation
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_cancel_loading_stops_countdown() {
    let mut h = Harness::new();
    h.to_countdown().await;
    h.drain_ui();

    h.event(json!({"type": "cancelLoading", "reason": "x"})).await;
    let snapshot = h.handle.snapshot().await.unwrap();
    assert_eq!(snapshot.phase, MatchPhase::Canceled);
    assert_eq!(snapshot.failure_reason.as_deref(), Some("x"));

    let events = h.drain_ui();
    assert!(events.contains(&UiEvent::Navigate(View::Home)));
    assert!(events.contains(&UiEvent::Notice(LOAD_FAILED_NOTICE.into())));

    // No countdown signal reaches the machine any more.
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert!(
        !h.drain_ui()
            .iter()
            .any(|e| matches!(e, UiEvent::Snapshot(_)))
    );
    assert_eq!(h.launcher.count("setConfig:none"), 0);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_after_launch_tears_down() {
    let h = Harness::new();
    h.to_countdown().await;
    h.event(start_when_ready()).await;

    h.event(json!({"type": "cancelLoading"})).await;
    assert_eq!(h.phase().await, MatchPhase::Canceled);
    assert_eq!(h.launcher.count("setConfig:none"), 1);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_during_slow_launch_leaves_teardown_last() {
    let h = Harness::with_launcher(FakeLauncher {
        config_delay: Some(Duration::from_millis(100)),
        ..FakeLauncher::default()
    });
    h.to_countdown().await;
    h.event(start_when_ready()).await;
    // The launch is still inside setConfig.
    assert!(h.launcher.launch_calls().is_empty());

    h.event(json!({"type": "cancelLoading", "reason": "x"})).await;
    tokio::time::sleep(Duration::from_millis(500)).await;

    assert_eq!(h.phase().await, MatchPhase::Canceled);
    assert_eq!(h.launcher.launch_calls(), vec!["setConfig:none".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn test_launch_failure_cancels_without_retry() {
    let h = Harness::with_launcher(FakeLauncher {
        reject_start: true,
        ..FakeLauncher::default()
    });
    h.to_countdown().await;
    h.event(start_when_ready()).await;

    let snapshot = h.handle.snapshot().await.unwrap();
    assert_eq!(snapshot.phase, MatchPhase::Canceled);
    assert!(snapshot.failure_reason.unwrap().contains("game process crashed"));
    assert_eq!(h.launcher.count("setConfig:game-1"), 1);
    assert_eq!(h.launcher.count("setConfig:none"), 1);
}

#[tokio::test(start_paused = true)]
async fn test_disconnect_unwinds_session() {
    let h = Harness::new();
    h.handle.find_match(MatchmakingType::Match1v1).await.unwrap();
    settle().await;
    h.event(match_found()).await;

    h.handle.disconnect().await.unwrap();
    settle().await;
    assert_eq!(h.phase().await, MatchPhase::Idle);

    tokio::time::sleep(Duration::from_secs(20)).await;
    assert_eq!(h.phase().await, MatchPhase::Idle);
}

// =========================================================================
// Inbound filtering
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_messages_for_other_routes_are_dropped() {
    let h = Harness::new();
    h.handle.find_match(MatchmakingType::Match1v1).await.unwrap();
    settle().await;

    h.deliver("/matchmaking/2/client-1", match_found()).await;
    h.deliver("/matchmaking/1/other-client", match_found()).await;
    h.deliver("/matchmaking/bob", match_found()).await;
    h.deliver("/lobbies/alice", match_found()).await;
    assert_eq!(h.phase().await, MatchPhase::Finding);

    h.deliver("/matchmaking/alice", match_found()).await;
    assert_eq!(h.phase().await, MatchPhase::MatchFound);
}

#[tokio::test(start_paused = true)]
async fn test_unknown_and_malformed_events_are_dropped() {
    let h = Harness::new();
    h.handle.find_match(MatchmakingType::Match1v1).await.unwrap();
    settle().await;

    h.event(json!({"type": "somethingNew", "value": 1})).await;
    h.event(json!({"type": "matchFound"})).await;
    h.event(json!({"noType": true})).await;
    assert_eq!(h.phase().await, MatchPhase::Finding);
}

#[tokio::test(start_paused = true)]
async fn test_raw_frames_are_decoded() {
    let h = Harness::new();
    h.handle.find_match(MatchmakingType::Match1v1).await.unwrap();
    settle().await;

    let frame = serde_json::to_vec(&json!({"route": CLIENT_ROUTE, "payload": match_found()})).unwrap();
    h.handle.deliver_frame(&frame).await.unwrap();
    settle().await;
    assert_eq!(h.phase().await, MatchPhase::MatchFound);

    let err = h.handle.deliver_frame(b"not json").await.unwrap_err();
    assert!(matches!(err, MatchlineError::Protocol(_)));
}

#[tokio::test(start_paused = true)]
async fn test_status_broadcast_reaches_ui() {
    let mut h = Harness::new();
    h.deliver("/matchmakingStatus", json!([{"type": "2v2", "enabled": false}]))
        .await;

    let events = h.drain_ui();
    assert!(events.iter().any(|e| matches!(
        e,
        UiEvent::QueueAvailability(s) if s.matchmaking_type == MatchmakingType::Match2v2 && !s.enabled
    )));
}

// =========================================================================
// Lifecycle
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_handle_unavailable_after_shutdown() {
    let h = Harness::new();
    h.handle.shutdown().await.unwrap();
    settle().await;

    let err = h.handle.find_match(MatchmakingType::Match1v1).await.unwrap_err();
    assert!(matches!(err, MatchlineError::Unavailable));
}

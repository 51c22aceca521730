//! The boundary to the external game process.

use std::future::Future;

use matchline_protocol::GameId;
use serde_json::Value;

use crate::{GameLaunchConfig, LaunchError, LaunchRequest};

/// Calls into the process that actually runs the game.
///
/// Every call is asynchronous; callers never block on them and receive
/// results as completions. Implementations may be written with `async fn`.
///
/// ## Return-position `impl Future`
///
/// The methods are declared as `fn ... -> impl Future<Output = ...> + Send`
/// rather than `async fn` so the trait can promise the returned future is
/// `Send`. The coordinator moves these futures onto `tokio::spawn`, which
/// may poll them on any worker thread. An implementor still writes a plain
/// `async fn`; the compiler checks that its future satisfies the bound.
///
/// `Send + Sync + 'static` on the trait itself lets one launcher sit in an
/// `Arc` shared by every spawned call.
pub trait GameLauncher: Send + Sync + 'static {
    /// Hand the game process its configuration. `None` tears down any
    /// configuration set earlier.
    fn set_config(
        &self,
        config: Option<GameLaunchConfig>,
    ) -> impl Future<Output = Result<(), LaunchError>> + Send;

    /// Forward network routes for `game_id`.
    fn set_routes(
        &self,
        game_id: GameId,
        routes: Vec<Value>,
    ) -> impl Future<Output = Result<(), LaunchError>> + Send;

    /// Let the configured game start as soon as it has loaded.
    fn start_when_ready(&self, game_id: GameId) -> impl Future<Output = Result<(), LaunchError>> + Send;

    /// Make sure the map with `hash` is available locally, fetching it
    /// from `url` if needed.
    fn download_map(
        &self,
        hash: String,
        format: String,
        url: String,
    ) -> impl Future<Output = Result<(), LaunchError>> + Send;
}

/// Issues `request`: configure the game process, then let it start.
///
/// Stops at the first failing call: each `?` returns the error to the
/// caller before the next call is made, so a game that failed to configure
/// is never told to start.
pub async fn launch<L: GameLauncher>(launcher: &L, request: LaunchRequest) -> Result<GameId, LaunchError> {
    let LaunchRequest { game_id, config } = request;
    launcher.set_config(Some(config)).await?;
    launcher.start_when_ready(game_id.clone()).await?;
    tracing::info!(%game_id, "launch issued");
    Ok(game_id)
}

/// Best-effort teardown of a launch issued earlier. Failures are logged.
pub async fn teardown<L: GameLauncher>(launcher: &L) {
    if let Err(e) = launcher.set_config(None).await {
        tracing::warn!(error = %e, "launch teardown failed");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::request::tests::assignment;
    use crate::{LaunchRequestBuilder, LocalUser};
    use matchline_protocol::UserId;

    #[derive(Default)]
    struct ScriptedLauncher {
        calls: Mutex<Vec<String>>,
        reject_start: bool,
    }

    impl GameLauncher for ScriptedLauncher {
        async fn set_config(&self, config: Option<GameLaunchConfig>) -> Result<(), LaunchError> {
            let call = match config {
                Some(c) => format!("setConfig:{}", c.setup.game_id),
                None => "setConfig:none".to_string(),
            };
            self.calls.lock().unwrap().push(call);
            Ok(())
        }

        async fn set_routes(&self, game_id: GameId, _routes: Vec<Value>) -> Result<(), LaunchError> {
            self.calls.lock().unwrap().push(format!("setRoutes:{game_id}"));
            Ok(())
        }

        async fn start_when_ready(&self, game_id: GameId) -> Result<(), LaunchError> {
            self.calls.lock().unwrap().push(format!("startWhenReady:{game_id}"));
            if self.reject_start {
                return Err(LaunchError::Rejected("game crashed".into()));
            }
            Ok(())
        }

        async fn download_map(&self, hash: String, _format: String, _url: String) -> Result<(), LaunchError> {
            self.calls.lock().unwrap().push(format!("downloadMap:{hash}"));
            Ok(())
        }
    }

    fn request() -> LaunchRequest {
        LaunchRequestBuilder::new(
            LocalUser {
                id: UserId(1),
                name: "alice".into(),
            },
            "https://play.example",
        )
        .build(&assignment())
        .unwrap()
    }

    #[tokio::test]
    async fn test_launch_configures_then_starts() {
        let launcher = ScriptedLauncher::default();
        let game_id = launch(&launcher, request()).await.unwrap();
        assert_eq!(game_id, GameId("g-7".into()));
        assert_eq!(
            *launcher.calls.lock().unwrap(),
            vec!["setConfig:g-7".to_string(), "startWhenReady:g-7".to_string()]
        );
    }

    #[tokio::test]
    async fn test_launch_reports_rejection() {
        let launcher = ScriptedLauncher {
            reject_start: true,
            ..Default::default()
        };
        let err = launch(&launcher, request()).await.unwrap_err();
        assert_eq!(err, LaunchError::Rejected("game crashed".into()));
    }

    #[tokio::test]
    async fn test_teardown_clears_config() {
        let launcher = ScriptedLauncher::default();
        teardown(&launcher).await;
        assert_eq!(*launcher.calls.lock().unwrap(), vec!["setConfig:none".to_string()]);
    }
}

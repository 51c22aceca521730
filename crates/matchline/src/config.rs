//! Coordinator configuration and local identity.

use std::time::Duration;

use matchline_launch::LocalUser;
use matchline_protocol::{ClientId, UserId};
use matchline_session::{ACCEPT_MATCH_TIME_SECS, MatchConfig};
use matchline_timer::TimerConfig;
use rand::Rng;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// MatchmakingConfig
// ---------------------------------------------------------------------------

/// Settings for a [`MatchCoordinator`](crate::MatchCoordinator).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchmakingConfig {
    /// Length of the accept window, in ticks.
    pub accept_window_secs: u32,

    /// Delay before a failed accept returns to the idle screen.
    pub requeue_delay: Duration,

    /// Length of the pre-game countdown, in ticks.
    pub countdown_secs: u32,

    /// Length of one timer tick.
    pub tick_interval: Duration,

    /// Capacity of the coordinator's command channel. Senders wait when
    /// it is full.
    pub channel_size: usize,

    /// Server URL handed to the game process.
    pub server_url: String,
}

impl Default for MatchmakingConfig {
    fn default() -> Self {
        Self {
            accept_window_secs: ACCEPT_MATCH_TIME_SECS,
            requeue_delay: Duration::from_secs(5),
            countdown_secs: 5,
            tick_interval: Duration::from_secs(1),
            channel_size: 64,
            server_url: "http://localhost:5555".to_string(),
        }
    }
}

impl MatchmakingConfig {
    /// Smallest command channel accepted.
    pub const MIN_CHANNEL_SIZE: usize = 1;
    /// Largest command channel accepted.
    pub const MAX_CHANNEL_SIZE: usize = 4096;

    /// Clamp out-of-range values so the config is safe to use.
    pub fn validated(mut self) -> Self {
        let match_config = self.match_config();
        self.accept_window_secs = match_config.accept_window_secs;
        self.requeue_delay = match_config.requeue_delay;
        self.countdown_secs = match_config.countdown_secs;
        self.tick_interval = self.timer_config().tick_interval;

        let clamped = self
            .channel_size
            .clamp(Self::MIN_CHANNEL_SIZE, Self::MAX_CHANNEL_SIZE);
        if clamped != self.channel_size {
            tracing::warn!(
                requested = self.channel_size,
                clamped,
                "channel_size out of range, clamping"
            );
            self.channel_size = clamped;
        }
        self
    }

    /// The state machine's share of the settings.
    pub fn match_config(&self) -> MatchConfig {
        MatchConfig {
            accept_window_secs: self.accept_window_secs,
            requeue_delay: self.requeue_delay,
            countdown_secs: self.countdown_secs,
        }
        .validated()
    }

    /// The timer registry's share of the settings.
    pub fn timer_config(&self) -> TimerConfig {
        TimerConfig {
            tick_interval: self.tick_interval,
        }
        .validated()
    }
}

// ---------------------------------------------------------------------------
// LocalIdentity
// ---------------------------------------------------------------------------

/// Who this client is. Inbound messages are only accepted on routes that
/// match it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalIdentity {
    pub user_id: UserId,
    pub user_name: String,
    pub client_id: ClientId,
}

impl LocalIdentity {
    /// Identity with a freshly generated client id.
    pub fn new(user_id: UserId, user_name: impl Into<String>) -> Self {
        Self::with_client_id(user_id, user_name, generate_client_id())
    }

    pub fn with_client_id(user_id: UserId, user_name: impl Into<String>, client_id: ClientId) -> Self {
        Self {
            user_id,
            user_name: user_name.into(),
            client_id,
        }
    }

    /// The user the game process runs as.
    pub fn local_user(&self) -> LocalUser {
        LocalUser {
            id: self.user_id,
            name: self.user_name.clone(),
        }
    }
}

/// Generates a random 32-character hex client id (128 bits).
fn generate_client_id() -> ClientId {
    let bytes: [u8; 16] = rand::rng().random();
    ClientId(bytes.iter().map(|b| format!("{b:02x}")).collect())
}

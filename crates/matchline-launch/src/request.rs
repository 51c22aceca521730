//! Assignment, launch configuration, and the builder that joins them.

use matchline_protocol::{
    GameId, MapInfo, MatchReady, MatchmakingType, Race, Slot, UserId,
};
use serde::{Deserialize, Serialize};

use crate::LaunchError;

/// Display name the game process shows for matchmaking games.
pub const MATCHMAKING_GAME_NAME: &str = "Matchmaking game";

// ---------------------------------------------------------------------------
// Assignment
// ---------------------------------------------------------------------------

/// What the server decided for a confirmed match: map, slots, seed, and
/// result code. Recorded once when the match becomes ready.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub matchmaking_type: MatchmakingType,
    pub game_id: Option<GameId>,
    pub seed: Option<u32>,
    pub result_code: Option<String>,
    pub map: MapInfo,
    pub slots: Vec<Slot>,
}

impl Assignment {
    /// Takes the assignment out of a `matchReady` event.
    pub fn from_match_ready(matchmaking_type: MatchmakingType, ready: MatchReady) -> Self {
        Self {
            matchmaking_type,
            game_id: ready.setup.game_id,
            seed: ready.setup.seed,
            result_code: ready.result_code,
            map: ready.chosen_map,
            slots: ready.slots,
        }
    }

    /// The slot that hosts the game. The first slot is always chosen.
    pub fn host(&self) -> Option<&Slot> {
        self.slots.first()
    }
}

// ---------------------------------------------------------------------------
// Launch configuration (what the game process receives)
// ---------------------------------------------------------------------------

/// The local user the game process runs as.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalUser {
    pub id: UserId,
    pub name: String,
}

/// Game mode the game process should set up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GameType {
    OneVsOne,
    TopVsBottom,
}

impl GameType {
    /// Game type and sub type for a queue.
    pub fn for_matchmaking(matchmaking_type: MatchmakingType) -> (GameType, u8) {
        match matchmaking_type {
            MatchmakingType::Match1v1 | MatchmakingType::Match1v1Fastest => (GameType::OneVsOne, 0),
            MatchmakingType::Match2v2 => (GameType::TopVsBottom, 2),
        }
    }
}

/// A player as the game process sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerInfo {
    pub id: String,
    pub name: String,
    pub race: Race,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub player_id: Option<u32>,
    #[serde(rename = "type")]
    pub slot_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_id: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
}

impl From<&Slot> for PlayerInfo {
    fn from(slot: &Slot) -> Self {
        Self {
            id: slot.id.clone(),
            name: slot.name.clone(),
            race: slot.race,
            player_id: slot.player_id,
            slot_type: slot.slot_type.clone(),
            type_id: slot.type_id,
            user_id: slot.user_id,
        }
    }
}

/// Everything the game process needs to join a game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSetup {
    pub game_id: GameId,
    pub name: String,
    pub map: MapInfo,
    pub game_type: GameType,
    pub game_sub_type: u8,
    pub slots: Vec<PlayerInfo>,
    pub host: PlayerInfo,
    pub seed: u32,
    pub result_code: String,
    pub server_url: String,
}

/// The full configuration handed to the game process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameLaunchConfig {
    pub local_user: LocalUser,
    pub setup: GameSetup,
}

// ---------------------------------------------------------------------------
// LaunchRequest + builder
// ---------------------------------------------------------------------------

/// A one-shot launch: the configuration plus the game it starts.
#[derive(Debug, Clone, PartialEq)]
pub struct LaunchRequest {
    pub game_id: GameId,
    pub config: GameLaunchConfig,
}

/// Builds [`LaunchRequest`]s from assignments.
#[derive(Debug, Clone)]
pub struct LaunchRequestBuilder {
    local_user: LocalUser,
    server_url: String,
}

impl LaunchRequestBuilder {
    pub fn new(local_user: LocalUser, server_url: impl Into<String>) -> Self {
        Self {
            local_user,
            server_url: server_url.into(),
        }
    }

    pub fn local_user(&self) -> &LocalUser {
        &self.local_user
    }

    /// Assembles the launch request for `assignment`.
    ///
    /// # Errors
    /// - [`LaunchError::MissingField`] without a game id, seed, or result code
    /// - [`LaunchError::NoSlots`] when there is no slot to host the game
    pub fn build(&self, assignment: &Assignment) -> Result<LaunchRequest, LaunchError> {
        let game_id = assignment
            .game_id
            .clone()
            .ok_or(LaunchError::MissingField("gameId"))?;
        let seed = assignment.seed.ok_or(LaunchError::MissingField("seed"))?;
        let result_code = assignment
            .result_code
            .clone()
            .ok_or(LaunchError::MissingField("resultCode"))?;
        let host = assignment.host().map(PlayerInfo::from).ok_or(LaunchError::NoSlots)?;

        let slots = assignment.slots.iter().map(PlayerInfo::from).collect();
        let (game_type, game_sub_type) = GameType::for_matchmaking(assignment.matchmaking_type);

        tracing::debug!(%game_id, host = %host.name, "launch request built");

        Ok(LaunchRequest {
            game_id: game_id.clone(),
            config: GameLaunchConfig {
                local_user: self.local_user.clone(),
                setup: GameSetup {
                    game_id,
                    name: MATCHMAKING_GAME_NAME.to_string(),
                    map: assignment.map.clone(),
                    game_type,
                    game_sub_type,
                    slots,
                    host,
                    seed,
                    result_code,
                    server_url: self.server_url.clone(),
                },
            },
        })
    }
}

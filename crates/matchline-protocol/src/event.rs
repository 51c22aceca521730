//! Inbound matchmaking events and the payloads they carry.
//!
//! The server tags every event with a `type` field. Decoding happens in two
//! steps so that an event type this client does not know about is dropped
//! quietly instead of being reported as a decode failure:
//!
//! 1. read the `type` tag and check it against [`MatchmakingEvent::KNOWN_TAGS`]
//! 2. decode the full payload into the matching variant

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{ClientId, GameId, MatchmakingType, ProtocolError, UserId};

// ---------------------------------------------------------------------------
// Payloads
// ---------------------------------------------------------------------------

/// A match was proposed; every player must accept within the accept window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchFound {
    pub matchmaking_type: MatchmakingType,
    pub num_players: u32,
}

/// Acceptance progress: how many of the matched players have accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerAccepted {
    pub accepted_players: u32,
}

/// A player's race choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Race {
    #[serde(rename = "p")]
    Protoss,
    #[serde(rename = "t")]
    Terran,
    #[serde(rename = "z")]
    Zerg,
    #[serde(rename = "r")]
    Random,
}

/// Map file details needed to fetch and verify the map locally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapData {
    pub format: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tileset: Option<String>,
}

/// The map the server picked for a match.
///
/// Fields this client does not interpret are kept in `extra` so the whole
/// map record can be handed on to the game process unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapInfo {
    pub id: String,
    pub hash: String,
    pub name: String,
    pub map_data: MapData,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map_url: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// One player slot of a confirmed match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Slot {
    pub id: String,
    pub name: String,
    pub race: Race,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player_id: Option<u32>,
    #[serde(rename = "type")]
    pub slot_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_id: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
}

/// Server-side game setup for a confirmed match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchSetup {
    #[serde(default)]
    pub game_id: Option<GameId>,
    #[serde(default)]
    pub seed: Option<u32>,
}

/// All players accepted and the server validated the match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchReady {
    pub setup: MatchSetup,
    #[serde(default)]
    pub result_code: Option<String>,
    pub chosen_map: MapInfo,
    pub slots: Vec<Slot>,
}

/// Network routes for the game, forwarded verbatim to the game process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetRoutes {
    pub game_id: GameId,
    pub routes: Vec<Value>,
}

/// The server authorizes the game process to start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartWhenReady {
    pub game_id: GameId,
}

/// Loading failed somewhere; the match is off.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelLoading {
    #[serde(default)]
    pub reason: Option<String>,
}

/// The queue this client is currently searching in, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuedMatchmaking {
    #[serde(rename = "type")]
    pub matchmaking_type: MatchmakingType,
}

/// Server-reported queue membership, sent on (re)connect.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueStatus {
    #[serde(default)]
    pub matchmaking: Option<QueuedMatchmaking>,
}

/// Whether one queue type is currently open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchmakingStatus {
    #[serde(rename = "type")]
    pub matchmaking_type: MatchmakingType,
    pub enabled: bool,
}

// ---------------------------------------------------------------------------
// MatchmakingEvent
// ---------------------------------------------------------------------------

/// Every event the server publishes on a matchmaking route.
///
/// `#[serde(tag = "type")]` makes this an internally tagged enum: the
/// variant name travels as a `type` field next to the payload fields, e.g.
/// `{"type":"playerAccepted","acceptedPlayers":1}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum MatchmakingEvent {
    MatchFound(MatchFound),
    PlayerAccepted(PlayerAccepted),
    AcceptTimeout,
    Requeue,
    MatchReady(MatchReady),
    SetRoutes(SetRoutes),
    StartCountdown,
    StartWhenReady(StartWhenReady),
    CancelLoading(CancelLoading),
    GameStarted,
    QueueStatus(QueueStatus),
}

impl MatchmakingEvent {
    /// Wire tags of every event this client handles.
    pub const KNOWN_TAGS: [&'static str; 11] = [
        "matchFound",
        "playerAccepted",
        "acceptTimeout",
        "requeue",
        "matchReady",
        "setRoutes",
        "startCountdown",
        "startWhenReady",
        "cancelLoading",
        "gameStarted",
        "queueStatus",
    ];

    /// The wire tag of this event.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::MatchFound(_) => "matchFound",
            Self::PlayerAccepted(_) => "playerAccepted",
            Self::AcceptTimeout => "acceptTimeout",
            Self::Requeue => "requeue",
            Self::MatchReady(_) => "matchReady",
            Self::SetRoutes(_) => "setRoutes",
            Self::StartCountdown => "startCountdown",
            Self::StartWhenReady(_) => "startWhenReady",
            Self::CancelLoading(_) => "cancelLoading",
            Self::GameStarted => "gameStarted",
            Self::QueueStatus(_) => "queueStatus",
        }
    }

    /// Decodes an event payload.
    ///
    /// Returns `Ok(None)` for an event type this client has no handler for.
    ///
    /// # Errors
    /// - [`ProtocolError::InvalidMessage`] if the payload has no `type` tag
    /// - [`ProtocolError::Decode`] if a known event has a malformed payload
    pub fn from_value(payload: Value) -> Result<Option<Self>, ProtocolError> {
        let tag = payload
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| ProtocolError::InvalidMessage("event has no type tag".into()))?;

        if !Self::KNOWN_TAGS.contains(&tag) {
            return Ok(None);
        }

        serde_json::from_value(payload)
            .map(Some)
            .map_err(ProtocolError::Decode)
    }
}

// ---------------------------------------------------------------------------
// InboundMessage
// ---------------------------------------------------------------------------

/// A message as delivered by the transport: the route it was published to
/// and its still-undecoded body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboundMessage {
    pub route: String,
    pub payload: Value,
}

impl InboundMessage {
    /// Convenience constructor from a serializable event.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Encode`] if `event` cannot be serialized.
    pub fn new<T: Serialize>(route: impl Into<String>, event: &T) -> Result<Self, ProtocolError> {
        Ok(Self {
            route: route.into(),
            payload: serde_json::to_value(event).map_err(ProtocolError::Encode)?,
        })
    }
}

// ---------------------------------------------------------------------------
// ServerRequest
// ---------------------------------------------------------------------------

/// Requests the client sends to the matchmaking server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerRequest {
    /// Enter a queue.
    #[serde(rename_all = "camelCase")]
    FindMatch {
        client_id: ClientId,
        matchmaking_type: MatchmakingType,
    },
    /// Leave the queue.
    CancelMatch,
    /// Accept the proposed match.
    AcceptMatch,
}

impl ServerRequest {
    /// Short name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::FindMatch { .. } => "findMatch",
            Self::CancelMatch => "cancelMatch",
            Self::AcceptMatch => "acceptMatch",
        }
    }
}

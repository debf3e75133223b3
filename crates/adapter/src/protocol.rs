//! Protocol module - JSON message types for the control adapter
//!
//! Every message is one JSON object per line carrying `type`, `seq` (sender
//! sequence number) and `ts` (milliseconds since the Unix epoch).

use serde::{Deserialize, Serialize};

use crate::types::{CoreEvent, GameStatus, Mode};

// ============== Client -> Game Messages ==============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum HelloType {
    #[serde(rename = "hello")]
    #[default]
    Hello,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CommandType {
    #[serde(rename = "command")]
    #[default]
    Command,
}

/// Client hello message (first message on a connection)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HelloMessage {
    #[serde(rename = "type")]
    #[serde(default)]
    pub msg_type: HelloType,
    pub seq: u64,
    pub ts: u64,
    pub client: ClientInfo,
    pub protocol_version: String,
    #[serde(default)]
    pub requested: RequestedCapabilities,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientInfo {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RequestedCapabilities {
    #[serde(default)]
    pub stream_observations: bool,
}

/// Command message (controller only)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandMessage {
    #[serde(rename = "type")]
    #[serde(default)]
    pub msg_type: CommandType,
    pub seq: u64,
    pub ts: u64,
    pub action: ActionName,
    /// `startGame` only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<ModeLower>,
    /// `toggleCell` only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub col: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionName {
    StartGame,
    ToggleCell,
    TogglePause,
    Restart,
    ExitToMenu,
}

impl ActionName {
    pub const ALL: [ActionName; 5] = [
        ActionName::StartGame,
        ActionName::ToggleCell,
        ActionName::TogglePause,
        ActionName::Restart,
        ActionName::ExitToMenu,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionName::StartGame => "startGame",
            ActionName::ToggleCell => "toggleCell",
            ActionName::TogglePause => "togglePause",
            ActionName::Restart => "restart",
            ActionName::ExitToMenu => "exitToMenu",
        }
    }
}

impl<'de> Deserialize<'de> for ActionName {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = <&str>::deserialize(deserializer)?;
        Self::ALL
            .into_iter()
            .find(|a| a.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| serde::de::Error::custom("unknown action"))
    }
}

impl Serialize for ActionName {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModeLower(pub Mode);

impl<'de> Deserialize<'de> for ModeLower {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = <&str>::deserialize(deserializer)?;
        Mode::from_str(s)
            .map(ModeLower)
            .ok_or_else(|| serde::de::Error::custom("invalid mode"))
    }
}

impl Serialize for ModeLower {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.0.as_str())
    }
}

// ============== Game -> Client Messages ==============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WelcomeType {
    #[serde(rename = "welcome")]
    Welcome,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AckType {
    #[serde(rename = "ack")]
    Ack,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AckStatus {
    #[serde(rename = "ok")]
    Ok,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorType {
    #[serde(rename = "error")]
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    #[serde(rename = "handshake_required")]
    HandshakeRequired,
    #[serde(rename = "protocol_mismatch")]
    ProtocolMismatch,
    #[serde(rename = "not_controller")]
    NotController,
    #[serde(rename = "invalid_command")]
    InvalidCommand,
    #[serde(rename = "backpressure")]
    Backpressure,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssignedRole {
    #[serde(rename = "controller")]
    Controller,
    #[serde(rename = "observer")]
    Observer,
}

/// Welcome message (response to hello)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WelcomeMessage {
    #[serde(rename = "type")]
    pub msg_type: WelcomeType,
    pub seq: u64,
    pub ts: u64,
    pub protocol_version: String,
    pub client_id: u64,
    pub role: AssignedRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub controller_id: Option<u64>,
    pub game_id: String,
    pub capabilities: ServerCapabilities,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerCapabilities {
    pub actions: Vec<String>,
    pub modes: Vec<String>,
    pub grid_width: u8,
    pub grid_height: u8,
}

/// Acknowledgment, sent once the game loop has applied the command
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AckMessage {
    #[serde(rename = "type")]
    pub msg_type: AckType,
    pub seq: u64,
    pub ts: u64,
    pub status: AckStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorMessage {
    #[serde(rename = "type")]
    pub msg_type: ErrorType,
    pub seq: u64,
    pub ts: u64,
    pub code: ErrorCode,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObservationType {
    #[serde(rename = "observation")]
    Observation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusLower {
    #[serde(rename = "menu")]
    Menu,
    #[serde(rename = "active")]
    Active,
    #[serde(rename = "paused")]
    Paused,
    #[serde(rename = "over")]
    Over,
}

impl From<Option<GameStatus>> for StatusLower {
    fn from(value: Option<GameStatus>) -> Self {
        match value {
            None => Self::Menu,
            Some(GameStatus::Active) => Self::Active,
            Some(GameStatus::Paused) => Self::Paused,
            Some(GameStatus::Over) => Self::Over,
        }
    }
}

/// Full game observation (sent to streaming clients)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservationMessage {
    #[serde(rename = "type")]
    pub msg_type: ObservationType,
    pub seq: u64,
    pub ts: u64,
    pub status: StatusLower,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<ModeLower>,
    pub playable: bool,
    pub episode_id: u32,
    pub seed: u32,
    pub grid: GridSnapshot,
    pub selection: Vec<CellRef>,
    pub selection_sum: u32,
    pub rejecting: bool,
    pub target: u32,
    pub score: u32,
    pub high_score: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_remaining_ms: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_event: Option<LastEvent>,
    pub state_hash: StateHash,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridSnapshot {
    pub width: u8,
    pub height: u8,
    /// Tile values, 0 = empty.
    pub cells: [[u8; 6]; 6],
    /// Tile ids, 0 = empty.
    pub ids: [[u32; 6]; 6],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellRef {
    pub row: u8,
    pub col: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastEvent {
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tiles: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub points: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sum: Option<u32>,
}

impl From<CoreEvent> for LastEvent {
    fn from(value: CoreEvent) -> Self {
        let (tiles, points, sum) = match value {
            CoreEvent::Cleared { tiles, points } => (Some(tiles), Some(points), None),
            CoreEvent::Rejected { sum } => (None, None, Some(sum)),
            CoreEvent::RowInjected | CoreEvent::GameOver => (None, None, None),
        };
        Self {
            kind: value.as_str().to_string(),
            tiles,
            points,
            sum,
        }
    }
}

/// Deterministic state hash serialized as lowercase hex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StateHash(pub u64);

impl Serialize for StateHash {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(&format_args!("{:016x}", self.0))
    }
}

impl<'de> Deserialize<'de> for StateHash {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = <&str>::deserialize(deserializer)?;
        u64::from_str_radix(s.trim(), 16)
            .map(StateHash)
            .map_err(|_| serde::de::Error::custom("invalid hex"))
    }
}

// ============== Message Parsing ==============

/// Parsed incoming message
#[derive(Debug, Clone)]
pub enum ParsedMessage {
    Hello(HelloMessage),
    Command(CommandMessage),
    Unknown(UnknownMessage),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnknownMessage {
    pub seq: u64,
}

/// Parse one line of JSON.
///
/// An unrecognised `type` is not a parse error; it yields `Unknown` so the
/// server can answer with the sender's `seq`.
pub fn parse_message(json: &str) -> Result<ParsedMessage, serde_json::Error> {
    #[derive(Debug, Deserialize)]
    #[serde(tag = "type")]
    enum InboundMessage {
        #[serde(rename = "hello")]
        Hello(HelloMessage),
        #[serde(rename = "command")]
        Command(CommandMessage),
    }

    match serde_json::from_str::<InboundMessage>(json) {
        Ok(InboundMessage::Hello(m)) => Ok(ParsedMessage::Hello(m)),
        Ok(InboundMessage::Command(m)) => Ok(ParsedMessage::Command(m)),
        Err(e) => {
            #[derive(Debug, Deserialize)]
            struct Header<'a> {
                #[serde(rename = "type", borrow)]
                msg_type: Option<&'a str>,
                seq: Option<u64>,
            }
            let header = serde_json::from_str::<Header>(json)?;
            match header.msg_type {
                Some("hello") | Some("command") => Err(e),
                _ => Ok(ParsedMessage::Unknown(UnknownMessage {
                    seq: header.seq.unwrap_or(0),
                })),
            }
        }
    }
}

/// Best-effort `seq` for error replies to malformed lines.
pub fn extract_seq_best_effort(s: &str) -> Option<u64> {
    let start = s.find("\"seq\"")?;
    let after_key = &s[start + 5..];
    let rest = after_key[after_key.find(':')? + 1..].trim_start();
    let end = rest.bytes().take_while(|b| b.is_ascii_digit()).count();
    rest[..end].parse().ok()
}

// ============== Utility Functions ==============

pub fn create_hello(seq: u64, client_name: &str, protocol_version: &str, stream: bool) -> HelloMessage {
    HelloMessage {
        msg_type: HelloType::Hello,
        seq,
        ts: current_timestamp_ms(),
        client: ClientInfo {
            name: client_name.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
        protocol_version: protocol_version.to_string(),
        requested: RequestedCapabilities {
            stream_observations: stream,
        },
    }
}

pub fn create_welcome(
    seq: u64,
    protocol_version: &str,
    client_id: u64,
    role: AssignedRole,
    controller_id: Option<u64>,
) -> WelcomeMessage {
    WelcomeMessage {
        msg_type: WelcomeType::Welcome,
        seq,
        ts: current_timestamp_ms(),
        protocol_version: protocol_version.to_string(),
        client_id,
        role,
        controller_id,
        game_id: "sumtiles".to_string(),
        capabilities: ServerCapabilities {
            actions: ActionName::ALL.iter().map(|a| a.as_str().to_string()).collect(),
            modes: [Mode::Classic, Mode::Timed]
                .iter()
                .map(|m| m.as_str().to_string())
                .collect(),
            grid_width: crate::types::GRID_WIDTH,
            grid_height: crate::types::GRID_HEIGHT,
        },
    }
}

pub fn create_ack(seq: u64) -> AckMessage {
    AckMessage {
        msg_type: AckType::Ack,
        seq,
        ts: current_timestamp_ms(),
        status: AckStatus::Ok,
    }
}

pub fn create_error(seq: u64, code: ErrorCode, message: &str) -> ErrorMessage {
    ErrorMessage {
        msg_type: ErrorType::Error,
        seq,
        ts: current_timestamp_ms(),
        code,
        message: message.to_string(),
    }
}

/// Current timestamp in milliseconds
pub fn current_timestamp_ms() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hello() {
        let json = r#"{"type":"hello","seq":1,"ts":1234567890,"client":{"name":"test-ai","version":"1.0.0"},"protocol_version":"1.0.0","requested":{"stream_observations":true}}"#;

        match parse_message(json).unwrap() {
            ParsedMessage::Hello(msg) => {
                assert_eq!(msg.seq, 1);
                assert_eq!(msg.client.name, "test-ai");
                assert_eq!(msg.protocol_version, "1.0.0");
                assert!(msg.requested.stream_observations);
            }
            _ => panic!("Expected Hello message"),
        }
    }

    #[test]
    fn test_parse_toggle_cell() {
        let json = r#"{"type":"command","seq":2,"ts":0,"action":"toggleCell","row":5,"col":3}"#;

        match parse_message(json).unwrap() {
            ParsedMessage::Command(msg) => {
                assert_eq!(msg.action, ActionName::ToggleCell);
                assert_eq!(msg.row, Some(5));
                assert_eq!(msg.col, Some(3));
                assert_eq!(msg.mode, None);
            }
            _ => panic!("Expected Command message"),
        }
    }

    #[test]
    fn test_parse_start_game_is_case_insensitive() {
        let json = r#"{"type":"command","seq":3,"ts":0,"action":"STARTGAME","mode":"Timed"}"#;

        match parse_message(json).unwrap() {
            ParsedMessage::Command(msg) => {
                assert_eq!(msg.action, ActionName::StartGame);
                assert_eq!(msg.mode, Some(ModeLower(Mode::Timed)));
            }
            _ => panic!("Expected Command message"),
        }
    }

    #[test]
    fn test_unknown_type_keeps_seq() {
        let parsed = parse_message(r#"{"type":"control","seq":9}"#).unwrap();
        match parsed {
            ParsedMessage::Unknown(u) => assert_eq!(u.seq, 9),
            _ => panic!("Expected Unknown message"),
        }
    }

    #[test]
    fn test_bad_action_is_an_error() {
        assert!(parse_message(r#"{"type":"command","seq":4,"ts":0,"action":"hardDrop"}"#).is_err());
        assert_eq!(extract_seq_best_effort(r#"{"seq": 42, "type":"command""#), Some(42));
    }

    #[test]
    fn test_create_welcome() {
        let welcome = create_welcome(1, "1.0.0", 7, AssignedRole::Controller, Some(7));
        assert_eq!(welcome.client_id, 7);
        assert_eq!(welcome.role, AssignedRole::Controller);
        assert_eq!(welcome.game_id, "sumtiles");
        assert_eq!(welcome.capabilities.actions.len(), 5);
    }

    #[test]
    fn test_error_code_wire_names() {
        let err = create_error(5, ErrorCode::NotController, "Only controller may send commands");
        let json = serde_json::to_string(&err).unwrap();
        assert!(json.contains(r#""code":"not_controller""#));
        assert!(json.contains(r#""type":"error""#));
    }

    #[test]
    fn test_state_hash_hex() {
        let json = serde_json::to_string(&StateHash(0xab)).unwrap();
        assert_eq!(json, r#""00000000000000ab""#);
        let back: StateHash = serde_json::from_str(&json).unwrap();
        assert_eq!(back, StateHash(0xab));
    }

    #[test]
    fn test_last_event_mapping() {
        let ev = LastEvent::from(CoreEvent::Cleared { tiles: 3, points: 30 });
        assert_eq!(ev.kind, "cleared");
        assert_eq!(ev.points, Some(30));
        assert_eq!(ev.sum, None);
    }
}

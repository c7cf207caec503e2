use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::error::{JoinRejected, ProtocolError};

#[derive(Serialize, Deserialize, Debug, Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Facing {
    Up,
    #[default]
    Down,
    Left,
    Right,
}

impl Facing {
    pub fn as_str(&self) -> &'static str {
        match self {
            Facing::Up => "up",
            Facing::Down => "down",
            Facing::Left => "left",
            Facing::Right => "right",
        }
    }
}

// Server -> Client: full player record
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct PlayerState {
    // Maps are keyed by id, so the record itself may omit it
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub username: String,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub facing: Facing,
    #[serde(default)]
    pub animation_frame: u32,
    #[serde(default)]
    pub avatar_name: String,
}

// Server -> Client: sparse player update inside players_moved
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct PlayerPatch {
    pub username: Option<String>,
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub facing: Option<Facing>,
    pub animation_frame: Option<u32>,
    pub avatar_name: Option<String>,
}

impl PlayerPatch {
    /// Overwrite only the fields carried by the patch.
    pub fn apply_to(&self, player: &mut PlayerState) {
        if let Some(username) = &self.username {
            player.username = username.clone();
        }
        if let Some(x) = self.x {
            player.x = x;
        }
        if let Some(y) = self.y {
            player.y = y;
        }
        if let Some(facing) = self.facing {
            player.facing = facing;
        }
        if let Some(frame) = self.animation_frame {
            player.animation_frame = frame;
        }
        if let Some(avatar) = &self.avatar_name {
            player.avatar_name = avatar.clone();
        }
    }
}

// Server -> Client: named sprite set, one encoded image source per frame
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct Avatar {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub frames: BTreeMap<Facing, Vec<String>>,
}

// Server -> Client: join_game acknowledgment
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct JoinAck {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub player_id: Option<String>,
    #[serde(default)]
    pub players: HashMap<String, PlayerState>,
    #[serde(default)]
    pub avatars: HashMap<String, Avatar>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct JoinAccepted {
    pub player_id: String,
    pub players: HashMap<String, PlayerState>,
    pub avatars: HashMap<String, Avatar>,
}

impl JoinAck {
    pub fn outcome(self) -> Result<Result<JoinAccepted, JoinRejected>, ProtocolError> {
        if !self.success {
            let reason = self.error.unwrap_or_else(|| "unknown error".to_string());
            return Ok(Err(JoinRejected(reason)));
        }
        let player_id = self
            .player_id
            .ok_or(ProtocolError::IncompleteJoinAck("playerId"))?;
        Ok(Ok(JoinAccepted {
            player_id,
            players: self.players,
            avatars: self.avatars,
        }))
    }
}

// Server -> Client envelope, discriminated by `action`
#[derive(Deserialize, Debug, Clone)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ServerMessage {
    JoinGame(JoinAck),
    PlayersMoved {
        players: HashMap<String, PlayerPatch>,
    },
    PlayerJoined {
        player: PlayerState,
        avatar: Avatar,
    },
    PlayerLeft {
        #[serde(rename = "playerId")]
        player_id: String,
    },
}

impl ServerMessage {
    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        let value: serde_json::Value = serde_json::from_str(text)?;
        let action = value
            .get("action")
            .and_then(|a| a.as_str())
            .unwrap_or("<untagged>")
            .to_string();
        serde_json::from_value(value).map_err(|source| ProtocolError::Malformed { action, source })
    }

    pub fn action(&self) -> &'static str {
        match self {
            ServerMessage::JoinGame(_) => "join_game",
            ServerMessage::PlayersMoved { .. } => "players_moved",
            ServerMessage::PlayerJoined { .. } => "player_joined",
            ServerMessage::PlayerLeft { .. } => "player_left",
        }
    }
}

// Client -> Server commands
#[derive(Debug, Clone, PartialEq)]
pub enum ClientCommand {
    JoinGame { username: String },
    Move(Facing),
    MoveTo { x: i64, y: i64 },
    Stop,
}

impl ClientCommand {
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            ClientCommand::JoinGame { username } => {
                serde_json::json!({"action": "join_game", "username": username})
            }
            ClientCommand::Move(direction) => {
                serde_json::json!({"action": "move", "direction": direction.as_str()})
            }
            ClientCommand::MoveTo { x, y } => serde_json::json!({"action": "move", "x": x, "y": y}),
            ClientCommand::Stop => serde_json::json!({"action": "stop"}),
        }
    }

    pub fn encode(&self) -> String {
        self.to_json().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_join_ack_success() {
        let text = r#"{
            "action": "join_game",
            "success": true,
            "playerId": "p1",
            "players": {"p1": {"id": "p1", "username": "ann", "x": 100, "y": 120,
                               "facing": "left", "animationFrame": 2, "avatarName": "knight"}},
            "avatars": {"knight": {"name": "knight", "frames": {"up": ["a"], "right": ["b", "c"]}}}
        }"#;
        let msg = ServerMessage::decode(text).unwrap();
        let ServerMessage::JoinGame(ack) = msg else { panic!("expected join ack") };
        let accepted = ack.outcome().unwrap().unwrap();
        assert_eq!(accepted.player_id, "p1");
        let p1 = &accepted.players["p1"];
        assert_eq!(p1.facing, Facing::Left);
        assert_eq!(p1.animation_frame, 2);
        assert_eq!(p1.avatar_name, "knight");
        assert_eq!(accepted.avatars["knight"].frames[&Facing::Right].len(), 2);
    }

    #[test]
    fn join_ack_failure_is_a_rejection() {
        let msg = ServerMessage::decode(r#"{"action":"join_game","success":false,"error":"name taken"}"#).unwrap();
        let ServerMessage::JoinGame(ack) = msg else { panic!("expected join ack") };
        let rejected = ack.outcome().unwrap().unwrap_err();
        assert_eq!(rejected.0, "name taken");
    }

    #[test]
    fn join_ack_success_without_id_is_a_protocol_error() {
        let msg = ServerMessage::decode(r#"{"action":"join_game","success":true}"#).unwrap();
        let ServerMessage::JoinGame(ack) = msg else { panic!("expected join ack") };
        assert!(matches!(ack.outcome(), Err(ProtocolError::IncompleteJoinAck("playerId"))));
    }

    #[test]
    fn players_moved_keeps_fields_sparse() {
        let msg = ServerMessage::decode(r#"{"action":"players_moved","players":{"p1":{"x":5}}}"#).unwrap();
        let ServerMessage::PlayersMoved { players } = msg else { panic!("expected players_moved") };
        let patch = &players["p1"];
        assert_eq!(patch.x, Some(5.0));
        assert_eq!(patch.y, None);
        assert_eq!(patch.facing, None);
    }

    #[test]
    fn player_left_reads_camel_case_id() {
        let msg = ServerMessage::decode(r#"{"action":"player_left","playerId":"p9"}"#).unwrap();
        assert!(matches!(msg, ServerMessage::PlayerLeft { ref player_id } if player_id == "p9"));
    }

    #[test]
    fn unknown_action_and_garbage_fail_to_decode() {
        assert!(ServerMessage::decode(r#"{"action":"explode"}"#).is_err());
        assert!(ServerMessage::decode("not json").is_err());
    }

    #[test]
    fn bad_field_inside_join_ack_names_the_action() {
        let text = r#"{"action":"join_game","success":true,"playerId":"p1","players":{},
                       "avatars":{"knight":{"name":"knight","frames":{"sideways":["a"]}}}}"#;
        let err = ServerMessage::decode(text).unwrap_err();
        assert!(matches!(err, ProtocolError::Malformed { ref action, .. } if action == "join_game"));
        assert!(err.to_string().starts_with("malformed join_game message"));

        let err = ServerMessage::decode(r#"{"action":"player_joined","player":{"id":"p2"},"avatar":{}}"#).unwrap_err();
        assert!(err.to_string().contains("player_joined"));
        assert!(matches!(ServerMessage::decode("[1,"), Err(ProtocolError::Decode(_))));
    }

    #[test]
    fn facing_defaults_to_down() {
        assert_eq!(Facing::default(), Facing::Down);
        let p: PlayerState = serde_json::from_str(r#"{"x":1,"y":2}"#).unwrap();
        assert_eq!(p.facing, Facing::Down);
    }

    #[test]
    fn commands_encode_with_action_tag() {
        let join: serde_json::Value = serde_json::from_str(&ClientCommand::JoinGame { username: "ann".into() }.encode()).unwrap();
        assert_eq!(join, serde_json::json!({"action": "join_game", "username": "ann"}));
        assert_eq!(
            ClientCommand::Move(Facing::Up).to_json(),
            serde_json::json!({"action": "move", "direction": "up"})
        );
        assert_eq!(
            ClientCommand::MoveTo { x: 10, y: -3 }.to_json(),
            serde_json::json!({"action": "move", "x": 10, "y": -3})
        );
        assert_eq!(ClientCommand::Stop.to_json(), serde_json::json!({"action": "stop"}));
    }
}

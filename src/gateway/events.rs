use serde::Deserialize;
use serde_json::json;

/// Opcodes of the gateway wire contract (fixed, versioned).
pub mod opcode {
    pub const HEARTBEAT: u8 = 1;
    pub const IDENTIFY: u8 = 2;
    pub const VOICE_STATE_UPDATE: u8 = 4;
    pub const HELLO: u8 = 10;
}

/// Inbound gateway message envelope. Any message may carry a top-level
/// sequence field regardless of opcode.
#[derive(Debug, Deserialize)]
pub struct GatewayMessage {
    pub op: u8,
    #[serde(rename = "s")]
    pub seq: Option<u64>,
    #[serde(rename = "t")]
    pub event_type: Option<String>,
    #[serde(rename = "d")]
    pub data: Option<serde_json::Value>,
}

/// HELLO payload, carries the server-nominated heartbeat interval in ms.
#[derive(Debug, Deserialize)]
pub struct HelloData {
    pub heartbeat_interval: u64,
}

pub fn identify(credential: &str) -> serde_json::Value {
    json!({
        "op": opcode::IDENTIFY,
        "d": {
            "token": credential,
            "properties": {
                "os": "Linux",
                "browser": "Firefox",
                "device": "desktop"
            }
        }
    })
}

/// Heartbeat echoing the last observed sequence, or null before the first
/// sequenced message of the connection.
pub fn heartbeat(sequence: Option<u64>) -> serde_json::Value {
    json!({
        "op": opcode::HEARTBEAT,
        "d": sequence
    })
}

pub fn voice_state_update(
    guild_id: &str,
    channel_id: &str,
    self_mute: bool,
    self_deaf: bool,
) -> serde_json::Value {
    json!({
        "op": opcode::VOICE_STATE_UPDATE,
        "d": {
            "guild_id": guild_id,
            "channel_id": channel_id,
            "self_mute": self_mute,
            "self_deaf": self_deaf
        }
    })
}

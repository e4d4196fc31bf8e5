use std::path::PathBuf;
use std::time::Duration;

/// Static process configuration. Built once at startup from `VOXPOOL_*`
/// environment variables and shared read-only by every session.
#[derive(Debug, Clone)]
pub struct Config {
    pub gateway_url: String,
    pub identity_url: String,
    pub gate_url: String,
    pub credentials_path: PathBuf,
    pub guild_id: String,
    pub channel_id: String,
    pub self_mute: bool,
    pub self_deaf: bool,
    pub stagger_ms: u64,
    pub reconnect_base_ms: u64,
    pub reconnect_jitter_ms: u64,
    pub join_delay_ms: u64,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            gateway_url: env_or("VOXPOOL_GATEWAY_URL", "wss://gateway.example.com"),
            identity_url: env_or("VOXPOOL_IDENTITY_URL", "https://api.example.com/v9/users/@me"),
            gate_url: env_or("VOXPOOL_GATE_URL", "https://license.example.com/keys.json"),
            credentials_path: std::env::var("VOXPOOL_CREDENTIALS")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./tokens.txt")),
            guild_id: std::env::var("VOXPOOL_GUILD_ID").expect("VOXPOOL_GUILD_ID is required"),
            channel_id: std::env::var("VOXPOOL_CHANNEL_ID")
                .expect("VOXPOOL_CHANNEL_ID is required"),
            self_mute: env_flag("VOXPOOL_SELF_MUTE"),
            self_deaf: env_flag("VOXPOOL_SELF_DEAF"),
            stagger_ms: env_millis("VOXPOOL_STAGGER_MS", 2000),
            reconnect_base_ms: env_millis("VOXPOOL_RECONNECT_BASE_MS", 5000),
            reconnect_jitter_ms: env_millis("VOXPOOL_RECONNECT_JITTER_MS", 5000),
            join_delay_ms: env_millis("VOXPOOL_JOIN_DELAY_MS", 2000),
        }
    }

    pub fn stagger(&self) -> Duration {
        Duration::from_millis(self.stagger_ms)
    }

    pub fn reconnect_base(&self) -> Duration {
        Duration::from_millis(self.reconnect_base_ms)
    }

    pub fn reconnect_jitter(&self) -> Duration {
        Duration::from_millis(self.reconnect_jitter_ms)
    }

    pub fn join_delay(&self) -> Duration {
        Duration::from_millis(self.join_delay_ms)
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_flag(key: &str) -> bool {
    std::env::var(key)
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

fn env_millis(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

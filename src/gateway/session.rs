use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use rand::Rng;
use tokio::time::{Instant, Interval};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::{self, Message};

use super::events::{self, opcode, GatewayMessage, HelloData};
use crate::config::Config;

/// Heartbeats go out at 0.9x the server-nominated interval. Sending strictly
/// more often than nominal keeps wire jitter from tripping the server-side
/// liveness timeout.
pub const HEARTBEAT_SAFETY_FACTOR: f64 = 0.9;

pub fn heartbeat_period(interval_ms: u64) -> Duration {
    Duration::from_millis((interval_ms as f64 * HEARTBEAT_SAFETY_FACTOR) as u64)
}

/// Reconnect delay in `[base, base + jitter)`. The random component keeps a
/// shared network blip from turning into a synchronized reconnect storm
/// across the pool.
pub fn reconnect_delay(base: Duration, jitter: Duration) -> Duration {
    let span = jitter.as_millis() as u64;
    if span == 0 {
        return base;
    }
    base + Duration::from_millis(rand::thread_rng().gen_range(0..span))
}

/// What woke the session loop up.
enum Wake {
    HeartbeatDue,
    JoinDue,
    Inbound(Option<Result<Message, tungstenite::Error>>),
}

/// One credential's connection lifecycle: handshake, heartbeat loop, voice
/// join, and reconnect-on-close. The session itself lives for the whole
/// process; only the transport inside it is torn down and rebuilt.
pub struct Session {
    credential: String,
    label: String,
    config: Arc<Config>,
    sequence: Option<u64>,
}

impl Session {
    pub fn new(credential: String, config: Arc<Config>) -> Self {
        let label: String = credential.chars().take(8).collect();
        Self {
            credential,
            label,
            config,
            sequence: None,
        }
    }

    /// Connect / handshake / heartbeat until the transport dies, then retry
    /// after a randomized backoff, forever. Clean closes and transport errors
    /// get the same retry treatment.
    pub async fn run(mut self) {
        loop {
            match self.connect_once().await {
                Ok(()) => tracing::info!("[{}] gateway connection closed", self.label),
                Err(e) => tracing::warn!("[{}] gateway connection failed: {e}", self.label),
            }

            let delay = reconnect_delay(
                self.config.reconnect_base(),
                self.config.reconnect_jitter(),
            );
            tracing::info!("[{}] reconnecting in {:?}", self.label, delay);
            tokio::time::sleep(delay).await;
        }
    }

    /// Runs a single connection to completion. Both timers are locals of this
    /// scope, so leaving it on close or error tears them down and a reconnect
    /// can never see a stale tick firing against a dead transport.
    async fn connect_once(&mut self) -> Result<(), tungstenite::Error> {
        // Fresh connection, fresh handshake, fresh sequence stream.
        self.sequence = None;

        let url = format!(
            "{}/?v=10&encoding=json",
            self.config.gateway_url.trim_end_matches('/')
        );
        let (ws, _) = connect_async(url.as_str()).await?;
        let (mut sink, mut stream) = ws.split();

        sink.send(Message::Text(
            events::identify(&self.credential).to_string().into(),
        ))
        .await?;
        tracing::debug!("[{}] identify sent", self.label);

        let mut heartbeat: Option<Interval> = None;
        let mut join_at: Option<Instant> = None;
        let mut joined = false;

        loop {
            let wake = tokio::select! {
                _ = async {
                    match heartbeat.as_mut() {
                        Some(interval) => { interval.tick().await; }
                        None => std::future::pending::<()>().await,
                    }
                } => Wake::HeartbeatDue,
                _ = async {
                    match join_at {
                        Some(at) => tokio::time::sleep_until(at).await,
                        None => std::future::pending::<()>().await,
                    }
                } => Wake::JoinDue,
                msg = stream.next() => Wake::Inbound(msg),
            };

            match wake {
                Wake::HeartbeatDue => {
                    sink.send(Message::Text(
                        events::heartbeat(self.sequence).to_string().into(),
                    ))
                    .await?;
                }
                Wake::JoinDue => {
                    // Only armed between HELLO and the join itself; a close in
                    // that window drops the deadline with the connection.
                    join_at = None;
                    joined = true;
                    sink.send(Message::Text(
                        events::voice_state_update(
                            &self.config.guild_id,
                            &self.config.channel_id,
                            self.config.self_mute,
                            self.config.self_deaf,
                        )
                        .to_string()
                        .into(),
                    ))
                    .await?;
                    tracing::info!(
                        "[{}] joined channel {} in {}",
                        self.label,
                        self.config.channel_id,
                        self.config.guild_id
                    );
                }
                Wake::Inbound(Some(Ok(Message::Text(text)))) => {
                    if let Some(interval_ms) = self.handle_frame(&text) {
                        let period = heartbeat_period(interval_ms);
                        if period.is_zero() {
                            // interval_at panics on a zero period; a server
                            // nominating 0 or 1 ms gets no heartbeat timer
                            // instead of a dead session.
                            tracing::warn!(
                                "[{}] ignoring hello with degenerate heartbeat interval {interval_ms}ms",
                                self.label
                            );
                        } else {
                            // First tick one full period from now; replacing
                            // the interval on a repeated HELLO drops the old
                            // timer, keeping at most one alive.
                            heartbeat =
                                Some(tokio::time::interval_at(Instant::now() + period, period));
                            if !joined {
                                join_at = Some(Instant::now() + self.config.join_delay());
                            }
                        }
                    }
                }
                Wake::Inbound(Some(Ok(Message::Close(_)))) | Wake::Inbound(None) => return Ok(()),
                Wake::Inbound(Some(Err(e))) => return Err(e),
                Wake::Inbound(Some(Ok(_))) => {}
            }
        }
    }

    /// Sequence bookkeeping plus opcode dispatch for one inbound frame.
    /// Every sequenced message replaces the stored value, not just
    /// heartbeat-related ones, since the stored value is echoed in the next
    /// heartbeat. Returns the heartbeat interval when the frame is HELLO.
    /// Frames that do not parse are dropped without touching session state.
    fn handle_frame(&mut self, text: &str) -> Option<u64> {
        let msg: GatewayMessage = match serde_json::from_str(text) {
            Ok(msg) => msg,
            Err(e) => {
                tracing::debug!("[{}] ignoring unparseable frame: {e}", self.label);
                return None;
            }
        };

        if let Some(seq) = msg.seq {
            self.sequence = Some(seq);
        }

        if msg.op == opcode::HELLO {
            if let Some(data) = msg.data {
                if let Ok(hello) = serde_json::from_value::<HelloData>(data) {
                    return Some(hello.heartbeat_interval);
                }
            }
        }

        None
    }
}

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use super::session::Session;
use crate::config::Config;

/// Start offset for the i-th session: a linear stagger so the gateway never
/// sees the whole pool connect in one burst.
pub fn stagger_offset(index: usize, interval: Duration) -> Duration {
    interval * index as u32
}

/// Spawns one independent session task per validated credential. Sessions
/// share nothing but the read-only config; there is no supervision here,
/// each session self-heals through its own reconnect loop. An empty
/// credential set spawns nothing.
pub fn start(config: Arc<Config>, credentials: Vec<String>) -> Vec<JoinHandle<()>> {
    let stagger = config.stagger();

    credentials
        .into_iter()
        .enumerate()
        .map(|(index, credential)| {
            let session = Session::new(credential, Arc::clone(&config));
            let offset = stagger_offset(index, stagger);
            tokio::spawn(async move {
                if !offset.is_zero() {
                    tokio::time::sleep(offset).await;
                }
                session.run().await;
            })
        })
        .collect()
}

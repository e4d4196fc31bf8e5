use futures_util::future::join_all;
use reqwest::Client;

/// Checks every candidate credential against the identity endpoint and keeps
/// the ones it accepts, in their original order. Checks are independent and
/// run concurrently; a failing check drops that credential only and never
/// aborts the batch. There is no retry, a credential that fails once this run
/// is out.
pub async fn validate(client: &Client, identity_url: &str, credentials: Vec<String>) -> Vec<String> {
    let checks = credentials
        .iter()
        .enumerate()
        .map(|(index, credential)| check_one(client, identity_url, credential, index));
    let results = join_all(checks).await;

    credentials
        .into_iter()
        .zip(results)
        .filter_map(|(credential, usable)| usable.then_some(credential))
        .collect()
}

async fn check_one(client: &Client, identity_url: &str, credential: &str, index: usize) -> bool {
    match client
        .get(identity_url)
        .header("Authorization", credential)
        .send()
        .await
    {
        Ok(resp) if resp.status().is_success() => {
            tracing::info!("credential {} is valid", index + 1);
            true
        }
        Ok(resp) => {
            tracing::warn!("credential {} rejected: {}", index + 1, resp.status());
            false
        }
        Err(e) => {
            tracing::warn!("credential {} check failed: {e}", index + 1);
            false
        }
    }
}

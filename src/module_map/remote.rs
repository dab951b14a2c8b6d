use std::time::Duration;

use super::ModuleMap;
use crate::logger::Logger;

/// Upper bound for the one-time remote module map fetch.
pub const REMOTE_MAP_TIMEOUT: Duration = Duration::from_secs(5);

/// Fetch the deployed module map.
///
/// Never fails: a missing url, a non-success status, a timeout or an
/// unparsable body all degrade to an empty map after logging.
pub async fn load_remote_module_map(
    client: &reqwest::Client,
    url: Option<&str>,
    logger: &Logger,
) -> ModuleMap {
    load_with_timeout(client, url, REMOTE_MAP_TIMEOUT, logger).await
}

async fn load_with_timeout(
    client: &reqwest::Client,
    url: Option<&str>,
    timeout: Duration,
    logger: &Logger,
) -> ModuleMap {
    let Some(url) = url else {
        return ModuleMap::default();
    };

    match fetch(client, url, timeout).await {
        Ok(map) => {
            crate::debug!(logger, "map"; "loaded remote module map from {}", url);
            map
        }
        Err(e) => {
            crate::error!(logger, "map"; "fetching the remote module map has failed: {}", e);
            ModuleMap::default()
        }
    }
}

async fn fetch(client: &reqwest::Client, url: &str, timeout: Duration) -> reqwest::Result<ModuleMap> {
    client
        .get(url)
        .timeout(timeout)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await
}

/// Outbound client shared by the module map fetch and the proxy relay.
///
/// Per-request timeouts are set by the callers.
pub fn http_client(proxy: Option<&str>) -> anyhow::Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder();
    if let Some(proxy) = proxy {
        let proxy = reqwest::Proxy::all(proxy)
            .map_err(|e| anyhow::anyhow!("invalid proxy `{}`: {}", proxy, e))?;
        builder = builder.proxy(proxy);
    }
    builder
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to create HTTP client: {}", e))
}

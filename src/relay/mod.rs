//! On-demand relay of remote module assets.
//!
//! Remote-only modules are advertised to the browser under local URLs
//! (`/static/modules/<name>/...`). The first request for such a file is
//! fetched from the module's real remote base and written into the build
//! output store; every later request is served from the store.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::core::Paths;
use crate::logger::Logger;
use crate::module_map::ModuleMaps;
use crate::store::{BuildOutputStore, StoreError};

pub const RELAY_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("failed to fetch `{0}`")]
    Fetch(String, #[source] reqwest::Error),

    #[error("`{url}` responded with {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// `(local base url, remote base url)` for one remote-only module.
#[derive(Debug, Clone, PartialEq, Eq)]
struct RelayRoute {
    local_base: String,
    remote_base: String,
}

pub struct ProxyRelay {
    routes: Vec<RelayRoute>,
    client: reqwest::Client,
    store: Arc<dyn BuildOutputStore>,
    paths: Paths,
    timeout: Duration,
    logger: Logger,
}

impl ProxyRelay {
    pub fn new(
        maps: &ModuleMaps,
        client: reqwest::Client,
        store: Arc<dyn BuildOutputStore>,
        paths: Paths,
        logger: Logger,
    ) -> Self {
        let routes = maps
            .remote
            .modules
            .iter()
            .filter(|(name, _)| !maps.local.contains(name))
            .filter_map(|(name, remote)| {
                let local_base = maps.unified.get(name)?.base_url.clone()?;
                let remote_base = match &remote.base_url {
                    Some(base) => base.clone(),
                    None => remote.browser.url.replace(&format!("{name}.browser.js"), ""),
                };
                Some(RelayRoute {
                    local_base,
                    remote_base,
                })
            })
            .collect();

        Self {
            routes,
            client,
            store,
            paths,
            timeout: RELAY_TIMEOUT,
            logger,
        }
    }

    /// Override the per-fetch timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Remote URL for a request path, when it belongs to a remote-only module.
    pub fn remote_url(&self, request_path: &str) -> Option<String> {
        self.routes.iter().find_map(|route| {
            request_path
                .strip_prefix(&route.local_base)
                .map(|rest| format!("{}{}", route.remote_base, rest))
        })
    }

    /// Fetch `request_path` into the store if it is relayable and not there yet.
    ///
    /// Returns whether a fetch happened.
    pub async fn relay(&self, request_path: &str) -> Result<bool, RelayError> {
        let Some(url) = self.remote_url(request_path) else {
            return Ok(false);
        };
        let local = self.paths.context_path(request_path);
        if self.store.exists(&local) {
            return Ok(false);
        }

        crate::debug!(self.logger, "relay"; "{} -> {}", request_path, url);
        let response = self
            .client
            .get(&url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| RelayError::Fetch(url.clone(), e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RelayError::Status { url, status });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| RelayError::Fetch(url.clone(), e))?;
        self.store.write(&local, body.to_vec())?;
        Ok(true)
    }
}

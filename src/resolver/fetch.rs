// Mirror page fetching
// One GET per mirror per resolution, no retries. Every transport-level
// failure collapses to "no page" so a dead mirror never aborts its
// siblings.

use reqwest::Client;
use std::time::Duration;

const USER_AGENT: &str = concat!("filmrelay/", env!("CARGO_PKG_VERSION"));

pub struct MirrorFetcher {
    client: Client,
}

impl MirrorFetcher {
    pub fn new(timeout: Duration) -> Self {
        // Client builder should not fail with these standard options
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self { client }
    }

    /// Fetch one listing page. Returns `None` on connection errors,
    /// timeouts, non-2xx responses and empty bodies.
    pub async fn fetch(&self, url: &str) -> Option<String> {
        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::debug!(url = %url, error = %e, "mirror fetch failed");
                return None;
            }
        };

        if !response.status().is_success() {
            tracing::debug!(url = %url, status = %response.status(), "mirror returned non-success");
            return None;
        }

        match response.text().await {
            Ok(body) if !body.is_empty() => Some(body),
            Ok(_) => {
                tracing::debug!(url = %url, "mirror returned empty body");
                None
            }
            Err(e) => {
                tracing::debug!(url = %url, error = %e, "failed to read mirror body");
                None
            }
        }
    }
}

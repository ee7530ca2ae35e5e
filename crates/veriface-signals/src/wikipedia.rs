//! Wikipedia name lookup via the MediaWiki opensearch API.

use crate::NameLookup;
use async_trait::async_trait;
use std::time::Duration;

const OPENSEARCH_ENDPOINT: &str = "https://en.wikipedia.org/w/api.php";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Resolves a name to the URL of its top Wikipedia search result.
pub struct WikipediaLookup {
    client: reqwest::Client,
}

impl WikipediaLookup {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for WikipediaLookup {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NameLookup for WikipediaLookup {
    async fn url_for(&self, name: &str) -> Option<String> {
        let response = self
            .client
            .get(OPENSEARCH_ENDPOINT)
            .timeout(REQUEST_TIMEOUT)
            .query(&[
                ("action", "opensearch"),
                ("search", name),
                ("limit", "1"),
                ("format", "json"),
            ])
            .send()
            .await;

        let response = match response {
            Ok(r) => r,
            Err(err) => {
                tracing::debug!(name, error = %err, "wikipedia lookup failed");
                return None;
            }
        };

        let body: serde_json::Value = match response.json().await {
            Ok(v) => v,
            Err(err) => {
                tracing::debug!(name, error = %err, "wikipedia response was not JSON");
                return None;
            }
        };

        // Opensearch replies [query, [titles], [descriptions], [urls]].
        let url = body.get(3)?.get(0)?.as_str()?;
        Some(url.to_string())
    }
}

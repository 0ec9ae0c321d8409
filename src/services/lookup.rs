// Identifier-keyed title lookup
// Resolves a title identifier to the canonical { title, year } pair the
// mirror URL strategies are derived from. Responses missing a title or a
// 4-digit year are rejected here so nothing undefined flows downstream.

use anyhow::{Context, Result};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Canonical identifying attributes of a title, resolved once per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalTitleInfo {
    pub title: String,
    pub year: i32,
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(rename = "Title")]
    title: Option<String>,
    #[serde(rename = "Year")]
    year: Option<String>,
}

/// Client for the identifier-keyed lookup base of the catalog service.
pub struct TitleLookupClient {
    client: Client,
    base_url: String,
    auth_query: Option<String>,
}

impl TitleLookupClient {
    pub fn new(base_url: String, auth_query: Option<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url,
            auth_query,
        }
    }

    /// Look up the canonical title info for an identifier.
    pub async fn canonical_info(&self, identifier: &str) -> Result<CanonicalTitleInfo> {
        let mut url = format!("{}/{}", self.base_url.trim_end_matches('/'), identifier);
        if let Some(auth) = &self.auth_query {
            url.push('?');
            url.push_str(auth);
        }

        let response: LookupResponse = self
            .client
            .get(&url)
            .send()
            .await
            .context("Failed to reach title lookup service")?
            .error_for_status()
            .context("Title lookup returned an error status")?
            .json()
            .await
            .context("Failed to parse title lookup response")?;

        let title = response
            .title
            .filter(|t| !t.trim().is_empty())
            .context("Lookup response is missing a title")?;
        let year = response
            .year
            .as_deref()
            .and_then(parse_year)
            .context("Lookup response is missing a 4-digit year")?;

        Ok(CanonicalTitleInfo { title, year })
    }
}

/// Series years come back as ranges like "2021–2023"; the leading four
/// digits are the release year.
fn parse_year(raw: &str) -> Option<i32> {
    let digits: String = raw
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    if digits.len() == 4 {
        digits.parse().ok()
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_year_plain() {
        assert_eq!(parse_year("2021"), Some(2021));
        assert_eq!(parse_year(" 1999 "), Some(1999));
    }

    #[test]
    fn test_parse_year_range() {
        assert_eq!(parse_year("2021–2023"), Some(2021));
    }

    #[test]
    fn test_parse_year_invalid() {
        assert_eq!(parse_year("N/A"), None);
        assert_eq!(parse_year("21"), None);
        assert_eq!(parse_year(""), None);
    }

    #[test]
    fn test_lookup_response_shape() {
        let parsed: LookupResponse =
            serde_json::from_str(r#"{ "Title": "Example Movie", "Year": "2021" }"#).unwrap();
        assert_eq!(parsed.title.as_deref(), Some("Example Movie"));
        assert_eq!(parsed.year.as_deref(), Some("2021"));

        // Error payloads from the lookup base carry neither field.
        let error: LookupResponse =
            serde_json::from_str(r#"{ "Response": "False", "Error": "Not found" }"#).unwrap();
        assert!(error.title.is_none());
        assert!(error.year.is_none());
    }
}

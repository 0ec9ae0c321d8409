// Download-link resolution engine
// Resolves canonical title info for an identifier, fans out across the
// configured mirrors concurrently, and merges whatever each mirror
// yielded. Partial or total mirror failure degrades the result set; only
// the identifier lookup itself is terminal.

use futures::future::join_all;
use scraper::Html;
use serde::Serialize;
use std::time::Duration;

use crate::config::ResolverConfig;
use crate::services::lookup::TitleLookupClient;

pub mod fetch;
pub mod mirrors;
pub mod normalize;
pub mod parse;

use fetch::MirrorFetcher;
use mirrors::{MirrorCandidate, MirrorParser};
use normalize::LinkTag;

/// Link from a quality-list mirror: display quality plus localized
/// size/dub-sub annotations.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityLink {
    pub label: String,
    pub size_text: Option<String>,
    pub link: String,
    pub tag: LinkTag,
}

/// Link from a file-table mirror: plain filename and raw size column.
#[derive(Debug, Clone, Serialize)]
pub struct FileLink {
    pub text: String,
    pub size: String,
    pub link: String,
}

/// One resolved download link. The two mirror families expose different
/// metadata, so the shapes stay distinct and only merge at the
/// serialization boundary.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum DownloadLink {
    Quality(QualityLink),
    File(FileLink),
}

/// The envelope returned to transport callers. Always well-formed; an
/// empty `result` covers both "no links found" and "all mirrors down".
#[derive(Debug, Serialize)]
pub struct ResolutionResult {
    pub status: u16,
    pub result: Vec<DownloadLink>,
}

impl ResolutionResult {
    pub fn ok(result: Vec<DownloadLink>) -> Self {
        Self {
            status: 200,
            result,
        }
    }

    pub fn empty(status: u16) -> Self {
        Self {
            status,
            result: Vec::new(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// The canonical title/year could not be resolved. Terminal for the
    /// whole request.
    #[error("canonical title lookup failed: {0}")]
    Lookup(anyhow::Error),

    #[error("unknown mirror `{0}`")]
    UnknownMirror(String),
}

pub struct Resolver {
    lookup: TitleLookupClient,
    fetcher: MirrorFetcher,
    config: ResolverConfig,
}

impl Resolver {
    pub fn new(lookup: TitleLookupClient, config: ResolverConfig) -> Self {
        let fetcher = MirrorFetcher::new(Duration::from_secs(config.request_timeout_secs));
        Self {
            lookup,
            fetcher,
            config,
        }
    }

    /// Resolve download links for a title identifier across every
    /// configured mirror.
    ///
    /// Mirrors are fetched concurrently; `join_all` yields the per-mirror
    /// partitions in input order, so the merged output follows the
    /// configured priority order no matter which mirror answered first.
    pub async fn resolve(&self, identifier: &str) -> Result<Vec<DownloadLink>, ResolveError> {
        let info = self
            .lookup
            .canonical_info(identifier)
            .await
            .map_err(ResolveError::Lookup)?;

        let candidates = mirrors::candidates(&info, identifier, &self.config.mirrors);
        tracing::debug!(
            identifier = %identifier,
            title = %info.title,
            year = info.year,
            mirrors = candidates.len(),
            "dispatching mirror fan-out"
        );

        let partitions = join_all(
            candidates
                .iter()
                .map(|candidate| self.scrape_candidate(candidate, true)),
        )
        .await;

        Ok(partitions.into_iter().flatten().collect())
    }

    /// Single-mirror fast path: same fetch -> parse pipeline against one
    /// mirror, without the fan-out merge or the cross-mirror extension
    /// filter.
    pub async fn resolve_single(
        &self,
        identifier: &str,
        mirror_id: &str,
    ) -> Result<Vec<DownloadLink>, ResolveError> {
        let mirror = self
            .config
            .mirrors
            .iter()
            .find(|m| m.id == mirror_id)
            .ok_or_else(|| ResolveError::UnknownMirror(mirror_id.to_string()))?;

        let info = self
            .lookup
            .canonical_info(identifier)
            .await
            .map_err(ResolveError::Lookup)?;

        let candidates = mirrors::candidates(&info, identifier, std::slice::from_ref(mirror));
        let mut links = Vec::new();
        for candidate in &candidates {
            links.extend(self.scrape_candidate(candidate, false).await);
        }
        Ok(links)
    }

    /// Fetch and parse one mirror. Every failure inside this boundary
    /// (unreachable host, non-2xx, unparseable markup) contributes an
    /// empty partition instead of propagating.
    async fn scrape_candidate(
        &self,
        candidate: &MirrorCandidate,
        filter_extensions: bool,
    ) -> Vec<DownloadLink> {
        let Some(body) = self.fetcher.fetch(&candidate.listing_url).await else {
            return Vec::new();
        };

        // Html is parsed and dropped without crossing an await, keeping
        // the resolution future Send.
        let document = Html::parse_document(&body);
        let links: Vec<DownloadLink> = match candidate.parser {
            MirrorParser::QualityList => parse::quality_list(&document, &candidate.base_url)
                .into_iter()
                .map(DownloadLink::Quality)
                .collect(),
            MirrorParser::FileTable => {
                let extensions =
                    filter_extensions.then_some(self.config.video_extensions.as_slice());
                parse::file_table(
                    &document,
                    &candidate.listing_url,
                    &candidate.base_url,
                    extensions,
                )
                .into_iter()
                .map(DownloadLink::File)
                .collect()
            }
        };

        tracing::debug!(
            mirror = %candidate.mirror_id,
            links = links.len(),
            "mirror scrape complete"
        );
        links
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::mirrors::{MirrorConfig, NamingRule};
    use axum::http::StatusCode;
    use axum::response::Html as HtmlResponse;
    use axum::{routing::get, Json, Router};
    use serde_json::json;

    const QUALITY_PAGE: &str = r#"
        <ul>
          <li class="item-type">
            <span>Example Movie</span>
            <span>کیفیت : 1080p WEB-DL</span>
            <span>حجم : 1.6 گیگابایت - دوبله فارسی</span>
            <a class="dllink" href="https://dl.mirror.example/Example.Movie.1080p.mkv">download</a>
          </li>
          <li class="item-type">
            <span>Example Movie</span>
            <span>کیفیت : 720p</span>
            <span>حجم : 850 مگابایت</span>
          </li>
        </ul>
    "#;

    const TABLE_PAGE_ALPHA: &str = r#"
        <table>
          <tr><th>Name</th></tr>
          <tr><td><hr></td></tr>
          <tr>
            <td></td>
            <td><a href="Alpha.Cut.2021.1080p.mkv">Alpha.Cut.2021.1080p.mkv</a></td>
            <td>2021-09-14</td>
            <td>1.4G</td>
          </tr>
        </table>
    "#;

    const TABLE_PAGE_BETA: &str = r#"
        <table>
          <tr><th>Name</th></tr>
          <tr><td><hr></td></tr>
          <tr>
            <td></td>
            <td><a href="Beta.Cut.2021.720p.mp4">Beta.Cut.2021.720p.mp4</a></td>
            <td>2021-09-14</td>
            <td>800M</td>
          </tr>
          <tr>
            <td></td>
            <td><a href="Beta.Cut.2021.srt">Beta.Cut.2021.srt</a></td>
            <td>2021-09-14</td>
            <td>90K</td>
          </tr>
        </table>
    "#;

    async fn spawn_server(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    async fn spawn_lookup_ok() -> TitleLookupClient {
        let app = Router::new().route(
            "/:id",
            get(|| async { Json(json!({ "Title": "Example Movie", "Year": "2021" })) }),
        );
        TitleLookupClient::new(spawn_server(app).await, Some("apikey=test".to_string()))
    }

    async fn spawn_listing(page: &'static str, delay_ms: u64) -> String {
        let app = Router::new().route(
            "/*path",
            get(move || async move {
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                HtmlResponse(page)
            }),
        );
        spawn_server(app).await
    }

    fn table_mirror(id: &str, base_url: String) -> MirrorConfig {
        MirrorConfig {
            id: id.to_string(),
            base_url,
            naming: NamingRule::YearAlways,
            parser: MirrorParser::FileTable,
            year_threshold: 2023,
        }
    }

    fn config_with(mirrors: Vec<MirrorConfig>) -> ResolverConfig {
        ResolverConfig {
            request_timeout_secs: 5,
            video_extensions: vec!["mkv".to_string(), "mp4".to_string()],
            mirrors,
        }
    }

    fn link_text(link: &DownloadLink) -> String {
        match link {
            DownloadLink::Quality(q) => q.label.clone(),
            DownloadLink::File(f) => f.text.clone(),
        }
    }

    #[tokio::test]
    async fn test_lookup_failure_is_terminal() {
        let app = Router::new().route(
            "/:id",
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "upstream down") }),
        );
        let lookup = TitleLookupClient::new(spawn_server(app).await, None);
        let resolver = Resolver::new(
            lookup,
            config_with(vec![table_mirror("alpha", "http://127.0.0.1:9".to_string())]),
        );

        let err = resolver.resolve("tt0000001").await.unwrap_err();
        assert!(matches!(err, ResolveError::Lookup(_)));
    }

    #[tokio::test]
    async fn test_partial_mirror_failure_keeps_surviving_rows() {
        let lookup = spawn_lookup_ok().await;

        // Mirror 1 is unreachable; mirror 2 serves one valid quality item
        // and one item with no download anchor.
        let quality_base = spawn_listing(QUALITY_PAGE, 0).await;
        let mirrors = vec![
            table_mirror("dead", "http://127.0.0.1:9".to_string()),
            MirrorConfig {
                id: "quality".to_string(),
                base_url: quality_base,
                naming: NamingRule::DirectId,
                parser: MirrorParser::QualityList,
                year_threshold: 2023,
            },
        ];

        let resolver = Resolver::new(lookup, config_with(mirrors));
        let links = resolver.resolve("tt0000042").await.unwrap();

        assert_eq!(links.len(), 1);
        match &links[0] {
            DownloadLink::Quality(q) => {
                assert_eq!(q.label, "1080p WEB-DL");
                assert_eq!(q.size_text.as_deref(), Some("1.6GB"));
                assert_eq!(q.tag, LinkTag::Dub);
            }
            DownloadLink::File(_) => panic!("expected a quality link"),
        }
    }

    #[tokio::test]
    async fn test_merge_order_independent_of_completion_order() {
        let lookup = spawn_lookup_ok().await;

        // Alpha has priority but answers slowly; beta answers immediately.
        let alpha_base = spawn_listing(TABLE_PAGE_ALPHA, 150).await;
        let beta_base = spawn_listing(TABLE_PAGE_BETA, 0).await;
        let mirrors = vec![
            table_mirror("alpha", alpha_base),
            table_mirror("beta", beta_base),
        ];

        let resolver = Resolver::new(lookup, config_with(mirrors));
        let links = resolver.resolve("tt0000042").await.unwrap();

        let texts: Vec<String> = links.iter().map(link_text).collect();
        assert_eq!(
            texts,
            vec!["Alpha.Cut.2021.1080p.mkv", "Beta.Cut.2021.720p.mp4"]
        );
    }

    #[tokio::test]
    async fn test_fan_out_filters_extensions_fast_path_does_not() {
        let lookup = spawn_lookup_ok().await;
        let beta_base = spawn_listing(TABLE_PAGE_BETA, 0).await;
        let resolver = Resolver::new(
            lookup,
            config_with(vec![table_mirror("beta", beta_base)]),
        );

        // Fan-out drops the subtitle row.
        let fanned = resolver.resolve("tt0000042").await.unwrap();
        assert_eq!(fanned.len(), 1);

        // The single-mirror fast path keeps every row.
        let single = resolver.resolve_single("tt0000042", "beta").await.unwrap();
        assert_eq!(single.len(), 2);
    }

    #[tokio::test]
    async fn test_unknown_mirror_rejected() {
        let lookup = spawn_lookup_ok().await;
        let resolver = Resolver::new(lookup, config_with(Vec::new()));

        let err = resolver
            .resolve_single("tt0000042", "nope")
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::UnknownMirror(_)));
    }

    #[tokio::test]
    async fn test_all_mirrors_down_yields_empty_result() {
        let lookup = spawn_lookup_ok().await;
        let mirrors = vec![
            table_mirror("a", "http://127.0.0.1:9".to_string()),
            table_mirror("b", "http://127.0.0.1:9".to_string()),
        ];
        let resolver = Resolver::new(lookup, config_with(mirrors));

        let links = resolver.resolve("tt0000042").await.unwrap();
        assert!(links.is_empty());
    }
}

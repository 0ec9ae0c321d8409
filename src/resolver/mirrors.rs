// Mirror URL strategy
// Each mirror publishes listings under its own path/naming convention.
// Candidate URLs are a pure function of the canonical title info and the
// mirror's configured rule, so a given title always maps to the same URLs.

use regex::Regex;
use serde::Deserialize;
use std::sync::LazyLock;

use crate::services::lookup::CanonicalTitleInfo;

static RE_WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").unwrap());
static RE_PERIOD_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\.{2,}").unwrap());

/// Extraction strategy used for a mirror's listing pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MirrorParser {
    /// `ul > .item-type` quality items with localized size/tag spans.
    QualityList,
    /// Directory-index style table of files.
    FileTable,
}

/// How a mirror derives its listing path from the title info.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NamingRule {
    /// Path keyed by the numeric part of the title identifier.
    DirectId,
    /// Sanitized title with the release year always appended.
    YearAlways,
    /// Sanitized title; year appended only from the threshold year onward.
    YearThreshold,
    /// Directory segment clamped to the threshold year; the filename stem
    /// keeps the true year.
    YearClamped,
}

/// One configured mirror. The order of entries in the config list is the
/// merge priority order of the fan-out.
#[derive(Debug, Clone, Deserialize)]
pub struct MirrorConfig {
    pub id: String,
    pub base_url: String,
    pub naming: NamingRule,
    pub parser: MirrorParser,
    #[serde(default = "default_year_threshold")]
    pub year_threshold: i32,
}

fn default_year_threshold() -> i32 {
    2023
}

/// A concrete listing location to fetch for one request. No identity beyond
/// the request that produced it.
#[derive(Debug, Clone)]
pub struct MirrorCandidate {
    pub mirror_id: String,
    pub base_url: String,
    pub listing_url: String,
    pub parser: MirrorParser,
}

/// Turn a display title into the dotted path segment the name-based mirrors
/// use: colons become periods, whitespace runs collapse to a single period,
/// and repeated periods collapse to one.
pub fn sanitize_title(title: &str) -> String {
    let replaced = title.replace(':', ".");
    let dotted = RE_WHITESPACE_RUN.replace_all(&replaced, ".");
    RE_PERIOD_RUN
        .replace_all(&dotted, ".")
        .trim_matches('.')
        .to_string()
}

/// Build the listing URL(s) for one mirror.
pub fn listing_urls(info: &CanonicalTitleInfo, identifier: &str, mirror: &MirrorConfig) -> Vec<String> {
    let base = mirror.base_url.trim_end_matches('/');
    match mirror.naming {
        NamingRule::DirectId => {
            // Identifier is "tt" + digits; the mirror keys on the digits.
            let numeric = identifier.strip_prefix("tt").unwrap_or(identifier);
            vec![format!("{}/movies/{}/", base, numeric)]
        }
        NamingRule::YearAlways => {
            let stem = sanitize_title(&info.title);
            vec![format!("{}/Movies/{}.{}/", base, stem, info.year)]
        }
        NamingRule::YearThreshold => {
            let stem = sanitize_title(&info.title);
            if info.year >= mirror.year_threshold {
                vec![format!("{}/Film/{}.{}/", base, stem, info.year)]
            } else {
                vec![format!("{}/Film/{}/", base, stem)]
            }
        }
        NamingRule::YearClamped => {
            let stem = sanitize_title(&info.title);
            let dir_year = info.year.min(mirror.year_threshold);
            vec![format!("{}/{}/{}.{}/", base, dir_year, stem, info.year)]
        }
    }
}

/// Expand the configured mirror list into fetchable candidates, preserving
/// the configured priority order.
pub fn candidates(
    info: &CanonicalTitleInfo,
    identifier: &str,
    mirrors: &[MirrorConfig],
) -> Vec<MirrorCandidate> {
    mirrors
        .iter()
        .flat_map(|mirror| {
            listing_urls(info, identifier, mirror)
                .into_iter()
                .map(|listing_url| MirrorCandidate {
                    mirror_id: mirror.id.clone(),
                    base_url: mirror.base_url.trim_end_matches('/').to_string(),
                    listing_url,
                    parser: mirror.parser,
                })
                .collect::<Vec<_>>()
        })
        .collect()
}

// HTML listing extraction
// Two strategies, selected per mirror family. Both are tolerant: optional
// fields degrade to None/empty, rows without a usable link are dropped.

use scraper::{ElementRef, Html, Selector};

use super::normalize::{self, LinkTag, QUALITY_LABEL, SIZE_LABEL};
use super::{FileLink, QualityLink};

/// Extract quality-list items (`ul > .item-type`) from a mirror page.
///
/// Each item carries the quality string in its second span, the size/info
/// string in its third, and the download anchor under a `.dllink` class.
/// A row is emitted only when link, label and info text are all present.
pub fn quality_list(document: &Html, base_url: &str) -> Vec<QualityLink> {
    let item_selector = Selector::parse("ul > .item-type").unwrap();
    let span_selector = Selector::parse("span").unwrap();
    let link_selector = Selector::parse(".dllink").unwrap();

    let mut links = Vec::new();

    for item in document.select(&item_selector) {
        let spans: Vec<String> = item
            .select(&span_selector)
            .map(|span| span.text().collect::<String>())
            .collect();

        let Some(quality_text) = spans.get(1) else {
            continue;
        };
        let Some(info_text) = spans.get(2).filter(|t| !t.trim().is_empty()) else {
            continue;
        };
        let Some(href) = item
            .select(&link_selector)
            .next()
            .and_then(|a| a.value().attr("href"))
        else {
            continue;
        };

        let Some(label) = quality_text
            .split(QUALITY_LABEL)
            .nth(1)
            .map(str::trim)
            .filter(|l| !l.is_empty())
        else {
            continue;
        };

        let size_text = info_text
            .split(SIZE_LABEL)
            .nth(1)
            .and_then(|s| s.split('-').next())
            .and_then(normalize::normalize_size);

        links.push(QualityLink {
            label: label.to_string(),
            size_text,
            link: absolutize(base_url, href),
            tag: normalize::normalize_tag(info_text).unwrap_or(LinkTag::Unknown),
        });
    }

    links
}

/// Extract file rows from a directory-index style table.
///
/// The first two rows are the index header and are skipped. The link is the
/// title anchor's href joined onto the listing URL, or `site_url + "/" +
/// cell text` when the cell has no anchor. When `extensions` is given
/// (the fan-out variant), rows whose link does not end in a whitelisted
/// video extension are dropped; the single-mirror variant passes `None` and
/// keeps every row.
pub fn file_table(
    document: &Html,
    listing_url: &str,
    site_url: &str,
    extensions: Option<&[String]>,
) -> Vec<FileLink> {
    let row_selector = Selector::parse("tr").unwrap();
    let cell_selector = Selector::parse("td").unwrap();
    let anchor_selector = Selector::parse("a").unwrap();

    let mut links = Vec::new();

    for row in document.select(&row_selector).skip(2) {
        let cells: Vec<ElementRef> = row.select(&cell_selector).collect();
        let Some(title_cell) = cells.get(1).or_else(|| cells.first()) else {
            continue;
        };

        let size = cells
            .get(3)
            .map(|cell| cell.text().collect::<String>().trim().to_string())
            .unwrap_or_default();

        let anchor = title_cell
            .select(&anchor_selector)
            .next()
            .and_then(|a| a.value().attr("href").map(|href| (a, href)));

        let (text, link) = match anchor {
            Some((a, href)) => {
                let text = a.text().collect::<String>().trim().to_string();
                let link = if href.starts_with("http") {
                    href.to_string()
                } else {
                    format!("{}{}", listing_url, href)
                };
                (text, link)
            }
            None => {
                let text = title_cell.text().collect::<String>().trim().to_string();
                if text.is_empty() {
                    continue;
                }
                let link = format!("{}/{}", site_url.trim_end_matches('/'), text);
                (text, link)
            }
        };

        if text.is_empty() || link.is_empty() {
            continue;
        }

        if let Some(extensions) = extensions {
            let matches = extensions
                .iter()
                .any(|ext| link.ends_with(&format!(".{}", ext)));
            if !matches {
                continue;
            }
        }

        links.push(FileLink { text, size, link });
    }

    links
}

fn absolutize(base_url: &str, href: &str) -> String {
    if href.starts_with("http") {
        href.to_string()
    } else {
        format!(
            "{}/{}",
            base_url.trim_end_matches('/'),
            href.trim_start_matches('/')
        )
    }
}

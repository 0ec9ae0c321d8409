// Normalization of localized mirror annotations
// The quality-list mirror family renders size and dub/sub info as Persian
// free text; these helpers turn that into structured fields.

use serde::Serialize;

/// Localized unit token for gigabytes.
const GIGABYTE_TOKEN: &str = "گیگابایت";
/// Localized unit token for megabytes.
const MEGABYTE_TOKEN: &str = "مگابایت";
/// Localized "subtitled" marker.
const SUBTITLE_TOKEN: &str = "زیرنویس";
/// Localized "dubbed" marker.
const DUB_TOKEN: &str = "دوبله";

/// Field label preceding the quality string on listing items.
pub const QUALITY_LABEL: &str = "کیفیت : ";
/// Field label preceding the size string on listing items.
pub const SIZE_LABEL: &str = "حجم : ";

/// Audio-language tag attached to a quality-list link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LinkTag {
    Dub,
    Sub,
    Unknown,
}

/// Convert a raw localized size string ("1.6 گیگابایت - 1080p") into a
/// canonical "<value>GB"/"<value>MB" form.
///
/// Returns `None` when no recognized unit token is present; rows without a
/// parseable size are common on these mirrors and must still be emitted.
pub fn normalize_size(raw: &str) -> Option<String> {
    if let Some((value, _)) = raw.split_once(GIGABYTE_TOKEN) {
        return Some(format!("{}GB", value.trim()));
    }
    if let Some((value, _)) = raw.split_once(MEGABYTE_TOKEN) {
        return Some(format!("{}MB", value.trim()));
    }
    None
}

/// Classify a raw localized info string as subtitled or dubbed.
///
/// The subtitle token wins when present; valid listings never carry both.
pub fn normalize_tag(raw: &str) -> Option<LinkTag> {
    if raw.contains(SUBTITLE_TOKEN) {
        Some(LinkTag::Sub)
    } else if raw.contains(DUB_TOKEN) {
        Some(LinkTag::Dub)
    } else {
        None
    }
}

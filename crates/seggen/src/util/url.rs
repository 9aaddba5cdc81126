use url::Url;

use crate::error::SegGenResult;

pub(crate) fn is_absolute_url(s: &str) -> bool {
    s.starts_with("http://")
        || s.starts_with("https://")
        || s.starts_with("file://")
        || s.starts_with("ftp://")
}

/// Resolves `new` against `current`.
///
/// Base URLs produced by discovery always end with `/`, so a relative `new` is appended to the
/// stream directory. The query of `current` is carried over unless `new` brings its own.
pub(crate) fn merge_baseurls(current: &Url, new: &str) -> SegGenResult<Url> {
    if is_absolute_url(new) {
        Ok(Url::parse(new)?)
    } else {
        let mut merged = current.join(new)?;
        if merged.query().is_none() {
            merged.set_query(current.query());
        }
        Ok(merged)
    }
}

/// Manifest location for one format: `base_url` followed by a fixed suffix.
pub(crate) fn manifest_url(base_url: &Url, suffix: &str) -> SegGenResult<Url> {
    Ok(Url::parse(&format!("{base_url}{suffix}"))?)
}

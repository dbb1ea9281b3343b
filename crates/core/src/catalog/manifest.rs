//! Newline-delimited URL manifests.

use crate::util::join_relative;
use percent_encoding::percent_decode_str;
use std::path::{Path, PathBuf};
use url::Url;

/// One manifest line that parsed as an http(s) URL.
#[derive(Debug, Clone, PartialEq)]
pub struct ManifestUrl {
    /// The line as written, used verbatim as a remote locator.
    pub raw: String,
    pub url: Url,
}

/// URLs sharing a series key, in first-seen order.
#[derive(Debug, Clone, PartialEq)]
pub struct ManifestSeries {
    pub key: String,
    pub urls: Vec<ManifestUrl>,
}

/// Parse manifest text into series. Lines that are not absolute http(s) URLs
/// are ignored.
pub fn parse_manifest(content: &str) -> Vec<ManifestSeries> {
    let mut series: Vec<ManifestSeries> = Vec::new();

    for line in content.lines() {
        let line = line.trim();
        if !line.starts_with("http") {
            continue;
        }
        let url = match Url::parse(line) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => url,
            Ok(_) => continue,
            Err(e) => {
                tracing::debug!("Skipping manifest line {:?}: {}", line, e);
                continue;
            }
        };

        let key = series_key(&url);
        let entry = ManifestUrl {
            raw: line.to_string(),
            url,
        };
        match series.iter_mut().find(|s| s.key == key) {
            Some(existing) => existing.urls.push(entry),
            None => series.push(ManifestSeries {
                key,
                urls: vec![entry],
            }),
        }
    }

    series
}

/// URL-decoded third-from-last path segment; the host for shorter paths.
pub fn series_key(url: &Url) -> String {
    let segments: Vec<&str> = url
        .path_segments()
        .map(|s| s.collect())
        .unwrap_or_default();
    match segments.len().checked_sub(3).and_then(|i| segments.get(i)) {
        Some(segment) => percent_decode_str(segment).decode_utf8_lossy().into_owned(),
        None => url.host_str().unwrap_or_default().to_string(),
    }
}

/// Path of `raw` below `mirror_base`, URL-decoded, if it is mirrored there.
pub fn mirror_relative_path(raw: &str, mirror_base: &str) -> Option<String> {
    let rest = raw.strip_prefix(mirror_base)?;
    let decoded = percent_decode_str(rest).decode_utf8_lossy().into_owned();
    if decoded.is_empty() {
        None
    } else {
        Some(decoded)
    }
}

/// Local copy of a mirrored URL under `collection_dir`, if one exists.
pub fn local_mirror(raw: &str, mirror_base: &str, collection_dir: &Path) -> Option<(String, PathBuf)> {
    let relative = mirror_relative_path(raw, mirror_base)?;
    let path = join_relative(collection_dir, &relative)?;
    path.is_file().then_some((relative, path))
}

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Context;

use crate::catalog::model::{Catalog, Entry, MAX_POSITION};
use crate::foundation::error::{WheelError, WheelResult};

#[derive(serde::Deserialize)]
#[serde(untagged)]
enum CatalogFile {
    List(Vec<RawEntry>),
    Legacy(BTreeMap<String, LegacyEntry>),
}

#[derive(serde::Deserialize)]
struct RawEntry {
    #[serde(alias = "nummer")]
    position: i64,
    #[serde(alias = "artiest")]
    artist: String,
    #[serde(alias = "titel", alias = "song")]
    title: String,
}

#[derive(serde::Deserialize)]
struct LegacyEntry {
    #[serde(alias = "artiest")]
    artist: String,
    #[serde(alias = "titel", alias = "title")]
    song: String,
}

/// Parse catalog JSON.
///
/// Accepts an array of entries or the legacy `{"<position>": {artist, song}}` map. Entries with a
/// position outside `[0, 1000]` are dropped with a warning.
pub fn parse_catalog(bytes: &[u8]) -> WheelResult<Catalog> {
    let file: CatalogFile = serde_json::from_slice(bytes)
        .map_err(|e| WheelError::serde(format!("catalog json: {e}")))?;

    let raw: Vec<RawEntry> = match file {
        CatalogFile::List(entries) => entries,
        CatalogFile::Legacy(map) => {
            let mut out = Vec::with_capacity(map.len());
            for (key, v) in map {
                let Ok(position) = key.trim().parse::<i64>() else {
                    tracing::warn!(key = %key, "skipping catalog entry with non-numeric key");
                    continue;
                };
                out.push(RawEntry {
                    position,
                    artist: v.artist,
                    title: v.song,
                });
            }
            // BTreeMap orders keys as strings; restore numeric order.
            out.sort_by_key(|e| e.position);
            out
        }
    };

    let total = raw.len();
    let mut entries = Vec::with_capacity(total);
    for e in raw {
        match u32::try_from(e.position) {
            Ok(position) if position <= MAX_POSITION => entries.push(Entry {
                position,
                artist: e.artist,
                title: e.title,
            }),
            _ => {
                tracing::warn!(position = e.position, "skipping catalog entry outside 0..=1000");
            }
        }
    }
    tracing::debug!(
        loaded = entries.len(),
        skipped = total - entries.len(),
        "catalog parsed"
    );
    Ok(Catalog::new(entries))
}

/// Read and parse a catalog file.
pub fn load_catalog(path: &Path) -> WheelResult<Catalog> {
    let bytes =
        std::fs::read(path).with_context(|| format!("read catalog '{}'", path.display()))?;
    parse_catalog(&bytes)
}

/// Like [`load_catalog`], but a missing or malformed file yields an empty catalog.
pub fn load_or_empty(path: &Path) -> Catalog {
    match load_catalog(path) {
        Ok(c) => {
            tracing::info!(path = %path.display(), entries = c.len(), "catalog loaded");
            c
        }
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "catalog unavailable, starting empty"
            );
            Catalog::default()
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/catalog/load.rs"]
mod tests;

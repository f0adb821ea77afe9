use std::sync::Arc;

/// Highest position a catalog entry may carry.
pub const MAX_POSITION: u32 = 1000;

/// One song in the catalog.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Entry {
    /// Position in `[0, 1000]`; also the wheel slot the spin lands on.
    pub position: u32,
    /// Performing artist.
    pub artist: String,
    /// Song title.
    pub title: String,
}

impl Entry {
    /// `artist – title`, as shown under the overlay badge.
    pub fn caption(&self) -> String {
        format!("{} \u{2013} {}", self.artist, self.title)
    }
}

/// Immutable, ordered, cheaply clonable entry list.
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    entries: Arc<[Entry]>,
}

impl Catalog {
    /// Wrap entries, keeping their order.
    pub fn new(entries: Vec<Entry>) -> Self {
        Self {
            entries: entries.into(),
        }
    }

    /// All entries in load order.
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` when nothing was loaded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// First entry whose position equals `position`.
    pub fn find(&self, position: u32) -> Option<&Entry> {
        self.entries.iter().find(|e| e.position == position)
    }

    /// Case-insensitive substring search over artist and title.
    ///
    /// Queries shorter than two characters (after trimming) match nothing.
    pub fn search(&self, query: &str, limit: usize) -> Vec<Entry> {
        let q = query.trim().to_lowercase();
        if q.chars().count() < 2 {
            return Vec::new();
        }
        self.entries
            .iter()
            .filter(|e| e.artist.to_lowercase().contains(&q) || e.title.to_lowercase().contains(&q))
            .take(limit)
            .cloned()
            .collect()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/catalog/model.rs"]
mod tests;

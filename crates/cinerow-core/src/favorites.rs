use std::sync::Arc;

use crate::models::{Title, TitleKey};
use crate::storage::{JsonRepository, KeyValueStore, FAVORITES_KEY};

/// The user's saved titles ("My List"), most recently added first.
///
/// Every mutation writes the whole set back to the store before returning.
/// Write failures are logged and otherwise ignored: the in-memory set stays
/// authoritative for the session.
pub struct Favorites {
    items: Vec<Title>,
    repo: JsonRepository<Vec<Title>>,
}

impl Favorites {
    /// Hydrate from the store, starting empty if nothing usable is stored.
    pub fn load(store: Arc<dyn KeyValueStore>) -> Self {
        let repo = JsonRepository::new(store, FAVORITES_KEY);
        let mut items: Vec<Title> = repo.load();

        // A hand-edited or foreign payload may repeat keys; keep the first.
        let mut seen = std::collections::HashSet::new();
        items.retain(|t| seen.insert(t.key()));

        Self { items, repo }
    }

    pub fn contains(&self, key: TitleKey) -> bool {
        self.items.iter().any(|t| t.key() == key)
    }

    pub fn all(&self) -> &[Title] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Prepend the title unless its key is already present.
    /// Prepend `title`. Returns false if it was already saved.
    pub fn add(&mut self, title: Title) -> bool {
        if self.contains(title.key()) {
            return false;
        }
        tracing::debug!(key = %title.key(), "added to favorites");
        self.items.insert(0, title);
        self.persist();
        true
    }

    pub fn remove(&mut self, key: TitleKey) {
        let before = self.items.len();
        self.items.retain(|t| t.key() != key);
        if self.items.len() != before {
            tracing::debug!(%key, "removed from favorites");
            self.persist();
        }
    }

    /// Add if absent, remove if present. Returns whether the title is now saved.
    pub fn toggle(&mut self, title: Title) -> bool {
        let key = title.key();
        if self.contains(key) {
            self.remove(key);
            false
        } else {
            self.add(title);
            true
        }
    }

    pub fn clear(&mut self) {
        if !self.items.is_empty() {
            self.items.clear();
            self.persist();
        }
    }

    fn persist(&self) {
        if let Err(e) = self.repo.save(&self.items) {
            tracing::warn!(error = %e, "failed to persist favorites");
        }
    }
}

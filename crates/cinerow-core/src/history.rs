use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Title, TitleKey};
use crate::storage::{JsonRepository, KeyValueStore, HISTORY_KEY};

/// Bounds and thresholds for the watch history views.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryLimits {
    /// Entries kept in the log.
    pub max_entries: usize,
    /// Entries shown under "continue watching".
    pub continue_limit: usize,
    /// Titles shown under "recently watched".
    pub recent_limit: usize,
    /// Progress percentage at which a title counts as finished.
    pub finished_threshold: f32,
}

impl Default for HistoryLimits {
    fn default() -> Self {
        Self {
            max_entries: 30,
            continue_limit: 10,
            recent_limit: 20,
            finished_threshold: 90.0,
        }
    }
}

/// One watched title.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub item: Title,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub watched_at: DateTime<Utc>,
    /// Percentage watched, `0.0..=100.0`.
    pub progress: f32,
}

/// Bounded, deduplicated log of watched titles, most recent first.
pub struct WatchHistory {
    entries: Vec<HistoryEntry>,
    limits: HistoryLimits,
    repo: JsonRepository<Vec<HistoryEntry>>,
}

impl WatchHistory {
    pub fn load(store: Arc<dyn KeyValueStore>, limits: HistoryLimits) -> Self {
        let repo = JsonRepository::new(store, HISTORY_KEY);
        let mut entries: Vec<HistoryEntry> = repo.load();

        let mut seen = std::collections::HashSet::new();
        entries.retain(|e| seen.insert(e.item.key()));
        entries.truncate(limits.max_entries);

        Self {
            entries,
            limits,
            repo,
        }
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Record a viewing now. See [`WatchHistory::record_at`].
    pub fn record(&mut self, title: Title) {
        self.record_at(title, Utc::now());
    }

    /// Move (or insert) the title to the front with zero progress, keeping
    /// only the most recent `max_entries`.
    pub fn record_at(&mut self, title: Title, watched_at: DateTime<Utc>) {
        let key = title.key();
        self.entries.retain(|e| e.item.key() != key);
        self.entries.insert(
            0,
            HistoryEntry {
                item: title,
                watched_at,
                progress: 0.0,
            },
        );
        self.entries.truncate(self.limits.max_entries);
        tracing::debug!(%key, len = self.entries.len(), "recorded in history");
        self.persist();
    }

    /// Update the progress of an existing entry. Unknown keys are ignored.
    pub fn set_progress(&mut self, key: TitleKey, percent: f32) {
        let Some(entry) = self.entries.iter_mut().find(|e| e.item.key() == key) else {
            return;
        };
        entry.progress = if percent.is_nan() {
            0.0
        } else {
            percent.clamp(0.0, 100.0)
        };
        self.persist();
    }

    pub fn remove(&mut self, key: TitleKey) {
        let before = self.entries.len();
        self.entries.retain(|e| e.item.key() != key);
        if self.entries.len() != before {
            self.persist();
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.persist();
    }

    /// Unfinished entries, most recent first.
    pub fn continue_watching(&self) -> Vec<&HistoryEntry> {
        self.entries
            .iter()
            .filter(|e| e.progress < self.limits.finished_threshold)
            .take(self.limits.continue_limit)
            .collect()
    }

    /// Recently watched titles, most recent first.
    pub fn recently_watched(&self) -> Vec<&Title> {
        self.entries
            .iter()
            .map(|e| &e.item)
            .take(self.limits.recent_limit)
            .collect()
    }

    fn persist(&self) {
        if let Err(e) = self.repo.save(&self.entries) {
            tracing::warn!(error = %e, "failed to persist watch history");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::title::fixtures::{movie, series};
    use crate::storage::MemoryStore;

    fn history() -> WatchHistory {
        WatchHistory::load(Arc::new(MemoryStore::new()), HistoryLimits::default())
    }

    fn ids(h: &WatchHistory) -> Vec<u64> {
        h.entries().iter().map(|e| e.item.id).collect()
    }

    #[test]
    fn test_bounded_to_most_recent_thirty() {
        let mut h = history();
        for id in 1..=35 {
            h.record(movie(id, "T"));
        }

        assert_eq!(h.len(), 30);
        let expected: Vec<u64> = (6..=35).rev().collect();
        assert_eq!(ids(&h), expected);
    }

    #[test]
    fn test_rewatch_moves_to_front() {
        let mut h = history();
        h.record(movie(1, "X"));
        h.record(movie(2, "Y"));
        h.record(movie(1, "X"));

        assert_eq!(ids(&h), vec![1, 2]);
    }

    #[test]
    fn test_rewatch_resets_progress() {
        let mut h = history();
        h.record(movie(1, "X"));
        h.set_progress(TitleKey::movie(1), 55.0);
        h.record(movie(1, "X"));
        assert_eq!(h.entries()[0].progress, 0.0);
    }

    #[test]
    fn test_dedup_is_per_kind() {
        let mut h = history();
        h.record(movie(7, "Movie"));
        h.record(series(7, "Series"));
        assert_eq!(h.len(), 2);

        h.remove(TitleKey::movie(7));
        assert_eq!(h.entries()[0].item.key(), TitleKey::series(7));
    }

    #[test]
    fn test_continue_watching_filters_and_caps() {
        let mut h = history();
        for id in 1..=15 {
            h.record(movie(id, "T"));
        }
        h.set_progress(TitleKey::movie(15), 95.0);
        h.set_progress(TitleKey::movie(14), 90.0);
        h.set_progress(TitleKey::movie(13), 89.9);

        let cont: Vec<u64> = h.continue_watching().iter().map(|e| e.item.id).collect();
        assert_eq!(cont, vec![13, 12, 11, 10, 9, 8, 7, 6, 5, 4]);
    }

    #[test]
    fn test_recently_watched_caps_at_twenty() {
        let mut h = history();
        for id in 1..=25 {
            h.record(movie(id, "T"));
        }
        let recent = h.recently_watched();
        assert_eq!(recent.len(), 20);
        assert_eq!(recent[0].id, 25);
    }

    #[test]
    fn test_progress_is_clamped() {
        let mut h = history();
        h.record(movie(1, "X"));
        h.set_progress(TitleKey::movie(1), 140.0);
        assert_eq!(h.entries()[0].progress, 100.0);
        h.set_progress(TitleKey::movie(99), 50.0);
        assert_eq!(h.len(), 1);
    }

    #[test]
    fn test_persisted_with_millisecond_timestamps() {
        let store = Arc::new(MemoryStore::new());
        let mut h = WatchHistory::load(store.clone(), HistoryLimits::default());
        let at = DateTime::from_timestamp_millis(1_700_000_000_123).unwrap();
        h.record_at(movie(1, "X"), at);

        let raw = store.get(HISTORY_KEY).unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value[0]["watchedAt"], 1_700_000_000_123i64);

        let reloaded = WatchHistory::load(store, HistoryLimits::default());
        assert_eq!(reloaded.entries()[0].watched_at, at);
    }

    #[test]
    fn test_clear_empties_log_and_store() {
        let store = Arc::new(MemoryStore::new());
        let mut h = WatchHistory::load(store.clone(), HistoryLimits::default());
        h.record(movie(1, "X"));
        h.clear();
        assert!(h.is_empty());
        assert!(WatchHistory::load(store, HistoryLimits::default()).is_empty());
    }
}

//! Debounced search across movies and series.
//!
//! Each query change restarts a quiet-period timer. When it elapses both
//! categories are searched concurrently and merged into one ranked list.
//! Only the most recently issued query may publish results.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use cinerow_api::{MediaKind, MetadataProvider};

use crate::genres::GenreCache;
use crate::mapper::TitleMapper;
use crate::models::Title;

/// Debounce window and minimum query length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchSettings {
    pub debounce: Duration,
    pub min_query_len: usize,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(500),
            min_query_len: 3,
        }
    }
}

/// What the search surface shows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchState {
    pub query: String,
    pub results: Vec<Title>,
    pub is_searching: bool,
}

struct Slot {
    generation: u64,
    pending: Option<JoinHandle<()>>,
}

impl Slot {
    fn invalidate(&mut self) -> u64 {
        self.generation += 1;
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
        self.generation
    }
}

struct Inner<P> {
    provider: Arc<P>,
    genres: Arc<GenreCache>,
    mapper: TitleMapper,
    settings: SearchSettings,
    slot: Mutex<Slot>,
    tx: watch::Sender<SearchState>,
}

impl<P: MetadataProvider + 'static> Inner<P> {
    fn slot(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// The debounce window for `generation` elapsed. Marks the search as in
    /// flight if it is still current.
    fn fire(&self, generation: u64) -> bool {
        let mut slot = self.slot();
        if slot.generation != generation {
            return false;
        }
        slot.pending = None;
        self.tx.send_modify(|state| state.is_searching = true);
        true
    }

    fn commit(&self, generation: u64, results: Vec<Title>) {
        let slot = self.slot();
        if slot.generation != generation {
            tracing::debug!(generation, current = slot.generation, "discarding stale search results");
            return;
        }
        self.tx.send_modify(|state| {
            state.results = results;
            state.is_searching = false;
        });
    }

    async fn run(&self, query: &str) -> Vec<Title> {
        let (movies, series) = tokio::join!(
            self.search_kind(query, MediaKind::Movie),
            self.search_kind(query, MediaKind::Series),
        );

        let mut results = movies;
        results.extend(series);
        results.sort_by(|a, b| b.match_score.cmp(&a.match_score));
        tracing::debug!(query, count = results.len(), "search complete");
        results
    }

    async fn search_kind(&self, query: &str, kind: MediaKind) -> Vec<Title> {
        let records = match self.provider.search(query, kind).await {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!(query, %kind, error = %e, "search failed");
                return Vec::new();
            }
        };
        let genres = self.genres.get(self.provider.as_ref(), kind).await;

        records
            .into_iter()
            .filter(|r| r.has_image())
            .map(|r| self.mapper.map_record(r, &genres))
            .collect()
    }
}

/// Debounced, last-query-wins search over a [`MetadataProvider`].
///
/// Clones share state. Queries require a tokio runtime.
pub struct SearchAggregator<P> {
    inner: Arc<Inner<P>>,
}

impl<P> Clone for SearchAggregator<P> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<P: MetadataProvider + 'static> SearchAggregator<P> {
    pub fn new(
        provider: Arc<P>,
        genres: Arc<GenreCache>,
        mapper: TitleMapper,
        settings: SearchSettings,
    ) -> Self {
        let (tx, _) = watch::channel(SearchState::default());
        Self {
            inner: Arc::new(Inner {
                provider,
                genres,
                mapper,
                settings,
                slot: Mutex::new(Slot {
                    generation: 0,
                    pending: None,
                }),
                tx,
            }),
        }
    }

    /// Update the query text.
    ///
    /// Short queries clear the results immediately without a search. Longer
    /// ones search once the debounce window passes without another change.
    pub fn set_query(&self, text: &str) {
        let inner = &self.inner;
        let mut slot = inner.slot();
        let generation = slot.invalidate();
        let query = text.trim().to_string();

        if query.chars().count() < inner.settings.min_query_len {
            inner.tx.send_replace(SearchState {
                query: text.to_string(),
                results: Vec::new(),
                is_searching: false,
            });
            return;
        }

        inner.tx.send_modify(|state| {
            state.query = text.to_string();
            state.is_searching = false;
        });

        let task_inner = inner.clone();
        slot.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(task_inner.settings.debounce).await;
            if !task_inner.fire(generation) {
                return;
            }
            let results = task_inner.run(&query).await;
            task_inner.commit(generation, results);
        }));
    }

    /// Search right away, bypassing the debounce window and the published
    /// state. Short queries yield nothing.
    pub async fn search_once(&self, text: &str) -> Vec<Title> {
        let query = text.trim();
        if query.chars().count() < self.inner.settings.min_query_len {
            return Vec::new();
        }
        self.inner.run(query).await
    }

    /// Reset query and results, discarding outstanding work.
    pub fn clear(&self) {
        let mut slot = self.inner.slot();
        slot.invalidate();
        self.inner.tx.send_replace(SearchState::default());
    }

    pub fn state(&self) -> SearchState {
        self.inner.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SearchState> {
        self.inner.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use cinerow_api::tmdb::types::{Genre, MediaRecord};

    use super::*;
    use crate::testing::{movie_record, show_record, StubProvider};

    fn aggregator(provider: StubProvider) -> (SearchAggregator<StubProvider>, Arc<StubProvider>) {
        let provider = Arc::new(provider);
        let search = SearchAggregator::new(
            provider.clone(),
            Arc::new(GenreCache::new()),
            TitleMapper::default(),
            SearchSettings::default(),
        );
        (search, provider)
    }

    async fn wait(ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }

    fn result_ids(search: &SearchAggregator<StubProvider>) -> Vec<u64> {
        search.state().results.iter().map(|t| t.id).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_short_query_clears_without_search() {
        let (search, provider) = aggregator(
            StubProvider::new().with_search("abc", MediaKind::Movie, vec![movie_record(1, "Abc", 7.0)]),
        );

        search.set_query("abc");
        wait(600).await;
        assert_eq!(result_ids(&search), vec![1]);
        let calls = provider.search_calls();

        search.set_query("ab");
        let state = search.state();
        assert!(state.results.is_empty());
        assert!(!state.is_searching);

        wait(1_000).await;
        assert_eq!(provider.search_calls(), calls);
    }

    #[tokio::test(start_paused = true)]
    async fn test_searches_after_quiet_period() {
        let (search, provider) = aggregator(StubProvider::new());

        search.set_query("abc");
        wait(499).await;
        assert_eq!(provider.search_calls(), 0);

        wait(100).await;
        assert_eq!(provider.search_calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_typing_restarts_window() {
        let (search, provider) = aggregator(StubProvider::new());

        for q in ["abc", "abcd", "abcde"] {
            search.set_query(q);
            wait(300).await;
        }
        wait(1_000).await;

        assert_eq!(provider.search_calls(), 2);
        let searched = provider.searched.lock().unwrap().clone();
        assert!(searched.iter().all(|q| q == "abcde"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_results_never_published() {
        let (search, _provider) = aggregator(
            StubProvider::new()
                .with_search("cat", MediaKind::Movie, vec![movie_record(1, "Cat People", 7.0)])
                .with_search_delay("cat", MediaKind::Movie, Duration::from_millis(800))
                .with_search("dog", MediaKind::Movie, vec![movie_record(2, "Dog Day", 6.0)]),
        );

        let seen = Arc::new(Mutex::new(HashSet::new()));
        let mut rx = search.subscribe();
        let collector = {
            let seen = seen.clone();
            tokio::spawn(async move {
                while rx.changed().await.is_ok() {
                    let ids: Vec<u64> = rx.borrow_and_update().results.iter().map(|t| t.id).collect();
                    seen.lock().unwrap().extend(ids);
                }
            })
        };

        search.set_query("cat");
        wait(600).await;
        search.set_query("dog");

        wait(600).await;
        assert_eq!(result_ids(&search), vec![2]);

        wait(2_000).await;
        assert_eq!(result_ids(&search), vec![2]);
        assert!(!seen.lock().unwrap().contains(&1));
        collector.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_ranked_by_match_across_categories() {
        let (search, _provider) = aggregator(
            StubProvider::new()
                .with_search("abc", MediaKind::Movie, vec![movie_record(1, "Movie", 7.0)])
                .with_search("abc", MediaKind::Series, vec![show_record(2, "Series", 9.0)]),
        );

        search.set_query("abc");
        wait(600).await;

        let results = search.state().results;
        assert_eq!(results.iter().map(|t| t.id).collect::<Vec<_>>(), vec![2, 1]);
        assert_eq!(results[0].match_score, 90);
        assert!(results[0].is_series());
        assert_eq!(results[1].match_score, 70);
    }

    #[tokio::test(start_paused = true)]
    async fn test_equal_scores_keep_movies_first() {
        let (search, _provider) = aggregator(
            StubProvider::new()
                .with_search("abc", MediaKind::Movie, vec![movie_record(1, "Movie", 8.0)])
                .with_search("abc", MediaKind::Series, vec![show_record(2, "Series", 8.0)]),
        );

        search.set_query("abc");
        wait(600).await;
        assert_eq!(result_ids(&search), vec![1, 2]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_records_without_images_dropped() {
        let mut bare = movie_record(2, "Bare", 9.0);
        if let MediaRecord::Movie(m) = &mut bare {
            m.backdrop_path = None;
            m.poster_path = None;
        }
        let (search, _provider) = aggregator(StubProvider::new().with_search(
            "abc",
            MediaKind::Movie,
            vec![movie_record(1, "Shown", 5.0), bare],
        ));

        search.set_query("abc");
        wait(600).await;
        assert_eq!(result_ids(&search), vec![1]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_image_paths_count_as_missing() {
        let mut blank = movie_record(2, "Blank", 9.0);
        if let MediaRecord::Movie(m) = &mut blank {
            m.backdrop_path = Some(String::new());
            m.poster_path = None;
        }
        let mut blank_show = show_record(3, "Blank Show", 9.5);
        if let MediaRecord::Show(s) = &mut blank_show {
            s.backdrop_path = Some(String::new());
            s.poster_path = Some(String::new());
        }
        let (search, _provider) = aggregator(
            StubProvider::new()
                .with_search("abc", MediaKind::Movie, vec![movie_record(1, "Shown", 5.0), blank])
                .with_search("abc", MediaKind::Series, vec![blank_show]),
        );

        search.set_query("abc");
        wait(600).await;
        assert_eq!(result_ids(&search), vec![1]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_category_degrades_to_empty() {
        let mut provider = StubProvider::new()
            .with_search("abc", MediaKind::Movie, vec![movie_record(1, "Movie", 7.0)])
            .with_search("abc", MediaKind::Series, vec![show_record(2, "Series", 9.0)]);
        provider.fail_searches.insert(MediaKind::Series, true);
        let (search, _provider) = aggregator(provider);

        search.set_query("abc");
        wait(600).await;
        assert_eq!(result_ids(&search), vec![1]);
        assert!(!search.state().is_searching);
    }

    #[tokio::test(start_paused = true)]
    async fn test_is_searching_tracks_current_generation() {
        let (search, _provider) = aggregator(
            StubProvider::new()
                .with_search("abc", MediaKind::Movie, vec![movie_record(1, "Movie", 7.0)])
                .with_search_delay("abc", MediaKind::Movie, Duration::from_millis(1_000)),
        );

        search.set_query("abc");
        assert!(!search.state().is_searching);

        wait(600).await;
        assert!(search.state().is_searching);

        wait(1_000).await;
        let state = search.state();
        assert!(!state.is_searching);
        assert_eq!(state.query, "abc");
        assert_eq!(state.results.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_genre_names_resolved_once() {
        let mut provider = StubProvider::new()
            .with_search("abc", MediaKind::Movie, vec![movie_record(1, "Movie", 7.0)])
            .with_search("abcd", MediaKind::Movie, vec![movie_record(2, "Movie", 7.0)]);
        provider.genres = vec![Genre {
            id: 28,
            name: "Action".into(),
        }];
        let (search, provider) = aggregator(provider);

        search.set_query("abc");
        wait(600).await;
        search.set_query("abcd");
        wait(600).await;

        assert_eq!(search.state().results[0].genres, vec!["Action".to_string()]);
        // One fetch per kind, shared across queries.
        assert_eq!(provider.genre_calls.load(std::sync::atomic::Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_search_once_skips_debounce() {
        let (search, provider) = aggregator(
            StubProvider::new().with_search("abc", MediaKind::Movie, vec![movie_record(1, "Movie", 7.0)]),
        );

        assert!(search.search_once("ab").await.is_empty());
        assert_eq!(provider.search_calls(), 0);

        let results = search.search_once("  abc ").await;
        assert_eq!(results.iter().map(|t| t.id).collect::<Vec<_>>(), vec![1]);
        assert_eq!(search.state(), SearchState::default());
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_discards_outstanding_search() {
        let (search, provider) = aggregator(
            StubProvider::new().with_search("abc", MediaKind::Movie, vec![movie_record(1, "Movie", 7.0)]),
        );

        search.set_query("abc");
        wait(100).await;
        search.clear();
        wait(1_000).await;

        assert_eq!(provider.search_calls(), 0);
        assert_eq!(search.state(), SearchState::default());
    }
}

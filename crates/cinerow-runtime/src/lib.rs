use std::sync::Arc;

use tokio::sync::RwLock;

use cinerow_api::{MetadataProvider, TmdbClient};
use cinerow_core::catalog::{Catalog, CatalogPage, CatalogRow, PageContent};
use cinerow_core::config::AppConfig;
use cinerow_core::coordinator::{ActiveMediaCoordinator, ActivePreview};
use cinerow_core::error::CinerowError;
use cinerow_core::favorites::Favorites;
use cinerow_core::genres::GenreCache;
use cinerow_core::history::{HistoryEntry, WatchHistory};
use cinerow_core::mapper::TitleMapper;
use cinerow_core::models::{Season, Title, TitleKey};
use cinerow_core::playback::{PlaybackResolver, PlaybackSource};
use cinerow_core::search::SearchAggregator;
use cinerow_core::storage::{KeyValueStore, MemoryStore, SqliteStore};

#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error("config error: {0}")]
    Config(String),
    #[error("database error: {0}")]
    Database(String),
    #[error("api error: {0}")]
    Api(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("invalid input: {0}")]
    Invalid(String),
}

impl From<CinerowError> for RuntimeError {
    fn from(e: CinerowError) -> Self {
        match e {
            CinerowError::Config(msg) => Self::Config(msg),
            CinerowError::Api(msg) => Self::Api(msg),
            CinerowError::NotFound(msg) => Self::NotFound(msg),
            CinerowError::Invalid(msg) => Self::Invalid(msg),
            other => Self::Database(other.to_string()),
        }
    }
}

/// Owns configuration, provider access, persisted lists and the preview and
/// search coordinators.
pub struct Runtime<P> {
    config: Arc<RwLock<AppConfig>>,
    provider: Arc<P>,
    catalog: Catalog<P>,
    favorites: RwLock<Favorites>,
    history: RwLock<WatchHistory>,
    coordinator: ActiveMediaCoordinator,
    search: SearchAggregator<P>,
    resolver: PlaybackResolver,
}

impl Runtime<TmdbClient> {
    /// Build a runtime from the user config, talking to TMDB and persisting
    /// to the platform data directory.
    pub fn new() -> Result<Self, RuntimeError> {
        let config = AppConfig::load()?;
        if !config.has_api_key() {
            tracing::warn!("no TMDB API key configured, catalog will show sample rows");
        }

        let provider = TmdbClient::new(config.provider.api_key.clone())
            .with_base_url(config.provider.base_url.clone())
            .with_language(config.provider.language.clone());

        Ok(Self::with_parts(config, Arc::new(provider), open_store()))
    }
}

/// The on-disk store, or a session-only one if the data directory is unusable.
fn open_store() -> Arc<dyn KeyValueStore> {
    let opened = AppConfig::ensure_db_path().and_then(|path| SqliteStore::open(&path));
    match opened {
        Ok(store) => Arc::new(store),
        Err(e) => {
            tracing::warn!(error = %e, "database unavailable, lists will not persist");
            Arc::new(MemoryStore::new())
        }
    }
}

impl<P: MetadataProvider + 'static> Runtime<P> {
    pub fn with_parts(config: AppConfig, provider: Arc<P>, store: Arc<dyn KeyValueStore>) -> Self {
        let genres = Arc::new(GenreCache::new());
        let mapper = TitleMapper::new(config.mapping_rules());

        Self {
            catalog: Catalog::new(provider.clone(), genres.clone(), mapper.clone()),
            search: SearchAggregator::new(
                provider.clone(),
                genres,
                mapper,
                config.search_settings(),
            ),
            favorites: RwLock::new(Favorites::load(store.clone())),
            history: RwLock::new(WatchHistory::load(store, config.history_limits())),
            coordinator: ActiveMediaCoordinator::new(config.hover_delay()),
            resolver: PlaybackResolver::new(config.playback.embed_base_url.clone()),
            config: Arc::new(RwLock::new(config)),
            provider,
        }
    }

    pub async fn get_config(&self) -> AppConfig {
        self.config.read().await.clone()
    }

    // -- Catalog --

    pub async fn load_page(&self, page: CatalogPage) -> PageContent {
        if page == CatalogPage::MyList {
            let titles = self.favorites().await;
            return PageContent {
                featured: titles.first().cloned(),
                rows: vec![CatalogRow {
                    id: "my_list".into(),
                    heading: "My List".into(),
                    titles,
                }],
            };
        }
        self.catalog.load_page(page).await
    }

    pub async fn details(&self, key: TitleKey) -> Result<Title, RuntimeError> {
        self.catalog.details(key).await.map_err(|e| match e {
            CinerowError::NotFound(msg) => RuntimeError::NotFound(format!("{key}: {msg}")),
            other => other.into(),
        })
    }

    pub async fn season(&self, series_id: u64, number: u32) -> Result<Season, RuntimeError> {
        Ok(self.catalog.season(series_id, number).await?)
    }

    pub async fn similar(&self, key: TitleKey) -> Result<Vec<Title>, RuntimeError> {
        Ok(self.catalog.similar(key).await?)
    }

    // -- Search --

    pub fn search(&self) -> &SearchAggregator<P> {
        &self.search
    }

    /// One-shot search for non-interactive callers.
    pub async fn search_now(&self, query: &str) -> Vec<Title> {
        self.search.search_once(query).await
    }

    // -- Preview --

    pub fn coordinator(&self) -> &ActiveMediaCoordinator {
        &self.coordinator
    }

    /// Register hover intent on `title`. After the hover delay its trailer
    /// is looked up through the provider's detail record.
    pub fn preview(&self, title: Title) {
        let provider = self.provider.clone();
        let mapper = self.catalog.mapper().clone();
        let key = title.key();

        self.coordinator.schedule(title, move || async move {
            let details = provider.details(key.id, key.kind).await?;
            Ok::<_, P::Error>(mapper.map_details(details).trailer_url)
        });
    }

    pub fn end_preview(&self) {
        self.coordinator.cancel_schedule();
    }

    pub fn preview_state(&self) -> ActivePreview {
        self.coordinator.snapshot()
    }

    // -- Playback --

    /// Record the viewing and resolve a playable source.
    pub async fn play(
        &self,
        title: &Title,
        season: Option<u32>,
        episode: Option<u32>,
    ) -> Option<PlaybackSource> {
        let source = self
            .resolver
            .resolve(Some(title.id), title.kind(), season, episode);
        if source.is_some() {
            self.history.write().await.record(title.clone());
        }
        self.coordinator.set_playing(false);
        source
    }

    pub fn trailer(&self, title: &Title) -> Option<PlaybackSource> {
        title
            .trailer_url
            .as_deref()
            .map(|url| self.resolver.trailer_source(url))
    }

    // -- Favorites --

    pub async fn favorites(&self) -> Vec<Title> {
        self.favorites.read().await.all().to_vec()
    }

    pub async fn is_favorite(&self, key: TitleKey) -> bool {
        self.favorites.read().await.contains(key)
    }

    /// Returns false if the title was already in the list.
    pub async fn add_favorite(&self, title: Title) -> bool {
        self.favorites.write().await.add(title)
    }

    pub async fn remove_favorite(&self, key: TitleKey) {
        self.favorites.write().await.remove(key);
    }

    /// Returns whether the title is saved afterwards.
    pub async fn toggle_favorite(&self, title: Title) -> bool {
        self.favorites.write().await.toggle(title)
    }

    // -- History --

    pub async fn history(&self) -> Vec<HistoryEntry> {
        self.history.read().await.entries().to_vec()
    }

    pub async fn continue_watching(&self) -> Vec<HistoryEntry> {
        self.history
            .read()
            .await
            .continue_watching()
            .into_iter()
            .cloned()
            .collect()
    }

    pub async fn recently_watched(&self) -> Vec<Title> {
        self.history
            .read()
            .await
            .recently_watched()
            .into_iter()
            .cloned()
            .collect()
    }

    pub async fn set_progress(&self, key: TitleKey, percent: f32) -> Result<(), RuntimeError> {
        let mut history = self.history.write().await;
        if !history.entries().iter().any(|e| e.item.key() == key) {
            return Err(RuntimeError::NotFound(format!("{key} is not in history")));
        }
        history.set_progress(key, percent);
        Ok(())
    }

    pub async fn remove_from_history(&self, key: TitleKey) {
        self.history.write().await.remove(key);
    }

    pub async fn clear_history(&self) {
        self.history.write().await.clear();
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::time::Duration;

    use cinerow_api::tmdb::types::{
        DetailsRecord, Genre, MediaRecord, TitleDetails, TmdbMovieDetails, TmdbSeason, TmdbVideo,
    };
    use cinerow_api::{ListQuery, MediaKind, ProviderError};
    use cinerow_core::playback::SourceKind;
    use cinerow_core::storage::FAVORITES_KEY;

    use super::*;

    #[derive(Debug, thiserror::Error)]
    enum FakeError {
        #[error("not available")]
        Unavailable,
        #[error("no such title")]
        Missing,
    }

    impl ProviderError for FakeError {
        fn is_not_found(&self) -> bool {
            matches!(self, Self::Missing)
        }
    }

    #[derive(Default)]
    struct FakeProvider {
        details: HashMap<u64, TitleDetails>,
        offline: bool,
    }

    impl MetadataProvider for FakeProvider {
        type Error = FakeError;

        async fn genres(&self, _kind: MediaKind) -> Result<Vec<Genre>, FakeError> {
            Ok(Vec::new())
        }

        async fn list(&self, _q: ListQuery, _kind: MediaKind) -> Result<Vec<MediaRecord>, FakeError> {
            Err(FakeError::Unavailable)
        }

        async fn details(&self, id: u64, _kind: MediaKind) -> Result<TitleDetails, FakeError> {
            if self.offline {
                return Err(FakeError::Unavailable);
            }
            self.details.get(&id).cloned().ok_or(FakeError::Missing)
        }

        async fn season(&self, _id: u64, _n: u32) -> Result<TmdbSeason, FakeError> {
            Err(FakeError::Unavailable)
        }

        async fn search(&self, _q: &str, _kind: MediaKind) -> Result<Vec<MediaRecord>, FakeError> {
            Ok(Vec::new())
        }

        async fn similar(&self, _id: u64, _kind: MediaKind) -> Result<Vec<MediaRecord>, FakeError> {
            Ok(Vec::new())
        }
    }

    fn details_with_trailer(id: u64) -> TitleDetails {
        TitleDetails {
            record: DetailsRecord::Movie(TmdbMovieDetails {
                id,
                title: "Inception".into(),
                overview: None,
                backdrop_path: None,
                poster_path: None,
                vote_average: 8.4,
                release_date: Some("2010-07-16".into()),
                genres: Vec::new(),
                adult: false,
                runtime: Some(148),
            }),
            cast: Vec::new(),
            videos: vec![TmdbVideo {
                id: "v".into(),
                key: "YoHD9XEInc0".into(),
                site: "YouTube".into(),
                video_type: "Trailer".into(),
                official: true,
            }],
        }
    }

    fn runtime(provider: FakeProvider, store: Arc<MemoryStore>) -> Runtime<FakeProvider> {
        Runtime::with_parts(AppConfig::default(), Arc::new(provider), store)
    }

    async fn sample(rt: &Runtime<FakeProvider>) -> Title {
        let page = rt.load_page(CatalogPage::Home).await;
        page.featured.unwrap()
    }

    #[tokio::test]
    async fn test_play_records_history_and_resolves() {
        let rt = runtime(FakeProvider::default(), Arc::new(MemoryStore::new()));
        let title = sample(&rt).await;

        let source = rt.play(&title, None, None).await.unwrap();
        assert_eq!(source.kind, SourceKind::Embed);
        assert_eq!(source.url, "https://vidsrc.xyz/embed/movie?tmdb=550");

        let history = rt.history().await;
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].item.id, 550);
        assert_eq!(rt.continue_watching().await.len(), 1);
    }

    #[tokio::test]
    async fn test_favorites_persist_through_store() {
        let store = Arc::new(MemoryStore::new());
        let rt = runtime(FakeProvider::default(), store.clone());
        let title = sample(&rt).await;

        assert!(rt.toggle_favorite(title.clone()).await);
        assert!(rt.is_favorite(title.key()).await);
        assert!(store.get(FAVORITES_KEY).unwrap().is_some());

        let reopened = runtime(FakeProvider::default(), store);
        let my_list = reopened.load_page(CatalogPage::MyList).await;
        assert_eq!(my_list.rows[0].titles.len(), 1);
        assert_eq!(my_list.featured.map(|t| t.id), Some(550));
    }

    #[tokio::test]
    async fn test_add_favorite_reports_existing_entry() {
        let rt = runtime(FakeProvider::default(), Arc::new(MemoryStore::new()));
        let title = sample(&rt).await;

        assert!(rt.add_favorite(title.clone()).await);
        assert!(!rt.add_favorite(title).await);
        assert_eq!(rt.favorites().await.len(), 1);
    }

    #[tokio::test]
    async fn test_progress_for_unknown_title_is_not_found() {
        let rt = runtime(FakeProvider::default(), Arc::new(MemoryStore::new()));
        let err = rt.set_progress(TitleKey::movie(1), 50.0).await.unwrap_err();
        assert!(matches!(err, RuntimeError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_unknown_title_is_not_found() {
        let rt = runtime(FakeProvider::default(), Arc::new(MemoryStore::new()));
        let err = rt.details(TitleKey::series(1)).await.unwrap_err();
        assert!(matches!(err, RuntimeError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_provider_outage_is_api_error() {
        let mut provider = FakeProvider::default();
        provider.details.insert(27205, details_with_trailer(27205));
        provider.offline = true;
        let rt = runtime(provider, Arc::new(MemoryStore::new()));

        let err = rt.details(TitleKey::movie(27205)).await.unwrap_err();
        assert!(matches!(err, RuntimeError::Api(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_preview_resolves_trailer_from_details() {
        let mut provider = FakeProvider::default();
        provider.details.insert(27205, details_with_trailer(27205));
        let rt = runtime(provider, Arc::new(MemoryStore::new()));

        let mut title = sample(&rt).await;
        title.id = 27205;
        rt.preview(title);
        tokio::time::sleep(Duration::from_millis(300)).await;

        let state = rt.preview_state();
        assert_eq!(state.title.map(|t| t.id), Some(27205));
        assert!(state.is_playing);
        assert_eq!(
            state.trailer_url.as_deref(),
            Some("https://www.youtube.com/embed/YoHD9XEInc0?rel=0&modestbranding=1")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_end_preview_before_delay() {
        let rt = runtime(FakeProvider::default(), Arc::new(MemoryStore::new()));
        let title = sample(&rt).await;

        rt.preview(title);
        rt.end_preview();
        tokio::time::sleep(Duration::from_millis(1_000)).await;
        assert_eq!(rt.preview_state(), ActivePreview::default());
    }
}

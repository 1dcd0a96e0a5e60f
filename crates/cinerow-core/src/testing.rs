//! In-memory metadata provider for unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use cinerow_api::tmdb::types::{
    DetailsRecord, Genre, MediaRecord, TitleDetails, TmdbMovie, TmdbMovieDetails, TmdbSeason,
    TmdbShow, TmdbVideo,
};
use cinerow_api::{ListQuery, MediaKind, MetadataProvider, ProviderError};

#[derive(Debug, thiserror::Error)]
#[error("stub failure: {0}")]
pub struct StubError(pub String);

impl ProviderError for StubError {
    fn is_not_found(&self) -> bool {
        self.0.starts_with("no ")
    }
}

/// Canned provider responses plus call counters.
#[derive(Default)]
pub struct StubProvider {
    pub genres: Vec<Genre>,
    pub lists: HashMap<(ListQuery, MediaKind), Vec<MediaRecord>>,
    pub searches: HashMap<(String, MediaKind), Vec<MediaRecord>>,
    pub search_delays: HashMap<(String, MediaKind), Duration>,
    pub details: HashMap<(u64, MediaKind), TitleDetails>,
    pub seasons: HashMap<(u64, u32), TmdbSeason>,
    pub fail_lists: bool,
    pub fail_details: bool,
    pub fail_searches: HashMap<MediaKind, bool>,
    pub search_calls: AtomicUsize,
    pub genre_calls: AtomicUsize,
    pub searched: Mutex<Vec<String>>,
}

impl StubProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search(mut self, query: &str, kind: MediaKind, records: Vec<MediaRecord>) -> Self {
        self.searches.insert((query.to_string(), kind), records);
        self
    }

    pub fn with_search_delay(mut self, query: &str, kind: MediaKind, delay: Duration) -> Self {
        self.search_delays.insert((query.to_string(), kind), delay);
        self
    }

    pub fn with_list(mut self, query: ListQuery, kind: MediaKind, records: Vec<MediaRecord>) -> Self {
        self.lists.insert((query, kind), records);
        self
    }

    pub fn with_details(mut self, details: TitleDetails) -> Self {
        let key = match &details.record {
            DetailsRecord::Movie(m) => (m.id, MediaKind::Movie),
            DetailsRecord::Show(s) => (s.id, MediaKind::Series),
        };
        self.details.insert(key, details);
        self
    }

    pub fn search_calls(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }
}

impl MetadataProvider for StubProvider {
    type Error = StubError;

    async fn genres(&self, _kind: MediaKind) -> Result<Vec<Genre>, StubError> {
        self.genre_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.genres.clone())
    }

    async fn list(&self, query: ListQuery, kind: MediaKind) -> Result<Vec<MediaRecord>, StubError> {
        if self.fail_lists {
            return Err(StubError(format!("list {query:?} unavailable")));
        }
        Ok(self.lists.get(&(query, kind)).cloned().unwrap_or_default())
    }

    async fn details(&self, id: u64, kind: MediaKind) -> Result<TitleDetails, StubError> {
        if self.fail_details {
            return Err(StubError("details unavailable".into()));
        }
        self.details
            .get(&(id, kind))
            .cloned()
            .ok_or_else(|| StubError(format!("no details for {id}")))
    }

    async fn season(&self, series_id: u64, season_number: u32) -> Result<TmdbSeason, StubError> {
        self.seasons
            .get(&(series_id, season_number))
            .cloned()
            .ok_or_else(|| StubError(format!("no season {season_number} for {series_id}")))
    }

    async fn search(&self, query: &str, kind: MediaKind) -> Result<Vec<MediaRecord>, StubError> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut searched) = self.searched.lock() {
            searched.push(query.to_string());
        }

        let key = (query.to_string(), kind);
        if let Some(delay) = self.search_delays.get(&key) {
            tokio::time::sleep(*delay).await;
        }
        if self.fail_searches.get(&kind).copied().unwrap_or(false) {
            return Err(StubError(format!("search {kind} unavailable")));
        }
        Ok(self.searches.get(&key).cloned().unwrap_or_default())
    }

    async fn similar(&self, _id: u64, _kind: MediaKind) -> Result<Vec<MediaRecord>, StubError> {
        Ok(Vec::new())
    }
}

pub fn movie_record(id: u64, title: &str, vote_average: f64) -> MediaRecord {
    MediaRecord::Movie(TmdbMovie {
        id,
        title: title.to_string(),
        overview: Some(format!("About {title}")),
        backdrop_path: Some(format!("/{id}-backdrop.jpg")),
        poster_path: Some(format!("/{id}-poster.jpg")),
        vote_average,
        release_date: Some("2010-07-16".into()),
        genre_ids: vec![28],
        adult: false,
    })
}

pub fn show_record(id: u64, name: &str, vote_average: f64) -> MediaRecord {
    MediaRecord::Show(TmdbShow {
        id,
        name: name.to_string(),
        overview: Some(format!("About {name}")),
        backdrop_path: Some(format!("/{id}-backdrop.jpg")),
        poster_path: None,
        vote_average,
        first_air_date: Some("2011-04-17".into()),
        genre_ids: vec![18],
        origin_country: vec!["US".into()],
        number_of_seasons: Some(8),
    })
}

pub fn movie_details(id: u64, title: &str, trailer_key: Option<&str>) -> TitleDetails {
    TitleDetails {
        record: DetailsRecord::Movie(TmdbMovieDetails {
            id,
            title: title.to_string(),
            overview: Some(format!("About {title}")),
            backdrop_path: Some(format!("/{id}-backdrop.jpg")),
            poster_path: Some(format!("/{id}-poster.jpg")),
            vote_average: 8.4,
            release_date: Some("2010-07-16".into()),
            genres: vec![Genre {
                id: 28,
                name: "Action".into(),
            }],
            adult: false,
            runtime: Some(148),
        }),
        cast: Vec::new(),
        videos: trailer_key
            .map(|key| TmdbVideo {
                id: format!("v{id}"),
                key: key.to_string(),
                site: "YouTube".into(),
                video_type: "Trailer".into(),
                official: true,
            })
            .into_iter()
            .collect(),
    }
}

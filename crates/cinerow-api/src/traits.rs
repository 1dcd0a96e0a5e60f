//! Trait definitions for metadata providers.
//!
//! The catalog, search and preview layers only talk to a provider through
//! [`MetadataProvider`], so tests can swap in a stub and the TMDB client
//! stays an implementation detail.

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::tmdb::types::{Genre, MediaRecord, TitleDetails, TmdbSeason};

/// Whether a record is a movie or a series.
///
/// Serialized with the provider's path segment (`movie` / `tv`) so persisted
/// state stays readable by anything that speaks TMDB.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MediaKind {
    #[serde(rename = "movie")]
    Movie,
    #[serde(rename = "tv")]
    Series,
}

impl MediaKind {
    /// Path segment used by the TMDB REST API.
    pub fn as_path(self) -> &'static str {
        match self {
            Self::Movie => "movie",
            Self::Series => "tv",
        }
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Movie => write!(f, "Movie"),
            Self::Series => write!(f, "Series"),
        }
    }
}

/// A named list of titles offered by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListQuery {
    Trending,
    Popular,
    TopRated,
    /// Movies only.
    NowPlaying,
    /// Movies only.
    Upcoming,
    /// Series only.
    AiringToday,
    /// Most popular titles carrying the given genre id.
    Genre(u32),
}

impl ListQuery {
    /// Endpoint path for this list and media kind.
    pub fn endpoint(self, kind: MediaKind) -> String {
        let k = kind.as_path();
        match self {
            Self::Trending => format!("/trending/{k}/week"),
            Self::Popular => format!("/{k}/popular"),
            Self::TopRated => format!("/{k}/top_rated"),
            Self::NowPlaying => format!("/{k}/now_playing"),
            Self::Upcoming => format!("/{k}/upcoming"),
            Self::AiringToday => format!("/{k}/airing_today"),
            Self::Genre(_) => format!("/discover/{k}"),
        }
    }

    /// Extra query parameters for this list.
    pub fn params(self) -> Vec<(&'static str, String)> {
        match self {
            Self::Genre(id) => vec![
                ("with_genres", id.to_string()),
                ("sort_by", "popularity.desc".to_string()),
            ],
            _ => Vec::new(),
        }
    }
}

/// Errors a [`MetadataProvider`] can report.
pub trait ProviderError: std::error::Error + Send + Sync + 'static {
    /// True when the provider has no record for the requested title.
    fn is_not_found(&self) -> bool {
        false
    }
}

/// A source of catalog metadata.
pub trait MetadataProvider: Send + Sync {
    type Error: ProviderError;

    /// Fetch the genre taxonomy for a media kind.
    fn genres(
        &self,
        kind: MediaKind,
    ) -> impl Future<Output = Result<Vec<Genre>, Self::Error>> + Send;

    /// Fetch one page of a named list.
    fn list(
        &self,
        query: ListQuery,
        kind: MediaKind,
    ) -> impl Future<Output = Result<Vec<MediaRecord>, Self::Error>> + Send;

    /// Fetch the full record of a title together with its cast and videos.
    fn details(
        &self,
        id: u64,
        kind: MediaKind,
    ) -> impl Future<Output = Result<TitleDetails, Self::Error>> + Send;

    /// Fetch the episodes of one season of a series.
    fn season(
        &self,
        series_id: u64,
        season_number: u32,
    ) -> impl Future<Output = Result<TmdbSeason, Self::Error>> + Send;

    /// Free-text search within one media kind.
    fn search(
        &self,
        query: &str,
        kind: MediaKind,
    ) -> impl Future<Output = Result<Vec<MediaRecord>, Self::Error>> + Send;

    /// Titles the provider considers similar to the given one.
    fn similar(
        &self,
        id: u64,
        kind: MediaKind,
    ) -> impl Future<Output = Result<Vec<MediaRecord>, Self::Error>> + Send;
}

//! Browsable catalog pages built from provider lists.

use std::str::FromStr;
use std::sync::Arc;

use futures::future::try_join_all;
use serde::{Deserialize, Serialize};

use cinerow_api::{ListQuery, MediaKind, MetadataProvider, ProviderError};

use crate::error::CinerowError;
use crate::genres::GenreCache;
use crate::mapper::TitleMapper;
use crate::models::{Season, Title, TitleKey, TitleVariant};

/// A top-level browse page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CatalogPage {
    Home,
    Series,
    Movies,
    New,
    MyList,
}

impl CatalogPage {
    pub const ALL: [CatalogPage; 5] = [
        Self::Home,
        Self::Series,
        Self::Movies,
        Self::New,
        Self::MyList,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Home => "home",
            Self::Series => "series",
            Self::Movies => "movies",
            Self::New => "new",
            Self::MyList => "my-list",
        }
    }

    /// Provider rows shown on this page, lead row first.
    pub fn rows(self) -> &'static [RowSpec] {
        match self {
            Self::Home => HOME_ROWS,
            Self::Series => SERIES_ROWS,
            Self::Movies => MOVIES_ROWS,
            Self::New => NEW_ROWS,
            Self::MyList => &[],
        }
    }
}

impl std::fmt::Display for CatalogPage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CatalogPage {
    type Err = CinerowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| CinerowError::Invalid(format!("unknown page: {s}")))
    }
}

/// One provider-backed row of a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowSpec {
    pub id: &'static str,
    pub heading: &'static str,
    pub query: ListQuery,
    pub kind: MediaKind,
}

const fn row(id: &'static str, heading: &'static str, query: ListQuery, kind: MediaKind) -> RowSpec {
    RowSpec {
        id,
        heading,
        query,
        kind,
    }
}

use ListQuery::{AiringToday, Genre, NowPlaying, Popular, TopRated, Trending, Upcoming};
use MediaKind::{Movie, Series};

const HOME_ROWS: &[RowSpec] = &[
    row("trending", "Trending Now", Trending, Movie),
    row("popular", "Popular on Cinerow", Popular, Movie),
    row("top_rated", "Top Rated", TopRated, Movie),
    row("action", "Action Thrillers", Genre(28), Movie),
    row("comedy", "Comedies", Genre(35), Movie),
    row("horror", "Horror Movies", Genre(27), Movie),
    row("scifi", "Sci-Fi & Fantasy", Genre(878), Movie),
    row("romance", "Romance", Genre(10749), Movie),
];

const SERIES_ROWS: &[RowSpec] = &[
    row("tv_trending", "Trending TV Shows", Trending, Series),
    row("tv_popular", "Popular TV Shows", Popular, Series),
    row("tv_top", "Top Rated Shows", TopRated, Series),
    row("tv_drama", "Drama Series", Genre(18), Series),
    row("tv_crime", "Crime & Mystery", Genre(80), Series),
    row("tv_scifi", "Sci-Fi & Fantasy", Genre(10765), Series),
    row("tv_comedy", "Comedy Shows", Genre(35), Series),
    row("tv_reality", "Reality TV", Genre(10764), Series),
];

const MOVIES_ROWS: &[RowSpec] = &[
    row("mov_popular", "Popular Movies", Popular, Movie),
    row("mov_top", "Critically Acclaimed", TopRated, Movie),
    row("mov_action", "Action & Adventure", Genre(28), Movie),
    row("mov_thriller", "Thrillers", Genre(53), Movie),
    row("mov_scifi", "Sci-Fi", Genre(878), Movie),
    row("mov_romance", "Romance", Genre(10749), Movie),
    row("mov_animation", "Animation", Genre(16), Movie),
    row("mov_documentary", "Documentaries", Genre(99), Movie),
    row("mov_adventure", "Adventure", Genre(12), Movie),
    row("mov_mystery", "Mystery", Genre(9648), Movie),
];

const NEW_ROWS: &[RowSpec] = &[
    row("now_playing", "Now Playing in Theaters", NowPlaying, Movie),
    row("upcoming", "Coming Soon", Upcoming, Movie),
    row("trending_movies", "Trending Movies", Trending, Movie),
    row("trending_tv", "Trending TV Shows", Trending, Series),
    row("top_movies", "Top Rated Movies", TopRated, Movie),
    row("airing_today", "Airing Today", AiringToday, Series),
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogRow {
    pub id: String,
    pub heading: String,
    pub titles: Vec<Title>,
}

/// Rows of a page plus its featured (hero) title.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageContent {
    pub rows: Vec<CatalogRow>,
    pub featured: Option<Title>,
}

/// Loads pages and per-title detail from a [`MetadataProvider`].
pub struct Catalog<P> {
    provider: Arc<P>,
    genres: Arc<GenreCache>,
    mapper: TitleMapper,
}

impl<P: MetadataProvider> Catalog<P> {
    pub fn new(provider: Arc<P>, genres: Arc<GenreCache>, mapper: TitleMapper) -> Self {
        Self {
            provider,
            genres,
            mapper,
        }
    }

    pub fn mapper(&self) -> &TitleMapper {
        &self.mapper
    }

    /// Load every row of `page` concurrently.
    ///
    /// Never fails: if any row cannot be fetched the built-in sample rows
    /// are returned instead. The featured title is the detailed record of
    /// the lead row's first title, or its summary if details are unavailable.
    pub async fn load_page(&self, page: CatalogPage) -> PageContent {
        if page.rows().is_empty() {
            return PageContent::default();
        }

        let rows = match try_join_all(page.rows().iter().map(|def| self.fetch_row(def))).await {
            Ok(rows) => rows,
            Err(e) => {
                tracing::warn!(%page, error = %e, "catalog unavailable, showing sample rows");
                return fallback_content(&self.mapper);
            }
        };

        let featured = match rows.first().and_then(|r| r.titles.first()) {
            Some(lead) => Some(self.featured(lead).await),
            None => None,
        };

        tracing::debug!(%page, rows = rows.len(), "catalog page loaded");
        PageContent { rows, featured }
    }

    async fn fetch_row(&self, def: &RowSpec) -> Result<CatalogRow, P::Error> {
        let records = self.provider.list(def.query, def.kind).await?;
        let genres = self.genres.get(self.provider.as_ref(), def.kind).await;
        Ok(CatalogRow {
            id: def.id.to_string(),
            heading: def.heading.to_string(),
            titles: self.mapper.map_records(records, &genres),
        })
    }

    async fn featured(&self, lead: &Title) -> Title {
        match self.details(lead.key()).await {
            Ok(detailed) => detailed,
            Err(e) => {
                tracing::warn!(key = %lead.key(), error = %e, "featured details unavailable");
                lead.clone()
            }
        }
    }

    /// Full record for a title, with cast and trailer.
    pub async fn details(&self, key: TitleKey) -> Result<Title, CinerowError> {
        let details = self
            .provider
            .details(key.id, key.kind)
            .await
            .map_err(provider_error)?;
        Ok(self.mapper.map_details(details))
    }

    pub async fn season(&self, series_id: u64, number: u32) -> Result<Season, CinerowError> {
        let season = self
            .provider
            .season(series_id, number)
            .await
            .map_err(provider_error)?;
        Ok(self.mapper.map_season(season))
    }

    /// Titles similar to `key`, skipping records without artwork.
    pub async fn similar(&self, key: TitleKey) -> Result<Vec<Title>, CinerowError> {
        let records = self
            .provider
            .similar(key.id, key.kind)
            .await
            .map_err(provider_error)?;
        let genres = self.genres.get(self.provider.as_ref(), key.kind).await;
        Ok(records
            .into_iter()
            .filter(|r| r.has_image())
            .map(|r| self.mapper.map_record(r, &genres))
            .collect())
    }
}

fn provider_error<E: ProviderError>(e: E) -> CinerowError {
    if e.is_not_found() {
        CinerowError::NotFound(e.to_string())
    } else {
        CinerowError::Api(e.to_string())
    }
}

struct SampleFilm {
    id: u64,
    title: &'static str,
    description: &'static str,
    backdrop: &'static str,
    poster: &'static str,
    match_score: u8,
    rating: &'static str,
    duration: &'static str,
    genres: &'static [&'static str],
    year: i32,
}

const SAMPLE_FILMS: [SampleFilm; 6] = [
    SampleFilm {
        id: 550,
        title: "Fight Club",
        description: "A ticking time bomb of a movie that explodes with unexpected twists.",
        backdrop: "/hZkgoQYus5vegHoetLkCJzb17zJ.jpg",
        poster: "/pB8BM7pdSp6B6Ih7QZ4DrQ3PmJK.jpg",
        match_score: 84,
        rating: "R",
        duration: "2h 19m",
        genres: &["Drama", "Thriller"],
        year: 1999,
    },
    SampleFilm {
        id: 680,
        title: "Pulp Fiction",
        description: "The lives of two mob hitmen, a boxer, a gangster and his wife intertwine in four tales of violence and redemption.",
        backdrop: "/suaEOtk1N1sgg2MTM7oZd2cfVp3.jpg",
        poster: "/d5iIlFn5s0ImszYzBPb8JPIfbXD.jpg",
        match_score: 87,
        rating: "R",
        duration: "2h 34m",
        genres: &["Thriller", "Crime"],
        year: 1994,
    },
    SampleFilm {
        id: 238,
        title: "The Godfather",
        description: "The aging patriarch of an organized crime dynasty transfers control to his reluctant son.",
        backdrop: "/tmU7GeKVybMWFButWEGl2M4GeiP.jpg",
        poster: "/3bhkrj58Vtu7enYsRolD1fZdja1.jpg",
        match_score: 87,
        rating: "R",
        duration: "2h 55m",
        genres: &["Drama", "Crime"],
        year: 1972,
    },
    SampleFilm {
        id: 155,
        title: "The Dark Knight",
        description: "When the menace known as the Joker wreaks havoc on Gotham, Batman must accept one of the greatest tests.",
        backdrop: "/nMKdUUepR0i5zn0y1T4CsSB5chy.jpg",
        poster: "/qJ2tW6WMUDux911r6m7haRef0WH.jpg",
        match_score: 85,
        rating: "PG-13",
        duration: "2h 32m",
        genres: &["Action", "Crime", "Drama"],
        year: 2008,
    },
    SampleFilm {
        id: 27205,
        title: "Inception",
        description: "A thief who steals corporate secrets through dream-sharing technology is given the task of planting an idea.",
        backdrop: "/8ZTVqvKDQ8emSGUEMjsS4yHAwrp.jpg",
        poster: "/edv5CZvWj09upOsy2Y6IwDhK8bt.jpg",
        match_score: 84,
        rating: "PG-13",
        duration: "2h 28m",
        genres: &["Action", "Sci-Fi", "Adventure"],
        year: 2010,
    },
    SampleFilm {
        id: 278,
        title: "The Shawshank Redemption",
        description: "Two imprisoned men bond over a number of years, finding solace and eventual redemption through acts of common decency.",
        backdrop: "/kXfqcdQKsToO0OUXHcrrNCHDBzO.jpg",
        poster: "/q6y0Go1tsGEsmtFryDOJo3dEmqu.jpg",
        match_score: 87,
        rating: "R",
        duration: "2h 22m",
        genres: &["Drama", "Crime"],
        year: 1994,
    },
];

/// The built-in sample titles, in display order.
pub fn sample_titles(mapper: &TitleMapper) -> Vec<Title> {
    let rules = mapper.rules();
    SAMPLE_FILMS
        .iter()
        .map(|f| Title {
            id: f.id,
            name: f.title.to_string(),
            description: f.description.to_string(),
            backdrop_url: format!("{}{}", rules.image_base, f.backdrop),
            poster_url: format!("{}{}", rules.image_small, f.poster),
            match_score: f.match_score,
            rating: f.rating.to_string(),
            duration: f.duration.to_string(),
            genres: f.genres.iter().map(|g| g.to_string()).collect(),
            year: f.year,
            cast: None,
            trailer_url: None,
            variant: TitleVariant::Movie,
        })
        .collect()
}

/// Three rows over the sample titles, featuring the first one.
pub fn fallback_content(mapper: &TitleMapper) -> PageContent {
    let samples = sample_titles(mapper);
    let reversed: Vec<Title> = samples.iter().rev().cloned().collect();

    let rows = vec![
        CatalogRow {
            id: "trending".into(),
            heading: "Trending Now".into(),
            titles: samples.clone(),
        },
        CatalogRow {
            id: "popular".into(),
            heading: "Popular on Cinerow".into(),
            titles: reversed,
        },
        CatalogRow {
            id: "top_rated".into(),
            heading: "Critically Acclaimed".into(),
            titles: samples[2..].to_vec(),
        },
    ];

    PageContent {
        featured: samples.into_iter().next(),
        rows,
    }
}

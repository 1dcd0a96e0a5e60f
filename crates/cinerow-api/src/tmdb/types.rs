use serde::Deserialize;

use crate::traits::MediaKind;

// ── Paged list responses ─────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct PagedResponse<T> {
    #[serde(default)]
    pub page: u32,
    pub results: Vec<T>,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub total_results: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenreList {
    pub genres: Vec<Genre>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Genre {
    pub id: u32,
    pub name: String,
}

// ── Summary records ──────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct TmdbMovie {
    pub id: u64,
    pub title: String,
    pub overview: Option<String>,
    pub backdrop_path: Option<String>,
    pub poster_path: Option<String>,
    #[serde(default)]
    pub vote_average: f64,
    pub release_date: Option<String>,
    #[serde(default)]
    pub genre_ids: Vec<u32>,
    #[serde(default)]
    pub adult: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TmdbShow {
    pub id: u64,
    pub name: String,
    pub overview: Option<String>,
    pub backdrop_path: Option<String>,
    pub poster_path: Option<String>,
    #[serde(default)]
    pub vote_average: f64,
    pub first_air_date: Option<String>,
    #[serde(default)]
    pub genre_ids: Vec<u32>,
    #[serde(default)]
    pub origin_country: Vec<String>,
    pub number_of_seasons: Option<u32>,
}

/// A summary record as returned by list and search endpoints.
#[derive(Debug, Clone)]
pub enum MediaRecord {
    Movie(TmdbMovie),
    Show(TmdbShow),
}

impl MediaRecord {
    pub fn id(&self) -> u64 {
        match self {
            Self::Movie(m) => m.id,
            Self::Show(s) => s.id,
        }
    }

    pub fn kind(&self) -> MediaKind {
        match self {
            Self::Movie(_) => MediaKind::Movie,
            Self::Show(_) => MediaKind::Series,
        }
    }

    /// True when the record carries a non-empty backdrop or poster path.
    pub fn has_image(&self) -> bool {
        let (backdrop, poster) = match self {
            Self::Movie(m) => (&m.backdrop_path, &m.poster_path),
            Self::Show(s) => (&s.backdrop_path, &s.poster_path),
        };
        let present = |p: &Option<String>| matches!(p, Some(s) if !s.is_empty());
        present(backdrop) || present(poster)
    }
}

// ── Detail records ───────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct TmdbMovieDetails {
    pub id: u64,
    pub title: String,
    pub overview: Option<String>,
    pub backdrop_path: Option<String>,
    pub poster_path: Option<String>,
    #[serde(default)]
    pub vote_average: f64,
    pub release_date: Option<String>,
    #[serde(default)]
    pub genres: Vec<Genre>,
    #[serde(default)]
    pub adult: bool,
    pub runtime: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TmdbShowDetails {
    pub id: u64,
    pub name: String,
    pub overview: Option<String>,
    pub backdrop_path: Option<String>,
    pub poster_path: Option<String>,
    #[serde(default)]
    pub vote_average: f64,
    pub first_air_date: Option<String>,
    #[serde(default)]
    pub genres: Vec<Genre>,
    pub number_of_seasons: Option<u32>,
}

#[derive(Debug, Clone)]
pub enum DetailsRecord {
    Movie(TmdbMovieDetails),
    Show(TmdbShowDetails),
}

#[derive(Debug, Clone, Deserialize)]
pub struct Credits {
    #[serde(default)]
    pub cast: Vec<TmdbCastMember>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TmdbCastMember {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub character: Option<String>,
    pub profile_path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VideoList {
    #[serde(default)]
    pub results: Vec<TmdbVideo>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TmdbVideo {
    pub id: String,
    pub key: String,
    pub site: String,
    #[serde(rename = "type")]
    pub video_type: String,
    #[serde(default)]
    pub official: bool,
}

impl TmdbVideo {
    pub fn is_youtube(&self) -> bool {
        self.site == "YouTube"
    }

    pub fn is_trailer(&self) -> bool {
        self.video_type == "Trailer"
    }
}

/// Detail record plus the credits and videos fetched alongside it.
#[derive(Debug, Clone)]
pub struct TitleDetails {
    pub record: DetailsRecord,
    pub cast: Vec<TmdbCastMember>,
    pub videos: Vec<TmdbVideo>,
}

impl TitleDetails {
    /// Best trailer candidate: a YouTube trailer, else any YouTube video.
    pub fn trailer(&self) -> Option<&TmdbVideo> {
        self.videos
            .iter()
            .find(|v| v.is_trailer() && v.is_youtube())
            .or_else(|| self.videos.iter().find(|v| v.is_youtube()))
    }
}

// ── Seasons ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct TmdbSeason {
    pub season_number: u32,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub episodes: Vec<TmdbEpisode>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TmdbEpisode {
    pub id: u64,
    pub name: String,
    pub overview: Option<String>,
    pub episode_number: u32,
    pub season_number: u32,
    pub still_path: Option<String>,
    pub air_date: Option<String>,
    pub runtime: Option<u32>,
}

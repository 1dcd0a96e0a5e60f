//! Provider records → uniform [`Title`].
//!
//! The score and rating heuristics are plain rules in [`MappingRules`] rather
//! than constants; they do not reflect any rating board.

use chrono::Datelike;
use serde::{Deserialize, Serialize};

use cinerow_api::tmdb::types::{
    DetailsRecord, MediaRecord, TitleDetails, TmdbCastMember, TmdbMovie, TmdbSeason, TmdbShow,
};

use crate::genres::GenreMap;
use crate::models::{CastMember, Episode, Season, Title, TitleVariant};

/// Tunable rules applied when normalizing provider records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MappingRules {
    /// Multiplier from the provider's 0–10 vote average to a 0–100 score.
    pub match_scale: f64,
    pub adult_rating: String,
    pub default_movie_rating: String,
    pub series_rating: String,
    pub default_movie_duration: String,
    /// Genres kept on summary records.
    pub max_genres: usize,
    /// Cast members kept on detail records.
    pub max_cast: usize,
    pub image_base: String,
    pub image_small: String,
    pub fallback_backdrop: String,
    pub fallback_poster: String,
    pub trailer_embed_base: String,
}

impl Default for MappingRules {
    fn default() -> Self {
        Self {
            match_scale: 10.0,
            adult_rating: "R".into(),
            default_movie_rating: "PG-13".into(),
            series_rating: "TV-MA".into(),
            default_movie_duration: "1h 45m".into(),
            max_genres: 3,
            max_cast: 10,
            image_base: "https://image.tmdb.org/t/p/original".into(),
            image_small: "https://image.tmdb.org/t/p/w500".into(),
            fallback_backdrop: "https://images.unsplash.com/photo-1489599849927-2ee91cede3ba?auto=format&fit=crop&w=1920&q=80".into(),
            fallback_poster: "https://images.unsplash.com/photo-1594909122845-11baa439b7bf?auto=format&fit=crop&w=500&q=80".into(),
            trailer_embed_base: "https://www.youtube.com/embed".into(),
        }
    }
}

/// Maps provider-native records to [`Title`] according to [`MappingRules`].
#[derive(Debug, Clone, Default)]
pub struct TitleMapper {
    rules: MappingRules,
}

impl TitleMapper {
    pub fn new(rules: MappingRules) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &MappingRules {
        &self.rules
    }

    /// Map a summary record from a list or search endpoint.
    pub fn map_record(&self, record: MediaRecord, genres: &GenreMap) -> Title {
        match record {
            MediaRecord::Movie(movie) => self.map_movie(movie, genres),
            MediaRecord::Show(show) => self.map_show(show, genres),
        }
    }

    pub fn map_records(&self, records: Vec<MediaRecord>, genres: &GenreMap) -> Vec<Title> {
        records
            .into_iter()
            .map(|r| self.map_record(r, genres))
            .collect()
    }

    fn map_movie(&self, movie: TmdbMovie, genres: &GenreMap) -> Title {
        let r = &self.rules;
        Title {
            id: movie.id,
            name: movie.title,
            description: movie.overview.unwrap_or_default(),
            backdrop_url: image_or(&r.image_base, movie.backdrop_path, &r.fallback_backdrop),
            poster_url: image_or(&r.image_small, movie.poster_path, &r.fallback_poster),
            match_score: self.match_score(movie.vote_average),
            rating: self.movie_rating(movie.adult),
            duration: r.default_movie_duration.clone(),
            genres: self.genre_names(&movie.genre_ids, genres),
            year: release_year(movie.release_date.as_deref()),
            cast: None,
            trailer_url: None,
            variant: TitleVariant::Movie,
        }
    }

    fn map_show(&self, show: TmdbShow, genres: &GenreMap) -> Title {
        let r = &self.rules;
        Title {
            id: show.id,
            name: show.name,
            description: show.overview.unwrap_or_default(),
            backdrop_url: image_or(&r.image_base, show.backdrop_path, &r.fallback_backdrop),
            poster_url: image_or(&r.image_small, show.poster_path, &r.fallback_poster),
            match_score: self.match_score(show.vote_average),
            rating: r.series_rating.clone(),
            duration: show
                .number_of_seasons
                .map(season_label)
                .unwrap_or_else(|| "Series".to_string()),
            genres: self.genre_names(&show.genre_ids, genres),
            year: release_year(show.first_air_date.as_deref()),
            cast: None,
            trailer_url: None,
            variant: TitleVariant::Series {
                season_count: show.number_of_seasons,
            },
        }
    }

    /// Map a detail record with its cast and trailer.
    pub fn map_details(&self, details: TitleDetails) -> Title {
        let r = &self.rules;
        let trailer_url = details
            .trailer()
            .map(|v| format!("{}/{}?rel=0&modestbranding=1", r.trailer_embed_base, v.key));
        let cast = Some(
            details
                .cast
                .into_iter()
                .take(r.max_cast)
                .map(|c| self.map_cast(c))
                .collect(),
        );

        match details.record {
            DetailsRecord::Movie(m) => Title {
                id: m.id,
                name: m.title,
                description: m.overview.unwrap_or_default(),
                backdrop_url: image_or(&r.image_base, m.backdrop_path, ""),
                poster_url: image_or(&r.image_small, m.poster_path, ""),
                match_score: self.match_score(m.vote_average),
                rating: self.movie_rating(m.adult),
                duration: m
                    .runtime
                    .filter(|&mins| mins > 0)
                    .map(format_runtime)
                    .unwrap_or_else(|| r.default_movie_duration.clone()),
                genres: m.genres.into_iter().map(|g| g.name).collect(),
                year: release_year(m.release_date.as_deref()),
                cast,
                trailer_url,
                variant: TitleVariant::Movie,
            },
            DetailsRecord::Show(s) => {
                let seasons = s.number_of_seasons.filter(|&n| n > 0).unwrap_or(1);
                Title {
                    id: s.id,
                    name: s.name,
                    description: s.overview.unwrap_or_default(),
                    backdrop_url: image_or(&r.image_base, s.backdrop_path, ""),
                    poster_url: image_or(&r.image_small, s.poster_path, ""),
                    match_score: self.match_score(s.vote_average),
                    rating: r.series_rating.clone(),
                    duration: season_label(seasons),
                    genres: s.genres.into_iter().map(|g| g.name).collect(),
                    year: release_year(s.first_air_date.as_deref()),
                    cast,
                    trailer_url,
                    variant: TitleVariant::Series {
                        season_count: Some(seasons),
                    },
                }
            }
        }
    }

    pub fn map_season(&self, season: TmdbSeason) -> Season {
        let small = &self.rules.image_small;
        Season {
            season_number: season.season_number,
            name: season.name,
            episodes: season
                .episodes
                .into_iter()
                .map(|ep| Episode {
                    id: ep.id,
                    name: ep.name,
                    overview: ep.overview.unwrap_or_default(),
                    episode_number: ep.episode_number,
                    season_number: ep.season_number,
                    still_url: ep.still_path.map(|p| format!("{small}{p}")),
                    air_date: ep.air_date.unwrap_or_default(),
                    runtime: ep.runtime.filter(|&r| r > 0),
                })
                .collect(),
        }
    }

    fn map_cast(&self, member: TmdbCastMember) -> CastMember {
        CastMember {
            id: member.id,
            name: member.name,
            character: member.character.unwrap_or_default(),
            profile_url: member
                .profile_path
                .map(|p| format!("{}{p}", self.rules.image_small)),
        }
    }

    fn match_score(&self, vote_average: f64) -> u8 {
        (vote_average * self.rules.match_scale).round().clamp(0.0, 100.0) as u8
    }

    fn movie_rating(&self, adult: bool) -> String {
        if adult {
            self.rules.adult_rating.clone()
        } else {
            self.rules.default_movie_rating.clone()
        }
    }

    fn genre_names(&self, ids: &[u32], genres: &GenreMap) -> Vec<String> {
        ids.iter()
            .filter_map(|id| genres.get(id).cloned())
            .take(self.rules.max_genres)
            .collect()
    }
}

fn image_or(base: &str, path: Option<String>, fallback: &str) -> String {
    match path {
        Some(p) if !p.is_empty() => format!("{base}{p}"),
        _ => fallback.to_string(),
    }
}

fn season_label(count: u32) -> String {
    if count == 1 {
        "1 Season".to_string()
    } else {
        format!("{count} Seasons")
    }
}

fn format_runtime(minutes: u32) -> String {
    format!("{}h {}m", minutes / 60, minutes % 60)
}

/// Year from a `YYYY-MM-DD` date, or the current year when absent.
fn release_year(date: Option<&str>) -> i32 {
    date.and_then(|d| d.get(..4))
        .and_then(|y| y.parse().ok())
        .unwrap_or_else(|| chrono::Utc::now().year())
}

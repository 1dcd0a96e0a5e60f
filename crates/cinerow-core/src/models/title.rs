use serde::{Deserialize, Serialize};

use cinerow_api::MediaKind;

/// The unique key of a title: provider id plus media kind.
///
/// A movie and a series may share a numeric id, so the id alone is not enough.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TitleKey {
    pub id: u64,
    pub kind: MediaKind,
}

impl TitleKey {
    pub fn new(id: u64, kind: MediaKind) -> Self {
        Self { id, kind }
    }

    pub fn movie(id: u64) -> Self {
        Self::new(id, MediaKind::Movie)
    }

    pub fn series(id: u64) -> Self {
        Self::new(id, MediaKind::Series)
    }
}

impl std::fmt::Display for TitleKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.kind.as_path(), self.id)
    }
}

/// A credited cast member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CastMember {
    pub id: u64,
    pub name: String,
    pub character: String,
    pub profile_url: Option<String>,
}

/// Fields that only exist for one kind of title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mediaType")]
pub enum TitleVariant {
    #[serde(rename = "movie")]
    Movie,
    #[serde(rename = "tv")]
    Series {
        #[serde(rename = "seasonCount", default)]
        season_count: Option<u32>,
    },
}

/// A normalized catalog entry, either a movie or a series.
///
/// Built once from provider data and never mutated; a detail fetch yields a
/// new, richer `Title` that supersedes the summary one for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Title {
    pub id: u64,
    #[serde(rename = "title")]
    pub name: String,
    pub description: String,
    pub backdrop_url: String,
    pub poster_url: String,
    /// Normalized 0–100 match score.
    #[serde(rename = "match")]
    pub match_score: u8,
    pub rating: String,
    pub duration: String,
    pub genres: Vec<String>,
    pub year: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cast: Option<Vec<CastMember>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trailer_url: Option<String>,
    #[serde(flatten)]
    pub variant: TitleVariant,
}

impl Title {
    pub fn key(&self) -> TitleKey {
        TitleKey::new(self.id, self.kind())
    }

    pub fn kind(&self) -> MediaKind {
        match self.variant {
            TitleVariant::Movie => MediaKind::Movie,
            TitleVariant::Series { .. } => MediaKind::Series,
        }
    }

    pub fn is_series(&self) -> bool {
        matches!(self.variant, TitleVariant::Series { .. })
    }

    /// Number of seasons, for series that report one.
    pub fn season_count(&self) -> Option<u32> {
        match self.variant {
            TitleVariant::Movie => None,
            TitleVariant::Series { season_count } => season_count,
        }
    }
}

use serde::{Deserialize, Serialize};

/// One episode of a series season.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Episode {
    pub id: u64,
    pub name: String,
    pub overview: String,
    pub episode_number: u32,
    pub season_number: u32,
    pub still_url: Option<String>,
    pub air_date: String,
    pub runtime: Option<u32>,
}

/// The episodes of one season, fetched lazily and never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Season {
    pub season_number: u32,
    pub name: String,
    pub episodes: Vec<Episode>,
}

impl Season {
    pub fn episode(&self, number: u32) -> Option<&Episode> {
        self.episodes.iter().find(|e| e.episode_number == number)
    }
}

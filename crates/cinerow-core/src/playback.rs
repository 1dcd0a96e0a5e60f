use serde::{Deserialize, Serialize};
use url::Url;

use cinerow_api::MediaKind;

/// How a playback URL is meant to be consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    YouTube,
    Embed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackSource {
    pub url: String,
    pub kind: SourceKind,
}

/// Builds embed URLs for the external playback provider.
///
/// Resolution never touches the network and always succeeds structurally;
/// the only empty result is for a title with no upstream id.
#[derive(Debug, Clone)]
pub struct PlaybackResolver {
    embed_base: String,
}

impl PlaybackResolver {
    pub fn new(embed_base: impl Into<String>) -> Self {
        Self {
            embed_base: embed_base.into().trim_end_matches('/').to_string(),
        }
    }

    /// Resolve a playable source. Series default to season 1, episode 1.
    pub fn resolve(
        &self,
        id: Option<u64>,
        kind: MediaKind,
        season: Option<u32>,
        episode: Option<u32>,
    ) -> Option<PlaybackSource> {
        let id = id?.to_string();

        let url = match kind {
            MediaKind::Movie => {
                let mut url = self.endpoint("movie")?;
                url.query_pairs_mut().append_pair("tmdb", &id);
                url
            }
            MediaKind::Series => {
                let mut url = self.endpoint("tv")?;
                url.query_pairs_mut()
                    .append_pair("tmdb", &id)
                    .append_pair("season", &season.unwrap_or(1).to_string())
                    .append_pair("episode", &episode.unwrap_or(1).to_string());
                url
            }
        };

        Some(PlaybackSource {
            url: url.into(),
            kind: SourceKind::Embed,
        })
    }

    /// Wrap a trailer reference for the YouTube player.
    pub fn trailer_source(&self, trailer_url: &str) -> PlaybackSource {
        PlaybackSource {
            url: trailer_url.to_string(),
            kind: SourceKind::YouTube,
        }
    }

    fn endpoint(&self, segment: &str) -> Option<Url> {
        Url::parse(&format!("{}/{segment}", self.embed_base))
            .map_err(|e| tracing::error!(base = %self.embed_base, error = %e, "invalid embed base URL"))
            .ok()
    }
}

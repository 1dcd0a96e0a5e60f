use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::OnceCell;

use cinerow_api::tmdb::types::Genre;
use cinerow_api::{MediaKind, MetadataProvider};

/// Genre id → display name.
pub type GenreMap = HashMap<u32, String>;

pub fn genre_map(genres: Vec<Genre>) -> GenreMap {
    genres.into_iter().map(|g| (g.id, g.name)).collect()
}

/// Genre taxonomy per media kind, fetched on first use.
///
/// A failed fetch yields an empty map and is not cached, so the next caller
/// tries again.
#[derive(Debug, Default)]
pub struct GenreCache {
    movie: OnceCell<Arc<GenreMap>>,
    series: OnceCell<Arc<GenreMap>>,
}

impl GenreCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get<P: MetadataProvider>(&self, provider: &P, kind: MediaKind) -> Arc<GenreMap> {
        let cell = match kind {
            MediaKind::Movie => &self.movie,
            MediaKind::Series => &self.series,
        };

        let fetched = cell
            .get_or_try_init(|| async {
                provider
                    .genres(kind)
                    .await
                    .map(|g| Arc::new(genre_map(g)))
            })
            .await;

        match fetched {
            Ok(map) => map.clone(),
            Err(e) => {
                tracing::warn!(%kind, error = %e, "genre taxonomy unavailable");
                Arc::new(GenreMap::new())
            }
        }
    }
}

use reqwest::Client;
use serde::de::DeserializeOwned;

use super::error::TmdbError;
use super::types::{
    Credits, DetailsRecord, Genre, GenreList, MediaRecord, PagedResponse, TitleDetails,
    TmdbMovie, TmdbMovieDetails, TmdbSeason, TmdbShow, TmdbShowDetails, VideoList,
};
use crate::traits::{ListQuery, MediaKind, MetadataProvider};

pub const DEFAULT_BASE_URL: &str = "https://api.themoviedb.org/3";
const DEFAULT_LANGUAGE: &str = "en-US";

/// TMDB v3 REST client authenticated with a v3 API key.
pub struct TmdbClient {
    api_key: String,
    base_url: String,
    language: String,
    http: Client,
}

impl TmdbClient {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            language: DEFAULT_LANGUAGE.to_string(),
            http: Client::new(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Check the HTTP response for errors and return the body text on failure.
    async fn check_response(resp: reqwest::Response) -> Result<reqwest::Response, TmdbError> {
        if resp.status().is_success() {
            Ok(resp)
        } else {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            tracing::warn!(status, "TMDB API error");
            Err(TmdbError::Api {
                status,
                message: body,
            })
        }
    }

    /// GET an endpoint with the credential and language parameters attached.
    async fn get<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> Result<T, TmdbError> {
        let mut query: Vec<(&str, String)> = vec![
            ("api_key", self.api_key.clone()),
            ("language", self.language.clone()),
        ];
        query.extend(params.iter().cloned());

        tracing::debug!(endpoint, "TMDB request");
        let resp = self
            .http
            .get(format!("{}{endpoint}", self.base_url))
            .query(&query)
            .send()
            .await?;

        let resp = Self::check_response(resp).await?;
        resp.json()
            .await
            .map_err(|e| TmdbError::Parse(e.to_string()))
    }

    /// Fetch a paged list endpoint and wrap each result for the given kind.
    async fn get_records(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
        kind: MediaKind,
    ) -> Result<Vec<MediaRecord>, TmdbError> {
        match kind {
            MediaKind::Movie => {
                let page: PagedResponse<TmdbMovie> = self.get(endpoint, params).await?;
                Ok(page.results.into_iter().map(MediaRecord::Movie).collect())
            }
            MediaKind::Series => {
                let page: PagedResponse<TmdbShow> = self.get(endpoint, params).await?;
                Ok(page.results.into_iter().map(MediaRecord::Show).collect())
            }
        }
    }
}

impl MetadataProvider for TmdbClient {
    type Error = TmdbError;

    async fn genres(&self, kind: MediaKind) -> Result<Vec<Genre>, TmdbError> {
        let list: GenreList = self
            .get(&format!("/genre/{}/list", kind.as_path()), &[])
            .await?;
        Ok(list.genres)
    }

    async fn list(&self, query: ListQuery, kind: MediaKind) -> Result<Vec<MediaRecord>, TmdbError> {
        self.get_records(&query.endpoint(kind), &query.params(), kind)
            .await
    }

    async fn details(&self, id: u64, kind: MediaKind) -> Result<TitleDetails, TmdbError> {
        let base = format!("/{}/{id}", kind.as_path());
        let credits_path = format!("{base}/credits");
        let videos_path = format!("{base}/videos");

        let record = async {
            match kind {
                MediaKind::Movie => self
                    .get::<TmdbMovieDetails>(&base, &[])
                    .await
                    .map(DetailsRecord::Movie),
                MediaKind::Series => self
                    .get::<TmdbShowDetails>(&base, &[])
                    .await
                    .map(DetailsRecord::Show),
            }
        };

        let (record, credits, videos) = tokio::try_join!(
            record,
            self.get::<Credits>(&credits_path, &[]),
            self.get::<VideoList>(&videos_path, &[]),
        )?;

        Ok(TitleDetails {
            record,
            cast: credits.cast,
            videos: videos.results,
        })
    }

    async fn season(&self, series_id: u64, season_number: u32) -> Result<TmdbSeason, TmdbError> {
        self.get(&format!("/tv/{series_id}/season/{season_number}"), &[])
            .await
    }

    async fn search(&self, query: &str, kind: MediaKind) -> Result<Vec<MediaRecord>, TmdbError> {
        if query.is_empty() {
            return Ok(Vec::new());
        }
        self.get_records(
            &format!("/search/{}", kind.as_path()),
            &[("query", query.to_string())],
            kind,
        )
        .await
    }

    async fn similar(&self, id: u64, kind: MediaKind) -> Result<Vec<MediaRecord>, TmdbError> {
        self.get_records(&format!("/{}/{id}/similar", kind.as_path()), &[], kind)
            .await
    }
}

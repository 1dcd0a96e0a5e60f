use thiserror::Error;

use crate::traits::ProviderError;

/// Errors from the TMDB API client.
#[derive(Debug, Error)]
pub enum TmdbError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("parse error: {0}")]
    Parse(String),
}

impl ProviderError for TmdbError {
    fn is_not_found(&self) -> bool {
        matches!(self, Self::Api { status: 404, .. })
    }
}

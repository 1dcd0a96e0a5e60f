//! Metadata provider access for cinerow.
//!
//! Provider-native records are returned as-is; mapping them to the uniform
//! catalog model is the job of `cinerow-core`.

pub mod tmdb;
pub mod traits;

pub use tmdb::{TmdbClient, TmdbError};
pub use traits::{ListQuery, MediaKind, MetadataProvider, ProviderError};

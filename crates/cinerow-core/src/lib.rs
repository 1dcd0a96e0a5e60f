pub mod catalog;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod favorites;
pub mod genres;
pub mod history;
pub mod mapper;
pub mod models;
pub mod playback;
pub mod search;
pub mod storage;

#[cfg(test)]
pub(crate) mod testing;

pub use cinerow_api::{ListQuery, MediaKind, MetadataProvider};

//! Catalog access: search, result classification, and album resolution.
//!
//! This module provides:
//! - A search client for the public catalog endpoint
//! - Classified search results (tracks, albums, playlists)
//! - Key normalization for fuzzy metadata matching
//! - Album track-listing reconstruction

pub mod albums;
pub mod api;
pub mod models;
pub mod normalize;

pub use api::CatalogClient;
pub use models::{SearchItem, SearchScope, Track};

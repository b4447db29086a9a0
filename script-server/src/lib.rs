//! Script backend - in-memory REST API for song-lyric scripts
//!
//! Serves list/get/create/patch/delete over `/scripts/` plus the
//! `/import-url` convenience endpoint.

pub mod api;
pub mod app_state;
pub mod config;
pub mod import;

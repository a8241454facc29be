//! Tilawa - Quran recitation downloader and video renderer
//!
//! Fetches per-verse recitation audio from a public archive and renders it,
//! together with the Quran script and a translation, into a narrated video
//! using ffmpeg.

pub mod align;
pub mod background;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod error;
pub mod fetch;
pub mod media;
pub mod overlay;
pub mod timeline;
pub mod workflow;

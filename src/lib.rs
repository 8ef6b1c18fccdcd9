//! # Mixtape Server Library
//!
//! A multi-user music sharing service over line-delimited JSON on TCP.
//!
//! **Purpose:** Maintain user accounts, per-user music libraries and
//! playlists, and a curated server catalog; let users like, upload,
//! download, and share tracks and playlists with each other.
//!
//! **Architecture:** One async accept loop feeding a bounded pool of
//! session tasks; all shared state behind a single store lock with
//! full-snapshot JSON persistence after every mutation.

pub mod config;
pub mod dispatch;
pub mod error;
pub mod ids;
pub mod media;
pub mod metadata;
pub mod model;
pub mod persist;
pub mod protocol;
pub mod seed;
pub mod server;
pub mod store;

pub use error::{Error, Result};

//! Error types for the mixtape service

use thiserror::Error;

/// Common result type for mixtape operations
pub type Result<T> = std::result::Result<T, Error>;

/// Infrastructure errors: I/O, serialization, configuration
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding or decoding error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed base64 payload in a request
    #[error("Invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),
}

/// Business-rule rejections. The display strings are the protocol's
/// error messages and must stay stable; clients match on them.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("User not found")]
    UserNotFound,

    #[error("Email already exists")]
    EmailExists,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Update failed")]
    UpdateFailed,

    #[error("Music not found")]
    MusicNotFound,

    #[error("Music already liked")]
    AlreadyLiked,

    #[error("Music not liked")]
    NotLiked,

    #[error("This song already exists in your library")]
    SongAlreadyInLibrary,

    #[error("Music already in user's music list")]
    MusicAlreadyInList,

    #[error("User or music not found")]
    UserOrMusicNotFound,

    #[error("Music not found in user's list")]
    MusicNotInUserList,

    #[error("User, target user, or music not found")]
    ShareMusicNotFound,

    #[error("Target user has disabled sharing")]
    SharingDisabled,

    #[error("Playlist, user, or target user not found, or user is not the creator")]
    SharePlaylistNotFound,

    #[error("Playlist name already exists for this user")]
    PlaylistNameExists,

    #[error("User or playlist not found, or user is not the creator")]
    UserOrPlaylistNotFound,

    #[error("Music already in playlist")]
    MusicAlreadyInPlaylist,

    #[error("Music not found in playlist")]
    MusicNotInPlaylist,

    #[error("Music file not found on server")]
    MusicFileMissing,

    #[error("Error reading music file: {0}")]
    MusicFileRead(String),
}

/// Outcome of a store command. A command either hits a business rule or
/// fails to reach the durable document; in the latter case the in-memory
/// state is left untouched and the caller sees a persistence error.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Failed to save data")]
    Persist(#[source] Error),
}

impl From<Error> for StoreError {
    fn from(err: Error) -> Self {
        StoreError::Persist(err)
    }
}

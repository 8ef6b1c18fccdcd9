//! Media file handling: audio payloads and cover sidecars
//!
//! Audio files are stored flat in the music directory under a name
//! derived from the track title. A cover image for a track lives next to
//! it as `<title>-cover.jpg`. Payloads cross the wire as base64 text.

use crate::error::{DomainError, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use std::path::Path;
use tracing::warn;

/// Derived file names must stay inside the music directory even when the
/// client-supplied title contains separators.
fn safe_stem(title: &str) -> String {
    title.trim().replace(['/', '\\'], "_")
}

pub fn audio_file_name(title: &str) -> String {
    format!("{}.mp3", safe_stem(title))
}

pub fn cover_file_name(title: &str) -> String {
    format!("{}-cover.jpg", safe_stem(title))
}

/// Decodes a base64 payload and writes it under the music directory.
pub async fn write_payload(music_dir: &Path, file_name: &str, base64_body: &str) -> Result<()> {
    let bytes = BASE64.decode(base64_body)?;
    tokio::fs::create_dir_all(music_dir).await?;
    tokio::fs::write(music_dir.join(file_name), bytes).await?;
    Ok(())
}

/// Returns the base64-encoded cover for a track title, if the sidecar
/// file exists. Read failures are logged and treated as "no cover".
pub async fn load_cover(music_dir: &Path, title: &str) -> Option<String> {
    let path = music_dir.join(cover_file_name(title));
    match tokio::fs::read(&path).await {
        Ok(bytes) => Some(BASE64.encode(bytes)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
        Err(e) => {
            warn!(path = ?path, "could not read cover file: {e}");
            None
        }
    }
}

/// Reads a stored audio file as base64 for download. A missing file and
/// an unreadable file are distinct protocol errors.
pub async fn load_audio(music_dir: &Path, file_path: &str) -> std::result::Result<String, DomainError> {
    let path = music_dir.join(file_path);
    match tokio::fs::try_exists(&path).await {
        Ok(true) => {}
        _ => return Err(DomainError::MusicFileMissing),
    }
    match tokio::fs::read(&path).await {
        Ok(bytes) => Ok(BASE64.encode(bytes)),
        Err(e) => Err(DomainError::MusicFileRead(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_names_cannot_escape_the_music_dir() {
        assert_eq!(audio_file_name("Song A"), "Song A.mp3");
        assert_eq!(audio_file_name("../../etc/passwd"), ".._.._etc_passwd.mp3");
        assert_eq!(cover_file_name(" Song A "), "Song A-cover.jpg");
    }

    #[tokio::test]
    async fn payload_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let body = BASE64.encode(b"audio-bytes");
        write_payload(dir.path(), "Song A.mp3", &body).await.unwrap();
        let loaded = load_audio(dir.path(), "Song A.mp3").await.unwrap();
        assert_eq!(loaded, body);
    }

    #[tokio::test]
    async fn missing_audio_file_is_its_own_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_audio(dir.path(), "absent.mp3").await.unwrap_err();
        assert_eq!(err, DomainError::MusicFileMissing);
    }

    #[tokio::test]
    async fn missing_cover_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_cover(dir.path(), "Song A").await.is_none());
        let body = BASE64.encode(b"jpeg-bytes");
        write_payload(dir.path(), &cover_file_name("Song A"), &body)
            .await
            .unwrap();
        assert_eq!(load_cover(dir.path(), "Song A").await.unwrap(), body);
    }

    #[tokio::test]
    async fn bad_base64_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        assert!(write_payload(dir.path(), "x.mp3", "not base64!!!").await.is_err());
    }
}

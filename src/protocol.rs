//! Wire protocol: one JSON object per line in each direction
//!
//! Request: `{"action": "...", "requestId": "...", "data": {...}}`.
//! `requestId` is optional and echoed verbatim; `action` and `data` are
//! required. Responses carry `status`, a human-readable `message`, the
//! echoed id, and an action-specific `data` payload where applicable.
//!
//! A line that fails to decode as a request envelope gets an error
//! response with no `requestId` field at all.

use crate::model::{Music, PlayList, User};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Decoded request envelope. Action-specific fields stay an opaque
/// `Value` until the matching handler extracts its parameter struct.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    pub action: String,
    #[serde(default)]
    pub request_id: String,
    pub data: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Error,
}

/// Response envelope. `request_id` is omitted (not null) for lines that
/// never decoded far enough to have one; `data` is omitted when an
/// action has no payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    pub status: Status,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl Response {
    pub fn success(request_id: &str, message: impl Into<String>) -> Self {
        Response {
            request_id: Some(request_id.to_string()),
            status: Status::Success,
            message: message.into(),
            data: None,
        }
    }

    pub fn success_with(
        request_id: &str,
        message: impl Into<String>,
        data: impl Serialize,
    ) -> Self {
        Response {
            request_id: Some(request_id.to_string()),
            status: Status::Success,
            message: message.into(),
            data: serde_json::to_value(data).ok(),
        }
    }

    pub fn error(request_id: &str, message: impl Into<String>) -> Self {
        Response {
            request_id: Some(request_id.to_string()),
            status: Status::Error,
            message: message.into(),
            data: None,
        }
    }

    /// Protocol-level failure: malformed JSON or a missing top-level
    /// field. The connection stays open.
    pub fn invalid_json() -> Self {
        Response {
            request_id: None,
            status: Status::Error,
            message: "Invalid JSON format".to_string(),
            data: None,
        }
    }

    /// Serializes to a single response line (without the newline).
    pub fn to_line(&self) -> String {
        serde_json::to_string(self)
            .unwrap_or_else(|_| r#"{"status":"error","message":"Server error"}"#.to_string())
    }
}

// ---------------------------------------------------------------------------
// Per-action parameter structs, deserialized from the request `data` bag.
// Field names are the wire names.
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct RegisterParams {
    pub email: String,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginParams {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct EmailParams {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct MusicNameParams {
    pub email: String,
    pub music_name: String,
}

#[derive(Debug, Deserialize)]
pub struct AddLocalMusicParams {
    pub email: String,
    pub title: String,
    pub artist: String,
    /// Base64-encoded audio payload.
    pub file: String,
    /// Optional base64-encoded cover image.
    #[serde(default)]
    pub cover: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ShareMusicParams {
    pub email: String,
    pub target_email: String,
    pub music_name: String,
}

#[derive(Debug, Deserialize)]
pub struct SharePlaylistParams {
    pub email: String,
    pub target_email: String,
    pub playlist_name: String,
}

#[derive(Debug, Deserialize)]
pub struct CreatePlaylistParams {
    pub email: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct PlaylistNameParams {
    pub email: String,
    pub playlist_name: String,
}

#[derive(Debug, Deserialize)]
pub struct PlaylistMusicParams {
    pub email: String,
    pub playlist_name: String,
    pub music_id: u64,
}

#[derive(Debug, Deserialize)]
pub struct ToggleSharingParams {
    pub email: String,
    pub allow_sharing: bool,
}

#[derive(Debug, Deserialize)]
pub struct MusicByIdParams {
    pub id: u64,
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct DownloadParams {
    pub name: String,
    #[serde(default)]
    pub email: String,
}

// ---------------------------------------------------------------------------
// Response payload shapes.
// ---------------------------------------------------------------------------

/// Track as it appears in response payloads. The like counter is not
/// exposed; the cover is inlined when the sidecar file exists.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MusicDto {
    pub id: u64,
    pub title: String,
    pub artist: String,
    pub file_path: String,
    pub uploader_email: String,
    pub added_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover: Option<String>,
}

impl MusicDto {
    pub fn from_music(music: &Music, cover: Option<String>) -> Self {
        MusicDto {
            id: music.id,
            title: music.title.clone(),
            artist: music.artist.clone(),
            file_path: music.file_path.clone(),
            uploader_email: music.uploader_email.clone(),
            added_at: music.added_at.format("%Y-%m-%dT%H:%M:%S").to_string(),
            cover,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistDto {
    pub id: u64,
    pub name: String,
    pub creator_email: String,
    pub musics: Vec<MusicDto>,
}

impl PlaylistDto {
    pub fn from_playlist(playlist: &PlayList, musics: Vec<MusicDto>) -> Self {
        PlaylistDto {
            id: playlist.id,
            name: playlist.name.clone(),
            creator_email: playlist.creator_email.clone(),
            musics,
        }
    }
}

/// Listing entry for sharing-enabled users.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSummary {
    pub email: String,
    pub username: String,
}

impl UserSummary {
    pub fn from_user(user: &User) -> Self {
        UserSummary {
            email: user.email.clone(),
            username: user.username.clone(),
        }
    }
}

/// Profile shape returned by `get_user`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub email: String,
    pub username: String,
    pub allow_sharing: bool,
}

impl UserProfile {
    pub fn from_user(user: &User) -> Self {
        UserProfile {
            email: user.email.clone(),
            username: user.username.clone(),
            allow_sharing: user.allow_sharing,
        }
    }
}

/// Payload for `download_music`: the audio file and, when present, the
/// cover, both base64.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadDto {
    pub file: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_id_defaults_to_empty() {
        let req: Request =
            serde_json::from_str(r#"{"action":"login","data":{"email":"a","password":"b"}}"#)
                .unwrap();
        assert_eq!(req.request_id, "");
        assert_eq!(req.action, "login");
    }

    #[test]
    fn envelope_requires_action_and_data() {
        assert!(serde_json::from_str::<Request>(r#"{"data":{}}"#).is_err());
        assert!(serde_json::from_str::<Request>(r#"{"action":"login"}"#).is_err());
    }

    #[test]
    fn protocol_error_line_has_no_request_id() {
        let line = Response::invalid_json().to_line();
        let value: Value = serde_json::from_str(&line).unwrap();
        assert!(value.get("requestId").is_none());
        assert_eq!(value["status"], "error");
        assert_eq!(value["message"], "Invalid JSON format");
    }

    #[test]
    fn success_line_echoes_request_id_and_skips_empty_data() {
        let line = Response::success("req-1", "User deleted").to_line();
        let value: Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["requestId"], "req-1");
        assert_eq!(value["status"], "success");
        assert!(value.get("data").is_none());
    }

    #[test]
    fn music_dto_hides_the_like_counter() {
        let mut music = Music::new(5, "A", "B", "A.mp3", "u@x.com");
        music.add_like();
        let value = serde_json::to_value(MusicDto::from_music(&music, None)).unwrap();
        assert!(value.get("likes").is_none());
        assert!(value.get("cover").is_none());
        assert_eq!(value["id"], 5);
        let added_at = value["addedAt"].as_str().unwrap();
        assert_eq!(added_at.len(), "2024-01-01T00:00:00".len());
    }
}

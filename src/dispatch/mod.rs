//! Action dispatch: maps decoded request lines onto store operations
//!
//! Each action has a small handler that extracts its parameter struct,
//! runs the store operation, and shapes the response. Handlers live in
//! submodules by area (accounts, library, playlists, sharing); this
//! module owns the action table and the shared payload helpers.

mod library;
mod playlists;
mod sharing;
mod users;

use crate::media;
use crate::model::{Music, PlayList};
use crate::protocol::{MusicDto, PlaylistDto, Request, Response};
use crate::store::Store;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Shared handles each connection task works against.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Store>,
    pub music_dir: PathBuf,
}

/// Processes one request line and returns the response line (without
/// the trailing newline). Envelope decode failures never close the
/// connection; they produce an id-less error response.
pub async fn handle_line(state: &AppState, line: &str) -> String {
    let request: Request = match serde_json::from_str(line) {
        Ok(request) => request,
        Err(e) => {
            debug!("rejecting undecodable request line: {e}");
            return Response::invalid_json().to_line();
        }
    };
    dispatch(state, request).await.to_line()
}

/// Routes a decoded request to its handler.
pub async fn dispatch(state: &AppState, request: Request) -> Response {
    let Request {
        action,
        request_id,
        data,
    } = request;
    let rid = request_id.as_str();
    match action.as_str() {
        "register" => users::register(state, rid, data).await,
        "login" => users::login(state, rid, data).await,
        "get_user" => users::get_user(state, rid, data).await,
        "update_user" => users::update_user(state, rid, data).await,
        "delete_user" => users::delete_user(state, rid, data).await,
        "toggle_sharing" => users::toggle_sharing(state, rid, data).await,
        "list_users" => users::list_users(state, rid).await,
        "like_music" => library::like_music(state, rid, data).await,
        "unlike_music" => library::unlike_music(state, rid, data).await,
        "list_liked_music" => library::list_liked_music(state, rid, data).await,
        "list_user_musics" => library::list_user_musics(state, rid, data).await,
        "list_server_musics" => library::list_server_musics(state, rid).await,
        "add_local_music" => library::add_local_music(state, rid, data).await,
        "add_server_music" => library::add_server_music(state, rid, data).await,
        "remove_user_music" => library::remove_user_music(state, rid, data).await,
        "get_music_by_id" => library::get_music_by_id(state, rid, data).await,
        "download_music" => library::download_music(state, rid, data).await,
        "create_playlist" => playlists::create_playlist(state, rid, data).await,
        "delete_playlist" => playlists::delete_playlist(state, rid, data).await,
        "list_user_playlists" => playlists::list_user_playlists(state, rid, data).await,
        "add_music_to_playlist" => playlists::add_music_to_playlist(state, rid, data).await,
        "remove_music_from_playlist" => {
            playlists::remove_music_from_playlist(state, rid, data).await
        }
        "share_music" => sharing::share_music(state, rid, data).await,
        "share_playlist" => sharing::share_playlist(state, rid, data).await,
        _ => Response::error(rid, "Unknown action"),
    }
}

/// Extracts an action's parameter struct from the request `data` bag.
/// Missing or mistyped fields become an `Invalid request` error carrying
/// serde's description of what was wrong.
fn parse<T: DeserializeOwned>(request_id: &str, data: Value) -> Result<T, Response> {
    serde_json::from_value(data)
        .map_err(|e| Response::error(request_id, format!("Invalid request: {e}")))
}

/// Builds a track payload, attaching the cover sidecar when one exists
/// on disk for this title.
async fn music_dto(music: &Music, music_dir: &Path) -> MusicDto {
    let cover = media::load_cover(music_dir, &music.title).await;
    MusicDto::from_music(music, cover)
}

async fn music_dtos(musics: &[Music], music_dir: &Path) -> Vec<MusicDto> {
    let mut out = Vec::with_capacity(musics.len());
    for music in musics {
        out.push(music_dto(music, music_dir).await);
    }
    out
}

async fn playlist_dto(playlist: &PlayList, music_dir: &Path) -> PlaylistDto {
    let musics = music_dtos(&playlist.musics, music_dir).await;
    PlaylistDto::from_playlist(playlist, musics)
}

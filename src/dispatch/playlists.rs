//! Playlist actions
//!
//! Playlist membership is by track id: the entry pushed into a playlist
//! is the resolved track itself, not a fresh copy, so a playlist can
//! reference catalog entries and other users' shared tracks directly.
//! Only the playlist's creator (matched verbatim against the request
//! email) may change or delete it.

use super::{parse, playlist_dto, AppState};
use crate::error::DomainError;
use crate::protocol::{
    CreatePlaylistParams, EmailParams, PlaylistMusicParams, PlaylistNameParams, Response,
};
use serde_json::Value;

pub async fn create_playlist(state: &AppState, rid: &str, data: Value) -> Response {
    let params: CreatePlaylistParams = match parse(rid, data) {
        Ok(p) => p,
        Err(resp) => return resp,
    };
    match state.store.create_playlist(&params.email, &params.name).await {
        Ok(playlist) => {
            let dto = playlist_dto(&playlist, &state.music_dir).await;
            Response::success_with(rid, "Playlist created successfully", dto)
        }
        Err(e) => Response::error(rid, e.to_string()),
    }
}

pub async fn delete_playlist(state: &AppState, rid: &str, data: Value) -> Response {
    let params: PlaylistNameParams = match parse(rid, data) {
        Ok(p) => p,
        Err(resp) => return resp,
    };
    match state
        .store
        .delete_playlist(&params.email, &params.playlist_name)
        .await
    {
        Ok(()) => Response::success(rid, "Playlist deleted successfully"),
        Err(e) => Response::error(rid, e.to_string()),
    }
}

pub async fn list_user_playlists(state: &AppState, rid: &str, data: Value) -> Response {
    let params: EmailParams = match parse(rid, data) {
        Ok(p) => p,
        Err(resp) => return resp,
    };
    let playlists = state
        .store
        .read(|s| s.find_user(&params.email).map(|u| u.playlists.clone()))
        .await;
    match playlists {
        Some(playlists) => {
            let mut dtos = Vec::with_capacity(playlists.len());
            for playlist in &playlists {
                dtos.push(playlist_dto(playlist, &state.music_dir).await);
            }
            Response::success_with(rid, "User playlists retrieved", dtos)
        }
        None => Response::error(rid, DomainError::UserNotFound.to_string()),
    }
}

pub async fn add_music_to_playlist(state: &AppState, rid: &str, data: Value) -> Response {
    let params: PlaylistMusicParams = match parse(rid, data) {
        Ok(p) => p,
        Err(resp) => return resp,
    };
    let result = state
        .store
        .mutate(|store, _| {
            let creator_ok = store
                .find_user(&params.email)
                .and_then(|u| u.find_playlist(&params.playlist_name))
                .map(|p| p.creator_email == params.email);
            if creator_ok != Some(true) {
                return Err(DomainError::UserOrPlaylistNotFound.into());
            }
            let music = store
                .resolve_music_by_id(&params.email, params.music_id)
                .cloned()
                .ok_or(DomainError::MusicNotFound)?;
            let playlist = store
                .find_user_mut(&params.email)
                .and_then(|u| u.find_playlist_mut(&params.playlist_name))
                .ok_or(DomainError::UserOrPlaylistNotFound)?;
            if playlist.contains_id(music.id) {
                return Err(DomainError::MusicAlreadyInPlaylist.into());
            }
            playlist.add_music(music);
            Ok(playlist.clone())
        })
        .await;
    match result {
        Ok(playlist) => {
            let dto = playlist_dto(&playlist, &state.music_dir).await;
            Response::success_with(rid, "Music added to playlist successfully", dto)
        }
        Err(e) => Response::error(rid, e.to_string()),
    }
}

pub async fn remove_music_from_playlist(state: &AppState, rid: &str, data: Value) -> Response {
    let params: PlaylistMusicParams = match parse(rid, data) {
        Ok(p) => p,
        Err(resp) => return resp,
    };
    let result = state
        .store
        .mutate(|store, _| {
            let creator_ok = store
                .find_user(&params.email)
                .and_then(|u| u.find_playlist(&params.playlist_name))
                .map(|p| p.creator_email == params.email);
            if creator_ok != Some(true) {
                return Err(DomainError::UserOrPlaylistNotFound.into());
            }
            let playlist = store
                .find_user_mut(&params.email)
                .and_then(|u| u.find_playlist_mut(&params.playlist_name))
                .ok_or(DomainError::UserOrPlaylistNotFound)?;
            if !playlist.remove_by_id(params.music_id) {
                return Err(DomainError::MusicNotInPlaylist.into());
            }
            Ok(playlist.clone())
        })
        .await;
    match result {
        Ok(playlist) => {
            let dto = playlist_dto(&playlist, &state.music_dir).await;
            Response::success_with(rid, "Music removed from playlist successfully", dto)
        }
        Err(e) => Response::error(rid, e.to_string()),
    }
}

//! Library actions: likes, uploads, catalog copies, lookup, download
//!
//! Like state lives in two places that move together under the store
//! lock: the authoritative counter on the track entry (own library
//! first, catalog second) and the copy in the user's liked list. Upload
//! handlers do their file work outside the lock and re-check dedup
//! inside it, since tag extraction can rename a track between the two
//! phases.

use super::{music_dto, music_dtos, parse, AppState};
use crate::error::DomainError;
use crate::ids::IdKind;
use crate::media;
use crate::metadata;
use crate::model::Music;
use crate::protocol::{
    AddLocalMusicParams, DownloadDto, DownloadParams, EmailParams, MusicByIdParams, MusicDto,
    MusicNameParams, Response,
};
use serde_json::Value;

pub async fn like_music(state: &AppState, rid: &str, data: Value) -> Response {
    let params: MusicNameParams = match parse(rid, data) {
        Ok(p) => p,
        Err(resp) => return resp,
    };
    let result = state
        .store
        .mutate(|store, _| {
            let ui = store
                .user_index(&params.email)
                .ok_or(DomainError::UserNotFound)?;
            if store.users[ui].has_liked(&params.music_name) {
                return Err(DomainError::AlreadyLiked.into());
            }
            let liked = if let Some(mi) = store.users[ui]
                .user_musics
                .iter()
                .position(|m| m.same_title(&params.music_name))
            {
                store.users[ui].user_musics[mi].add_like();
                store.users[ui].user_musics[mi].clone()
            } else if let Some(ci) = store
                .catalog
                .iter()
                .position(|m| m.same_title(&params.music_name))
            {
                store.catalog[ci].add_like();
                store.catalog[ci].clone()
            } else {
                return Err(DomainError::MusicNotFound.into());
            };
            store.users[ui].liked_musics.push(liked);
            Ok(())
        })
        .await;
    match result {
        Ok(()) => Response::success(rid, "Music liked successfully"),
        Err(e) => Response::error(rid, e.to_string()),
    }
}

pub async fn unlike_music(state: &AppState, rid: &str, data: Value) -> Response {
    let params: MusicNameParams = match parse(rid, data) {
        Ok(p) => p,
        Err(resp) => return resp,
    };
    let result = state
        .store
        .mutate(|store, _| {
            let ui = store
                .user_index(&params.email)
                .ok_or(DomainError::UserNotFound)?;
            if !store.users[ui].has_liked(&params.music_name) {
                return Err(DomainError::NotLiked.into());
            }
            // The authoritative counter may be gone (track removed from
            // the catalog since the like); the liked entry still goes.
            if let Some(mi) = store.users[ui]
                .user_musics
                .iter()
                .position(|m| m.same_title(&params.music_name))
            {
                store.users[ui].user_musics[mi].remove_like();
            } else if let Some(ci) = store
                .catalog
                .iter()
                .position(|m| m.same_title(&params.music_name))
            {
                store.catalog[ci].remove_like();
            }
            store.users[ui].unlike(&params.music_name);
            Ok(())
        })
        .await;
    match result {
        Ok(()) => Response::success(rid, "Music unliked successfully"),
        Err(e) => Response::error(rid, e.to_string()),
    }
}

pub async fn list_liked_music(state: &AppState, rid: &str, data: Value) -> Response {
    let params: EmailParams = match parse(rid, data) {
        Ok(p) => p,
        Err(resp) => return resp,
    };
    let musics = state
        .store
        .read(|s| s.find_user(&params.email).map(|u| u.liked_musics.clone()))
        .await;
    match musics {
        Some(musics) => {
            let dtos = music_dtos(&musics, &state.music_dir).await;
            Response::success_with(rid, "Liked music retrieved", dtos)
        }
        None => Response::error(rid, DomainError::UserNotFound.to_string()),
    }
}

pub async fn list_user_musics(state: &AppState, rid: &str, data: Value) -> Response {
    let params: EmailParams = match parse(rid, data) {
        Ok(p) => p,
        Err(resp) => return resp,
    };
    let musics = state
        .store
        .read(|s| s.find_user(&params.email).map(|u| u.user_musics.clone()))
        .await;
    match musics {
        Some(musics) => {
            let dtos = music_dtos(&musics, &state.music_dir).await;
            Response::success_with(rid, "User musics retrieved", dtos)
        }
        None => Response::error(rid, DomainError::UserNotFound.to_string()),
    }
}

pub async fn list_server_musics(state: &AppState, rid: &str) -> Response {
    let catalog = state.store.catalog().await;
    let dtos = music_dtos(&catalog, &state.music_dir).await;
    Response::success_with(rid, "Server musics retrieved", dtos)
}

/// Uploads a track into the requester's library. The audio payload is
/// written first; the title and artist are then re-read from the file's
/// tags, falling back to the request values when the file carries none.
pub async fn add_local_music(state: &AppState, rid: &str, data: Value) -> Response {
    let params: AddLocalMusicParams = match parse(rid, data) {
        Ok(p) => p,
        Err(resp) => return resp,
    };
    let precheck = state
        .store
        .read(|s| {
            let user = s.find_user(&params.email).ok_or(DomainError::UserNotFound)?;
            if user.owns_title_artist(&params.title, &params.artist) {
                return Err(DomainError::SongAlreadyInLibrary);
            }
            Ok(())
        })
        .await;
    if let Err(e) = precheck {
        return Response::error(rid, e.to_string());
    }

    let file_name = media::audio_file_name(&params.title);
    if let Err(e) = media::write_payload(&state.music_dir, &file_name, &params.file).await {
        return Response::error(rid, format!("Server error: {e}"));
    }
    let tags = metadata::read_tags(&state.music_dir.join(&file_name));
    let title = tags.title.unwrap_or_else(|| params.title.clone());
    let artist = tags.artist.unwrap_or_else(|| params.artist.clone());

    let cover = params.cover.as_deref().filter(|c| !c.is_empty());
    if let Some(cover) = cover {
        let cover_name = media::cover_file_name(&title);
        if let Err(e) = media::write_payload(&state.music_dir, &cover_name, cover).await {
            return Response::error(rid, format!("Server error: {e}"));
        }
    }

    let result = state
        .store
        .mutate(|store, ids| {
            let ui = store
                .user_index(&params.email)
                .ok_or(DomainError::UserNotFound)?;
            if store.users[ui].owns_title_artist(&title, &artist) {
                return Err(DomainError::SongAlreadyInLibrary.into());
            }
            let id = ids.next_id(IdKind::Music)?;
            let music = Music::new(id, &title, &artist, file_name.clone(), &params.email);
            store.users[ui].user_musics.push(music.clone());
            Ok(music)
        })
        .await;
    match result {
        Ok(music) => {
            let message = if cover.is_some() {
                "Local music added successfully with cover"
            } else {
                "Local music added successfully"
            };
            let dto = MusicDto::from_music(&music, cover.map(str::to_string));
            Response::success_with(rid, message, dto)
        }
        Err(e) => Response::error(rid, e.to_string()),
    }
}

/// Copies a catalog track into the requester's library as a fresh entry.
pub async fn add_server_music(state: &AppState, rid: &str, data: Value) -> Response {
    let params: MusicNameParams = match parse(rid, data) {
        Ok(p) => p,
        Err(resp) => return resp,
    };
    let result = state
        .store
        .mutate(|store, ids| {
            let source = store
                .catalog_by_title(&params.music_name)
                .cloned()
                .ok_or(DomainError::UserOrMusicNotFound)?;
            let ui = store
                .user_index(&params.email)
                .ok_or(DomainError::UserOrMusicNotFound)?;
            if store.users[ui].owns_title_artist(&source.title, &source.artist) {
                return Err(DomainError::MusicAlreadyInList.into());
            }
            let id = ids.next_id(IdKind::Music)?;
            store.users[ui].user_musics.push(source.copy_with_id(id));
            Ok(())
        })
        .await;
    match result {
        Ok(()) => Response::success(rid, "Server music added successfully"),
        Err(e) => Response::error(rid, e.to_string()),
    }
}

/// Removes a track from the requester's library and cascades through
/// their liked list and every playlist they own.
pub async fn remove_user_music(state: &AppState, rid: &str, data: Value) -> Response {
    let params: MusicNameParams = match parse(rid, data) {
        Ok(p) => p,
        Err(resp) => return resp,
    };
    let result = state
        .store
        .mutate(|store, _| {
            let user = store
                .find_user_mut(&params.email)
                .ok_or(DomainError::UserNotFound)?;
            if !user.remove_library_title(&params.music_name) {
                return Err(DomainError::MusicNotInUserList.into());
            }
            user.unlike(&params.music_name);
            for playlist in &mut user.playlists {
                playlist.remove_first_by_title(&params.music_name);
            }
            Ok(())
        })
        .await;
    match result {
        Ok(()) => Response::success(
            rid,
            "Music removed from user, liked list, and playlists successfully",
        ),
        Err(e) => Response::error(rid, e.to_string()),
    }
}

pub async fn get_music_by_id(state: &AppState, rid: &str, data: Value) -> Response {
    let params: MusicByIdParams = match parse(rid, data) {
        Ok(p) => p,
        Err(resp) => return resp,
    };
    let music = state
        .store
        .read(|s| s.resolve_music_by_id(&params.email, params.id).cloned())
        .await;
    match music {
        Some(music) => {
            let dto = music_dto(&music, &state.music_dir).await;
            Response::success_with(rid, "Music retrieved", dto)
        }
        None => Response::error(rid, DomainError::MusicNotFound.to_string()),
    }
}

/// Returns the audio bytes (and cover, when present) for a track found
/// by title in the catalog or, failing that, in the requester's library.
pub async fn download_music(state: &AppState, rid: &str, data: Value) -> Response {
    let params: DownloadParams = match parse(rid, data) {
        Ok(p) => p,
        Err(resp) => return resp,
    };
    let music = state
        .store
        .read(|s| {
            if let Some(music) = s.catalog_by_title(&params.name) {
                return Some(music.clone());
            }
            if params.email.is_empty() {
                return None;
            }
            s.find_user(&params.email)
                .and_then(|u| u.user_musics.iter().find(|m| m.same_title(&params.name)))
                .cloned()
        })
        .await;
    let Some(music) = music else {
        return Response::error(rid, DomainError::MusicNotFound.to_string());
    };
    match media::load_audio(&state.music_dir, &music.file_path).await {
        Ok(file) => {
            let cover = media::load_cover(&state.music_dir, &music.title).await;
            Response::success_with(rid, "Music file retrieved", DownloadDto { file, cover })
        }
        Err(e) => Response::error(rid, e.to_string()),
    }
}

//! Sharing actions: pushing tracks and playlists into other libraries
//!
//! A share mints independent copies in the receiving library (fresh
//! ids, like counters reset); the source entries are never touched. The
//! receiving user must have sharing enabled. Shares are idempotent on
//! the receiving side via the (title, artist) library key.

use super::{parse, AppState};
use crate::error::DomainError;
use crate::ids::IdKind;
use crate::model::{Music, PlayList, User};
use crate::protocol::{MusicDto, Response, ShareMusicParams, SharePlaylistParams};
use crate::store::StoreState;
use serde_json::Value;

/// Tracks a user may share: their own library, the catalog, then their
/// liked list.
fn find_shareable<'a>(store: &'a StoreState, owner: &'a User, name: &str) -> Option<&'a Music> {
    owner
        .user_musics
        .iter()
        .find(|m| m.same_title(name))
        .or_else(|| store.catalog_by_title(name))
        .or_else(|| owner.liked_musics.iter().find(|m| m.same_title(name)))
}

pub async fn share_music(state: &AppState, rid: &str, data: Value) -> Response {
    let params: ShareMusicParams = match parse(rid, data) {
        Ok(p) => p,
        Err(resp) => return resp,
    };
    // The common already-present outcome is answered from a read so it
    // does not trigger a snapshot write.
    let precheck = state
        .store
        .read(|store| {
            let user = store
                .find_user(&params.email)
                .ok_or(DomainError::ShareMusicNotFound)?;
            let target = store
                .find_user(&params.target_email)
                .ok_or(DomainError::ShareMusicNotFound)?;
            let source = find_shareable(store, user, &params.music_name)
                .ok_or(DomainError::ShareMusicNotFound)?;
            if !target.allow_sharing {
                return Err(DomainError::SharingDisabled);
            }
            if target.owns_title_artist(&source.title, &source.artist) {
                return Ok(None);
            }
            Ok(Some(()))
        })
        .await;
    match precheck {
        Err(e) => return Response::error(rid, e.to_string()),
        Ok(None) => {
            return Response::success(
                rid,
                "Music already exists in target user's library, no action taken",
            )
        }
        Ok(Some(())) => {}
    }

    let result = state
        .store
        .mutate(|store, ids| {
            let source = {
                let user = store
                    .find_user(&params.email)
                    .ok_or(DomainError::ShareMusicNotFound)?;
                find_shareable(store, user, &params.music_name)
                    .cloned()
                    .ok_or(DomainError::ShareMusicNotFound)?
            };
            let target = store
                .find_user(&params.target_email)
                .ok_or(DomainError::ShareMusicNotFound)?;
            if !target.allow_sharing {
                return Err(DomainError::SharingDisabled.into());
            }
            if target.owns_title_artist(&source.title, &source.artist) {
                // Lost a race with an identical share; nothing to add.
                return Ok(None);
            }
            let id = ids.next_id(IdKind::Music)?;
            let copy = source.copy_with_id(id);
            let target = store
                .find_user_mut(&params.target_email)
                .ok_or(DomainError::ShareMusicNotFound)?;
            target.user_musics.push(copy);
            Ok(Some(source))
        })
        .await;
    match result {
        Ok(Some(source)) => Response::success_with(
            rid,
            "Music shared successfully",
            MusicDto::from_music(&source, None),
        ),
        Ok(None) => Response::success(
            rid,
            "Music already exists in target user's library, no action taken",
        ),
        Err(e) => Response::error(rid, e.to_string()),
    }
}

/// Shares a whole playlist. Each track the target does not already own
/// is copied into their library; the new playlist in the target's
/// account lists exactly those tracks, referenced by their source
/// entries. If the target already has a playlist with the same name the
/// playlist itself is dropped while the library copies remain.
pub async fn share_playlist(state: &AppState, rid: &str, data: Value) -> Response {
    let params: SharePlaylistParams = match parse(rid, data) {
        Ok(p) => p,
        Err(resp) => return resp,
    };
    let result = state
        .store
        .mutate(|store, ids| {
            let (source_name, source_tracks) = {
                let user = store
                    .find_user(&params.email)
                    .ok_or(DomainError::SharePlaylistNotFound)?;
                let playlist = user
                    .find_playlist(&params.playlist_name)
                    .ok_or(DomainError::SharePlaylistNotFound)?;
                if playlist.creator_email != params.email {
                    return Err(DomainError::SharePlaylistNotFound.into());
                }
                (playlist.name.clone(), playlist.musics.clone())
            };
            {
                let target = store
                    .find_user(&params.target_email)
                    .ok_or(DomainError::SharePlaylistNotFound)?;
                if !target.allow_sharing {
                    return Err(DomainError::SharingDisabled.into());
                }
            }

            let playlist_id = ids.next_id(IdKind::Playlist)?;
            let mut shared = PlayList::new(playlist_id, &source_name, &params.target_email);
            for track in &source_tracks {
                let already_owned = store
                    .find_user(&params.target_email)
                    .map(|t| t.owns_title_artist(&track.title, &track.artist))
                    .unwrap_or(true);
                if already_owned {
                    continue;
                }
                let copy_id = ids.next_id(IdKind::Music)?;
                let copy = track.copy_with_id(copy_id);
                if let Some(target) = store.find_user_mut(&params.target_email) {
                    target.user_musics.push(copy);
                }
                shared.add_music(track.clone());
            }
            let count = shared.musics.len();
            if let Some(target) = store.find_user_mut(&params.target_email) {
                if target.find_playlist(&shared.name).is_none() {
                    target.playlists.push(shared);
                }
            }
            Ok(count)
        })
        .await;
    match result {
        Ok(count) => Response::success(rid, format!("Playlist shared with {count} songs")),
        Err(e) => Response::error(rid, e.to_string()),
    }
}

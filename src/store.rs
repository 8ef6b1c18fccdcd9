//! Shared mutable state: the user store and the server catalog
//!
//! All state lives behind one async mutex; every command runs its whole
//! read-modify-write sequence under that lock, so no command ever
//! observes a partially applied change and no two snapshot writes can
//! land out of order.
//!
//! Mutations are transactional with respect to the users document: the
//! change is applied to a staged clone, the staged snapshot is written
//! durably, and only then does the clone become the live state. A failed
//! write leaves memory exactly as it was and surfaces as a persistence
//! error on the triggering command.
//!
//! The catalog is loaded once at startup and never structurally changes
//! at runtime; only the like counters on its entries move, under the same
//! lock. Restarting the server resets catalog like counters.

use crate::error::{DomainError, Result, StoreError};
use crate::ids::{IdAllocator, IdKind};
use crate::model::{Music, PlayList, User};
use crate::persist::Documents;
use tokio::sync::Mutex;
use tracing::{error, info};

/// Everything guarded by the store lock.
#[derive(Debug, Clone)]
pub struct StoreState {
    pub users: Vec<User>,
    pub catalog: Vec<Music>,
}

impl StoreState {
    pub fn find_user(&self, email: &str) -> Option<&User> {
        self.users.iter().find(|u| u.email_matches(email))
    }

    pub fn find_user_mut(&mut self, email: &str) -> Option<&mut User> {
        self.users.iter_mut().find(|u| u.email_matches(email))
    }

    pub fn user_index(&self, email: &str) -> Option<usize> {
        self.users.iter().position(|u| u.email_matches(email))
    }

    /// Case-insensitive exact title lookup; first match wins.
    pub fn catalog_by_title(&self, name: &str) -> Option<&Music> {
        self.catalog.iter().find(|m| m.same_title(name))
    }

    pub fn catalog_by_id(&self, id: u64) -> Option<&Music> {
        self.catalog.iter().find(|m| m.id == id)
    }

    /// Resolves a track id through the three search scopes, in order:
    /// the requester's own library, the catalog, then the libraries of
    /// every other sharing-enabled user. The requester may be unknown,
    /// in which case the first scope is skipped.
    pub fn resolve_music_by_id(&self, requester_email: &str, music_id: u64) -> Option<&Music> {
        if let Some(user) = self.find_user(requester_email) {
            if let Some(music) = user.user_musics.iter().find(|m| m.id == music_id) {
                return Some(music);
            }
        }
        if let Some(music) = self.catalog_by_id(music_id) {
            return Some(music);
        }
        self.users
            .iter()
            .filter(|u| u.allow_sharing && !u.email_matches(requester_email))
            .flat_map(|u| u.user_musics.iter())
            .find(|m| m.id == music_id)
    }
}

/// The authoritative store shared by all sessions.
#[derive(Debug)]
pub struct Store {
    state: Mutex<StoreState>,
    docs: Documents,
    ids: IdAllocator,
}

impl Store {
    /// Loads both persisted collections and takes ownership of the
    /// documents and the id allocator.
    pub async fn open(docs: Documents, ids: IdAllocator) -> Result<Store> {
        let users = docs.load_users().await?;
        let catalog = docs.load_catalog().await?;
        info!(
            users = users.len(),
            catalog = catalog.len(),
            "loaded persisted state"
        );
        Ok(Store {
            state: Mutex::new(StoreState { users, catalog }),
            docs,
            ids,
        })
    }

    /// Runs a read-only closure under the store lock.
    pub async fn read<T>(&self, f: impl FnOnce(&StoreState) -> T) -> T {
        let guard = self.state.lock().await;
        f(&guard)
    }

    /// Runs a mutating closure against a staged clone of the state,
    /// persists the staged users snapshot, then commits the clone.
    ///
    /// The closure may allocate ids; an allocation that fails to persist
    /// aborts the whole command. When the closure or the snapshot write
    /// fails, the staged clone is discarded and the live state is
    /// untouched.
    pub async fn mutate<T>(
        &self,
        f: impl FnOnce(&mut StoreState, &IdAllocator) -> std::result::Result<T, StoreError>,
    ) -> std::result::Result<T, StoreError> {
        let mut guard = self.state.lock().await;
        let mut staged = guard.clone();
        let out = f(&mut staged, &self.ids)?;
        if let Err(e) = self.docs.save_users(&staged.users).await {
            error!("failed to persist users document: {e}");
            return Err(StoreError::Persist(e));
        }
        *guard = staged;
        Ok(out)
    }

    /// Registers a new account. The email must not collide with an
    /// existing one, compared case-insensitively.
    pub async fn register(
        &self,
        email: &str,
        username: &str,
        password: &str,
    ) -> std::result::Result<User, StoreError> {
        self.mutate(|state, ids| {
            if state.find_user(email).is_some() {
                return Err(DomainError::EmailExists.into());
            }
            let id = ids.next_id(IdKind::User)?;
            let user = User::new(id, username, password, email);
            state.users.push(user.clone());
            Ok(user)
        })
        .await
    }

    /// Verifies credentials; the password is compared verbatim.
    pub async fn login(&self, email: &str, password: &str) -> std::result::Result<User, DomainError> {
        self.read(|state| {
            state
                .find_user(email)
                .filter(|u| u.password == password)
                .cloned()
                .ok_or(DomainError::InvalidCredentials)
        })
        .await
    }

    pub async fn get_by_email(&self, email: &str) -> Option<User> {
        self.read(|state| state.find_user(email).cloned()).await
    }

    pub async fn update_user(
        &self,
        email: &str,
        username: &str,
        password: &str,
    ) -> std::result::Result<User, StoreError> {
        self.mutate(|state, _| {
            let user = state
                .find_user_mut(email)
                .ok_or(DomainError::UpdateFailed)?;
            user.username = username.to_string();
            user.password = password.to_string();
            Ok(user.clone())
        })
        .await
    }

    /// Removes the account entirely. Copies of its tracks held by other
    /// users are independent entities and stay where they are.
    pub async fn delete_user(&self, email: &str) -> std::result::Result<(), StoreError> {
        self.mutate(|state, _| {
            let before = state.users.len();
            state.users.retain(|u| !u.email_matches(email));
            if state.users.len() == before {
                return Err(DomainError::UserNotFound.into());
            }
            Ok(())
        })
        .await
    }

    /// Creates an empty playlist for the user. Playlist names are unique
    /// per user, case-insensitively.
    pub async fn create_playlist(
        &self,
        email: &str,
        name: &str,
    ) -> std::result::Result<PlayList, StoreError> {
        self.mutate(|state, ids| {
            let user_idx = state.user_index(email).ok_or(DomainError::UserNotFound)?;
            if state.users[user_idx].find_playlist(name).is_some() {
                return Err(DomainError::PlaylistNameExists.into());
            }
            let id = ids.next_id(IdKind::Playlist)?;
            let playlist = PlayList::new(id, name, email);
            state.users[user_idx].playlists.push(playlist.clone());
            Ok(playlist)
        })
        .await
    }

    /// Deletes a playlist. Only its creator may do so; the creator check
    /// compares the request email against the stored creator email
    /// verbatim, as playlist ownership is recorded at creation time.
    pub async fn delete_playlist(
        &self,
        email: &str,
        name: &str,
    ) -> std::result::Result<(), StoreError> {
        self.mutate(|state, _| {
            let user = state
                .find_user_mut(email)
                .ok_or(DomainError::UserOrPlaylistNotFound)?;
            let playlist = user
                .find_playlist(name)
                .ok_or(DomainError::UserOrPlaylistNotFound)?;
            if playlist.creator_email != email {
                return Err(DomainError::UserOrPlaylistNotFound.into());
            }
            user.remove_playlist(name);
            Ok(())
        })
        .await
    }

    /// Ordered defensive copy of every user aggregate.
    pub async fn snapshot_users(&self) -> Vec<User> {
        self.read(|state| state.users.clone()).await
    }

    /// Ordered snapshot of the catalog.
    pub async fn catalog(&self) -> Vec<Music> {
        self.read(|state| state.catalog.clone()).await
    }
}

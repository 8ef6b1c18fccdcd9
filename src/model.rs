//! Domain model: music tracks, playlists, and user aggregates
//!
//! These structs serialize straight into the persisted documents and into
//! the `register`/`login`/`update_user` response payloads, so field names
//! follow the wire convention (camelCase).
//!
//! Matching rules used throughout the service:
//! - emails compare case-insensitively,
//! - liked music is keyed by case-insensitive title,
//! - owned music is keyed by the case-insensitive (title, artist) pair.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Case-folded, whitespace-trimmed form of a matching key.
pub(crate) fn fold(s: &str) -> String {
    s.trim().to_lowercase()
}

/// A single track. Identity is the id: two tracks with the same title and
/// artist are still distinct entities with independent like counters.
/// Immutable after creation except for the like counter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Music {
    pub id: u64,
    pub title: String,
    pub artist: String,
    /// File name relative to the music directory.
    pub file_path: String,
    /// Empty for curated catalog entries.
    pub uploader_email: String,
    pub likes: u32,
    /// Stamped once when the entity is minted.
    #[serde(default = "Utc::now")]
    pub added_at: DateTime<Utc>,
}

impl Music {
    pub fn new(
        id: u64,
        title: &str,
        artist: &str,
        file_path: impl Into<String>,
        uploader_email: &str,
    ) -> Self {
        Music {
            id,
            title: title.trim().to_string(),
            artist: artist.trim().to_string(),
            file_path: file_path.into(),
            uploader_email: uploader_email.trim().to_string(),
            likes: 0,
            added_at: Utc::now(),
        }
    }

    /// Mints an independent copy for another library: same track data,
    /// fresh id, like counter reset.
    pub fn copy_with_id(&self, id: u64) -> Self {
        Music {
            id,
            title: self.title.clone(),
            artist: self.artist.clone(),
            file_path: self.file_path.clone(),
            uploader_email: self.uploader_email.clone(),
            likes: 0,
            added_at: Utc::now(),
        }
    }

    pub fn add_like(&mut self) {
        self.likes += 1;
    }

    /// Saturating decrement; the counter never goes negative.
    pub fn remove_like(&mut self) {
        self.likes = self.likes.saturating_sub(1);
    }

    pub fn same_title(&self, title: &str) -> bool {
        fold(&self.title) == fold(title)
    }

    pub fn same_title_artist(&self, title: &str, artist: &str) -> bool {
        self.same_title(title) && fold(&self.artist) == fold(artist)
    }
}

/// An ordered, duplicate-free (by id) sequence of tracks owned by one user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlayList {
    pub id: u64,
    pub name: String,
    pub creator_email: String,
    pub musics: Vec<Music>,
}

impl PlayList {
    pub fn new(id: u64, name: &str, creator_email: &str) -> Self {
        PlayList {
            id,
            name: name.trim().to_string(),
            creator_email: creator_email.to_string(),
            musics: Vec::new(),
        }
    }

    pub fn name_matches(&self, name: &str) -> bool {
        fold(&self.name) == fold(name)
    }

    pub fn contains_id(&self, music_id: u64) -> bool {
        self.musics.iter().any(|m| m.id == music_id)
    }

    /// Appends a track unless its id is already present.
    pub fn add_music(&mut self, music: Music) -> bool {
        if self.contains_id(music.id) {
            return false;
        }
        self.musics.push(music);
        true
    }

    pub fn remove_by_id(&mut self, music_id: u64) -> bool {
        let before = self.musics.len();
        self.musics.retain(|m| m.id != music_id);
        self.musics.len() != before
    }

    /// Removes the first track with a matching title, if any.
    pub fn remove_first_by_title(&mut self, title: &str) -> bool {
        match self.musics.iter().position(|m| m.same_title(title)) {
            Some(i) => {
                self.musics.remove(i);
                true
            }
            None => false,
        }
    }
}

/// A registered account with its liked set, owned library, and playlists.
///
/// The owned library holds independent copies: adding a track from the
/// catalog or another user mints a new `Music` with its own id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: u64,
    pub username: String,
    /// Opaque string, compared verbatim at login.
    pub password: String,
    pub email: String,
    pub liked_musics: Vec<Music>,
    pub user_musics: Vec<Music>,
    pub allow_sharing: bool,
    pub playlists: Vec<PlayList>,
}

impl User {
    pub fn new(id: u64, username: &str, password: &str, email: &str) -> Self {
        User {
            id,
            username: username.to_string(),
            password: password.to_string(),
            email: email.to_string(),
            liked_musics: Vec::new(),
            user_musics: Vec::new(),
            allow_sharing: true,
            playlists: Vec::new(),
        }
    }

    pub fn email_matches(&self, email: &str) -> bool {
        fold(&self.email) == fold(email)
    }

    pub fn has_liked(&self, title: &str) -> bool {
        self.liked_musics.iter().any(|m| m.same_title(title))
    }

    /// Drops every liked entry with a matching title.
    pub fn unlike(&mut self, title: &str) -> bool {
        let before = self.liked_musics.len();
        self.liked_musics.retain(|m| !m.same_title(title));
        self.liked_musics.len() != before
    }

    pub fn owns_title_artist(&self, title: &str, artist: &str) -> bool {
        self.user_musics
            .iter()
            .any(|m| m.same_title_artist(title, artist))
    }

    /// Drops every library entry with a matching title, whatever the artist.
    pub fn remove_library_title(&mut self, title: &str) -> bool {
        let before = self.user_musics.len();
        self.user_musics.retain(|m| !m.same_title(title));
        self.user_musics.len() != before
    }

    pub fn find_playlist(&self, name: &str) -> Option<&PlayList> {
        self.playlists.iter().find(|p| p.name_matches(name))
    }

    pub fn find_playlist_mut(&mut self, name: &str) -> Option<&mut PlayList> {
        self.playlists.iter_mut().find(|p| p.name_matches(name))
    }

    pub fn remove_playlist(&mut self, name: &str) -> bool {
        let before = self.playlists.len();
        self.playlists.retain(|p| !p.name_matches(name));
        self.playlists.len() != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_matching_ignores_case_and_padding() {
        let music = Music::new(1, "  Hey Jude ", "The Beatles", "Hey Jude.mp3", "a@x.com");
        assert_eq!(music.title, "Hey Jude");
        assert!(music.same_title("hey jude"));
        assert!(music.same_title(" HEY JUDE  "));
        assert!(!music.same_title("hey"));
        assert!(music.same_title_artist("HEY JUDE", "the beatles"));
        assert!(!music.same_title_artist("HEY JUDE", "someone else"));
    }

    #[test]
    fn like_counter_never_goes_negative() {
        let mut music = Music::new(1, "A", "B", "A.mp3", "");
        music.remove_like();
        assert_eq!(music.likes, 0);
        music.add_like();
        music.add_like();
        music.remove_like();
        assert_eq!(music.likes, 1);
    }

    #[test]
    fn copy_gets_fresh_identity() {
        let mut source = Music::new(1, "A", "B", "A.mp3", "a@x.com");
        source.add_like();
        let copy = source.copy_with_id(2);
        assert_eq!(copy.id, 2);
        assert_eq!(copy.title, source.title);
        assert_eq!(copy.file_path, source.file_path);
        assert_eq!(copy.likes, 0);
    }

    #[test]
    fn playlist_rejects_duplicate_ids() {
        let mut playlist = PlayList::new(1, "Favs", "a@x.com");
        let music = Music::new(7, "A", "B", "A.mp3", "");
        assert!(playlist.add_music(music.clone()));
        assert!(!playlist.add_music(music));
        assert_eq!(playlist.musics.len(), 1);
    }

    #[test]
    fn library_removal_takes_every_matching_title() {
        let mut user = User::new(1, "alice", "pw", "a@x.com");
        user.user_musics.push(Music::new(1, "Song", "X", "Song.mp3", ""));
        user.user_musics.push(Music::new(2, "song", "Y", "Song.mp3", ""));
        user.user_musics.push(Music::new(3, "Other", "X", "Other.mp3", ""));
        assert!(user.remove_library_title("SONG"));
        assert_eq!(user.user_musics.len(), 1);
        assert_eq!(user.user_musics[0].title, "Other");
    }

    #[test]
    fn persisted_field_names_follow_the_documents() {
        let user = User::new(1, "alice", "pw", "a@x.com");
        let value = serde_json::to_value(&user).unwrap();
        assert!(value.get("likedMusics").is_some());
        assert!(value.get("userMusics").is_some());
        assert!(value.get("allowSharing").is_some());
        let music = Music::new(1, "A", "B", "A.mp3", "u@x.com");
        let value = serde_json::to_value(&music).unwrap();
        assert!(value.get("filePath").is_some());
        assert!(value.get("uploaderEmail").is_some());
        assert!(value.get("addedAt").is_some());
    }

    #[test]
    fn legacy_music_records_load_without_added_at() {
        let raw = r#"{"id":3,"title":"A","artist":"B","filePath":"A.mp3","uploaderEmail":"","likes":2}"#;
        let music: Music = serde_json::from_str(raw).unwrap();
        assert_eq!(music.id, 3);
        assert_eq!(music.likes, 2);
    }
}

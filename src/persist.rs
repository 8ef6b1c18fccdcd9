//! Persistence gateway for the JSON documents
//!
//! Three documents live under the data directory:
//! - `users.json` — the full array of user aggregates,
//! - `server_musics.json` — the curated catalog,
//! - `counters.json` — last-issued ids per entity kind.
//!
//! Every save replaces the whole document. Writes go to a temporary
//! sibling first, are synced, then renamed over the target, so a crash
//! mid-write leaves the previous document intact. Loading a document
//! that does not exist yet yields an empty collection.

use crate::error::Result;
use crate::model::{Music, User};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

const USERS_FILE: &str = "users.json";
const CATALOG_FILE: &str = "server_musics.json";
const COUNTERS_FILE: &str = "counters.json";

/// Handle on the data directory and its documents.
#[derive(Debug, Clone)]
pub struct Documents {
    data_dir: PathBuf,
}

impl Documents {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Documents {
            data_dir: data_dir.into(),
        }
    }

    pub fn users_path(&self) -> PathBuf {
        self.data_dir.join(USERS_FILE)
    }

    pub fn catalog_path(&self) -> PathBuf {
        self.data_dir.join(CATALOG_FILE)
    }

    pub fn counters_path(&self) -> PathBuf {
        self.data_dir.join(COUNTERS_FILE)
    }

    pub async fn ensure_dirs(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.data_dir).await?;
        Ok(())
    }

    pub async fn load_users(&self) -> Result<Vec<User>> {
        load_collection(&self.users_path()).await
    }

    pub async fn save_users(&self, users: &[User]) -> Result<()> {
        let body = serde_json::to_string_pretty(users)?;
        atomic_write(&self.users_path(), &body).await
    }

    pub async fn load_catalog(&self) -> Result<Vec<Music>> {
        load_collection(&self.catalog_path()).await
    }

    pub async fn save_catalog(&self, musics: &[Music]) -> Result<()> {
        let body = serde_json::to_string_pretty(musics)?;
        atomic_write(&self.catalog_path(), &body).await
    }
}

async fn load_collection<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    match tokio::fs::read_to_string(path).await {
        Ok(raw) if raw.trim().is_empty() => Ok(Vec::new()),
        Ok(raw) => Ok(serde_json::from_str(&raw)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
        Err(e) => Err(e.into()),
    }
}

/// Write-to-temp, sync, rename. The rename makes the replacement atomic
/// on the same filesystem.
pub async fn atomic_write(path: &Path, contents: &str) -> Result<()> {
    let tmp_path = path.with_extension("tmp");
    {
        let mut tmp_file = tokio::fs::File::create(&tmp_path).await?;
        tmp_file.write_all(contents.as_bytes()).await?;
        tmp_file.sync_all().await?;
    }
    tokio::fs::rename(&tmp_path, path).await?;
    Ok(())
}

/// Blocking variant for callers outside the async runtime (the id
/// allocator persists from inside store mutations).
pub fn atomic_write_sync(path: &Path, contents: &str) -> Result<()> {
    use std::io::Write;

    let tmp_path = path.with_extension("tmp");
    {
        let mut tmp_file = std::fs::File::create(&tmp_path)?;
        tmp_file.write_all(contents.as_bytes())?;
        tmp_file.sync_all()?;
    }
    std::fs::rename(&tmp_path, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PlayList;

    #[tokio::test]
    async fn missing_documents_load_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let docs = Documents::new(dir.path());
        assert!(docs.load_users().await.unwrap().is_empty());
        assert!(docs.load_catalog().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_document_loads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let docs = Documents::new(dir.path());
        tokio::fs::write(docs.users_path(), "").await.unwrap();
        assert!(docs.load_users().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn users_round_trip_field_for_field() {
        let dir = tempfile::tempdir().unwrap();
        let docs = Documents::new(dir.path());

        let mut user = User::new(1, "alice", "pw", "a@x.com");
        let mut track = Music::new(2, "Song A", "Artist", "Song A.mp3", "a@x.com");
        track.add_like();
        user.liked_musics.push(track.clone());
        user.user_musics.push(track.clone());
        let mut playlist = PlayList::new(3, "Favs", "a@x.com");
        playlist.add_music(track);
        user.playlists.push(playlist);

        let users = vec![user];
        docs.save_users(&users).await.unwrap();
        let reloaded = docs.load_users().await.unwrap();
        assert_eq!(reloaded, users);
        assert_eq!(reloaded[0].playlists[0].musics[0].likes, 1);
    }

    #[tokio::test]
    async fn atomic_write_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("doc.json");
        atomic_write(&target, "[]").await.unwrap();
        atomic_write(&target, "[1]").await.unwrap();
        assert_eq!(tokio::fs::read_to_string(&target).await.unwrap(), "[1]");
        assert!(!target.with_extension("tmp").exists());
    }
}

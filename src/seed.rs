//! Catalog seeding from a directory of audio files
//!
//! Runs once at startup when a seed directory is configured and no
//! catalog document exists yet. Each audio file is copied into the
//! music directory and entered into the catalog with its tagged title
//! and artist, falling back to the file stem when the file carries no
//! tags. Unreadable files are skipped, not fatal.

use crate::error::Result;
use crate::ids::{IdAllocator, IdKind};
use crate::metadata;
use crate::model::Music;
use crate::persist::Documents;
use std::path::Path;
use tracing::{info, warn};

const AUDIO_EXTENSIONS: [&str; 4] = ["mp3", "flac", "ogg", "wav"];

fn is_audio_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| AUDIO_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Builds the initial catalog from `seed_dir`. Returns the number of
/// tracks seeded; zero when a catalog document already exists.
pub async fn seed_catalog(
    docs: &Documents,
    ids: &IdAllocator,
    seed_dir: &Path,
    music_dir: &Path,
) -> Result<usize> {
    if docs.catalog_path().exists() {
        info!("catalog document already present, skipping seed");
        return Ok(0);
    }

    let mut file_names = Vec::new();
    let mut entries = tokio::fs::read_dir(seed_dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.is_file() && is_audio_file(&path) {
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                file_names.push(name.to_string());
            }
        }
    }
    // Directory order is not stable; keep seeded ids reproducible.
    file_names.sort();

    let mut catalog = Vec::new();
    for file_name in &file_names {
        let source = seed_dir.join(file_name);
        let dest = music_dir.join(file_name);
        if let Err(e) = tokio::fs::copy(&source, &dest).await {
            warn!(file = %file_name, error = %e, "skipping seed file");
            continue;
        }
        let tags = metadata::read_tags(&dest);
        let stem = Path::new(file_name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(file_name)
            .to_string();
        let title = tags.title.unwrap_or(stem);
        let artist = tags.artist.unwrap_or_default();
        let id = ids.next_id(IdKind::Music)?;
        catalog.push(Music::new(id, &title, &artist, file_name.clone(), ""));
    }

    docs.save_catalog(&catalog).await?;
    info!(tracks = catalog.len(), "seeded catalog");
    Ok(catalog.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seed_fixture() -> (tempfile::TempDir, Documents, IdAllocator) {
        let dir = tempfile::tempdir().unwrap();
        let docs = Documents::new(dir.path().join("db"));
        docs.ensure_dirs().await.unwrap();
        let ids = IdAllocator::open(docs.counters_path()).unwrap();
        (dir, docs, ids)
    }

    #[tokio::test]
    async fn seeds_audio_files_and_skips_the_rest() {
        let (dir, docs, ids) = seed_fixture().await;
        let seed_dir = dir.path().join("seed");
        let music_dir = dir.path().join("musics");
        tokio::fs::create_dir_all(&seed_dir).await.unwrap();
        tokio::fs::create_dir_all(&music_dir).await.unwrap();
        tokio::fs::write(seed_dir.join("b-track.mp3"), b"not real audio")
            .await
            .unwrap();
        tokio::fs::write(seed_dir.join("a-track.mp3"), b"not real audio")
            .await
            .unwrap();
        tokio::fs::write(seed_dir.join("notes.txt"), b"ignored")
            .await
            .unwrap();

        let seeded = seed_catalog(&docs, &ids, &seed_dir, &music_dir)
            .await
            .unwrap();
        assert_eq!(seeded, 2);

        let catalog = docs.load_catalog().await.unwrap();
        assert_eq!(catalog.len(), 2);
        // Sorted file names make id assignment deterministic.
        assert_eq!(catalog[0].title, "a-track");
        assert_eq!(catalog[0].id, 1);
        assert_eq!(catalog[1].title, "b-track");
        assert_eq!(catalog[1].id, 2);
        assert!(music_dir.join("a-track.mp3").exists());
        assert!(!music_dir.join("notes.txt").exists());
    }

    #[tokio::test]
    async fn existing_catalog_is_not_reseeded() {
        let (dir, docs, ids) = seed_fixture().await;
        let seed_dir = dir.path().join("seed");
        let music_dir = dir.path().join("musics");
        tokio::fs::create_dir_all(&seed_dir).await.unwrap();
        tokio::fs::create_dir_all(&music_dir).await.unwrap();
        tokio::fs::write(seed_dir.join("track.mp3"), b"not real audio")
            .await
            .unwrap();

        docs.save_catalog(&[Music::new(9, "Kept", "", "Kept.mp3", "")])
            .await
            .unwrap();
        let seeded = seed_catalog(&docs, &ids, &seed_dir, &music_dir)
            .await
            .unwrap();
        assert_eq!(seeded, 0);
        let catalog = docs.load_catalog().await.unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog[0].title, "Kept");
    }
}

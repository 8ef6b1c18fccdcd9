//! Tag extraction for audio files
//!
//! A thin wrapper over `lofty`: given a path, return whatever title and
//! artist tags the file carries. Unreadable files and missing tags are
//! not errors here; callers fall back to user-supplied values.

use lofty::file::TaggedFileExt;
use lofty::probe::Probe;
use lofty::tag::Accessor;
use std::path::Path;
use tracing::debug;

/// Title and artist read from a file's tags, when present.
#[derive(Debug, Clone, Default)]
pub struct TrackTags {
    pub title: Option<String>,
    pub artist: Option<String>,
}

/// Reads tags from an audio file. ID3v2 is preferred, falling back to
/// whatever tag format the file carries first.
pub fn read_tags(path: &Path) -> TrackTags {
    let tagged_file = match Probe::open(path).and_then(|probe| probe.read()) {
        Ok(file) => file,
        Err(e) => {
            debug!(path = ?path, error = %e, "could not read audio tags");
            return TrackTags::default();
        }
    };

    let Some(tag) = tagged_file.primary_tag().or_else(|| tagged_file.first_tag()) else {
        debug!(path = ?path, "no tags found in audio file");
        return TrackTags::default();
    };

    TrackTags {
        title: tag
            .title()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty()),
        artist: tag
            .artist()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unreadable_file_yields_no_tags() {
        let tags = read_tags(Path::new("/nonexistent/file.mp3"));
        assert!(tags.title.is_none());
        assert!(tags.artist.is_none());
    }

    #[test]
    fn garbage_bytes_yield_no_tags() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("noise.mp3");
        std::fs::write(&path, b"this is not an mp3").unwrap();
        let tags = read_tags(&path);
        assert!(tags.title.is_none());
        assert!(tags.artist.is_none());
    }
}

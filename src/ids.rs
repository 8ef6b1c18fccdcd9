//! Identifier allocation
//!
//! One monotonic counter per entity kind, all kept in a single
//! `counters.json` document. An id is only handed out after the advanced
//! counter has been durably written, so a crash between allocation and
//! first use can never lead to the same id being issued twice. A failed
//! write fails the allocation; the burned value is an acceptable gap.

use crate::error::Result;
use crate::persist;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

/// Entity kinds with independent id sequences.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdKind {
    User,
    Music,
    Playlist,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Counters {
    #[serde(default)]
    user: u64,
    #[serde(default)]
    music: u64,
    #[serde(default)]
    playlist: u64,
}

/// Durable monotonic id source shared by all store mutations.
#[derive(Debug)]
pub struct IdAllocator {
    path: PathBuf,
    counters: Mutex<Counters>,
}

impl IdAllocator {
    /// Opens the counter document, starting every sequence at zero when
    /// the document does not exist yet.
    pub fn open(path: PathBuf) -> Result<Self> {
        let counters = match std::fs::read_to_string(&path) {
            Ok(raw) if raw.trim().is_empty() => Counters::default(),
            Ok(raw) => serde_json::from_str(&raw)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Counters::default(),
            Err(e) => return Err(e.into()),
        };
        Ok(IdAllocator {
            path,
            counters: Mutex::new(counters),
        })
    }

    /// Issues the next id for `kind`, persisting the new high-water mark
    /// before returning it.
    pub fn next_id(&self, kind: IdKind) -> Result<u64> {
        let mut counters = self
            .counters
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let mut staged = counters.clone();
        let slot = match kind {
            IdKind::User => &mut staged.user,
            IdKind::Music => &mut staged.music,
            IdKind::Playlist => &mut staged.playlist,
        };
        *slot += 1;
        let issued = *slot;

        let body = serde_json::to_string_pretty(&staged)?;
        persist::atomic_write_sync(&self.path, &body)?;

        *counters = staged;
        Ok(issued)
    }
}

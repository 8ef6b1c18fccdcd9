//! Mixtape admin console (mixtape-admin)
//!
//! Offline maintenance over the persisted documents: inspection plus
//! the destructive operations (user deletion, track removal) that the
//! wire protocol does not expose to clients. Point it at the same data
//! directory as mixtaped while the server is stopped; it rewrites
//! `users.json` in place.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use mixtape::model::{Music, User};
use mixtape::persist::Documents;

#[derive(Parser, Debug)]
#[command(name = "mixtape-admin")]
#[command(about = "Offline admin console for the Mixtape server")]
#[command(version)]
struct Cli {
    /// Directory holding the persisted JSON documents
    #[arg(long, default_value = "db", env = "MIXTAPE_DATA_DIR")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List all registered users
    Users,
    /// List every user's playlists
    Playlists,
    /// List the server catalog
    Catalog,
    /// List catalog tracks with at least one like, most liked first
    MostLiked,
    /// List every track a user references (library, likes, playlists)
    UserMusic { email: String },
    /// Delete a user account
    DeleteUser { email: String },
    /// Remove a track from a user's library, liked list, and playlists
    RemoveUserMusic { email: String, music_id: u64 },
    /// Remove a track from one playlist only
    RemovePlaylistMusic {
        email: String,
        playlist_name: String,
        music_id: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let docs = Documents::new(&cli.data_dir);

    match cli.command {
        Commands::Users => list_users(&docs).await,
        Commands::Playlists => list_playlists(&docs).await,
        Commands::Catalog => list_catalog(&docs).await,
        Commands::MostLiked => most_liked(&docs).await,
        Commands::UserMusic { email } => user_music(&docs, &email).await,
        Commands::DeleteUser { email } => delete_user(&docs, &email).await,
        Commands::RemoveUserMusic { email, music_id } => {
            remove_user_music(&docs, &email, music_id).await
        }
        Commands::RemovePlaylistMusic {
            email,
            playlist_name,
            music_id,
        } => remove_playlist_music(&docs, &email, &playlist_name, music_id).await,
    }
}

fn print_track(index: usize, music: &Music) {
    println!(
        "{}. Title: {}, Artist: {}, Likes: {}, ID: {}",
        index, music.title, music.artist, music.likes, music.id
    );
}

async fn list_users(docs: &Documents) -> Result<()> {
    let users = docs.load_users().await?;
    if users.is_empty() {
        println!("No users found.");
        return Ok(());
    }
    for (i, user) in users.iter().enumerate() {
        println!(
            "{}. Username: {}, Email: {}, Playlists: {}",
            i + 1,
            user.username,
            user.email,
            user.playlists.len()
        );
    }
    Ok(())
}

async fn list_playlists(docs: &Documents) -> Result<()> {
    let users = docs.load_users().await?;
    let mut found = false;
    for user in &users {
        if user.playlists.is_empty() {
            continue;
        }
        found = true;
        println!("User: {} ({})", user.username, user.email);
        for (i, playlist) in user.playlists.iter().enumerate() {
            println!(
                "  {}. Playlist: {}, Songs: {}",
                i + 1,
                playlist.name,
                playlist.musics.len()
            );
        }
    }
    if !found {
        println!("No playlists found.");
    }
    Ok(())
}

async fn list_catalog(docs: &Documents) -> Result<()> {
    let catalog = docs.load_catalog().await?;
    if catalog.is_empty() {
        println!("No music found on server.");
        return Ok(());
    }
    for (i, music) in catalog.iter().enumerate() {
        print_track(i + 1, music);
    }
    Ok(())
}

async fn most_liked(docs: &Documents) -> Result<()> {
    let mut catalog = docs.load_catalog().await?;
    catalog.sort_by(|a, b| b.likes.cmp(&a.likes));
    catalog.retain(|m| m.likes > 0);
    if catalog.is_empty() {
        println!("No liked music found.");
        return Ok(());
    }
    for (i, music) in catalog.iter().enumerate() {
        print_track(i + 1, music);
    }
    Ok(())
}

/// Every track the user references anywhere, deduplicated by id.
async fn user_music(docs: &Documents, email: &str) -> Result<()> {
    let users = docs.load_users().await?;
    let user = require_user(&users, email)?;

    let mut tracks: BTreeMap<u64, &Music> = BTreeMap::new();
    for music in user.liked_musics.iter().chain(user.user_musics.iter()) {
        tracks.entry(music.id).or_insert(music);
    }
    for playlist in &user.playlists {
        for music in &playlist.musics {
            tracks.entry(music.id).or_insert(music);
        }
    }
    if tracks.is_empty() {
        println!("No music found for user {}.", email);
        return Ok(());
    }
    println!("Music for user {} ({}):", user.username, user.email);
    for (i, music) in tracks.values().enumerate() {
        print_track(i + 1, music);
    }
    Ok(())
}

async fn delete_user(docs: &Documents, email: &str) -> Result<()> {
    let mut users = docs.load_users().await?;
    let before = users.len();
    users.retain(|u| !u.email_matches(email));
    if users.len() == before {
        bail!("User with email {email} not found");
    }
    docs.save_users(&users).await?;
    println!("User with email {} deleted successfully.", email);
    Ok(())
}

/// Removes the identified track from every list the user holds it in.
/// Removal cascades by title the same way the wire protocol's
/// remove_user_music does, so duplicate copies of the same title go too.
async fn remove_user_music(docs: &Documents, email: &str, music_id: u64) -> Result<()> {
    let mut users = docs.load_users().await?;
    let Some(user) = users.iter_mut().find(|u| u.email_matches(email)) else {
        bail!("User with email {email} not found");
    };

    let title = user
        .liked_musics
        .iter()
        .chain(user.user_musics.iter())
        .chain(user.playlists.iter().flat_map(|p| p.musics.iter()))
        .find(|m| m.id == music_id)
        .map(|m| m.title.clone());
    let Some(title) = title else {
        bail!("Song with ID {music_id} not found in user's music");
    };

    if user.liked_musics.iter().any(|m| m.id == music_id) {
        user.unlike(&title);
        println!("Song with ID {} removed from liked music.", music_id);
    }
    if user.user_musics.iter().any(|m| m.id == music_id) {
        user.remove_library_title(&title);
        println!("Song with ID {} removed from user's music library.", music_id);
    }
    for playlist in &mut user.playlists {
        if playlist.remove_by_id(music_id) {
            println!(
                "Song with ID {} removed from playlist {}.",
                music_id, playlist.name
            );
        }
    }

    docs.save_users(&users).await?;
    Ok(())
}

async fn remove_playlist_music(
    docs: &Documents,
    email: &str,
    playlist_name: &str,
    music_id: u64,
) -> Result<()> {
    let mut users = docs.load_users().await?;
    let Some(user) = users.iter_mut().find(|u| u.email_matches(email)) else {
        bail!("User with email {email} not found");
    };
    let Some(playlist) = user.find_playlist_mut(playlist_name) else {
        bail!("Playlist {playlist_name} not found");
    };
    if !playlist.remove_by_id(music_id) {
        bail!("Song with ID {music_id} not found in playlist {playlist_name}");
    }
    docs.save_users(&users).await?;
    println!(
        "Song with ID {} removed from playlist {}.",
        music_id, playlist_name
    );
    Ok(())
}

fn require_user<'a>(users: &'a [User], email: &str) -> Result<&'a User> {
    users
        .iter()
        .find(|u| u.email_matches(email))
        .ok_or_else(|| anyhow::anyhow!("User with email {email} not found"))
}

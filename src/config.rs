//! Service configuration
//!
//! Settings come from three layers, highest priority first:
//!
//! 1. Command-line arguments
//! 2. Environment variables (`MIXTAPE_*`)
//! 3. TOML configuration file (`--config`)
//! 4. Built-in defaults
//!
//! The TOML file is optional; every key has a built-in default so the
//! server starts with no configuration at all.

use crate::error::{Error, Result};
use clap::Parser;
use serde::Deserialize;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use tracing::info;

/// Default TCP listen address.
pub const DEFAULT_LISTEN: SocketAddr =
    SocketAddr::new(std::net::IpAddr::V4(Ipv4Addr::UNSPECIFIED), 12345);

/// Default bound on concurrently served client sessions.
pub const DEFAULT_WORKERS: usize = 50;

/// Command-line arguments for mixtaped
#[derive(Parser, Debug, Default)]
#[command(name = "mixtaped")]
#[command(about = "Multi-user music sharing service")]
#[command(version)]
pub struct Args {
    /// Path to a TOML configuration file
    #[arg(short, long, env = "MIXTAPE_CONFIG")]
    pub config: Option<PathBuf>,

    /// TCP address to listen on
    #[arg(short, long, env = "MIXTAPE_LISTEN")]
    pub listen: Option<SocketAddr>,

    /// Maximum number of concurrently served client sessions
    #[arg(short, long, env = "MIXTAPE_WORKERS")]
    pub workers: Option<usize>,

    /// Directory holding the persisted JSON documents
    #[arg(long, env = "MIXTAPE_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Directory holding audio files and cover sidecars
    #[arg(long, env = "MIXTAPE_MUSIC_DIR")]
    pub music_dir: Option<PathBuf>,

    /// Directory scanned once to seed an empty server catalog
    #[arg(long, env = "MIXTAPE_SEED_DIR")]
    pub seed_dir: Option<PathBuf>,
}

/// Optional TOML configuration file contents
///
/// Every field may be omitted; omitted fields fall through to the
/// built-in defaults.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct TomlConfig {
    #[serde(default)]
    pub listen: Option<SocketAddr>,

    #[serde(default)]
    pub workers: Option<usize>,

    #[serde(default)]
    pub data_dir: Option<PathBuf>,

    #[serde(default)]
    pub music_dir: Option<PathBuf>,

    #[serde(default)]
    pub seed_dir: Option<PathBuf>,
}

/// Resolved application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// TCP listen address
    pub listen: SocketAddr,

    /// Bound on concurrently served sessions
    pub workers: usize,

    /// Directory for the users, catalog, and counter documents
    pub data_dir: PathBuf,

    /// Directory for stored audio and cover files
    pub music_dir: PathBuf,

    /// Seed directory for first-boot catalog population, if any
    pub seed_dir: Option<PathBuf>,
}

impl Config {
    /// Resolve the final configuration from arguments and the optional
    /// TOML file.
    pub async fn resolve(args: Args) -> Result<Config> {
        let file = match &args.config {
            Some(path) => {
                let raw = tokio::fs::read_to_string(path).await.map_err(|e| {
                    Error::Config(format!("failed to read config file {}: {}", path.display(), e))
                })?;
                let parsed: TomlConfig = toml::from_str(&raw).map_err(|e| {
                    Error::Config(format!("failed to parse {}: {}", path.display(), e))
                })?;
                info!("Loaded configuration from {}", path.display());
                parsed
            }
            None => TomlConfig::default(),
        };

        Ok(Config {
            listen: args.listen.or(file.listen).unwrap_or(DEFAULT_LISTEN),
            workers: args.workers.or(file.workers).unwrap_or(DEFAULT_WORKERS),
            data_dir: args
                .data_dir
                .or(file.data_dir)
                .unwrap_or_else(|| PathBuf::from("db")),
            music_dir: args
                .music_dir
                .or(file.music_dir)
                .unwrap_or_else(|| PathBuf::from("musics")),
            seed_dir: args.seed_dir.or(file.seed_dir),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[tokio::test]
    async fn defaults_apply_without_config() {
        let config = Config::resolve(Args::default()).await.unwrap();
        assert_eq!(config.listen, DEFAULT_LISTEN);
        assert_eq!(config.listen.port(), 12345);
        assert_eq!(config.workers, 50);
        assert_eq!(config.data_dir, PathBuf::from("db"));
        assert_eq!(config.music_dir, PathBuf::from("musics"));
        assert!(config.seed_dir.is_none());
    }

    #[tokio::test]
    async fn toml_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mixtape.toml");
        tokio::fs::write(
            &path,
            "listen = \"127.0.0.1:9000\"\nworkers = 4\ndata_dir = \"/tmp/mt-db\"\n",
        )
        .await
        .unwrap();

        let args = Args {
            config: Some(path),
            ..Args::default()
        };
        let config = Config::resolve(args).await.unwrap();
        assert_eq!(config.listen, "127.0.0.1:9000".parse().unwrap());
        assert_eq!(config.workers, 4);
        assert_eq!(config.data_dir, PathBuf::from("/tmp/mt-db"));
        assert_eq!(config.music_dir, PathBuf::from("musics"));
    }

    #[tokio::test]
    async fn cli_beats_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mixtape.toml");
        tokio::fs::write(&path, "workers = 4\n").await.unwrap();

        let args = Args {
            config: Some(path),
            workers: Some(2),
            ..Args::default()
        };
        let config = Config::resolve(args).await.unwrap();
        assert_eq!(config.workers, 2);
    }

    #[tokio::test]
    async fn missing_config_file_is_an_error() {
        let args = Args {
            config: Some(PathBuf::from("/nonexistent/mixtape.toml")),
            ..Args::default()
        };
        assert!(Config::resolve(args).await.is_err());
    }

    #[test]
    #[serial]
    fn environment_fills_missing_arguments() {
        std::env::set_var("MIXTAPE_WORKERS", "7");
        let args = Args::try_parse_from(["mixtaped"]).unwrap();
        assert_eq!(args.workers, Some(7));

        // An explicit flag still wins over the environment.
        let args = Args::try_parse_from(["mixtaped", "--workers", "3"]).unwrap();
        assert_eq!(args.workers, Some(3));
        std::env::remove_var("MIXTAPE_WORKERS");
    }
}

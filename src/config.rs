//! Configuration for songbook paths and the remote catalog.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (SONGBOOK_HOME, SONGBOOK_TOKEN_FILE)
//! 2. Config file (.songbook/config.yaml)
//! 3. Defaults (~/.songbook, no remote store)
//!
//! Config file discovery:
//! - Searches current directory and parents for .songbook/config.yaml
//! - Paths in config file are relative to the config file's directory

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::adapters::GitHubConfig;

/// Global cached configuration (stores Result to handle init errors)
static CONFIG: OnceLock<Result<ResolvedConfig, String>> = OnceLock::new();

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    pub version: String,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub remote: Option<GitHubConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathsConfig {
    /// Data directory (relative to config file)
    pub home: Option<String>,
    /// Bearer token file (relative to config file)
    pub token_file: Option<String>,
}

/// Resolved configuration with absolute paths
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Absolute path to the songbook data directory
    pub home: PathBuf,
    /// Token file consulted when the token env var is unset
    pub token_file: PathBuf,
    /// Remote store settings (no remote when absent)
    pub remote: Option<GitHubConfig>,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
}

/// Find config file by searching current directory and parents
fn find_config_file() -> Option<PathBuf> {
    let mut current = std::env::current_dir().ok()?;

    loop {
        let config_path = current.join(".songbook").join("config.yaml");
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    None
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Resolve a path that may be relative to the config file's directory
fn resolve_path(base: &Path, path_str: &str) -> PathBuf {
    let path = PathBuf::from(path_str);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
            .canonicalize()
            .unwrap_or_else(|_| base.join(path_str))
    }
}

/// Load configuration from all sources
fn load_config() -> Result<ResolvedConfig> {
    let default_home = dirs::home_dir()
        .context("Failed to determine home directory")?
        .join(".songbook");

    let config_file = find_config_file();

    let (home, token_file, remote) = if let Some(ref config_path) = config_file {
        let config = load_config_file(config_path)?;

        // Paths are relative to the .songbook/ directory
        let songbook_dir = config_path.parent().unwrap_or(Path::new("."));

        let home = if let Ok(env_home) = std::env::var("SONGBOOK_HOME") {
            PathBuf::from(env_home)
        } else if let Some(ref home_path) = config.paths.home {
            resolve_path(songbook_dir, home_path)
        } else {
            default_home.clone()
        };

        let token_file = if let Ok(env_token) = std::env::var("SONGBOOK_TOKEN_FILE") {
            PathBuf::from(env_token)
        } else if let Some(ref token_path) = config.paths.token_file {
            resolve_path(songbook_dir, token_path)
        } else {
            home.join("token")
        };

        (home, token_file, config.remote)
    } else {
        // No config file - use env vars or defaults
        let home = std::env::var("SONGBOOK_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_home.clone());

        let token_file = std::env::var("SONGBOOK_TOKEN_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| home.join("token"));

        (home, token_file, None)
    };

    Ok(ResolvedConfig {
        home,
        token_file,
        remote,
        config_file,
    })
}

/// Get the global configuration (loads once, then cached)
pub fn config() -> Result<&'static ResolvedConfig> {
    let result = CONFIG.get_or_init(|| load_config().map_err(|e| e.to_string()));

    match result {
        Ok(config) => Ok(config),
        Err(e) => anyhow::bail!("{}", e),
    }
}

/// Force reload configuration (useful for testing)
pub fn reload_config() -> Result<ResolvedConfig> {
    load_config()
}

/// Get the songbook data directory
pub fn data_dir() -> Result<PathBuf> {
    Ok(config()?.home.clone())
}

/// Get the token file path
pub fn token_file() -> Result<PathBuf> {
    Ok(config()?.token_file.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_config_file_parsing() {
        let temp = TempDir::new().unwrap();
        let songbook_dir = temp.path().join(".songbook");
        std::fs::create_dir_all(&songbook_dir).unwrap();

        let config_path = songbook_dir.join("config.yaml");
        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(
            file,
            r#"
version: "1.0"
paths:
  home: ./
  token_file: ./token
remote:
  owner: someone
  repo: lyrics-data
  branch: main
  data_file: songs-data.json
"#
        )
        .unwrap();

        let config = load_config_file(&config_path).unwrap();
        assert_eq!(config.version, "1.0");
        assert_eq!(config.paths.home, Some("./".to_string()));

        let remote = config.remote.unwrap();
        assert_eq!(remote.owner, "someone");
        assert_eq!(remote.repo, "lyrics-data");
        assert_eq!(remote.branch, "main");
        assert_eq!(remote.data_file, "songs-data.json");
    }

    #[test]
    fn test_remote_defaults() {
        let config: ConfigFile = serde_yaml::from_str(
            r#"
version: "1.0"
remote:
  owner: someone
  repo: lyrics-data
"#,
        )
        .unwrap();

        let remote = config.remote.unwrap();
        assert_eq!(remote.branch, "main");
        assert_eq!(remote.data_file, "songs-data.json");
    }

    #[test]
    fn test_resolve_relative_path() {
        let base = PathBuf::from("/home/user/project");

        assert_eq!(
            resolve_path(&base, "./subdir"),
            PathBuf::from("/home/user/project/subdir")
        );
        assert_eq!(
            resolve_path(&base, "/absolute/path"),
            PathBuf::from("/absolute/path")
        );
    }
}

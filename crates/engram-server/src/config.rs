//! Process configuration: CLI flags, `ENGRAM_`-prefixed environment
//! variables, and an optional TOML file, in that precedence order
//! (highest first), collected into one loadable struct.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::Deserialize;

/// On-disk/TOML-file representation. Every field is optional so a partial
/// file only overrides what it mentions.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileConfig {
    host: Option<String>,
    port: Option<u16>,
    data_dir: Option<PathBuf>,
    dimensions: Option<usize>,
}

/// Fully resolved server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Directory holding `engram.sqlite3`. Defaults to the platform data
    /// directory reported by `directories::ProjectDirs`.
    pub data_dir: PathBuf,
    /// Embedding dimension shared by every engram in the store.
    pub dimensions: usize,
}

impl ServerConfig {
    /// Builds the default configuration, then layers `ENGRAM_*` environment
    /// variables, then an optional TOML file (`config_path`), then explicit
    /// CLI overrides — later layers win.
    pub fn load(config_path: Option<&Path>, cli_host: Option<String>, cli_port: Option<u16>, cli_data_dir: Option<PathBuf>) -> Self {
        let mut cfg = Self::defaults();

        cfg.apply_env();

        if let Some(path) = config_path {
            match std::fs::read_to_string(path) {
                Ok(contents) => match toml::from_str::<FileConfig>(&contents) {
                    Ok(file) => cfg.apply_file(file),
                    Err(err) => tracing::warn!(path = %path.display(), error = %err, "ignoring malformed config file"),
                },
                Err(err) => tracing::warn!(path = %path.display(), error = %err, "could not read config file"),
            }
        }

        if let Some(host) = cli_host {
            cfg.host = host;
        }
        if let Some(port) = cli_port {
            cfg.port = port;
        }
        if let Some(data_dir) = cli_data_dir {
            cfg.data_dir = data_dir;
        }

        cfg
    }

    fn defaults() -> Self {
        let data_dir = ProjectDirs::from("dev", "engram", "engram")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));

        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            data_dir,
            dimensions: 256,
        }
    }

    fn apply_env(&mut self) {
        if let Ok(v) = std::env::var("ENGRAM_HOST") {
            self.host = v;
        }
        if let Ok(v) = std::env::var("ENGRAM_PORT") {
            if let Ok(port) = v.parse() {
                self.port = port;
            }
        }
        if let Ok(v) = std::env::var("ENGRAM_DATA_DIR") {
            self.data_dir = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("ENGRAM_DIMENSIONS") {
            if let Ok(dims) = v.parse() {
                self.dimensions = dims;
            }
        }
    }

    fn apply_file(&mut self, file: FileConfig) {
        if let Some(host) = file.host {
            self.host = host;
        }
        if let Some(port) = file.port {
            self.port = port;
        }
        if let Some(data_dir) = file.data_dir {
            self.data_dir = data_dir;
        }
        if let Some(dimensions) = file.dimensions {
            self.dimensions = dimensions;
        }
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("engram.sqlite3")
    }
}

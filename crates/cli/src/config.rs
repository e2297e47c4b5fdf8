//! CLI configuration loading

use anyhow::Result;
use campus_client::ClientConfig;
use config::{Config, Environment, File};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Top-level configuration for the campus console
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CliConfig {
    /// How to reach the API gateway
    #[serde(default)]
    pub client: ClientConfig,

    /// Where the signed-in session is kept between runs
    #[serde(default)]
    pub session_file: Option<PathBuf>,
}

impl CliConfig {
    /// Load defaults, then `campus.toml` (or `path`), then `CAMPUS__*` variables
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        match path {
            Some(path) => {
                builder = builder.add_source(File::from(path));
            }
            None => {
                for candidate in ["campus.toml", "config/campus.toml"] {
                    if Path::new(candidate).exists() {
                        builder = builder.add_source(File::with_name(candidate).required(false));
                    }
                }
            }
        }

        builder = builder.add_source(
            Environment::with_prefix("CAMPUS")
                .separator("__")
                .try_parsing(true),
        );

        Ok(builder.build()?.try_deserialize()?)
    }

    pub fn session_path(&self, data_dir: Option<&Path>) -> PathBuf {
        if let Some(path) = &self.session_file {
            return path.clone();
        }
        data_dir
            .map_or_else(default_data_dir, Path::to_path_buf)
            .join("session.json")
    }
}

fn default_data_dir() -> PathBuf {
    ProjectDirs::from("org", "Campus", "campus").map_or_else(
        || {
            warn!("Failed to determine platform data directory, using ./data");
            PathBuf::from("./data")
        },
        |dirs| dirs.data_dir().to_path_buf(),
    )
}

//! Host settings: optional YAML file plus `TAGSIFT_*` environment variables.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment prefix for settings, e.g. `TAGSIFT_LIBRARY`.
const ENV_PREFIX: &str = "TAGSIFT";

/// Host settings, from an optional YAML file and `TAGSIFT_*` variables.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    /// Library file used when a command gets no `--library`.
    #[serde(default)]
    pub library: Option<PathBuf>,
    #[serde(default)]
    pub format: OutputFormat,
    /// Libraries at least this large are filtered on the rayon pool.
    #[serde(default = "default_parallel_threshold")]
    pub parallel_threshold: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            library: None,
            format: OutputFormat::default(),
            parallel_threshold: default_parallel_threshold(),
        }
    }
}

fn default_parallel_threshold() -> usize {
    50_000
}

impl Settings {
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut builder = ::config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(::config::File::from(path));
        }
        let settings = builder
            .add_source(::config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?;
        Ok(settings.try_deserialize()?)
    }
}

#[derive(Debug, Default, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// One JSON object per line
    #[default]
    Jsonl,
    /// A single JSON array
    Json,
}

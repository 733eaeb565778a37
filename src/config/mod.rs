use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

/// Name of the config file looked up in the working directory.
pub const CONFIG_FILE: &str = ".parselab.yml";

/// Settings from `.parselab.yml`. Every key is optional.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ShellConfig {
    /// Spaces per nesting level when writing JSON parselets.
    pub indent: usize,
    /// User-Agent header for HTTP fetches.
    pub user_agent: String,
    /// HTTP timeout in seconds.
    pub timeout_secs: u64,
    /// Output format for command results ("text" or "json").
    pub format: String,
    #[serde(skip)]
    source: Option<PathBuf>,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            indent: 4,
            user_agent: concat!("parselab/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout_secs: 30,
            format: "text".to_string(),
            source: None,
        }
    }
}

impl ShellConfig {
    /// The file this config was read from, if any.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }
}

/// Load config from the given path, or look for `.parselab.yml` in the
/// current directory. Returns defaults if the file doesn't exist.
pub fn load_config(path: Option<&Path>) -> Result<ShellConfig> {
    let config_path = match path {
        Some(p) => p.to_path_buf(),
        None => Path::new(CONFIG_FILE).to_path_buf(),
    };

    if !config_path.exists() {
        return Ok(ShellConfig::default());
    }

    let contents = std::fs::read_to_string(&config_path)
        .with_context(|| format!("failed to read config {}", config_path.display()))?;

    // An empty file deserializes as null rather than a mapping.
    if contents.trim().is_empty() {
        return Ok(ShellConfig {
            source: Some(config_path),
            ..ShellConfig::default()
        });
    }

    let mut config: ShellConfig = serde_yml::from_str(&contents)
        .with_context(|| format!("failed to parse {}", config_path.display()))?;

    if !matches!(config.format.as_str(), "text" | "json") {
        anyhow::bail!(
            "invalid format {:?} in {} (expected text or json)",
            config.format,
            config_path.display()
        );
    }

    config.source = Some(config_path);
    Ok(config)
}

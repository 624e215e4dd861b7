use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
  pub remote: RemoteConfig,
  #[serde(default)]
  pub cache: CacheConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemoteConfig {
  /// Base URL of the hosted store, e.g. https://project.supabase.co
  pub url: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CacheConfig {
  /// Cache database location (defaults to the platform data dir)
  pub path: Option<PathBuf>,
  /// Disable durable caching entirely (in-memory only)
  #[serde(default)]
  pub disabled: bool,
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./expandix.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/expandix/config.yaml
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Err(eyre!(
        "No configuration file found. Create one at ~/.config/expandix/config.yaml\n\
                 with the remote store url under the `remote` section."
      )),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("expandix.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("expandix").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    let config: Config = serde_yaml::from_str(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))?;

    Ok(config)
  }

  /// Get the remote store API key from environment variables.
  ///
  /// Checks EXPANDIX_API_KEY first, then SUPABASE_ANON_KEY as fallback.
  pub fn get_api_key() -> Result<String> {
    std::env::var("EXPANDIX_API_KEY")
      .or_else(|_| std::env::var("SUPABASE_ANON_KEY"))
      .map_err(|_| {
        eyre!("Remote API key not found. Set EXPANDIX_API_KEY or SUPABASE_ANON_KEY environment variable.")
      })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_parse_minimal_config() {
    let config: Config = serde_yaml::from_str("remote:\n  url: https://p.supabase.co\n").unwrap();
    assert_eq!(config.remote.url, "https://p.supabase.co");
    assert_eq!(config.cache.path, None);
    assert!(!config.cache.disabled);
  }

  #[test]
  fn test_parse_cache_overrides() {
    let yaml = "remote:\n  url: https://p.supabase.co\ncache:\n  path: /tmp/x.db\n  disabled: true\n";
    let config: Config = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(config.cache.path, Some(PathBuf::from("/tmp/x.db")));
    assert!(config.cache.disabled);
  }
}

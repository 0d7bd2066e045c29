use std::path::Path;

use anyhow::Result;
use serde::Deserialize;

/// Root configuration structure, deserialized from `.depscan.toml`.
#[derive(Debug, Deserialize)]
pub struct Config {
    /// Extra directory names to skip, unioned with the built-in defaults.
    #[serde(default)]
    pub ignore: Vec<String>,
    /// Ruby extraction settings.
    #[serde(default)]
    pub ruby: RubyConfig,
}

#[derive(Debug, Deserialize)]
pub struct RubyConfig {
    /// Wall-clock limit for a single `bundle lock` run, in seconds.
    #[serde(default = "default_lock_timeout")]
    pub lock_timeout_secs: u64,
}

fn default_lock_timeout() -> u64 {
    300
}

impl Default for RubyConfig {
    fn default() -> Self {
        RubyConfig {
            lock_timeout_secs: default_lock_timeout(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            ignore: Vec::new(),
            ruby: RubyConfig::default(),
        }
    }
}

/// Load the configuration, searching in order:
///
/// 1. `config_override`, the path passed via `--config`
/// 2. `<root>/.depscan.toml`
/// 3. Built-in [`Config::default`]
pub fn load_config(root: &Path, config_override: Option<&Path>) -> Result<Config> {
    if let Some(path) = config_override {
        let content = std::fs::read_to_string(path)?;
        return Ok(toml::from_str(&content)?);
    }

    let project_config = root.join(".depscan.toml");
    if project_config.exists() {
        let content = std::fs::read_to_string(&project_config)?;
        return Ok(toml::from_str(&content)?);
    }

    Ok(Config::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(config.ignore.is_empty());
        assert_eq!(config.ruby.lock_timeout_secs, 300);
    }

    #[test]
    fn test_load_from_project_root() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(".depscan.toml"),
            "ignore = [\"generated\"]\n\n[ruby]\nlock_timeout_secs = 60\n",
        )
        .unwrap();

        let config = load_config(dir.path(), None).unwrap();
        assert_eq!(config.ignore, vec!["generated".to_string()]);
        assert_eq!(config.ruby.lock_timeout_secs, 60);
    }

    #[test]
    fn test_missing_file_falls_back_to_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(dir.path(), None).unwrap();
        assert_eq!(config.ruby.lock_timeout_secs, 300);
    }
}

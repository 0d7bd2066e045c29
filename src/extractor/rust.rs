use std::path::Path;

use anyhow::Result;
use serde::Deserialize;
use tracing::debug;

use super::{Extractor, PackageMap};
use crate::ignore::IgnorePolicy;
use crate::models::Ecosystem;

#[derive(Debug, Deserialize)]
struct CargoLock {
    #[serde(default)]
    package: Vec<CargoLockPackage>,
}

#[derive(Debug, Deserialize)]
struct CargoLockPackage {
    name: String,
    version: String,
}

/// Extracts every `[[package]]` table from a `Cargo.lock`.
///
/// Workspace members are reported too; the lockfile is the flattened
/// record of what a build would use, and the deduplicator handles repeats.
pub struct CargoLockExtractor;

impl Extractor for CargoLockExtractor {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Rust
    }

    fn extract(&self, location: &Path, _ignore: &IgnorePolicy) -> Result<PackageMap> {
        debug!(path = %location.display(), "parsing Cargo.lock");
        let content = std::fs::read_to_string(location)?;
        let lock: CargoLock = toml::from_str(&content)?;

        let mut gathered = PackageMap::new();
        for package in lock.package {
            gathered.insert(package.name, package.version);
        }
        Ok(gathered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cargo_lock() {
        let dir = tempfile::tempdir().unwrap();
        let lock = dir.path().join("Cargo.lock");
        std::fs::write(
            &lock,
            r#"
version = 3

[[package]]
name = "my-app"
version = "0.1.0"

[[package]]
name = "libc"
version = "0.2.142"
source = "registry+https://github.com/rust-lang/crates.io-index"
checksum = "abc123"
"#,
        )
        .unwrap();

        let pkgs = CargoLockExtractor
            .extract(&lock, &IgnorePolicy::default())
            .unwrap();
        assert_eq!(pkgs.len(), 2);
        assert_eq!(pkgs.get("libc"), Some(&"0.2.142".to_string()));
        assert_eq!(pkgs.get("my-app"), Some(&"0.1.0".to_string()));
    }

    #[test]
    fn test_malformed_lockfile_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let lock = dir.path().join("Cargo.lock");
        std::fs::write(&lock, "this is not toml [[[").unwrap();

        assert!(CargoLockExtractor
            .extract(&lock, &IgnorePolicy::default())
            .is_err());
    }
}

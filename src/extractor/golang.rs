use std::path::Path;

use anyhow::Result;
use serde::Deserialize;
use tracing::debug;

use super::{Extractor, PackageMap};
use crate::ignore::IgnorePolicy;
use crate::models::Ecosystem;

/// Extracts the module path and every `require` entry from a `go.mod`.
///
/// The module's own path is reported with an empty version; requirements
/// keep their tagged versions (the `v` prefix is stripped later by the
/// aggregation layer).
pub struct GoModExtractor;

impl Extractor for GoModExtractor {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Go
    }

    fn extract(&self, location: &Path, _ignore: &IgnorePolicy) -> Result<PackageMap> {
        debug!(path = %location.display(), "parsing go.mod");
        let content = std::fs::read_to_string(location)?;
        Ok(parse_go_mod(&content))
    }
}

fn parse_go_mod(content: &str) -> PackageMap {
    let mut gathered = PackageMap::new();
    // None = top level, Some(true) = require block, Some(false) = other block
    let mut block: Option<bool> = None;

    for line in content.lines() {
        let line = match line.split_once("//") {
            Some((code, _)) => code.trim(),
            None => line.trim(),
        };
        if line.is_empty() {
            continue;
        }

        if block.is_some() {
            if line == ")" {
                block = None;
            } else if block == Some(true) {
                let mut parts = line.split_whitespace();
                if let Some(name) = parts.next() {
                    let version = parts.next().unwrap_or("").to_string();
                    gathered.insert(name.to_string(), version);
                }
            }
            continue;
        }

        if let Some(rest) = line.strip_prefix("module ") {
            gathered.insert(rest.trim().trim_matches('"').to_string(), String::new());
        } else if line == "require (" {
            block = Some(true);
        } else if line.ends_with('(') {
            // replace (, exclude (, retract (
            block = Some(false);
        } else if let Some(rest) = line.strip_prefix("require ") {
            let mut parts = rest.split_whitespace();
            if let Some(name) = parts.next() {
                let version = parts.next().unwrap_or("").to_string();
                gathered.insert(name.to_string(), version);
            }
        }
    }

    gathered
}

#[derive(Debug, Deserialize)]
struct GopkgLock {
    #[serde(default)]
    projects: Vec<GopkgProject>,
}

#[derive(Debug, Deserialize)]
struct GopkgProject {
    name: String,
    version: Option<String>,
    #[serde(default)]
    packages: Vec<String>,
}

/// Extracts pinned projects from a dep `Gopkg.lock`.
///
/// Each project's `packages` list is expanded into `name/subpath` entries,
/// matching how the lockfile records which packages of a project are used.
/// Projects pinned by revision only are reported without a version.
pub struct GopkgLockExtractor;

impl Extractor for GopkgLockExtractor {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Go
    }

    fn extract(&self, location: &Path, _ignore: &IgnorePolicy) -> Result<PackageMap> {
        debug!(path = %location.display(), "parsing Gopkg.lock");
        let content = std::fs::read_to_string(location)?;
        let lock: GopkgLock = toml::from_str(&content)?;

        let mut gathered = PackageMap::new();
        for project in lock.projects {
            let version = project.version.clone().unwrap_or_default();
            for package in &project.packages {
                if package != "." {
                    gathered.insert(
                        format!("{}/{}", project.name, package),
                        version.clone(),
                    );
                }
            }
            gathered.insert(project.name, version);
        }
        Ok(gathered)
    }
}

/// Extracts the `imports` section of a glide `glide.lock`.
///
/// The file is YAML but regular enough for a line parser: entries carry a
/// name, a pinned revision in `version`, and optional `subpackages` which
/// are expanded like Gopkg packages.
pub struct GlideLockExtractor;

impl Extractor for GlideLockExtractor {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Go
    }

    fn extract(&self, location: &Path, _ignore: &IgnorePolicy) -> Result<PackageMap> {
        debug!(path = %location.display(), "parsing glide.lock");
        let content = std::fs::read_to_string(location)?;
        Ok(parse_glide_lock(&content))
    }
}

#[derive(Default)]
struct GlideEntry {
    name: String,
    version: String,
    subpackages: Vec<String>,
}

impl GlideEntry {
    fn flush_into(self, gathered: &mut PackageMap) {
        if self.name.is_empty() {
            return;
        }
        for sub in &self.subpackages {
            if sub != "." {
                gathered.insert(format!("{}/{}", self.name, sub), self.version.clone());
            }
        }
        gathered.insert(self.name, self.version);
    }
}

fn parse_glide_lock(content: &str) -> PackageMap {
    let mut gathered = PackageMap::new();
    let mut in_imports = false;
    let mut in_subpackages = false;
    let mut current = GlideEntry::default();

    for line in content.lines() {
        // top-level keys terminate the imports section
        if !line.starts_with(' ') && !line.starts_with('-') && line.contains(':') {
            std::mem::take(&mut current).flush_into(&mut gathered);
            in_imports = line.trim_end() == "imports:";
            in_subpackages = false;
            continue;
        }
        if !in_imports {
            continue;
        }

        let trimmed = line.trim();
        if let Some(rest) = trimmed.strip_prefix("- name:") {
            std::mem::take(&mut current).flush_into(&mut gathered);
            current.name = rest.trim().to_string();
            in_subpackages = false;
        } else if let Some(rest) = trimmed.strip_prefix("version:") {
            current.version = rest.trim().to_string();
            in_subpackages = false;
        } else if trimmed == "subpackages:" {
            in_subpackages = true;
        } else if in_subpackages {
            if let Some(sub) = trimmed.strip_prefix("- ") {
                current.subpackages.push(sub.trim().to_string());
            }
        }
    }
    current.flush_into(&mut gathered);

    gathered
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_go_mod() {
        let content = r#"
module example.com/foo

go 1.21

require (
    golang.org/x/text v0.3.3
    github.com/openshift/api v3.9.0+incompatible // indirect
)

require github.com/BurntSushi/toml v1.2.1

replace (
    github.com/old/path => github.com/new/path v1.0.0
)
"#;
        let pkgs = parse_go_mod(content);
        assert_eq!(pkgs.get("example.com/foo"), Some(&String::new()));
        assert_eq!(pkgs.get("golang.org/x/text"), Some(&"v0.3.3".to_string()));
        assert_eq!(
            pkgs.get("github.com/openshift/api"),
            Some(&"v3.9.0+incompatible".to_string())
        );
        assert_eq!(
            pkgs.get("github.com/BurntSushi/toml"),
            Some(&"v1.2.1".to_string())
        );
        // replace targets are not dependencies
        assert!(!pkgs.contains_key("github.com/new/path"));
        assert_eq!(pkgs.len(), 4);
    }

    #[test]
    fn test_parse_gopkg_lock_expands_packages() {
        let dir = tempfile::tempdir().unwrap();
        let lock = dir.path().join("Gopkg.lock");
        std::fs::write(
            &lock,
            r#"
[[projects]]
  name = "github.com/aws/aws-sdk-go"
  packages = [
    ".",
    "aws",
    "aws/awserr",
  ]
  version = "v1.13.49"

[[projects]]
  name = "github.com/BurntSushi/toml"
  packages = ["."]
  revision = "abc123"
"#,
        )
        .unwrap();

        let pkgs = GopkgLockExtractor
            .extract(&lock, &IgnorePolicy::default())
            .unwrap();
        assert_eq!(
            pkgs.get("github.com/aws/aws-sdk-go"),
            Some(&"v1.13.49".to_string())
        );
        assert_eq!(
            pkgs.get("github.com/aws/aws-sdk-go/aws/awserr"),
            Some(&"v1.13.49".to_string())
        );
        // revision-only pin has no version
        assert_eq!(pkgs.get("github.com/BurntSushi/toml"), Some(&String::new()));
        assert_eq!(pkgs.len(), 4);
    }

    #[test]
    fn test_parse_glide_lock() {
        let content = r#"hash: deadbeef
updated: 2020-01-01T00:00:00Z
imports:
- name: github.com/beorn7/perks
  subpackages:
  - quantile
  version: 4c0e84591b9aa9e6dcfdf3e020114cd81f89d5f9
- name: github.com/bgentry/speakeasy
  version: 675b82c74c0ed12283ee81ba8a534c8982c07b85
testImports:
- name: github.com/stretchr/testify
  version: 1234
"#;
        let pkgs = parse_glide_lock(content);
        assert!(pkgs.contains_key("github.com/beorn7/perks"));
        assert!(pkgs.contains_key("github.com/beorn7/perks/quantile"));
        assert_eq!(
            pkgs.get("github.com/bgentry/speakeasy"),
            Some(&"675b82c74c0ed12283ee81ba8a534c8982c07b85".to_string())
        );
        // testImports is not part of the dependency set
        assert!(!pkgs.contains_key("github.com/stretchr/testify"));
    }
}

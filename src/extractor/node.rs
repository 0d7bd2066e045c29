use std::path::Path;

use anyhow::Result;
use regex::Regex;
use serde_json::Value;
use tracing::debug;

use super::{Extractor, PackageMap};
use crate::ignore::IgnorePolicy;
use crate::models::Ecosystem;

/// Extracts resolved packages from a `yarn.lock`.
///
/// The format is line-based: an unindented header names the package and
/// its requested ranges, an indented `version "x.y.z"` line pins it.
pub struct YarnLockExtractor;

impl Extractor for YarnLockExtractor {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Node
    }

    fn extract(&self, location: &Path, _ignore: &IgnorePolicy) -> Result<PackageMap> {
        debug!(path = %location.display(), "parsing yarn.lock");
        let content = std::fs::read_to_string(location)?;
        parse_yarn_lock(&content)
    }
}

fn parse_yarn_lock(content: &str) -> Result<PackageMap> {
    let mut gathered = PackageMap::new();
    let mut lines = content.lines().peekable();

    // Header like: foo@^1.0.0: / "@scope/foo@^1.0.0": / comma-separated specs
    let header_re = Regex::new(r#"^"?(@?[^@"]+)@"#)?;
    let version_re = Regex::new(r#"^\s+version\s+"([^"]+)""#)?;

    while let Some(line) = lines.next() {
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if line.starts_with(' ') || line.starts_with('\t') {
            continue;
        }

        let trimmed = line.trim_end_matches(':');
        let first_spec = trimmed.split(", ").next().unwrap_or(trimmed);

        if let Some(caps) = header_re.captures(first_spec) {
            let name = caps[1].to_string();
            let mut version = String::new();

            // scan the entry body for the pinned version
            while let Some(next) = lines.peek() {
                if !next.starts_with(' ') && !next.starts_with('\t') && !next.is_empty() {
                    break;
                }
                if let Some(vcaps) = version_re.captures(next) {
                    version = vcaps[1].to_string();
                    lines.next();
                    break;
                }
                lines.next();
            }

            if !version.is_empty() {
                gathered.insert(name, version);
            }
        }
    }

    Ok(gathered)
}

/// Extracts pinned packages from a `package-lock.json`.
///
/// Understands the v2/v3 `packages` map and falls back to the legacy
/// nested `dependencies` tree.
pub struct PackageLockExtractor;

impl Extractor for PackageLockExtractor {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Node
    }

    fn extract(&self, location: &Path, _ignore: &IgnorePolicy) -> Result<PackageMap> {
        debug!(path = %location.display(), "parsing package-lock.json");
        let content = std::fs::read_to_string(location)?;
        let json: Value = serde_json::from_str(&content)?;

        let mut gathered = PackageMap::new();

        if let Some(packages) = json.get("packages").and_then(|v| v.as_object()) {
            for (pkg_path, info) in packages {
                // the root project is keyed by the empty string
                if pkg_path.is_empty() {
                    continue;
                }
                // "node_modules/a/node_modules/@scope/b" → "@scope/b"
                let name = pkg_path
                    .rsplit_once("node_modules/")
                    .map(|(_, name)| name)
                    .unwrap_or(pkg_path.as_str());
                let version = info
                    .get("version")
                    .and_then(|v| v.as_str())
                    .unwrap_or("")
                    .to_string();
                gathered.insert(name.to_string(), version);
            }
        } else if let Some(deps) = json.get("dependencies").and_then(|v| v.as_object()) {
            collect_legacy(deps, &mut gathered);
        }

        Ok(gathered)
    }
}

fn collect_legacy(deps: &serde_json::Map<String, Value>, gathered: &mut PackageMap) {
    for (name, info) in deps {
        let version = info
            .get("version")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string();
        gathered.insert(name.clone(), version);

        if let Some(nested) = info.get("dependencies").and_then(|v| v.as_object()) {
            collect_legacy(nested, gathered);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_yarn_lock() {
        let content = r#"# THIS IS AN AUTOGENERATED FILE. DO NOT EDIT THIS FILE DIRECTLY.
# yarn lockfile v1


"@types/esrever@^0.2.0":
  version "0.2.0"
  resolved "https://registry.yarnpkg.com/@types/esrever/-/esrever-0.2.0.tgz"
  integrity sha512-abc

d3-array@1, "d3-array@1 - 2", d3-array@^1.2.0:
  version "1.2.4"
  resolved "https://registry.yarnpkg.com/d3-array/-/d3-array-1.2.4.tgz"

loose-envify@^1.1.0:
  version "1.4.0"
"#;
        let pkgs = parse_yarn_lock(content).unwrap();
        assert_eq!(pkgs.get("@types/esrever"), Some(&"0.2.0".to_string()));
        assert_eq!(pkgs.get("d3-array"), Some(&"1.2.4".to_string()));
        assert_eq!(pkgs.get("loose-envify"), Some(&"1.4.0".to_string()));
        assert_eq!(pkgs.len(), 3);
    }

    #[test]
    fn test_parse_package_lock_v3() {
        let dir = tempfile::tempdir().unwrap();
        let lock = dir.path().join("package-lock.json");
        std::fs::write(
            &lock,
            r#"{
  "name": "my-app",
  "lockfileVersion": 3,
  "packages": {
    "": { "name": "my-app", "version": "1.0.0" },
    "node_modules/express": { "version": "4.18.2" },
    "node_modules/express/node_modules/@scope/inner": { "version": "0.1.0" }
  }
}"#,
        )
        .unwrap();

        let pkgs = PackageLockExtractor
            .extract(&lock, &IgnorePolicy::default())
            .unwrap();
        assert_eq!(pkgs.get("express"), Some(&"4.18.2".to_string()));
        assert_eq!(pkgs.get("@scope/inner"), Some(&"0.1.0".to_string()));
        assert_eq!(pkgs.len(), 2);
    }

    #[test]
    fn test_parse_package_lock_legacy() {
        let dir = tempfile::tempdir().unwrap();
        let lock = dir.path().join("package-lock.json");
        std::fs::write(
            &lock,
            r#"{
  "name": "my-app",
  "lockfileVersion": 1,
  "dependencies": {
    "iconv-lite": {
      "version": "0.4.24",
      "dependencies": {
        "safer-buffer": { "version": "2.1.2" }
      }
    }
  }
}"#,
        )
        .unwrap();

        let pkgs = PackageLockExtractor
            .extract(&lock, &IgnorePolicy::default())
            .unwrap();
        assert_eq!(pkgs.get("iconv-lite"), Some(&"0.4.24".to_string()));
        assert_eq!(pkgs.get("safer-buffer"), Some(&"2.1.2".to_string()));
    }
}

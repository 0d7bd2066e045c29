use std::path::Path;

use anyhow::Result;
use regex::Regex;
use tracing::debug;

use super::{Extractor, PackageMap};
use crate::ignore::IgnorePolicy;
use crate::models::Ecosystem;

/// Extracts requirement lines from a `requirements.txt`.
///
/// `name==version` pins keep the version; names with looser specifiers
/// (`>=`, `~=`, bare) are reported without one. VCS and URL requirements
/// are kept whole as the dependency name, since the spec itself is the
/// only stable identifier they have.
pub struct RequirementsExtractor;

impl Extractor for RequirementsExtractor {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Python
    }

    fn extract(&self, location: &Path, _ignore: &IgnorePolicy) -> Result<PackageMap> {
        debug!(path = %location.display(), "parsing requirements.txt");
        let content = std::fs::read_to_string(location)?;
        parse_requirements(&content)
    }
}

fn parse_requirements(content: &str) -> Result<PackageMap> {
    let name_re = Regex::new(r"^([A-Za-z0-9_\-\.]+)(?:\[[^\]]*\])?\s*(==)?\s*([^\s;,#]+)?")?;
    let mut gathered = PackageMap::new();

    for line in content.lines() {
        let line = line.trim();
        // skip blanks, comments and pip options (-r, -e, --index-url, ...)
        if line.is_empty() || line.starts_with('#') || line.starts_with('-') {
            continue;
        }

        // VCS/URL requirement, e.g. git+https://...#egg=name
        if line.contains("://") {
            gathered.insert(line.to_string(), String::new());
            continue;
        }

        if let Some(caps) = name_re.captures(line) {
            let name = caps[1].to_string();
            let version = match (caps.get(2), caps.get(3)) {
                (Some(_), Some(v)) => v.as_str().to_string(),
                _ => String::new(),
            };
            gathered.insert(name, version);
        }
    }

    Ok(gathered)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_requirements() {
        let content = r#"# deps for the service
requests
Flask>=2.0.0
cryptography == 2.3.0
unittest2==0.5.1
numpy==1.24.0 ; python_version >= '3.8'
-r other-requirements.txt
git+https://github.com/candlepin/python-iniparse#egg=iniparse
"#;
        let pkgs = parse_requirements(content).unwrap();
        assert_eq!(pkgs.get("requests"), Some(&String::new()));
        // loose specifier: name kept, version unknown
        assert_eq!(pkgs.get("Flask"), Some(&String::new()));
        assert_eq!(pkgs.get("cryptography"), Some(&"2.3.0".to_string()));
        assert_eq!(pkgs.get("unittest2"), Some(&"0.5.1".to_string()));
        assert_eq!(pkgs.get("numpy"), Some(&"1.24.0".to_string()));
        // the VCS line survives whole
        assert!(pkgs
            .contains_key("git+https://github.com/candlepin/python-iniparse#egg=iniparse"));
        // pip options are not requirements
        assert_eq!(pkgs.len(), 6);
    }

    #[test]
    fn test_extras_are_stripped_from_the_name() {
        let pkgs = parse_requirements("celery[redis]==5.2.7\n").unwrap();
        assert_eq!(pkgs.get("celery"), Some(&"5.2.7".to_string()));
    }
}

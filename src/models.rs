use std::collections::HashSet;

use serde::Serialize;

/// A language/package-manager domain a dependency belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Ecosystem {
    Go,
    Java,
    Node,
    Python,
    Ruby,
    Rust,
}

impl Ecosystem {
    /// The package-URL type string for this ecosystem.
    pub fn purl_type(&self) -> &'static str {
        match self {
            Ecosystem::Go => "golang",
            Ecosystem::Java => "maven",
            Ecosystem::Node => "npm",
            Ecosystem::Python => "pypi",
            Ecosystem::Ruby => "gem",
            Ecosystem::Rust => "cargo",
        }
    }

    fn bit(&self) -> u8 {
        match self {
            Ecosystem::Go => 1 << 0,
            Ecosystem::Java => 1 << 1,
            Ecosystem::Node => 1 << 2,
            Ecosystem::Python => 1 << 3,
            Ecosystem::Ruby => 1 << 4,
            Ecosystem::Rust => 1 << 5,
        }
    }

    const ALL: [Ecosystem; 6] = [
        Ecosystem::Go,
        Ecosystem::Java,
        Ecosystem::Node,
        Ecosystem::Python,
        Ecosystem::Ruby,
        Ecosystem::Rust,
    ];
}

impl std::fmt::Display for Ecosystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Ecosystem::Go => write!(f, "Go"),
            Ecosystem::Java => write!(f, "Java"),
            Ecosystem::Node => write!(f, "Node"),
            Ecosystem::Python => write!(f, "Python"),
            Ecosystem::Ruby => write!(f, "Ruby"),
            Ecosystem::Rust => write!(f, "Rust"),
        }
    }
}

/// Accumulating set of ecosystems found during a scan.
///
/// A tag, once set, is never cleared during the walk; after deduplication
/// the set is recomputed so that a tag is present iff at least one
/// surviving [`Dependency`] of that ecosystem remains.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EcosystemSet(u8);

impl EcosystemSet {
    pub fn insert(&mut self, ecosystem: Ecosystem) {
        self.0 |= ecosystem.bit();
    }

    pub fn contains(&self, ecosystem: Ecosystem) -> bool {
        self.0 & ecosystem.bit() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Iterate the member ecosystems in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = Ecosystem> + '_ {
        Ecosystem::ALL.into_iter().filter(|e| self.contains(*e))
    }
}

impl std::fmt::Display for EcosystemSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<String> = self.iter().map(|e| e.to_string()).collect();
        write!(f, "{}", names.join(", "))
    }
}

/// One discovered package reference.
#[derive(Debug, Clone, Serialize)]
pub struct Dependency {
    pub ecosystem: Ecosystem,
    /// Ecosystem-scoped identifier: Go module path, Maven `group/artifact`,
    /// npm package, crate name, gem name, or a full Python requirement spec.
    pub name: String,
    /// Empty string means unknown/unpinned.
    pub version: String,
    /// Provenance: source files or archives the package was found in.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<String>,
}

impl Dependency {
    /// Render as a package URL, e.g. `pkg:cargo/libc@0.2.142`.
    pub fn purl(&self) -> String {
        if self.version.is_empty() {
            format!("pkg:{}/{}", self.ecosystem.purl_type(), self.name)
        } else {
            format!("pkg:{}/{}@{}", self.ecosystem.purl_type(), self.name, self.version)
        }
    }
}

/// Ordered scan result: every dependency in walk order plus the set of
/// ecosystems they belong to. Built by the single walking thread and
/// consumed read-only afterwards.
#[derive(Debug, Default)]
pub struct Discovery {
    pub deps: Vec<Dependency>,
    pub ecosystems: EcosystemSet,
}

impl Discovery {
    /// Append one extraction's packages, normalizing versions on the way in.
    pub fn add_packages(
        &mut self,
        ecosystem: Ecosystem,
        packages: std::collections::BTreeMap<String, String>,
    ) {
        if !packages.is_empty() {
            self.ecosystems.insert(ecosystem);
        }
        for (name, version) in packages {
            self.deps.push(Dependency {
                ecosystem,
                name,
                version: normalize_version(&version),
                files: Vec::new(),
            });
        }
    }

    /// Like [`add_packages`](Self::add_packages) but records the archive
    /// the packages were found in as provenance.
    pub fn add_bundled_packages(
        &mut self,
        ecosystem: Ecosystem,
        packages: std::collections::BTreeMap<String, String>,
        origin: &std::path::Path,
    ) {
        if !packages.is_empty() {
            self.ecosystems.insert(ecosystem);
        }
        for (name, version) in packages {
            self.deps.push(Dependency {
                ecosystem,
                name,
                version: normalize_version(&version),
                files: vec![origin.display().to_string()],
            });
        }
    }

    /// Drop all but the first occurrence of each `(ecosystem, name)` key,
    /// then recompute the ecosystem set from the survivors.
    pub fn dedup(&mut self) {
        let mut seen: HashSet<(Ecosystem, String)> = HashSet::new();
        self.deps
            .retain(|d| seen.insert((d.ecosystem, d.name.clone())));

        let mut set = EcosystemSet::default();
        for dep in &self.deps {
            set.insert(dep.ecosystem);
        }
        self.ecosystems = set;
    }
}

/// Normalize a raw version string from an extractor.
///
/// Go-style tag prefixes (`v0.3.3`) lose the `v`; the placeholder values
/// `"0"` and `"unknown"` collapse to empty, which means "unknown".
pub fn normalize_version(raw: &str) -> String {
    if raw == "0" || raw == "unknown" {
        return String::new();
    }
    if let Some(rest) = raw.strip_prefix('v') {
        if rest.starts_with(|c: char| c.is_ascii_digit()) {
            return rest.to_string();
        }
    }
    raw.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_ecosystem_set_operations() {
        let mut set = EcosystemSet::default();
        assert!(set.is_empty());

        set.insert(Ecosystem::Go);
        set.insert(Ecosystem::Ruby);
        assert!(set.contains(Ecosystem::Go));
        assert!(set.contains(Ecosystem::Ruby));
        assert!(!set.contains(Ecosystem::Node));

        // inserting twice is a no-op
        set.insert(Ecosystem::Go);
        let members: Vec<Ecosystem> = set.iter().collect();
        assert_eq!(members, vec![Ecosystem::Go, Ecosystem::Ruby]);
    }

    #[test]
    fn test_normalize_version() {
        assert_eq!(normalize_version("v0.3.3"), "0.3.3");
        assert_eq!(normalize_version("1.2.3"), "1.2.3");
        assert_eq!(normalize_version("0"), "");
        assert_eq!(normalize_version("unknown"), "");
        assert_eq!(normalize_version(""), "");
        // not a tagged version, leave alone
        assert_eq!(normalize_version("very-custom"), "very-custom");
    }

    #[test]
    fn test_purl_rendering() {
        let dep = Dependency {
            ecosystem: Ecosystem::Rust,
            name: "libc".to_string(),
            version: "0.2.142".to_string(),
            files: Vec::new(),
        };
        assert_eq!(dep.purl(), "pkg:cargo/libc@0.2.142");

        let unpinned = Dependency {
            ecosystem: Ecosystem::Python,
            name: "requests".to_string(),
            version: String::new(),
            files: Vec::new(),
        };
        assert_eq!(unpinned.purl(), "pkg:pypi/requests");
    }

    #[test]
    fn test_add_packages_sets_ecosystem_bit() {
        let mut discovery = Discovery::default();
        discovery.add_packages(Ecosystem::Go, BTreeMap::new());
        assert!(discovery.ecosystems.is_empty());

        let mut pkgs = BTreeMap::new();
        pkgs.insert("golang.org/x/text".to_string(), "v0.3.3".to_string());
        discovery.add_packages(Ecosystem::Go, pkgs);
        assert!(discovery.ecosystems.contains(Ecosystem::Go));
        assert_eq!(discovery.deps[0].version, "0.3.3");
    }

    #[test]
    fn test_dedup_keeps_first_occurrence() {
        let mut discovery = Discovery::default();
        let mut first = BTreeMap::new();
        first.insert("serde".to_string(), "1.0.150".to_string());
        discovery.add_packages(Ecosystem::Rust, first);

        let mut second = BTreeMap::new();
        second.insert("serde".to_string(), "1.0.200".to_string());
        second.insert("libc".to_string(), "0.2.142".to_string());
        discovery.add_packages(Ecosystem::Rust, second);

        discovery.dedup();
        assert_eq!(discovery.deps.len(), 2);
        let serde = discovery.deps.iter().find(|d| d.name == "serde").unwrap();
        // the later 1.0.200 record is dropped, version and all
        assert_eq!(serde.version, "1.0.150");
    }

    #[test]
    fn test_dedup_recomputes_ecosystem_set() {
        let mut discovery = Discovery::default();
        let mut pkgs = BTreeMap::new();
        pkgs.insert("rake".to_string(), "13.0.6".to_string());
        discovery.add_packages(Ecosystem::Ruby, pkgs);
        discovery.dedup();

        assert!(discovery.ecosystems.contains(Ecosystem::Ruby));
        assert!(!discovery.ecosystems.contains(Ecosystem::Rust));
    }
}

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use anyhow::Result;

use crate::ignore::IgnorePolicy;
use crate::models::Ecosystem;

pub mod golang;
pub mod java;
pub mod node;
pub mod python;
pub mod ruby;
pub mod rust;

/// Package name → version mapping produced by one extraction.
/// Ordered so that aggregation stays deterministic.
pub type PackageMap = BTreeMap<String, String>;

/// One ecosystem-specific extraction capability.
///
/// `location` is a manifest/lockfile path, or a directory for ecosystems
/// whose tooling wants one (Ruby). Extractors never mutate shared state;
/// results flow back purely through the return value. The active ignore
/// policy is passed along so nested scans apply the same exclusions.
pub trait Extractor {
    fn ecosystem(&self) -> Ecosystem;
    fn extract(&self, location: &Path, ignore: &IgnorePolicy) -> Result<PackageMap>;
}

/// The full set of extractors the walker dispatches to, one per marker.
///
/// Held as trait objects so individual slots can be swapped for mocks.
pub struct Registry {
    pub go_mod: Box<dyn Extractor>,
    pub gopkg_lock: Box<dyn Extractor>,
    pub glide_lock: Box<dyn Extractor>,
    pub cargo_lock: Box<dyn Extractor>,
    pub yarn_lock: Box<dyn Extractor>,
    pub package_lock: Box<dyn Extractor>,
    pub pom: Box<dyn Extractor>,
    pub archive: Box<dyn Extractor>,
    pub requirements: Box<dyn Extractor>,
    pub gemfile: Box<dyn Extractor>,
}

impl Registry {
    pub fn new(ruby_lock_timeout: Duration) -> Self {
        Registry {
            go_mod: Box::new(golang::GoModExtractor),
            gopkg_lock: Box::new(golang::GopkgLockExtractor),
            glide_lock: Box::new(golang::GlideLockExtractor),
            cargo_lock: Box::new(rust::CargoLockExtractor),
            yarn_lock: Box::new(node::YarnLockExtractor),
            package_lock: Box::new(node::PackageLockExtractor),
            pom: Box::new(java::PomExtractor),
            archive: Box::new(java::ArchiveExtractor),
            requirements: Box::new(python::RequirementsExtractor),
            gemfile: Box::new(ruby::GemfileExtractor::new(ruby_lock_timeout)),
        }
    }
}

impl Default for Registry {
    fn default() -> Self {
        Registry::new(Duration::from_secs(300))
    }
}

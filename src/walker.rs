use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use crate::basedir;
use crate::error::DiscoverError;
use crate::extractor::{java, Extractor, Registry};
use crate::ignore::IgnorePolicy;
use crate::models::{Discovery, Ecosystem};

/// Scan a source tree for dependencies across all supported ecosystems.
///
/// The root is normalized through base-directory resolution first; if the
/// walk finds nothing, it is retried once against a conventional `src`
/// subdirectory. A non-`None` error means the returned [`Discovery`] is a
/// best-effort partial.
pub fn discover(root: &Path, extra_ignore: &[String]) -> (Discovery, Option<DiscoverError>) {
    discover_with(root, extra_ignore, &Registry::default())
}

/// [`discover`] with a caller-supplied extractor registry.
pub fn discover_with(
    root: &Path,
    extra_ignore: &[String],
    registry: &Registry,
) -> (Discovery, Option<DiscoverError>) {
    let policy = IgnorePolicy::new(extra_ignore);
    let root = match basedir::resolve(root) {
        Ok(path) => path,
        Err(err) => return (Discovery::default(), Some(err)),
    };

    let mut discovery = Discovery::default();
    let err = walk(&root, &policy, registry, &mut discovery).err();

    // nothing at the top? check one level down in src, ignoring new errors
    if err.is_none() && discovery.deps.is_empty() {
        let src = root.join("src");
        if src.is_dir() {
            debug!(path = %src.display(), "no dependencies found, retrying in src");
            let _ = walk(&src, &policy, registry, &mut discovery);
        }
    }

    discovery.dedup();
    (discovery, err)
}

/// One depth-first pass over `root`, appending everything found to `acc`.
fn walk(
    root: &Path,
    policy: &IgnorePolicy,
    registry: &Registry,
    acc: &mut Discovery,
) -> Result<(), DiscoverError> {
    // manifests of record live at the walk root only
    let pom_path = root.join("pom.xml");
    let gopkg_path = root.join("Gopkg.lock");
    let glide_path = root.join("glide.lock");
    let gemfile_path = root.join("Gemfile");
    let requirements_path = root.join("requirements.txt");

    let mut seen_gemfile: Option<PathBuf> = None;

    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            !(entry.file_type().is_dir()
                && entry
                    .file_name()
                    .to_str()
                    .map(|name| policy.is_ignored(name))
                    .unwrap_or(false))
        });

    for entry in walker {
        let entry = entry.map_err(|err| {
            let path = err
                .path()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| root.to_path_buf());
            let source = err
                .into_io_error()
                .unwrap_or_else(|| std::io::Error::other("filesystem loop"));
            DiscoverError::Traversal { path, source }
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let file_name = entry.file_name().to_string_lossy().into_owned();

        // filename markers fire at any depth; failures skip the file
        match file_name.as_str() {
            "go.mod" => best_effort(acc, registry.go_mod.as_ref(), path, policy),
            "Cargo.lock" => best_effort(acc, registry.cargo_lock.as_ref(), path, policy),
            "yarn.lock" => best_effort(acc, registry.yarn_lock.as_ref(), path, policy),
            "package-lock.json" => {
                // a sibling yarn.lock supersedes the npm lockfile
                if path.with_file_name("yarn.lock").exists() {
                    debug!(path = %path.display(), "yarn.lock present, skipping package-lock.json");
                } else {
                    best_effort(acc, registry.package_lock.as_ref(), path, policy);
                }
            }
            _ => try_archive(acc, registry, path, policy),
        }

        // manifests of record, matched by full path against the walk root;
        // both Gemfile spellings converge on one canonical key
        let canonical = if file_name == "Gemfile.lock" {
            path.with_file_name("Gemfile")
        } else {
            path.to_path_buf()
        };

        if canonical == pom_path {
            fatal(acc, registry.pom.as_ref(), &canonical, policy)?;
        } else if canonical == gopkg_path {
            fatal(acc, registry.gopkg_lock.as_ref(), &canonical, policy)?;
        } else if canonical == glide_path {
            fatal(acc, registry.glide_lock.as_ref(), &canonical, policy)?;
        } else if canonical == gemfile_path {
            if seen_gemfile.as_deref() != Some(canonical.as_path()) {
                // the Ruby toolchain wants the directory, not the manifest
                let dir = canonical.parent().unwrap_or(root).to_path_buf();
                fatal_at(acc, registry.gemfile.as_ref(), &dir, &canonical, policy)?;
                seen_gemfile = Some(canonical);
            }
        } else if canonical == requirements_path {
            fatal(acc, registry.requirements.as_ref(), &canonical, policy)?;
        }
    }

    Ok(())
}

fn best_effort(
    acc: &mut Discovery,
    extractor: &dyn Extractor,
    path: &Path,
    policy: &IgnorePolicy,
) {
    match extractor.extract(path, policy) {
        Ok(pkgs) => acc.add_packages(extractor.ecosystem(), pkgs),
        Err(err) => {
            debug!(path = %path.display(), %err, "extraction failed, skipping file");
        }
    }
}

fn try_archive(acc: &mut Discovery, registry: &Registry, path: &Path, policy: &IgnorePolicy) {
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return;
    };
    let qualifies = match ext {
        "jar" | "war" | "ear" | "adm" | "hpi" => true,
        // plain zips must contain something Java-ish
        "zip" => java::zip_contains_java(path).unwrap_or(false),
        _ => false,
    };
    if !qualifies {
        return;
    }
    if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
        if stem.ends_with("-sources") || stem.ends_with("-javadoc") {
            return;
        }
    }

    match registry.archive.extract(path, policy) {
        Ok(pkgs) => acc.add_bundled_packages(Ecosystem::Java, pkgs, path),
        Err(err) => {
            debug!(path = %path.display(), %err, "archive scan failed, skipping file");
        }
    }
}

fn fatal(
    acc: &mut Discovery,
    extractor: &dyn Extractor,
    path: &Path,
    policy: &IgnorePolicy,
) -> Result<(), DiscoverError> {
    fatal_at(acc, extractor, path, path, policy)
}

/// Run a manifest-of-record extraction; `location` is what the extractor
/// receives, `origin` is the marker file named in any error.
fn fatal_at(
    acc: &mut Discovery,
    extractor: &dyn Extractor,
    location: &Path,
    origin: &Path,
    policy: &IgnorePolicy,
) -> Result<(), DiscoverError> {
    let pkgs = extractor
        .extract(location, policy)
        .map_err(|source| DiscoverError::Extractor {
            ecosystem: extractor.ecosystem(),
            path: origin.to_path_buf(),
            source,
        })?;
    acc.add_packages(extractor.ecosystem(), pkgs);
    Ok(())
}

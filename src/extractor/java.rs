use std::io::Read;
use std::path::Path;

use anyhow::Result;
use quick_xml::events::Event;
use quick_xml::Reader;
use regex::Regex;
use tracing::debug;

use super::{Extractor, PackageMap};
use crate::ignore::IgnorePolicy;
use crate::models::Ecosystem;

/// Extracts declared dependencies from a top-level `pom.xml`.
///
/// Names are reported as `group/artifact`. Versions that reference an
/// unresolved Maven property (`${...}`) are reported as unknown rather
/// than leaking the placeholder.
pub struct PomExtractor;

impl Extractor for PomExtractor {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Java
    }

    fn extract(&self, location: &Path, _ignore: &IgnorePolicy) -> Result<PackageMap> {
        debug!(path = %location.display(), "parsing pom.xml");
        let content = std::fs::read_to_string(location)?;
        parse_pom_xml(&content)
    }
}

fn maven_key(group_id: &str, artifact_id: &str) -> String {
    if group_id.is_empty() {
        artifact_id.to_string()
    } else {
        format!("{}/{}", group_id, artifact_id)
    }
}

/// Parse `pom.xml` using the quick-xml event API.
fn parse_pom_xml(content: &str) -> Result<PackageMap> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    let mut gathered = PackageMap::new();
    let mut buf = Vec::new();

    let mut in_dependencies = false;
    let mut depth: u32 = 0;
    let mut dependencies_depth: u32 = 0;

    let mut in_dependency = false;
    let mut in_exclusions = false;
    let mut current_tag = String::new();
    let mut group_id = String::new();
    let mut artifact_id = String::new();
    let mut version = String::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                depth += 1;
                let name =
                    String::from_utf8_lossy(e.name().local_name().as_ref()).into_owned();
                current_tag = name.clone();

                match name.as_str() {
                    "dependencies" if !in_dependency => {
                        in_dependencies = true;
                        dependencies_depth = depth;
                    }
                    "dependency" if in_dependencies && !in_exclusions => {
                        in_dependency = true;
                        group_id.clear();
                        artifact_id.clear();
                        version.clear();
                    }
                    "exclusions" if in_dependency => {
                        in_exclusions = true;
                    }
                    _ => {}
                }
            }
            Ok(Event::End(ref e)) => {
                let name =
                    String::from_utf8_lossy(e.name().local_name().as_ref()).into_owned();

                if name == "exclusions" {
                    in_exclusions = false;
                } else if name == "dependency" && in_dependency && !in_exclusions {
                    if !artifact_id.is_empty() {
                        // property placeholders cannot be resolved statically
                        let resolved = if version.starts_with("${") {
                            String::new()
                        } else {
                            version.clone()
                        };
                        gathered.insert(maven_key(&group_id, &artifact_id), resolved);
                    }
                    in_dependency = false;
                } else if name == "dependencies" && depth == dependencies_depth {
                    in_dependencies = false;
                }

                depth = depth.saturating_sub(1);
                current_tag.clear();
            }
            Ok(Event::Text(ref e)) => {
                // excluded coordinates must not clobber the dependency's own
                if in_dependency && !in_exclusions {
                    let text = e.unescape().unwrap_or_default();
                    match current_tag.as_str() {
                        "groupId" => group_id = text.to_string(),
                        "artifactId" => artifact_id = text.to_string(),
                        "version" => version = text.to_string(),
                        _ => {}
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(err) => return Err(err.into()),
            _ => {}
        }
        buf.clear();
    }

    Ok(gathered)
}

/// Extracts bundled dependencies from a Java archive (jar/war/ear/...).
///
/// Packages are identified from `META-INF/maven/**/pom.properties` entries
/// when present; nested jars without Maven metadata fall back to a
/// `name-<version>.jar` filename heuristic. Source and javadoc artifacts
/// carry no runtime dependencies and are dropped.
pub struct ArchiveExtractor;

impl Extractor for ArchiveExtractor {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Java
    }

    fn extract(&self, location: &Path, _ignore: &IgnorePolicy) -> Result<PackageMap> {
        debug!(path = %location.display(), "scanning archive");
        let file = std::fs::File::open(location)?;
        let mut archive = zip::ZipArchive::new(file)?;
        let names: Vec<String> = archive.file_names().map(String::from).collect();

        let mut gathered = PackageMap::new();

        for name in &names {
            if !name.ends_with("pom.properties") {
                continue;
            }
            let mut entry = archive.by_name(name)?;
            let mut buf = String::new();
            if entry.read_to_string(&mut buf).is_err() {
                continue;
            }
            if let Some((key, version)) = parse_pom_properties(&buf) {
                if is_doc_artifact(&version) {
                    continue;
                }
                gathered.insert(key, version);
            }
        }

        // nested jars without Maven metadata
        let jar_re = Regex::new(r"([^/]+?)-(\d[^/]*?)\.jar$")?;
        for name in &names {
            if let Some(caps) = jar_re.captures(name) {
                let (pkg, version) = (caps[1].to_string(), caps[2].to_string());
                if is_doc_artifact(&version) || pkg.ends_with("-sources") || pkg.ends_with("-javadoc")
                {
                    continue;
                }
                gathered.entry(pkg).or_insert(version);
            }
        }

        Ok(gathered)
    }
}

fn parse_pom_properties(content: &str) -> Option<(String, String)> {
    let mut group_id = "";
    let mut artifact_id = "";
    let mut version = "";
    for line in content.lines() {
        if let Some((key, value)) = line.split_once('=') {
            match key.trim() {
                "groupId" => group_id = value.trim(),
                "artifactId" => artifact_id = value.trim(),
                "version" => version = value.trim(),
                _ => {}
            }
        }
    }
    if artifact_id.is_empty() {
        return None;
    }
    Some((maven_key(group_id, artifact_id), version.to_string()))
}

fn is_doc_artifact(version: &str) -> bool {
    version.ends_with("-sources") || version.ends_with("-javadoc")
}

/// Quickly scan a zip for anything Java-ish; plain zips only qualify as
/// Java archives when they hold at least one such entry.
pub fn zip_contains_java(path: &Path) -> Result<bool> {
    let file = std::fs::File::open(path)?;
    let archive = zip::ZipArchive::new(file)?;

    for name in archive.file_names() {
        if let Some(ext) = Path::new(name).extension().and_then(|e| e.to_str()) {
            if matches!(ext, "java" | "war" | "ear" | "jar") {
                return Ok(true);
            }
        }
    }
    Ok(false)
}

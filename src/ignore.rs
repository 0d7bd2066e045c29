use std::collections::HashSet;

/// Directory names that are never descended into.
///
/// Covers version control metadata, vendored dependency caches, build
/// output and test fixture trees: places where marker files describe
/// someone else's dependencies, not this repo's.
const DEFAULT_IGNORE: &[&str] = &[
    ".git",
    ".hg",
    ".svn",
    ".github",
    "node_modules",
    "vendor",
    "bundle",
    "__pycache__",
    "target",
    "docs",
    "doc",
    "example",
    "examples",
    "test",
    "tests",
    "testdata",
    "fixtures",
];

/// Decides which directory subtrees the walker skips entirely.
///
/// Matching is exact and case-sensitive against the directory's base name.
#[derive(Debug, Clone)]
pub struct IgnorePolicy {
    names: HashSet<String>,
}

impl IgnorePolicy {
    /// Build the policy from the built-in defaults plus caller-supplied names.
    pub fn new(extra: &[String]) -> Self {
        let mut names: HashSet<String> =
            DEFAULT_IGNORE.iter().map(|s| s.to_string()).collect();
        for name in extra {
            if !name.is_empty() {
                names.insert(name.clone());
            }
        }
        IgnorePolicy { names }
    }

    /// True if a directory with this base name must be pruned.
    pub fn is_ignored(&self, dir_name: &str) -> bool {
        self.names.contains(dir_name)
    }
}

impl Default for IgnorePolicy {
    fn default() -> Self {
        IgnorePolicy::new(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_cover_common_caches() {
        let policy = IgnorePolicy::default();
        assert!(policy.is_ignored("node_modules"));
        assert!(policy.is_ignored(".git"));
        assert!(policy.is_ignored("vendor"));
        assert!(policy.is_ignored("tests"));
        assert!(!policy.is_ignored("src"));
    }

    #[test]
    fn test_matching_is_case_sensitive() {
        let policy = IgnorePolicy::default();
        assert!(!policy.is_ignored("Tests"));
        assert!(!policy.is_ignored("NODE_MODULES"));
    }

    #[test]
    fn test_extra_names_are_unioned() {
        let policy = IgnorePolicy::new(&["generated".to_string(), String::new()]);
        assert!(policy.is_ignored("generated"));
        assert!(policy.is_ignored("node_modules"));
        assert!(!policy.is_ignored(""));
    }
}

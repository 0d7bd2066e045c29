use std::ffi::OsStr;
use std::path::PathBuf;

// Ruby extraction shells out to Bundler; everything else is parsed in-process.
const REQUIRED: &[&str] = &["bundle"];

/// External binaries the scanner wants but cannot find on `PATH`.
///
/// A missing binary is not fatal up front; the affected ecosystem fails
/// at extraction time instead, so trees without that ecosystem scan fine.
pub fn missing_binaries() -> Vec<&'static str> {
    let path = std::env::var_os("PATH").unwrap_or_default();
    REQUIRED
        .iter()
        .copied()
        .filter(|binary| find_in(&path, binary).is_none())
        .collect()
}

fn find_in(path_var: &OsStr, binary: &str) -> Option<PathBuf> {
    std::env::split_paths(path_var)
        .map(|dir| dir.join(binary))
        .find(|candidate| candidate.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_in_locates_a_binary() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bundle"), "#!/bin/sh\n").unwrap();

        let path_var = dir.path().as_os_str().to_os_string();
        assert!(find_in(&path_var, "bundle").is_some());
        assert!(find_in(&path_var, "rbenv").is_none());
    }

    #[test]
    fn test_find_in_empty_path() {
        assert!(find_in(OsStr::new(""), "bundle").is_none());
    }
}

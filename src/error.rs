use std::path::PathBuf;

use thiserror::Error;

use crate::models::Ecosystem;

/// Fatal failures a discovery run can end with.
///
/// Recoverable extractor failures (depth-anywhere markers, archives) never
/// surface here; they are logged and the walk continues. A non-`None` error
/// returned from [`discover`](crate::walker::discover) means the attached
/// result is a best-effort partial, not authoritative.
#[derive(Debug, Error)]
pub enum DiscoverError {
    /// The root path does not exist or cannot be listed.
    #[error("path not found: {0}")]
    NotFound(PathBuf),

    /// A directory could not be read mid-walk.
    #[error("failed to read {path}")]
    Traversal {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A top-level manifest of record failed to extract.
    #[error("{ecosystem} extraction failed for {path}")]
    Extractor {
        ecosystem: Ecosystem,
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },
}

/// Every candidate Ruby runtime failed to lock and list the bundle.
///
/// Raised by the Ruby retry coordinator and carried inside
/// [`DiscoverError::Extractor`]; the path is the Gemfile that triggered
/// the extraction.
#[derive(Debug, Error)]
#[error("all candidate Ruby runtimes failed for {0}")]
pub struct RetryExhausted(pub PathBuf);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_exhausted_is_downcastable() {
        let err = DiscoverError::Extractor {
            ecosystem: Ecosystem::Ruby,
            path: PathBuf::from("/repo/Gemfile"),
            source: RetryExhausted(PathBuf::from("/repo/Gemfile")).into(),
        };
        match err {
            DiscoverError::Extractor { source, .. } => {
                assert!(source.downcast_ref::<RetryExhausted>().is_some());
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_error_messages_name_the_path() {
        let err = DiscoverError::NotFound(PathBuf::from("/missing"));
        assert_eq!(err.to_string(), "path not found: /missing");
    }
}

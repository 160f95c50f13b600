use std::path::PathBuf;

/// Error type for ebuild generation.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum Error {
    /// A `requires_dist` entry that does not start with a package name.
    #[error("invalid requirement: {0}")]
    InvalidRequirement(String),

    /// An extra that cannot be turned into a USE flag.
    #[error("invalid USE flag: {0}")]
    InvalidUseFlag(String),

    /// A version string that is not PEP 440.
    #[error("invalid version: {0}")]
    InvalidVersion(String),

    /// A configuration value that cannot be used.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The registry has no package under this name.
    #[error("package not found on the registry: {0}")]
    PackageNotFound(String),

    /// The registry could not be reached or answered with an error status.
    #[error("failed to fetch {package}: {message}")]
    Fetch {
        /// Requested package name.
        package: String,
        /// Transport or status description.
        message: String,
    },

    /// The registry answered with a document missing a required field.
    #[error("unexpected metadata for {package}: {message}")]
    Schema {
        /// Requested package name.
        package: String,
        /// What was wrong with the document.
        message: String,
    },

    /// A descriptor or repository file could not be written.
    #[error("failed to write {}: {message}", path.display())]
    Write {
        /// Path being written.
        path: PathBuf,
        /// Underlying I/O error.
        message: String,
    },

    /// A package tree could not be listed.
    #[error("failed to scan {}: {message}", path.display())]
    Scan {
        /// Directory being listed.
        path: PathBuf,
        /// Underlying I/O error.
        message: String,
    },
}

impl Error {
    pub(crate) fn write(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        Error::Write {
            path: path.into(),
            message: err.to_string(),
        }
    }
}

/// Result type for ebuild generation.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_error_names_package() {
        let err = Error::Fetch {
            package: "requests".to_string(),
            message: "HTTP 503".to_string(),
        };
        assert_eq!(err.to_string(), "failed to fetch requests: HTTP 503");
    }

    #[test]
    fn write_error_shows_path() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = Error::write("/repo/dev-python/foo/foo-1.0.ebuild", io);
        let msg = err.to_string();
        assert!(msg.contains("/repo/dev-python/foo/foo-1.0.ebuild"));
        assert!(msg.contains("denied"));
    }
}

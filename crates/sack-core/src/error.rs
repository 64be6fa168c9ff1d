//! Error types for the sack-core crate.
//!
//! This module provides the [`ConfigError`] type for configuration-related errors
//! that can occur across the workspace.

use camino::Utf8PathBuf;

/// Errors that can occur during configuration loading, saving, and validation.
///
/// # Examples
///
/// ```
/// use sack_core::ConfigError;
///
/// let error = ConfigError::MissingPageNumber("intro".to_owned());
/// assert!(error.to_string().contains("intro"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file could not be read or written.
    #[error("failed to access configuration file {path}: {source}")]
    Io {
        /// The file that could not be accessed.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The YAML document could not be decoded or encoded.
    #[error("failed to parse configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A page key carries no page number (e.g. `intro` instead of `page3`).
    #[error("page key '{0}' does not contain a number")]
    MissingPageNumber(String),

    /// A configuration option has an invalid value.
    #[error("invalid configuration option '{option}': {reason}")]
    InvalidOption {
        /// The name of the invalid option.
        option: String,
        /// Explanation of why the option is invalid.
        reason: String,
    },
}

impl ConfigError {
    /// Creates a new [`ConfigError::Io`] error for the given path.
    #[inline]
    pub fn io(path: impl Into<Utf8PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates a new [`ConfigError::InvalidOption`] error.
    #[inline]
    pub fn invalid_option(option: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidOption {
            option: option.into(),
            reason: reason.into(),
        }
    }

    /// Returns `true` if the underlying cause is a missing file.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_io_error_display() {
        let error = ConfigError::io(
            "config.yaml",
            io::Error::new(io::ErrorKind::NotFound, "gone"),
        );
        let msg = error.to_string();
        assert!(msg.contains("config.yaml"));
        assert!(msg.contains("gone"));
        assert!(error.is_not_found());
    }

    #[test]
    fn test_missing_page_number_display() {
        let error = ConfigError::MissingPageNumber("intro".to_owned());
        assert_eq!(error.to_string(), "page key 'intro' does not contain a number");
        assert!(!error.is_not_found());
    }

    #[test]
    fn test_invalid_option_display() {
        let error = ConfigError::invalid_option("batch", "must be between 1 and 1024");
        let msg = error.to_string();
        assert!(msg.contains("batch"));
        assert!(msg.contains("1024"));
    }
}

//! Error types for the sack-site crate.

use camino::Utf8PathBuf;
use sack_core::ConfigError;

/// Errors that can occur while rendering pages or generating page entries.
///
/// # Examples
///
/// ```
/// use sack_site::SiteError;
///
/// let err = SiteError::NoReferencePage;
/// assert!(err.to_string().contains("no existing pages"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum SiteError {
    /// The page collection could not be loaded, saved, or ordered.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The page template could not be read.
    #[error("failed to read template {path}: {source}")]
    Template {
        /// The template file.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A rendered page could not be written.
    #[error("failed to write page {path}: {source}")]
    Write {
        /// The output file.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Reading an answer or writing a prompt failed.
    #[error("prompt failed: {0}")]
    Prompt(#[source] std::io::Error),

    /// Batch generation needs at least one page to copy designer details from.
    #[error("no existing pages to reference")]
    NoReferencePage,
}

impl SiteError {
    /// Creates a new [`SiteError::Template`] error.
    #[inline]
    pub fn template(path: impl Into<Utf8PathBuf>, source: std::io::Error) -> Self {
        Self::Template {
            path: path.into(),
            source,
        }
    }

    /// Creates a new [`SiteError::Write`] error.
    #[inline]
    pub fn write(path: impl Into<Utf8PathBuf>, source: std::io::Error) -> Self {
        Self::Write {
            path: path.into(),
            source,
        }
    }

    /// Returns `true` if a template or page file does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Template { source, .. } | Self::Write { source, .. } => {
                source.kind() == std::io::ErrorKind::NotFound
            }
            Self::Config(err) => err.is_not_found(),
            Self::Prompt(_) | Self::NoReferencePage => false,
        }
    }

    /// Returns the file path associated with this error, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Utf8PathBuf> {
        match self {
            Self::Template { path, .. }
            | Self::Write { path, .. }
            | Self::Config(ConfigError::Io { path, .. }) => Some(path),
            Self::Config(_) | Self::Prompt(_) | Self::NoReferencePage => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_template_error() {
        let err = SiteError::template(
            "ui/html/templates/base.html",
            io::Error::new(io::ErrorKind::NotFound, "missing"),
        );
        assert_eq!(
            err.path().map(|p| p.as_str()),
            Some("ui/html/templates/base.html")
        );
        assert!(err.to_string().starts_with("failed to read template"));
    }

    #[test]
    fn test_config_error_is_transparent() {
        let err = SiteError::from(ConfigError::MissingPageNumber("intro".to_owned()));
        assert_eq!(err.to_string(), "page key 'intro' does not contain a number");
        assert!(err.path().is_none());
    }

    #[test]
    fn test_config_io_error_has_path() {
        let err = SiteError::from(ConfigError::io(
            "config.yaml",
            io::Error::new(io::ErrorKind::NotFound, "missing"),
        ));
        assert_eq!(err.path().map(|p| p.as_str()), Some("config.yaml"));
    }
}

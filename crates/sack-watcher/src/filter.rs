//! Gitignore-style filtering for watch events.
//!
//! Rules come from a plain text file with one shell glob per line. Blank
//! lines and lines starting with `#` are skipped. There is no negation, no
//! directory anchoring and no `**`: each rule is matched against the final
//! path component only, the way `fnmatch` matches a base name.
//!
//! # Examples
//!
//! ```
//! use sack_watcher::{FileFilter, IgnoreRules};
//! use camino::Utf8Path;
//!
//! let rules = IgnoreRules::parse("# editor files\n*.swp\n\n4913\n");
//! assert_eq!(rules.len(), 2);
//!
//! assert!(rules.is_ignored(Utf8Path::new("ui/html/.index.html.swp")));
//! assert!(!rules.is_ignored(Utf8Path::new("ui/html/index.html")));
//! assert!(rules.should_process(Utf8Path::new("ui/html/index.html")));
//! ```

use std::fmt;

use camino::Utf8Path;
use glob::Pattern;

use crate::error::WatchError;

/// A filter for determining which change events to act on.
///
/// # Thread Safety
///
/// Filters must be [`Send`] and [`Sync`] because they are moved into the
/// spawned broadcast task and must be `'static` for the same reason.
///
/// # Examples
///
/// ```
/// use sack_watcher::FileFilter;
/// use camino::Utf8Path;
///
/// struct HtmlOnly;
///
/// impl FileFilter for HtmlOnly {
///     fn should_process(&self, path: &Utf8Path) -> bool {
///         path.extension() == Some("html")
///     }
/// }
///
/// assert!(HtmlOnly.should_process(Utf8Path::new("index.html")));
/// ```
pub trait FileFilter: Send + Sync + 'static {
    /// Returns `true` if a change to `path` should be acted on.
    fn should_process(&self, path: &Utf8Path) -> bool;
}

/// A filter that accepts all files.
///
/// ```
/// use sack_watcher::{FileFilter, AcceptAllFilter};
/// use camino::Utf8Path;
///
/// assert!(AcceptAllFilter.should_process(Utf8Path::new("anything.tmp")));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAllFilter;

impl FileFilter for AcceptAllFilter {
    #[inline]
    fn should_process(&self, _path: &Utf8Path) -> bool {
        true
    }
}

/// A single ignore pattern.
///
/// The raw text is kept verbatim; the compiled glob is `Err` with the
/// compiler's message if the pattern is malformed, in which case the rule
/// never matches.
#[derive(Debug, Clone)]
pub struct IgnoreRule {
    raw: String,
    compiled: Result<Pattern, String>,
}

impl IgnoreRule {
    /// Compiles a rule from its pattern text.
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let compiled = Pattern::new(&raw).map_err(|err| err.to_string());
        Self { raw, compiled }
    }

    /// Returns the pattern text as written in the ignore file.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Returns `true` if the pattern compiled.
    #[inline]
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.compiled.is_ok()
    }

    /// Returns the compile error message for a malformed pattern.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.compiled.as_ref().err().map(String::as_str)
    }

    /// Matches the rule against a single path component.
    ///
    /// Malformed patterns never match.
    #[must_use]
    pub fn matches_name(&self, name: &str) -> bool {
        match &self.compiled {
            Ok(pattern) => pattern.matches(name),
            Err(err) => {
                tracing::debug!(pattern = %self.raw, error = %err, "Skipping malformed ignore pattern");
                false
            }
        }
    }
}

impl fmt::Display for IgnoreRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// The ordered set of ignore rules loaded at startup.
///
/// Immutable once built. An empty set ignores nothing.
#[derive(Debug, Clone, Default)]
pub struct IgnoreRules {
    rules: Vec<IgnoreRule>,
}

impl IgnoreRules {
    /// Creates an empty rule set.
    #[inline]
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parses rules from ignore file contents.
    ///
    /// Malformed patterns are logged and kept; they simply never match.
    #[must_use]
    pub fn parse(contents: &str) -> Self {
        let rules: Vec<IgnoreRule> = contents
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(IgnoreRule::new)
            .collect();

        for rule in rules.iter().filter(|rule| !rule.is_valid()) {
            if let Some(err) = rule.error() {
                tracing::warn!(pattern = %rule, error = %err, "Invalid ignore pattern, rule disabled");
            }
        }

        Self { rules }
    }

    /// Loads rules from the ignore file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`WatchError::IgnoreFile`] if the file cannot be opened or read.
    pub fn load(path: &Utf8Path) -> Result<Self, WatchError> {
        let contents = std::fs::read_to_string(path).map_err(|source| WatchError::IgnoreFile {
            path: path.to_owned(),
            source,
        })?;
        let rules = Self::parse(&contents);
        tracing::debug!(path = %path, rules = rules.len(), "Loaded ignore rules");
        Ok(rules)
    }

    /// Loads rules from `path`, falling back to an empty set when the file is
    /// missing or unreadable.
    #[must_use]
    pub fn load_or_empty(path: &Utf8Path) -> Self {
        Self::load(path).unwrap_or_else(|err| {
            tracing::warn!(error = %err, "Could not load ignore rules, filtering disabled");
            Self::empty()
        })
    }

    /// Returns `true` if any rule matches the final component of `path`.
    #[must_use]
    pub fn is_ignored(&self, path: &Utf8Path) -> bool {
        is_ignored(path, &self.rules)
    }

    /// Returns the rules in file order.
    #[inline]
    #[must_use]
    pub fn rules(&self) -> &[IgnoreRule] {
        &self.rules
    }

    /// Returns the number of rules, including malformed ones.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns `true` if there are no rules.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl FileFilter for IgnoreRules {
    #[inline]
    fn should_process(&self, path: &Utf8Path) -> bool {
        !self.is_ignored(path)
    }
}

/// Returns `true` if any rule glob-matches the final component of `path`.
///
/// A path without a final component (`/`, `..`) is matched as the whole path
/// string.
#[must_use]
pub fn is_ignored(path: &Utf8Path, rules: &[IgnoreRule]) -> bool {
    let name = path.file_name().unwrap_or_else(|| path.as_str());
    rules.iter().any(|rule| rule.matches_name(name))
}

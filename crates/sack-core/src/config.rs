//! Configuration structures for the sack dev server.
//!
//! This module provides configuration types for all components of the application:
//!
//! - [`PageConfig`] / [`SiteConfig`] - The declarative page collection (`config.yaml`)
//! - [`WatchConfig`] - File watcher settings (enabled, watch roots)
//! - [`SiteLayout`] - Where templates, rendered pages, and static assets live
//! - [`DevServerConfig`] - Root server configuration combining all settings
//!
//! All server configuration types implement [`Default`] with the values the
//! project layout expects.

use std::collections::BTreeMap;

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use smallvec::{SmallVec, smallvec};

use crate::error::ConfigError;

/// Default port of the development server.
pub const DEFAULT_PORT: u16 = 7536;

/// Default path of the live-reload notification endpoint.
pub const DEFAULT_RELOAD_PATH: &str = "/ws";

/// Configuration of a single showcase page.
///
/// Field names are serialized in `PascalCase` to stay compatible with
/// existing `config.yaml` files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct PageConfig {
    /// Path of the `.glb` model shown on the page.
    pub model_src_path: String,
    /// Path of the `.usdz` model used by iOS quick look.
    pub model_ios_src_path: String,
    /// Poster image displayed while the model loads.
    pub poster_path: String,
    /// Free-form description text.
    pub description: String,
    /// Display name of the model.
    pub model_name: String,
    /// Link to the designer's website.
    pub designer_website: String,
    /// Display name of the designer.
    pub designer_name: String,
}

/// The page collection loaded from `config.yaml`.
///
/// Pages are keyed by identifier (`page1`, `page2`, ...). Use
/// [`sorted_page_keys`](crate::sorted_page_keys) for numeric ordering; the map
/// itself is ordered lexically.
///
/// # Examples
///
/// ```
/// use sack_core::SiteConfig;
///
/// let yaml = "Pages:\n  page1:\n    ModelName: Chair\n";
/// let config: SiteConfig = serde_yaml::from_str(yaml).unwrap();
/// assert_eq!(config.pages["page1"].model_name, "Chair");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Pages keyed by identifier.
    #[serde(rename = "Pages")]
    pub pages: BTreeMap<String, PageConfig>,
}

impl SiteConfig {
    /// Reads and decodes a site configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read and
    /// [`ConfigError::Yaml`] if it is not structurally valid.
    pub fn read(path: &Utf8Path) -> Result<Self, ConfigError> {
        let contents =
            std::fs::read_to_string(path).map_err(|source| ConfigError::io(path, source))?;
        Ok(serde_yaml::from_str(&contents)?)
    }

    /// Encodes the configuration as YAML and writes it to `path`, replacing
    /// any existing file.
    pub fn write(&self, path: &Utf8Path) -> Result<(), ConfigError> {
        let contents = serde_yaml::to_string(self)?;
        std::fs::write(path, contents).map_err(|source| ConfigError::io(path, source))
    }

    /// Returns the number of configured pages.
    #[inline]
    #[must_use]
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Returns `true` if no pages are configured.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

/// Configuration for the file watcher.
///
/// # Examples
///
/// ```
/// use sack_core::WatchConfig;
///
/// let config = WatchConfig::default();
/// assert!(config.enabled);
/// assert_eq!(config.roots.len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Whether live reload is enabled at all.
    pub enabled: bool,

    /// Directories or files to watch. Directories are watched recursively.
    pub roots: SmallVec<[Utf8PathBuf; 4]>,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            roots: smallvec![Utf8PathBuf::from("ui"), Utf8PathBuf::from("config.yaml")],
        }
    }
}

/// Locations of the site's inputs and outputs, relative to the working directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteLayout {
    /// The page collection file.
    pub config_path: Utf8PathBuf,
    /// The page template rendered once per page.
    pub template_path: Utf8PathBuf,
    /// Output directory for rendered pages.
    pub pages_dir: Utf8PathBuf,
    /// Directory served under `/static`.
    pub static_dir: Utf8PathBuf,
    /// Page served at `/`.
    pub index_page: Utf8PathBuf,
    /// Page served at `/story`.
    pub story_page: Utf8PathBuf,
    /// Story graph data served at `/graph.json`.
    pub story_graph_path: Utf8PathBuf,
    /// Page served for unknown routes.
    pub not_found_page: Utf8PathBuf,
    /// Page served when a handler fails.
    pub server_error_page: Utf8PathBuf,
}

impl Default for SiteLayout {
    fn default() -> Self {
        Self {
            config_path: Utf8PathBuf::from("config.yaml"),
            template_path: Utf8PathBuf::from("ui/html/templates/base.html"),
            pages_dir: Utf8PathBuf::from("ui/html/pages"),
            static_dir: Utf8PathBuf::from("ui/static"),
            index_page: Utf8PathBuf::from("ui/html/index.html"),
            story_page: Utf8PathBuf::from("ui/html/story.html"),
            story_graph_path: Utf8PathBuf::from("ui/static/graph.json"),
            not_found_page: Utf8PathBuf::from("ui/html/404.html"),
            server_error_page: Utf8PathBuf::from("ui/html/500.html"),
        }
    }
}

impl SiteLayout {
    /// Returns the output file for the page with the given number.
    ///
    /// ```
    /// use sack_core::SiteLayout;
    ///
    /// let layout = SiteLayout::default();
    /// assert_eq!(layout.page_file(3), "ui/html/pages/page3.html");
    /// ```
    #[must_use]
    pub fn page_file(&self, number: u32) -> Utf8PathBuf {
        self.pages_dir.join(format!("page{number}.html"))
    }
}

/// Root configuration of the development server.
///
/// # Examples
///
/// ```
/// use sack_core::DevServerConfig;
///
/// let config = DevServerConfig::default();
/// assert_eq!(config.port, 7536);
/// assert_eq!(config.reload_path, "/ws");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DevServerConfig {
    /// Host name browsers use to reach the server.
    pub host: String,

    /// TCP port the server listens on.
    pub port: u16,

    /// Path of the live-reload WebSocket endpoint.
    pub reload_path: String,

    /// Gitignore-style file with patterns that never trigger a reload.
    pub ignore_file: Utf8PathBuf,

    /// File watcher configuration.
    pub watch: WatchConfig,

    /// Site input and output locations.
    pub layout: SiteLayout,
}

impl Default for DevServerConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_owned(),
            port: DEFAULT_PORT,
            reload_path: DEFAULT_RELOAD_PATH.to_owned(),
            ignore_file: Utf8PathBuf::from(".gitignore"),
            watch: WatchConfig::default(),
            layout: SiteLayout::default(),
        }
    }
}

impl DevServerConfig {
    /// Validates option values that serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidOption`] for a zero port or a reload path
    /// that does not start with `/`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::invalid_option(
                "port",
                "must be between 1 and 65535",
            ));
        }
        if !self.reload_path.starts_with('/') {
            return Err(ConfigError::invalid_option(
                "reload_path",
                "must start with '/'",
            ));
        }
        Ok(())
    }
}

//! The showcase site served by the sack dev server.
//!
//! This crate holds everything about the site itself, as opposed to live
//! reload:
//!
//! - [`generate_pages`] renders each entry of `config.yaml` through the page
//!   template into `page{N}.html`
//! - [`batch_entries`] and [`prompt_entry`] grow the page collection
//! - [`site_router`] serves the rendered pages, static assets and error pages
//!
//! # Usage
//!
//! ```no_run
//! use sack_core::{SiteConfig, SiteLayout};
//! use sack_site::{PageTemplate, generate_pages, site_router};
//!
//! # fn example() -> Result<(), sack_site::SiteError> {
//! let layout = SiteLayout::default();
//! let config = SiteConfig::read(&layout.config_path)?;
//! let template = PageTemplate::load(&layout.template_path)?;
//!
//! generate_pages(&config, &template, &layout)?;
//! let router = site_router(&config, &layout)?;
//! # let _ = router;
//! # Ok(())
//! # }
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod error;
pub mod generate;
pub mod render;
pub mod routes;

pub use error::SiteError;
pub use generate::{MAX_BATCH, PROMPT_FIELDS, append_entry, batch_entries, prompt_entry};
pub use render::{PageContext, PageTemplate, generate_pages};
pub use routes::{SiteState, not_found, server_error, site_router};

//! Core types, errors, and utilities for the sack dev server.
//!
//! This crate provides the foundational types used across the workspace:
//!
//! - [`ConfigError`] for consistent configuration error handling
//! - The page collection ([`SiteConfig`], [`PageConfig`]) read from `config.yaml`
//! - Server settings ([`DevServerConfig`], [`WatchConfig`], [`SiteLayout`])
//! - Numeric page ordering helpers

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod page;

pub use config::{
    DEFAULT_PORT, DEFAULT_RELOAD_PATH, DevServerConfig, PageConfig, SiteConfig, SiteLayout,
    WatchConfig,
};
pub use error::ConfigError;
pub use page::{extract_page_number, page_key, sorted_page_keys};

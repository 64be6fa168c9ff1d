//! Page identifier helpers.
//!
//! Pages are keyed `page1`, `page2`, ... in `config.yaml`. The number embedded
//! in the key decides both the rendered file name and the serving order, so
//! ordering is numeric (`page2` before `page10`), not lexical.

use std::collections::BTreeMap;

use crate::config::PageConfig;
use crate::error::ConfigError;

/// Extracts the first run of ASCII digits in `key` as a page number.
///
/// Returns `None` if the key contains no digits or the number overflows.
///
/// # Examples
///
/// ```
/// use sack_core::extract_page_number;
///
/// assert_eq!(extract_page_number("page12"), Some(12));
/// assert_eq!(extract_page_number("p3x4"), Some(3));
/// assert_eq!(extract_page_number("intro"), None);
/// ```
#[must_use]
pub fn extract_page_number(key: &str) -> Option<u32> {
    let start = key.find(|c: char| c.is_ascii_digit())?;
    let digits = &key[start..];
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    digits[..end].parse().ok()
}

/// Returns the page keys ordered by their page number.
///
/// Keys sharing a number keep lexical order among themselves.
///
/// # Errors
///
/// Returns [`ConfigError::MissingPageNumber`] for the first key without a number.
pub fn sorted_page_keys(pages: &BTreeMap<String, PageConfig>) -> Result<Vec<(u32, &str)>, ConfigError> {
    let mut keys = pages
        .keys()
        .map(|key| {
            extract_page_number(key)
                .map(|number| (number, key.as_str()))
                .ok_or_else(|| ConfigError::MissingPageNumber(key.clone()))
        })
        .collect::<Result<Vec<_>, _>>()?;
    keys.sort_unstable();
    Ok(keys)
}

/// Returns the key for page number `number`.
#[inline]
#[must_use]
pub fn page_key(number: usize) -> String {
    format!("page{number}")
}

//! Appending page entries to the page collection.
//!
//! Two ways to grow `config.yaml`:
//!
//! - [`batch_entries`] adds numbered placeholder pages pointing at
//!   `/static/obj{N}/object{N}.*`, copying the designer from `page1`
//! - [`prompt_entry`] asks for each field on a terminal
//!
//! Neither touches the file; callers save with [`SiteConfig::write`].

use std::io::{BufRead, Write};

use sack_core::{ConfigError, PageConfig, SiteConfig, page_key};

use crate::error::SiteError;

/// Largest batch accepted by [`batch_entries`].
pub const MAX_BATCH: usize = 1024;

/// The fields asked for by [`prompt_entry`], in order.
pub const PROMPT_FIELDS: [&str; 7] = [
    "ModelSrcPath",
    "ModelIosSrcPath",
    "PosterPath",
    "Description",
    "ModelName",
    "DesignerWebsite",
    "DesignerName",
];

/// Appends `count` placeholder pages numbered after the existing ones.
///
/// Page `N` points at `/static/objN/objectN.{glb,usdz,webp}` and copies its
/// designer from `page1`. Returns the keys added.
///
/// # Errors
///
/// Returns [`SiteError::NoReferencePage`] if the collection is empty, and
/// [`SiteError::Config`] if `count` is outside `1..=1024`.
///
/// # Examples
///
/// ```
/// use sack_core::{PageConfig, SiteConfig};
/// use sack_site::batch_entries;
///
/// let mut config = SiteConfig::default();
/// config.pages.insert("page1".to_owned(), PageConfig {
///     designer_name: "Ada".to_owned(),
///     ..PageConfig::default()
/// });
///
/// let added = batch_entries(&mut config, 2).unwrap();
/// assert_eq!(added, ["page2", "page3"]);
/// assert_eq!(config.pages["page3"].designer_name, "Ada");
/// ```
pub fn batch_entries(config: &mut SiteConfig, count: usize) -> Result<Vec<String>, SiteError> {
    if !(1..=MAX_BATCH).contains(&count) {
        return Err(ConfigError::invalid_option(
            "batch",
            format!("must be between 1 and {MAX_BATCH}"),
        )
        .into());
    }
    if config.is_empty() {
        return Err(SiteError::NoReferencePage);
    }

    let reference = config.pages.get("page1").cloned().unwrap_or_else(|| {
        tracing::warn!("No page1 to copy designer details from, leaving them empty");
        PageConfig::default()
    });

    let existing = config.page_count();
    let mut added = Vec::with_capacity(count);
    for n in (existing + 1)..=(existing + count) {
        let page = PageConfig {
            model_src_path: format!("/static/obj{n}/object{n}.glb"),
            model_ios_src_path: format!("/static/obj{n}/object{n}.usdz"),
            poster_path: format!("/static/obj{n}/object{n}.webp"),
            description: format!("This is my masterpiece {n}"),
            model_name: format!("Model {n}"),
            designer_website: reference.designer_website.clone(),
            designer_name: reference.designer_name.clone(),
        };
        added.push(insert_page(config, n, page));
    }

    Ok(added)
}

/// Appends `page` as `page{len+1}` and returns its key.
pub fn append_entry(config: &mut SiteConfig, page: PageConfig) -> String {
    let n = config.page_count() + 1;
    insert_page(config, n, page)
}

fn insert_page(config: &mut SiteConfig, number: usize, page: PageConfig) -> String {
    let key = page_key(number);
    if config.pages.insert(key.clone(), page).is_some() {
        tracing::warn!(page = %key, "Replaced an existing page with the same key");
    }
    key
}

/// Prompts for each page field on `output` and reads answers from `input`.
///
/// Answers are trimmed. End of input yields empty answers for the remaining
/// fields.
///
/// # Errors
///
/// Returns [`SiteError::Prompt`] if reading or writing fails.
pub fn prompt_entry<R, W>(input: &mut R, output: &mut W) -> Result<PageConfig, SiteError>
where
    R: BufRead,
    W: Write,
{
    let mut answers: [String; 7] = Default::default();
    for (field, answer) in PROMPT_FIELDS.iter().zip(answers.iter_mut()) {
        write!(output, "Enter {field}: ").map_err(SiteError::Prompt)?;
        output.flush().map_err(SiteError::Prompt)?;

        let mut line = String::new();
        input.read_line(&mut line).map_err(SiteError::Prompt)?;
        *answer = line.trim().to_owned();
    }

    let [
        model_src_path,
        model_ios_src_path,
        poster_path,
        description,
        model_name,
        designer_website,
        designer_name,
    ] = answers;

    Ok(PageConfig {
        model_src_path,
        model_ios_src_path,
        poster_path,
        description,
        model_name,
        designer_website,
        designer_name,
    })
}

//! Page rendering from the shared template.
//!
//! The template is plain HTML with `{{Name}}` placeholders. Each configured
//! page is rendered into `page{N}.html`, where `N` is the number in its key:
//!
//! | Placeholder           | Value                               |
//! |-----------------------|-------------------------------------|
//! | `{{CurrentPage}}`     | this page's number                  |
//! | `{{TotalPages}}`      | number of configured pages          |
//! | `{{PrevPage}}`        | `CurrentPage - 1` (0 for the first) |
//! | `{{NextPage}}`        | `CurrentPage + 1`                   |
//! | `{{ModelSrcPath}}` .. `{{DesignerName}}` | the page's fields |
//!
//! Substitution is literal; values are inserted as written in `config.yaml`.

use camino::{Utf8Path, Utf8PathBuf};
use sack_core::{PageConfig, SiteConfig, SiteLayout, sorted_page_keys};

use crate::error::SiteError;

/// The page template, read once per render pass.
#[derive(Debug, Clone)]
pub struct PageTemplate {
    source: String,
}

impl PageTemplate {
    /// Reads the template at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`SiteError::Template`] if the file cannot be read.
    pub fn load(path: &Utf8Path) -> Result<Self, SiteError> {
        let source =
            std::fs::read_to_string(path).map_err(|source| SiteError::template(path, source))?;
        Ok(Self { source })
    }

    /// Wraps template text that is already in memory.
    #[must_use]
    pub fn from_source(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
        }
    }

    /// Returns the raw template text.
    #[inline]
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }
}

/// Values substituted into the template for one page.
#[derive(Debug, Clone, Copy)]
pub struct PageContext<'a> {
    /// This page's number.
    pub current_page: u32,
    /// Number of configured pages.
    pub total_pages: usize,
    /// This page's fields.
    pub page: &'a PageConfig,
}

impl PageContext<'_> {
    /// Renders `template` with this page's values.
    ///
    /// # Examples
    ///
    /// ```
    /// use sack_core::PageConfig;
    /// use sack_site::{PageContext, PageTemplate};
    ///
    /// let page = PageConfig { model_name: "Chair".to_owned(), ..PageConfig::default() };
    /// let template = PageTemplate::from_source("<h1>{{ModelName}}</h1> {{CurrentPage}}/{{TotalPages}}");
    /// let context = PageContext { current_page: 2, total_pages: 5, page: &page };
    ///
    /// assert_eq!(context.render(&template), "<h1>Chair</h1> 2/5");
    /// ```
    #[must_use]
    pub fn render(&self, template: &PageTemplate) -> String {
        let page = self.page;
        template
            .source
            .replace("{{CurrentPage}}", &self.current_page.to_string())
            .replace("{{TotalPages}}", &self.total_pages.to_string())
            .replace(
                "{{PrevPage}}",
                &self.current_page.saturating_sub(1).to_string(),
            )
            .replace(
                "{{NextPage}}",
                &self.current_page.saturating_add(1).to_string(),
            )
            .replace("{{ModelSrcPath}}", &page.model_src_path)
            .replace("{{ModelIosSrcPath}}", &page.model_ios_src_path)
            .replace("{{PosterPath}}", &page.poster_path)
            .replace("{{Description}}", &page.description)
            .replace("{{ModelName}}", &page.model_name)
            .replace("{{DesignerWebsite}}", &page.designer_website)
            .replace("{{DesignerName}}", &page.designer_name)
    }
}

/// Renders every configured page into `layout.pages_dir`, in page order.
///
/// The output directory is created if needed. Returns the files written.
///
/// # Errors
///
/// Returns [`SiteError::Config`] if a page key has no number and
/// [`SiteError::Write`] if a page cannot be written.
pub fn generate_pages(
    config: &SiteConfig,
    template: &PageTemplate,
    layout: &SiteLayout,
) -> Result<Vec<Utf8PathBuf>, SiteError> {
    let keys = sorted_page_keys(&config.pages)?;
    std::fs::create_dir_all(&layout.pages_dir)
        .map_err(|source| SiteError::write(&layout.pages_dir, source))?;

    let total_pages = config.page_count();
    let mut written = Vec::with_capacity(keys.len());

    for (number, key) in keys {
        let Some(page) = config.pages.get(key) else {
            continue;
        };
        let context = PageContext {
            current_page: number,
            total_pages,
            page,
        };
        let file = layout.page_file(number);
        std::fs::write(&file, context.render(template))
            .map_err(|source| SiteError::write(&file, source))?;

        tracing::info!(page = key, file = %file, "Generated HTML for {key}");
        written.push(file);
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const TEMPLATE: &str = "\
<title>{{ModelName}} ({{CurrentPage}} of {{TotalPages}})</title>
<model-viewer src=\"{{ModelSrcPath}}\" ios-src=\"{{ModelIosSrcPath}}\" poster=\"{{PosterPath}}\"></model-viewer>
<p>{{Description}}</p>
<a href=\"{{DesignerWebsite}}\">{{DesignerName}}</a>
<a href=\"/model{{PrevPage}}\">prev</a> <a href=\"/model{{NextPage}}\">next</a>
";

    fn page(n: u32) -> PageConfig {
        PageConfig {
            model_src_path: format!("/static/obj{n}/object{n}.glb"),
            model_ios_src_path: format!("/static/obj{n}/object{n}.usdz"),
            poster_path: format!("/static/obj{n}/object{n}.webp"),
            description: format!("This is my masterpiece {n}"),
            model_name: format!("Model {n}"),
            designer_website: "https://example.com".to_owned(),
            designer_name: "Ada".to_owned(),
        }
    }

    fn layout_in(dir: &TempDir) -> SiteLayout {
        let root = Utf8Path::from_path(dir.path()).unwrap();
        SiteLayout {
            pages_dir: root.join("pages"),
            ..SiteLayout::default()
        }
    }

    #[test]
    fn test_render_all_placeholders() {
        let page = page(3);
        let context = PageContext {
            current_page: 3,
            total_pages: 4,
            page: &page,
        };

        let html = context.render(&PageTemplate::from_source(TEMPLATE));
        insta::assert_snapshot!(html, @r#"
        <title>Model 3 (3 of 4)</title>
        <model-viewer src="/static/obj3/object3.glb" ios-src="/static/obj3/object3.usdz" poster="/static/obj3/object3.webp"></model-viewer>
        <p>This is my masterpiece 3</p>
        <a href="https://example.com">Ada</a>
        <a href="/model2">prev</a> <a href="/model4">next</a>
        "#);
    }

    #[test]
    fn test_first_page_prev_is_zero() {
        let page = PageConfig::default();
        let context = PageContext {
            current_page: 1,
            total_pages: 1,
            page: &page,
        };
        let html = context.render(&PageTemplate::from_source("{{PrevPage}}|{{NextPage}}"));
        assert_eq!(html, "0|2");
    }

    #[test]
    fn test_generate_pages_uses_key_numbers() {
        let dir = TempDir::new().unwrap();
        let layout = layout_in(&dir);
        let mut config = SiteConfig::default();
        config.pages.insert("page10".to_owned(), page(10));
        config.pages.insert("page2".to_owned(), page(2));

        let written = generate_pages(
            &config,
            &PageTemplate::from_source("{{CurrentPage}}/{{TotalPages}} {{ModelName}}"),
            &layout,
        )
        .unwrap();

        assert_eq!(written, vec![layout.page_file(2), layout.page_file(10)]);
        assert_eq!(std::fs::read_to_string(layout.page_file(2)).unwrap(), "2/2 Model 2");
        assert_eq!(std::fs::read_to_string(layout.page_file(10)).unwrap(), "10/2 Model 10");
    }

    #[test]
    fn test_generate_pages_rejects_unnumbered_key() {
        let dir = TempDir::new().unwrap();
        let mut config = SiteConfig::default();
        config.pages.insert("intro".to_owned(), PageConfig::default());

        let err = generate_pages(&config, &PageTemplate::from_source(""), &layout_in(&dir))
            .unwrap_err();
        assert!(matches!(err, SiteError::Config(_)));
    }

    #[test]
    fn test_load_missing_template() {
        let err = PageTemplate::load(Utf8Path::new("/nonexistent/base.html")).unwrap_err();
        assert!(matches!(err, SiteError::Template { .. }));
    }
}

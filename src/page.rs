//! Page build unit.
//!
//! A page named `about` lives in `pages/about/` and consists of:
//!
//! | File          | Required | Role                              |
//! |---------------|----------|-----------------------------------|
//! | `about.yaml`  | yes      | page data, merged into the context |
//! | `about.hbs`   | yes      | template rendered to the output    |
//! | `about.scss`  | no       | page stylesheet (page style mode)  |
//!
//! Every page is built independently: whatever happens to one page is
//! recorded in its [`PageReport`] and never affects another page.

use crate::{
    config::{DATA_EXT, SiteConfig, StyleMode, TEMPLATE_EXT},
    data::{self, Globals, Mapping},
    error::{PageError, RenderFailure},
    log,
    registry::Registry,
    style,
    utils::minify::minify_page,
};
use serde::{Serialize, Serializer, ser::SerializeMap};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Context key holding the shared globals.
pub const GLOBALS_KEY: &str = "globals";
/// Context key holding the ordered stylesheet hrefs.
pub const STYLESHEETS_KEY: &str = "stylesheets";
/// The one page written with an `.html` extension.
pub const INDEX_PAGE: &str = "index";

// ============================================================================
// Render context
// ============================================================================

/// The data one page template is rendered against.
///
/// Serializes as a single mapping: every page data key at the top level,
/// then `globals`, then `stylesheets` when present. The reserved keys always
/// win over page data keys of the same name.
#[derive(Debug)]
pub struct RenderContext<'a> {
    pub page_data: Mapping,
    pub globals: &'a Mapping,
    pub stylesheets: Option<Vec<String>>,
}

impl<'a> RenderContext<'a> {
    pub fn new(page_data: Mapping, globals: &'a Mapping, stylesheets: Option<Vec<String>>) -> Self {
        Self {
            page_data,
            globals,
            stylesheets,
        }
    }

    fn is_reserved(&self, key: &str) -> bool {
        key == GLOBALS_KEY || (key == STYLESHEETS_KEY && self.stylesheets.is_some())
    }
}

impl Serialize for RenderContext<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        for (key, value) in &self.page_data {
            if !self.is_reserved(key) {
                map.serialize_entry(key, value)?;
            }
        }
        map.serialize_entry(GLOBALS_KEY, self.globals)?;
        if let Some(stylesheets) = &self.stylesheets {
            map.serialize_entry(STYLESHEETS_KEY, stylesheets)?;
        }
        map.end()
    }
}

// ============================================================================
// Page sources
// ============================================================================

/// Expected source paths of one page.
#[derive(Debug, Clone)]
pub struct PageSources {
    pub dir: PathBuf,
    pub data: PathBuf,
    pub template: PathBuf,
}

impl PageSources {
    pub fn locate(pages_dir: &Path, name: &str) -> Self {
        let dir = pages_dir.join(name);
        Self {
            data: dir.join(format!("{name}.{DATA_EXT}")),
            template: dir.join(format!("{name}.{TEMPLATE_EXT}")),
            dir,
        }
    }
}

/// Output file name for a page: `index` → `index.html`, everything else
/// keeps its bare name.
pub fn output_file_name(name: &str) -> String {
    if name == INDEX_PAGE {
        format!("{name}.html")
    } else {
        name.to_owned()
    }
}

// ============================================================================
// Build result
// ============================================================================

/// Overall classification of a page build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageOutcome {
    Success,
    MissingDataFile,
    MissingTemplateFile,
    DataParseError,
    StyleCompileError,
    TemplateRenderError,
}

impl From<&PageError> for PageOutcome {
    fn from(err: &PageError) -> Self {
        match err {
            PageError::MissingDataFile { .. } => Self::MissingDataFile,
            PageError::MissingTemplateFile { .. } => Self::MissingTemplateFile,
            PageError::DataParse { .. } => Self::DataParseError,
            PageError::StyleCompile { .. } => Self::StyleCompileError,
            PageError::TemplateRender { .. } => Self::TemplateRenderError,
        }
    }
}

/// What happened while building one page.
#[derive(Debug)]
pub struct PageReport {
    pub name: String,
    /// Written output file, if rendering and writing succeeded.
    pub output: Option<PathBuf>,
    /// Every problem met, in order; each was logged once when recorded.
    pub errors: Vec<PageError>,
}

impl PageReport {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            output: None,
            errors: Vec::new(),
        }
    }

    fn record(&mut self, err: PageError) {
        log!("error"; "{err}");
        self.errors.push(err);
    }

    /// The error that decided the outcome: a page-stopping error if any,
    /// otherwise the first recoverable one.
    pub fn outcome(&self) -> PageOutcome {
        self.errors
            .iter()
            .find(|e| e.is_fatal_for_page())
            .or_else(|| self.errors.first())
            .map_or(PageOutcome::Success, PageOutcome::from)
    }

    pub fn is_success(&self) -> bool {
        self.output.is_some() && self.errors.is_empty()
    }
}

// ============================================================================
// Build
// ============================================================================

/// Shared, read-only inputs of every page in one build.
pub struct BuildContext<'a> {
    pub config: &'a SiteConfig,
    pub registry: &'a Registry,
    pub globals: &'a Globals,
    /// Href of the compiled base stylesheet, if there is one.
    pub base_style: Option<&'a str>,
}

/// Build one page: resolve its sources, render, and write the output file.
///
/// Missing data or template files skip the page. Malformed data degrades to
/// an empty mapping and rendering continues. Nothing is written unless the
/// template rendered completely.
pub fn build_page(name: &str, ctx: &BuildContext<'_>) -> PageReport {
    let mut report = PageReport::new(name);
    let sources = PageSources::locate(&ctx.config.pages_dir(), name);

    if !sources.data.is_file() {
        report.record(PageError::MissingDataFile {
            page: name.to_owned(),
            path: sources.data,
        });
        return report;
    }
    if !sources.template.is_file() {
        report.record(PageError::MissingTemplateFile {
            page: name.to_owned(),
            path: sources.template,
        });
        return report;
    }

    let page_data = data::load_data(&sources.data).unwrap_or_else(|source| {
        report.record(PageError::DataParse {
            page: name.to_owned(),
            source,
        });
        Mapping::new()
    });

    let stylesheets = match ctx.config.build.style {
        StyleMode::Page => Some(page_stylesheets(&sources, name, ctx, &mut report)),
        StyleMode::Bundle => None,
    };

    let context = RenderContext::new(page_data, ctx.globals.as_map(), stylesheets);
    let dest = ctx.config.build.output.join(output_file_name(name));

    match render_to(&sources.template, &dest, &context, ctx) {
        Ok(()) => report.output = Some(dest),
        Err(source) => report.record(PageError::TemplateRender {
            page: name.to_owned(),
            source,
        }),
    }

    report
}

/// Base href first, then the page's own stylesheet.
fn page_stylesheets(
    sources: &PageSources,
    name: &str,
    ctx: &BuildContext<'_>,
    report: &mut PageReport,
) -> Vec<String> {
    let mut hrefs: Vec<String> = ctx.base_style.map(str::to_owned).into_iter().collect();

    if let Some(page_style) = style::compile_page(&sources.dir, name, ctx.config) {
        if let Some(source) = page_style.error {
            report.record(PageError::StyleCompile {
                page: name.to_owned(),
                source,
            });
        }
        hrefs.push(page_style.href);
    }

    hrefs
}

fn render_to(
    template: &Path,
    dest: &Path,
    context: &RenderContext<'_>,
    ctx: &BuildContext<'_>,
) -> Result<(), RenderFailure> {
    let source =
        fs::read_to_string(template).map_err(|e| RenderFailure::Read(template.to_path_buf(), e))?;
    let rendered = ctx.registry.render(&source, context)?;
    let bytes = minify_page(rendered.as_bytes(), ctx.config.build.minify);
    fs::write(dest, &bytes).map_err(|e| RenderFailure::Write(dest.to_path_buf(), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Site {
        _dir: tempfile::TempDir,
        config: SiteConfig,
    }

    impl Site {
        fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            let mut config = SiteConfig::with_root(dir.path());
            config.build.prefix = false;
            fs::create_dir_all(&config.build.output).unwrap();
            Self { _dir: dir, config }
        }

        fn page(&self, name: &str, files: &[(&str, &str)]) -> &Self {
            let dir = self.config.pages_dir().join(name);
            fs::create_dir_all(&dir).unwrap();
            for (ext, content) in files {
                fs::write(dir.join(format!("{name}.{ext}")), content).unwrap();
            }
            self
        }

        fn build(&self, name: &str, globals: &Globals, base_style: Option<&str>) -> PageReport {
            let registry = Registry::new();
            let ctx = BuildContext {
                config: &self.config,
                registry: &registry,
                globals,
                base_style,
            };
            build_page(name, &ctx)
        }

        fn output(&self, file: &str) -> Option<String> {
            fs::read_to_string(self.config.build.output.join(file)).ok()
        }
    }

    fn globals(value: serde_json::Value) -> Globals {
        match value {
            serde_json::Value::Object(map) => Globals::from(map),
            _ => panic!("globals must be an object"),
        }
    }

    #[test]
    fn test_output_file_name() {
        assert_eq!(output_file_name("index"), "index.html");
        assert_eq!(output_file_name("about"), "about");
        assert_eq!(output_file_name("index2"), "index2");
    }

    #[test]
    fn test_page_sources_keep_dotted_names() {
        let sources = PageSources::locate(Path::new("/src/pages"), "v1.2");
        assert_eq!(sources.data, PathBuf::from("/src/pages/v1.2/v1.2.yaml"));
        assert_eq!(sources.template, PathBuf::from("/src/pages/v1.2/v1.2.hbs"));
    }

    #[test]
    fn test_render_context_reserved_keys_win() {
        let page = json!({"title": "Home", "globals": "shadowed", "stylesheets": "shadowed"});
        let serde_json::Value::Object(page) = page else { unreachable!() };
        let shared = globals(json!({"site": "Demo"}));

        let context = RenderContext::new(page, shared.as_map(), Some(vec!["a.css".into()]));
        let value = serde_json::to_value(&context).unwrap();

        assert_eq!(
            value,
            json!({"title": "Home", "globals": {"site": "Demo"}, "stylesheets": ["a.css"]})
        );
    }

    #[test]
    fn test_render_context_without_stylesheets_keeps_page_key() {
        let serde_json::Value::Object(page) = json!({"stylesheets": ["mine.css"]}) else {
            unreachable!()
        };
        let shared = Globals::default();

        let context = RenderContext::new(page, shared.as_map(), None);
        let value = serde_json::to_value(&context).unwrap();
        assert_eq!(value, json!({"stylesheets": ["mine.css"], "globals": {}}));
    }

    #[test]
    fn test_index_page_renders_to_index_html() {
        let site = Site::new();
        site.page("index", &[("yaml", "title: Home\n"), ("hbs", "<h1>{{title}}</h1>")]);

        let report = site.build("index", &globals(json!({"site": "Demo"})), None);

        assert!(report.is_success(), "{:?}", report.errors);
        assert_eq!(report.outcome(), PageOutcome::Success);
        assert_eq!(site.output("index.html").unwrap(), "<h1>Home</h1>");
    }

    #[test]
    fn test_other_pages_have_no_extension() {
        let site = Site::new();
        site.page("about", &[("yaml", "title: About\n"), ("hbs", "{{title}} {{globals.site}}")]);

        let report = site.build("about", &globals(json!({"site": "Demo"})), None);

        assert!(report.is_success());
        assert_eq!(site.output("about").unwrap(), "About Demo");
        assert!(site.output("about.html").is_none());
    }

    #[test]
    fn test_missing_data_file_skips_page() {
        let site = Site::new();
        site.page("about", &[("hbs", "<p></p>")]);

        let report = site.build("about", &Globals::default(), None);

        assert_eq!(report.outcome(), PageOutcome::MissingDataFile);
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].to_string().contains("about"));
        assert!(report.output.is_none());
        assert!(site.output("about").is_none());
    }

    #[test]
    fn test_missing_template_file_skips_page() {
        let site = Site::new();
        site.page("about", &[("yaml", "title: x\n")]);

        let report = site.build("about", &Globals::default(), None);

        assert_eq!(report.outcome(), PageOutcome::MissingTemplateFile);
        assert_eq!(report.errors.len(), 1);
        assert!(site.output("about").is_none());
    }

    #[test]
    fn test_malformed_data_still_renders() {
        let site = Site::new();
        site.page(
            "blog",
            &[("yaml", "title: [oops\n"), ("hbs", "[{{title}}] {{globals.site}}")],
        );

        let report = site.build("blog", &globals(json!({"site": "Demo"})), None);

        assert_eq!(report.outcome(), PageOutcome::DataParseError);
        assert!(report.output.is_some());
        assert_eq!(site.output("blog").unwrap(), "[] Demo");
    }

    #[test]
    fn test_yaml_merge_keys_reach_template() {
        let site = Site::new();
        site.page(
            "blog",
            &[
                ("yaml", "base: &b {x: 1}\nchild: {<<: *b, y: 2}\n"),
                ("hbs", "{{child.x}}{{child.y}}"),
            ],
        );

        let report = site.build("blog", &Globals::default(), None);

        assert!(report.is_success(), "{:?}", report.errors);
        assert_eq!(site.output("blog").unwrap(), "12");
    }

    #[test]
    fn test_render_error_writes_nothing() {
        let site = Site::new();
        site.page("broken", &[("yaml", "a: 1\n"), ("hbs", "{{#each items}}")]);

        let report = site.build("broken", &Globals::default(), None);

        assert_eq!(report.outcome(), PageOutcome::TemplateRenderError);
        assert!(report.output.is_none());
        assert!(site.output("broken").is_none());
    }

    #[test]
    fn test_missing_partial_is_render_error() {
        let site = Site::new();
        site.page("p", &[("yaml", "a: 1\n"), ("hbs", "{{> nowhere}}")]);

        let report = site.build("p", &Globals::default(), None);
        assert_eq!(report.outcome(), PageOutcome::TemplateRenderError);
    }

    #[test]
    fn test_stylesheets_base_then_page() {
        let site = Site::new();
        site.page(
            "about",
            &[
                ("yaml", "title: About\n"),
                ("hbs", "{{#each stylesheets}}[{{this}}]{{/each}}"),
                ("scss", ".about { color: red; }"),
            ],
        );

        let report = site.build("about", &Globals::default(), Some("assets/css/main.css"));

        assert!(report.is_success(), "{:?}", report.errors);
        assert_eq!(
            site.output("about").unwrap(),
            "[assets/css/main.css][assets/css/pages/about.css]"
        );
        assert!(site.config.page_css_target().join("about.css").is_file());
    }

    #[test]
    fn test_broken_page_style_still_linked() {
        let site = Site::new();
        site.page(
            "about",
            &[
                ("yaml", "title: About\n"),
                ("hbs", "{{#each stylesheets}}[{{this}}]{{/each}}"),
                ("scss", ".about { color: "),
            ],
        );

        let report = site.build("about", &Globals::default(), None);

        assert_eq!(report.outcome(), PageOutcome::StyleCompileError);
        assert_eq!(site.output("about").unwrap(), "[assets/css/pages/about.css]");
    }

    #[test]
    fn test_bundle_mode_has_no_stylesheets() {
        let mut site = Site::new();
        site.config.build.style = StyleMode::Bundle;
        site.page(
            "about",
            &[
                ("yaml", "title: About\n"),
                ("hbs", "{{#if stylesheets}}linked{{else}}bundle{{/if}}"),
                ("scss", ".about { color: red; }"),
            ],
        );

        let report = site.build("about", &Globals::default(), Some("assets/css/main.css"));

        assert!(report.is_success());
        assert_eq!(site.output("about").unwrap(), "bundle");
        assert!(!site.config.page_css_target().join("about.css").exists());
    }

    #[test]
    fn test_rebuild_is_byte_identical() {
        let site = Site::new();
        site.page(
            "index",
            &[("yaml", "title: Home\nitems: [b, a]\n"), ("hbs", "{{#each items}}{{this}}{{/each}}")],
        );
        let shared = globals(json!({"site": "Demo"}));

        site.build("index", &shared, None);
        let first = fs::read(site.config.build.output.join("index.html")).unwrap();
        site.build("index", &shared, None);
        let second = fs::read(site.config.build.output.join("index.html")).unwrap();

        assert_eq!(first, second);
        assert_eq!(first, b"ba");
    }
}

//! Source tree scaffolding for `init` and `new`.

use crate::config::{DATA_EXT, STYLE_EXT, SiteConfig, TEMPLATE_EXT};
use anyhow::{Context, Result, bail};
use std::{fs, path::Path};

/// Directories created under the source root by `init`
const SOURCE_DIRS: &[&str] = &["pages", "partials", "static", "style"];

const GLOBALS_STARTER: &str = "site: My Site\n";

const BASE_STYLE_STARTER: &str = "\
body {
  margin: 0 auto;
  max-width: 48rem;
  font-family: system-ui, sans-serif;
}
";

const HEAD_PARTIAL_STARTER: &str = "\
<meta charset=\"utf-8\">
<title>{{title}} | {{globals.site}}</title>
{{#each stylesheets}}
<link rel=\"stylesheet\" href=\"{{this}}\">
{{/each}}
";

const INDEX_DATA_STARTER: &str = "\
title: Home
intro: |
  Edit src/pages/index/index.yaml
  and src/pages/index/index.hbs to get started.
";

const INDEX_TEMPLATE_STARTER: &str = "\
<!DOCTYPE html>
<html>
<head>
{{> head}}
</head>
<body>
  <h1>{{title}}</h1>
  <p>{{breaklines intro}}</p>
</body>
</html>
";

/// Create the full source structure with an `index` page.
pub fn init_site(config: &SiteConfig) -> Result<()> {
    let source = &config.build.source;
    if source.exists() {
        bail!(
            "Source directory `{}` already exists. Use `akre new <NAME>` to add pages.",
            source.display()
        );
    }

    for dir in SOURCE_DIRS {
        let path = source.join(dir);
        fs::create_dir_all(&path).with_context(|| format!("Failed to create {}", path.display()))?;
    }

    write_new(&config.globals_path(), GLOBALS_STARTER)?;
    write_new(&config.base_style_path(), BASE_STYLE_STARTER)?;
    write_new(
        &config.partials_dir().join(format!("head.{TEMPLATE_EXT}")),
        HEAD_PARTIAL_STARTER,
    )?;
    scaffold_page(&config.pages_dir(), "index", INDEX_DATA_STARTER, INDEX_TEMPLATE_STARTER)?;

    Ok(())
}

/// Create empty data, template and style files for page `name`.
pub fn new_page(config: &SiteConfig, name: &str) -> Result<()> {
    validate_page_name(name)?;
    scaffold_page(&config.pages_dir(), name, "", "")
}

fn scaffold_page(pages_dir: &Path, name: &str, data: &str, template: &str) -> Result<()> {
    let dir = pages_dir.join(name);
    if dir.exists() {
        bail!("Page `{name}` already exists at {}", dir.display());
    }
    fs::create_dir_all(&dir).with_context(|| format!("Failed to create {}", dir.display()))?;

    write_new(&dir.join(format!("{name}.{DATA_EXT}")), data)?;
    write_new(&dir.join(format!("{name}.{TEMPLATE_EXT}")), template)?;
    write_new(&dir.join(format!("{name}.{STYLE_EXT}")), "")?;
    Ok(())
}

/// Page names become directory and file names, so they must be a single
/// plain path component.
fn validate_page_name(name: &str) -> Result<()> {
    let invalid = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\'])
        || name.starts_with('.');
    if invalid {
        bail!("Invalid page name `{name}`: expected a plain file name");
    }
    Ok(())
}

fn write_new(path: &Path, content: &str) -> Result<()> {
    fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::build_site;

    #[test]
    fn test_new_page_creates_triple() {
        let dir = tempfile::tempdir().unwrap();
        let config = SiteConfig::with_root(dir.path());

        new_page(&config, "about").unwrap();

        let page = config.pages_dir().join("about");
        for ext in ["yaml", "hbs", "scss"] {
            let file = page.join(format!("about.{ext}"));
            assert_eq!(fs::read_to_string(&file).unwrap(), "", "{}", file.display());
        }
    }

    #[test]
    fn test_new_page_refuses_existing() {
        let dir = tempfile::tempdir().unwrap();
        let config = SiteConfig::with_root(dir.path());

        new_page(&config, "about").unwrap();
        assert!(new_page(&config, "about").is_err());
    }

    #[test]
    fn test_new_page_rejects_paths() {
        let dir = tempfile::tempdir().unwrap();
        let config = SiteConfig::with_root(dir.path());

        for name in ["", ".", "..", "a/b", "..\\x", ".hidden"] {
            assert!(new_page(&config, name).is_err(), "accepted `{name}`");
        }
    }

    #[test]
    fn test_init_refuses_existing_source() {
        let dir = tempfile::tempdir().unwrap();
        let config = SiteConfig::with_root(dir.path());
        fs::create_dir_all(&config.build.source).unwrap();

        assert!(init_site(&config).is_err());
    }

    #[test]
    fn test_init_site_builds_cleanly() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = SiteConfig::with_root(dir.path());
        config.build.prefix = false;

        init_site(&config).unwrap();
        let summary = build_site(&config).unwrap();

        assert!(summary.is_clean(), "{:?}", summary.step_errors);
        let html = fs::read_to_string(config.build.output.join("index.html")).unwrap();
        assert!(html.contains("<title>Home | My Site</title>"));
        assert!(html.contains("href=\"assets/css/main.css\""));
        assert!(html.contains("href=\"assets/css/pages/index.css\""));
        assert!(html.contains("Edit src/pages/index/index.yaml<br>"));
    }
}

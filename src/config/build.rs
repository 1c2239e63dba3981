//! `[build]` section configuration.
//!
//! Contains the source/output roots and the switches that shape page output.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// How stylesheets are compiled and exposed to pages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StyleMode {
    /// Shared base stylesheet plus optional `pages/<name>/<name>.scss`,
    /// exposed to templates as `stylesheets` (default).
    #[default]
    Page,
    /// Only the shared base stylesheet; pages link it themselves.
    ///
    /// With `[build.tailwind]` enabled the bundle is also run through the
    /// tailwind CLI, which keeps only the utilities used under `pages/`.
    Bundle,
}

/// `[build]` section in akre.toml - build pipeline configuration.
///
/// # Example
/// ```toml
/// [build]
/// source = "src"     # pages/, partials/, static/, style/, globals.yaml
/// output = "dist"    # rendered pages and assets/
/// minify = false
/// style = "page"
///
/// [build.tailwind]
/// enable = false
/// command = ["tailwindcss"]
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    /// Source root holding pages, partials, static assets and styles.
    #[serde(default = "defaults::build::source")]
    #[educe(Default = defaults::build::source())]
    pub source: PathBuf,

    /// Output root.
    #[serde(default = "defaults::build::output")]
    #[educe(Default = defaults::build::output())]
    pub output: PathBuf,

    /// Minify rendered pages and compiled stylesheets.
    #[serde(default = "defaults::r#false")]
    #[educe(Default = false)]
    pub minify: bool,

    /// Stylesheet compilation mode.
    #[serde(default = "defaults::build::style")]
    #[educe(Default = defaults::build::style())]
    pub style: StyleMode,

    /// Add vendor prefixes to compiled CSS.
    #[serde(default = "defaults::r#true")]
    #[educe(Default = true)]
    pub prefix: bool,

    /// Remove the output directory before building.
    #[serde(default = "defaults::r#false")]
    #[educe(Default = false)]
    pub clean: bool,

    /// Utility-class purge for the bundled stylesheet.
    #[serde(default)]
    pub tailwind: TailwindConfig,
}

/// `[build.tailwind]` section
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct TailwindConfig {
    /// Run the bundled stylesheet through tailwind (bundle mode only)
    #[serde(default = "defaults::r#false")]
    #[educe(Default = false)]
    pub enable: bool,

    /// Tailwind command and leading arguments
    #[serde(default = "defaults::build::tailwind::command")]
    #[educe(Default = defaults::build::tailwind::command())]
    pub command: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::super::SiteConfig;
    use super::*;

    #[test]
    fn test_build_config_defaults() {
        let config: SiteConfig = toml::from_str("").unwrap();

        assert_eq!(config.build.source, PathBuf::from("src"));
        assert_eq!(config.build.output, PathBuf::from("dist"));
        assert!(!config.build.minify);
        assert!(config.build.prefix);
        assert!(!config.build.clean);
        assert_eq!(config.build.style, StyleMode::Page);
        assert!(!config.build.tailwind.enable);
        assert_eq!(config.build.tailwind.command, vec!["tailwindcss"]);
    }

    #[test]
    fn test_tailwind_config() {
        let config = r#"
            [build]
            style = "bundle"

            [build.tailwind]
            enable = true
            command = ["npx", "tailwindcss@3"]
        "#;
        let config: SiteConfig = toml::from_str(config).unwrap();

        assert!(config.build.tailwind.enable);
        assert_eq!(config.build.tailwind.command, vec!["npx", "tailwindcss@3"]);
    }

    #[test]
    fn test_build_config_override() {
        let config = r#"
            [build]
            source = "site"
            output = "public"
            minify = true
            style = "bundle"
            prefix = false
        "#;
        let config: SiteConfig = toml::from_str(config).unwrap();

        assert_eq!(config.build.source, PathBuf::from("site"));
        assert_eq!(config.build.output, PathBuf::from("public"));
        assert!(config.build.minify);
        assert!(!config.build.prefix);
        assert_eq!(config.build.style, StyleMode::Bundle);
    }

    #[test]
    fn test_unknown_style_mode_rejected() {
        let config = r#"
            [build]
            style = "inline"
        "#;
        assert!(toml::from_str::<SiteConfig>(config).is_err());
    }

    #[test]
    fn test_unknown_field_rejection() {
        let config = r#"
            [build]
            content = "content"
        "#;
        assert!(toml::from_str::<SiteConfig>(config).is_err());
    }
}

//! akre - a static site builder for handlebars pages with yaml data and
//! scss styles.

mod assets;
mod build;
mod cli;
mod config;
mod data;
mod error;
mod init;
mod page;
mod registry;
mod serve;
mod style;
mod utils;
mod watch;

use anyhow::Result;
use build::build_site;
use clap::Parser;
use cli::{Cli, Commands};
use config::SiteConfig;
use init::{init_site, new_page};
use serve::serve_site;

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config: &'static SiteConfig = Box::leak(Box::new(load_config(&cli)?));

    match &cli.command {
        Commands::Init => init_site(config),
        Commands::New { name } => new_page(config, name),
        Commands::Build { .. } => build_site(config).map(|_| ()).map_err(Into::into),
        Commands::Watch { .. } => {
            build_site(config)?;
            serve_site(config)
        }
    }
}

/// Load and validate configuration from CLI arguments.
///
/// The config file is optional; without it every setting takes its default.
fn load_config(cli: &Cli) -> Result<SiteConfig> {
    let root = cli.root.as_deref().unwrap_or(std::path::Path::new("./"));
    let config_path = root.join(&cli.config);

    let mut config = if config_path.exists() {
        SiteConfig::from_path(&config_path)?
    } else {
        SiteConfig::default()
    };
    config.update_with_cli(cli);
    config.validate()?;

    Ok(config)
}

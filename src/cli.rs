//! Command-line interface.

use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::Datelike;
use clap::Parser;

use crate::closure::{Generator, Report};
use crate::config::Config;
use crate::repo::{self, Repository};
use crate::resolver::NameRegistry;

/// Generate Gentoo ebuilds from PyPI package metadata.
#[derive(Debug, Parser)]
#[command(name = "pypi-ebuild")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Repository to write ebuilds into
    #[arg(short, long, default_value = "../gentoo-localrepo")]
    pub repo: PathBuf,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Also generate every missing dependency, transitively
    #[arg(short = 'R', long)]
    pub recursive: bool,

    /// Run `ebuild <file> manifest` after writing each ebuild
    #[arg(short, long)]
    pub manifest: bool,

    /// Configuration file overriding the built-in tables
    #[arg(short, long, env = "PYPI_EBUILD_CONFIG")]
    pub config: Option<PathBuf>,

    /// Package registry base URL
    #[arg(long)]
    pub registry_url: Option<String>,

    /// Registry names of the packages to generate
    #[arg(required = true, value_name = "PACKAGE")]
    pub packages: Vec<String>,
}

/// Generate the requested packages, writing into `cli.repo`.
pub fn run(cli: &Cli) -> anyhow::Result<Report> {
    let mut config = Config::load(cli.config.as_deref()).context("cannot load configuration")?;
    if let Some(url) = &cli.registry_url {
        config.registry_url = url.clone();
    }

    let trees: Vec<&Path> = std::iter::once(cli.repo.as_path())
        .chain(config.known_trees.iter().map(PathBuf::as_path))
        .collect();
    let known = repo::known_packages(trees, &config.category)
        .context("cannot list existing packages")?;
    tracing::debug!("{} packages already in {}", known.len(), config.category);
    let mut registry = NameRegistry::with_known(known);

    let client = config.client().context("cannot set up the registry client")?;
    let options = config.descriptor_options(chrono::Local::now().year())?;
    let repository = Repository::new(&cli.repo).with_manifest(cli.manifest);
    tracing::debug!("writing ebuilds into {}", repository.root().display());

    let mut generator = Generator::new(
        client,
        repository,
        config.resolver(),
        config.policy(),
        options,
    );
    Ok(generator.run(&cli.packages, cli.recursive, &mut registry))
}

use std::path::PathBuf;
use std::time::Duration;

use crate::{cli::Cli, types::OutputFormat};

pub const DEFAULT_ROOT: &str = "dump";
pub const FATXPLORER_ROOT: &str = r"X:\TDATA";

#[derive(Debug, Clone, serde::Serialize)]
pub struct Config {
    pub root: PathBuf,
    pub catalog: PathBuf,
    pub update: bool,
    pub catalog_url: Option<String>,
    pub timeout: Duration,
    pub summary: bool,
    pub title_id: Option<String>,
    pub ignore_list: Option<PathBuf>,
    pub format: OutputFormat,
    pub report: Option<PathBuf>,
    pub color: bool,
    pub verbose: u8,
    pub quiet: u8,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root: PathBuf::from(DEFAULT_ROOT),
            catalog: PathBuf::from("id_database.json"),
            update: false,
            catalog_url: None,
            timeout: Duration::from_secs(30),
            summary: false,
            title_id: None,
            ignore_list: None,
            format: OutputFormat::Console,
            report: None,
            color: true,
            verbose: 0,
            quiet: 0,
        }
    }
}

impl Config {
    fn validate_update(&self) -> anyhow::Result<()> {
        if self.update && self.catalog_url.is_none() {
            anyhow::bail!("--update requires --catalog-url to download from");
        }
        if self.catalog_url.is_some() && !self.update {
            anyhow::bail!("--catalog-url only applies together with --update");
        }
        Ok(())
    }

    fn validate_title_id(&self) -> anyhow::Result<()> {
        if let Some(id) = &self.title_id {
            if id.chars().count() != 8 {
                anyhow::bail!("--title-id must be exactly 8 characters, got {id:?}");
            }
        }
        Ok(())
    }

    fn validate_timeout(&self) -> anyhow::Result<()> {
        if self.timeout.is_zero() {
            anyhow::bail!("--timeout must be at least one second");
        }
        Ok(())
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        self.validate_update()?;
        self.validate_title_id()?;
        self.validate_timeout()?;
        Ok(())
    }
}

impl TryFrom<Cli> for Config {
    type Error = anyhow::Error;

    fn try_from(cli: Cli) -> Result<Self, Self::Error> {
        let root = if cli.fatxplorer {
            PathBuf::from(FATXPLORER_ROOT)
        } else {
            cli.root.unwrap_or_else(|| PathBuf::from(DEFAULT_ROOT))
        };

        let config = Self {
            root,
            catalog: cli.catalog,
            update: cli.update,
            catalog_url: cli.catalog_url,
            timeout: Duration::from_secs(cli.timeout_secs),
            summary: cli.summary,
            title_id: cli.title_id.map(|id| id.to_lowercase()),
            ignore_list: cli.ignore_list,
            format: cli.format,
            report: cli.report,
            color: !cli.no_color,
            verbose: cli.verbose,
            quiet: cli.quiet,
        };

        config.validate()?;

        Ok(config)
    }
}

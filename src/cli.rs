use clap::{ArgAction, Parser};
use std::path::PathBuf;

use crate::types::OutputFormat;

#[derive(Parser, Debug, serde::Serialize)]
#[command(
    name = "pinecone",
    version,
    about = "Audit an Xbox TDATA dump against a catalog of known content and title updates",
    long_about = "Walks a TDATA style dump, looks up every 8 character title directory in the \
                  catalog, and reports downloadable content under $c and title updates under $u \
                  as known, unknown, archived or unarchived. The dump is only ever read."
)]
pub struct Cli {
    /// Root of the dump to scan
    #[arg(long = "root", value_name = "PATH")]
    pub root: Option<PathBuf>,

    /// Scan the FATXplorer mount (X:\TDATA) instead of a local directory
    #[arg(long = "fatxplorer", conflicts_with = "root")]
    pub fatxplorer: bool,

    /// Catalog of known titles
    #[arg(long = "catalog", value_name = "PATH", default_value = "id_database.json")]
    pub catalog: PathBuf,

    /// Download a fresh catalog before scanning
    #[arg(long = "update")]
    pub update: bool,

    /// Where --update downloads the catalog from
    #[arg(long = "catalog-url", value_name = "URL")]
    pub catalog_url: Option<String>,

    /// HTTP timeout for --update, in seconds
    #[arg(long = "timeout", value_name = "SECS", default_value_t = 30)]
    pub timeout_secs: u64,

    /// Print catalog statistics and scan totals
    #[arg(long = "summary")]
    pub summary: bool,

    /// Show the catalog record for one title and only report on that title
    #[arg(long = "title-id", value_name = "ID")]
    pub title_id: Option<String>,

    /// JSON array of title ids to leave out of the output
    #[arg(long = "ignore-list", value_name = "PATH")]
    pub ignore_list: Option<PathBuf>,

    /// Output renderer
    #[arg(long = "format", value_enum, default_value_t = OutputFormat::Console)]
    pub format: OutputFormat,

    /// Also write the report as plain text to this file
    #[arg(long = "report", value_name = "PATH")]
    pub report: Option<PathBuf>,

    /// Disable colored console output
    #[arg(long = "no-color")]
    pub no_color: bool,

    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,
    #[arg(short = 'q', long = "quiet", action = ArgAction::Count)]
    pub quiet: u8,
}

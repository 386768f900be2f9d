// Lightweight verbosity-gated logging helper used throughout the crate.
macro_rules! vprintln {
	($verbose:expr, $level:expr, $($arg:tt)*) => {
		if $verbose >= $level {
			eprintln!($($arg)*);
		}
	};
}

pub mod catalog;
pub mod checksum;
pub mod cli;
pub mod config;
pub mod ignore;
pub mod report;
pub mod sink;
pub mod types;
pub mod verify;

// Keep main.rs thin and have it call into the library functions.
use anyhow::Context;

use crate::catalog::Catalog;
use crate::config::Config;
use crate::ignore::load_ignore_list;
use crate::report::{Summary, summary_lines, title_lines, title_record, write_report};
use crate::sink::{ConsoleSink, EventSink, JsonSink, PaneSink, Tally, TitleFilter};
use crate::types::OutputFormat;
use crate::verify::Verifier;

pub fn run(config: &Config) -> anyhow::Result<()> {
    if config.update {
        let url = config
            .catalog_url
            .as_deref()
            .context("--update requires --catalog-url")?;
        let stats =
            catalog::refresh_catalog(url, &config.catalog, config.timeout, config.verbose)?;
        vprintln!(
            config.verbose,
            1,
            "catalog refreshed: {} titles, {} known updates",
            stats.titles,
            stats.known_updates
        );
    }

    let catalog = Catalog::load(&config.catalog)?;
    vprintln!(
        config.verbose,
        1,
        "loaded {} titles from {:?}",
        catalog.len(),
        config.catalog
    );
    for title_id in catalog.duplicate_ids() {
        vprintln!(
            config.verbose,
            1,
            "duplicate title id {} in catalog, keeping the first record",
            title_id
        );
    }

    let ignored = match &config.ignore_list {
        Some(path) => load_ignore_list(path)?,
        None => Vec::new(),
    };
    vprintln!(config.verbose, 2, "ignoring {} title ids", ignored.len());

    if let Some(title_id) = config.title_id.as_deref() {
        let record = title_record(&catalog, title_id);
        match config.format {
            OutputFormat::Console => {
                for line in title_lines(&record) {
                    println!("{line}");
                }
            }
            OutputFormat::Json => println!("{}", serde_json::to_string(&record)?),
        }
    }

    let mut console = ConsoleSink::stdout(config.color);
    let mut json = JsonSink::new(std::io::stdout());
    let mut pane = PaneSink::default();
    let tally = {
        let mut outputs: Vec<&mut dyn EventSink> = Vec::new();
        match config.format {
            OutputFormat::Console if config.quiet == 0 => outputs.push(&mut console),
            OutputFormat::Console => {}
            OutputFormat::Json => outputs.push(&mut json),
        }
        if config.report.is_some() {
            outputs.push(&mut pane);
        }

        // Filter before counting so the summary matches what was shown.
        let mut sink = TitleFilter::new(Tally::new(outputs))
            .only(config.title_id.as_deref())
            .ignoring(ignored);
        Verifier::new(&catalog, &config.root)
            .verbose(config.verbose)
            .run(&mut sink)?;
        let (_, tally) = sink.into_inner().into_parts();
        tally
    };

    if let Some(path) = &config.report {
        write_report(path, &config.root, &pane)?;
        vprintln!(config.verbose, 1, "report written to {:?}", path);
    }

    if config.summary {
        let stats = catalog.stats();
        match config.format {
            OutputFormat::Console => {
                for line in summary_lines(&stats, &tally) {
                    println!("{line}");
                }
            }
            OutputFormat::Json => {
                let summary = Summary {
                    catalog: stats,
                    scan: &tally,
                };
                println!("{}", serde_json::to_string(&summary)?);
            }
        }
    }

    Ok(())
}

use anyhow::Result;
use clap::Parser;
use mediasort::mediasort_core::organize::{OrganizeOptions, TransferMode, organize};
use mediasort::mediasort_core::platform::open_directory;
use mediasort::mediasort_core::search::{SearchQuery, directories_to_open, format_results, search};
use mediasort::mediasort_core::{Cli, Commands, ExifToolCli, MediasortError};
use simplelog::{CombinedLogger, Config, LevelFilter, SharedLogger, TermLogger, WriteLogger};
use std::fs::File;
use std::io;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize loggers
    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        LevelFilter::Warn,
        Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )];

    if let Some(log_file) = &cli.log {
        loggers.push(WriteLogger::new(
            cli.log_level.into(),
            Config::default(),
            File::create(log_file)?,
        ));
    }

    CombinedLogger::init(loggers)?;

    match cli.command {
        Commands::Organize {
            source_dir,
            dest_dir,
            copy,
            dry_run,
            fallback_to_file_time,
            yes,
            open_dest,
        } => {
            let options = OrganizeOptions {
                mode: if copy {
                    TransferMode::Copy
                } else {
                    TransferMode::Move
                },
                dry_run,
                fallback: fallback_to_file_time,
                assume_yes: yes,
            };

            let exiftool = ExifToolCli::new();
            let mut stdin = io::stdin().lock();
            let report = match organize(&source_dir, &dest_dir, &options, &exiftool, &mut stdin) {
                Ok(report) => report,
                Err(MediasortError::Cancelled) => {
                    log::info!("Organize cancelled by user");
                    return Ok(());
                }
                Err(e) => return Err(e.into()),
            };

            if report.total_found > 0 {
                report.print_summary();
            }

            if open_dest && !dry_run && dest_dir.is_dir() {
                if let Err(e) = open_directory(&dest_dir) {
                    log::warn!("Could not open {}: {}", dest_dir.display(), e);
                    println!("Error: could not open directory {}: {}", dest_dir.display(), e);
                }
            }
        }

        Commands::Search {
            search_dir,
            year,
            month,
            keyword,
            keyword_match,
            rating,
            rejected,
            picked,
            open_dirs,
        } => {
            let query = SearchQuery::from_args(
                year.as_deref(),
                month.as_deref(),
                keyword,
                keyword_match,
                rating.as_deref(),
                rejected,
                picked,
            )?;

            let exiftool = ExifToolCli::new();
            let outcome = search(&search_dir, &query, &exiftool)?;
            println!("\n{}", format_results(&outcome.matches));

            if open_dirs {
                for dir in directories_to_open(&outcome.matches) {
                    println!("Opening directory: {}", dir.display());
                    if let Err(e) = open_directory(&dir) {
                        log::warn!("Could not open {}: {}", dir.display(), e);
                        println!("Error: could not open directory {}: {}", dir.display(), e);
                    }
                }
            }
        }
    }

    Ok(())
}

use crate::mediasort_core::classify::{placement_path, scan_media_files};
use crate::mediasort_core::cli::FallbackTime;
use crate::mediasort_core::error::{MediasortError, PlacementFailures, Result};
use crate::mediasort_core::exiftool::MetadataSource;
use crate::mediasort_core::media::{DateSource, MediaFile, MediaType};
use filetime::FileTime;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashSet;
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use time::{OffsetDateTime, PrimitiveDateTime, UtcOffset};

/// Number of skipped files listed by name in the summary.
const SKIPPED_PREVIEW: usize = 10;

const MOVE_WARNING: &str = "WARNING: MOVE MODE\n\n\
You are about to MOVE files (not copy them).\n\n\
This operation will:\n  \
- Remove files from their original location\n  \
- Place them in the new organized structure\n  \
- This action cannot be automatically undone";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferMode {
    Copy,
    Move,
}

impl TransferMode {
    fn verb(&self) -> &'static str {
        match self {
            TransferMode::Copy => "Copying",
            TransferMode::Move => "Moving",
        }
    }
}

/// Options for a single organize run.
#[derive(Debug, Clone)]
pub struct OrganizeOptions {
    pub mode: TransferMode,
    pub dry_run: bool,
    pub fallback: Option<FallbackTime>,
    /// Skip the interactive confirmation before moving files.
    pub assume_yes: bool,
}

impl Default for OrganizeOptions {
    fn default() -> Self {
        OrganizeOptions {
            mode: TransferMode::Move,
            dry_run: false,
            fallback: None,
            assume_yes: false,
        }
    }
}

/// A file placed (or, in a dry run, planned) at its destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub media_type: MediaType,
    pub date_source: DateSource,
}

/// Outcome of an organize run.
#[derive(Debug, Default)]
pub struct OrganizeReport {
    pub total_found: usize,
    pub processed: usize,
    /// Files without a resolvable capture date.
    pub skipped: Vec<PathBuf>,
    pub failures: PlacementFailures,
    pub placements: Vec<Placement>,
    pub dry_run: bool,
}

impl OrganizeReport {
    pub fn images(&self) -> usize {
        self.count_of(MediaType::Image)
    }

    pub fn videos(&self) -> usize {
        self.count_of(MediaType::Video)
    }

    fn count_of(&self, media_type: MediaType) -> usize {
        self.placements
            .iter()
            .filter(|p| p.media_type == media_type)
            .count()
    }

    pub fn print_summary(&self) {
        println!(
            "\n--- Sorting complete! Processed {}/{} files ({} images, {} videos) ---",
            self.processed,
            self.total_found,
            self.images(),
            self.videos()
        );
        if self.dry_run {
            println!("--- DRY RUN MODE: No changes were made. ---");
        }

        if !self.failures.is_empty() {
            println!("\n{} file(s) could not be moved or copied:", self.failures.len());
            print!("{}", self.failures);
        }

        if !self.skipped.is_empty() {
            println!(
                "\n{} file(s) were skipped because their creation date could not be determined:",
                self.skipped.len()
            );
            for path in self.skipped.iter().take(SKIPPED_PREVIEW) {
                let name = path.file_name().unwrap_or_default().to_string_lossy();
                println!("  - {}", name);
            }
            if self.skipped.len() > SKIPPED_PREVIEW {
                println!("  ... and {} more", self.skipped.len() - SKIPPED_PREVIEW);
            }
        }
    }
}

/// Sort media files from `source_dir` into `dest_dir/YYYY/MM` by capture date.
///
/// `input` answers the move confirmation prompt.
pub fn organize<R: BufRead>(
    source_dir: &Path,
    dest_dir: &Path,
    options: &OrganizeOptions,
    metadata: &dyn MetadataSource,
    input: &mut R,
) -> Result<OrganizeReport> {
    metadata.check_available()?;

    if options.mode == TransferMode::Move
        && !options.dry_run
        && !options.assume_yes
        && !confirm_move(input)?
    {
        println!("\nOperation Cancelled.\n");
        return Err(MediasortError::Cancelled);
    }

    println!(
        "Starting media sort from '{}' to '{}'",
        source_dir.display(),
        dest_dir.display()
    );
    println!(
        "Mode: {}",
        match options.mode {
            TransferMode::Copy => "Copy",
            TransferMode::Move => "Move",
        }
    );
    if options.dry_run {
        println!("--- DRY RUN MODE: No files will be moved or copied. ---");
    }

    log::info!("Phase 1: Scanning source directory {}", source_dir.display());
    println!("\nScanning directory for media files...");
    let mut files = scan_media_files(source_dir)?;

    let mut report = OrganizeReport {
        total_found: files.len(),
        dry_run: options.dry_run,
        ..Default::default()
    };

    if files.is_empty() {
        println!("No files found to process.");
        return Ok(report);
    }

    println!("Found {} files to process.", files.len());

    log::info!("Phase 2: Reading capture dates");
    resolve_dates(&mut files, metadata, options.fallback);

    if !options.dry_run {
        fs::create_dir_all(dest_dir)?;
    }

    log::info!("Phase 3: Placing files");
    println!("\nProcessing files...");
    let mut reserved: HashSet<PathBuf> = HashSet::new();

    for file in &files {
        println!("\nProcessing: {}", file.filename.to_string_lossy());

        let Some(date) = file.capture_date else {
            println!("  - Could not determine creation date. Skipping.");
            log::debug!("No capture date for {}", file.path.display());
            report.skipped.push(file.path.clone());
            continue;
        };
        match file.date_source {
            DateSource::FileCreated => println!("  - Using file creation time as fallback"),
            DateSource::FileModified => println!("  - Using file modification time as fallback"),
            _ => {}
        }

        let destination = placement_path(dest_dir, &date, &file.filename, &reserved);
        reserved.insert(destination.clone());

        let relative = destination.strip_prefix(dest_dir).unwrap_or(&destination);
        println!("  - {} to: {}", options.mode.verb(), relative.display());

        if !options.dry_run {
            if let Err(e) = transfer(&file.path, &destination, options.mode) {
                println!("  - ERROR: Could not move/copy file. {}", e);
                log::warn!(
                    "Failed to place {} at {}: {}",
                    file.path.display(),
                    destination.display(),
                    e
                );
                report.failures.add(file.path.clone(), destination, e);
                continue;
            }
        }

        report.processed += 1;
        report.placements.push(Placement {
            source: file.path.clone(),
            destination,
            media_type: file.media_type,
            date_source: file.date_source,
        });
    }

    log::info!(
        "Organize complete: {} processed, {} skipped, {} failed",
        report.processed,
        report.skipped.len(),
        report.failures.len()
    );

    Ok(report)
}

/// Annotate every file with a capture date from one metadata batch, falling
/// back to filesystem timestamps when configured.
fn resolve_dates(
    files: &mut [MediaFile],
    metadata: &dyn MetadataSource,
    fallback: Option<FallbackTime>,
) {
    println!("Reading metadata (this may take a moment)...");
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message("Reading metadata");
    spinner.enable_steady_tick(Duration::from_millis(100));

    let paths: Vec<PathBuf> = files.iter().map(|f| f.path.clone()).collect();
    let dates = metadata.capture_dates(&paths);

    spinner.finish_and_clear();

    for file in files.iter_mut() {
        if let Some(Some(date)) = dates.get(&file.path) {
            file.resolve(*date, DateSource::Metadata);
            continue;
        }

        let Some(fallback) = fallback else {
            continue;
        };
        match file_timestamp(&file.path, fallback) {
            Ok((date, source)) => file.resolve(date, source),
            Err(e) => log::warn!(
                "Could not read file time for {}: {}",
                file.path.display(),
                e
            ),
        }
    }
}

/// Filesystem creation or modification time in the local timezone.
fn file_timestamp(
    path: &Path,
    fallback: FallbackTime,
) -> io::Result<(PrimitiveDateTime, DateSource)> {
    let metadata = fs::metadata(path)?;
    let (time, source) = pick_file_time(metadata.created(), metadata.modified(), fallback)?;
    if fallback == FallbackTime::Created && source == DateSource::FileModified {
        println!(
            "  - Creation time unavailable for {}, using modification time",
            path.display()
        );
    }
    let local = OffsetDateTime::from(time).to_offset(get_local_offset());
    Ok((PrimitiveDateTime::new(local.date(), local.time()), source))
}

/// Choose the fallback timestamp. Creation time falls back to modification
/// time on filesystems that do not record it.
fn pick_file_time(
    created: io::Result<SystemTime>,
    modified: io::Result<SystemTime>,
    fallback: FallbackTime,
) -> io::Result<(SystemTime, DateSource)> {
    match fallback {
        FallbackTime::Created => match created {
            Ok(time) => Ok((time, DateSource::FileCreated)),
            Err(e) => {
                log::warn!("Creation time unavailable ({}), using modification time", e);
                Ok((modified?, DateSource::FileModified))
            }
        },
        FallbackTime::Modified => Ok((modified?, DateSource::FileModified)),
    }
}

/// Get the local timezone offset, falling back to UTC if unavailable.
fn get_local_offset() -> UtcOffset {
    UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC)
}

/// Copy or move a single file, creating its destination folder.
fn transfer(source: &Path, destination: &Path, mode: TransferMode) -> io::Result<()> {
    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent)?;
    }

    match mode {
        TransferMode::Copy => copy_then_remove(source, destination, |_| Ok(())),
        TransferMode::Move => match fs::rename(source, destination) {
            Ok(()) => Ok(()),
            Err(e) => {
                // Renames fail across filesystems
                log::debug!("Rename of {} failed ({}), copying", source.display(), e);
                copy_then_remove(source, destination, |path| fs::remove_file(path))
            }
        },
    }
}

/// Copy `source` to `destination`, then run `remove_source`. On any failure
/// the copy is deleted again so a retry does not leave a duplicate.
fn copy_then_remove(
    source: &Path,
    destination: &Path,
    remove_source: impl FnOnce(&Path) -> io::Result<()>,
) -> io::Result<()> {
    let result = copy_preserving_times(source, destination).and_then(|()| remove_source(source));
    if result.is_err() && destination.exists() {
        if let Err(e) = fs::remove_file(destination) {
            log::warn!(
                "Could not remove partial copy {}: {}",
                destination.display(),
                e
            );
        }
    }
    result
}

fn copy_preserving_times(source: &Path, destination: &Path) -> io::Result<()> {
    fs::copy(source, destination)?;
    let metadata = fs::metadata(source)?;
    filetime::set_file_times(
        destination,
        FileTime::from_last_access_time(&metadata),
        FileTime::from_last_modification_time(&metadata),
    )
}

/// Ask the user to confirm a move. Empty input means yes; end of input means no.
pub fn confirm_move<R: BufRead>(input: &mut R) -> Result<bool> {
    let rule = "=".repeat(60);
    println!("\n{}", rule);
    println!("{}", MOVE_WARNING);
    println!("{}\n", rule);

    loop {
        print!("Continue with MOVE operation? [Y/n]: ");
        io::stdout().flush()?;

        let mut answer = String::new();
        if input.read_line(&mut answer)? == 0 {
            return Ok(false);
        }

        match answer.trim().to_lowercase().as_str() {
            "" | "y" | "yes" => return Ok(true),
            "n" | "no" => return Ok(false),
            _ => println!("\nPlease enter 'Y' or Enter to confirm, 'n' to cancel."),
        }
    }
}

use crate::mediasort_core::error::{MediasortError, Result};
use crate::mediasort_core::exif::{DATE_TAGS, DateRecord, EXIFTOOL_DATE_ARG};
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use time::PrimitiveDateTime;

/// Capture dates for a batch of files, keyed by the path exiftool reported.
/// A missing key means the date could not be resolved.
pub type BatchDates = HashMap<PathBuf, Option<PrimitiveDateTime>>;

/// Output format for `-p`: one matching file per line.
const PRINT_FORMAT: &str = "$directory/$filename";

/// Source of embedded metadata for the organize and search engines.
pub trait MetadataSource {
    /// Fail with `ExiftoolNotFound` when the backing tool cannot be run.
    fn check_available(&self) -> Result<()>;

    /// Resolve capture dates for all `paths` at once. Never fails: a broken
    /// batch yields an empty map.
    fn capture_dates(&self, paths: &[PathBuf]) -> BatchDates;

    /// Return the subset of `paths` whose metadata satisfies `condition`.
    fn filter(&self, paths: &[PathBuf], condition: &str) -> Result<Vec<PathBuf>>;
}

/// Runs the `exiftool` command-line program.
#[derive(Debug, Clone)]
pub struct ExifToolCli {
    program: PathBuf,
}

impl Default for ExifToolCli {
    fn default() -> Self {
        Self::new()
    }
}

impl ExifToolCli {
    pub fn new() -> Self {
        Self::with_program("exiftool")
    }

    pub fn with_program(program: impl AsRef<Path>) -> Self {
        ExifToolCli {
            program: program.as_ref().to_path_buf(),
        }
    }

    fn run(&self, cmd: &mut Command) -> Result<Output> {
        log::debug!("Running {:?}", cmd.get_program());
        cmd.output().map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => MediasortError::ExiftoolNotFound,
            _ => MediasortError::Io(e),
        })
    }

    fn read_dates(&self, paths: &[PathBuf]) -> Result<BatchDates> {
        let mut cmd = Command::new(&self.program);
        cmd.arg("-json").arg("-d").arg(EXIFTOOL_DATE_ARG);
        for tag in DATE_TAGS {
            cmd.arg(format!("-{}", tag));
        }
        cmd.args(paths);

        let output = self.run(&mut cmd)?;
        if !output.status.success() {
            return Err(MediasortError::Exiftool(format!(
                "exiftool exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        dates_from_json(&output.stdout)
    }
}

impl MetadataSource for ExifToolCli {
    fn check_available(&self) -> Result<()> {
        let output = Command::new(&self.program)
            .arg("-ver")
            .output()
            .map_err(|_| MediasortError::ExiftoolNotFound)?;
        if !output.status.success() {
            return Err(MediasortError::ExiftoolNotFound);
        }
        log::info!(
            "Found exiftool version {}",
            String::from_utf8_lossy(&output.stdout).trim()
        );
        Ok(())
    }

    fn capture_dates(&self, paths: &[PathBuf]) -> BatchDates {
        if paths.is_empty() {
            return BatchDates::new();
        }

        match self.read_dates(paths) {
            Ok(dates) => {
                log::info!("Read metadata for {}/{} files", dates.len(), paths.len());
                dates
            }
            Err(e) => {
                log::error!("Error processing batch metadata: {}", e);
                println!("Error processing batch metadata: {}", e);
                BatchDates::new()
            }
        }
    }

    fn filter(&self, paths: &[PathBuf], condition: &str) -> Result<Vec<PathBuf>> {
        if paths.is_empty() {
            return Ok(Vec::new());
        }

        let mut cmd = Command::new(&self.program);
        cmd.arg("-q")
            .arg("-r")
            .arg("-if")
            .arg(condition)
            .arg("-p")
            .arg(PRINT_FORMAT)
            .args(paths);

        let output = self.run(&mut cmd)?;
        if !output.status.success() {
            // exiftool exits non-zero when no file satisfies the condition
            log::debug!(
                "exiftool exited with {} (no matches?): {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        Ok(matching_inputs(
            paths,
            paths_from_lines(&String::from_utf8_lossy(&output.stdout)),
        ))
    }
}

/// Parse `exiftool -json` output into per-file capture dates.
pub fn dates_from_json(json: &[u8]) -> Result<BatchDates> {
    let records: Vec<DateRecord> = serde_json::from_slice(json)
        .map_err(|e| MediasortError::Exiftool(format!("invalid JSON output: {}", e)))?;

    let mut dates = BatchDates::with_capacity(records.len());
    for record in records {
        let Some(source_file) = record.source_file.clone() else {
            log::warn!("Skipping exiftool entry without SourceFile");
            continue;
        };
        let date = record.resolve();
        log::debug!("{} -> {:?}", source_file.display(), date);
        dates.insert(source_file, date);
    }

    Ok(dates)
}

/// Map reported paths back onto `inputs`, dropping anything exiftool printed
/// that is not one of them (summary lines, warnings).
fn matching_inputs(inputs: &[PathBuf], reported: Vec<PathBuf>) -> Vec<PathBuf> {
    let by_key: HashMap<String, &PathBuf> =
        inputs.iter().map(|path| (path_key(path), path)).collect();
    reported
        .iter()
        .filter_map(|path| match by_key.get(&path_key(path)) {
            Some(&input) => Some(input.clone()),
            None => {
                log::debug!("Ignoring exiftool output line: {}", path.display());
                None
            }
        })
        .collect()
}

/// Comparison key for a path; exiftool reports paths with forward slashes.
pub fn path_key(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

fn paths_from_lines(stdout: &str) -> Vec<PathBuf> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(PathBuf::from)
        .collect()
}

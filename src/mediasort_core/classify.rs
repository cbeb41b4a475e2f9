use crate::mediasort_core::error::{MediasortError, Result};
use crate::mediasort_core::media::{MediaFile, is_hidden};
use std::collections::HashSet;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use time::PrimitiveDateTime;
use time::macros::format_description;
use walkdir::WalkDir;

/// Date format for destination folders (YYYY/MM).
const FOLDER_YEAR_FORMAT: &[time::format_description::FormatItem] = format_description!("[year]");
const FOLDER_MONTH_FORMAT: &[time::format_description::FormatItem] = format_description!("[month]");

/// Recursively collect supported, non-hidden media files under `source_dir`,
/// in file-name order.
pub fn scan_media_files(source_dir: &Path) -> Result<Vec<MediaFile>> {
    if !source_dir.exists() {
        return Err(MediasortError::PathNotFound(source_dir.to_path_buf()));
    }
    if !source_dir.is_dir() {
        return Err(MediasortError::NotADirectory(source_dir.to_path_buf()));
    }

    let mut files = Vec::new();

    for entry in WalkDir::new(source_dir).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                log::warn!("Skipping unreadable entry: {}", e);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        if is_hidden(&entry.file_name().to_string_lossy()) {
            log::debug!("Skipping hidden file: {}", entry.path().display());
            continue;
        }

        match MediaFile::from_path(entry.path()) {
            Some(file) => files.push(file),
            None => log::debug!("Skipping non-media file: {}", entry.path().display()),
        }
    }

    log::info!("Found {} media files in {}", files.len(), source_dir.display());
    Ok(files)
}

/// Destination directory for a capture date: `dest_root/YYYY/MM`.
pub fn date_folder(dest_root: &Path, date: &PrimitiveDateTime) -> PathBuf {
    // Both items are plain numeric components, formatting cannot fail.
    let year = date.format(FOLDER_YEAR_FORMAT).unwrap_or_default();
    let month = date.format(FOLDER_MONTH_FORMAT).unwrap_or_default();
    dest_root.join(year).join(month)
}

/// Compute a destination for `filename` that does not overwrite anything.
///
/// Probes `name`, `name_1`, `name_2`, ... and returns the first candidate that
/// neither exists on disk nor is in `reserved`. Not safe against concurrent
/// placement into the same folder.
pub fn placement_path(
    dest_root: &Path,
    date: &PrimitiveDateTime,
    filename: impl AsRef<OsStr>,
    reserved: &HashSet<PathBuf>,
) -> PathBuf {
    let filename = filename.as_ref();
    let target_dir = date_folder(dest_root, date);
    let is_taken = |path: &Path| path.exists() || reserved.contains(path);

    let mut candidate = target_dir.join(filename);
    if !is_taken(&candidate) {
        return candidate;
    }

    let mut counter = 1u32;
    loop {
        candidate = target_dir.join(numbered_name(filename, counter));
        if !is_taken(&candidate) {
            return candidate;
        }
        counter += 1;
    }
}

/// `stem_N.ext` for a file name, keeping non-UTF-8 bytes intact.
fn numbered_name(filename: &OsStr, counter: u32) -> OsString {
    let path = Path::new(filename);
    let mut name = path.file_stem().unwrap_or(filename).to_os_string();
    name.push(format!("_{}", counter));
    if let Some(ext) = path.extension() {
        name.push(".");
        name.push(ext);
    }
    name
}

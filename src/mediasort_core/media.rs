use std::ffi::OsString;
use std::path::{Path, PathBuf};
use time::PrimitiveDateTime;

/// Image file extensions (lowercase).
const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "bmp", "tiff", "tif", "webp", "heic", "heif",
    // RAW formats
    "raw", "cr2", "nef", "arw", "dng", "orf", "rw2", "pef", "srw", "raf", "crw", "cr3",
];

/// Video file extensions (lowercase).
const VIDEO_EXTENSIONS: &[&str] = &[
    "mp4", "mov", "avi", "mkv", "wmv", "flv", "webm", "m4v", "mpg", "mpeg", "3gp", "mts",
    "m2ts", "vob", "ogv", "mxf",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaType {
    Image,
    Video,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Image => "image",
            MediaType::Video => "video",
        }
    }
}

impl std::fmt::Display for MediaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Where a file's capture date came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateSource {
    Metadata,
    FileCreated,
    FileModified,
    Unresolved,
}

impl DateSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            DateSource::Metadata => "metadata",
            DateSource::FileCreated => "file-created",
            DateSource::FileModified => "file-modified",
            DateSource::Unresolved => "unresolved",
        }
    }
}

impl std::fmt::Display for DateSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A media file discovered in a source tree.
#[derive(Debug, Clone)]
pub struct MediaFile {
    pub path: PathBuf,
    pub filename: OsString,
    /// Lower-cased extension without the dot.
    pub extension: String,
    pub media_type: MediaType,
    pub hidden: bool,
    pub capture_date: Option<PrimitiveDateTime>,
    pub date_source: DateSource,
}

impl MediaFile {
    /// Build a `MediaFile` for a path with a supported extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let media_type = detect_media_type(path)?;
        let filename = path.file_name()?.to_os_string();
        let extension = path
            .extension()
            .unwrap_or_default()
            .to_string_lossy()
            .to_lowercase();

        Some(MediaFile {
            path: path.to_path_buf(),
            hidden: is_hidden(&filename.to_string_lossy()),
            filename,
            extension,
            media_type,
            capture_date: None,
            date_source: DateSource::Unresolved,
        })
    }

    pub fn resolve(&mut self, date: PrimitiveDateTime, source: DateSource) {
        self.capture_date = Some(date);
        self.date_source = source;
    }
}

/// Detect media type from a file's extension (case-insensitive).
pub fn detect_media_type(path: &Path) -> Option<MediaType> {
    let ext = path.extension()?.to_str()?.to_lowercase();

    if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
        return Some(MediaType::Image);
    }

    if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
        return Some(MediaType::Video);
    }

    None
}

/// Check if a path has a supported image or video extension.
pub fn is_media_file(path: &Path) -> bool {
    detect_media_type(path).is_some()
}

/// Dotfiles are hidden.
pub fn is_hidden(filename: &str) -> bool {
    filename.starts_with('.')
}

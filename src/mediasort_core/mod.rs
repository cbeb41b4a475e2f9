pub mod classify;
pub mod cli;
pub mod error;
pub mod exif;
pub mod exiftool;
pub mod media;
pub mod organize;
pub mod platform;
pub mod search;

#[cfg(test)]
pub mod test_utils;

pub use cli::{Cli, Commands};
pub use error::{MediasortError, Result};
pub use exiftool::{ExifToolCli, MetadataSource};

//! Shared fixtures for unit tests.

use crate::mediasort_core::error::{MediasortError, Result};
use crate::mediasort_core::exiftool::{BatchDates, MetadataSource};
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use time::PrimitiveDateTime;

/// In-memory stand-in for exiftool, keyed by file name.
#[derive(Default)]
pub struct FakeMetadata {
    pub available: bool,
    pub dates: HashMap<&'static str, PrimitiveDateTime>,
    /// File names that satisfy any filter condition.
    pub filter_matches: Vec<&'static str>,
    /// Extra lines `filter` reports after the matches.
    pub filter_noise: Vec<&'static str>,
    /// Paths and condition of every `filter` call.
    pub filter_calls: RefCell<Vec<(Vec<PathBuf>, String)>>,
}

impl FakeMetadata {
    pub fn with_dates(dates: &[(&'static str, PrimitiveDateTime)]) -> Self {
        FakeMetadata {
            available: true,
            dates: dates.iter().copied().collect(),
            ..Default::default()
        }
    }

    pub fn with_filter_matches(matches: &[&'static str]) -> Self {
        FakeMetadata {
            available: true,
            filter_matches: matches.to_vec(),
            ..Default::default()
        }
    }

    pub fn unavailable() -> Self {
        FakeMetadata::default()
    }

    fn name_of(path: &Path) -> &str {
        path.file_name().and_then(|n| n.to_str()).unwrap_or_default()
    }
}

impl MetadataSource for FakeMetadata {
    fn check_available(&self) -> Result<()> {
        if self.available {
            Ok(())
        } else {
            Err(MediasortError::ExiftoolNotFound)
        }
    }

    fn capture_dates(&self, paths: &[PathBuf]) -> BatchDates {
        if !self.available {
            return BatchDates::new();
        }
        paths
            .iter()
            .map(|p| (p.clone(), self.dates.get(Self::name_of(p)).copied()))
            .collect()
    }

    fn filter(&self, paths: &[PathBuf], condition: &str) -> Result<Vec<PathBuf>> {
        if !self.available {
            return Err(MediasortError::ExiftoolNotFound);
        }
        self.filter_calls
            .borrow_mut()
            .push((paths.to_vec(), condition.to_string()));
        let mut matches: Vec<PathBuf> = paths
            .iter()
            .filter(|p| {
                let name = Self::name_of(p);
                self.filter_matches.iter().any(|m| *m == name)
            })
            .cloned()
            .collect();
        matches.extend(self.filter_noise.iter().map(PathBuf::from));
        Ok(matches)
    }
}

use crate::mediasort_core::cli::KeywordMatch;
use crate::mediasort_core::error::{MediasortError, Result};
use crate::mediasort_core::exiftool::{MetadataSource, path_key};
use crate::mediasort_core::media::is_hidden;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

/// Lowest and highest valid ratings (-1 marks a rejected file).
const RATING_RANGE: std::ops::RangeInclusive<i32> = -1..=5;

/// A search query with filters.
#[derive(Debug, Default, Clone)]
pub struct SearchQuery {
    pub years: Vec<i32>,
    pub months: Vec<i32>,
    pub keywords: Vec<String>,
    pub keyword_match: KeywordMatch,
    pub ratings: Vec<i32>,
}

impl SearchQuery {
    /// Build a query from raw command-line values, validating ranges and the
    /// mutually exclusive rating options.
    pub fn from_args(
        year: Option<&str>,
        month: Option<&str>,
        keywords: Vec<String>,
        keyword_match: KeywordMatch,
        rating: Option<&str>,
        rejected: bool,
        picked: bool,
    ) -> Result<Self> {
        if rejected && picked {
            return Err(MediasortError::Argument(
                "--rejected and --picked cannot be used together".to_string(),
            ));
        }
        if rating.is_some() && (rejected || picked) {
            return Err(MediasortError::Argument(
                "--rating cannot be combined with --rejected or --picked".to_string(),
            ));
        }

        let ratings = if rejected {
            Self::rejected_ratings()
        } else if picked {
            Self::picked_ratings()
        } else {
            parse_range(rating)?
        };
        if let Some(bad) = ratings.iter().find(|r| !RATING_RANGE.contains(*r)) {
            return Err(MediasortError::Argument(format!(
                "Rating must be between -1 and 5, got {}",
                bad
            )));
        }

        let months = parse_range(month)?;
        if let Some(bad) = months.iter().find(|m| !(1..=12).contains(*m)) {
            return Err(MediasortError::Argument(format!(
                "Month must be between 1 and 12, got {}",
                bad
            )));
        }

        Ok(SearchQuery {
            years: parse_range(year)?,
            months,
            keywords: keywords
                .into_iter()
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty())
                .collect(),
            keyword_match,
            ratings,
        })
    }

    /// Rating of rejected files.
    pub fn rejected_ratings() -> Vec<i32> {
        vec![-1]
    }

    /// Ratings of picked files.
    pub fn picked_ratings() -> Vec<i32> {
        (0..=5).collect()
    }

    /// Whether exiftool has to be consulted.
    pub fn has_metadata_filter(&self) -> bool {
        !self.ratings.is_empty() || !self.keywords.is_empty()
    }

    /// exiftool `-if` condition for the rating and keyword filters.
    pub fn metadata_condition(&self) -> Option<String> {
        let mut conditions = Vec::new();

        if !self.ratings.is_empty() {
            let ratings: Vec<String> = self
                .ratings
                .iter()
                .map(|r| format!("$Rating == {}", r))
                .collect();
            conditions.push(format!("({})", ratings.join(" or ")));
        }

        if !self.keywords.is_empty() {
            let op = match self.keyword_match {
                KeywordMatch::Any => " or ",
                KeywordMatch::All => " and ",
            };
            let keywords: Vec<String> = self
                .keywords
                .iter()
                .map(|k| format!("$Keywords =~ /{}/i", quote_keyword(k)))
                .collect();
            conditions.push(format!("({})", keywords.join(op)));
        }

        if conditions.is_empty() {
            None
        } else {
            Some(conditions.join(" and "))
        }
    }

    /// Case-insensitive keyword match against a path.
    pub fn path_matches_keywords(&self, path: &Path) -> bool {
        if self.keywords.is_empty() {
            return false;
        }
        let path_lower = path.to_string_lossy().to_lowercase();
        let mut hits = self
            .keywords
            .iter()
            .map(|k| path_lower.contains(&k.to_lowercase()));
        match self.keyword_match {
            KeywordMatch::Any => hits.any(|hit| hit),
            KeywordMatch::All => hits.all(|hit| hit),
        }
    }

    /// Whether a directory's encoded year/month rules out everything below it.
    fn excludes_dir(&self, dir: &Path) -> bool {
        let (year, month) = parse_dir_date(dir);
        if let Some(year) = year {
            if !self.years.is_empty() && !self.years.contains(&year) {
                return true;
            }
        }
        if let Some(month) = month {
            if !self.months.is_empty() && !self.months.contains(&month) {
                return true;
            }
        }
        false
    }
}

/// Escape a keyword for use inside an exiftool (Perl) `/.../i` pattern.
fn quote_keyword(keyword: &str) -> String {
    regex::escape(keyword).replace('/', "\\/").replace('@', "\\@")
}

/// Parse a single value or an inclusive range like "2020-2023".
///
/// A leading dash is a negative value, not a range: "-1" parses as `[-1]`.
pub fn parse_range(value: Option<&str>) -> Result<Vec<i32>> {
    let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(Vec::new());
    };

    let invalid = || MediasortError::Argument(format!("Invalid value or range: {}", value));

    if !value.starts_with('-') && value.matches('-').count() == 1 {
        let (start, end) = value.split_once('-').ok_or_else(invalid)?;
        let start: i32 = start.trim().parse().map_err(|_| invalid())?;
        let end: i32 = end.trim().parse().map_err(|_| invalid())?;
        if start > end {
            return Err(MediasortError::Argument(format!(
                "Range start is after its end: {}",
                value
            )));
        }
        return Ok((start..=end).collect());
    }

    Ok(vec![value.parse().map_err(|_| invalid())?])
}

/// Year and month encoded in a directory path: the last four-digit segment
/// is the year, the last two-digit segment in 01..=12 the month.
pub fn parse_dir_date(dir: &Path) -> (Option<i32>, Option<i32>) {
    let mut year = None;
    let mut month = None;

    for component in dir.components() {
        let Component::Normal(part) = component else {
            continue;
        };
        let Some(part) = part.to_str() else {
            continue;
        };
        if !part.chars().all(|c| c.is_ascii_digit()) {
            continue;
        }
        match part.len() {
            4 => year = part.parse().ok(),
            2 => {
                if let Ok(m) = part.parse::<i32>() {
                    if (1..=12).contains(&m) {
                        month = Some(m);
                    }
                }
            }
            _ => {}
        }
    }

    (year, month)
}

/// Result of a search.
#[derive(Debug, Default)]
pub struct SearchOutcome {
    pub matches: Vec<PathBuf>,
    /// Files left after directory filtering.
    pub candidates: usize,
    /// Directories skipped by the year/month filters.
    pub pruned_dirs: usize,
}

/// Search `root` for files matching `query`.
pub fn search(
    root: &Path,
    query: &SearchQuery,
    metadata: &dyn MetadataSource,
) -> Result<SearchOutcome> {
    if !root.exists() {
        return Err(MediasortError::PathNotFound(root.to_path_buf()));
    }
    if !root.is_dir() {
        return Err(MediasortError::NotADirectory(root.to_path_buf()));
    }

    println!("Searching in: {}", root.display());
    if !query.years.is_empty() {
        println!("Year filter: {:?}", query.years);
    }
    if !query.months.is_empty() {
        println!("Month filter: {:?}", query.months);
    }
    if !query.keywords.is_empty() {
        println!(
            "Keyword filter: {:?} (match: {})",
            query.keywords,
            match query.keyword_match {
                KeywordMatch::Any => "any",
                KeywordMatch::All => "all",
            }
        );
    }
    if !query.ratings.is_empty() {
        println!("Rating filter: {:?}", query.ratings);
    }

    let (candidates, pruned_dirs) = collect_candidates(root, query);
    if pruned_dirs > 0 {
        println!("Skipped {} directories based on year/month filters.", pruned_dirs);
    }

    let matches = match query.metadata_condition() {
        Some(condition) => {
            log::info!(
                "Filtering {} files with exiftool condition: {}",
                candidates.len(),
                condition
            );
            let metadata_matches = metadata.filter(&candidates, &condition)?;
            merge_path_matches(metadata_matches, &candidates, query)
        }
        None => candidates.clone(),
    };

    log::info!(
        "Search complete: {} matches out of {} candidates",
        matches.len(),
        candidates.len()
    );

    Ok(SearchOutcome {
        matches,
        candidates: candidates.len(),
        pruned_dirs,
    })
}

/// Walk `root`, pruning directories whose year/month contradicts the query,
/// and collect the non-hidden files that remain.
fn collect_candidates(root: &Path, query: &SearchQuery) -> (Vec<PathBuf>, usize) {
    let mut candidates = Vec::new();
    let mut pruned_dirs = 0;

    let mut entries = WalkDir::new(root).sort_by_file_name().into_iter();
    while let Some(entry) = entries.next() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                log::warn!("Skipping unreadable entry: {}", e);
                continue;
            }
        };

        if entry.file_type().is_dir() {
            if query.excludes_dir(entry.path()) {
                log::debug!("Pruning {}", entry.path().display());
                entries.skip_current_dir();
                pruned_dirs += 1;
            }
            continue;
        }

        if is_hidden(&entry.file_name().to_string_lossy()) {
            continue;
        }
        candidates.push(entry.into_path());
    }

    (candidates, pruned_dirs)
}

/// Add candidates whose path matches the keywords to the metadata matches.
///
/// Metadata matches are mapped back onto `candidates`; anything else the tool
/// reported is dropped.
fn merge_path_matches(
    metadata_matches: Vec<PathBuf>,
    candidates: &[PathBuf],
    query: &SearchQuery,
) -> Vec<PathBuf> {
    let by_key: HashMap<String, &PathBuf> = candidates
        .iter()
        .map(|path| (path_key(path), path))
        .collect();
    let mut seen: HashSet<PathBuf> = HashSet::new();
    let mut matches = Vec::new();

    for reported in metadata_matches {
        let Some(&path) = by_key.get(&path_key(&reported)) else {
            log::debug!("Ignoring unknown exiftool output: {}", reported.display());
            continue;
        };
        if seen.insert(path.clone()) {
            matches.push(path.clone());
        }
    }

    for path in candidates {
        if query.path_matches_keywords(path) && seen.insert(path.clone()) {
            matches.push(path.clone());
        }
    }

    matches
}

/// Distinct directories that directly contain a matched file, sorted.
pub fn directories_to_open(matches: &[PathBuf]) -> Vec<PathBuf> {
    matches
        .iter()
        .filter_map(|path| path.parent())
        .map(Path::to_path_buf)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Format search results for output.
pub fn format_results(matches: &[PathBuf]) -> String {
    if matches.is_empty() {
        return "No files found matching the criteria.".to_string();
    }

    let mut output = String::from("Found files:");
    for path in matches {
        output.push_str(&format!("\n  - {}", path.display()));
    }
    output.push_str(&format!("\n\nTotal: {} files", matches.len()));
    output
}

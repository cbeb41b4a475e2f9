use clap::{Parser, Subcommand, ValueEnum};
use simplelog::LevelFilter;
use std::path::PathBuf;

/// Log file used when `--log` is given without a path.
pub const DEFAULT_LOG_FILE: &str = "mediasort.log";

#[derive(Parser, Debug)]
#[command(author, version, about = "Sort photos and videos into YYYY/MM folders by capture date, and search them")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable file logging (default file: mediasort.log)
    #[arg(
        long = "log",
        value_name = "FILE",
        num_args = 0..=1,
        default_missing_value = DEFAULT_LOG_FILE,
        global = true
    )]
    pub log: Option<PathBuf>,

    /// Log level for file logging
    #[arg(long, value_enum, ignore_case = true, default_value_t = LogLevel::Info, global = true)]
    pub log_level: LogLevel,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sort media files into a YYYY/MM structure based on their capture date
    Organize {
        /// Directory containing media to sort
        #[arg(required = true)]
        source_dir: PathBuf,

        /// Destination for the sorted files
        #[arg(required = true)]
        dest_dir: PathBuf,

        /// Copy files instead of moving them
        #[arg(long)]
        copy: bool,

        /// Show what would be done without moving or copying anything
        #[arg(long)]
        dry_run: bool,

        /// Use the file's creation or modification time when metadata has no date
        #[arg(long, value_enum)]
        fallback_to_file_time: Option<FallbackTime>,

        /// Move without asking for confirmation
        #[arg(long)]
        yes: bool,

        /// Open the destination directory when done
        #[arg(long)]
        open_dest: bool,
    },

    /// Search sorted media by date, keywords and rating
    Search {
        /// Directory to search
        #[arg(required = true)]
        search_dir: PathBuf,

        /// Year or year range (e.g. 2022, 2020-2023)
        #[arg(long, short = 'y')]
        year: Option<String>,

        /// Month or month range (e.g. 1, 3-6)
        #[arg(long, short = 'm')]
        month: Option<String>,

        /// Keywords to search for in paths and metadata (case-insensitive)
        #[arg(long, short = 'k', num_args = 1..)]
        keyword: Vec<String>,

        /// Whether any or all keywords must match
        #[arg(long, value_enum, default_value_t = KeywordMatch::Any)]
        keyword_match: KeywordMatch,

        /// Rating or rating range between -1 and 5
        #[arg(long, short = 'r', allow_hyphen_values = true, conflicts_with_all = ["rejected", "picked"])]
        rating: Option<String>,

        /// Only rejected files (rating -1)
        #[arg(long, short = 'R', conflicts_with = "picked")]
        rejected: bool,

        /// Only picked files (rating 0-5)
        #[arg(long, short = 'P')]
        picked: bool,

        /// Open the directories containing matched files
        #[arg(long)]
        open_dirs: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FallbackTime {
    /// File creation time
    Created,
    /// File modification time
    Modified,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum KeywordMatch {
    /// At least one keyword matches
    #[default]
    Any,
    /// Every keyword matches
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Warning => LevelFilter::Warn,
            LogLevel::Error => LevelFilter::Error,
        }
    }
}

use anyhow::{Result, bail};
use std::env;
use std::path::PathBuf;

const DATA_DIR_ENV: &str = "TUNESTATS_DATA_DIR";
const SNAPSHOT_ENV: &str = "TUNESTATS_SNAPSHOT";
const DEFAULT_DATA_DIR: &str = "data";
const DEFAULT_SNAPSHOT_FILE: &str = "parsed.json";
const DEFAULT_COUNT: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum SortKey {
    /// Completed play count
    #[default]
    Count,
    /// Total time listened
    Time,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum YearBound {
    /// Strictly between `{start}-01-01 00:00` and `{end}-12-13 00:00`.
    /// Plays from December 13th onwards of the last year are dropped.
    #[default]
    Legacy,
    CalendarYear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearRange {
    pub start: i32,
    pub end: i32,
}

impl YearRange {
    pub fn from_years(years: &[i32]) -> Result<Option<Self>> {
        if let Some(year) = years.iter().find(|year| !(1000..=9999).contains(*year)) {
            bail!("year {year} is not a four-digit year");
        }
        let (Some(start), Some(end)) = (years.iter().min(), years.iter().max()) else {
            return Ok(None);
        };
        Ok(Some(Self {
            start: *start,
            end: *end,
        }))
    }

    pub fn label(&self) -> String {
        if self.start == self.end {
            self.start.to_string()
        } else {
            format!("{}-{}", self.start, self.end)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub data_dir: PathBuf,
    pub snapshot_path: PathBuf,
    pub count: usize,
    pub years: Option<YearRange>,
    pub year_bound: YearBound,
    pub sort_key: SortKey,
    pub extra: bool,
    pub keyword: Option<String>,
    pub artists_only: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            snapshot_path: PathBuf::from(DEFAULT_SNAPSHOT_FILE),
            count: DEFAULT_COUNT,
            years: None,
            year_bound: YearBound::default(),
            sort_key: SortKey::default(),
            extra: false,
            keyword: None,
            artists_only: false,
        }
    }
}

impl RunConfig {
    pub fn keyword(&self) -> Option<&str> {
        self.keyword
            .as_deref()
            .map(str::trim)
            .filter(|keyword| !keyword.is_empty())
    }
}

pub fn data_dir(explicit: Option<PathBuf>) -> PathBuf {
    explicit
        .or_else(|| env::var_os(DATA_DIR_ENV).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR))
}

pub fn snapshot_path(explicit: Option<PathBuf>) -> PathBuf {
    explicit
        .or_else(|| env::var_os(SNAPSHOT_ENV).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_SNAPSHOT_FILE))
}

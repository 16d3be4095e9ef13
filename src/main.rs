use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use tunestats::config::{self, RunConfig, SortKey, YearBound, YearRange};

/// Listening statistics from a streaming history export.
#[derive(Parser, Debug)]
#[command(name = "tunestats", version)]
#[command(about = "Top tracks and artists from a streaming history export")]
struct CliArgs {
    /// The amount of results to show
    #[arg(short, long, default_value_t = 10)]
    count: usize,

    /// Filter results by year; several years span a range
    #[arg(short, long, num_args = 1.., value_name = "YEAR")]
    year: Vec<i32>,

    /// Sort results by completed play count or total play time
    #[arg(short, long = "sort-key", alias = "sortKey", value_enum, default_value_t = SortKey::Count)]
    sort_key: SortKey,

    /// Show track length and first/last listen
    #[arg(short, long)]
    extra: bool,

    /// Only keep tracks whose title or artist contains this text
    #[arg(short, long)]
    keyword: Option<String>,

    /// Show artist statistics instead of tracks
    #[arg(short, long)]
    artists: bool,

    /// Directory holding the exported JSON files [env: TUNESTATS_DATA_DIR, default: data]
    #[arg(long, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Aggregated snapshot, reused on later runs [env: TUNESTATS_SNAPSHOT, default: parsed.json]
    #[arg(long, value_name = "FILE")]
    snapshot: Option<PathBuf>,

    /// Keep the last weeks of December in the year filter
    #[arg(long)]
    full_year: bool,
}

impl CliArgs {
    fn into_config(self) -> anyhow::Result<RunConfig> {
        Ok(RunConfig {
            data_dir: config::data_dir(self.data_dir),
            snapshot_path: config::snapshot_path(self.snapshot),
            count: self.count,
            years: YearRange::from_years(&self.year)?,
            year_bound: if self.full_year {
                YearBound::CalendarYear
            } else {
                YearBound::Legacy
            },
            sort_key: self.sort_key,
            extra: self.extra,
            keyword: self.keyword,
            artists_only: self.artists,
        })
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let config = CliArgs::parse().into_config()?;
    let report = tunestats::app::run(&config)?;
    print!("{report}");
    Ok(())
}

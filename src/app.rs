use crate::aggregate;
use crate::config::RunConfig;
use crate::filter;
use crate::history;
use crate::model::Snapshot;
use crate::report;
use crate::snapshot;
use anyhow::Result;
use tracing::{info, warn};

pub fn run(config: &RunConfig) -> Result<String> {
    let snapshot = load_or_ingest(config)?;
    Ok(build_report(snapshot, config))
}

pub fn load_or_ingest(config: &RunConfig) -> Result<Snapshot> {
    if let Some(snapshot) = snapshot::load(&config.snapshot_path)? {
        info!(
            path = %config.snapshot_path.display(),
            tracks = snapshot.songs.len(),
            "loaded snapshot"
        );
        return Ok(snapshot);
    }

    let files = history::discover_files(&config.data_dir)?;
    if files.is_empty() {
        warn!(dir = %config.data_dir.display(), "no streaming history files found");
    }

    let (snapshot, summary) = aggregate::ingest_files(&files)?;
    info!(
        files = summary.files,
        plays = summary.events,
        skipped_non_music = summary.not_music,
        skipped_malformed = summary.malformed,
        tracks = snapshot.songs.len(),
        "ingested streaming history"
    );
    snapshot::save(&config.snapshot_path, &snapshot)?;
    Ok(snapshot)
}

pub fn build_report(mut snapshot: Snapshot, config: &RunConfig) -> String {
    filter::apply(&mut snapshot.songs, config);
    report::render(&snapshot.songs, config)
}

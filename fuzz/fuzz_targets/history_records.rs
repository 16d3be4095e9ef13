#![no_main]

use libfuzzer_sys::fuzz_target;
use serde_json::Value;
use tunestats::aggregate::{IngestSummary, ingest_records};
use tunestats::config::RunConfig;
use tunestats::model::Snapshot;
use tunestats::normalize::Flavor;
use tunestats::report;

fuzz_target!(|data: &[u8]| {
    let Ok(records) = serde_json::from_slice::<Vec<Value>>(data) else {
        return;
    };
    let Some(flavor) = records.first().and_then(Flavor::detect) else {
        return;
    };

    let mut snapshot = Snapshot::default();
    let mut summary = IngestSummary::default();
    ingest_records(&mut snapshot, flavor, &records, &mut summary);
    assert_eq!(
        summary.events + summary.not_music + summary.malformed,
        records.len()
    );

    let config = RunConfig {
        extra: true,
        ..RunConfig::default()
    };
    let _ = report::render(&snapshot.songs, &config);
});

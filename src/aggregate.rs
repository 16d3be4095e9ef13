use crate::history;
use crate::model::{ArtistStats, PlayEvent, Snapshot, TrackStats};
use crate::normalize::{Flavor, Rejection};
use anyhow::{Context, Result};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IngestSummary {
    pub files: usize,
    pub events: usize,
    pub not_music: usize,
    pub malformed: usize,
}

/// Not idempotent: replaying events that are already part of a persisted
/// snapshot counts them twice unless they land on the same timestamps.
pub fn accumulate(snapshot: &mut Snapshot, event: PlayEvent) {
    if let Some(stats) = snapshot.songs.get_mut(&event.key) {
        stats.insert_play(&event.end_time, event.ms_played);
        if stats.confirmed_length.is_none_or(|ms| ms == 0) {
            stats.confirmed_length = event.confirmed_length.filter(|ms| *ms > 0);
        }
        return;
    }

    let stats = TrackStats::from_event(&event);
    snapshot.songs.insert(event.key, stats);
}

pub fn ingest_records(
    snapshot: &mut Snapshot,
    flavor: Flavor,
    records: &[Value],
    summary: &mut IngestSummary,
) {
    for record in records {
        match flavor.normalize(record) {
            Ok(event) => {
                accumulate(snapshot, event);
                summary.events += 1;
            }
            Err(Rejection::NotMusic) => summary.not_music += 1,
            Err(rejection @ Rejection::Malformed(_)) => {
                debug!(%rejection, "skipping record");
                summary.malformed += 1;
            }
        }
    }
}

pub fn ingest_files(paths: &[PathBuf]) -> Result<(Snapshot, IngestSummary)> {
    let mut snapshot = Snapshot::default();
    let mut summary = IngestSummary::default();
    let mut flavor: Option<Flavor> = None;

    for path in paths {
        info!(path = %path.display(), "reading file");
        let records = history::parse_file(path)?;
        summary.files += 1;

        let current = match flavor {
            Some(current) => current,
            None => {
                let Some(first) = records.first() else {
                    continue;
                };
                let detected = Flavor::detect(first).with_context(|| {
                    format!("unrecognized streaming history layout in {}", path.display())
                })?;
                info!(flavor = detected.label(), "detected export layout");
                flavor = Some(detected);
                detected
            }
        };

        ingest_records(&mut snapshot, current, &records, &mut summary);
    }

    refresh_rollups(&mut snapshot);
    debug!(?summary, tracks = snapshot.songs.len(), "ingestion finished");
    Ok((snapshot, summary))
}

pub fn artist_rollup(songs: &BTreeMap<String, TrackStats>) -> BTreeMap<String, ArtistStats> {
    let mut artists: BTreeMap<String, ArtistStats> = BTreeMap::new();
    for stats in songs.values() {
        let entry = artists
            .entry(stats.artist.clone())
            .or_insert_with(|| ArtistStats {
                artist: stats.artist.clone(),
                total_played: 0,
            });
        entry.total_played = entry.total_played.saturating_add(stats.total_played);
    }
    artists
}

pub fn grand_total(songs: &BTreeMap<String, TrackStats>) -> u64 {
    songs
        .values()
        .fold(0_u64, |total, stats| total.saturating_add(stats.total_played))
}

pub fn refresh_rollups(snapshot: &mut Snapshot) {
    snapshot.artists = artist_rollup(&snapshot.songs);
    snapshot.total = grand_total(&snapshot.songs);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimate;
    use proptest::prop_assert_eq;
    use serde_json::json;

    fn event(key: &str, artist: &str, end_time: &str, ms_played: u64) -> PlayEvent {
        PlayEvent {
            key: key.to_string(),
            track: key.to_string(),
            artist: artist.to_string(),
            end_time: end_time.to_string(),
            ms_played,
            confirmed_length: None,
        }
    }

    #[test]
    fn first_play_seeds_track() {
        let mut snapshot = Snapshot::default();
        accumulate(&mut snapshot, event("a", "Neon", "2023-01-01 10:00", 42_000));

        let stats = &snapshot.songs["a"];
        assert_eq!(stats.first_listen, "2023-01-01 10:00");
        assert_eq!(stats.last_listen, "2023-01-01 10:00");
        assert_eq!(stats.total_played, 42_000);
        assert_eq!(stats.plays.len(), 1);
    }

    #[test]
    fn repeated_plays_merge_into_one_track() {
        let mut snapshot = Snapshot::default();
        accumulate(&mut snapshot, event("a", "Neon", "2023-01-02 10:00", 42_000));
        accumulate(&mut snapshot, event("a", "Neon", "2023-01-01 10:00", 10_000));
        accumulate(&mut snapshot, event("a", "Neon", "2023-01-03 10:00", 30_000));

        let stats = &snapshot.songs["a"];
        assert_eq!(snapshot.songs.len(), 1);
        assert_eq!(stats.total_played, 82_000);
        assert_eq!(stats.first_listen, "2023-01-01 10:00");
        assert_eq!(stats.last_listen, "2023-01-03 10:00");
    }

    #[test]
    fn first_confirmed_length_sticks() {
        let mut snapshot = Snapshot::default();
        accumulate(&mut snapshot, event("a", "Neon", "2023-01-01 10:00", 12_000));
        let mut confirmed = event("a", "Neon", "2023-01-02 10:00", 180_000);
        confirmed.confirmed_length = Some(180_000);
        accumulate(&mut snapshot, confirmed);
        let mut later = event("a", "Neon", "2023-01-03 10:00", 181_000);
        later.confirmed_length = Some(181_000);
        accumulate(&mut snapshot, later);

        assert_eq!(snapshot.songs["a"].confirmed_length, Some(180_000));
    }

    #[test]
    fn zero_length_completion_does_not_block_later_confirmation() {
        let play = |ts: &str, ms_played: u64, reason_start: &str, reason_end: &str| {
            json!({
                "ts": ts,
                "ms_played": ms_played,
                "master_metadata_track_name": "Ocean Room",
                "master_metadata_album_artist_name": "Blue",
                "spotify_track_uri": "spotify:track:abc",
                "reason_start": reason_start,
                "reason_end": reason_end
            })
        };
        let records = vec![
            play("2023-01-01T10:00:00Z", 0, "trackdone", "trackdone"),
            play("2023-01-02T10:00:00Z", 200_000, "clickrow", "trackdone"),
            play("2023-01-03T10:00:00Z", 200_000, "clickrow", "trackdone"),
            play("2023-01-04T10:00:00Z", 199_000, "trackdone", "trackdone"),
        ];
        let mut snapshot = Snapshot::default();
        let mut summary = IngestSummary::default();
        ingest_records(&mut snapshot, Flavor::Extended, &records, &mut summary);

        let stats = &snapshot.songs["spotify:track:abc"];
        assert_eq!(stats.confirmed_length, Some(199_000));
        let length = estimate::estimate_length(stats.plays.values().copied(), stats.confirmed_length);
        assert_eq!(length, 199_000);
        assert_eq!(estimate::completed_plays(stats.total_played, length), 3);
    }

    #[test]
    fn ingest_counts_skipped_records() {
        let records = vec![
            json!({ "ts": "2023-01-01T10:00:00Z", "ms_played": 1000, "master_metadata_track_name": "A", "master_metadata_album_artist_name": "B", "spotify_track_uri": "spotify:track:1" }),
            json!({ "ts": "2023-01-01T11:00:00Z", "ms_played": 1000, "master_metadata_track_name": null, "master_metadata_album_artist_name": null, "spotify_track_uri": null }),
            json!({ "ts": "2023-01-01T12:00:00Z", "master_metadata_track_name": "A", "master_metadata_album_artist_name": "B" }),
        ];
        let mut snapshot = Snapshot::default();
        let mut summary = IngestSummary::default();
        ingest_records(&mut snapshot, Flavor::Extended, &records, &mut summary);

        assert_eq!(summary.events, 1);
        assert_eq!(summary.not_music, 1);
        assert_eq!(summary.malformed, 1);
        assert_eq!(snapshot.songs.len(), 1);
    }

    #[test]
    fn artist_rollup_sums_tracks() {
        let mut snapshot = Snapshot::default();
        accumulate(&mut snapshot, event("a", "Neon", "2023-01-01 10:00", 1_000));
        accumulate(&mut snapshot, event("b", "Neon", "2023-01-01 11:00", 2_000));
        accumulate(&mut snapshot, event("c", "Blue", "2023-01-01 12:00", 4_000));
        refresh_rollups(&mut snapshot);

        assert_eq!(snapshot.artists["Neon"].total_played, 3_000);
        assert_eq!(snapshot.artists["Blue"].total_played, 4_000);
        assert_eq!(snapshot.total, 7_000);
    }

    #[test]
    fn artist_rollup_is_reproducible_from_tracks() {
        let mut snapshot = Snapshot::default();
        accumulate(&mut snapshot, event("a", "Neon", "2023-01-01 10:00", 1_000));
        accumulate(&mut snapshot, event("b", "Blue", "2023-01-01 11:00", 2_000));
        snapshot.artists.insert(
            String::from("Stale"),
            ArtistStats {
                artist: String::from("Stale"),
                total_played: 99,
            },
        );

        let first = artist_rollup(&snapshot.songs);
        let second = artist_rollup(&snapshot.songs.clone());
        assert_eq!(first, second);
        assert!(!first.contains_key("Stale"));
    }

    proptest::proptest! {
        #[test]
        fn total_matches_play_log_after_every_fold(
            plays in proptest::collection::vec((0u8..4, 0u16..50, 0u64..400_000), 1..200)
        ) {
            let mut snapshot = Snapshot::default();
            for (key, minute, ms_played) in plays {
                let key = format!("track-{key}");
                let end_time = format!("2023-01-01 {:02}:{:02}", minute / 60, minute % 60);
                accumulate(&mut snapshot, event(&key, "Neon", &end_time, ms_played));

                let stats = &snapshot.songs[&key];
                prop_assert_eq!(stats.total_played, stats.plays.values().sum::<u64>());
                prop_assert_eq!(Some(&stats.first_listen), stats.plays.keys().next());
                prop_assert_eq!(Some(&stats.last_listen), stats.plays.keys().next_back());
            }
        }
    }
}

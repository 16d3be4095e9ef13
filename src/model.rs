use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub type PlayLog = BTreeMap<String, u64>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayEvent {
    pub key: String,
    pub track: String,
    pub artist: String,
    pub end_time: String,
    pub ms_played: u64,
    pub confirmed_length: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackStats {
    pub track: String,
    pub artist: String,
    pub first_listen: String,
    pub last_listen: String,
    pub total_played: u64,
    #[serde(default, rename = "lengthMs")]
    pub confirmed_length: Option<u64>,
    #[serde(default)]
    pub plays: PlayLog,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtistStats {
    pub artist: String,
    pub total_played: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Snapshot {
    #[serde(default)]
    pub songs: BTreeMap<String, TrackStats>,
    #[serde(default)]
    pub artists: BTreeMap<String, ArtistStats>,
    #[serde(default)]
    pub total: u64,
}

impl TrackStats {
    pub fn from_event(event: &PlayEvent) -> Self {
        let mut plays = PlayLog::new();
        plays.insert(event.end_time.clone(), event.ms_played);
        Self {
            track: event.track.clone(),
            artist: event.artist.clone(),
            first_listen: event.end_time.clone(),
            last_listen: event.end_time.clone(),
            total_played: event.ms_played,
            confirmed_length: event.confirmed_length.filter(|ms| *ms > 0),
            plays,
        }
    }

    pub fn insert_play(&mut self, end_time: &str, ms_played: u64) {
        let replaced = self.plays.insert(end_time.to_string(), ms_played);
        self.total_played = self
            .total_played
            .saturating_sub(replaced.unwrap_or(0))
            .saturating_add(ms_played);
        self.refresh_listen_bounds();
    }

    pub fn retain_plays<F>(&mut self, mut keep: F)
    where
        F: FnMut(&str) -> bool,
    {
        self.plays.retain(|end_time, _| keep(end_time));
        self.total_played = self
            .plays
            .values()
            .fold(0_u64, |total, ms| total.saturating_add(*ms));
        self.refresh_listen_bounds();
    }

    fn refresh_listen_bounds(&mut self) {
        if let Some((first, _)) = self.plays.first_key_value() {
            self.first_listen.clone_from(first);
        }
        if let Some((last, _)) = self.plays.last_key_value() {
            self.last_listen.clone_from(last);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(end_time: &str, ms_played: u64) -> PlayEvent {
        PlayEvent {
            key: String::from("Neon-Night Drive"),
            track: String::from("Night Drive"),
            artist: String::from("Neon"),
            end_time: end_time.to_string(),
            ms_played,
            confirmed_length: None,
        }
    }

    #[test]
    fn overwriting_a_timestamp_keeps_total_in_sync() {
        let mut stats = TrackStats::from_event(&event("2023-01-01 10:00", 40_000));
        stats.insert_play("2023-01-02 10:00", 20_000);
        stats.insert_play("2023-01-01 10:00", 50_000);

        assert_eq!(stats.plays.len(), 2);
        assert_eq!(stats.total_played, 70_000);
        assert_eq!(stats.total_played, stats.plays.values().sum::<u64>());
    }

    #[test]
    fn listen_bounds_follow_timestamps_not_insert_order() {
        let mut stats = TrackStats::from_event(&event("2023-05-01 10:00", 1_000));
        stats.insert_play("2023-02-01 10:00", 1_000);

        assert_eq!(stats.first_listen, "2023-02-01 10:00");
        assert_eq!(stats.last_listen, "2023-05-01 10:00");
    }

    #[test]
    fn snapshot_uses_export_field_names() {
        let mut snapshot = Snapshot::default();
        snapshot.songs.insert(
            String::from("Neon-Night Drive"),
            TrackStats::from_event(&event("2023-01-01 10:00", 40_000)),
        );

        let json = serde_json::to_value(&snapshot).expect("serialize");
        let song = &json["songs"]["Neon-Night Drive"];
        assert_eq!(song["firstListen"], "2023-01-01 10:00");
        assert_eq!(song["totalPlayed"], 40_000);
        assert!(song["lengthMs"].is_null());
        assert_eq!(song["plays"]["2023-01-01 10:00"], 40_000);
    }

    #[test]
    fn snapshot_without_length_field_still_loads() {
        let raw = r#"{
            "songs": {
                "A-B": {
                    "track": "B",
                    "artist": "A",
                    "firstListen": "2022-01-01 00:01",
                    "lastListen": "2022-01-01 00:01",
                    "totalPlayed": 5,
                    "plays": { "2022-01-01 00:01": 5 }
                }
            },
            "artists": {},
            "total": 0
        }"#;

        let snapshot: Snapshot = serde_json::from_str(raw).expect("parse");
        assert_eq!(snapshot.songs["A-B"].confirmed_length, None);
        assert_eq!(snapshot.songs["A-B"].total_played, 5);
    }
}

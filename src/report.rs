use crate::aggregate;
use crate::config::{RunConfig, SortKey};
use crate::estimate;
use crate::model::{ArtistStats, TrackStats};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use unicode_width::UnicodeWidthStr;

const COLUMN_PADDING: usize = 2;
const TRACK_HEADERS: [&str; 4] = ["Artist", "Track", "Play Count", "Time Listened"];
const EXTRA_HEADERS: [&str; 3] = ["Track length", "First Listen", "Last listened"];
const ARTIST_HEADERS: [&str; 2] = ["Artist", "Time Listened"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackRow {
    pub artist: String,
    pub track: String,
    pub count: u64,
    pub total_played: u64,
    pub length_ms: u64,
    pub first_listen: String,
    pub last_listen: String,
}

impl TrackRow {
    pub fn from_stats(stats: &TrackStats) -> Self {
        let length_ms =
            estimate::estimate_length(stats.plays.values().copied(), stats.confirmed_length);
        Self {
            artist: stats.artist.clone(),
            track: stats.track.clone(),
            count: estimate::completed_plays(stats.total_played, length_ms),
            total_played: stats.total_played,
            length_ms,
            first_listen: stats.first_listen.clone(),
            last_listen: stats.last_listen.clone(),
        }
    }

    fn cells(&self, extra: bool) -> Vec<String> {
        let mut cells = vec![
            self.artist.clone(),
            self.track.clone(),
            self.count.to_string(),
            format_ms(self.total_played),
        ];
        if extra {
            cells.push(format_ms(self.length_ms));
            cells.push(self.first_listen.clone());
            cells.push(self.last_listen.clone());
        }
        cells
    }
}

pub fn track_rows(songs: &BTreeMap<String, TrackStats>) -> Vec<TrackRow> {
    songs.values().map(TrackRow::from_stats).collect()
}

pub fn sort_tracks(rows: &mut [TrackRow], key: SortKey) {
    rows.sort_by(|a, b| compare_tracks(a, b, key));
}

pub fn sort_artists(rows: &mut [ArtistStats]) {
    rows.sort_by(|a, b| {
        b.total_played
            .cmp(&a.total_played)
            .then_with(|| a.artist.cmp(&b.artist))
    });
}

fn compare_tracks(a: &TrackRow, b: &TrackRow, key: SortKey) -> Ordering {
    let primary = match key {
        SortKey::Count => b.count.cmp(&a.count),
        SortKey::Time => b.total_played.cmp(&a.total_played),
    };
    primary
        .then(b.total_played.cmp(&a.total_played))
        .then_with(|| a.artist.cmp(&b.artist))
        .then_with(|| a.track.cmp(&b.track))
}

pub fn render(songs: &BTreeMap<String, TrackStats>, config: &RunConfig) -> String {
    let mut out = if config.artists_only {
        render_artists(songs, config.count)
    } else {
        render_tracks(songs, config)
    };

    out.push_str(&format!(
        "\ntotal time {}\n",
        format_ms(aggregate::grand_total(songs))
    ));
    if let Some(range) = config.years {
        out.push_str(&format!("\nyear filter {}\n", range.label()));
    }
    out
}

fn render_tracks(songs: &BTreeMap<String, TrackStats>, config: &RunConfig) -> String {
    let mut rows = track_rows(songs);
    sort_tracks(&mut rows, config.sort_key);
    rows.truncate(config.count);

    let mut headers = TRACK_HEADERS.to_vec();
    if config.extra {
        headers.extend(EXTRA_HEADERS);
    }
    let cells: Vec<Vec<String>> = rows.iter().map(|row| row.cells(config.extra)).collect();
    tabulate(&headers, &cells)
}

fn render_artists(songs: &BTreeMap<String, TrackStats>, count: usize) -> String {
    let mut rows: Vec<ArtistStats> = aggregate::artist_rollup(songs).into_values().collect();
    sort_artists(&mut rows);
    rows.truncate(count);

    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| vec![row.artist.clone(), format_ms(row.total_played)])
        .collect();
    tabulate(&ARTIST_HEADERS, &cells)
}

pub fn tabulate(headers: &[&str], rows: &[Vec<String>]) -> String {
    let index_width = rows.len().to_string().len();
    let widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(column, header)| {
            rows.iter()
                .filter_map(|row| row.get(column))
                .map(|cell| cell.width())
                .chain(std::iter::once(header.width()))
                .max()
                .unwrap_or(0)
                + COLUMN_PADDING
        })
        .collect();

    let mut out = String::new();
    let mut line = vec![" ".repeat(index_width)];
    line.extend(
        headers
            .iter()
            .zip(&widths)
            .map(|(header, width)| pad_right(header, *width)),
    );
    out.push_str(&line.join(" "));
    out.push('\n');

    for (index, row) in rows.iter().enumerate() {
        let mut line = vec![format!("{:>index_width$}", index + 1)];
        line.extend(
            row.iter()
                .zip(&widths)
                .map(|(cell, width)| pad_right(cell, *width)),
        );
        out.push_str(&line.join(" "));
        out.push('\n');
    }
    out
}

fn pad_right(text: &str, width: usize) -> String {
    let fill = width.saturating_sub(text.width());
    format!("{text}{}", " ".repeat(fill))
}

pub fn format_ms(ms: u64) -> String {
    let total_seconds = ms / 1000;
    let seconds = total_seconds % 60;
    let minutes = total_seconds / 60 % 60;
    let hours = total_seconds / 3600 % 24;
    let days = total_seconds / 86_400;
    if days > 0 {
        format!("{days}d {hours}h {minutes}min {seconds}s")
    } else if hours > 0 {
        format!("{hours}h {minutes}min {seconds}s")
    } else {
        format!("{minutes}min {seconds}s")
    }
}

use crate::config::{RunConfig, YearBound, YearRange};
use crate::model::TrackStats;
use std::collections::BTreeMap;
use tracing::debug;
use unicode_normalization::UnicodeNormalization;

#[derive(Debug, Clone)]
pub struct KeywordMatcher {
    needle: String,
}

impl KeywordMatcher {
    pub fn new(keyword: &str) -> Self {
        Self {
            needle: fold_case(keyword),
        }
    }

    pub fn matches(&self, stats: &TrackStats) -> bool {
        fold_case(&stats.track).contains(&self.needle)
            || fold_case(&stats.artist).contains(&self.needle)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YearWindow {
    start: String,
    end: String,
    bound: YearBound,
}

impl YearWindow {
    pub fn new(range: YearRange, bound: YearBound) -> Self {
        let end = match bound {
            YearBound::Legacy => format!("{}-12-13 00:00", range.end),
            YearBound::CalendarYear => format!("{}-12-31 24:00", range.end),
        };
        Self {
            start: format!("{}-01-01 00:00", range.start),
            end,
            bound,
        }
    }

    pub fn contains(&self, timestamp: &str) -> bool {
        let after_start = match self.bound {
            YearBound::Legacy => self.start.as_str() < timestamp,
            YearBound::CalendarYear => self.start.as_str() <= timestamp,
        };
        after_start && timestamp < self.end.as_str()
    }
}

pub fn retain_keyword(songs: &mut BTreeMap<String, TrackStats>, matcher: &KeywordMatcher) {
    songs.retain(|_, stats| matcher.matches(stats));
}

pub fn retain_window(songs: &mut BTreeMap<String, TrackStats>, window: &YearWindow) {
    songs.retain(|_, stats| {
        stats.retain_plays(|end_time| window.contains(end_time));
        !stats.plays.is_empty()
    });
}

pub fn apply(songs: &mut BTreeMap<String, TrackStats>, config: &RunConfig) {
    let before = songs.len();
    if let Some(keyword) = config.keyword() {
        retain_keyword(songs, &KeywordMatcher::new(keyword));
    }
    if let Some(range) = config.years {
        retain_window(songs, &YearWindow::new(range, config.year_bound));
    }
    debug!(before, after = songs.len(), "filters applied");
}

fn fold_case(text: &str) -> String {
    text.nfc().collect::<String>().to_lowercase()
}

use crate::model::PlayEvent;
use serde_json::Value;
use std::fmt;
use time::format_description::BorrowedFormatItem;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime, UtcOffset};

/// Joins artist and track into a composite key. Names that contain it can collide.
pub const KEY_SEPARATOR: &str = "-";

const COMPLETION_REASON: &str = "trackdone";

const MINUTE_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]");
const SECOND_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flavor {
    Account,
    Extended,
}

#[derive(Debug, Clone, Copy)]
enum TimestampStyle {
    Minutes,
    Rfc3339,
}

#[derive(Debug)]
struct FieldMap {
    end_time: &'static str,
    artist: &'static str,
    track: &'static str,
    ms_played: &'static str,
    track_id: Option<&'static str>,
    reasons: Option<(&'static str, &'static str)>,
    timestamp: TimestampStyle,
}

static ACCOUNT_FIELDS: FieldMap = FieldMap {
    end_time: "endTime",
    artist: "artistName",
    track: "trackName",
    ms_played: "msPlayed",
    track_id: None,
    reasons: None,
    timestamp: TimestampStyle::Minutes,
};

static EXTENDED_FIELDS: FieldMap = FieldMap {
    end_time: "ts",
    artist: "master_metadata_album_artist_name",
    track: "master_metadata_track_name",
    ms_played: "ms_played",
    track_id: Some("spotify_track_uri"),
    reasons: Some(("reason_start", "reason_end")),
    timestamp: TimestampStyle::Rfc3339,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// Track name is null: a podcast episode, audiobook chapter or similar.
    NotMusic,
    Malformed(&'static str),
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotMusic => write!(f, "not a music play"),
            Self::Malformed(field) => write!(f, "missing or invalid field `{field}`"),
        }
    }
}

impl Flavor {
    pub fn detect(record: &Value) -> Option<Self> {
        let object = record.as_object()?;
        if object.contains_key(EXTENDED_FIELDS.end_time)
            || object.contains_key("spotify_track_uri")
        {
            return Some(Self::Extended);
        }
        if object.contains_key(ACCOUNT_FIELDS.end_time) {
            return Some(Self::Account);
        }
        None
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Account => "account",
            Self::Extended => "extended",
        }
    }

    fn fields(self) -> &'static FieldMap {
        match self {
            Self::Account => &ACCOUNT_FIELDS,
            Self::Extended => &EXTENDED_FIELDS,
        }
    }

    pub fn normalize(self, record: &Value) -> Result<PlayEvent, Rejection> {
        let fields = self.fields();
        let track = match record.get(fields.track) {
            Some(Value::Null) => return Err(Rejection::NotMusic),
            Some(Value::String(track)) => track,
            _ => return Err(Rejection::Malformed(fields.track)),
        };
        let artist = string_field(record, fields.artist)?;
        let end_time = string_field(record, fields.end_time)
            .ok()
            .and_then(|raw| canonical_timestamp(raw, fields.timestamp))
            .ok_or(Rejection::Malformed(fields.end_time))?;
        let ms_played = record
            .get(fields.ms_played)
            .and_then(Value::as_u64)
            .ok_or(Rejection::Malformed(fields.ms_played))?;

        let key = fields
            .track_id
            .and_then(|field| record.get(field))
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| composite_key(artist, track));

        let confirmed_length = fields.reasons.and_then(|(start, end)| {
            let natural = |field: &str| {
                record.get(field).and_then(Value::as_str) == Some(COMPLETION_REASON)
            };
            (natural(start) && natural(end))
                .then_some(ms_played)
                .filter(|ms| *ms > 0)
        });

        Ok(PlayEvent {
            key,
            track: track.clone(),
            artist: artist.to_string(),
            end_time,
            ms_played,
            confirmed_length,
        })
    }
}

pub fn composite_key(artist: &str, track: &str) -> String {
    format!("{artist}{KEY_SEPARATOR}{track}")
}

fn string_field<'a>(record: &'a Value, field: &'static str) -> Result<&'a str, Rejection> {
    record
        .get(field)
        .and_then(Value::as_str)
        .ok_or(Rejection::Malformed(field))
}

fn canonical_timestamp(raw: &str, style: TimestampStyle) -> Option<String> {
    match style {
        TimestampStyle::Minutes => PrimitiveDateTime::parse(raw.trim(), MINUTE_FORMAT)
            .ok()?
            .format(MINUTE_FORMAT)
            .ok(),
        TimestampStyle::Rfc3339 => OffsetDateTime::parse(raw.trim(), &Rfc3339)
            .ok()?
            .checked_to_offset(UtcOffset::UTC)?
            .format(SECOND_FORMAT)
            .ok(),
    }
}

//! Timestamp coercion for incoming events.
//!
//! Event timestamps are stored without an offset. Text is accepted in the
//! ISO-8601 calendar, ordinal and week-date shapes, extended or basic, with
//! an optional time of day and offset. Values carrying an offset are
//! normalized to UTC.

use chrono::{FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike, Weekday};

use crate::errors::CoreError;

/// Last-resort pattern tried after every ISO-8601 shape has failed.
pub const FALLBACK_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Parse event timestamp text into a point in time.
///
/// ISO-8601 is tried first, then [`FALLBACK_FORMAT`]. Text matching neither
/// yields [`CoreError::Parse`].
pub fn parse_timestamp(text: &str) -> Result<NaiveDateTime, CoreError> {
    parse_iso8601(text)
        .or_else(|| NaiveDateTime::parse_from_str(text, FALLBACK_FORMAT).ok())
        .ok_or_else(|| CoreError::Parse {
            input: text.to_string(),
        })
}

/// Parse the inclusive upper bound of a time range. A bare date covers the
/// whole of that day, down to the last stored microsecond.
pub fn parse_upper_bound(text: &str) -> Result<NaiveDateTime, CoreError> {
    let ts = parse_timestamp(text)?;
    let date_only = text.is_ascii()
        && !text.contains(|c: char| matches!(c, 'T' | 't' | ' '))
        && parse_date(&text.to_ascii_uppercase()).is_some();
    if !date_only {
        return Ok(ts);
    }
    ts.date()
        .and_hms_micro_opt(23, 59, 59, 999_999)
        .ok_or_else(|| CoreError::Parse {
            input: text.to_string(),
        })
}

fn parse_iso8601(text: &str) -> Option<NaiveDateTime> {
    if !text.is_ascii() {
        return None;
    }
    // `t`/`z` and a comma before the fraction are legal spellings.
    let text = text.to_ascii_uppercase().replace(',', ".");
    let (date_part, time_part) = match text.find(|c: char| c == 'T' || c == ' ') {
        Some(at) => (&text[..at], Some(&text[at + 1..])),
        None => (text.as_str(), None),
    };
    let date = parse_date(date_part)?;
    let Some(time_part) = time_part else {
        return date.and_hms_opt(0, 0, 0);
    };
    let (clock, offset) = split_offset(time_part)?;
    let local = date.and_time(parse_clock(clock)?);
    match offset {
        None => Some(local),
        Some(offset) => offset
            .from_local_datetime(&local)
            .single()
            .map(|dt| dt.naive_utc()),
    }
}

/// `YYYY-MM-DD`, `YYYYMMDD`, `YYYY-DDD`, `YYYYDDD`, `YYYY-Www[-D]`, `YYYYWww[D]`.
fn parse_date(s: &str) -> Option<NaiveDate> {
    let year = digits(s.get(..4)?)? as i32;
    let rest = &s[4..];
    let rest_ext = rest.strip_prefix('-');
    let body = rest_ext.unwrap_or(rest);

    if let Some(week) = body.strip_prefix('W') {
        let (w, d) = match (week.len(), rest_ext.is_some()) {
            (2, _) => (week, None),
            (4, true) if week.as_bytes()[2] == b'-' => (&week[..2], Some(&week[3..])),
            (3, false) => (&week[..2], Some(&week[2..])),
            _ => return None,
        };
        let weekday = match d {
            Some(d) => iso_weekday(digits(d)?)?,
            None => Weekday::Mon,
        };
        return NaiveDate::from_isoywd_opt(year, digits(w)?, weekday);
    }

    match (body.len(), rest_ext.is_some()) {
        (3, _) => NaiveDate::from_yo_opt(year, digits(body)?),
        (4, false) => NaiveDate::from_ymd_opt(year, digits(&body[..2])?, digits(&body[2..])?),
        (5, true) if body.as_bytes()[2] == b'-' => {
            NaiveDate::from_ymd_opt(year, digits(&body[..2])?, digits(&body[3..])?)
        }
        _ => None,
    }
}

/// Split a trailing `Z` or `+HH[[:]MM[[:]SS]]` / `-...` offset off a time.
fn split_offset(s: &str) -> Option<(&str, Option<FixedOffset>)> {
    if let Some(clock) = s.strip_suffix('Z') {
        return Some((clock, FixedOffset::east_opt(0)));
    }
    let Some(at) = s.rfind(|c: char| c == '+' || c == '-') else {
        return Some((s, None));
    };
    let sign = if s.as_bytes()[at] == b'-' { -1 } else { 1 };
    let (h, m, sec) = hms_fields(&s[at + 1..])?;
    if m > 59 || sec > 59 {
        return None;
    }
    let secs = (h * 3600 + m * 60 + sec) as i32;
    Some((&s[..at], Some(FixedOffset::east_opt(sign * secs)?)))
}

/// `HH`, `HH:MM`, `HH:MM:SS` or their basic forms, with an optional
/// fraction after the seconds.
fn parse_clock(s: &str) -> Option<NaiveTime> {
    let (main, fraction) = match s.split_once('.') {
        Some((main, fraction)) => (main, Some(fraction)),
        None => (s, None),
    };
    let (h, m, sec) = hms_fields(main)?;
    let nano = match fraction {
        None => 0,
        // A fraction only follows whole seconds.
        Some(_) if main.len() != 6 && main.len() != 8 => return None,
        Some(f) if f.is_empty() || !f.bytes().all(|b| b.is_ascii_digit()) => return None,
        Some(f) => {
            let kept = &f[..f.len().min(9)];
            digits(kept)? * 10u32.pow(9 - kept.len() as u32)
        }
    };
    NaiveTime::from_hms_nano_opt(h, m, sec, nano)
}

/// Hour, minute and second from `HH`, `HHMM`, `HH:MM`, `HHMMSS` or
/// `HH:MM:SS`. Missing fields are zero.
fn hms_fields(s: &str) -> Option<(u32, u32, u32)> {
    let field = |range: std::ops::Range<usize>| s.get(range).and_then(digits);
    match s.len() {
        2 => Some((field(0..2)?, 0, 0)),
        4 => Some((field(0..2)?, field(2..4)?, 0)),
        5 if s.as_bytes()[2] == b':' => Some((field(0..2)?, field(3..5)?, 0)),
        6 => Some((field(0..2)?, field(2..4)?, field(4..6)?)),
        8 if s.as_bytes()[2] == b':' && s.as_bytes()[5] == b':' => {
            Some((field(0..2)?, field(3..5)?, field(6..8)?))
        }
        _ => None,
    }
}

fn iso_weekday(n: u32) -> Option<Weekday> {
    Some(match n {
        1 => Weekday::Mon,
        2 => Weekday::Tue,
        3 => Weekday::Wed,
        4 => Weekday::Thu,
        5 => Weekday::Fri,
        6 => Weekday::Sat,
        7 => Weekday::Sun,
        _ => return None,
    })
}

fn digits(s: &str) -> Option<u32> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// Render a timestamp as ISO-8601 without offset.
///
/// Sub-second precision is microseconds, and the fraction is omitted when
/// it is zero: `2025-09-07T12:00:00`, `2025-09-07T12:00:00.250000`.
pub fn format_timestamp(ts: &NaiveDateTime) -> String {
    if ts.nanosecond() / 1_000 == 0 {
        ts.format("%Y-%m-%dT%H:%M:%S").to_string()
    } else {
        ts.format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
    }
}

/// Serde adapter for optional timestamps rendered with [`format_timestamp`].
pub mod serde_opt {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        ts: &Option<NaiveDateTime>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match ts {
            Some(ts) => serializer.serialize_str(&super::format_timestamp(ts)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<NaiveDateTime>, D::Error> {
        Option::<String>::deserialize(deserializer)?
            .map(|raw| super::parse_timestamp(&raw).map_err(serde::de::Error::custom))
            .transpose()
    }
}

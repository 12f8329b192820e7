//! Time schemes: compact string encodings of a point in time.
//!
//! A time placeholder has the form `{<source>[u]:<scheme>}`:
//!
//! | Scheme | Syntax | Example output |
//! |---|---|---|
//! | Readable | `ymd`, `hms`, `hm`, `ymdhms`, `ymdhm` + optional `-`, `.` or `:` | `2026-10-18` |
//! | DottedDecimal | `d<N><unit>[:<year>]` | `9787.37` |
//! | BaseEncoded | `b<base>-<N><unit>[:<year>[:<minlen>]]`, `B` for upper case | `0k3z` |
//! | Hours | `h[:<year>[-<month>]]` | `235411` |
//!
//! Sources are `b` (build), `c` (commit) and `a` (author). The `u` flag makes
//! the readable scheme print UTC instead of local time; all other schemes
//! count from a UTC epoch. Units are `s`, `m`, `h` and `d`.
//!
//! Every scheme can be decoded back into the start of the interval that
//! produced it, which is what the `decode` command uses for diagnostics.

pub mod base;

use crate::error::{RevisionError, Result};
use chrono::{
    DateTime, Datelike, FixedOffset, Local, NaiveDate, NaiveDateTime, TimeZone, Timelike, Utc,
};
use regex::Regex;
use std::sync::OnceLock;

const SECONDS_PER_DAY: i64 = 86_400;
const DEFAULT_BASE_YEAR: i32 = 2000;

/// Exclusive upper bound of the day count of the dotted-decimal scheme
pub const MAX_DAYS: i64 = 65_535;

/// Which timestamp a placeholder encodes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeSource {
    Build,
    Commit,
    Author,
}

impl TimeSource {
    pub fn name(&self) -> &'static str {
        match self {
            TimeSource::Build => "build",
            TimeSource::Commit => "commit",
            TimeSource::Author => "author",
        }
    }
}

/// Time-of-day fields printed by the readable scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeFields {
    None,
    HourMinute,
    HourMinuteSecond,
}

/// Parsed scheme with its parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemeKind {
    Readable {
        date: bool,
        time: TimeFields,
        separator: String,
        utc: bool,
    },
    DottedDecimal {
        interval: i64,
        base_year: i32,
    },
    BaseEncoded {
        base: u32,
        interval: i64,
        base_year: i32,
        min_length: usize,
        upper: bool,
    },
    Hours {
        base_year: i32,
        base_month: u32,
    },
}

/// One time placeholder, e.g. `{c:b28-20m:2020:4}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemeSpec {
    pub source: TimeSource,
    pub kind: SchemeKind,
}

fn regex(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("valid scheme regex"))
}

fn token_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(&RE, r"^\{?([abc])(u?):([^{}]+?)\}?$")
}

/// True when `token` addresses the time-scheme family, whether or not
/// its scheme part is valid.
pub fn is_time_token(token: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(&RE, r"^\{[abc]u?:").is_match(token)
}

impl SchemeSpec {
    /// Parse a placeholder such as `{c:d20m:2020}`; the braces are optional.
    pub fn parse(token: &str) -> Result<Self> {
        let invalid = |why: &str| RevisionError::format(format!("{} in '{}'", why, token));

        let captures = token_regex()
            .captures(token)
            .ok_or_else(|| invalid("Not a time placeholder"))?;
        let source = match &captures[1] {
            "b" => TimeSource::Build,
            "c" => TimeSource::Commit,
            _ => TimeSource::Author,
        };
        let utc = !captures[2].is_empty();
        let body = &captures[3];

        let kind = parse_kind(body, utc).map_err(|e| match e {
            RevisionError::Format(msg) => invalid(&msg),
            other => other,
        })?;

        Ok(SchemeSpec { source, kind })
    }

    /// Encode `time` with this scheme.
    pub fn encode(&self, time: DateTime<FixedOffset>) -> Result<String> {
        match &self.kind {
            SchemeKind::Readable {
                date,
                time: fields,
                separator,
                utc,
            } => {
                let naive = if *utc {
                    time.with_timezone(&Utc).naive_utc()
                } else {
                    time.with_timezone(&Local).naive_local()
                };
                Ok(format_readable(naive, *date, *fields, separator))
            }
            SchemeKind::DottedDecimal {
                interval,
                base_year,
            } => {
                let seconds = seconds_since(time, epoch(*base_year, 1)?)?;
                let days = seconds / SECONDS_PER_DAY;
                if days >= MAX_DAYS {
                    return Err(RevisionError::bounds(format!(
                        "{} is {} days after {}, the limit is {}",
                        time, days, base_year, MAX_DAYS - 1
                    )));
                }
                let index = (seconds % SECONDS_PER_DAY) / interval;
                Ok(format!("{}.{}", days, index))
            }
            SchemeKind::BaseEncoded {
                base,
                interval,
                base_year,
                min_length,
                upper,
            } => {
                let seconds = seconds_since(time, epoch(*base_year, 1)?)?;
                let digits = base::alphabet(*base)?;
                let encoded = base::encode((seconds / interval) as u64, digits, *min_length);
                Ok(if *upper {
                    encoded.to_uppercase()
                } else {
                    encoded
                })
            }
            SchemeKind::Hours {
                base_year,
                base_month,
            } => {
                let seconds = seconds_since(time, epoch(*base_year, *base_month)?)?;
                Ok((seconds / 3600).to_string())
            }
        }
    }

    /// Decode a value produced by [`SchemeSpec::encode`] back into the
    /// start of its interval.
    pub fn decode(&self, value: &str) -> Result<DateTime<Utc>> {
        let value = value.trim();
        let malformed = || {
            RevisionError::format(format!("'{}' is not a valid value for this scheme", value))
        };

        match &self.kind {
            SchemeKind::Readable {
                date,
                time,
                separator,
                utc,
            } => {
                if !date {
                    return Err(RevisionError::format(format!(
                        "'{}' has no date part and cannot be decoded",
                        value
                    )));
                }
                let naive = parse_readable(value, *time, separator).ok_or_else(malformed)?;
                if *utc {
                    Ok(Utc.from_utc_datetime(&naive))
                } else {
                    Local
                        .from_local_datetime(&naive)
                        .earliest()
                        .map(|t| t.with_timezone(&Utc))
                        .ok_or_else(malformed)
                }
            }
            SchemeKind::DottedDecimal {
                interval,
                base_year,
            } => {
                let (days, index) = value.split_once('.').ok_or_else(malformed)?;
                let days: i64 = days.parse().map_err(|_| malformed())?;
                let index: i64 = index.parse().map_err(|_| malformed())?;
                let per_day = (SECONDS_PER_DAY + interval - 1) / interval;
                if !(0..MAX_DAYS).contains(&days) || !(0..per_day).contains(&index) {
                    return Err(RevisionError::bounds(format!(
                        "'{}' is outside 0.0 to {}.{}",
                        value,
                        MAX_DAYS - 1,
                        per_day - 1
                    )));
                }
                add_seconds(
                    epoch(*base_year, 1)?,
                    days * SECONDS_PER_DAY + index * interval,
                )
            }
            SchemeKind::BaseEncoded {
                base,
                interval,
                base_year,
                ..
            } => {
                let count = base::decode(value, base::alphabet(*base)?)?;
                let seconds = i64::try_from(count)
                    .ok()
                    .and_then(|c| c.checked_mul(*interval))
                    .ok_or_else(|| RevisionError::bounds(format!("'{}' is too large", value)))?;
                add_seconds(epoch(*base_year, 1)?, seconds)
            }
            SchemeKind::Hours {
                base_year,
                base_month,
            } => {
                let hours: i64 = value.parse().map_err(|_| malformed())?;
                if hours < 0 {
                    return Err(malformed());
                }
                let seconds = hours
                    .checked_mul(3600)
                    .ok_or_else(|| RevisionError::bounds(format!("'{}' is too large", value)))?;
                add_seconds(epoch(*base_year, *base_month)?, seconds)
            }
        }
    }
}

fn parse_kind(body: &str, utc: bool) -> Result<SchemeKind> {
    static HOURS: OnceLock<Regex> = OnceLock::new();
    static DOTTED: OnceLock<Regex> = OnceLock::new();
    static BASE: OnceLock<Regex> = OnceLock::new();
    static READABLE: OnceLock<Regex> = OnceLock::new();

    if let Some(c) = regex(&HOURS, r"^h(?::([0-9]{4})(?:-([0-9]{1,2}))?)?$").captures(body) {
        let base_year = year_or_default(c.get(1).map(|m| m.as_str()))?;
        let base_month = match c.get(2) {
            Some(m) => m.as_str().parse::<u32>().unwrap_or(0),
            None => 1,
        };
        if !(1..=12).contains(&base_month) {
            return Err(RevisionError::format(format!("Invalid base month {}", base_month)));
        }
        return Ok(SchemeKind::Hours {
            base_year,
            base_month,
        });
    }

    if let Some(c) = regex(&DOTTED, r"^d([0-9]+)([smhd])(?::([0-9]{4}))?$").captures(body) {
        let interval = interval_seconds(&c[1], &c[2])?;
        if interval > SECONDS_PER_DAY {
            return Err(RevisionError::format("Interval longer than one day"));
        }
        return Ok(SchemeKind::DottedDecimal {
            interval,
            base_year: year_or_default(c.get(3).map(|m| m.as_str()))?,
        });
    }

    if let Some(c) = regex(
        &BASE,
        r"^([bB])([0-9]{1,2})-([0-9]+)([smhd])(?::([0-9]{4})(?::([0-9]{1,2}))?)?$",
    )
    .captures(body)
    {
        let base = c[2].parse::<u32>().unwrap_or(0);
        base::alphabet(base)?;
        return Ok(SchemeKind::BaseEncoded {
            base,
            interval: interval_seconds(&c[3], &c[4])?,
            base_year: year_or_default(c.get(5).map(|m| m.as_str()))?,
            min_length: c
                .get(6)
                .and_then(|m| m.as_str().parse().ok())
                .unwrap_or(1),
            upper: &c[1] == "B",
        });
    }

    if let Some(c) = regex(&READABLE, r"^(ymd)?(hms|hm)?([-.:]?)$").captures(body) {
        let date = c.get(1).is_some();
        let time = match c.get(2).map(|m| m.as_str()) {
            Some("hms") => TimeFields::HourMinuteSecond,
            Some(_) => TimeFields::HourMinute,
            None => TimeFields::None,
        };
        if date || time != TimeFields::None {
            return Ok(SchemeKind::Readable {
                date,
                time,
                separator: c[3].to_string(),
                utc,
            });
        }
    }

    Err(RevisionError::format("Unknown time scheme"))
}

fn year_or_default(year: Option<&str>) -> Result<i32> {
    match year {
        Some(y) => y
            .parse()
            .map_err(|_| RevisionError::format(format!("Invalid base year '{}'", y))),
        None => Ok(DEFAULT_BASE_YEAR),
    }
}

fn interval_seconds(count: &str, unit: &str) -> Result<i64> {
    let count: i64 = count
        .parse()
        .map_err(|_| RevisionError::format(format!("Invalid interval '{}{}'", count, unit)))?;
    let unit_seconds = match unit {
        "s" => 1,
        "m" => 60,
        "h" => 3600,
        _ => SECONDS_PER_DAY,
    };
    match count.checked_mul(unit_seconds) {
        Some(seconds) if seconds > 0 => Ok(seconds),
        _ => Err(RevisionError::format(format!(
            "Interval '{}{}' must be positive",
            count, unit
        ))),
    }
}

fn epoch(year: i32, month: u32) -> Result<DateTime<Utc>> {
    Utc.with_ymd_and_hms(year, month, 1, 0, 0, 0)
        .single()
        .ok_or_else(|| RevisionError::format(format!("Invalid base date {}-{:02}", year, month)))
}

fn seconds_since(time: DateTime<FixedOffset>, epoch: DateTime<Utc>) -> Result<i64> {
    let seconds = (time.with_timezone(&Utc) - epoch).num_seconds();
    if seconds < 0 {
        return Err(RevisionError::bounds(format!(
            "{} is before the base date {}",
            time.to_rfc3339(),
            epoch.format("%Y-%m-%d")
        )));
    }
    Ok(seconds)
}

fn add_seconds(epoch: DateTime<Utc>, seconds: i64) -> Result<DateTime<Utc>> {
    chrono::Duration::try_seconds(seconds)
        .and_then(|d| epoch.checked_add_signed(d))
        .ok_or_else(|| RevisionError::bounds(format!("{} seconds after {} is out of range", seconds, epoch)))
}

fn format_readable(t: NaiveDateTime, date: bool, time: TimeFields, sep: &str) -> String {
    let mut groups = Vec::new();
    if date {
        groups.push(format!("{:04}{sep}{:02}{sep}{:02}", t.year(), t.month(), t.day(), sep = sep));
    }
    match time {
        TimeFields::HourMinuteSecond => groups.push(format!(
            "{:02}{sep}{:02}{sep}{:02}",
            t.hour(),
            t.minute(),
            t.second(),
            sep = sep
        )),
        TimeFields::HourMinute => {
            groups.push(format!("{:02}{sep}{:02}", t.hour(), t.minute(), sep = sep))
        }
        TimeFields::None => {}
    }
    groups.join(sep)
}

fn parse_readable(value: &str, time: TimeFields, sep: &str) -> Option<NaiveDateTime> {
    let widths: &[usize] = match time {
        TimeFields::None => &[4, 2, 2],
        TimeFields::HourMinute => &[4, 2, 2, 2, 2],
        TimeFields::HourMinuteSecond => &[4, 2, 2, 2, 2, 2],
    };

    let fields: Vec<&str> = if sep.is_empty() {
        if value.len() != widths.iter().sum::<usize>() || !value.is_ascii() {
            return None;
        }
        let mut offset = 0;
        widths
            .iter()
            .map(|w| {
                let field = &value[offset..offset + w];
                offset += w;
                field
            })
            .collect()
    } else {
        value.split(sep).collect()
    };

    if fields.len() != widths.len()
        || fields
            .iter()
            .zip(widths)
            .any(|(f, w)| f.len() != *w || !f.bytes().all(|b| b.is_ascii_digit()))
    {
        return None;
    }

    let numbers: Vec<u32> = fields.iter().filter_map(|f| f.parse().ok()).collect();
    let date = NaiveDate::from_ymd_opt(numbers[0] as i32, numbers[1], numbers[2])?;
    let hour = numbers.get(3).copied().unwrap_or(0);
    let minute = numbers.get(4).copied().unwrap_or(0);
    let second = numbers.get(5).copied().unwrap_or(0);
    date.and_hms_opt(hour, minute, second)
}

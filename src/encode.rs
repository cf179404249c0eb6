//! Text rendering of attribute values and record timestamps.
//!
//! Every function here appends to a caller-owned byte buffer and cannot
//! fail: each value kind has a defined rendering, so a record is never
//! dropped because one of its values is unusual.

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Datelike, Local, SecondsFormat, TimeZone, Timelike, Utc};
use std::borrow::Cow;
use std::io::Write;

use crate::value::{Attr, Value};

/// strftime pattern of [`TimeFormat::Default`].
pub const DEFAULT_TIME_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

/// How the leading record timestamp is rendered.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum TimeFormat {
    /// `2025/11/14 14:03:14`.
    #[default]
    Default,
    /// Any strftime pattern chrono understands.
    Custom(Cow<'static, str>),
    /// No leading timestamp.
    Disabled,
}

impl TimeFormat {
    /// Resolves a custom pattern that chrono cannot parse to `Default`.
    pub fn validated(self) -> TimeFormat {
        match self {
            TimeFormat::Custom(pattern) if pattern == DEFAULT_TIME_FORMAT => TimeFormat::Default,
            TimeFormat::Custom(pattern) => {
                let broken = pattern.is_empty()
                    || StrftimeItems::new(&pattern).any(|item| matches!(item, Item::Error));
                if broken {
                    TimeFormat::Default
                } else {
                    TimeFormat::Custom(pattern)
                }
            }
            other => other,
        }
    }

    pub fn is_enabled(&self) -> bool {
        !matches!(self, TimeFormat::Disabled)
    }
}

/// Appends `t` in the given profile, converted to UTC or local time.
pub fn append_record_time(buf: &mut Vec<u8>, format: &TimeFormat, t: &DateTime<Utc>, utc: bool) {
    if utc {
        append_time_in(buf, format, t)
    } else {
        append_time_in(buf, format, &t.with_timezone(&Local))
    }
}

fn append_time_in<Tz: TimeZone>(buf: &mut Vec<u8>, format: &TimeFormat, t: &DateTime<Tz>)
where
    Tz::Offset: std::fmt::Display,
{
    match format {
        TimeFormat::Default => {
            append_padded(buf, t.year() as i64, 4);
            buf.push(b'/');
            append_padded(buf, t.month() as i64, 2);
            buf.push(b'/');
            append_padded(buf, t.day() as i64, 2);
            buf.push(b' ');
            append_padded(buf, t.hour() as i64, 2);
            buf.push(b':');
            append_padded(buf, t.minute() as i64, 2);
            buf.push(b':');
            append_padded(buf, t.second() as i64, 2);
        }
        TimeFormat::Custom(pattern) => {
            let _ = write!(buf, "{}", t.format(pattern));
        }
        TimeFormat::Disabled => {}
    }
}

/// Appends `n` in decimal, left-padded with `'0'` to at least `width` digits.
pub fn append_padded(buf: &mut Vec<u8>, n: i64, width: usize) {
    if n < 0 {
        buf.push(b'-');
    }
    let magnitude = n.unsigned_abs();
    let mut digits = 1;
    let mut rest = magnitude / 10;
    while rest > 0 {
        digits += 1;
        rest /= 10;
    }
    for _ in digits..width {
        buf.push(b'0');
    }
    append_u64(buf, magnitude);
}

pub fn append_i64(buf: &mut Vec<u8>, n: i64) {
    let _ = write!(buf, "{}", n);
}

pub fn append_u64(buf: &mut Vec<u8>, n: u64) {
    let _ = write!(buf, "{}", n);
}

/// Appends `f` in general format: plain shortest decimal for magnitudes in
/// `[1e-4, 1e6)`, shortest mantissa with a signed two-digit-minimum
/// exponent otherwise.
pub fn append_f64(buf: &mut Vec<u8>, f: f64) {
    if f.is_nan() {
        buf.extend_from_slice(b"NaN");
        return;
    }
    if f.is_infinite() {
        buf.extend_from_slice(if f > 0.0 { b"+Inf" } else { b"-Inf" });
        return;
    }
    let magnitude = f.abs();
    if magnitude == 0.0 || (1e-4..1e6).contains(&magnitude) {
        let _ = write!(buf, "{}", f);
        return;
    }

    let start = buf.len();
    let _ = write!(buf, "{:e}", f);
    let Some(e_at) = buf[start..].iter().position(|&b| b == b'e').map(|i| start + i) else {
        return;
    };
    let negative = buf.get(e_at + 1) == Some(&b'-');
    let digits_at = if negative { e_at + 2 } else { e_at + 1 };
    let exponent_digits = buf.len() - digits_at;
    if !negative {
        buf.insert(e_at + 1, b'+');
    }
    if exponent_digits < 2 {
        let at = if negative { digits_at } else { digits_at + 1 };
        buf.insert(at, b'0');
    }
}

/// Appends the textual form of `value`.
pub fn append_value(buf: &mut Vec<u8>, value: &Value) {
    match value {
        Value::Str(s) => buf.extend_from_slice(s.as_bytes()),
        Value::I64(n) => append_i64(buf, *n),
        Value::U64(n) => append_u64(buf, *n),
        Value::F64(f) => append_f64(buf, *f),
        Value::Bool(b) => buf.extend_from_slice(if *b { b"true" } else { b"false" }),
        Value::Duration(d) => {
            let _ = write!(buf, "{:?}", d);
        }
        Value::Time(t) => {
            let _ = write!(buf, "{}", t.to_rfc3339_opts(SecondsFormat::Secs, true));
        }
        Value::Group(attrs) => append_group(buf, attrs),
        Value::Any(v) => {
            let _ = write!(buf, "{}", v);
        }
    }
}

fn append_group(buf: &mut Vec<u8>, attrs: &[Attr]) {
    let mut members = attrs.iter().filter(|a| !a.value.is_empty_group()).peekable();
    if members.peek().is_none() {
        return;
    }
    buf.push(b'{');
    for (i, attr) in members.enumerate() {
        if i > 0 {
            buf.push(b' ');
        }
        buf.extend_from_slice(attr.key.as_bytes());
        buf.push(b'=');
        append_value(buf, &attr.value);
    }
    buf.push(b'}');
}

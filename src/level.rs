use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;

use crate::error::ParseLevelError;

/// Severity of a record.
///
/// Levels are ordinals: any `i32` is a valid level and higher means more
/// severe. The four named constants are spaced four apart so that
/// applications can slot their own levels in between; such levels render
/// relative to the nearest lower name (`INFO+2`, `DEBUG-4`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Level(pub i32);

impl Level {
    pub const DEBUG: Level = Level(-4);
    pub const INFO: Level = Level(0);
    pub const WARN: Level = Level(4);
    pub const ERROR: Level = Level(8);

    /// Returns this level shifted by `delta`, saturating at the `i32` bounds.
    pub const fn offset(self, delta: i32) -> Level {
        Level(self.0.saturating_add(delta))
    }

    fn base(self) -> (&'static str, i32) {
        if self < Level::INFO {
            ("DEBUG", self.0 - Level::DEBUG.0)
        } else if self < Level::WARN {
            ("INFO", self.0 - Level::INFO.0)
        } else if self < Level::ERROR {
            ("WARN", self.0 - Level::WARN.0)
        } else {
            ("ERROR", self.0 - Level::ERROR.0)
        }
    }

    /// Appends the canonical name to `buf` without an intermediate `String`.
    pub fn append_to(self, buf: &mut Vec<u8>) {
        let (name, delta) = self.base();
        buf.extend_from_slice(name.as_bytes());
        if delta != 0 {
            if delta > 0 {
                buf.push(b'+');
            }
            crate::encode::append_i64(buf, delta as i64);
        }
    }
}

impl Default for Level {
    fn default() -> Self {
        Level::INFO
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (name, delta) = self.base();
        if delta == 0 {
            f.write_str(name)
        } else {
            write!(f, "{}{:+}", name, delta)
        }
    }
}

impl FromStr for Level {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseLevelError(s.to_string());
        let trimmed = s.trim();
        let (name, delta) = match trimmed.find(|c| c == '+' || c == '-') {
            Some(idx) => {
                let delta: i32 = trimmed[idx..].parse().map_err(|_| err())?;
                (&trimmed[..idx], delta)
            }
            None => (trimmed, 0),
        };
        let base = match name.to_ascii_uppercase().as_str() {
            "DEBUG" => Level::DEBUG,
            "INFO" => Level::INFO,
            "WARN" => Level::WARN,
            "ERROR" => Level::ERROR,
            _ => return Err(err()),
        };
        base.0.checked_add(delta).map(Level).ok_or_else(err)
    }
}

impl From<tracing::Level> for Level {
    fn from(level: tracing::Level) -> Self {
        match level {
            tracing::Level::ERROR => Level::ERROR,
            tracing::Level::WARN => Level::WARN,
            tracing::Level::INFO => Level::INFO,
            tracing::Level::DEBUG => Level::DEBUG,
            tracing::Level::TRACE => Level::DEBUG.offset(-4),
        }
    }
}

impl Serialize for Level {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Level {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Source of the minimum level a handler accepts.
///
/// The handler asks for the level on every `enabled` call, so an
/// implementation backed by shared mutable state (see [`LevelVar`]) can
/// change the threshold while loggers are in use.
pub trait Leveler: Send + Sync {
    fn level(&self) -> Level;
}

impl Leveler for Level {
    fn level(&self) -> Level {
        *self
    }
}

/// A level cell that can be changed at runtime from any thread.
#[derive(Debug)]
pub struct LevelVar(AtomicI32);

impl LevelVar {
    pub fn new(level: Level) -> Self {
        LevelVar(AtomicI32::new(level.0))
    }

    pub fn set(&self, level: Level) {
        self.0.store(level.0, Ordering::Relaxed);
    }
}

impl Default for LevelVar {
    fn default() -> Self {
        LevelVar::new(Level::INFO)
    }
}

impl Leveler for LevelVar {
    fn level(&self) -> Level {
        Level(self.0.load(Ordering::Relaxed))
    }
}

impl<L: Leveler + ?Sized> Leveler for Arc<L> {
    fn level(&self) -> Level {
        (**self).level()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_levels_render_bare() {
        assert_eq!(Level::DEBUG.to_string(), "DEBUG");
        assert_eq!(Level::INFO.to_string(), "INFO");
        assert_eq!(Level::WARN.to_string(), "WARN");
        assert_eq!(Level::ERROR.to_string(), "ERROR");
    }

    #[test]
    fn in_between_levels_render_with_offset() {
        assert_eq!(Level(2).to_string(), "INFO+2");
        assert_eq!(Level(-8).to_string(), "DEBUG-4");
        assert_eq!(Level(9).to_string(), "ERROR+1");

        let mut buf = Vec::new();
        Level(-8).append_to(&mut buf);
        assert_eq!(buf, b"DEBUG-4");
        buf.clear();
        Level(6).append_to(&mut buf);
        assert_eq!(buf, b"WARN+2");
    }

    #[test]
    fn parse_accepts_names_and_offsets() {
        assert_eq!("warn".parse::<Level>().unwrap(), Level::WARN);
        assert_eq!("INFO+2".parse::<Level>().unwrap(), Level(2));
        assert_eq!(" debug-1 ".parse::<Level>().unwrap(), Level(-5));
        assert!("verbose".parse::<Level>().is_err());
        assert!("INFO+x".parse::<Level>().is_err());
    }

    #[test]
    fn parse_rejects_out_of_range_offsets() {
        assert_eq!(
            "ERROR+2147483647".parse::<Level>(),
            Err(ParseLevelError("ERROR+2147483647".to_string()))
        );
        assert!("DEBUG-2147483647".parse::<Level>().is_err());
        assert_eq!("ERROR+2147483639".parse::<Level>().unwrap(), Level(i32::MAX));
        assert_eq!(Level::ERROR.offset(i32::MAX), Level(i32::MAX));
    }

    #[test]
    fn level_var_is_reread() {
        let var = Arc::new(LevelVar::new(Level::INFO));
        let source: Arc<dyn Leveler> = var.clone();
        assert_eq!(source.level(), Level::INFO);
        var.set(Level::ERROR);
        assert_eq!(source.level(), Level::ERROR);
    }

    #[test]
    fn tracing_trace_maps_below_debug() {
        assert_eq!(Level::from(tracing::Level::TRACE), Level(-8));
        assert_eq!(Level::from(tracing::Level::WARN), Level::WARN);
    }
}

use chrono::{DateTime, Utc};
use std::borrow::Cow;

use crate::level::Level;
use crate::value::Attr;

/// Resolved source location of the call that produced a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source<'a> {
    pub file: Cow<'a, str>,
    /// 1-based.
    pub line: u32,
}

impl<'a> Source<'a> {
    pub fn new(file: impl Into<Cow<'a, str>>, line: u32) -> Self {
        Source {
            file: file.into(),
            line,
        }
    }
}

impl From<&'static std::panic::Location<'static>> for Source<'static> {
    fn from(location: &'static std::panic::Location<'static>) -> Self {
        Source::new(location.file(), location.line())
    }
}

/// One log event, borrowed for the duration of a single `handle` call.
#[derive(Debug, Clone)]
pub struct Record<'a> {
    /// `None` omits the leading timestamp.
    pub time: Option<DateTime<Utc>>,
    pub level: Level,
    pub message: &'a str,
    pub source: Option<Source<'a>>,
    /// Qualified by the handler's current group path.
    pub attrs: &'a [Attr],
}

impl<'a> Record<'a> {
    /// A record stamped with the current wall-clock time.
    pub fn new(level: Level, message: &'a str) -> Self {
        Record {
            time: Some(Utc::now()),
            level,
            message,
            source: None,
            attrs: &[],
        }
    }

    pub fn with_time(mut self, time: Option<DateTime<Utc>>) -> Self {
        self.time = time;
        self
    }

    pub fn with_source(mut self, source: Source<'a>) -> Self {
        self.source = Some(source);
        self
    }

    pub fn with_attrs(mut self, attrs: &'a [Attr]) -> Self {
        self.attrs = attrs;
        self
    }
}

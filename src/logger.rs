use std::borrow::Cow;
use std::panic::Location;

use crate::error::HandleError;
use crate::handler::{Handler, HandlerOptions};
use crate::level::Level;
use crate::record::{Record, Source};
use crate::sink::LogSink;
use crate::value::Attr;

/// Convenience front end over a [`Handler`].
///
/// Checks the level first, stamps the wall clock and, when the handler asks
/// for it, records the caller's file and line.
///
/// ```
/// use text_log_handler::{attrs, HandlerOptions, Logger, MemorySink, TimeFormat};
///
/// let sink = MemorySink::new();
/// let logger = Logger::new(
///     sink.clone(),
///     HandlerOptions::default().time_format(TimeFormat::Disabled),
/// );
/// let requests = logger.with_attrs(attrs!["service" => "api"]).with_group("request");
/// requests.info("served", &attrs!["method" => "GET"]).unwrap();
/// assert_eq!(sink.contents(), "INFO service=api msg=served request.method=GET\n");
/// ```
#[derive(Clone, Debug)]
pub struct Logger {
    handler: Handler,
}

impl Logger {
    pub fn new(sink: impl LogSink + 'static, options: HandlerOptions) -> Self {
        Logger {
            handler: Handler::new(sink, options),
        }
    }

    pub fn from_handler(handler: Handler) -> Self {
        Logger { handler }
    }

    pub fn handler(&self) -> &Handler {
        &self.handler
    }

    pub fn with_attrs(&self, attrs: Vec<Attr>) -> Logger {
        Logger {
            handler: self.handler.with_attrs(attrs),
        }
    }

    pub fn with_group(&self, name: impl Into<Cow<'static, str>>) -> Logger {
        Logger {
            handler: self.handler.with_group(name),
        }
    }

    pub fn enabled(&self, level: Level) -> bool {
        self.handler.enabled(level)
    }

    /// Emits a record if `level` passes the handler's threshold.
    #[track_caller]
    pub fn log(&self, level: Level, message: &str, attrs: &[Attr]) -> Result<(), HandleError> {
        if !self.handler.enabled(level) {
            return Ok(());
        }
        let mut record = Record::new(level, message).with_attrs(attrs);
        if self.handler.options().add_source {
            record = record.with_source(Source::from(Location::caller()));
        }
        self.handler.handle(&record)
    }

    #[track_caller]
    pub fn debug(&self, message: &str, attrs: &[Attr]) -> Result<(), HandleError> {
        self.log(Level::DEBUG, message, attrs)
    }

    #[track_caller]
    pub fn info(&self, message: &str, attrs: &[Attr]) -> Result<(), HandleError> {
        self.log(Level::INFO, message, attrs)
    }

    #[track_caller]
    pub fn warn(&self, message: &str, attrs: &[Attr]) -> Result<(), HandleError> {
        self.log(Level::WARN, message, attrs)
    }

    #[track_caller]
    pub fn error(&self, message: &str, attrs: &[Attr]) -> Result<(), HandleError> {
        self.log(Level::ERROR, message, attrs)
    }
}

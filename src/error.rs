use std::io;

/// Failure to deliver a rendered record.
///
/// Encoding itself cannot fail; the only errors come from the destination,
/// passed through untouched and never retried.
#[derive(thiserror::Error, Debug)]
pub enum HandleError {
    #[error("failed to write log record: {0}")]
    Write(#[source] io::Error),

    #[error("failed to flush log destination: {0}")]
    Flush(#[source] io::Error),
}

impl HandleError {
    /// The destination's own error.
    pub fn io_error(&self) -> &io::Error {
        match self {
            HandleError::Write(err) | HandleError::Flush(err) => err,
        }
    }
}

/// Error returned when a string is not a level name.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown log level {0:?}")]
pub struct ParseLevelError(pub String);

/// Error returned when installing the global tracing subscriber.
#[derive(thiserror::Error, Debug)]
pub enum InitError {
    #[error("a global tracing subscriber is already installed")]
    AlreadyInstalled(#[from] tracing::subscriber::SetGlobalDefaultError),
}

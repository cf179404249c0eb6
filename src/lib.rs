//! Structured text log handler.
//!
//! Renders leveled records with key/value attributes as single text lines:
//!
//! ```text
//! 2025/11/14 14:03:14 INFO service=api msg=served request.method=GET request.status=200
//! ```
//!
//! * [`Handler`] composes lines into pooled scratch buffers and writes each
//!   one to its [`LogSink`] in a single locked call.
//! * [`Context`] is the immutable, structurally shared set of pre-bound
//!   attributes and group prefixes behind `with_attrs` / `with_group`.
//! * [`Logger`] is a small front end that checks the level, stamps the time
//!   and captures the caller's location.
//! * [`TextLayer`] plugs the handler into `tracing` (feature `tracing-layer`).
//!
//! Values are written verbatim: keys or values containing spaces or `=`
//! are not quoted, so such lines do not parse back unambiguously.

pub mod context;
pub mod encode;
pub mod env;
pub mod error;
pub mod handler;
pub mod level;
pub mod logger;
pub mod noop_sink;
pub mod pool;
pub mod record;
pub mod sink;
pub mod value;

#[cfg(feature = "tracing-layer")]
pub mod layer;

pub mod init;

pub use context::{Context, GroupPath};
pub use encode::TimeFormat;
pub use error::{HandleError, InitError, ParseLevelError};
pub use handler::{Handler, HandlerOptions, ReplaceAttr};
pub use init::HandlerConfig;
pub use level::{Level, LevelVar, Leveler};
pub use logger::Logger;
pub use noop_sink::NoopSink;
pub use pool::{BufferPool, PooledBuffer};
pub use record::{Record, Source};
pub use sink::{LogSink, MemorySink};
pub use value::{Attr, Value};

#[cfg(feature = "tracing-layer")]
pub use layer::TextLayer;

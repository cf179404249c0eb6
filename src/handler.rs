use parking_lot::Mutex;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use crate::context::{Context, GroupPath};
use crate::encode::{self, TimeFormat};
use crate::error::HandleError;
use crate::level::{Level, Leveler};
use crate::pool::BufferPool;
use crate::record::Record;
use crate::sink::LogSink;
use crate::value::Attr;

/// Attribute rewrite hook.
///
/// Called for every bound and per-call attribute with the group path that
/// qualifies it. `None` drops the attribute, `Some(Cow::Borrowed(attr))`
/// keeps it as is and `Some(Cow::Owned(..))` substitutes key and/or value.
/// Never called for the level or the message.
pub type ReplaceAttr =
    dyn for<'a> Fn(&GroupPath, &'a Attr) -> Option<Cow<'a, Attr>> + Send + Sync;

/// Settings fixed at handler construction.
#[derive(Clone)]
pub struct HandlerOptions {
    /// Minimum level, re-read on every `enabled` call. Defaults to `INFO`.
    pub level: Arc<dyn Leveler>,
    pub time_format: TimeFormat,
    /// Emit `source=<file>:<line>` when the record carries a location.
    pub add_source: bool,
    /// Render record timestamps in UTC instead of local time.
    pub utc: bool,
    pub replace_attr: Option<Arc<ReplaceAttr>>,
}

impl Default for HandlerOptions {
    fn default() -> Self {
        HandlerOptions {
            level: Arc::new(Level::INFO),
            time_format: TimeFormat::Default,
            add_source: false,
            utc: false,
            replace_attr: None,
        }
    }
}

impl HandlerOptions {
    pub fn level(mut self, level: impl Leveler + 'static) -> Self {
        self.level = Arc::new(level);
        self
    }

    pub fn time_format(mut self, time_format: TimeFormat) -> Self {
        self.time_format = time_format;
        self
    }

    pub fn add_source(mut self, add_source: bool) -> Self {
        self.add_source = add_source;
        self
    }

    pub fn utc(mut self, utc: bool) -> Self {
        self.utc = utc;
        self
    }

    pub fn replace_attr<F>(mut self, f: F) -> Self
    where
        F: for<'a> Fn(&GroupPath, &'a Attr) -> Option<Cow<'a, Attr>> + Send + Sync + 'static,
    {
        self.replace_attr = Some(Arc::new(f));
        self
    }
}

impl fmt::Debug for HandlerOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerOptions")
            .field("level", &self.level.level())
            .field("time_format", &self.time_format)
            .field("add_source", &self.add_source)
            .field("utc", &self.utc)
            .field("replace_attr", &self.replace_attr.is_some())
            .finish()
    }
}

struct Shared {
    options: HandlerOptions,
    sink: Mutex<Box<dyn LogSink>>,
    pool: BufferPool,
}

/// Renders records as single text lines and writes them to a destination.
///
/// Output shape:
///
/// ```text
/// [<time> ]<LEVEL> [source=<file>:<line> ]<bound attrs> msg=<message>[ <record attrs>]
/// ```
///
/// A handler is a cheap, cloneable view: destination, buffer pool and
/// options are shared by every handler derived through
/// [`with_attrs`](Handler::with_attrs) and [`with_group`](Handler::with_group);
/// each derived handler only adds a context node.
#[derive(Clone)]
pub struct Handler {
    shared: Arc<Shared>,
    context: Context,
}

impl Handler {
    pub fn new(sink: impl LogSink + 'static, mut options: HandlerOptions) -> Self {
        options.time_format = options.time_format.validated();
        Handler {
            shared: Arc::new(Shared {
                options,
                sink: Mutex::new(Box::new(sink)),
                pool: BufferPool::new(),
            }),
            context: Context::new(),
        }
    }

    pub fn options(&self) -> &HandlerOptions {
        &self.shared.options
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn pool(&self) -> &BufferPool {
        &self.shared.pool
    }

    /// Whether a record at `level` would be emitted under the current threshold.
    pub fn enabled(&self, level: Level) -> bool {
        level >= self.shared.options.level.level()
    }

    /// Handler whose records carry `attrs` in front of the message.
    pub fn with_attrs(&self, attrs: Vec<Attr>) -> Handler {
        Handler {
            shared: Arc::clone(&self.shared),
            context: self.context.bind(attrs),
        }
    }

    /// Handler that qualifies later attributes with `name.`.
    pub fn with_group(&self, name: impl Into<Cow<'static, str>>) -> Handler {
        Handler {
            shared: Arc::clone(&self.shared),
            context: self.context.enter_group(name),
        }
    }

    /// Renders `record` and writes it to the destination as one line.
    ///
    /// The line is rendered into a pooled buffer first; the destination lock
    /// is held only around the single write, so lines never interleave.
    ///
    /// Level filtering is the caller's business; see [`enabled`](Handler::enabled).
    pub fn handle(&self, record: &Record<'_>) -> Result<(), HandleError> {
        let mut buf = self.shared.pool.acquire();
        self.encode_into(record, &mut buf);
        let mut sink = self.shared.sink.lock();
        sink.write_record(&buf).map_err(HandleError::Write)
    }

    /// Flushes the destination.
    pub fn flush(&self) -> Result<(), HandleError> {
        self.shared.sink.lock().flush().map_err(HandleError::Flush)
    }

    /// Appends the rendered line for `record`, newline included, to `buf`.
    pub fn encode_into(&self, record: &Record<'_>, buf: &mut Vec<u8>) {
        let options = &self.shared.options;

        if let Some(time) = &record.time {
            if options.time_format.is_enabled() {
                encode::append_record_time(buf, &options.time_format, time, options.utc);
                buf.push(b' ');
            }
        }

        record.level.append_to(buf);
        buf.push(b' ');

        if options.add_source {
            if let Some(source) = record.source.as_ref().filter(|s| !s.file.is_empty()) {
                buf.extend_from_slice(b"source=");
                buf.extend_from_slice(source.file.as_bytes());
                buf.push(b':');
                encode::append_u64(buf, source.line as u64);
                buf.push(b' ');
            }
        }

        self.context.for_each_bound(|groups, attr| {
            if let Some(attr) = self.rewrite(groups, attr) {
                append_attr(buf, groups, &attr);
                buf.push(b' ');
            }
        });

        buf.extend_from_slice(b"msg=");
        buf.extend_from_slice(record.message.as_bytes());

        let groups = self.context.groups();
        for attr in record.attrs {
            if let Some(attr) = self.rewrite(groups, attr) {
                buf.push(b' ');
                append_attr(buf, groups, &attr);
            }
        }

        buf.push(b'\n');
    }

    /// Runs the rewrite hook. Attributes holding an empty group never reach
    /// the hook and are dropped, as is anything the hook turns into one.
    fn rewrite<'a>(&self, groups: &GroupPath, attr: &'a Attr) -> Option<Cow<'a, Attr>> {
        if attr.value.is_empty_group() {
            return None;
        }
        match &self.shared.options.replace_attr {
            Some(replace) => replace(groups, attr).filter(|a| !a.value.is_empty_group()),
            None => Some(Cow::Borrowed(attr)),
        }
    }
}

fn append_attr(buf: &mut Vec<u8>, groups: &GroupPath, attr: &Attr) {
    groups.append_prefix(buf);
    buf.extend_from_slice(attr.key.as_bytes());
    buf.push(b'=');
    encode::append_value(buf, &attr.value);
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler")
            .field("options", &self.shared.options)
            .field("context", &self.context)
            .finish()
    }
}

use serde::{Deserialize, Serialize};
use std::borrow::Cow;

use crate::encode::TimeFormat;
use crate::env;
use crate::handler::HandlerOptions;
use crate::level::Level;

#[cfg(feature = "tracing-layer")]
use crate::{error::InitError, handler::Handler, layer::TextLayer, sink::LogSink};
#[cfg(feature = "tracing-layer")]
use tracing_subscriber::{layer::SubscriberExt, Registry};

/// Serializable handler configuration.
///
/// Holds the plain-data subset of [`HandlerOptions`]; the level source and
/// rewrite hook are code, so they are attached to the options afterwards.
///
/// **Fields**
/// - `level`: minimum level as text (`"debug"`, `"WARN"`, `"INFO+2"`).
/// - `time_format`: strftime pattern for the leading timestamp; `None`
///   keeps the `2025/11/14 14:03:14`-style default. A pattern chrono cannot
///   parse also falls back to the default.
/// - `show_time`: `false` drops the leading timestamp altogether.
/// - `add_source`: emit `source=<file>:<line>` when a location is known.
/// - `utc`: render the leading timestamp in UTC instead of local time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HandlerConfig {
    pub level: Level,
    pub time_format: Option<String>,
    pub show_time: bool,
    pub add_source: bool,
    pub utc: bool,
}

impl Default for HandlerConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            time_format: None,
            show_time: true,
            add_source: false,
            utc: false,
        }
    }
}

impl HandlerConfig {
    /// Build a configuration from `TEXT_LOG_*` environment variables.
    ///
    /// Unset variables keep their defaults, and so do values that do not
    /// parse: a typo in the environment degrades to default behaviour
    /// instead of stopping the process.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let level = env::env_or(env::TEXT_LOG_LEVEL_ENV, "INFO")
            .parse()
            .unwrap_or(defaults.level);
        let time_format = Some(env::env_or(env::TEXT_LOG_TIME_FORMAT_ENV, ""))
            .filter(|pattern| !pattern.is_empty());

        Self {
            level,
            time_format,
            show_time: env::env_flag(env::TEXT_LOG_SHOW_TIME_ENV, defaults.show_time),
            add_source: env::env_flag(env::TEXT_LOG_ADD_SOURCE_ENV, defaults.add_source),
            utc: env::env_flag(env::TEXT_LOG_UTC_ENV, defaults.utc),
        }
    }

    pub fn time_format(&self) -> TimeFormat {
        if !self.show_time {
            return TimeFormat::Disabled;
        }
        match &self.time_format {
            Some(pattern) => TimeFormat::Custom(Cow::Owned(pattern.clone())).validated(),
            None => TimeFormat::Default,
        }
    }

    /// Handler options carrying this configuration with a fixed level.
    pub fn options(&self) -> HandlerOptions {
        HandlerOptions::default()
            .level(self.level)
            .time_format(self.time_format())
            .add_source(self.add_source)
            .utc(self.utc)
    }
}

/// Install a [`Registry`] with a [`TextLayer`] writing through `handler` as
/// the global default subscriber.
///
/// **Returns**
/// - `Err(InitError::AlreadyInstalled)` if some global subscriber is
///   already set; the process keeps using that one.
#[cfg(feature = "tracing-layer")]
pub fn try_init_tracing(handler: Handler) -> Result<(), InitError> {
    let subscriber = Registry::default().with(TextLayer::new(handler));
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

/// Build a handler for `sink` from `config`, install it as the global
/// tracing subscriber and return it for direct use.
#[cfg(feature = "tracing-layer")]
pub fn init_tracing_with_config(
    sink: impl LogSink + 'static,
    config: HandlerConfig,
) -> Result<Handler, InitError> {
    let handler = Handler::new(sink, config.options());
    try_init_tracing(handler.clone())?;
    Ok(handler)
}

/// Initialize tracing for `sink` with configuration from the environment.
///
/// Equivalent to calling [`init_tracing_with_config`] with
/// [`HandlerConfig::from_env`].
#[cfg(feature = "tracing-layer")]
pub fn init_tracing(sink: impl LogSink + 'static) -> Result<Handler, InitError> {
    init_tracing_with_config(sink, HandlerConfig::from_env())
}

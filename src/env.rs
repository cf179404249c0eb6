/// Environment variable names read by [`HandlerConfig::from_env`](crate::init::HandlerConfig::from_env).
///
/// These are purely helpers; the handler itself never touches the
/// environment.

/// Minimum level, e.g. `debug`, `WARN`, `INFO+2`.
pub const TEXT_LOG_LEVEL_ENV: &str = "TEXT_LOG_LEVEL";

/// strftime pattern for the leading timestamp.
pub const TEXT_LOG_TIME_FORMAT_ENV: &str = "TEXT_LOG_TIME_FORMAT";

/// `false` drops the leading timestamp.
pub const TEXT_LOG_SHOW_TIME_ENV: &str = "TEXT_LOG_SHOW_TIME";

/// `true` adds `source=<file>:<line>`.
pub const TEXT_LOG_ADD_SOURCE_ENV: &str = "TEXT_LOG_ADD_SOURCE";

/// `true` renders timestamps in UTC.
pub const TEXT_LOG_UTC_ENV: &str = "TEXT_LOG_UTC";

/// Value of `key`, or `default` when it is unset or not valid UTF-8.
pub fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Read a boolean environment variable; unset or unparsable yields `default`.
pub fn env_flag(key: &str, default: bool) -> bool {
    match std::env::var(key) {
        Ok(raw) => parse_flag(&raw).unwrap_or(default),
        Err(_) => default,
    }
}

pub(crate) fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags() {
        assert_eq!(parse_flag("TRUE"), Some(true));
        assert_eq!(parse_flag(" off "), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }

    #[test]
    fn unset_variables_use_defaults() {
        assert_eq!(env_or("TEXT_LOG_TEST_SURELY_UNSET", "x"), "x");
        assert!(env_flag("TEXT_LOG_TEST_SURELY_UNSET", true));
    }
}

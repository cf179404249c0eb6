use std::borrow::Cow;
use std::io;
use std::sync::Arc;
use std::time::Duration;

use text_log_handler::{attrs, Attr, HandlerOptions, Level, LevelVar, Logger};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let level = Arc::new(LevelVar::new(Level::INFO));
    let options = HandlerOptions::default()
        .level(Arc::clone(&level))
        .add_source(true)
        .replace_attr(|_, attr| match attr.key.as_ref() {
            "password" => None,
            _ => Some(Cow::Borrowed(attr)),
        });
    let logger = Logger::new(io::stdout(), options);

    logger.info("service started", &attrs!["port" => 8080])?;
    logger.warn("disk space low", &attrs!["available" => "10GB"])?;
    logger.debug("hidden at INFO", &[])?;

    level.set(Level::DEBUG);
    logger.debug("visible after lowering the threshold", &[])?;

    let api = logger.with_attrs(attrs!["service" => "api"]);
    let requests = api.with_group("request");
    requests.info(
        "request served",
        &attrs![
            "method" => "POST",
            "path" => "/api/users",
            "status" => 200,
            "duration" => Duration::from_millis(25),
        ],
    )?;
    requests.info(
        "login",
        &attrs!["username" => "admin", "password" => "never printed"],
    )?;

    api.error(
        "upstream failed",
        &[Attr::group(
            "upstream",
            attrs!["host" => "10.0.0.7", "retries" => 3, "backoff" => 1.5],
        )],
    )?;
    Ok(())
}

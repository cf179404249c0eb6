use std::io;

use text_log_handler::init::init_tracing_with_config;
use text_log_handler::HandlerConfig;
use tracing::{error, info, info_span, warn};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = HandlerConfig {
        add_source: true,
        ..HandlerConfig::from_env()
    };
    init_tracing_with_config(io::stderr(), config)?;

    info!("starting service");

    let request = info_span!("request", method = "GET", path = "/api/users");
    let _entered = request.enter();
    warn!(elapsed_ms = 850u64, "slow response");

    error!(
        user_id = 42,
        reason = "invalid password",
        "authentication failed"
    );
    Ok(())
}

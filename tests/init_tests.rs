#![cfg(feature = "tracing-layer")]

use text_log_handler::init::init_tracing_with_config;
use text_log_handler::{HandlerConfig, InitError, MemorySink};

#[test]
fn global_subscriber_routes_tracing_events() {
    let sink = MemorySink::new();
    let config = HandlerConfig {
        show_time: false,
        ..HandlerConfig::default()
    };
    let handler = init_tracing_with_config(sink.clone(), config.clone()).unwrap();

    tracing::info!(user_id = 42u64, reason = "invalid password", "authentication failed");
    tracing::debug!("below threshold");
    {
        let span = tracing::warn_span!("checkout", cart = 3u64);
        let _entered = span.enter();
        tracing::error!(code = 502u64, "payment gateway down");
    }

    assert_eq!(
        sink.lines(),
        [
            "INFO msg=authentication failed user_id=42 reason=invalid password",
            "ERROR checkout.cart=3 msg=payment gateway down checkout.code=502",
        ]
    );

    let second = init_tracing_with_config(MemorySink::new(), config);
    assert!(matches!(second, Err(InitError::AlreadyInstalled(_))));
    assert!(handler.pool().idle() >= 1);
}

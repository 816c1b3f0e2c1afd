use std::fs::OpenOptions;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

pub fn init_tracing() {
    init_tracing_with_service("mcnp-core");
}

/// Install the global subscriber.
///
/// Console output goes to stderr and honours `RUST_LOG` (default `info`).
/// When `MCNP_LOG_FILE` is set, a second non-ANSI layer appends debug-level
/// output to that file.
/// Calling this more than once is harmless; later calls are ignored.
pub fn init_tracing_with_service(service_name: &str) {
    let file_logging = std::env::var("MCNP_LOG_FILE").ok();

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")));

    let registry = tracing_subscriber::registry().with(console_layer);

    let file = file_logging.as_ref().and_then(|log_path| {
        match OpenOptions::new().create(true).append(true).open(log_path) {
            Ok(file) => Some(file),
            Err(e) => {
                eprintln!("Failed to open log file {}: {}", log_path, e);
                None
            }
        }
    });

    let result = match file {
        Some(file) => {
            let file_layer = fmt::layer()
                .with_writer(file)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(true)
                .with_filter(tracing_subscriber::filter::LevelFilter::DEBUG);
            registry.with(file_layer).try_init()
        }
        None => registry.try_init(),
    };

    if result.is_ok() {
        tracing::debug!(service = service_name, "tracing initialized");
    }
}

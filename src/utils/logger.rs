use crate::utils::config::LoggingConfig;
use std::path::Path;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the tracing subscriber from config.
///
/// `RUST_LOG` wins over the configured level when set. Output "json" with
/// a file path appends JSON lines to that file; "json" without a path
/// writes JSON to stdout; anything else is pretty console output.
pub fn init_from_config(config: &LoggingConfig) {
    let json = config.output == "json";
    let file = (!config.file_path.is_empty()).then(|| Path::new(&config.file_path));
    init_logger(&config.level, json, file);
}

/// Initialize logging system
pub fn init_logger(level: &str, json_output: bool, log_file: Option<&Path>) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let registry = tracing_subscriber::registry().with(filter);

    match (json_output, log_file) {
        (true, Some(path)) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .expect("Failed to open log file");
            registry.with(fmt::layer().json().with_writer(file)).init();
        }
        (true, None) => registry.with(fmt::layer().json()).init(),
        (false, _) => registry.with(fmt::layer().pretty()).init(),
    }
}

use tracing_subscriber::{fmt, EnvFilter};

use crate::config::Environment;

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence; otherwise production logs at `info` and every
/// other environment at `debug`. Production output is one JSON object per line.
pub fn init(environment: Environment) {
    let default_filter = if environment.is_production() {
        "info,sqlx=warn"
    } else {
        "debug,sqlx=info,hyper=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let result = if environment.is_production() {
        fmt().json().with_env_filter(filter).with_current_span(false).try_init()
    } else {
        fmt().with_env_filter(filter).with_target(false).try_init()
    };

    // A subscriber may already be installed (tests, embedding); keep it.
    if let Err(e) = result {
        eprintln!("tracing subscriber already installed: {e}");
    }
}

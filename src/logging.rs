use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global subscriber. `RUST_LOG` wins over `default_level`.
pub fn init(default_level: &str) {
    let default_filter = format!("{},hyper=warn,reqwest=warn", default_level);

    let result = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .with(fmt::layer().with_target(true).compact())
        .try_init();

    if let Err(e) = result {
        // Already installed (tests, embedding)
        tracing::debug!("tracing subscriber not installed: {}", e);
    }
}

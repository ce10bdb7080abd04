use tracing_subscriber::EnvFilter;

/// Installs the fmt subscriber. `RUST_LOG` wins over `default_directive`.
/// Safe to call more than once; later calls are ignored.
pub fn init(default_directive: &str) {
    let env = std::env::var(EnvFilter::DEFAULT_ENV).ok();

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter(env.as_deref(), default_directive))
        .with_target(true)
        .try_init();
}

fn filter(env: Option<&str>, default_directive: &str) -> EnvFilter {
    env.and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(default_directive))
}

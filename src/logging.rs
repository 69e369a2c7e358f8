use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Installs the global `tracing` subscriber. `verbose` raises the default
/// level from `WARN` to `DEBUG`; `RUST_LOG` always takes precedence when set.
pub fn install(verbose: bool) {
    let default_directive = if verbose { "debug" } else { "warn" };

    let filter = EnvFilter::builder()
        .with_default_directive(default_directive.parse().unwrap())
        .from_env_lossy();

    let fmt_layer = tracing_subscriber::fmt::Layer::default().with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(fmt_layer.with_filter(filter))
        .init();
}

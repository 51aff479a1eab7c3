use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the global tracing subscriber.
///
/// JSON lines by default; `LOG_FORMAT=text` switches to a compact
/// human-readable format for local runs. `RUST_LOG` overrides the default
/// directives, which keep the noisy query layers at `warn`.
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,backend=debug,sqlx=warn,sea_orm=warn"));
    let registry = tracing_subscriber::registry().with(env_filter);

    if matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("text")) {
        registry.with(fmt::layer().compact()).init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_ansi(false)
                    .json(),
            )
            .init();
    }
}

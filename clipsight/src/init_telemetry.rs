use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Initialize the tracing subscriber.
///
/// Log filtering follows `RUST_LOG`, defaulting to `info` for our crates and
/// `warn` for everything else.
pub fn init_telemetry_and_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,clipsight=info,clipsight_core=info"));

    let fmt_layer = if cfg!(debug_assertions) {
        tracing_subscriber::fmt::layer()
            .with_line_number(false)
            .with_thread_names(false)
            .with_target(true)
            .compact()
            .boxed()
    } else {
        tracing_subscriber::fmt::layer().with_target(true).boxed()
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}

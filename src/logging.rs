use tracing_subscriber::EnvFilter;

/// Initialise logging. `debug` comes from the settings file; only then may
/// `RUST_LOG` raise or narrow the level. Thread names are printed so lines from
/// the `sketch-decode` worker can be told apart from the UI thread.
pub fn init(debug: bool) {
    let level = if debug { "debug" } else { "info" };

    let filter = if debug {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
    } else {
        // Ignore a stray RUST_LOG when debug logging is off.
        EnvFilter::new(level)
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_thread_names(true)
        .try_init();
}

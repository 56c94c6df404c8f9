//! Arcana toolchain CLI entry point

fn main() {
    // Initialize structured logging with env-based filter. `--vestigium`
    // raises the default level to debug, matching the trace flag of the
    // original runner.
    let default_level = if std::env::args().any(|a| a == "--vestigium") {
        "debug"
    } else {
        "info"
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .try_init();

    arcana::cli::run();
}

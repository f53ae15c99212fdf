//! Logging setup for the server binary.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Installs a `tracing` subscriber that writes formatted events to stdout.
///
/// `RUST_LOG` wins when set. Otherwise every Partyhall crate and the binary
/// log at `default_level`, and everything else at `warn`.
///
/// ```no_run
/// partyhall::logging::setup_logger("partyhall_server", "info");
/// ```
pub fn setup_logger(binary_name: &str, default_level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_directives(binary_name, default_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn default_directives(binary_name: &str, level: &str) -> String {
    let crates = [
        "partyhall",
        "partyhall_transport",
        "partyhall_protocol",
        "partyhall_session",
        "partyhall_room",
        "partyhall_games",
    ];
    let mut directives = vec!["warn".to_string()];
    directives.extend(crates.iter().map(|c| format!("{c}={level}")));
    directives.push(format!("{}={level}", binary_name.replace('-', "_")));
    directives.join(",")
}

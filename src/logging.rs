//! Tracing subscriber setup for the command line binary.

use tracing_subscriber::EnvFilter;

/// Install the global subscriber
///
/// `RUST_LOG` takes precedence; otherwise the level follows the number of
/// `-v` flags. Logs go to stderr so stdout carries only report text.
pub fn init(verbosity: u8, json: bool) {
    let default_level = match verbosity {
        0 => "fotolist=info",
        1 => "fotolist=debug",
        _ => "fotolist=trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    // A second init (e.g. from tests) keeps the first subscriber
    let _ = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}

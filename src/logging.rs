use std::io::{self, IsTerminal};

use tracing::Level;

/// Installs a compact stderr subscriber for the command-line tools.
///
/// Stdout belongs to the byte stream, so every diagnostic goes to stderr.
pub fn init() {
    let _ = tracing_subscriber::fmt()
        .compact()
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_max_level(Level::INFO)
        .with_target(false)
        .without_time()
        .try_init();
}

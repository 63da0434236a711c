//! Diagnostic output on stderr. Command results go to stdout.

use tracing::level_filters::LevelFilter;

/// Map the number of `-v` flags to a level, starting at warn
pub fn level(verbose: usize) -> LevelFilter {
    match verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

pub fn init_logging(verbose: usize) {
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level(verbose))
        .with_target(false)
        .try_init();
}

//! Tracing subscriber setup.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Filter for a verbosity level: 0 warn, 1 info, 2 debug, 3+ trace.
#[must_use]
pub fn filter_for(verbosity: u8) -> EnvFilter {
    match verbosity {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    }
}

/// Installs a stderr subscriber at the given verbosity.
///
/// Does nothing if a global subscriber is already set.
pub fn init(verbosity: u8) {
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter_for(verbosity))
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::filter::LevelFilter;

    #[test]
    fn test_filter_levels() {
        assert_eq!(filter_for(0).max_level_hint(), Some(LevelFilter::WARN));
        assert_eq!(filter_for(1).max_level_hint(), Some(LevelFilter::INFO));
        assert_eq!(filter_for(2).max_level_hint(), Some(LevelFilter::DEBUG));
        assert_eq!(filter_for(3).max_level_hint(), Some(LevelFilter::TRACE));
        assert_eq!(filter_for(9).max_level_hint(), Some(LevelFilter::TRACE));
    }

    #[test]
    fn test_init_twice_is_harmless() {
        init(0);
        init(2);
    }
}

//! Log output for the node. `RUST_LOG` overrides `--log-level` when set.

use clap::ValueEnum;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Coloured lines for a terminal.
    Human,
    /// One JSON object per event, fields flattened to the top level.
    Json,
}

pub fn init_logging(format: LogFormat, level: &str) {
    let builder = fmt().with_env_filter(env_filter(level));
    match format {
        LogFormat::Human => builder.with_target(false).init(),
        LogFormat::Json => builder.json().flatten_event(true).init(),
    }
}

fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_parse_from_flag_values() {
        assert_eq!(LogFormat::from_str("human", true).unwrap(), LogFormat::Human);
        assert_eq!(LogFormat::from_str("JSON", true).unwrap(), LogFormat::Json);
        assert!(LogFormat::from_str("xml", true).is_err());
    }
}

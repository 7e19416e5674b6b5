//! Tracing setup: `SOLACE_LOG`, else the config's `log.level`, else `warn`.

use tracing_subscriber::EnvFilter;

use crate::constants::LOG_ENV;

const DEFAULT_LEVEL: &str = "warn";

pub fn init(config_level: Option<&str>) {
    tracing_subscriber::fmt()
        .with_env_filter(filter(config_level))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn filter(config_level: Option<&str>) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| {
        config_level
            .and_then(|level| EnvFilter::try_new(level).ok())
            .unwrap_or_else(|| EnvFilter::new(DEFAULT_LEVEL))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_level_is_used() {
        if std::env::var(LOG_ENV).is_ok() {
            return;
        }
        assert_eq!(filter(Some("debug")).to_string(), "debug");
        assert_eq!(filter(None).to_string(), DEFAULT_LEVEL);
    }
}

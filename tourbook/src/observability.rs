//! Structured logging

use tracing_subscriber::EnvFilter;

use crate::{config::Config, error::Result};

fn env_filter(config: &Config) -> EnvFilter {
    EnvFilter::try_new(&config.service.log_level).unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the JSON log subscriber
///
/// Only the first call in a process installs a subscriber; later calls are
/// no-ops.
pub fn init_tracing(config: &Config) -> Result<()> {
    let installed = tracing_subscriber::fmt()
        .json()
        .with_env_filter(env_filter(config))
        .with_current_span(true)
        .try_init()
        .is_ok();

    if installed {
        tracing::info!(
            service = %config.service.name,
            environment = %config.service.environment,
            "Tracing initialized"
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_tracing_twice() {
        let config = Config::default();
        assert!(init_tracing(&config).is_ok());
        assert!(init_tracing(&config).is_ok());
    }

    #[test]
    fn test_bad_log_level_falls_back() {
        let mut config = Config::default();
        config.service.log_level = "tourbook=loudest".to_string();
        assert_eq!(env_filter(&config).to_string(), "info");
    }
}

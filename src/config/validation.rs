use crate::config::types::{Config, CrawlerConfig, ProxyEndpoint, StorageConfig};
use crate::ConfigError;
use url::Url;

const MAX_ROUNDS: u32 = 1000;
const MAX_POOL_SIZE: usize = 1000;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_storage_config(&config.storage)?;
    validate_proxies(&config.proxy.endpoints)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    let seed = Url::parse(&config.seed)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid seed '{}': {}", config.seed, e)))?;

    if seed.scheme() != "http" && seed.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "Seed '{}' must use http or https",
            config.seed
        )));
    }

    if seed.host_str().is_none() {
        return Err(ConfigError::Validation(format!(
            "Seed '{}' has no host",
            config.seed
        )));
    }

    if config.rounds > MAX_ROUNDS {
        return Err(ConfigError::Validation(format!(
            "rounds must be at most {}, got {}",
            MAX_ROUNDS, config.rounds
        )));
    }

    if config.pool_size < 1 || config.pool_size > MAX_POOL_SIZE {
        return Err(ConfigError::Validation(format!(
            "pool-size must be between 1 and {}, got {}",
            MAX_POOL_SIZE, config.pool_size
        )));
    }

    if config.request_timeout_secs < 1 || config.connect_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "timeouts must be at least 1 second".to_string(),
        ));
    }

    if config.connect_timeout_secs > config.request_timeout_secs {
        return Err(ConfigError::Validation(format!(
            "connect-timeout-secs ({}) cannot exceed request-timeout-secs ({})",
            config.connect_timeout_secs, config.request_timeout_secs
        )));
    }

    if let Some(agent) = &config.user_agent {
        if agent.trim().is_empty() {
            return Err(ConfigError::Validation(
                "user-agent cannot be empty".to_string(),
            ));
        }
    }

    Ok(())
}

/// Validates storage configuration
fn validate_storage_config(config: &StorageConfig) -> Result<(), ConfigError> {
    if config.pages_dir.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "pages-dir cannot be empty".to_string(),
        ));
    }

    if config.links_dir.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "links-dir cannot be empty".to_string(),
        ));
    }

    if config.pages_dir == config.links_dir {
        return Err(ConfigError::Validation(
            "pages-dir and links-dir must be different directories".to_string(),
        ));
    }

    Ok(())
}

/// Validates proxy endpoints
fn validate_proxies(endpoints: &[ProxyEndpoint]) -> Result<(), ConfigError> {
    for endpoint in endpoints {
        if endpoint.host.is_empty() || endpoint.host.contains(':') {
            return Err(ConfigError::Validation(format!(
                "Invalid proxy host '{}'",
                endpoint.host
            )));
        }

        if endpoint.port == 0 {
            return Err(ConfigError::Validation(format!(
                "Proxy {} has port 0",
                endpoint.host
            )));
        }

        Url::parse(&endpoint.url()).map_err(|e| {
            ConfigError::InvalidUrl(format!("Invalid proxy '{}': {}", endpoint, e))
        })?;
    }

    Ok(())
}

use crate::config::types::{Config, ProxyEndpoint};
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// If the configuration names a proxy list file, its entries are appended to
/// the inline `[[proxy.endpoint]]` entries before validation.
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use cachecrawl::config::load_config;
///
/// let config = load_config(Path::new("crawl.toml")).unwrap();
/// println!("Rounds: {}", config.crawler.rounds);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut config: Config = toml::from_str(&content)?;

    if let Some(list) = &config.proxy.file {
        let extra = load_proxy_list(list)?;
        config.proxy.endpoints.extend(extra);
    }

    validate(&config)?;

    Ok(config)
}

/// Replaces the configured round count, validating the new value
///
/// The config is left untouched when validation fails.
pub fn override_rounds(config: &mut Config, rounds: u32) -> Result<(), ConfigError> {
    let mut updated = config.clone();
    updated.crawler.rounds = rounds;
    validate(&updated)?;
    *config = updated;
    Ok(())
}

/// Reads a proxy list file
pub fn load_proxy_list(path: &Path) -> Result<Vec<ProxyEndpoint>, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_proxy_list(&content)
}

/// Parses `host:port:username:password` lines
///
/// Blank lines and lines starting with `#` are skipped. The password is the
/// remainder of the line and may itself contain `:`.
pub fn parse_proxy_list(content: &str) -> Result<Vec<ProxyEndpoint>, ConfigError> {
    let mut endpoints = Vec::new();

    for (index, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let invalid = |message: String| ConfigError::InvalidProxy {
            line: index + 1,
            message,
        };

        let fields: Vec<&str> = line.splitn(4, ':').collect();
        let [host, port, username, password] = fields[..] else {
            return Err(invalid(format!(
                "expected host:port:username:password, got {} field(s)",
                fields.len()
            )));
        };

        let port = port
            .parse::<u16>()
            .map_err(|e| invalid(format!("bad port {:?}: {}", port, e)))?;

        endpoints.push(ProxyEndpoint {
            host: host.to_string(),
            port,
            username: username.to_string(),
            password: password.to_string(),
        });
    }

    Ok(endpoints)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Logged at startup so runs over the same cache can be told apart.
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let result = hasher.finalize();
    Ok(hex::encode(result))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}

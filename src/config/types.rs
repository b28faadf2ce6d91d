use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;

/// Main configuration structure for the crawler
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub proxy: ProxyConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Starting URL; also fixes the scheme and host of every crawled URL
    pub seed: String,

    /// Number of BFS rounds to run
    #[serde(default = "default_rounds")]
    pub rounds: u32,

    /// Maximum number of fetches in flight at once
    #[serde(rename = "pool-size", default = "default_pool_size")]
    pub pool_size: usize,

    /// Upper bound on one request, connect through body (seconds)
    #[serde(rename = "request-timeout-secs", default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Upper bound on establishing a connection (seconds)
    #[serde(rename = "connect-timeout-secs", default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// User-Agent header sent with every request
    #[serde(rename = "user-agent")]
    pub user_agent: Option<String>,
}

/// Locations of the two persisted stores
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Directory of compressed page bodies
    #[serde(rename = "pages-dir")]
    pub pages_dir: PathBuf,

    /// Directory of compressed link sets
    #[serde(rename = "links-dir")]
    pub links_dir: PathBuf,
}

/// Upstream proxy configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProxyConfig {
    /// Optional `host:port:username:password` list, one proxy per line
    pub file: Option<PathBuf>,

    /// Proxies declared inline
    #[serde(rename = "endpoint", default)]
    pub endpoints: Vec<ProxyEndpoint>,
}

/// A single authenticated forward proxy
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct ProxyEndpoint {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
}

impl ProxyEndpoint {
    /// Proxy URL without credentials
    pub fn url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

impl fmt::Display for ProxyEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

// Keeps passwords out of logs
impl fmt::Debug for ProxyEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyEndpoint")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

fn default_rounds() -> u32 {
    10
}

fn default_pool_size() -> usize {
    400
}

fn default_request_timeout() -> u64 {
    30
}

fn default_connect_timeout() -> u64 {
    10
}

//! Upstream proxy rotation
//!
//! Each configured proxy gets its own HTTP client, built once at startup.
//! Every fetch picks one of them uniformly at random; no per-proxy health or
//! backoff is tracked.

use crate::config::{CrawlerConfig, ProxyEndpoint};
use rand::Rng;
use reqwest::{Client, Proxy};
use std::time::Duration;

/// One outbound route: a client and a label for logging
#[derive(Debug, Clone)]
pub struct ProxyRoute {
    label: String,
    client: Client,
}

impl ProxyRoute {
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}

/// Immutable set of outbound routes
///
/// Never empty: with no proxies configured it holds a single direct route.
#[derive(Debug, Clone)]
pub struct ProxyPool {
    routes: Vec<ProxyRoute>,
}

impl ProxyPool {
    /// Builds one route per proxy endpoint, or a direct route if there are none
    ///
    /// # Arguments
    ///
    /// * `endpoints` - Proxies to route through
    /// * `config` - Supplies timeouts and the user agent
    ///
    /// # Returns
    ///
    /// * `Ok(ProxyPool)` - All clients built
    /// * `Err(reqwest::Error)` - A client or proxy URL could not be built
    pub fn new(endpoints: &[ProxyEndpoint], config: &CrawlerConfig) -> Result<Self, reqwest::Error> {
        if endpoints.is_empty() {
            tracing::warn!("No proxies configured; fetching directly");
            return Self::direct(config);
        }

        let routes = endpoints
            .iter()
            .map(|endpoint| {
                Ok(ProxyRoute {
                    label: endpoint.to_string(),
                    client: build_http_client(config, Some(endpoint))?,
                })
            })
            .collect::<Result<Vec<_>, reqwest::Error>>()?;

        tracing::info!("Proxy pool ready with {} route(s)", routes.len());
        Ok(Self { routes })
    }

    /// A pool with a single direct (unproxied) route
    pub fn direct(config: &CrawlerConfig) -> Result<Self, reqwest::Error> {
        Ok(Self {
            routes: vec![ProxyRoute {
                label: "direct".to_string(),
                client: build_http_client(config, None)?,
            }],
        })
    }

    /// Picks a route uniformly at random
    pub fn pick(&self) -> &ProxyRoute {
        let index = rand::thread_rng().gen_range(0..self.routes.len());
        &self.routes[index]
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

/// Builds an HTTP client, optionally routed through `proxy`
///
/// The proxy carries both plain-HTTP and TLS (CONNECT) traffic and is
/// authenticated with basic credentials. Without a proxy the client ignores
/// proxy environment variables.
pub fn build_http_client(
    config: &CrawlerConfig,
    proxy: Option<&ProxyEndpoint>,
) -> Result<Client, reqwest::Error> {
    let user_agent = config
        .user_agent
        .clone()
        .unwrap_or_else(|| format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")));

    let builder = Client::builder()
        .user_agent(user_agent)
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .gzip(true)
        .brotli(true);

    let builder = match proxy {
        Some(endpoint) => builder.proxy(
            Proxy::all(endpoint.url())?.basic_auth(&endpoint.username, &endpoint.password),
        ),
        None => builder.no_proxy(),
    };

    builder.build()
}

//! Maps worker indices onto a bounded set of node endpoints.
//!
//! Nodes of a local network are assumed to listen on consecutive ports, so the
//! `n`-th node is reached at the base URL with its port offset by `n`.

use std::fmt;

use url::Url;

use crate::config::ConfigError;

/// A node endpoint, immutable for the duration of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    url: Url,
}

impl Endpoint {
    /// Wraps `url` as an endpoint.
    pub const fn new(url: Url) -> Self {
        Self { url }
    }

    /// Returns the endpoint URL.
    pub const fn url(&self) -> &Url {
        &self.url
    }

    /// Returns the endpoint port, falling back to the scheme default.
    pub fn port(&self) -> Option<u16> {
        self.url.port_or_known_default()
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.url.fmt(f)
    }
}

/// Resolves a worker index to one of `max_nodes` endpoints by modulo rotation.
#[derive(Debug, Clone)]
pub struct EndpointRouter {
    base: Url,
    base_port: u16,
    max_nodes: u16,
}

impl EndpointRouter {
    /// Creates a router rotating over `max_nodes` ports starting at the port of `base`.
    pub fn new(base: Url, max_nodes: u16, field: &'static str) -> Result<Self, ConfigError> {
        if base.host().is_none() {
            return Err(ConfigError::InvalidUrl { field, reason: "missing host".to_string() });
        }
        let base_port = base
            .port_or_known_default()
            .ok_or(ConfigError::InvalidUrl { field, reason: "missing port".to_string() })?;
        if max_nodes == 0 {
            return Err(ConfigError::OutOfRange {
                field: "max-nodes",
                constraint: "greater than 0",
                value: max_nodes.to_string(),
            });
        }
        if u32::from(base_port) + u32::from(max_nodes) - 1 > u32::from(u16::MAX) {
            return Err(ConfigError::OutOfRange {
                field: "max-nodes",
                constraint: "small enough to keep every node port below 65536",
                value: max_nodes.to_string(),
            });
        }

        Ok(Self { base, base_port, max_nodes })
    }

    /// Returns the node index worker `worker` is mapped onto.
    pub const fn node_index(&self, worker: usize) -> u16 {
        (worker % self.max_nodes as usize) as u16
    }

    /// Resolves the endpoint for `worker`.
    pub fn resolve(&self, worker: usize) -> Endpoint {
        let mut url = self.base.clone();
        // The port range was checked in `new` and the host exists, so this cannot fail.
        let _ = url.set_port(Some(self.base_port + self.node_index(worker)));
        Endpoint::new(url)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn router(base: &str, max_nodes: u16) -> EndpointRouter {
        EndpointRouter::new(Url::parse(base).unwrap(), max_nodes, "node-endpoint").unwrap()
    }

    #[test]
    fn test_worker_five_of_seven_on_three_nodes() {
        let router = router("http://127.0.0.1:22000", 3);
        assert_eq!(router.node_index(5), 2);
        assert_eq!(router.resolve(5).url().as_str(), "http://127.0.0.1:22002/");
    }

    #[rstest]
    #[case::first(0, 8545)]
    #[case::second(1, 8546)]
    #[case::wraps(4, 8545)]
    #[case::wraps_again(6, 8547)]
    fn test_resolve_rotates_ports(#[case] worker: usize, #[case] port: u16) {
        let router = router("http://node.local:8545", 4);
        let endpoint = router.resolve(worker);
        assert_eq!(endpoint.port(), Some(port));
        assert_eq!(endpoint.url().host_str(), Some("node.local"));
    }

    #[test]
    fn test_single_node_always_base() {
        let router = router("http://127.0.0.1:8545", 1);
        for worker in 0..7 {
            assert_eq!(router.resolve(worker).url().as_str(), "http://127.0.0.1:8545/");
        }
    }

    #[test]
    fn test_default_port_from_scheme() {
        let router = router("http://example.com", 2);
        assert_eq!(router.resolve(1).port(), Some(81));
    }

    #[test]
    fn test_zero_nodes_rejected() {
        let result = EndpointRouter::new(Url::parse("http://127.0.0.1:8545").unwrap(), 0, "node");
        assert!(matches!(result, Err(ConfigError::OutOfRange { field: "max-nodes", .. })));
    }

    #[test]
    fn test_port_overflow_rejected() {
        let result = EndpointRouter::new(Url::parse("http://127.0.0.1:65535").unwrap(), 2, "node");
        assert!(matches!(result, Err(ConfigError::OutOfRange { .. })));
    }

    #[test]
    fn test_url_without_host_rejected() {
        let result = EndpointRouter::new(Url::parse("file:///tmp/node").unwrap(), 1, "node");
        assert!(matches!(result, Err(ConfigError::InvalidUrl { field: "node", .. })));
    }
}

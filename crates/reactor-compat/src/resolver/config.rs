//! Resolver configuration types.

use std::net::SocketAddr;
use std::time::Duration;

/// Configuration for name resolution.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Use system DNS configuration (reads /etc/resolv.conf on Unix).
    /// If false, uses custom nameservers.
    pub use_system_config: bool,

    /// Custom nameservers to use when `use_system_config` is false.
    /// Format: IP:port (e.g., "8.8.8.8:53")
    pub nameservers: Vec<SocketAddr>,

    /// Whether to read from /etc/hosts file.
    pub use_hosts_file: bool,

    /// IP version preference for lookups.
    pub ip_strategy: IpStrategy,

    /// Number of retries for failed lookups.
    pub attempts: usize,

    /// Timeout for each lookup attempt.
    pub timeout: Duration,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            use_system_config: true,
            nameservers: Vec::new(),
            use_hosts_file: true,
            ip_strategy: IpStrategy::default(),
            attempts: 2,
            timeout: Duration::from_secs(5),
        }
    }
}

impl ResolverConfig {
    /// Create a new configuration with system defaults.
    pub fn system() -> Self {
        Self::default()
    }

    /// Create a configuration with custom nameservers.
    pub fn with_nameservers(nameservers: Vec<SocketAddr>) -> Self {
        Self {
            use_system_config: false,
            nameservers,
            ..Default::default()
        }
    }

    /// Use Google's public DNS servers.
    pub fn google() -> Self {
        Self::with_nameservers(vec![
            "8.8.8.8:53".parse().expect("valid nameserver address"),
            "8.8.4.4:53".parse().expect("valid nameserver address"),
        ])
    }

    /// Use Cloudflare's public DNS servers.
    pub fn cloudflare() -> Self {
        Self::with_nameservers(vec![
            "1.1.1.1:53".parse().expect("valid nameserver address"),
            "1.0.0.1:53".parse().expect("valid nameserver address"),
        ])
    }

    /// Set whether to use the hosts file.
    pub fn use_hosts_file(mut self, use_hosts: bool) -> Self {
        self.use_hosts_file = use_hosts;
        self
    }

    /// Set the IP strategy.
    pub fn ip_strategy(mut self, strategy: IpStrategy) -> Self {
        self.ip_strategy = strategy;
        self
    }

    /// Set the number of retry attempts.
    pub fn attempts(mut self, attempts: usize) -> Self {
        self.attempts = attempts;
        self
    }

    /// Set the timeout per attempt.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// IP version lookup strategy.
///
/// Stands in for the legacy v4/v6 protocol selectors: the preference is
/// configured once on the resolver rather than per query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IpStrategy {
    /// Look up IPv4 addresses only.
    Ipv4Only,
    /// Look up IPv6 addresses only.
    Ipv6Only,
    /// Look up both IPv4 and IPv6, prefer IPv4.
    #[default]
    Ipv4ThenIpv6,
    /// Look up both IPv4 and IPv6, prefer IPv6.
    Ipv6ThenIpv4,
    /// Look up both IPv4 and IPv6 in parallel.
    Ipv4AndIpv6,
}

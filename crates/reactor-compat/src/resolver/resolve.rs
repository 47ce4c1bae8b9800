//! Resolver and query wrappers over the modern lookup primitive.

use std::net::SocketAddr;

use hickory_resolver::config::{
    LookupIpStrategy, NameServerConfig, ResolveHosts, ResolverConfig as UpstreamConfig,
    ResolverOpts,
};
use hickory_resolver::name_server::TokioConnectionProvider;
use hickory_resolver::proto::xfer::Protocol;
use hickory_resolver::{Resolver as UpstreamResolver, TokioResolver};

use crate::context::{IoContext, Work};
use crate::error::{CompatError, Result};
use crate::resolver::config::{IpStrategy, ResolverConfig};
use crate::resolver::iter::{ResolutionResults, ResolverEntry, ResolverIterator};

/// A host/service pair identifying a resolution target.
///
/// Replaces the query object removed from newer resolver APIs; it only
/// stores the two strings and hands them back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    host: String,
    service: String,
}

impl Query {
    /// Bundle a host name and a service name (or port number).
    pub fn new(host: impl Into<String>, service: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            service: service.into(),
        }
    }

    /// The host name to resolve.
    pub fn host_name(&self) -> &str {
        &self.host
    }

    /// The service name or port number to resolve.
    pub fn service_name(&self) -> &str {
        &self.service
    }
}

/// Name resolver exposing the legacy blocking and completion-based
/// entry points over the modern lookup primitive.
pub struct Resolver {
    context: IoContext,
    inner: TokioResolver,
}

impl Resolver {
    /// Create a resolver with system DNS settings, bound to the given
    /// context.
    pub fn new(context: &IoContext) -> Result<Self> {
        Self::with_config(context, ResolverConfig::system())
    }

    /// Create a resolver with the given configuration, bound to the
    /// given context.
    pub fn with_config(context: &IoContext, config: ResolverConfig) -> Result<Self> {
        let (upstream_config, opts) = build_upstream_config(&config)?;

        let inner =
            UpstreamResolver::builder_with_config(upstream_config, TokioConnectionProvider::default())
                .with_options(opts)
                .build();

        Ok(Self {
            context: context.clone(),
            inner,
        })
    }

    /// Resolve a query, blocking the calling thread until resolution
    /// completes or fails.
    ///
    /// Returns an iterator positioned at the first entry of the fresh
    /// result set.
    ///
    /// # Warning
    ///
    /// Blocks on the context's runtime; do not call from within an async
    /// task on that runtime.
    pub fn resolve(&self, query: &Query) -> Result<ResolverIterator> {
        let results = self
            .context
            .handle()
            .block_on(run_query(&self.inner, query))?;
        Ok(ResolverIterator::new(results))
    }

    /// Resolve a query without blocking the caller.
    ///
    /// The handler is invoked exactly once, on a runtime thread: with
    /// `(None, iterator)` over the fresh result set on success, or
    /// `(Some(error), ResolverIterator::end())` on failure. The handler
    /// never sees an iterator over a partially constructed set. The in-flight
    /// lookup counts as outstanding work for
    /// [`IoContext::run`](crate::IoContext::run).
    pub fn async_resolve<H>(&self, query: Query, handler: H)
    where
        H: FnOnce(Option<CompatError>, ResolverIterator) + Send + 'static,
    {
        let resolver = self.inner.clone();
        let work = Work::new(&self.context);

        self.context.handle().spawn(async move {
            match run_query(&resolver, &query).await {
                Ok(results) => handler(None, ResolverIterator::new(results)),
                Err(error) => {
                    tracing::debug!(
                        target: "reactor_compat::resolver",
                        host = %query.host_name(),
                        service = %query.service_name(),
                        %error,
                        "resolution failed"
                    );
                    handler(Some(error), ResolverIterator::end());
                }
            }
            drop(work);
        });
    }

    /// Clear the resolver's lookup cache.
    pub fn clear_cache(&self) {
        self.inner.clear_cache();
    }
}

impl std::fmt::Debug for Resolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolver").finish_non_exhaustive()
    }
}

/// Run one lookup and assemble the result set.
async fn run_query(resolver: &TokioResolver, query: &Query) -> Result<ResolutionResults> {
    let port = service_port(query.service_name())?;

    let response = resolver
        .lookup_ip(query.host_name())
        .await
        .map_err(|e| CompatError::Resolve(e.to_string()))?;

    let entries = response
        .iter()
        .map(|addr| {
            ResolverEntry::new(
                SocketAddr::new(addr, port),
                query.host_name(),
                query.service_name(),
            )
        })
        .collect();

    Ok(ResolutionResults::new(entries))
}

/// Translate a service string to a port number.
///
/// Numeric strings parse directly; a handful of well-known service names
/// are recognized. Anything else fails before any network I/O happens.
fn service_port(service: &str) -> Result<u16> {
    if let Ok(port) = service.parse::<u16>() {
        return Ok(port);
    }

    match service {
        "ftp" => Ok(21),
        "ssh" => Ok(22),
        "telnet" => Ok(23),
        "smtp" => Ok(25),
        "domain" => Ok(53),
        "http" | "ws" => Ok(80),
        "pop3" => Ok(110),
        "imap" => Ok(143),
        "https" | "wss" => Ok(443),
        _ => Err(CompatError::UnknownService(service.to_string())),
    }
}

/// Build upstream resolver configuration from our ResolverConfig.
fn build_upstream_config(config: &ResolverConfig) -> Result<(UpstreamConfig, ResolverOpts)> {
    let upstream_config = if config.use_system_config {
        UpstreamConfig::default()
    } else if config.nameservers.is_empty() {
        return Err(CompatError::ResolverConfig(
            "No nameservers configured".to_string(),
        ));
    } else {
        let mut upstream_config = UpstreamConfig::new();
        for addr in &config.nameservers {
            upstream_config.add_name_server(NameServerConfig::new(*addr, Protocol::Udp));
            upstream_config.add_name_server(NameServerConfig::new(*addr, Protocol::Tcp));
        }
        upstream_config
    };

    let mut opts = ResolverOpts::default();

    opts.use_hosts_file = if config.use_hosts_file {
        ResolveHosts::Auto
    } else {
        ResolveHosts::Never
    };
    opts.attempts = config.attempts;
    opts.timeout = config.timeout;

    opts.ip_strategy = match config.ip_strategy {
        IpStrategy::Ipv4Only => LookupIpStrategy::Ipv4Only,
        IpStrategy::Ipv6Only => LookupIpStrategy::Ipv6Only,
        IpStrategy::Ipv4ThenIpv6 => LookupIpStrategy::Ipv4thenIpv6,
        IpStrategy::Ipv6ThenIpv4 => LookupIpStrategy::Ipv6thenIpv4,
        IpStrategy::Ipv4AndIpv6 => LookupIpStrategy::Ipv4AndIpv6,
    };

    Ok((upstream_config, opts))
}

//! Resolver adapter tests.
//!
//! Resolution tests stick to `localhost` and IP literals so they pass
//! without outbound network access: the hosts file and literal parsing
//! satisfy both.

use std::net::SocketAddr;
use std::sync::mpsc;
use std::time::Duration;

use reactor_compat::{
    CompatError, IoContext, IpStrategy, Query, Resolver, ResolverConfig, ResolverIterator,
};

fn test_context() -> IoContext {
    IoContext::new().expect("Failed to create context")
}

#[test]
fn test_system_resolver_creation() {
    let context = test_context();
    let resolver = Resolver::new(&context);
    assert!(resolver.is_ok(), "Failed to create system resolver");
}

#[test]
fn test_custom_nameservers_creation() {
    let context = test_context();
    let config = ResolverConfig::with_nameservers(vec![
        "8.8.8.8:53".parse().unwrap(),
        "8.8.4.4:53".parse().unwrap(),
    ]);
    assert!(!config.use_system_config);
    assert!(Resolver::with_config(&context, config).is_ok());
}

#[test]
fn test_empty_nameservers_error() {
    let context = test_context();
    let config = ResolverConfig::with_nameservers(vec![]);
    let resolver = Resolver::with_config(&context, config);
    assert!(resolver.is_err(), "Should fail with empty nameservers");
}

#[test]
fn test_config_builder() {
    let config = ResolverConfig::cloudflare()
        .use_hosts_file(false)
        .ip_strategy(IpStrategy::Ipv4ThenIpv6)
        .attempts(3)
        .timeout(Duration::from_secs(10));

    assert!(!config.use_hosts_file);
    assert_eq!(config.ip_strategy, IpStrategy::Ipv4ThenIpv6);
    assert_eq!(config.attempts, 3);
    assert_eq!(config.timeout, Duration::from_secs(10));
}

#[test]
fn test_resolve_ip_literal() {
    let context = test_context();
    let resolver = Resolver::new(&context).expect("Failed to create resolver");

    let iter = resolver
        .resolve(&Query::new("127.0.0.1", "8080"))
        .expect("Failed to resolve IP literal");

    let endpoints: Vec<SocketAddr> = iter.map(SocketAddr::from).collect();
    assert_eq!(endpoints, vec!["127.0.0.1:8080".parse().unwrap()]);
}

#[test]
fn test_resolve_localhost() {
    let context = test_context();
    let resolver = Resolver::new(&context).expect("Failed to create resolver");

    let iter = resolver
        .resolve(&Query::new("localhost", "80"))
        .expect("Failed to resolve localhost");
    assert_ne!(iter, ResolverIterator::end(), "localhost should yield entries");

    let mut saw_loopback = false;
    for entry in iter {
        assert_eq!(entry.endpoint().port(), 80);
        assert_eq!(entry.host_name(), "localhost");
        assert_eq!(entry.service_name(), "80");
        if entry.endpoint().ip().is_loopback() {
            saw_loopback = true;
        }
    }
    assert!(saw_loopback, "localhost should resolve to a loopback address");
}

#[test]
fn test_resolve_named_service() {
    let context = test_context();
    let resolver = Resolver::new(&context).expect("Failed to create resolver");

    let iter = resolver
        .resolve(&Query::new("127.0.0.1", "https"))
        .expect("Failed to resolve with named service");
    let endpoints: Vec<SocketAddr> = iter.map(SocketAddr::from).collect();
    assert_eq!(endpoints, vec!["127.0.0.1:443".parse().unwrap()]);
}

#[test]
fn test_resolve_unknown_service_fails() {
    let context = test_context();
    let resolver = Resolver::new(&context).expect("Failed to create resolver");

    let result = resolver.resolve(&Query::new("localhost", "no-such-service"));
    assert!(matches!(result, Err(CompatError::UnknownService(_))));
}

#[test]
fn test_sync_and_async_agree() {
    let context = test_context();
    let resolver = Resolver::new(&context).expect("Failed to create resolver");
    let query = Query::new("localhost", "80");

    let sync_endpoints: Vec<SocketAddr> = resolver
        .resolve(&query)
        .expect("sync resolve failed")
        .map(SocketAddr::from)
        .collect();

    let (tx, rx) = mpsc::channel();
    resolver.async_resolve(query, move |err, iter| {
        tx.send((err, iter)).expect("test channel closed");
    });

    let (err, iter) = rx
        .recv_timeout(Duration::from_secs(30))
        .expect("async handler never ran");
    assert!(err.is_none(), "async resolve failed: {err:?}");

    let async_endpoints: Vec<SocketAddr> = iter.map(SocketAddr::from).collect();
    assert_eq!(
        sync_endpoints, async_endpoints,
        "sync and async paths must yield the same endpoints in the same order"
    );
    context.run();
}

#[test]
fn test_async_resolve_failure_yields_end_iterator() {
    let context = test_context();
    let resolver = Resolver::new(&context).expect("Failed to create resolver");

    let (tx, rx) = mpsc::channel();
    resolver.async_resolve(Query::new("localhost", "no-such-service"), move |err, iter| {
        tx.send((err, iter)).expect("test channel closed");
    });

    let (err, iter) = rx
        .recv_timeout(Duration::from_secs(30))
        .expect("async handler never ran");
    assert!(
        matches!(err, Some(CompatError::UnknownService(_))),
        "handler should receive the failure"
    );
    assert_eq!(
        iter,
        ResolverIterator::end(),
        "a failed resolve must hand the handler an end iterator"
    );
    context.run();
}

#[test]
fn test_async_resolve_counts_as_outstanding_work() {
    let context = test_context();
    let resolver = Resolver::new(&context).expect("Failed to create resolver");

    let (tx, rx) = mpsc::channel();
    resolver.async_resolve(Query::new("127.0.0.1", "80"), move |err, iter| {
        tx.send((err, iter)).expect("test channel closed");
    });

    // run() must not return before the completion handler has fired.
    context.run();
    assert!(
        rx.try_recv().is_ok(),
        "handler should have completed before run returned"
    );
}

#[test]
fn test_iterators_from_separate_resolves_never_equal() {
    let context = test_context();
    let resolver = Resolver::new(&context).expect("Failed to create resolver");
    let query = Query::new("127.0.0.1", "80");

    let a = resolver.resolve(&query).expect("first resolve failed");
    let b = resolver.resolve(&query).expect("second resolve failed");

    assert_eq!(a.clone().next(), b.clone().next(), "entries are identical");
    assert_ne!(
        a, b,
        "live iterators from separate resolve calls must not compare equal"
    );
}

#[test]
fn test_query_clone_roundtrip() {
    let query = Query::new("example.com", "443");
    let copy = query.clone();
    assert_eq!(query, copy);
    assert_eq!(copy.host_name(), "example.com");
    assert_eq!(copy.service_name(), "443");
}

//! Legacy-shaped iteration over move-only resolution results.
//!
//! The modern lookup primitive returns one [`ResolutionResults`] per
//! call: an ordered, finite, move-only sequence with no free-standing
//! "end" value. Legacy callers instead pass around copyable iterators and
//! compare against a default-constructed end iterator. The bridge is a
//! shared-ownership handle plus an explicit exhaustion flag:
//!
//! - copies of a [`ResolverIterator`] share the result set through an
//!   `Arc` and advance independently
//! - "am I done" is a cached flag on the iterator, decoupled from any
//!   stored end position, so a default-constructed iterator can serve as
//!   the end value for every result set

use std::net::SocketAddr;
use std::sync::Arc;

/// A single resolved entry: a concrete endpoint plus the names it was
/// resolved from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverEntry {
    endpoint: SocketAddr,
    host_name: String,
    service_name: String,
}

impl ResolverEntry {
    pub(crate) fn new(
        endpoint: SocketAddr,
        host_name: impl Into<String>,
        service_name: impl Into<String>,
    ) -> Self {
        Self {
            endpoint,
            host_name: host_name.into(),
            service_name: service_name.into(),
        }
    }

    /// The resolved endpoint.
    pub fn endpoint(&self) -> SocketAddr {
        self.endpoint
    }

    /// The host name this entry was resolved from.
    pub fn host_name(&self) -> &str {
        &self.host_name
    }

    /// The service name this entry was resolved from.
    pub fn service_name(&self) -> &str {
        &self.service_name
    }
}

impl From<ResolverEntry> for SocketAddr {
    fn from(entry: ResolverEntry) -> Self {
        entry.endpoint
    }
}

impl From<&ResolverEntry> for SocketAddr {
    fn from(entry: &ResolverEntry) -> Self {
        entry.endpoint
    }
}

/// The ordered result set produced by a single resolve call.
///
/// Deliberately not `Clone`: a set is produced once and then shared via
/// the reference-counted handle inside [`ResolverIterator`]. It is
/// destroyed when the last iterator referencing it is dropped.
#[derive(Debug)]
pub struct ResolutionResults {
    entries: Vec<ResolverEntry>,
}

impl ResolutionResults {
    pub(crate) fn new(entries: Vec<ResolverEntry>) -> Self {
        Self { entries }
    }

    /// Number of entries in the set.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the set holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn get(&self, index: usize) -> Option<&ResolverEntry> {
        self.entries.get(index)
    }
}

/// A copyable forward cursor over a [`ResolutionResults`] set, or the
/// distinguished end value.
///
/// # Equality policy
///
/// Two iterators are equal iff:
///
/// - both are exhausted, regardless of which set (if any) they
///   reference; or
/// - neither is exhausted, both reference the *same* result-set
///   allocation, and their cursors coincide.
///
/// Non-exhausted iterators over different result sets are never equal,
/// even when the entries they currently point at are identical. Two
/// resolve calls for the same query therefore produce iterators that
/// compare unequal until both are exhausted. This mirrors the historical
/// behavior of the surface being emulated; positions in distinct
/// containers were never comparable.
#[derive(Debug, Clone)]
pub struct ResolverIterator {
    results: Option<Arc<ResolutionResults>>,
    cursor: usize,
    exhausted: bool,
}

impl ResolverIterator {
    /// The exhausted ("end") iterator. Owns no result set.
    pub fn end() -> Self {
        Self {
            results: None,
            cursor: 0,
            exhausted: true,
        }
    }

    /// Take shared ownership of a fresh result set, positioned at its
    /// first entry. Immediately exhausted if the set is empty.
    pub fn new(results: ResolutionResults) -> Self {
        let exhausted = results.is_empty();
        Self {
            results: Some(Arc::new(results)),
            cursor: 0,
            exhausted,
        }
    }

    /// The entry at the current position, or `None` once exhausted.
    pub fn entry(&self) -> Option<&ResolverEntry> {
        if self.exhausted {
            return None;
        }
        self.results.as_ref().and_then(|results| results.get(self.cursor))
    }

    /// The endpoint at the current position, or `None` once exhausted.
    pub fn endpoint(&self) -> Option<SocketAddr> {
        self.entry().map(ResolverEntry::endpoint)
    }

    /// Move to the next entry. A no-op once exhausted; advancing past
    /// the last entry marks the iterator exhausted.
    pub fn advance(&mut self) {
        if self.exhausted {
            return;
        }
        self.cursor += 1;
        let len = self.results.as_ref().map_or(0, |results| results.len());
        if self.cursor >= len {
            self.exhausted = true;
        }
    }

    /// Whether this iterator has reached the end of its set (or never
    /// had one).
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }
}

impl Default for ResolverIterator {
    /// Equivalent to [`ResolverIterator::end`].
    fn default() -> Self {
        Self::end()
    }
}

impl PartialEq for ResolverIterator {
    fn eq(&self, other: &Self) -> bool {
        if self.exhausted && other.exhausted {
            return true;
        }
        if self.exhausted != other.exhausted {
            return false;
        }
        match (&self.results, &other.results) {
            (Some(a), Some(b)) if Arc::ptr_eq(a, b) => self.cursor == other.cursor,
            _ => false,
        }
    }
}

impl Eq for ResolverIterator {}

impl Iterator for ResolverIterator {
    type Item = ResolverEntry;

    fn next(&mut self) -> Option<ResolverEntry> {
        let entry = self.entry()?.clone();
        self.advance();
        Some(entry)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.exhausted {
            return (0, Some(0));
        }
        let remaining = self
            .results
            .as_ref()
            .map_or(0, |results| results.len() - self.cursor);
        (remaining, Some(remaining))
    }
}

//! Name-resolution compatibility adapter.
//!
//! The modern resolver hands back a move-only set of results per lookup;
//! older calling code expects a copyable, default-constructible forward
//! iterator with a single "end" value. This module rebuilds the legacy
//! shape on top of the modern one:
//!
//! - [`Query`] bundles a host/service pair, replacing the removed legacy
//!   query object
//! - [`ResolverIterator`] presents a copyable cursor over a shared,
//!   move-only [`ResolutionResults`] set
//! - [`Resolver`] exposes blocking `resolve` and completion-based
//!   `async_resolve` over the same lookup path
//!
//! # Example
//!
//! ```ignore
//! use reactor_compat::{IoContext, Query, Resolver};
//!
//! let context = IoContext::new()?;
//! let resolver = Resolver::new(&context)?;
//!
//! // Blocking resolution
//! for entry in resolver.resolve(&Query::new("localhost", "80"))? {
//!     println!("resolved: {}", entry.endpoint());
//! }
//!
//! // Completion-based resolution
//! resolver.async_resolve(Query::new("localhost", "80"), |err, iter| {
//!     match err {
//!         None => println!("got {} entries", iter.count()),
//!         Some(e) => println!("lookup failed: {e}"),
//!     }
//! });
//! context.run();
//! ```

mod config;
mod iter;
mod resolve;

pub use config::{IpStrategy, ResolverConfig};
pub use iter::{ResolutionResults, ResolverEntry, ResolverIterator};
pub use resolve::{Query, Resolver};

//! Version-compatibility layer between a networking stack and its
//! asynchronous I/O runtime.
//!
//! The runtime this crate sits on evolved its API across major versions:
//! object/iterator-based name resolution and legacy context operations
//! gave way to move-only result sets, free-function scheduling, and
//! renamed primitives. This crate exposes one stable, legacy-shaped
//! surface regardless of those changes:
//!
//! - **Resolver**: [`Resolver`] with blocking `resolve` and
//!   completion-based `async_resolve`, the [`Query`] host/service pair,
//!   and the copyable [`ResolverIterator`] rebuilt over move-only
//!   results
//! - **Timer**: [`SteadyTimer`] with a signed `expires_from_now`
//!   remainder, plus the [`is_neg`]/[`milliseconds`] duration
//!   normalization helpers
//! - **Execution context**: [`IoContext`] with `post`/`run`/`stop`/
//!   `reset`, the [`Strand`] serialization domain, and the [`Work`]
//!   keep-alive token
//! - **Pass-through**: socket, acceptor, endpoint, and error-code
//!   aliases in [`net`]
//!
//! # Example
//!
//! ```no_run
//! use reactor_compat::{IoContext, Query, Resolver};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let context = IoContext::new()?;
//!     let resolver = Resolver::new(&context)?;
//!
//!     resolver.async_resolve(Query::new("localhost", "80"), |err, entries| {
//!         match err {
//!             None => {
//!                 for entry in entries {
//!                     println!("resolved: {}", entry.endpoint());
//!                 }
//!             }
//!             Some(e) => eprintln!("lookup failed: {e}"),
//!         }
//!     });
//!
//!     context.run();
//!     Ok(())
//! }
//! ```
//!
//! # Logging
//!
//! Instrumented with the `tracing` crate under the
//! `reactor_compat::resolver`, `reactor_compat::timer`, and
//! `reactor_compat::context` targets. Install a subscriber in your
//! application to see logs:
//!
//! ```ignore
//! tracing_subscriber::fmt::init();
//! ```

pub mod clock;
mod context;
mod error;
pub mod net;
pub mod resolver;
mod timer;

pub use clock::{TimerDuration, is_neg, milliseconds};
pub use context::{ContextConfig, IoContext, Strand, Work};
pub use error::{CompatError, Result};
pub use net::{Acceptor, Endpoint, ErrorCode, Socket};
pub use resolver::{
    IpStrategy, Query, ResolutionResults, Resolver, ResolverConfig, ResolverEntry,
    ResolverIterator,
};
pub use timer::SteadyTimer;

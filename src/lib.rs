//! snipreg - a strict, deterministic snippet registry
//!
//! A record store for versioned, forkable, content-addressed code snippets
//! with reputation-weighted voting, threaded comments and reviewer
//! coordination. Every operation validates first and then applies all of its
//! writes, so a rejected operation leaves no trace.
//!
//! ```ignore
//! use snipreg::registry::{ActorId, Registry, RegistrySettings};
//!
//! let mut registry: Registry = Registry::new(RegistrySettings::new("admin"));
//! ```

pub mod cli;
pub mod comments;
pub mod config;
pub mod events;
pub mod observability;
pub mod oracle;
pub mod registry;
pub mod review;
pub mod snapshot;
pub mod votes;

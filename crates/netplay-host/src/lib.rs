//! Host-role peer registry for Netplay.
//!
//! When a session is started as host, the coordinator owns a
//! [`HostRegistry`]: the collection of connected remote peers. A
//! background task accepts inbound connections and hands them to the
//! owner thread through a channel; everything else — peer admission,
//! handshake completion, broadcasting, pruning — happens inside
//! [`HostRegistry::update`] on the owner's update cycle.
//!
//! # Key types
//!
//! - [`HostRegistry`] — owns all remote peers, accepts and broadcasts
//! - [`RegistryFactory`] — pluggable registry construction strategy
//! - [`RegistryError`] — why a joining peer was rejected

mod error;
mod factory;
mod registry;

pub use error::RegistryError;
pub use factory::{DefaultRegistryFactory, RegistryFactory};
pub use registry::HostRegistry;

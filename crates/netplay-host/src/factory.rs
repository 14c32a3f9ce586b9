//! Pluggable registry construction.

use std::sync::Arc;

use netplay_peer::PeerFactory;
use tokio::runtime::Handle;

use crate::HostRegistry;

/// Strategy for constructing the host registry.
///
/// The coordinator requires one of these before a session can start;
/// custom variants can pre-register peers, wrap admission policy, or
/// listen somewhere other than the configured port.
pub trait RegistryFactory: Send + Sync {
    /// Builds the registry for a host-role session.
    fn create(
        &self,
        port: u16,
        version: u16,
        peer_factory: Arc<dyn PeerFactory>,
        io: &Handle,
    ) -> HostRegistry;
}

/// The default strategy: listen on the configured port.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultRegistryFactory;

impl RegistryFactory for DefaultRegistryFactory {
    fn create(
        &self,
        port: u16,
        version: u16,
        peer_factory: Arc<dyn PeerFactory>,
        io: &Handle,
    ) -> HostRegistry {
        HostRegistry::bind(port, version, peer_factory, io)
    }
}

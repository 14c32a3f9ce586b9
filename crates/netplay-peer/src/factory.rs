//! Pluggable peer construction.
//!
//! The original design stored a function pointer for this; a trait with a
//! single construction method supports custom peer setups (pre-attached
//! handlers, extra bookkeeping) just as well and composes cleanly with
//! the registry's factory.

use netplay_protocol::PeerKey;

use crate::Peer;

/// Strategy for constructing peers.
///
/// The coordinator uses this for the local peer at session start; the
/// host registry uses it for every accepted remote peer.
pub trait PeerFactory: Send + Sync {
    /// Builds a peer carrying the given key.
    fn create(&self, key: PeerKey) -> Peer;
}

/// The default strategy: a plain [`Peer::new`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultPeerFactory;

impl PeerFactory for DefaultPeerFactory {
    fn create(&self, key: PeerKey) -> Peer {
        Peer::new(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_factory_builds_bare_peer() {
        let peer = DefaultPeerFactory.create(PeerKey(9));
        assert_eq!(peer.key(), PeerKey(9));
        assert!(!peer.is_connected());
        assert!(!peer.is_synchronized());
    }

    /// A custom factory that pre-marks peers synchronized.
    struct TrustedFactory;

    impl PeerFactory for TrustedFactory {
        fn create(&self, key: PeerKey) -> Peer {
            let mut peer = Peer::new(key);
            peer.mark_synchronized();
            peer
        }
    }

    #[test]
    fn test_custom_factory_is_usable_through_the_trait() {
        let factory: Box<dyn PeerFactory> = Box::new(TrustedFactory);
        assert!(factory.create(PeerKey(1)).is_synchronized());
    }
}

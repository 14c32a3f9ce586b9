//! Peer addressing types.

use serde::{Deserialize, Serialize};

use std::fmt;

/// A peer's stable identifier within a session.
///
/// Real peers are keyed in the inclusive range `[MIN_ASSIGNED, i32::MAX]`.
/// The negative values are reserved logical addresses that let application
/// code say "the server", "myself", "everyone", or "everyone past initial
/// sync" without knowing the concrete peer topology or role.
///
/// `#[serde(transparent)]` keeps the wire shape a plain number, so a
/// `PeerKey(42)` serializes as `42` inside application payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PeerKey(pub i32);

impl PeerKey {
    /// Every connected peer (host role broadcasts; a lone client reaches
    /// only itself).
    pub const ALL: PeerKey = PeerKey(-1);
    /// The authoritative host, wherever it is.
    pub const SERVER: PeerKey = PeerKey(-2);
    /// The local participant.
    pub const SELF: PeerKey = PeerKey(-3);
    /// Every peer that has completed its initial synchronization
    /// (host role only).
    pub const SYNCHRONIZED: PeerKey = PeerKey(-4);

    /// The smallest key a real peer may carry.
    pub const MIN_ASSIGNED: i32 = 1;

    /// Returns `true` for the reserved logical addresses.
    pub fn is_reserved(self) -> bool {
        self.0 < Self::MIN_ASSIGNED
    }
}

impl fmt::Display for PeerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "peer-{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peer_key_serializes_as_plain_number() {
        let json = serde_json::to_string(&PeerKey(42)).unwrap();
        assert_eq!(json, "42");
    }

    #[test]
    fn test_peer_key_deserializes_from_plain_number() {
        let key: PeerKey = serde_json::from_str("42").unwrap();
        assert_eq!(key, PeerKey(42));
    }

    #[test]
    fn test_peer_key_display() {
        assert_eq!(PeerKey(7).to_string(), "peer-7");
    }

    #[test]
    fn test_reserved_keys_are_distinct() {
        let reserved = [
            PeerKey::ALL,
            PeerKey::SERVER,
            PeerKey::SELF,
            PeerKey::SYNCHRONIZED,
        ];
        for (i, a) in reserved.iter().enumerate() {
            for b in &reserved[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_reserved_keys_are_disjoint_from_assigned_range() {
        for key in [
            PeerKey::ALL,
            PeerKey::SERVER,
            PeerKey::SELF,
            PeerKey::SYNCHRONIZED,
        ] {
            assert!(key.is_reserved());
            assert!(key.0 < PeerKey::MIN_ASSIGNED);
        }
        assert!(!PeerKey(PeerKey::MIN_ASSIGNED).is_reserved());
        assert!(!PeerKey(i32::MAX).is_reserved());
    }
}

//! The registry of connected remote peers.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, OnceLock};

use netplay_crypto::{Cipher, SessionKeys};
use netplay_peer::{Peer, PeerFactory};
use netplay_protocol::{Packet, PacketReader, PeerKey};
use netplay_transport::{Transport, WebSocketConnection, WebSocketTransport};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::RegistryError;

/// Owns every remote peer of a host-role session.
///
/// Not internally synchronized: a single owner thread drives it through
/// [`update`](Self::update), and the accept task only ever touches the
/// admission channel.
pub struct HostRegistry {
    peers: HashMap<PeerKey, Peer>,
    accepted: mpsc::UnboundedReceiver<WebSocketConnection>,
    peer_factory: Arc<dyn PeerFactory>,
    io: Handle,
    version: u16,
    next_key: i32,
    local_addr: Arc<OnceLock<SocketAddr>>,
    accept_task: JoinHandle<()>,
}

impl HostRegistry {
    /// Starts listening on `port` (0 picks a free port) and returns the
    /// registry.
    ///
    /// Binding and accepting run on a background task so this never
    /// suspends; accepted connections surface on the next
    /// [`update`](Self::update). A bind failure is logged and leaves the
    /// registry permanently empty.
    pub fn bind(
        port: u16,
        version: u16,
        peer_factory: Arc<dyn PeerFactory>,
        io: &Handle,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let local_addr = Arc::new(OnceLock::new());
        let addr_slot = Arc::clone(&local_addr);
        let accept_task = io.spawn(async move {
            let bind_addr = format!("0.0.0.0:{port}");
            let mut transport =
                match WebSocketTransport::bind(&bind_addr).await {
                    Ok(transport) => transport,
                    Err(e) => {
                        tracing::error!(
                            addr = %bind_addr,
                            error = %e,
                            "host bind failed"
                        );
                        return;
                    }
                };
            if let Ok(addr) = transport.local_addr() {
                let _ = addr_slot.set(addr);
            }
            loop {
                match transport.accept().await {
                    Ok(conn) => {
                        if tx.send(conn).is_err() {
                            break; // registry dropped
                        }
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "accept failed");
                    }
                }
            }
        });

        Self {
            peers: HashMap::new(),
            accepted: rx,
            peer_factory,
            io: io.clone(),
            version,
            next_key: PeerKey::MIN_ASSIGNED,
            local_addr,
            accept_task,
        }
    }

    /// The address the listener actually bound to, once known.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr.get().copied()
    }

    /// Admits newly accepted connections, pumps every peer's inbound
    /// path, completes pending handshakes, and prunes dead peers.
    /// Called once per tick by the session coordinator.
    pub fn update(&mut self) {
        while let Ok(conn) = self.accepted.try_recv() {
            let key = self.allocate_key();
            let mut peer = self.peer_factory.create(key);
            peer.attach_connection(conn, &self.io);
            peer.start(&self.io);
            tracing::info!(%key, "peer connected");
            self.peers.insert(key, peer);
        }

        let mut dead = Vec::new();
        for (key, peer) in &mut self.peers {
            // The handshake must come off the wire before the bulk
            // drain: the joiner's writes are not tick-gated, so frames
            // queued behind the handshake in the same tick are already
            // encrypted and need the cipher attached first.
            if !peer.has_cipher() {
                if let Some(frame) = peer.poll_frame() {
                    let result = Packet::decode(&frame)
                        .map_err(RegistryError::from)
                        .and_then(|packet| {
                            complete_handshake(peer, &packet, self.version)
                        });
                    match result {
                        Ok(()) => {
                            tracing::info!(%key, "peer synchronized");
                        }
                        Err(e) => {
                            tracing::warn!(
                                %key,
                                error = %e,
                                "rejecting peer"
                            );
                            dead.push(*key);
                            continue;
                        }
                    }
                }
            }
            // Only ciphered peers are bulk-pumped; frames that arrive
            // before the handshake completes wait in the channel.
            if peer.has_cipher() {
                peer.update();
            }
            if peer.is_closed() {
                dead.push(*key);
            }
        }
        for key in dead {
            if self.peers.remove(&key).is_some() {
                tracing::info!(%key, "peer removed");
            }
        }
    }

    /// Registers an externally constructed peer under its own key.
    ///
    /// Used by custom registry factories that admit peers through some
    /// other channel, and by tests.
    pub fn add_peer(&mut self, peer: Peer) {
        self.peers.insert(peer.key(), peer);
    }

    /// Broadcasts a packet to every registry member.
    pub fn send_all(&mut self, packet: &Packet) {
        for peer in self.peers.values_mut() {
            if let Err(e) = peer.write(packet) {
                tracing::debug!(error = %e, "dropped broadcast");
            }
        }
    }

    /// Broadcasts a packet to members flagged synchronized only.
    pub fn send_synchronized(&mut self, packet: &Packet) {
        for peer in self.peers.values_mut() {
            if !peer.is_synchronized() {
                continue;
            }
            if let Err(e) = peer.write(packet) {
                tracing::debug!(error = %e, "dropped broadcast");
            }
        }
    }

    /// Looks up a member by key.
    pub fn peer(&self, key: PeerKey) -> Option<&Peer> {
        self.peers.get(&key)
    }

    /// Looks up a member by key, mutably.
    pub fn peer_mut(&mut self, key: PeerKey) -> Option<&mut Peer> {
        self.peers.get_mut(&key)
    }

    /// Number of connected members.
    pub fn len(&self) -> usize {
        self.peers.len()
    }

    /// Whether no members are connected.
    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    /// The keys of all current members.
    pub fn peer_keys(&self) -> Vec<PeerKey> {
        self.peers.keys().copied().collect()
    }

    fn allocate_key(&mut self) -> PeerKey {
        let key = PeerKey(self.next_key);
        self.next_key += 1;
        key
    }
}

impl Drop for HostRegistry {
    fn drop(&mut self) {
        self.accept_task.abort();
    }
}

/// Validates a joining peer's handshake and installs the inverse cipher.
///
/// The joining side disclosed its own key material, so this side uses the
/// mirror image: it encrypts with what the joiner decrypts, and vice
/// versa. Completing the handshake also marks the peer synchronized.
fn complete_handshake(
    peer: &mut Peer,
    packet: &Packet,
    expected_version: u16,
) -> Result<(), RegistryError> {
    if !packet.is_handshake() {
        return Err(RegistryError::UnexpectedPacket(packet.opcode));
    }
    if packet.version != expected_version {
        return Err(RegistryError::VersionMismatch {
            expected: expected_version,
            actual: packet.version,
        });
    }

    let mut reader = PacketReader::new(&packet.payload);
    let dec_key = reader.read_field()?;
    let enc_key = reader.read_field()?;
    let dec_iv = reader.read_field()?;
    let enc_iv = reader.read_field()?;
    let keys = SessionKeys::from_fields(dec_key, enc_key, dec_iv, enc_iv)?;

    peer.attach_cipher(Cipher::from_keys(&keys.mirrored()));
    peer.mark_synchronized();
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use netplay_peer::DefaultPeerFactory;
    use netplay_protocol::OP_HANDSHAKE;
    use netplay_transport::Connection;

    use super::*;

    const VERSION: u16 = 1;
    const OP_APP: u16 = 7;

    fn test_registry() -> HostRegistry {
        HostRegistry::bind(
            0,
            VERSION,
            Arc::new(DefaultPeerFactory),
            &Handle::current(),
        )
    }

    /// A peer whose outbound frames land on an inspectable channel.
    fn channel_peer(
        key: i32,
        synchronized: bool,
    ) -> (Peer, mpsc::UnboundedReceiver<Vec<u8>>) {
        let mut peer = Peer::new(PeerKey(key));
        let (tx, rx) = mpsc::unbounded_channel();
        peer.attach_outbound(tx);
        if synchronized {
            peer.mark_synchronized();
        }
        (peer, rx)
    }

    fn handshake_packet(keys: &SessionKeys) -> Packet {
        let mut packet = Packet::new(VERSION, OP_HANDSHAKE);
        packet.put_bytes(&keys.dec_key);
        packet.put_bytes(&keys.enc_key);
        packet.put_bytes(&keys.dec_iv);
        packet.put_bytes(&keys.enc_iv);
        packet
    }

    #[tokio::test]
    async fn test_send_all_reaches_every_member() {
        let mut registry = test_registry();
        let (a, mut rx_a) = channel_peer(1, true);
        let (b, mut rx_b) = channel_peer(2, false);
        registry.add_peer(a);
        registry.add_peer(b);

        registry.send_all(&Packet::new(VERSION, OP_APP));
        assert!(rx_a.try_recv().is_ok());
        assert!(rx_b.try_recv().is_ok());
    }

    #[tokio::test]
    async fn test_send_synchronized_skips_unsynchronized_members() {
        let mut registry = test_registry();
        let (a, mut rx_a) = channel_peer(1, true);
        let (b, mut rx_b) = channel_peer(2, false);
        registry.add_peer(a);
        registry.add_peer(b);

        registry.send_synchronized(&Packet::new(VERSION, OP_APP));
        assert!(rx_a.try_recv().is_ok());
        assert!(rx_b.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_handshake_installs_mirrored_cipher() {
        let mut registry = test_registry();
        let (mut peer, _rx) = channel_peer(1, false);
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        peer.attach_inbound(inbound_rx);
        registry.add_peer(peer);

        let keys = SessionKeys::generate();
        inbound_tx.send(handshake_packet(&keys).encode()).unwrap();

        registry.update();
        let peer = registry.peer(PeerKey(1)).expect("peer kept");
        assert!(peer.has_cipher());
        assert!(peer.is_synchronized());
    }

    #[tokio::test]
    async fn test_frames_behind_handshake_decrypt_in_same_tick() {
        let mut registry = test_registry();
        let (mut peer, _rx) = channel_peer(1, false);
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        peer.attach_inbound(inbound_rx);
        registry.add_peer(peer);

        let keys = SessionKeys::generate();
        inbound_tx.send(handshake_packet(&keys).encode()).unwrap();

        // The joiner's next write is not tick-gated, so an encrypted
        // application frame can land in the same drain as the handshake.
        let mut joiner = Cipher::from_keys(&keys);
        let mut packet = Packet::new(VERSION, OP_APP);
        packet.put_bytes(b"hello host");
        let mut wire = packet.clone();
        joiner.encrypt(&mut wire.payload);
        inbound_tx.send(wire.encode()).unwrap();

        registry.update();
        let peer = registry.peer_mut(PeerKey(1)).expect("peer kept");
        assert!(peer.has_cipher());
        assert_eq!(peer.poll_received(), Some(packet));
    }

    #[tokio::test]
    async fn test_version_mismatch_rejects_peer() {
        let mut registry = test_registry();
        let (mut peer, _rx) = channel_peer(1, false);
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        peer.attach_inbound(inbound_rx);
        registry.add_peer(peer);

        let keys = SessionKeys::generate();
        let mut handshake = handshake_packet(&keys);
        handshake.version = VERSION + 1;
        inbound_tx.send(handshake.encode()).unwrap();

        registry.update();
        assert!(registry.peer(PeerKey(1)).is_none());
    }

    #[tokio::test]
    async fn test_non_handshake_first_packet_rejects_peer() {
        let mut registry = test_registry();
        let (mut peer, _rx) = channel_peer(1, false);
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        peer.attach_inbound(inbound_rx);
        registry.add_peer(peer);

        inbound_tx
            .send(Packet::new(VERSION, OP_APP).encode())
            .unwrap();

        registry.update();
        assert!(registry.peer(PeerKey(1)).is_none());
    }

    #[tokio::test]
    async fn test_accepts_real_connection_and_completes_handshake() {
        let mut registry = test_registry();

        // Wait for the background bind to publish the listen address.
        let mut addr = None;
        for _ in 0..200 {
            if let Some(a) = registry.local_addr() {
                addr = Some(a);
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        let addr = addr.expect("listener bound");

        let conn = WebSocketConnection::connect(&addr.to_string())
            .await
            .expect("connect");
        let keys = SessionKeys::generate();
        conn.send(&handshake_packet(&keys).encode())
            .await
            .expect("send handshake");

        let mut synchronized = false;
        for _ in 0..200 {
            registry.update();
            if registry.len() == 1 {
                let key = registry.peer_keys()[0];
                if registry.peer(key).is_some_and(Peer::is_synchronized) {
                    synchronized = true;
                    break;
                }
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(synchronized, "accepted peer never synchronized");
    }
}

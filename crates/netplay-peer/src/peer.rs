//! Peer state and message paths.

use std::collections::VecDeque;

use netplay_crypto::Cipher;
use netplay_protocol::{Packet, PeerKey};
use netplay_transport::{Connection, WebSocketConnection};
use tokio::runtime::Handle;
use tokio::sync::mpsc;

use crate::PeerError;

/// One participant in a session.
///
/// A peer's transport wiring is a pair of channels drained by background
/// tasks: outbound frames flow through an unbounded sender to a writer
/// task that owns the socket sink, and inbound frames flow from a reader
/// task into a receiver drained by [`update`](Self::update) on the owner
/// thread. The channels are FIFO, which is what guarantees the handshake
/// is the first frame on a fresh connection: it is enqueued before the
/// read loop starts and before any application traffic.
///
/// The local peer in host role has no connection at all — host-role local
/// participation is a direct in-process call through
/// [`receive`](Self::receive).
pub struct Peer {
    key: PeerKey,
    synchronized: bool,
    cipher: Option<Cipher>,
    connection: Option<WebSocketConnection>,
    outbound: Option<mpsc::UnboundedSender<Vec<u8>>>,
    inbound: Option<mpsc::UnboundedReceiver<Vec<u8>>>,
    received: VecDeque<Packet>,
}

impl Peer {
    /// Creates a peer with the given key and nothing attached.
    pub fn new(key: PeerKey) -> Self {
        Self {
            key,
            synchronized: false,
            cipher: None,
            connection: None,
            outbound: None,
            inbound: None,
            received: VecDeque::new(),
        }
    }

    /// The peer's stable identifying key.
    pub fn key(&self) -> PeerKey {
        self.key
    }

    /// Whether this peer has completed its initial synchronization.
    pub fn is_synchronized(&self) -> bool {
        self.synchronized
    }

    /// Marks the peer synchronized, making it a broadcast target for
    /// synchronized-only traffic.
    pub fn mark_synchronized(&mut self) {
        self.synchronized = true;
    }

    /// Whether a session cipher has been installed.
    pub fn has_cipher(&self) -> bool {
        self.cipher.is_some()
    }

    /// Installs the session cipher. Subsequent non-handshake writes and
    /// reads are encrypted/decrypted with it.
    pub fn attach_cipher(&mut self, cipher: Cipher) {
        self.cipher = Some(cipher);
    }

    /// Whether an outbound path is attached.
    pub fn is_connected(&self) -> bool {
        self.outbound.is_some()
    }

    /// Whether the attached outbound path has gone away (the writer task
    /// ended, usually because the socket closed).
    pub fn is_closed(&self) -> bool {
        self.outbound.as_ref().is_some_and(|tx| tx.is_closed())
    }

    /// Wires an outbound frame sink directly.
    ///
    /// [`attach_connection`](Self::attach_connection) uses this
    /// internally; custom transports and tests can use it to observe or
    /// inject the outbound path without a socket.
    pub fn attach_outbound(&mut self, sink: mpsc::UnboundedSender<Vec<u8>>) {
        self.outbound = Some(sink);
    }

    /// Wires an inbound frame source directly.
    ///
    /// [`start`](Self::start) uses this internally; custom transports and
    /// tests can use it to feed frames without a socket.
    pub fn attach_inbound(
        &mut self,
        source: mpsc::UnboundedReceiver<Vec<u8>>,
    ) {
        self.inbound = Some(source);
    }

    /// Attaches a live connection and spawns its writer task.
    ///
    /// The read loop is *not* started here; call [`start`](Self::start)
    /// once any initial traffic (the handshake) has been enqueued.
    pub fn attach_connection(
        &mut self,
        conn: WebSocketConnection,
        io: &Handle,
    ) {
        let (tx, mut rx) = mpsc::unbounded_channel::<Vec<u8>>();
        let writer = conn.clone();
        let key = self.key;
        io.spawn(async move {
            while let Some(frame) = rx.recv().await {
                if let Err(e) = writer.send(&frame).await {
                    tracing::debug!(%key, error = %e, "peer write failed");
                    break;
                }
            }
        });
        self.connection = Some(conn);
        self.attach_outbound(tx);
    }

    /// Starts the steady-state read loop on the attached connection.
    pub fn start(&mut self, io: &Handle) {
        let Some(conn) = self.connection.clone() else {
            return;
        };
        let (tx, rx) = mpsc::unbounded_channel();
        let key = self.key;
        io.spawn(async move {
            loop {
                match conn.recv().await {
                    Ok(Some(frame)) => {
                        if tx.send(frame).is_err() {
                            break;
                        }
                    }
                    Ok(None) => {
                        tracing::debug!(%key, "peer connection closed");
                        break;
                    }
                    Err(e) => {
                        tracing::debug!(%key, error = %e, "peer read failed");
                        break;
                    }
                }
            }
        });
        self.attach_inbound(rx);
    }

    /// Writes a packet over the peer's connection.
    ///
    /// The payload is encrypted when a cipher is attached, except for the
    /// handshake packet — it must cross the wire in plaintext because the
    /// remote side has no key material yet.
    pub fn write(&mut self, packet: &Packet) -> Result<(), PeerError> {
        let Some(outbound) = &self.outbound else {
            return Err(PeerError::NotConnected(self.key));
        };
        let mut outgoing = packet.clone();
        if !outgoing.is_handshake() {
            if let Some(cipher) = &mut self.cipher {
                cipher.encrypt(&mut outgoing.payload);
            }
        }
        outbound
            .send(outgoing.encode())
            .map_err(|_| PeerError::Disconnected(self.key))
    }

    /// Delivers a packet in-process, bypassing network and cipher.
    pub fn receive(&mut self, packet: Packet) {
        self.received.push_back(packet);
    }

    /// Takes the next delivered packet, if any.
    pub fn poll_received(&mut self) -> Option<Packet> {
        self.received.pop_front()
    }

    /// Takes the next raw inbound frame, bypassing decode and
    /// decryption.
    ///
    /// The host registry uses this to take the handshake off the wire
    /// and attach the cipher before [`update`](Self::update) drains the
    /// frames queued behind it in the same tick.
    pub fn poll_frame(&mut self) -> Option<Vec<u8>> {
        self.inbound.as_mut()?.try_recv().ok()
    }

    /// Drains inbound frames: decodes, decrypts non-handshake payloads,
    /// and queues the packets for [`poll_received`](Self::poll_received).
    /// Malformed frames are dropped with a diagnostic.
    pub fn update(&mut self) {
        let Some(inbound) = &mut self.inbound else {
            return;
        };
        while let Ok(frame) = inbound.try_recv() {
            let mut packet = match Packet::decode(&frame) {
                Ok(packet) => packet,
                Err(e) => {
                    tracing::debug!(
                        key = %self.key,
                        error = %e,
                        "dropping malformed frame"
                    );
                    continue;
                }
            };
            if !packet.is_handshake() {
                if let Some(cipher) = &mut self.cipher {
                    cipher.decrypt(&mut packet.payload);
                }
            }
            self.received.push_back(packet);
        }
    }
}

#[cfg(test)]
mod tests {
    use netplay_crypto::SessionKeys;
    use netplay_protocol::OP_HANDSHAKE;

    use super::*;

    const OP_APP: u16 = 7;

    fn channel_peer(key: i32) -> (Peer, mpsc::UnboundedReceiver<Vec<u8>>) {
        let mut peer = Peer::new(PeerKey(key));
        let (tx, rx) = mpsc::unbounded_channel();
        peer.attach_outbound(tx);
        (peer, rx)
    }

    #[test]
    fn test_write_without_connection_fails() {
        let mut peer = Peer::new(PeerKey(1));
        let result = peer.write(&Packet::new(1, OP_APP));
        assert!(matches!(result, Err(PeerError::NotConnected(_))));
        assert!(!peer.is_connected());
    }

    #[test]
    fn test_write_without_cipher_sends_plaintext() {
        let (mut peer, mut rx) = channel_peer(1);
        let mut packet = Packet::new(1, OP_APP);
        packet.put_bytes(b"hello");

        peer.write(&packet).unwrap();
        let frame = rx.try_recv().unwrap();
        assert_eq!(Packet::decode(&frame).unwrap(), packet);
    }

    #[test]
    fn test_write_with_cipher_encrypts_payload() {
        let keys = SessionKeys::generate();
        let (mut peer, mut rx) = channel_peer(1);
        peer.attach_cipher(Cipher::from_keys(&keys));

        let mut packet = Packet::new(1, OP_APP);
        packet.put_bytes(b"secret move");
        peer.write(&packet).unwrap();

        let frame = rx.try_recv().unwrap();
        let on_wire = Packet::decode(&frame).unwrap();
        // Header is plaintext, payload is not.
        assert_eq!(on_wire.version, packet.version);
        assert_eq!(on_wire.opcode, packet.opcode);
        assert_ne!(on_wire.payload, packet.payload);

        // The mirrored cipher recovers it.
        let mut remote = Cipher::from_keys(&keys.mirrored());
        let mut recovered = on_wire.payload.clone();
        remote.decrypt(&mut recovered);
        assert_eq!(recovered, packet.payload);
    }

    #[test]
    fn test_handshake_bypasses_cipher() {
        let keys = SessionKeys::generate();
        let (mut peer, mut rx) = channel_peer(1);
        peer.attach_cipher(Cipher::from_keys(&keys));

        let mut handshake = Packet::new(1, OP_HANDSHAKE);
        handshake.put_bytes(&keys.dec_key);
        peer.write(&handshake).unwrap();

        let frame = rx.try_recv().unwrap();
        assert_eq!(Packet::decode(&frame).unwrap(), handshake);
    }

    #[test]
    fn test_receive_bypasses_cipher_and_preserves_order() {
        let mut peer = Peer::new(PeerKey(1));
        let mut first = Packet::new(1, OP_APP);
        first.put_bytes(b"one");
        let mut second = Packet::new(1, OP_APP);
        second.put_bytes(b"two");

        peer.receive(first.clone());
        peer.receive(second.clone());
        assert_eq!(peer.poll_received(), Some(first));
        assert_eq!(peer.poll_received(), Some(second));
        assert_eq!(peer.poll_received(), None);
    }

    #[test]
    fn test_update_decodes_and_decrypts_inbound_frames() {
        let keys = SessionKeys::generate();
        let mut peer = Peer::new(PeerKey(1));
        peer.attach_cipher(Cipher::from_keys(&keys));
        let (tx, rx) = mpsc::unbounded_channel();
        peer.attach_inbound(rx);

        // The remote side encrypts with the mirrored material.
        let mut remote = Cipher::from_keys(&keys.mirrored());
        let mut packet = Packet::new(1, OP_APP);
        packet.put_bytes(b"from afar");
        let mut wire = packet.clone();
        remote.encrypt(&mut wire.payload);
        tx.send(wire.encode()).unwrap();

        peer.update();
        assert_eq!(peer.poll_received(), Some(packet));
    }

    #[test]
    fn test_update_drops_malformed_frames() {
        let mut peer = Peer::new(PeerKey(1));
        let (tx, rx) = mpsc::unbounded_channel();
        peer.attach_inbound(rx);

        tx.send(vec![0x01]).unwrap(); // shorter than a header
        let mut packet = Packet::new(1, OP_APP);
        packet.put_bytes(b"ok");
        tx.send(packet.encode()).unwrap();

        peer.update();
        assert_eq!(peer.poll_received(), Some(packet));
        assert_eq!(peer.poll_received(), None);
    }

    #[test]
    fn test_poll_frame_returns_raw_undecoded_bytes() {
        let mut peer = Peer::new(PeerKey(1));
        assert_eq!(peer.poll_frame(), None);

        let (tx, rx) = mpsc::unbounded_channel();
        peer.attach_inbound(rx);
        tx.send(vec![1, 2, 3]).unwrap();
        assert_eq!(peer.poll_frame(), Some(vec![1, 2, 3]));
        assert_eq!(peer.poll_frame(), None);
    }

    #[test]
    fn test_synchronized_flag() {
        let mut peer = Peer::new(PeerKey(1));
        assert!(!peer.is_synchronized());
        peer.mark_synchronized();
        assert!(peer.is_synchronized());
    }

    #[test]
    fn test_is_closed_reflects_dropped_sink() {
        let (mut peer, rx) = channel_peer(1);
        assert!(!peer.is_closed());
        drop(rx);
        assert!(peer.is_closed());
        let result = peer.write(&Packet::new(1, OP_APP));
        assert!(matches!(result, Err(PeerError::Disconnected(_))));
    }
}

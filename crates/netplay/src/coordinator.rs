//! The session coordinator: role selection, connection lifecycle,
//! handshake, and message routing.

use std::sync::Arc;

use netplay_crypto::{Cipher, SessionKeys};
use netplay_host::{HostRegistry, RegistryFactory};
use netplay_peer::{DefaultPeerFactory, Peer, PeerFactory};
use netplay_protocol::{OP_HANDSHAKE, Packet, PeerKey};
use netplay_transport::{ConnectEvent, TransportHandle};
use rand::Rng;
use tokio::runtime::Handle;

use crate::{NetplayError, SessionConfig};

/// Which side of the session this process is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// The hosting authority: owns the registry of remote peers.
    Host,
    /// A joining participant: owns one outbound connection.
    Client,
}

/// Lifecycle of the client-role outbound connection.
///
/// `Failed` is a latched, one-shot-readable condition: it holds until
/// [`SessionCoordinator::consume_connection_failure`] reads it, so a
/// caller polling every tick sees each failure exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No connection attempt has been made (or the last one was
    /// cancelled/consumed).
    Idle,
    /// A connect is in flight; completion arrives on a later update.
    Pending,
    /// The session is established and the handshake has been sent.
    Connected,
    /// The last attempt failed; waiting to be consumed.
    Failed,
}

/// Coordinates one multiplayer session.
///
/// Owns the local peer, the host registry (host role), and the transport
/// handle (client role). One instance per process, owned by the
/// application root and passed to whatever needs it — there is no
/// ambient global.
///
/// Not internally synchronized: a single logical owner thread calls in,
/// and all async completions are marshaled onto that thread through
/// channels drained by [`update`](Self::update).
pub struct SessionCoordinator {
    config: SessionConfig,
    role: Option<Role>,
    state: ConnectionState,
    local_peer: Option<Peer>,
    registry: Option<HostRegistry>,
    transport: Option<TransportHandle>,
    peer_factory: Option<Arc<dyn PeerFactory>>,
    registry_factory: Option<Box<dyn RegistryFactory>>,
    on_connection: Option<Box<dyn FnMut(bool) + Send>>,
    io: Handle,
}

impl SessionCoordinator {
    /// Creates a coordinator with the given configuration.
    ///
    /// Captures the current Tokio runtime as the shared async I/O
    /// driver, so this must be called from within a runtime.
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            role: None,
            state: ConnectionState::Idle,
            local_peer: None,
            registry: None,
            transport: None,
            peer_factory: None,
            registry_factory: None,
            on_connection: None,
            io: Handle::current(),
        }
    }

    // -----------------------------------------------------------------
    // Configuration surface — each setter is ignored while a connection
    // attempt is in flight.
    // -----------------------------------------------------------------

    /// Sets the remote address to connect to.
    pub fn set_address(&mut self, address: impl Into<String>) {
        if self.state != ConnectionState::Pending {
            self.config.address = address.into();
        }
    }

    /// Sets the port to connect to or listen on.
    pub fn set_port(&mut self, port: u16) {
        if self.state != ConnectionState::Pending {
            self.config.port = port;
        }
    }

    /// Sets the protocol version for subsequent sessions.
    pub fn set_version(&mut self, version: u16) {
        if self.state != ConnectionState::Pending {
            self.config.version = version;
        }
    }

    /// Returns the protocol version this session speaks.
    pub fn version(&self) -> u16 {
        self.config.version
    }

    /// Sets the strategy used to construct peers (local and, in host
    /// role, accepted remotes).
    pub fn set_peer_factory(&mut self, factory: impl PeerFactory + 'static) {
        if self.state != ConnectionState::Pending {
            self.peer_factory = Some(Arc::new(factory));
        }
    }

    /// Sets the strategy used to construct the host registry. Required
    /// before [`start_session`](Self::start_session).
    pub fn set_registry_factory(
        &mut self,
        factory: impl RegistryFactory + 'static,
    ) {
        if self.state != ConnectionState::Pending {
            self.registry_factory = Some(Box::new(factory));
        }
    }

    /// Registers an observer for connection results (e.g., UI feedback).
    /// Called with `true` on success, `false` on failure.
    pub fn set_connection_listener(
        &mut self,
        listener: impl FnMut(bool) + Send + 'static,
    ) {
        self.on_connection = Some(Box::new(listener));
    }

    // -----------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------

    /// Starts a session in the given role.
    ///
    /// In host role this builds the registry and marks the local peer
    /// synchronized immediately (host and local peer share a process, so
    /// there is no handshake). In client role it opens an asynchronous
    /// connect to the configured address and returns with the connection
    /// pending; the handshake runs when the connect completes.
    ///
    /// # Errors
    ///
    /// [`NetplayError::ConnectionPending`] if an attempt is already in
    /// flight, [`NetplayError::Configuration`] if no registry factory
    /// has been set.
    pub fn start_session(&mut self, as_host: bool) -> Result<(), NetplayError> {
        if self.state == ConnectionState::Pending {
            return Err(NetplayError::ConnectionPending);
        }
        let Some(registry_factory) = &self.registry_factory else {
            return Err(NetplayError::Configuration(
                "no registry factory set".into(),
            ));
        };

        // A fresh start tears down whatever the previous session left.
        self.transport = None;
        self.registry = None;
        self.state = ConnectionState::Idle;
        self.role = Some(if as_host { Role::Host } else { Role::Client });

        let peer_factory = self
            .peer_factory
            .clone()
            .unwrap_or_else(|| Arc::new(DefaultPeerFactory));

        self.local_peer = if self.config.interactive {
            let key = PeerKey(
                rand::rng().random_range(PeerKey::MIN_ASSIGNED..=i32::MAX),
            );
            Some(peer_factory.create(key))
        } else {
            None
        };

        if as_host {
            self.registry = Some(registry_factory.create(
                self.config.port,
                self.config.version,
                peer_factory,
                &self.io,
            ));
            if let Some(local) = &mut self.local_peer {
                local.mark_synchronized();
            }
            tracing::info!(port = self.config.port, "hosting session");
        } else {
            let addr =
                format!("{}:{}", self.config.address, self.config.port);
            tracing::debug!(%addr, "connecting");
            self.transport =
                Some(TransportHandle::connect(addr, &self.io));
            self.state = ConnectionState::Pending;
        }

        Ok(())
    }

    /// Handles the completion of a connect attempt.
    ///
    /// Normally driven by [`update`](Self::update). Honored only while
    /// the connection is pending; spurious repeats are no-ops.
    pub fn on_connect_complete(&mut self, event: ConnectEvent) {
        if self.state != ConnectionState::Pending {
            return;
        }
        match event {
            ConnectEvent::Connected(conn) => {
                self.state = ConnectionState::Connected;
                if let Some(local) = &mut self.local_peer {
                    local.attach_connection(conn, &self.io);

                    // Disclose fresh key material to the host. The
                    // handshake must be the first frame on the wire and
                    // crosses in plaintext; everything after it is
                    // encrypted with the cipher installed here.
                    let keys = SessionKeys::generate();
                    let mut handshake =
                        Packet::new(self.config.version, OP_HANDSHAKE);
                    handshake.put_bytes(&keys.dec_key);
                    handshake.put_bytes(&keys.enc_key);
                    handshake.put_bytes(&keys.dec_iv);
                    handshake.put_bytes(&keys.enc_iv);

                    local.attach_cipher(Cipher::from_keys(&keys));
                    if let Err(e) = local.write(&handshake) {
                        tracing::warn!(error = %e, "handshake write failed");
                    }
                    local.start(&self.io);
                }
                tracing::debug!(
                    address = %self.config.address,
                    port = self.config.port,
                    "connected"
                );
            }
            ConnectEvent::Failed => {
                self.state = ConnectionState::Failed;
                tracing::debug!(
                    address = %self.config.address,
                    port = self.config.port,
                    "connection failed"
                );
            }
        }

        let success = self.state == ConnectionState::Connected;
        if let Some(listener) = &mut self.on_connection {
            listener(success);
        }
    }

    /// Cancels an in-flight connection attempt. No-op unless pending.
    pub fn cancel_pending_connection(&mut self) {
        if self.state != ConnectionState::Pending {
            return;
        }
        if let Some(transport) = self.transport.take() {
            transport.close();
        }
        self.state = ConnectionState::Idle;
    }

    /// Whether a connect attempt is in flight.
    pub fn is_connection_pending(&self) -> bool {
        self.state == ConnectionState::Pending
    }

    /// Destructive read of the failure latch: returns `true` exactly
    /// once per failed attempt, then `false` until another attempt
    /// fails.
    pub fn consume_connection_failure(&mut self) -> bool {
        if self.state == ConnectionState::Failed {
            self.state = ConnectionState::Idle;
            true
        } else {
            false
        }
    }

    /// Drives the coordinator one tick: dispatches connect completions,
    /// pumps the registry (host role), and pumps the local peer. Call
    /// once per application frame. Not reentrant.
    pub fn update(&mut self) {
        let mut events = Vec::new();
        if let Some(transport) = &mut self.transport {
            while let Some(event) = transport.poll_complete() {
                events.push(event);
            }
        }
        for event in events {
            self.on_connect_complete(event);
        }

        if let Some(registry) = &mut self.registry {
            registry.update();
        }
        if let Some(local) = &mut self.local_peer {
            local.update();
        }
    }

    // -----------------------------------------------------------------
    // Routing
    // -----------------------------------------------------------------

    /// Routes a packet to the peer(s) addressed by `target`.
    ///
    /// The checks are ordered but independent — a reserved key can both
    /// miss peer resolution and trigger its broadcast branch:
    ///
    /// 1. `target` resolving to a concrete peer delivers to it: the
    ///    local peer in-process, a registry member over its connection.
    /// 2. Otherwise, with a local peer present: [`PeerKey::SERVER`]
    ///    delivers in-process when hosting (the local participant *is*
    ///    the server) and writes to the remote host otherwise;
    ///    [`PeerKey::SELF`] always delivers in-process.
    /// 3. Independently, [`PeerKey::ALL`] broadcasts to every registry
    ///    member when hosting, else reaches only the local peer; and
    ///    [`PeerKey::SYNCHRONIZED`] broadcasts to synchronized members
    ///    (host role only).
    ///
    /// A target matching none of these is silently dropped: unreachable
    /// addressees are treated as already-departed participants, not
    /// protocol violations.
    pub fn route(&mut self, target: PeerKey, packet: &Packet) {
        let is_local =
            self.local_peer.as_ref().is_some_and(|p| p.key() == target);

        if is_local {
            if let Some(local) = &mut self.local_peer {
                local.receive(packet.clone());
            }
        } else if let Some(peer) =
            self.registry.as_mut().and_then(|r| r.peer_mut(target))
        {
            if let Err(e) = peer.write(packet) {
                tracing::debug!(key = %target, error = %e, "dropped outbound");
            }
        } else if let Some(local) = &mut self.local_peer {
            if target == PeerKey::SERVER {
                if self.role == Some(Role::Host) {
                    local.receive(packet.clone());
                } else if let Err(e) = local.write(packet) {
                    tracing::debug!(error = %e, "dropped outbound to server");
                }
            } else if target == PeerKey::SELF {
                local.receive(packet.clone());
            }
        }

        if target == PeerKey::ALL {
            if let Some(registry) = &mut self.registry {
                registry.send_all(packet);
            } else if let Some(local) = &mut self.local_peer {
                // A lone client "broadcasting" only reaches itself.
                local.receive(packet.clone());
            }
        } else if target == PeerKey::SYNCHRONIZED {
            if let Some(registry) = &mut self.registry {
                registry.send_synchronized(packet);
            }
        }
    }

    /// Broadcasts to everyone: sugar for `route(PeerKey::ALL, packet)`.
    pub fn send_to_all(&mut self, packet: &Packet) {
        self.route(PeerKey::ALL, packet);
    }

    // -----------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------

    /// Whether this session is the hosting authority.
    pub fn is_host(&self) -> bool {
        self.role == Some(Role::Host)
    }

    /// The role the session was started in, if started.
    pub fn role(&self) -> Option<Role> {
        self.role
    }

    /// The current connection lifecycle state.
    pub fn connection_state(&self) -> ConnectionState {
        self.state
    }

    /// The local participant, absent in non-interactive builds.
    pub fn local_peer(&self) -> Option<&Peer> {
        self.local_peer.as_ref()
    }

    /// The local participant, mutably.
    pub fn local_peer_mut(&mut self) -> Option<&mut Peer> {
        self.local_peer.as_mut()
    }

    /// Looks up a peer by key: the local peer first, then the registry.
    pub fn peer(&self, key: PeerKey) -> Option<&Peer> {
        if let Some(local) = &self.local_peer {
            if local.key() == key {
                return Some(local);
            }
        }
        self.registry.as_ref().and_then(|r| r.peer(key))
    }

    /// The host registry, absent unless hosting.
    pub fn registry(&self) -> Option<&HostRegistry> {
        self.registry.as_ref()
    }

    /// The host registry, mutably.
    pub fn registry_mut(&mut self) -> Option<&mut HostRegistry> {
        self.registry.as_mut()
    }

    /// The shared async I/O driver.
    pub fn io(&self) -> &Handle {
        &self.io
    }
}

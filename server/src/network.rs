//! Connection multiplexer feeding the arena from TCP sockets

use crate::arena::Arena;
use crate::session::SessionId;
use crate::BoxError;
use arena_protocol::READ_CHUNK;
use log::{debug, error, info, warn};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::time::{interval, MissedTickBehavior};

/// Events sent from network tasks to the arena loop
#[derive(Debug)]
pub enum ServerMessage {
    Accepted {
        stream: TcpStream,
        addr: SocketAddr,
    },
    Received {
        id: SessionId,
        bytes: Vec<u8>,
    },
    Closed {
        id: SessionId,
    },
    ListenerFailed {
        error: std::io::Error,
    },
}

/// Owns the listener and the arena; all state changes happen in `run`.
pub struct Server {
    listener: Option<TcpListener>,
    local_addr: SocketAddr,
    arena: Arena,
    wake_interval: Duration,

    server_tx: mpsc::UnboundedSender<ServerMessage>,
    server_rx: mpsc::UnboundedReceiver<ServerMessage>,
}

impl Server {
    pub async fn new(addr: &str, wake_interval: Duration) -> Result<Self, BoxError> {
        Self::with_arena(addr, wake_interval, Arena::new()).await
    }

    pub async fn with_arena(
        addr: &str,
        wake_interval: Duration,
        arena: Arena,
    ) -> Result<Self, BoxError> {
        let listener = TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?;
        info!("Server listening on {}", local_addr);

        let (server_tx, server_rx) = mpsc::unbounded_channel();

        Ok(Server {
            listener: Some(listener),
            local_addr,
            arena,
            wake_interval,
            server_tx,
            server_rx,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    /// Spawns task that accepts connections until the listener fails
    fn spawn_acceptor(&mut self) {
        let Some(listener) = self.listener.take() else {
            return;
        };
        let server_tx = self.server_tx.clone();

        tokio::spawn(async move {
            loop {
                match listener.accept().await {
                    Ok((stream, addr)) => {
                        if server_tx
                            .send(ServerMessage::Accepted { stream, addr })
                            .is_err()
                        {
                            break;
                        }
                    }
                    Err(error) => {
                        let _ = server_tx.send(ServerMessage::ListenerFailed { error });
                        break;
                    }
                }
            }
        });
    }

    /// Spawns task forwarding raw reads; a read may hold any part of a line
    fn spawn_reader(&self, id: SessionId, mut reader: OwnedReadHalf) {
        let server_tx = self.server_tx.clone();

        tokio::spawn(async move {
            let mut buffer = [0u8; READ_CHUNK];

            loop {
                match reader.read(&mut buffer).await {
                    Ok(0) => break,
                    Ok(len) => {
                        let message = ServerMessage::Received {
                            id,
                            bytes: buffer[..len].to_vec(),
                        };
                        if server_tx.send(message).is_err() {
                            return;
                        }
                    }
                    Err(e) => {
                        warn!("Read error on client {}: {}", id, e);
                        break;
                    }
                }
            }

            let _ = server_tx.send(ServerMessage::Closed { id });
        });
    }

    /// Spawns task draining a session's outbound queue into its socket.
    /// Ends when the session is dropped, which closes the connection.
    fn spawn_writer(
        id: SessionId,
        mut writer: OwnedWriteHalf,
        mut outbox: mpsc::UnboundedReceiver<String>,
    ) {
        tokio::spawn(async move {
            while let Some(text) = outbox.recv().await {
                if let Err(e) = writer.write_all(text.as_bytes()).await {
                    warn!("Failed to send to client {}: {}", id, e);
                    break;
                }
            }
            let _ = writer.shutdown().await;
            debug!("Writer for client {} finished", id);
        });
    }

    fn register(&mut self, stream: TcpStream, addr: SocketAddr) {
        if let Err(e) = stream.set_nodelay(true) {
            debug!("Could not disable Nagle for {}: {}", addr, e);
        }
        let (reader, writer) = stream.into_split();
        let (outbox_tx, outbox_rx) = mpsc::unbounded_channel();

        let id = self.arena.connect(addr, outbox_tx);
        Self::spawn_writer(id, writer, outbox_rx);
        self.spawn_reader(id, reader);
    }

    fn handle_message(&mut self, message: ServerMessage) -> Result<(), BoxError> {
        match message {
            ServerMessage::Accepted { stream, addr } => self.register(stream, addr),
            ServerMessage::Received { id, bytes } => self.arena.handle_input(id, &bytes),
            ServerMessage::Closed { id } => self.arena.disconnect(id),
            ServerMessage::ListenerFailed { error } => {
                error!("accept: {}", error);
                return Err(error.into());
            }
        }
        Ok(())
    }

    /// Main loop: waits for network events or the wake interval.
    ///
    /// Every event already queued is handled before one matchmaking pass, so
    /// matchmaking never sees a half-processed batch. Returns only when the
    /// listener fails.
    pub async fn run(&mut self) -> Result<(), BoxError> {
        self.spawn_acceptor();

        let mut wake = interval(self.wake_interval);
        wake.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // Skip the first tick since it fires immediately
        wake.tick().await;
        let mut active = false;

        info!("Server started successfully");

        loop {
            tokio::select! {
                message = self.server_rx.recv() => {
                    let Some(message) = message else {
                        return Ok(());
                    };
                    self.handle_message(message)?;
                    while let Ok(message) = self.server_rx.try_recv() {
                        self.handle_message(message)?;
                    }
                    self.arena.run_matchmaking();
                    active = true;
                },

                _ = wake.tick() => {
                    if !active {
                        info!(
                            "No response from clients in {} seconds",
                            self.wake_interval.as_secs()
                        );
                    }
                    active = false;
                },
            }
        }
    }
}

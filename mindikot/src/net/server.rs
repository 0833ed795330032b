//! TCP host for a Mindikot session.
//!
//! [`HostSession::start`] binds a listener and spawns three kinds of task:
//! the session actor, one acceptor, and a reader plus a writer for every
//! accepted connection. Readers only decode lines and forward them to the
//! actor. Writers are the only thing that ever writes to their socket.

use log::{debug, info, warn};
use std::net::SocketAddr;
use tokio::{
    io::{AsyncWriteExt, BufReader},
    net::{TcpListener, TcpStream, ToSocketAddrs},
    sync::mpsc,
    task::JoinHandle,
};

use super::{
    errors::ProtocolError,
    messages::{ClientMessage, DisconnectNotice, ServerMessage},
    utils,
};
use crate::{
    game::constants::HOST_SEAT,
    session::{SessionActor, SessionConfig, SessionError, SessionHandle},
};

/// A running session: its actor, its listener and the host's own inbox.
pub struct HostSession {
    handle: SessionHandle,
    local_addr: SocketAddr,
    host_inbox: Option<mpsc::Receiver<ServerMessage>>,
    acceptor: JoinHandle<()>,
    actor: JoinHandle<()>,
}

impl HostSession {
    /// Binds `addr` and opens the lobby with the host in seat 0.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidConfiguration`] for a bad config and
    /// [`SessionError::Bind`] if the listener can't be bound.
    pub async fn start<A>(addr: A, config: SessionConfig) -> Result<Self, SessionError>
    where
        A: ToSocketAddrs + std::fmt::Display,
    {
        let outbound_buffer = config.outbound_buffer;
        let (actor, handle, host_inbox) = SessionActor::new(config)?;

        let bind_error = |error: std::io::Error| SessionError::Bind {
            addr: addr.to_string(),
            reason: error.to_string(),
        };
        let listener = TcpListener::bind(&addr).await.map_err(bind_error)?;
        let local_addr = listener.local_addr().map_err(bind_error)?;
        info!("hosting on {local_addr}");

        let actor = tokio::spawn(actor.run());
        let acceptor = tokio::spawn(accept_loop(listener, handle.clone(), outbound_buffer));

        Ok(Self {
            handle,
            local_addr,
            host_inbox: Some(host_inbox),
            acceptor,
            actor,
        })
    }

    #[must_use]
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    #[must_use]
    pub fn handle(&self) -> SessionHandle {
        self.handle.clone()
    }

    /// Messages addressed to the host's own seat. Can be taken once.
    pub fn take_host_inbox(&mut self) -> Option<mpsc::Receiver<ServerMessage>> {
        self.host_inbox.take()
    }

    /// Sends `DISCONNECTED` to every connection, stops accepting and waits
    /// for the actor to finish.
    pub async fn close(self) {
        if let Err(error) = self.handle.close().await {
            debug!("session already closed: {error}");
        }
        self.acceptor.abort();
        if let Err(error) = self.actor.await {
            warn!("session actor ended abnormally: {error}");
        }
        info!("stopped hosting on {}", self.local_addr);
    }
}

async fn accept_loop(listener: TcpListener, handle: SessionHandle, outbound_buffer: usize) {
    loop {
        match listener.accept().await {
            Ok((stream, peer)) => {
                if handle.is_closed() {
                    break;
                }
                debug!("accepted connection from {peer}");
                tokio::spawn(handle_connection(
                    stream,
                    peer,
                    handle.clone(),
                    outbound_buffer,
                ));
            }
            Err(error) => warn!("accept failed: {error}"),
        }
    }
}

/// Seats one connection and pumps its lines until either side goes away.
async fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    handle: SessionHandle,
    outbound_buffer: usize,
) {
    let (read_half, mut write_half) = stream.into_split();
    let (outbound, mut outbox) = mpsc::channel(outbound_buffer);

    let connection = match handle.join(outbound).await {
        Ok((connection, seat)) => {
            info!("{peer} seated as {seat}");
            connection
        }
        Err(error) => {
            info!("turning away {peer}: {error}");
            let refusal = match error {
                SessionError::LobbyFull => ServerMessage::LobbyFull,
                other => ServerMessage::Disconnected(DisconnectNotice {
                    player_id: HOST_SEAT,
                    reason: other.to_string(),
                }),
            };
            let _ = utils::write_line_async(&mut write_half, &refusal).await;
            let _ = write_half.shutdown().await;
            return;
        }
    };

    let mut writer = tokio::spawn(async move {
        while let Some(message) = outbox.recv().await {
            if let Err(error) = utils::write_line_async(&mut write_half, &message).await {
                warn!("write to {peer} failed: {error}");
                break;
            }
        }
        let _ = write_half.shutdown().await;
    });

    let mut reader = BufReader::new(read_half);
    loop {
        tokio::select! {
            result = utils::read_line_async::<ClientMessage, _>(&mut reader) => match result {
                Ok(message) => {
                    let leaving = message == ClientMessage::Disconnect;
                    if handle.submit(connection, message).await.is_err() || leaving {
                        break;
                    }
                }
                Err(ProtocolError::ConnectionClosed) => {
                    debug!("{peer} closed the connection");
                    break;
                }
                Err(error) if error.is_connectivity() => {
                    warn!("lost {peer}: {error}");
                    break;
                }
                Err(error) => {
                    handle.protocol_violation(connection, error.to_string()).await;
                    break;
                }
            },
            // The session let go of this connection.
            _ = &mut writer => break,
        }
    }

    handle.leave(connection).await;
}

//! A low-level blocking TCP client.
//!
//! Used by the bots binary and the integration tests. The interactive
//! client in `mk_client` runs on Tokio instead.

use anyhow::{Error, bail};
use std::{
    io::BufReader,
    net::{SocketAddr, TcpStream},
    thread,
    time::Duration,
};

use super::{
    messages::{ClientMessage, ServerMessage},
    utils,
};
use crate::game::{
    Card, GameState, PlayerId, PlayerInput, TrumpDecision, constants::HOST_SEAT,
};

/// Default timeout for reading from the host.
pub const READ_TIMEOUT: Duration = Duration::from_secs(10);

/// Default timeout for writing to the host.
pub const WRITE_TIMEOUT: Duration = Duration::from_secs(1);

/// A blocking connection to a host, holding one seat.
pub struct Client {
    pub player_id: PlayerId,
    pub name: String,
    reader: BufReader<TcpStream>,
    writer: TcpStream,
}

impl Client {
    /// Connects, waits for a seat and introduces itself as `name`.
    ///
    /// Connecting is retried three times with growing timeouts (100ms,
    /// 500ms, 1s).
    ///
    /// # Errors
    ///
    /// Returns an error if the host can't be reached, the lobby is full, or
    /// the host answers with anything other than a seat assignment.
    pub fn connect(name: &str, addr: &SocketAddr) -> Result<Self, Error> {
        let mut connect_timeouts = vec![
            Duration::from_secs(1),
            Duration::from_millis(500),
            Duration::from_millis(100),
        ];
        while let Some(connect_timeout) = connect_timeouts.pop() {
            match TcpStream::connect_timeout(addr, connect_timeout) {
                Ok(stream) => return Self::handshake(name, stream),
                Err(_) => thread::sleep(connect_timeout),
            }
        }
        bail!("couldn't connect to {addr} as {name}")
    }

    fn handshake(name: &str, stream: TcpStream) -> Result<Self, Error> {
        stream.set_read_timeout(Some(READ_TIMEOUT))?;
        stream.set_write_timeout(Some(WRITE_TIMEOUT))?;
        let writer = stream.try_clone()?;
        let mut reader = BufReader::new(stream);

        let player_id = match utils::read_line::<ServerMessage, _>(&mut reader)? {
            ServerMessage::AssignId(id) => id,
            ServerMessage::LobbyFull => bail!("lobby is full"),
            response => bail!("invalid host response: {response}"),
        };

        let mut client = Self {
            player_id,
            name: name.to_string(),
            reader,
            writer,
        };
        client.send(&ClientMessage::PlayerName(name.to_string()))?;
        Ok(client)
    }

    /// Replaces [`READ_TIMEOUT`]. `None` blocks until the host says
    /// something, which seats idling in a lobby want.
    ///
    /// # Errors
    ///
    /// Returns an error if the socket rejects the timeout.
    pub fn set_read_timeout(&self, timeout: Option<Duration>) -> Result<(), Error> {
        self.reader.get_ref().set_read_timeout(timeout)?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns an error if the message can't be written.
    pub fn send(&mut self, msg: &ClientMessage) -> Result<(), Error> {
        utils::write_line(&mut self.writer, msg)?;
        Ok(())
    }

    /// Reads the next message, whatever it is.
    ///
    /// # Errors
    ///
    /// Returns an error on timeout, disconnect or an unreadable line.
    pub fn recv(&mut self) -> Result<ServerMessage, Error> {
        Ok(utils::read_line(&mut self.reader)?)
    }

    /// Reads until the next state snapshot, skipping round results and
    /// error notices.
    ///
    /// # Errors
    ///
    /// Fails if the connection ends or the host kicks or leaves.
    pub fn recv_state(&mut self) -> Result<GameState, Error> {
        loop {
            match self.recv()? {
                ServerMessage::GameStateUpdate(state) => return Ok(state),
                ServerMessage::Kicked => bail!("kicked by the host"),
                ServerMessage::Disconnected(notice) if notice.player_id == HOST_SEAT => {
                    bail!("host left: {}", notice.reason)
                }
                _ => {}
            }
        }
    }

    /// # Errors
    ///
    /// Returns an error if the message can't be written.
    pub fn take_action(&mut self, input: PlayerInput) -> Result<(), Error> {
        self.send(&ClientMessage::PlayerAction(input))
    }

    /// # Errors
    ///
    /// Returns an error if the message can't be written.
    pub fn play_card(&mut self, card: Card) -> Result<(), Error> {
        self.take_action(PlayerInput::PlayCard { card })
    }

    /// # Errors
    ///
    /// Returns an error if the message can't be written.
    pub fn reveal(&mut self) -> Result<(), Error> {
        self.take_action(PlayerInput::TrumpDecision {
            decision: TrumpDecision::Reveal,
        })
    }

    /// # Errors
    ///
    /// Returns an error if the message can't be written.
    pub fn pass(&mut self) -> Result<(), Error> {
        self.take_action(PlayerInput::TrumpDecision {
            decision: TrumpDecision::Pass,
        })
    }

    /// # Errors
    ///
    /// Returns an error if the message can't be written.
    pub fn start_next_round(&mut self) -> Result<(), Error> {
        self.send(&ClientMessage::StartNextRound)
    }

    /// Says goodbye and closes the connection.
    ///
    /// # Errors
    ///
    /// Returns an error if the goodbye can't be written.
    pub fn disconnect(mut self) -> Result<(), Error> {
        self.send(&ClientMessage::Disconnect)?;
        self.writer.shutdown(std::net::Shutdown::Both)?;
        Ok(())
    }
}

//! Session actor with async message handling.
//!
//! The actor is the only owner of the authoritative [`GameState`]. Every
//! connection talks to it through a [`SessionHandle`], and every mutation
//! happens on the actor's task, one inbox message at a time.

use log::{debug, error, info, warn};
use rand::{SeedableRng, rngs::StdRng};
use tokio::sync::{mpsc, oneshot};

use super::{
    config::SessionConfig,
    errors::SessionError,
    messages::{ConnectionId, HOST_CONNECTION, SessionMessage, SessionSnapshot},
    scoreboard::Scoreboard,
};
use crate::{
    game::{
        GameState, Player, PlayerId, PlayerInput, RoundOutcome, Transition,
        constants::{HOST_SEAT, PLACEHOLDER_NAME},
        entities::sanitize_name,
    },
    net::messages::{
        ClientMessage, DisconnectNotice, ErrorKind, ErrorNotice, RoundSummary, ServerMessage,
    },
};

/// Capacity of the actor's inbox.
pub const INBOX_CAPACITY: usize = 256;

/// Cloneable handle for sending messages to a [`SessionActor`].
#[derive(Clone, Debug)]
pub struct SessionHandle {
    sender: mpsc::Sender<SessionMessage>,
}

impl SessionHandle {
    #[must_use]
    pub fn new(sender: mpsc::Sender<SessionMessage>) -> Self {
        Self { sender }
    }

    async fn send(&self, message: SessionMessage) -> Result<(), SessionError> {
        self.sender
            .send(message)
            .await
            .map_err(|_| SessionError::Closed)
    }

    /// Asks for a seat for a new connection whose outbound queue is `outbound`.
    ///
    /// # Errors
    ///
    /// [`SessionError::LobbyFull`] when no seat is free and
    /// [`SessionError::Closed`] when the session is gone.
    pub async fn join(
        &self,
        outbound: mpsc::Sender<ServerMessage>,
    ) -> Result<(ConnectionId, PlayerId), SessionError> {
        let (response, rx) = oneshot::channel();
        self.send(SessionMessage::Join { outbound, response }).await?;
        rx.await.map_err(|_| SessionError::Closed)?
    }

    /// Forwards a decoded client message.
    ///
    /// # Errors
    ///
    /// [`SessionError::Closed`] when the session is gone.
    pub async fn submit(
        &self,
        connection: ConnectionId,
        message: ClientMessage,
    ) -> Result<(), SessionError> {
        self.send(SessionMessage::Inbound {
            connection,
            message,
        })
        .await
    }

    /// Forwards a message from the host's own seat.
    ///
    /// # Errors
    ///
    /// [`SessionError::Closed`] when the session is gone.
    pub async fn submit_as_host(&self, message: ClientMessage) -> Result<(), SessionError> {
        self.submit(HOST_CONNECTION, message).await
    }

    pub async fn protocol_violation(&self, connection: ConnectionId, reason: String) {
        let _ = self
            .send(SessionMessage::ProtocolViolation { connection, reason })
            .await;
    }

    pub async fn leave(&self, connection: ConnectionId) {
        let _ = self.send(SessionMessage::Left { connection }).await;
    }

    /// # Errors
    ///
    /// Fails for the host seat, an empty seat, or a closed session.
    pub async fn kick(&self, seat: PlayerId) -> Result<(), SessionError> {
        let (response, rx) = oneshot::channel();
        self.send(SessionMessage::Kick { seat, response }).await?;
        rx.await.map_err(|_| SessionError::Closed)?
    }

    /// # Errors
    ///
    /// [`SessionError::Closed`] when the session is gone.
    pub async fn snapshot(&self) -> Result<SessionSnapshot, SessionError> {
        let (response, rx) = oneshot::channel();
        self.send(SessionMessage::GetSnapshot { response }).await?;
        rx.await.map_err(|_| SessionError::Closed)
    }

    /// Tells every connection the host is leaving and stops the actor.
    ///
    /// # Errors
    ///
    /// [`SessionError::Closed`] when the session was already closed.
    pub async fn close(&self) -> Result<(), SessionError> {
        let (response, rx) = oneshot::channel();
        self.send(SessionMessage::Close { response }).await?;
        rx.await.map_err(|_| SessionError::Closed)
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

#[derive(Debug)]
struct Connection {
    id: ConnectionId,
    outbound: mpsc::Sender<ServerMessage>,
}

/// Session actor managing one table of seats and its rounds.
pub struct SessionActor {
    config: SessionConfig,
    state: GameState,
    /// Indexed by seat. `None` is a free (lobby) or departed (in game) seat.
    seats: Vec<Option<Connection>>,
    scoreboard: Scoreboard,
    /// Rounds dealt so far. Zero while in the lobby.
    round_number: u32,
    round_playable: bool,
    next_connection_id: ConnectionId,
    /// Connections found dead or leaving, handled after the current message.
    departures: Vec<(ConnectionId, &'static str)>,
    inbox: mpsc::Receiver<SessionMessage>,
    rng: StdRng,
    is_closed: bool,
}

impl SessionActor {
    /// Creates the actor with the host already seated.
    ///
    /// Returns the actor, a handle to it, and the receiving end of the
    /// host seat's outbound queue.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidConfiguration`] for a bad config.
    pub fn new(
        config: SessionConfig,
    ) -> Result<(Self, SessionHandle, mpsc::Receiver<ServerMessage>), SessionError> {
        config.validate()?;
        let (sender, inbox) = mpsc::channel(INBOX_CAPACITY);
        let (host_outbound, host_inbox) = mpsc::channel(config.outbound_buffer);

        let mut players: Vec<Player> = (0..config.required_player_count)
            .map(|id| Player::new(id, PLACEHOLDER_NAME))
            .collect();
        players[HOST_SEAT].name = sanitize_name(&config.host_name);

        let mut seats: Vec<Option<Connection>> =
            (0..config.required_player_count).map(|_| None).collect();
        seats[HOST_SEAT] = Some(Connection {
            id: HOST_CONNECTION,
            outbound: host_outbound,
        });

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        let mut actor = Self {
            state: GameState::lobby(players, config.game_mode),
            config,
            seats,
            scoreboard: Scoreboard::new(),
            round_number: 0,
            round_playable: true,
            next_connection_id: HOST_CONNECTION + 1,
            departures: Vec::new(),
            inbox,
            rng,
            is_closed: false,
        };
        actor.send_to(HOST_SEAT, ServerMessage::AssignId(HOST_SEAT));
        actor.send_to(HOST_SEAT, ServerMessage::GameStateUpdate(actor.state.clone()));

        Ok((actor, SessionHandle::new(sender), host_inbox))
    }

    /// Runs the actor until it's closed or every handle is dropped.
    pub async fn run(mut self) {
        info!(
            "session for {} players ({} mode) open",
            self.config.required_player_count, self.config.game_mode
        );

        while let Some(message) = self.inbox.recv().await {
            self.handle_message(message);
            self.process_departures();
            if self.is_closed {
                break;
            }
        }

        info!("session closed after {} round(s)", self.round_number);
    }

    fn handle_message(&mut self, message: SessionMessage) {
        match message {
            SessionMessage::Join { outbound, response } => {
                let result = self.handle_join(outbound);
                let _ = response.send(result);
            }

            SessionMessage::Inbound {
                connection,
                message,
            } => self.handle_inbound(connection, message),

            SessionMessage::ProtocolViolation { connection, reason } => {
                if let Some(seat) = self.seat_of(connection) {
                    warn!("seat {seat} sent an unreadable message: {reason}");
                    self.send_to(
                        seat,
                        ServerMessage::Error(ErrorNotice::new(ErrorKind::Protocol, reason)),
                    );
                    self.departures.push((connection, "protocol error"));
                }
            }

            SessionMessage::Left { connection } => {
                self.departures.push((connection, "connection closed"));
            }

            SessionMessage::Kick { seat, response } => {
                let result = self.handle_kick(seat);
                let _ = response.send(result);
            }

            SessionMessage::GetSnapshot { response } => {
                let _ = response.send(self.snapshot());
            }

            SessionMessage::Close { response } => {
                self.close();
                let _ = response.send(());
            }
        }
    }

    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            state: self.state.clone(),
            scoreboard: self.scoreboard.clone(),
            round_number: self.round_number,
            connected: self.seats.iter().map(Option::is_some).collect(),
            round_playable: self.round_playable,
        }
    }

    fn seat_of(&self, connection: ConnectionId) -> Option<PlayerId> {
        self.seats
            .iter()
            .position(|seat| seat.as_ref().is_some_and(|conn| conn.id == connection))
    }

    fn connected_count(&self) -> usize {
        self.seats.iter().flatten().count()
    }

    fn handle_join(
        &mut self,
        outbound: mpsc::Sender<ServerMessage>,
    ) -> Result<(ConnectionId, PlayerId), SessionError> {
        if self.round_number > 0 {
            return Err(SessionError::LobbyFull);
        }
        let seat = self
            .seats
            .iter()
            .position(Option::is_none)
            .ok_or(SessionError::LobbyFull)?;

        let id = self.next_connection_id;
        self.next_connection_id += 1;
        self.seats[seat] = Some(Connection { id, outbound });
        self.state.players[seat].name = PLACEHOLDER_NAME.to_string();
        self.send_to(seat, ServerMessage::AssignId(seat));
        info!(
            "connection {id} took seat {seat} ({}/{} seated)",
            self.connected_count(),
            self.config.required_player_count
        );
        self.broadcast_state();
        Ok((id, seat))
    }

    fn handle_inbound(&mut self, connection: ConnectionId, message: ClientMessage) {
        let Some(seat) = self.seat_of(connection) else {
            debug!("ignoring message from departed connection {connection}");
            return;
        };

        match message {
            ClientMessage::PlayerName(name) => self.rename(seat, &name),
            ClientMessage::PlayerAction(input) => self.apply_action(seat, input),
            ClientMessage::StartNextRound => self.start_next_round(seat),
            ClientMessage::Disconnect => self.departures.push((connection, "left the game")),
        }
    }

    fn rename(&mut self, seat: PlayerId, name: &str) {
        let name = sanitize_name(name);
        if name.is_empty() {
            self.send_error(seat, &SessionError::EmptyName);
            return;
        }
        info!("seat {seat} is {name}");
        self.state.players[seat].name = name;
        self.broadcast_state();
        self.maybe_start_first_round();
    }

    fn maybe_start_first_round(&mut self) {
        let ready = self.round_number == 0
            && self.seats.iter().all(Option::is_some)
            && self
                .state
                .players
                .iter()
                .all(|player| !player.has_placeholder_name());
        if ready {
            self.start_round();
        }
    }

    fn start_round(&mut self) {
        let first_leader = self.round_number as usize % self.config.required_player_count;
        let players = self.state.players.clone();
        match GameState::new_round(players, self.config.game_mode, first_leader, &mut self.rng) {
            Ok(state) => {
                self.state = state;
                self.round_number += 1;
                self.round_playable = true;
                info!(
                    "round {} dealt, seat {first_leader} leads",
                    self.round_number
                );
                self.broadcast_state();
            }
            Err(error) => error!("couldn't deal a new round: {error}"),
        }
    }

    fn apply_action(&mut self, seat: PlayerId, input: PlayerInput) {
        let mut summary = None;
        match self.state.process_player_input(seat, input) {
            Ok(Transition::Continue) => debug!("seat {seat} {input}"),
            Ok(Transition::TrickComplete(outcome)) => {
                debug!("seat {seat} {input}; seat {} takes the trick", outcome.winner);
            }
            Ok(Transition::RoundComplete(outcome)) => summary = Some(self.finish_round(outcome)),
            Err(error) => {
                warn!("rejected input from seat {seat}: {error}");
                self.send_to(seat, ServerMessage::Error(ErrorNotice::from(&error)));
            }
        }

        self.broadcast_state();
        if let Some(summary) = summary {
            self.broadcast(ServerMessage::RoundResult(summary));
        }
    }

    fn finish_round(&mut self, outcome: RoundOutcome) -> RoundSummary {
        self.scoreboard.record(&outcome.result);
        match outcome.result.winning_team {
            Some(team) if outcome.result.is_kot => {
                info!("round {} won by team {team} with a kot", self.round_number);
            }
            Some(team) => info!("round {} won by team {team}", self.round_number),
            None => info!("round {} drawn", self.round_number),
        }
        RoundSummary {
            round_number: self.round_number,
            result: outcome.result,
            scoreboard: self.scoreboard.clone(),
        }
    }

    fn start_next_round(&mut self, seat: PlayerId) {
        if seat != HOST_SEAT {
            self.send_error(seat, &SessionError::NotHost);
            return;
        }
        let connected = self.connected_count();
        let required = self.config.required_player_count;
        if self.round_number == 0 || connected < required {
            self.send_error(seat, &SessionError::RoundUnplayable { connected, required });
            return;
        }
        if !self.state.is_round_over() {
            self.send_error(seat, &SessionError::RoundInProgress);
            return;
        }
        self.start_round();
    }

    fn handle_kick(&mut self, seat: PlayerId) -> Result<(), SessionError> {
        if seat == HOST_SEAT {
            return Err(SessionError::CannotKickHost);
        }
        let connection = self
            .seats
            .get(seat)
            .and_then(|slot| slot.as_ref())
            .map(|conn| conn.id)
            .ok_or(SessionError::SeatNotConnected(seat))?;

        info!("host kicked seat {seat}");
        self.send_to(seat, ServerMessage::Kicked);
        self.handle_departure(connection, "kicked by the host");
        Ok(())
    }

    fn process_departures(&mut self) {
        while let Some((connection, reason)) = self.departures.pop() {
            self.handle_departure(connection, reason);
        }
    }

    /// Releases a connection's seat. Dropping the outbound sender lets the
    /// connection's writer flush what's queued and close the socket.
    fn handle_departure(&mut self, connection: ConnectionId, reason: &'static str) {
        let Some(seat) = self.seat_of(connection) else {
            return;
        };
        self.seats[seat] = None;

        if seat == HOST_SEAT {
            warn!("host seat went away ({reason}), closing the session");
            self.close();
            return;
        }

        if self.round_number == 0 {
            info!("seat {seat} freed ({reason})");
            self.state.players[seat].name = PLACEHOLDER_NAME.to_string();
            self.broadcast_state();
            return;
        }

        self.state.mark_player_left(seat);
        self.round_playable = false;
        let connected = self.connected_count();
        let required = self.config.required_player_count;
        warn!("seat {seat} left mid-game ({reason}), {connected}/{required} seats connected");
        self.broadcast(ServerMessage::Disconnected(DisconnectNotice {
            player_id: seat,
            reason: reason.to_string(),
        }));
        self.broadcast_state();
        self.broadcast(ServerMessage::Error(ErrorNotice::from(
            &SessionError::RoundUnplayable {
                connected,
                required,
            },
        )));
    }

    fn close(&mut self) {
        if self.is_closed {
            return;
        }
        self.broadcast(ServerMessage::Disconnected(DisconnectNotice {
            player_id: HOST_SEAT,
            reason: "host closed the session".to_string(),
        }));
        for seat in &mut self.seats {
            *seat = None;
        }
        self.departures.clear();
        self.is_closed = true;
    }

    fn send_error(&mut self, seat: PlayerId, error: &SessionError) {
        warn!("seat {seat}: {error}");
        self.send_to(seat, ServerMessage::Error(ErrorNotice::from(error)));
    }

    fn broadcast_state(&mut self) {
        self.broadcast(ServerMessage::GameStateUpdate(self.state.clone()));
    }

    /// Best-effort send to every live connection. A full queue drops the
    /// message for that connection only; a closed one schedules its
    /// departure.
    fn broadcast(&mut self, message: ServerMessage) {
        for seat in 0..self.seats.len() {
            self.send_to(seat, message.clone());
        }
    }

    fn send_to(&mut self, seat: PlayerId, message: ServerMessage) {
        let Some(Some(conn)) = self.seats.get(seat) else {
            return;
        };
        match conn.outbound.try_send(message) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(message)) => {
                warn!("seat {seat} outbound queue full, dropping {message}");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                debug!("seat {seat} outbound queue closed");
                self.departures.push((conn.id, "connection lost"));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{GameMode, Phase, constants::LEFT_SUFFIX};

    fn config() -> SessionConfig {
        SessionConfig {
            seed: Some(11),
            ..Default::default()
        }
    }

    fn spawn() -> (SessionHandle, mpsc::Receiver<ServerMessage>) {
        let (actor, handle, host_inbox) = SessionActor::new(config()).unwrap();
        tokio::spawn(actor.run());
        (handle, host_inbox)
    }

    async fn join_named(
        handle: &SessionHandle,
        name: &str,
    ) -> (ConnectionId, PlayerId, mpsc::Receiver<ServerMessage>) {
        let (outbound, inbox) = mpsc::channel(256);
        let (id, seat) = handle.join(outbound).await.unwrap();
        handle
            .submit(id, ClientMessage::PlayerName(name.to_string()))
            .await
            .unwrap();
        (id, seat, inbox)
    }

    #[test]
    fn test_new_rejects_bad_config() {
        let config = SessionConfig {
            required_player_count: 5,
            ..Default::default()
        };
        assert!(matches!(
            SessionActor::new(config),
            Err(SessionError::InvalidConfiguration(_))
        ));
    }

    #[tokio::test]
    async fn test_host_seat_is_assigned_first() {
        let (_handle, mut host_inbox) = spawn();
        assert_eq!(host_inbox.recv().await, Some(ServerMessage::AssignId(0)));
        let Some(ServerMessage::GameStateUpdate(state)) = host_inbox.recv().await else {
            panic!("expected a lobby snapshot");
        };
        assert_eq!(state.players[0].name, "Host");
        assert_eq!(state.players[1].name, PLACEHOLDER_NAME);
        assert_eq!(state.phase(), Phase::Lobby);
    }

    #[tokio::test]
    async fn test_seats_fill_in_order_then_lobby_full() {
        let (handle, _host_inbox) = spawn();
        let mut inboxes = Vec::new();
        for expected in 1..4 {
            let (outbound, inbox) = mpsc::channel(256);
            let (_, seat) = handle.join(outbound).await.unwrap();
            assert_eq!(seat, expected);
            inboxes.push(inbox);
        }
        let (outbound, _inbox) = mpsc::channel(8);
        assert_eq!(handle.join(outbound).await, Err(SessionError::LobbyFull));
    }

    #[tokio::test]
    async fn test_freed_lobby_seat_is_reused() {
        let (handle, _host_inbox) = spawn();
        let (first, seat_one, _a) = join_named(&handle, "a").await;
        let (_, seat_two, _b) = join_named(&handle, "b").await;
        assert_eq!((seat_one, seat_two), (1, 2));

        handle.leave(first).await;
        let snapshot = handle.snapshot().await.unwrap();
        assert_eq!(snapshot.connected, vec![true, false, true, false]);
        assert_eq!(snapshot.state.players[1].name, PLACEHOLDER_NAME);

        let (_, reused, _c) = join_named(&handle, "c").await;
        assert_eq!(reused, 1);
    }

    #[tokio::test]
    async fn test_first_round_deals_when_everyone_is_named() {
        let (handle, _host_inbox) = spawn();
        let mut seats = Vec::new();
        for name in ["a", "b"] {
            seats.push(join_named(&handle, name).await);
        }
        assert_eq!(handle.snapshot().await.unwrap().round_number, 0);

        seats.push(join_named(&handle, "c").await);
        let snapshot = handle.snapshot().await.unwrap();
        assert_eq!(snapshot.round_number, 1);
        assert_eq!(snapshot.state.phase(), Phase::AwaitingLead);
        assert_eq!(snapshot.state.awaiting_input_from_player_index, Some(0));
        assert!(snapshot.state.players.iter().all(|p| p.hand.len() == 13));
    }

    #[tokio::test]
    async fn test_out_of_turn_action_gets_error() {
        let (handle, _host_inbox) = spawn();
        let mut seats = Vec::new();
        for name in ["a", "b", "c"] {
            seats.push(join_named(&handle, name).await);
        }
        let snapshot = handle.snapshot().await.unwrap();
        let card = snapshot.state.players[1].hand[0];

        let (id, seat, inbox) = &mut seats[0];
        assert_eq!(*seat, 1);
        handle
            .submit(*id, ClientMessage::PlayerAction(PlayerInput::PlayCard { card }))
            .await
            .unwrap();
        let after = handle.snapshot().await.unwrap();
        assert_eq!(after.state, snapshot.state);

        let mut saw_error = false;
        while let Ok(message) = inbox.try_recv() {
            if let ServerMessage::Error(notice) = message {
                assert_eq!(notice.kind, ErrorKind::TurnViolation);
                saw_error = true;
            }
        }
        assert!(saw_error);
    }

    #[tokio::test]
    async fn test_departure_mid_game_marks_seat_left() {
        let (handle, _host_inbox) = spawn();
        let mut seats = Vec::new();
        for name in ["a", "b", "c"] {
            seats.push(join_named(&handle, name).await);
        }
        let (id, _, _) = &seats[1];
        handle.leave(*id).await;

        let snapshot = handle.snapshot().await.unwrap();
        assert!(!snapshot.round_playable);
        assert_eq!(snapshot.connected_count(), 3);
        assert_eq!(snapshot.state.players[2].name, format!("b{LEFT_SUFFIX}"));
        assert!(snapshot.state.players[2].hand.is_empty());

        let (outbound, _inbox) = mpsc::channel(8);
        assert_eq!(handle.join(outbound).await, Err(SessionError::LobbyFull));
    }

    #[tokio::test]
    async fn test_kick() {
        let (handle, _host_inbox) = spawn();
        let (_, seat, mut inbox) = join_named(&handle, "a").await;
        assert_eq!(handle.kick(0).await, Err(SessionError::CannotKickHost));
        assert_eq!(handle.kick(3).await, Err(SessionError::SeatNotConnected(3)));
        assert_eq!(handle.kick(seat).await, Ok(()));

        let mut last = None;
        while let Some(message) = inbox.recv().await {
            last = Some(message);
        }
        assert_eq!(last, Some(ServerMessage::Kicked));
    }

    #[tokio::test]
    async fn test_only_host_starts_next_round() {
        let (handle, mut host_inbox) = spawn();
        let (id, _, mut inbox) = join_named(&handle, "a").await;
        handle
            .submit(id, ClientMessage::StartNextRound)
            .await
            .unwrap();
        handle.submit_as_host(ClientMessage::StartNextRound).await.unwrap();
        let _ = handle.snapshot().await.unwrap();

        let errors = |inbox: &mut mpsc::Receiver<ServerMessage>| {
            let mut kinds = Vec::new();
            while let Ok(message) = inbox.try_recv() {
                if let ServerMessage::Error(notice) = message {
                    kinds.push(notice.kind);
                }
            }
            kinds
        };
        assert_eq!(errors(&mut inbox), vec![ErrorKind::Session]);
        assert_eq!(errors(&mut host_inbox), vec![ErrorKind::RoundUnplayable]);
    }

    #[tokio::test]
    async fn test_close_notifies_everyone() {
        let (handle, mut host_inbox) = spawn();
        let (_, _, mut inbox) = join_named(&handle, "a").await;
        handle.close().await.unwrap();

        let mut last = None;
        while let Some(message) = inbox.recv().await {
            last = Some(message);
        }
        assert!(matches!(
            last,
            Some(ServerMessage::Disconnected(DisconnectNotice { player_id: 0, .. }))
        ));
        while host_inbox.recv().await.is_some() {}
        assert!(handle.close().await.is_err());
    }

    #[tokio::test]
    async fn test_hidden_mode_round_sets_card_aside() {
        let config = SessionConfig {
            game_mode: GameMode::FirstCardHidden,
            seed: Some(5),
            ..Default::default()
        };
        let (actor, handle, _host_inbox) = SessionActor::new(config).unwrap();
        tokio::spawn(actor.run());
        let mut seats = Vec::new();
        for name in ["a", "b", "c"] {
            seats.push(join_named(&handle, name).await);
        }
        let snapshot = handle.snapshot().await.unwrap();
        assert!(snapshot.state.hidden_card.is_some());
        assert_eq!(snapshot.state.card_count(), 52);
    }
}

/// Integration tests for a hosted session over real TCP.
///
/// The host runs on Tokio; remote seats use the blocking client on plain
/// threads, the way the bots binary does.
use std::{
    io::{BufReader, Write},
    net::{SocketAddr, TcpStream},
    thread,
    time::Duration,
};

use anyhow::Error;
use mindikot::{
    Client, GameMode, GameState, Phase, SessionConfig, SessionError,
    bot::{BotDecisionMaker, BotStyle},
    constants::{HOST_SEAT, LEFT_SUFFIX},
    messages::{ClientMessage, ErrorKind, ErrorNotice, RoundSummary, ServerMessage},
    server::HostSession,
    utils,
};
use rand::{SeedableRng, rngs::StdRng};
use tokio::{task::spawn_blocking, time::timeout};

const TEST_TIMEOUT: Duration = Duration::from_secs(10);

async fn host(players: usize, game_mode: GameMode) -> HostSession {
    let config = SessionConfig {
        required_player_count: players,
        game_mode,
        host_name: "host".to_string(),
        seed: Some(7),
        ..Default::default()
    };
    HostSession::start("127.0.0.1:0", config).await.unwrap()
}

fn connect_all(addr: SocketAddr, count: usize) -> Vec<Client> {
    (1..=count)
        .map(|i| Client::connect(&format!("player{i}"), &addr).unwrap())
        .collect()
}

fn wait_for_deal(client: &mut Client) -> GameState {
    loop {
        let state = client.recv_state().unwrap();
        if state.phase() != Phase::Lobby {
            return state;
        }
    }
}

fn wait_for_error(client: &mut Client) -> ErrorNotice {
    loop {
        if let ServerMessage::Error(notice) = client.recv().unwrap() {
            return notice;
        }
    }
}

/// Plays a seat with a random bot until the host leaves. Returns the
/// number of round results seen.
fn bot_seat(addr: SocketAddr, index: u64) -> Result<u32, Error> {
    let mut client = Client::connect(&format!("bot{index}"), &addr)?;
    let mut brain = BotDecisionMaker::new(BotStyle::Random, StdRng::seed_from_u64(index));
    let seat = client.player_id;
    let mut rounds = 0;
    loop {
        match client.recv()? {
            ServerMessage::GameStateUpdate(state) => {
                if let Some(input) = brain.respond(&state, seat) {
                    client.take_action(input)?;
                }
            }
            ServerMessage::RoundResult(_) => rounds += 1,
            ServerMessage::Disconnected(notice) if notice.player_id == HOST_SEAT => {
                return Ok(rounds);
            }
            _ => {}
        }
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_seats_assigned_in_join_order() {
    let session = host(4, GameMode::ChooseWhenEmpty).await;
    let addr = session.local_addr();

    let seats = spawn_blocking(move || {
        connect_all(addr, 3)
            .iter()
            .map(|client| client.player_id)
            .collect::<Vec<_>>()
    })
    .await
    .unwrap();
    assert_eq!(seats, vec![1, 2, 3]);
    session.close().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_lobby_full_rejects_extra_connection() {
    let session = host(4, GameMode::ChooseWhenEmpty).await;
    let addr = session.local_addr();

    let refused = spawn_blocking(move || {
        let _clients = connect_all(addr, 3);
        Client::connect("late", &addr).err().map(|error| error.to_string())
    })
    .await
    .unwrap();
    assert_eq!(refused.as_deref(), Some("lobby is full"));

    let snapshot = session.handle().snapshot().await.unwrap();
    assert_eq!(snapshot.connected_count(), 4);
    session.close().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_round_starts_when_all_seats_named() {
    let session = host(4, GameMode::ChooseWhenEmpty).await;
    let addr = session.local_addr();

    let state = spawn_blocking(move || {
        let mut clients = connect_all(addr, 3);
        wait_for_deal(&mut clients[2])
    })
    .await
    .unwrap();

    assert_eq!(state.phase(), Phase::AwaitingLead);
    assert_eq!(state.awaiting_input_from_player_index, Some(HOST_SEAT));
    assert!(state.players.iter().all(|player| player.hand.len() == 13));
    assert_eq!(state.players[3].name, "player3");
    session.close().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_out_of_turn_card_is_rejected() {
    let session = host(4, GameMode::ChooseWhenEmpty).await;
    let addr = session.local_addr();

    let (notice, after) = spawn_blocking(move || {
        let mut clients = connect_all(addr, 3);
        let client = &mut clients[0];
        let state = wait_for_deal(client);
        let card = state.players[client.player_id].hand[0];
        client.play_card(card).unwrap();
        let notice = wait_for_error(client);
        let after = client.recv_state().unwrap();
        (notice, after)
    })
    .await
    .unwrap();

    assert_eq!(notice.kind, ErrorKind::TurnViolation);
    assert_eq!(after.awaiting_input_from_player_index, Some(HOST_SEAT));
    assert!(after.current_trick_plays.is_empty());
    session.close().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_only_host_starts_rounds() {
    let session = host(4, GameMode::ChooseWhenEmpty).await;
    let addr = session.local_addr();

    let notice = spawn_blocking(move || {
        let mut clients = connect_all(addr, 3);
        wait_for_deal(&mut clients[0]);
        clients[0].start_next_round().unwrap();
        wait_for_error(&mut clients[0])
    })
    .await
    .unwrap();
    assert_eq!(notice.kind, ErrorKind::Session);
    session.close().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_kick_frees_seat_for_reuse() {
    let session = host(4, GameMode::ChooseWhenEmpty).await;
    let addr = session.local_addr();
    let handle = session.handle();

    let mut first = spawn_blocking(move || Client::connect("first", &addr).unwrap())
        .await
        .unwrap();
    assert_eq!(first.player_id, 1);

    assert_eq!(handle.kick(HOST_SEAT).await, Err(SessionError::CannotKickHost));
    assert_eq!(handle.kick(2).await, Err(SessionError::SeatNotConnected(2)));
    handle.kick(1).await.unwrap();

    let (kicked, reseated) = spawn_blocking(move || {
        let kicked = loop {
            match first.recv() {
                Ok(ServerMessage::Kicked) => break true,
                Ok(_) => {}
                Err(_) => break false,
            }
        };
        let second = Client::connect("second", &addr).unwrap();
        (kicked, second.player_id)
    })
    .await
    .unwrap();

    assert!(kicked);
    assert_eq!(reseated, 1);
    session.close().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_unreadable_line_closes_only_that_connection() {
    let session = host(4, GameMode::ChooseWhenEmpty).await;
    let addr = session.local_addr();

    let (notice, closed) = spawn_blocking(move || {
        let stream = TcpStream::connect(addr).unwrap();
        stream
            .set_read_timeout(Some(Duration::from_secs(5)))
            .unwrap();
        let mut writer = stream.try_clone().unwrap();
        let mut reader = BufReader::new(stream);

        let assigned: ServerMessage = utils::read_line(&mut reader).unwrap();
        assert_eq!(assigned, ServerMessage::AssignId(1));
        writer.write_all(b"this is not json\n").unwrap();

        let notice = loop {
            match utils::read_line::<ServerMessage, _>(&mut reader).unwrap() {
                ServerMessage::Error(notice) => break notice,
                _ => continue,
            }
        };
        let closed = utils::read_line::<ServerMessage, _>(&mut reader).is_err();
        (notice, closed)
    })
    .await
    .unwrap();

    assert_eq!(notice.kind, ErrorKind::Protocol);
    assert!(closed);

    // The seat is free again and the session is still up.
    let snapshot = session.handle().snapshot().await.unwrap();
    assert_eq!(snapshot.connected, vec![true, false, false, false]);
    session.close().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_non_utf8_line_is_a_protocol_error() {
    let session = host(4, GameMode::ChooseWhenEmpty).await;
    let addr = session.local_addr();

    let notices = spawn_blocking(move || {
        let stream = TcpStream::connect(addr).unwrap();
        stream
            .set_read_timeout(Some(Duration::from_secs(5)))
            .unwrap();
        let mut writer = stream.try_clone().unwrap();
        let mut reader = BufReader::new(stream);

        let assigned: ServerMessage = utils::read_line(&mut reader).unwrap();
        assert_eq!(assigned, ServerMessage::AssignId(1));
        writer.write_all(b"\xff\xfe\xfd\n").unwrap();

        // Read until the host hangs up.
        let mut notices = Vec::new();
        while let Ok(message) = utils::read_line::<ServerMessage, _>(&mut reader) {
            if let ServerMessage::Error(notice) = message {
                notices.push(notice);
            }
        }
        notices
    })
    .await
    .unwrap();

    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].kind, ErrorKind::Protocol);

    let snapshot = session.handle().snapshot().await.unwrap();
    assert_eq!(snapshot.connected, vec![true, false, false, false]);
    session.close().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_mid_round_disconnect_is_broadcast() {
    let session = host(4, GameMode::ChooseWhenEmpty).await;
    let addr = session.local_addr();

    let (notice, error, state) = spawn_blocking(move || {
        let mut clients = connect_all(addr, 3);
        for client in &mut clients {
            wait_for_deal(client);
        }
        let leaver = clients.pop().unwrap();
        let leaver_seat = leaver.player_id;
        leaver.disconnect().unwrap();

        let observer = &mut clients[0];
        let notice = loop {
            if let ServerMessage::Disconnected(notice) = observer.recv().unwrap() {
                assert_eq!(notice.player_id, leaver_seat);
                break notice;
            }
        };
        let state = observer.recv_state().unwrap();
        let error = wait_for_error(observer);
        (notice, error, state)
    })
    .await
    .unwrap();

    assert_eq!(notice.player_id, 3);
    assert_eq!(error.kind, ErrorKind::RoundUnplayable);
    assert!(state.players[3].name.ends_with(LEFT_SUFFIX));
    assert!(state.players[3].hand.is_empty());

    let snapshot = session.handle().snapshot().await.unwrap();
    assert!(!snapshot.round_playable);
    session.close().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_two_full_rounds_with_bots() {
    let mut session = host(4, GameMode::FirstCardHidden).await;
    let addr = session.local_addr();
    let handle = session.handle();
    let mut inbox = session.take_host_inbox().unwrap();

    let bots: Vec<_> = (1..=3)
        .map(|index| thread::spawn(move || bot_seat(addr, index)))
        .collect();

    let mut brain = BotDecisionMaker::new(BotStyle::Greedy, StdRng::seed_from_u64(99));
    let (summaries, second_deal): (Vec<RoundSummary>, GameState) = timeout(TEST_TIMEOUT, async {
        let mut summaries = Vec::new();
        let mut second_deal = None;
        while let Some(msg) = inbox.recv().await {
            match msg {
                ServerMessage::GameStateUpdate(state) => {
                    if summaries.len() == 1
                        && second_deal.is_none()
                        && state.phase() != Phase::RoundComplete
                    {
                        second_deal = Some(state.clone());
                    }
                    if let Some(input) = brain.decide(&state, HOST_SEAT) {
                        handle
                            .submit_as_host(ClientMessage::PlayerAction(input))
                            .await
                            .unwrap();
                    }
                }
                ServerMessage::RoundResult(summary) => {
                    summaries.push(summary);
                    if summaries.len() == 2 {
                        break;
                    }
                    handle
                        .submit_as_host(ClientMessage::StartNextRound)
                        .await
                        .unwrap();
                }
                _ => {}
            }
        }
        (summaries, second_deal.unwrap())
    })
    .await
    .unwrap();

    assert_eq!(summaries[0].round_number, 1);
    assert_eq!(summaries[1].round_number, 2);
    assert_eq!(summaries[1].scoreboard.rounds_played, 2);
    for summary in &summaries {
        assert_eq!(summary.result.tens_by_team.values().sum::<usize>(), 4);
    }
    // Leadership rotates each round.
    assert_eq!(second_deal.awaiting_input_from_player_index, Some(1));

    let snapshot = handle.snapshot().await.unwrap();
    assert_eq!(snapshot.state.phase(), Phase::RoundComplete);
    assert_eq!(snapshot.state.card_count(), 52);
    assert_eq!(
        snapshot.state.tricks_won.values().sum::<u32>(),
        13,
        "every trick goes to a team"
    );

    session.close().await;
    for bot in bots {
        assert_eq!(bot.join().unwrap().unwrap(), 2);
    }
}

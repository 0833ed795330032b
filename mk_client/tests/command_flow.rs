//! Typed commands driven against a real host over TCP.

use mindikot::{
    Client, GameMode, Phase, SessionConfig,
    constants::HOST_SEAT,
    messages::{ErrorKind, ServerMessage},
    server::HostSession,
};
use mk_client::{
    commands::{Command, parse_command},
    display,
};
use tokio::task::spawn_blocking;

fn send_typed(client: &mut Client, line: &str) {
    let command = parse_command(line).unwrap();
    let msg = command.to_client_message().unwrap();
    client.send(&msg).unwrap();
}

fn next_error_kind(client: &mut Client) -> ErrorKind {
    loop {
        if let ServerMessage::Error(notice) = client.recv().unwrap() {
            return notice.kind;
        }
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_typed_commands_reach_the_host() {
    let config = SessionConfig {
        game_mode: GameMode::ChooseWhenEmpty,
        host_name: "host".to_string(),
        seed: Some(5),
        ..Default::default()
    };
    let session = HostSession::start("127.0.0.1:0", config).await.unwrap();
    let addr = session.local_addr();

    let (kinds, rendered) = spawn_blocking(move || {
        let mut clients: Vec<Client> = (1..=3)
            .map(|i| Client::connect(&format!("typist{i}"), &addr).unwrap())
            .collect();
        let client = &mut clients[0];
        let state = loop {
            let state = client.recv_state().unwrap();
            if state.phase() != Phase::Lobby {
                break state;
            }
        };
        assert_eq!(state.awaiting_input_from_player_index, Some(HOST_SEAT));

        let mut kinds = Vec::new();
        send_typed(client, "next");
        kinds.push(next_error_kind(client));

        let card = state.players[client.player_id].hand[0];
        let line = format!("play {}", card.to_string().trim());
        assert_eq!(parse_command(&line), Ok(Command::Play(card)));
        send_typed(client, &line);
        kinds.push(next_error_kind(client));

        send_typed(client, "reveal");
        kinds.push(next_error_kind(client));

        (kinds, display::render_state(&state, client.player_id))
    })
    .await
    .unwrap();

    assert_eq!(
        kinds,
        vec![
            ErrorKind::Session,
            ErrorKind::TurnViolation,
            ErrorKind::TurnViolation
        ]
    );
    assert!(rendered.contains("(you)"));
    assert!(rendered.contains("[0] host"));
    session.close().await;
}

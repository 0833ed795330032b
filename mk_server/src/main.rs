//! Hosts a Mindikot session on the local network.
//!
//! The host plays seat 0 from this terminal while remote players join
//! with `mk_client` (or `mk_bots`). The session actor owns the game; this
//! binary only feeds it the host's commands and prints what it sends back.

mod config;
mod logging;

use anyhow::{Context, Error};
use ctrlc::set_handler;
use log::{info, warn};
use mindikot::{
    GameMode, constants::HOST_SEAT, messages::ServerMessage, server::HostSession,
    session::SessionSnapshot,
};
use mk_client::{
    commands::{COMMAND_HELP, Command, parse_command},
    display,
};
use pico_args::Arguments;
use std::net::SocketAddr;
use tokio::{
    io::{AsyncBufReadExt, BufReader, stdin},
    sync::mpsc,
};

use config::{HostConfig, Overrides};

const HELP: &str = "\
Host a Mindikot game

USAGE:
  mk_server [OPTIONS]

OPTIONS:
  --bind     IP:PORT     Listen address      [default: env MINDIKOT_BIND or 0.0.0.0:6969]
  --players  N           4 or 6              [default: env MINDIKOT_PLAYERS or 4]
  --mode     MODE        'choose' or 'hidden' [default: env MINDIKOT_MODE or choose]
  --name     NAME        Host's display name [default: env MINDIKOT_HOST_NAME or $USER]

FLAGS:
  -h, --help             Print help information

ENVIRONMENT:
  MINDIKOT_OUTBOUND_BUFFER  Messages queued per connection  [default: 64]
  MINDIKOT_SEED             Fixed shuffle seed
  (A .env file in the working directory is read first.)
";

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let overrides = Overrides {
        bind: pargs.opt_value_from_str::<_, SocketAddr>("--bind")?,
        players: pargs.opt_value_from_str("--players")?,
        mode: pargs.opt_value_from_str::<_, GameMode>("--mode")?,
        name: pargs.opt_value_from_str("--name")?,
    };
    let config = HostConfig::from_env(overrides)?;
    config.validate()?;

    // Catching signals for exit.
    set_handler(|| std::process::exit(0))?;

    logging::init();
    info!(
        "hosting a {}-player game in {} mode as {}",
        config.players, config.mode, config.host_name
    );

    let mut session = HostSession::start(config.bind, config.session_config())
        .await
        .context("couldn't start the session")?;
    println!(
        "listening on {}; others join with: mk_client --server <this machine>:{}",
        session.local_addr(),
        session.local_addr().port()
    );
    println!("{COMMAND_HELP}");

    let inbox = session
        .take_host_inbox()
        .context("host inbox already taken")?;
    let printer = tokio::spawn(print_host_messages(inbox));

    let handle = session.handle();
    let mut lines = BufReader::new(stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let command = match parse_command(&line) {
            Ok(command) => command,
            Err(error) => {
                println!("{error}");
                continue;
            }
        };

        match command {
            Command::Help => println!("{COMMAND_HELP}"),
            Command::Quit => break,
            Command::Show => match handle.snapshot().await {
                Ok(snapshot) => print!("{}", render_snapshot(&snapshot)),
                Err(error) => {
                    warn!("{error}");
                    break;
                }
            },
            Command::Kick(seat) => match handle.kick(seat).await {
                Ok(()) => println!("removed seat {seat}"),
                Err(error) => println!("can't kick seat {seat}: {error}"),
            },
            command => {
                let Some(msg) = command.to_client_message() else {
                    continue;
                };
                if handle.submit_as_host(msg).await.is_err() {
                    break;
                }
            }
        }
    }

    session.close().await;
    printer.abort();
    Ok(())
}

async fn print_host_messages(mut inbox: mpsc::Receiver<ServerMessage>) {
    while let Some(msg) = inbox.recv().await {
        println!("{}", display::render_message(&msg, HOST_SEAT));
    }
}

fn render_snapshot(snapshot: &SessionSnapshot) -> String {
    let seats = snapshot
        .connected
        .iter()
        .enumerate()
        .map(|(seat, connected)| format!("[{seat}] {}", if *connected { "up" } else { "down" }))
        .collect::<Vec<_>>()
        .join(" ");
    format!(
        "{}round {} | {} | seats {seats}{}\n",
        display::render_state(&snapshot.state, HOST_SEAT),
        snapshot.round_number,
        snapshot.scoreboard,
        if snapshot.round_playable {
            ""
        } else {
            " | round unplayable"
        }
    )
}

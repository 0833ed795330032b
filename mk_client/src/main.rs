//! Joins a Mindikot host as a remote seat.
//!
//! One task reads the host's lines and prints them; the main task reads
//! commands from stdin and sends them.

use anyhow::{Context, Error, bail};
use log::{debug, info};
use mindikot::{
    GameState, PlayerId,
    constants::HOST_SEAT,
    messages::{ClientMessage, ServerMessage},
    utils,
};
use mk_client::{
    commands::{COMMAND_HELP, Command, parse_command},
    display,
};
use pico_args::Arguments;
use std::net::SocketAddr;
use tokio::{
    io::{AsyncBufReadExt, BufReader, stdin},
    net::{TcpStream, tcp::OwnedReadHalf},
    sync::watch,
};

const HELP: &str = "\
Join a Mindikot game

USAGE:
  mk_client [OPTIONS]

OPTIONS:
  --server  IP:PORT     Host address  [default: 127.0.0.1:6969]
  --name    NAME        Display name  [default: $USER]

FLAGS:
  -h, --help            Print help information
";

struct Args {
    server: SocketAddr,
    name: String,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let args = Args {
        server: pargs
            .opt_value_from_str("--server")?
            .unwrap_or_else(|| SocketAddr::from(([127, 0, 0, 1], 6969))),
        name: pargs
            .opt_value_from_str("--name")?
            .unwrap_or_else(whoami::username),
    };

    env_logger::builder().format_target(false).init();
    run(args).await
}

async fn run(args: Args) -> Result<(), Error> {
    let stream = TcpStream::connect(args.server)
        .await
        .with_context(|| format!("couldn't reach {}", args.server))?;
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);

    let seat = match utils::read_line_async::<ServerMessage, _>(&mut reader).await? {
        ServerMessage::AssignId(seat) => seat,
        ServerMessage::LobbyFull => bail!("the lobby is full"),
        other => bail!("unexpected greeting from host: {other}"),
    };
    utils::write_line_async(&mut write_half, &ClientMessage::PlayerName(args.name.clone()))
        .await?;
    info!("joined {} as {} in seat {seat}", args.server, args.name);
    println!("{COMMAND_HELP}");

    let (latest_tx, latest_rx) = watch::channel(None);
    let mut printer = tokio::spawn(print_messages(reader, seat, latest_tx));

    let mut lines = BufReader::new(stdin()).lines();
    loop {
        tokio::select! {
            ended = &mut printer => return ended?,
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
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
                    Command::Show => match latest_rx.borrow().as_ref() {
                        Some(state) => print!("{}", display::render_state(state, seat)),
                        None => println!("no game state yet"),
                    },
                    Command::Kick(_) => println!("only the host can kick players"),
                    command => {
                        if let Some(msg) = command.to_client_message() {
                            debug!("sending {msg}");
                            utils::write_line_async(&mut write_half, &msg).await?;
                        }
                        if command == Command::Quit {
                            break;
                        }
                    }
                }
            }
        }
    }

    printer.abort();
    Ok(())
}

/// Prints everything the host sends until the host goes away or removes us.
async fn print_messages(
    mut reader: BufReader<OwnedReadHalf>,
    seat: PlayerId,
    latest: watch::Sender<Option<GameState>>,
) -> Result<(), Error> {
    loop {
        let msg: ServerMessage = utils::read_line_async(&mut reader).await?;
        println!("{}", display::render_message(&msg, seat));
        match msg {
            ServerMessage::GameStateUpdate(state) => {
                latest.send_replace(Some(state));
            }
            ServerMessage::Kicked => bail!("removed by the host"),
            ServerMessage::Disconnected(notice) if notice.player_id == HOST_SEAT => {
                info!("host ended the session");
                return Ok(());
            }
            _ => {}
        }
    }
}

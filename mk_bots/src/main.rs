//! Fills seats at a Mindikot host with bots.
//!
//! Each bot runs on its own thread with a blocking client and answers every
//! snapshot that asks it for input. Bots never start rounds; that stays
//! with the host.

use anyhow::{Error, bail};
use ctrlc::set_handler;
use log::{debug, info, warn};
use mindikot::{
    Client,
    bot::{BotDecisionMaker, BotStyle},
    constants::HOST_SEAT,
    messages::ServerMessage,
};
use pico_args::Arguments;
use rand::{SeedableRng, rngs::StdRng};
use std::{net::SocketAddr, thread};

const HELP: &str = "\
Connect practice bots to a Mindikot host

USAGE:
  mk_bots [OPTIONS]

OPTIONS:
  --server  IP:PORT     Host address              [default: 127.0.0.1:6969]
  --bots    N           Number of bots to connect [default: 3]
  --seed    SEED        Base seed for bot choices [default: random]
  --style   STYLE       'random' or 'greedy'      [default: greedy]

FLAGS:
  -h, --help            Print help information
";

struct Args {
    server: SocketAddr,
    bots: usize,
    seed: Option<u64>,
    style: BotStyle,
}

fn main() -> Result<(), Error> {
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
        bots: pargs.opt_value_from_str("--bots")?.unwrap_or(3),
        seed: pargs.opt_value_from_str("--seed")?,
        style: pargs
            .opt_value_from_str("--style")?
            .unwrap_or(BotStyle::Greedy),
    };
    if args.bots == 0 {
        bail!("--bots must be at least 1");
    }

    // Catching signals for exit.
    set_handler(|| std::process::exit(0))?;

    env_logger::builder().format_target(false).init();
    info!(
        "connecting {} {} bot(s) to {}",
        args.bots, args.style, args.server
    );

    let workers: Vec<_> = (0..args.bots)
        .map(|index| {
            let rng = match args.seed {
                Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(index as u64)),
                None => StdRng::from_os_rng(),
            };
            let name = format!("bot-{}", index + 1);
            let (server, style) = (args.server, args.style);
            thread::spawn(move || {
                if let Err(error) = run_bot(&name, &server, BotDecisionMaker::new(style, rng)) {
                    warn!("{name} stopped: {error}");
                }
            })
        })
        .collect();

    for worker in workers {
        if worker.join().is_err() {
            warn!("a bot thread panicked");
        }
    }
    Ok(())
}

fn run_bot(
    name: &str,
    server: &SocketAddr,
    mut brain: BotDecisionMaker<StdRng>,
) -> Result<(), Error> {
    let mut client = Client::connect(name, server)?;
    client.set_read_timeout(None)?;
    let seat = client.player_id;
    info!("{name} seated as {seat}");

    loop {
        match client.recv()? {
            ServerMessage::GameStateUpdate(state) => {
                if let Some(input) = brain.respond(&state, seat) {
                    debug!("{name} {input}");
                    client.take_action(input)?;
                }
            }
            ServerMessage::RoundResult(summary) => {
                debug!("{name} saw round {} end", summary.round_number);
            }
            ServerMessage::Error(notice) => {
                warn!("{name} was refused: {notice}");
                brain.forget_answer();
            }
            ServerMessage::Disconnected(notice) if notice.player_id == HOST_SEAT => {
                info!("{name}: host ended the session");
                return Ok(());
            }
            ServerMessage::Kicked => bail!("kicked by the host"),
            other => debug!("{name}: {other}"),
        }
    }
}

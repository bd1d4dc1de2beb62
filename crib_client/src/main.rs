//! A terminal client for a networked cribbage server.
//!
//! The client joins one game, polls its state, and reads commands from
//! stdin to select, discard and play cards.

use anyhow::{Context, Result};
use pico_args::Arguments;
use std::{
    io::{self, Write},
    sync::Arc,
};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::{mpsc, watch},
};
use tracing::{error, info};

use crib_client::{
    api_client::ApiClient,
    commands::{self, Command},
    config::ClientConfig,
    display,
    logging,
    sync::SyncController,
};
use cribbage::{PlayerIdentity, Session};

const HELP: &str = "\
Play cribbage against a networked game server

USAGE:
  crib_client [OPTIONS]

OPTIONS:
  --server URL          Server URL  [default: $CRIB_SERVER_URL or http://localhost:5000]
  --game ID             Game to join  [default: $CRIB_GAME_ID or FIRST_GAME]
  --name NAME           Display name  [default: your login name]
  --id ID               Player id  [default: player_<unix millis>]

FLAGS:
  --list                List the server's games and exit
  -h, --help            Print help information
";

struct Args {
    server_url: Option<String>,
    game_id: Option<String>,
    name: Option<String>,
    player_id: Option<String>,
    list: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let mut pargs = Arguments::from_env();

    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let args = Args {
        server_url: pargs.opt_value_from_str("--server")?,
        game_id: pargs.opt_value_from_str("--game")?,
        name: pargs.opt_value_from_str("--name")?,
        player_id: pargs.opt_value_from_str("--id")?,
        list: pargs.contains("--list"),
    };

    logging::init();
    if let Err(e) = run(args).await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
    // The stdin reader may still be parked in a blocking read.
    std::process::exit(0);
}

async fn run(args: Args) -> Result<()> {
    let config = ClientConfig::from_env(args.server_url, args.game_id)
        .context("Invalid client configuration")?;
    info!(server = %config.server_url, game = %config.game_id, "client configured");

    let api = ApiClient::with_timeout(
        config.server_url.clone(),
        config.game_id.clone(),
        config.request_timeout(),
    )
    .context("Failed to build HTTP client")?;

    if args.list {
        let games = api.list_games().await.context("Failed to list games")?;
        if games.is_empty() {
            println!("No games available!");
        }
        for game in games {
            println!("  {game}");
        }
        return Ok(());
    }

    let name = args.name.unwrap_or_else(whoami::username);
    let player_id = args
        .player_id
        .unwrap_or_else(|| format!("player_{}", chrono::Utc::now().timestamp_millis()));
    let identity = PlayerIdentity::new(player_id, name);
    println!("Joining {} as {identity}...", config.game_id);

    let mut controller = SyncController::new(Arc::new(api), identity, config.sync_config());
    let stop = controller.stop_handle();
    let (command_tx, command_rx) = mpsc::channel(32);

    tokio::spawn(present(controller.subscribe()));
    tokio::spawn(read_commands(command_tx));
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupted");
            stop.stop();
        }
    });

    let result = controller.run(command_rx).await;
    println!("\nGoodbye!");
    result.context("Lost the game session")
}

/// Redraw the table every time the session changes.
async fn present(mut updates: watch::Receiver<Session>) {
    while updates.changed().await.is_ok() {
        let text = display::render(&updates.borrow_and_update());
        print!("{}{text}> ", display::CLEAR_SCREEN);
        let _ = io::stdout().flush();
    }
}

/// Forward parsed stdin lines to the controller until it stops listening.
async fn read_commands(tx: mpsc::Sender<Command>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                error!(error = %e, "failed to read stdin");
                break;
            }
        };

        match commands::parse_command(&line) {
            Ok(Command::Help) => print!("{}> ", commands::HELP),
            Ok(command) => {
                if tx.send(command).await.is_err() {
                    break;
                }
            }
            Err(e) => print!("{e}\n> "),
        }
        let _ = io::stdout().flush();
    }
}

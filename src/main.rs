//! iscat - terminal client for the ISC relay chat protocol.
//!
//! Connects to a relay, renders the broadcast chat in a TUI and plays
//! the relay's cryptography exercises.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::LevelFilter;
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::mpsc;

use iscat::client::{ClientEvent, ClientHandle, RelayClient, StatusEvent, LABEL_YOU};
use iscat::command::{self, Action};
use iscat::config::{ClientConfig, DEFAULT_HOST, DEFAULT_IMAGE_DIR, DEFAULT_PORT};
use iscat::tasks::{CipherDirection, HashMode, TaskRequest};
use iscat::tui::{self, App, ConnectionStatus, Event, EventHandler, KeyAction};

/// iscat - terminal client for the ISC relay chat protocol
#[derive(Parser)]
#[command(name = "iscat")]
#[command(version)]
#[command(about = "Terminal client for the ISC relay chat protocol")]
struct Cli {
    /// Verbose logging (debug level, written to iscat.log)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect to a relay and open the chat interface
    Connect {
        /// Relay host name or address
        #[arg(default_value = DEFAULT_HOST)]
        host: String,

        /// Relay TCP port
        #[arg(short, long, default_value_t = DEFAULT_PORT)]
        port: u16,

        /// Directory where received images are saved
        #[arg(long, default_value = DEFAULT_IMAGE_DIR)]
        image_dir: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    match cli.command {
        Commands::Connect {
            host,
            port,
            image_dir,
        } => {
            let mut config = ClientConfig::new(host, port);
            config.image_dir = image_dir;
            run_chat(config).await
        }
    }
}

/// Routes log output to a file so it cannot scribble over the TUI.
fn init_logging(verbose: bool) -> Result<()> {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let log_file = std::fs::File::create("iscat.log").context("Failed to create iscat.log")?;
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .init();
    Ok(())
}

/// Connects to the relay and runs the chat TUI until quit.
async fn run_chat(config: ClientConfig) -> Result<()> {
    let addr = config.addr();
    let (client, mut client_events) = RelayClient::connect(config)
        .await
        .with_context(|| format!("Failed to connect to {}", addr))?;

    let mut terminal = tui::init_terminal().context("Failed to initialize terminal")?;

    let mut app = App::new(addr);
    app.set_status(ConnectionStatus::Connected);
    app.add_system_message(format!("Connected to {}", app.relay_addr));
    app.add_system_message("Type /help for commands");

    let mut input_events = EventHandler::new();
    EventHandler::spawn_reader(input_events.sender(), Duration::from_millis(100));

    let result = run_loop(
        &mut terminal,
        &mut app,
        &client,
        &mut client_events,
        &mut input_events,
    )
    .await;

    client.close();
    tui::restore_terminal(&mut terminal).context("Failed to restore terminal")?;
    result
}

/// Draws the interface and dispatches terminal and client events.
async fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    client: &ClientHandle,
    client_events: &mut mpsc::UnboundedReceiver<ClientEvent>,
    input_events: &mut EventHandler,
) -> Result<()> {
    let mut client_gone = false;

    loop {
        terminal.draw(|frame| tui::render(frame, app))?;

        tokio::select! {
            event = input_events.next() => {
                match event {
                    Some(Event::Key(key)) => match tui::handle_key_event(app, key) {
                        KeyAction::Quit => break,
                        KeyAction::Submit => {
                            let line = app.take_input();
                            submit_line(app, client, &line);
                        }
                        KeyAction::None => {}
                    },
                    // Ticks and resizes just trigger the next draw
                    Some(_) => {}
                    None => break,
                }
            }
            event = client_events.recv(), if !client_gone => {
                match event {
                    Some(event) => apply_client_event(app, event),
                    None => {
                        client_gone = true;
                        app.set_status(ConnectionStatus::Error("client task stopped".to_string()));
                        app.add_system_message("Client task stopped");
                    }
                }
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

/// Interprets a submitted line and routes it to the client or the TUI.
fn submit_line(app: &mut App, client: &ClientHandle, line: &str) {
    let directive = command::interpret(line);

    if let Some(request) = directive.armed {
        client.start_task(request);
        app.add_system_message(format!("Task armed: {}", describe_task(request)));
    }

    match directive.action {
        Action::Send { kind, text } => client.send_message(kind, text),
        Action::Crypto(lines) => {
            for line in lines {
                app.add_crypto_message(line);
            }
        }
        Action::Arm(request) => {
            client.start_task(request);
            app.add_system_message(format!("Task armed: {}", describe_task(request)));
        }
        Action::Tui => {
            tui::handle_command(app, line);
        }
    }
}

fn describe_task(request: TaskRequest) -> String {
    let direction = |d: CipherDirection| match d {
        CipherDirection::Encode => "encode",
        CipherDirection::Decode => "decode",
    };
    match request {
        TaskRequest::Shift(d) => format!("shift {}", direction(d)),
        TaskRequest::Vigenere(d) => format!("vigenere {}", direction(d)),
        TaskRequest::Rsa(d) => format!("RSA {}", direction(d)),
        TaskRequest::Hash(HashMode::Generate) => "hash generate".to_string(),
        TaskRequest::Hash(HashMode::Verify) => "hash verify".to_string(),
        TaskRequest::Dh => "Diffie-Hellman".to_string(),
    }
}

/// Applies one event from the background client task to the app state.
fn apply_client_event(app: &mut App, event: ClientEvent) {
    match event {
        ClientEvent::Message { label, text } => {
            if label == LABEL_YOU {
                app.add_my_message(text);
            } else {
                app.add_wire_message(label, text);
            }
        }
        ClientEvent::Image { index, path } => {
            app.add_system_message(format!("Image {} saved to {}", index, path.display()));
        }
        ClientEvent::Status(status) => apply_status_event(app, status),
    }
}

fn apply_status_event(app: &mut App, status: StatusEvent) {
    match status {
        StatusEvent::ConnectionLost { reason } => {
            app.set_status(ConnectionStatus::Reconnecting);
            app.add_system_message(format!("Connection lost: {}", reason));
        }
        StatusEvent::Reconnected { addr } => {
            app.set_status(ConnectionStatus::Connected);
            app.add_system_message(format!("Reconnected to {}", addr));
        }
        StatusEvent::ReconnectFailed { reason } => {
            app.set_status(ConnectionStatus::Error(reason.clone()));
            app.add_system_message(format!("Reconnect failed: {}", reason));
        }
        StatusEvent::SendFailed { reason } => {
            app.add_system_message(format!("Send failed: {}", reason));
        }
        StatusEvent::TaskFailed { reason } => {
            app.add_system_message(format!("Task failed: {}", reason));
        }
    }
}

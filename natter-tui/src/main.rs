//! natter: terminal client for the natter chat protocol.
//!
//! The binary owns everything the SDK treats as external: the
//! process-lifetime queues, the ratatui display, the persistence task,
//! CLI/env configuration and logging. The SDK core runs as one spawned
//! task and is wound down through the shutdown watch when the user
//! closes the TUI.

mod app;
mod persist;
mod ui;

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use crossterm::event::{Event, EventStream, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use futures_util::StreamExt;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing_subscriber::EnvFilter;

use natter_sdk::client::{self, Outbound, ReconnectConfig};
use natter_sdk::{ChatError, Settings, StatusUpdate, settings};

use crate::app::App;

#[derive(Parser)]
#[command(name = "natter", about = "Terminal client for the natter chat")]
struct Args {
    /// Chat server host
    #[arg(long, env = "NATTER_HOST", default_value = "chat.natter.net")]
    host: String,

    /// Port to stream messages from
    #[arg(long, env = "NATTER_READ_PORT", default_value_t = 5000)]
    read_port: u16,

    /// Port to send messages to
    #[arg(long, env = "NATTER_WRITE_PORT", default_value_t = 5050)]
    write_port: u16,

    /// File received messages are appended to
    #[arg(long, env = "NATTER_MESSAGES_FILE", default_value = "messages.txt")]
    messages_file: PathBuf,

    /// Display name shown until authentication
    #[arg(long, env = "NATTER_NAME", default_value = "Anonymous")]
    name: String,

    /// Access token (falls back to the token file)
    #[arg(long, env = "NATTER_TOKEN")]
    token: Option<String>,

    /// Token file path
    #[arg(long, env = "NATTER_TOKEN_FILE")]
    token_file: Option<PathBuf>,

    /// Write logs here instead of stderr, keeping the alternate screen clean
    #[arg(long, env = "NATTER_LOG_FILE")]
    log_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.log_file.as_deref())?;

    let token_file = args
        .token_file
        .clone()
        .unwrap_or_else(settings::default_token_path);
    let token = settings::resolve_token(args.token.as_deref(), &token_file)?;

    let chat_settings = Settings {
        host: args.host.clone(),
        read_port: args.read_port,
        write_port: args.write_port,
        display_name: args.name.clone(),
        token,
    };

    // Process-lifetime queues. They outlive individual reconnect
    // cycles, so typed-but-unsent lines are not lost.
    let (incoming_tx, mut incoming_rx) = mpsc::unbounded_channel();
    let (persist_tx, persist_rx) = mpsc::unbounded_channel();
    let (status_tx, mut status_rx) = mpsc::unbounded_channel();
    let (outgoing_tx, outgoing_rx) = mpsc::unbounded_channel();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let persister = tokio::spawn(persist::save_messages(
        persist_rx,
        args.messages_file.clone(),
    ));
    let outbound = Outbound {
        incoming: incoming_tx,
        persist: persist_tx,
        status: status_tx,
    };
    let mut client = tokio::spawn(client::run(
        chat_settings,
        ReconnectConfig::default(),
        outbound,
        outgoing_rx,
        shutdown_rx,
    ));

    let mut app = App::new(&args.name);
    let tui_result = run_tui(
        &mut app,
        &mut incoming_rx,
        &mut status_rx,
        &outgoing_tx,
        &mut client,
    )
    .await;
    restore_terminal();
    let exit = tui_result?;

    // Wind the core down regardless of how the TUI ended.
    shutdown_tx.send_replace(true);
    drop(outgoing_tx);
    let core = match exit {
        Exit::Client(result) => result,
        Exit::User => tokio::time::timeout(Duration::from_secs(5), client)
            .await
            .map_err(|_| anyhow::anyhow!("chat core did not stop after shutdown"))??,
    };

    // The core dropped its persist sender; the persister drains the
    // queue and stops.
    let persisted = tokio::time::timeout(Duration::from_secs(5), persister)
        .await
        .map_err(|_| anyhow::anyhow!("persister did not stop"))?;
    persisted??;

    core?;
    eprintln!("natter: closed.");
    Ok(())
}

/// How the TUI loop ended.
enum Exit {
    /// The user closed the TUI.
    User,
    /// The core finished on its own: a fatal error, or a clean stop.
    Client(Result<(), ChatError>),
}

async fn run_tui(
    app: &mut App,
    incoming: &mut mpsc::UnboundedReceiver<String>,
    status: &mut mpsc::UnboundedReceiver<StatusUpdate>,
    outgoing: &mpsc::UnboundedSender<String>,
    client: &mut JoinHandle<Result<(), ChatError>>,
) -> Result<Exit> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    let mut events = EventStream::new();

    let exit = loop {
        terminal.draw(|frame| ui::draw(frame, app))?;
        tokio::select! {
            maybe_event = events.next() => {
                match maybe_event {
                    Some(Ok(event)) => {
                        if handle_input(event, app, outgoing) {
                            break Exit::User;
                        }
                    }
                    Some(Err(e)) => tracing::warn!(error = %e, "terminal event error"),
                    None => break Exit::User,
                }
            }
            Some(line) = incoming.recv() => app.push_chat(&line),
            Some(update) = status.recv() => app.apply_status(update),
            result = &mut *client => {
                break Exit::Client(result?);
            }
        }
    };

    Ok(exit)
}

/// Returns true when the user asked to quit.
fn handle_input(event: Event, app: &mut App, outgoing: &mpsc::UnboundedSender<String>) -> bool {
    let Event::Key(key) = event else {
        return false;
    };
    if key.kind != KeyEventKind::Press {
        return false;
    }
    match key.code {
        KeyCode::Esc => app.should_quit = true,
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.should_quit = true;
        }
        KeyCode::Enter => {
            let line = app.input_take();
            let line = line.trim();
            if !line.is_empty() {
                // The core dequeues this in the writer loop.
                let _ = outgoing.send(line.to_string());
            }
        }
        KeyCode::Backspace => {
            app.input.pop();
        }
        KeyCode::Up => app.scroll_up(),
        KeyCode::Down => app.scroll_down(),
        KeyCode::Char(c) => app.input.push(c),
        _ => {}
    }
    app.should_quit
}

fn restore_terminal() {
    let _ = disable_raw_mode();
    let _ = execute!(io::stdout(), LeaveAlternateScreen);
}

fn init_logging(log_file: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "natter=info,natter_sdk=info".into());
    match log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::sync::Mutex::new(file))
                .with_ansi(false)
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(io::stderr)
                .init();
        }
    }
    Ok(())
}

//! # Macrokey CLI Entry Point
//!
//! This is the main entry point for the Macrokey TUI application.
//!
//! ## Overview
//!
//! Macrokey is a terminal editor for macro scripts. Each item pairs a script
//! with an optional key name; running an item pipes its script to the
//! configured interpreter. Script failures show up as a banner next to the
//! editor until the next run starts.
//!
//! ## Usage
//!
//! ```bash
//! # Open the editor on the default data directory
//! macrokey
//!
//! # Keep items somewhere else
//! macrokey --data-dir ./macros
//!
//! # Print the saved items and exit
//! macrokey --list
//!
//! # Run the item bound to a key without opening the UI
//! macrokey --run F13
//! ```
//!
//! ## Architecture
//!
//! 1. **Host**: [`LocalHost`] owns the item list, persists it and runs scripts
//! 2. **Bridge**: forwards editor requests to the host, ordered per item
//! 3. **Relay**: mirrors host notifications into observable cells
//! 4. **UI**: the coordinator and view state, drawn with ratatui
//!
//! ## Key Bindings
//!
//! ### Item List (left panel)
//! - `q` - Quit (pending edits are saved)
//! - `j` / `Down`, `k` / `Up` - Move the list cursor
//! - `Enter` - Open the item in the editor
//! - `n` - New item, `r` - Rename, `a` - Assign key, `d` - Delete
//! - `x` / `F5` - Run the selected item
//! - `?` - Show/hide help
//!
//! ### Editor (right panel)
//! - `Ctrl+S` - Save
//! - `F5` - Run
//! - `Esc` - Return focus to the item list

use macrokey::editor::Coordinator;
use macrokey::host::{spawn_bridge, Host, HostNotification, HostReply, LocalHost, ScriptRunner};
use macrokey::item::{self, Item, ItemStore};
use macrokey::relay::EventRelay;
use macrokey::ui::{self, config::Config, input, App};

use anyhow::{bail, Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::io;
use std::panic;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tracing_appender::non_blocking::WorkerGuard;

/// Log file written inside the data directory
const LOG_FILE_NAME: &str = "macrokey.log";

/// Environment variable holding the log filter
const LOG_ENV: &str = "MACROKEY_LOG";

/// Trait for reading terminal events (allows dependency injection for testing)
trait EventReader {
    fn read_event(&mut self, timeout: Duration) -> Result<Option<Event>>;
}

/// Production event reader that uses crossterm's event polling + read
struct CrosstermEventReader;

impl EventReader for CrosstermEventReader {
    fn read_event(&mut self, timeout: Duration) -> Result<Option<Event>> {
        if event::poll(timeout).context("Failed to poll for events")? {
            Ok(Some(
                event::read().context("Failed to read keyboard event")?,
            ))
        } else {
            Ok(None)
        }
    }
}

/// Macrokey - edit macro scripts and the keys that trigger them
#[derive(Parser, Debug)]
#[command(name = "macrokey")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Terminal editor for key-triggered macro scripts", long_about = None)]
struct Args {
    /// Directory holding items.json and the log file
    #[arg(short, long, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Read configuration from this file instead of the default location
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Print the saved items and exit
    #[arg(long, conflicts_with = "run")]
    list: bool,

    /// Run the item assigned to KEY and exit
    #[arg(long, value_name = "KEY")]
    run: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse();

    // Set up panic hook to ensure terminal is restored on panic
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        tracing::error!(target: "runtime.panic", info = %panic_info, "panic");

        original_hook(panic_info);
    }));

    let result = run_application(args).await;

    // Restore panic hook
    let _ = panic::take_hook();

    result
}

/// Route `tracing` output to `<dir>/macrokey.log`. The guard must live until
/// exit or buffered lines are lost.
fn configure_logging(dir: &Path) -> Result<Option<WorkerGuard>> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create data directory: {}", dir.display()))?;

    let file_appender = tracing_appender::rolling::never(dir, LOG_FILE_NAME);
    let (writer, guard) = tracing_appender::non_blocking(file_appender);
    let filter = tracing_subscriber::EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    match tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
    {
        Ok(()) => Ok(Some(guard)),
        // A subscriber is already installed; drop the guard so the writer shuts down
        Err(_) => Ok(None),
    }
}

async fn run_application(args: Args) -> Result<()> {
    let data_dir = match args.data_dir {
        Some(dir) => dir,
        None => item::data_dir()?,
    };
    let _log_guard = configure_logging(&data_dir)?;

    let config = match &args.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load(),
    };
    tracing::info!(
        target: "runtime",
        data_dir = %data_dir.display(),
        interpreter = ?config.interpreter,
        "startup"
    );

    let (notify_tx, mut notify_rx) = mpsc::unbounded_channel();
    let runner = ScriptRunner::new(&config.interpreter)?;
    let host = Arc::new(
        LocalHost::open(ItemStore::new(&data_dir), runner, notify_tx)
            .context("Failed to open item store")?,
    );

    if args.list {
        let items = host.list_items().await?;
        print_items(&items);
        return Ok(());
    }

    if let Some(key) = args.run {
        return run_headless(host.as_ref(), &key, &mut notify_rx).await;
    }

    let items = host.list_items().await?;

    let (request_tx, request_rx) = mpsc::unbounded_channel();
    let (reply_tx, mut reply_rx) = mpsc::unbounded_channel();
    let bridge = spawn_bridge(Arc::clone(&host), request_rx, reply_tx, config.host_timeout());

    let coordinator = Coordinator::new(items, request_tx);
    let mut relay = EventRelay::new();
    relay.error_state_mut().subscribe(|payload: &String| {
        if !payload.is_empty() {
            tracing::debug!(target: "relay", payload = %payload, "error_state_changed");
        }
    });

    let mut app = App::new(coordinator, relay, &config);

    // Setup terminal
    enable_raw_mode().context("Failed to enable raw mode for terminal")?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("Failed to setup terminal")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("Failed to create terminal")?;

    // Run the app and ensure cleanup happens even on error
    let mut event_reader = CrosstermEventReader;
    let run_result = run_app(
        &mut terminal,
        &mut app,
        &mut event_reader,
        &mut notify_rx,
        &mut reply_rx,
    );

    // Restore terminal (always runs, even if run_app failed)
    let cleanup_result = cleanup_terminal(&mut terminal);

    // Closing the request channel lets the bridge finish the last save
    drop(app);
    bridge.await.context("Host bridge task failed")?;
    tracing::info!(target: "runtime", "shutdown");

    // Return the first error that occurred, or Ok if both succeeded
    run_result?;
    cleanup_result?;

    Ok(())
}

fn print_items(items: &[Item]) {
    if items.is_empty() {
        println!("No items yet. Start macrokey and press 'n' to create one.");
        return;
    }
    for item in items {
        let marker = if item.is_selected { "●" } else { " " };
        let key = item.assigned_key.as_deref().unwrap_or("-");
        println!("{} {:<12} {}  ({})", marker, key, item.display_text, item.id);
    }
}

/// Trigger `key` and report any script error on stderr
async fn run_headless<H: Host>(
    host: &H,
    key: &str,
    notifications: &mut UnboundedReceiver<HostNotification>,
) -> Result<()> {
    host.trigger_key(key.to_string())
        .await
        .with_context(|| format!("Failed to run key '{}'", key))?;

    let mut relay = EventRelay::new();
    while let Ok(notification) = notifications.try_recv() {
        relay.dispatch(&notification);
    }

    if let Some(error) = relay.latest_error() {
        bail!(
            "Script error in '{}': {}\n{}",
            error.item_name,
            error.error,
            error.timestamp
        );
    }
    Ok(())
}

/// Clean up terminal state
fn cleanup_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode().context("Failed to disable raw mode")?;

    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("Failed to restore terminal")?;

    terminal.show_cursor().context("Failed to show cursor")?;

    Ok(())
}

/// Apply everything the host sent since the last frame
fn drain_host_events(
    app: &mut App,
    notifications: &mut UnboundedReceiver<HostNotification>,
    replies: &mut UnboundedReceiver<HostReply>,
) {
    while let Ok(notification) = notifications.try_recv() {
        app.handle_notification(&notification);
    }
    while let Ok(reply) = replies.try_recv() {
        app.apply_reply(reply);
    }
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    event_reader: &mut dyn EventReader,
    notifications: &mut UnboundedReceiver<HostNotification>,
    replies: &mut UnboundedReceiver<HostReply>,
) -> Result<()> {
    loop {
        drain_host_events(app, notifications, replies);
        app.tick(Instant::now());

        terminal
            .draw(|f| ui::render(f, app))
            .map_err(|e| anyhow::anyhow!("Failed to draw terminal UI: {}", e))?;

        if app.should_quit {
            return Ok(());
        }

        let event = match event_reader.read_event(Duration::from_millis(100))? {
            Some(e) => e,
            None => continue,
        };

        if let Event::Key(key) = event {
            input::handle_key(app, key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use macrokey::host::{HostRequest, EXECUTION_ERROR};
    use macrokey::item::ItemId;
    use ratatui::backend::TestBackend;
    use std::collections::VecDeque;

    /// Mock event reader for testing that returns a predetermined sequence of events
    struct MockEventReader {
        events: VecDeque<Event>,
    }

    impl MockEventReader {
        fn new(events: Vec<Event>) -> Self {
            Self {
                events: VecDeque::from(events),
            }
        }
    }

    impl EventReader for MockEventReader {
        fn read_event(&mut self, _timeout: Duration) -> Result<Option<Event>> {
            match self.events.pop_front() {
                Some(event) => Ok(Some(event)),
                // Running dry means the test forgot to quit
                None => bail!("no more events"),
            }
        }
    }

    /// Helper to create a key event
    fn key_event(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::empty()))
    }

    fn ctrl(c: char) -> Event {
        Event::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL))
    }

    struct Harness {
        app: App,
        requests: UnboundedReceiver<HostRequest>,
        notify_tx: mpsc::UnboundedSender<HostNotification>,
        notify_rx: UnboundedReceiver<HostNotification>,
        reply_tx: mpsc::UnboundedSender<HostReply>,
        reply_rx: UnboundedReceiver<HostReply>,
    }

    fn harness(items: Vec<Item>) -> Harness {
        let (request_tx, requests) = mpsc::unbounded_channel();
        let (notify_tx, notify_rx) = mpsc::unbounded_channel();
        let (reply_tx, reply_rx) = mpsc::unbounded_channel();
        let app = App::new(
            Coordinator::new(items, request_tx),
            EventRelay::new(),
            &Config::default(),
        );
        Harness {
            app,
            requests,
            notify_tx,
            notify_rx,
            reply_tx,
            reply_rx,
        }
    }

    fn run(h: &mut Harness, events: Vec<Event>) -> Result<()> {
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).expect("test terminal");
        let mut reader = MockEventReader::new(events);
        run_app(
            &mut terminal,
            &mut h.app,
            &mut reader,
            &mut h.notify_rx,
            &mut h.reply_rx,
        )
    }

    #[test]
    fn test_mock_event_reader() {
        let mut reader = MockEventReader::new(vec![
            key_event(KeyCode::Char('a')),
            key_event(KeyCode::Enter),
        ]);

        assert!(matches!(
            reader.read_event(Duration::from_millis(10)).expect("read event"),
            Some(Event::Key(KeyEvent {
                code: KeyCode::Char('a'),
                ..
            }))
        ));
        assert!(matches!(
            reader.read_event(Duration::from_millis(10)).expect("read event"),
            Some(Event::Key(KeyEvent {
                code: KeyCode::Enter,
                ..
            }))
        ));
        assert!(reader.read_event(Duration::from_millis(10)).is_err());
    }

    #[test]
    fn test_crossterm_event_reader_type() {
        // Just verify that CrosstermEventReader exists and implements the trait
        let _reader: Box<dyn EventReader> = Box::new(CrosstermEventReader);
    }

    #[test]
    fn test_run_app_quits_on_q() {
        let mut h = harness(vec![]);
        run(&mut h, vec![key_event(KeyCode::Char('q'))]).expect("run app");
        assert!(h.app.should_quit);
    }

    #[test]
    fn test_run_app_edit_and_quit_flushes_content() {
        let mut h = harness(vec![Item::new(ItemId::from("1"), "A", "")]);
        run(
            &mut h,
            vec![
                key_event(KeyCode::Enter),
                key_event(KeyCode::Char('h')),
                key_event(KeyCode::Char('i')),
                ctrl('q'),
            ],
        )
        .expect("run app");

        let mut saw_save = false;
        while let Ok(request) = h.requests.try_recv() {
            if let HostRequest::UpdateItemContent { id, content } = request {
                assert_eq!(id.as_str(), "1");
                assert_eq!(content, "hi");
                saw_save = true;
            }
        }
        assert!(saw_save);
    }

    #[test]
    fn test_run_app_applies_pending_notifications() {
        let mut h = harness(vec![]);
        h.notify_tx
            .send(HostNotification::new(
                EXECUTION_ERROR,
                r#"{"itemName":"A","error":"boom","timestamp":"t"}"#,
            ))
            .expect("send notification");
        h.reply_tx
            .send(HostReply::Failed {
                context: "while saving",
                error: "disk full".to_string(),
            })
            .expect("send reply");

        run(&mut h, vec![key_event(KeyCode::Char('q'))]).expect("run app");

        assert_eq!(h.app.relay.latest_error().expect("error recorded").error, "boom");
        assert_eq!(h.app.status.current(), Some("Error while saving: disk full"));
    }

    #[test]
    fn test_run_app_propagates_reader_error() {
        let mut h = harness(vec![]);
        assert!(run(&mut h, vec![]).is_err());
    }

    #[test]
    fn test_args_parse_flags() {
        let args = Args::try_parse_from(["macrokey", "--data-dir", "/tmp/m", "--run", "F13"])
            .expect("parse args");
        assert_eq!(args.data_dir, Some(PathBuf::from("/tmp/m")));
        assert_eq!(args.run.as_deref(), Some("F13"));
        assert!(!args.list);
    }

    #[test]
    fn test_args_list_conflicts_with_run() {
        assert!(Args::try_parse_from(["macrokey", "--list", "--run", "F1"]).is_err());
    }

    #[tokio::test]
    async fn test_run_application_bad_config_is_error() {
        use tempfile::TempDir;

        let temp_dir = TempDir::new().expect("create temp dir");
        let config_path = temp_dir.path().join("config.json");
        std::fs::write(&config_path, "{ nope").expect("write config");

        let args = Args {
            data_dir: Some(temp_dir.path().to_path_buf()),
            config: Some(config_path),
            list: true,
            run: None,
        };

        let err = run_application(args).await.unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[tokio::test]
    async fn test_run_application_list_on_empty_dir() {
        use tempfile::TempDir;

        let temp_dir = TempDir::new().expect("create temp dir");
        let args = Args {
            data_dir: Some(temp_dir.path().to_path_buf()),
            config: None,
            list: true,
            run: None,
        };

        run_application(args).await.expect("list items");
    }

    #[tokio::test]
    async fn test_run_application_unknown_key_is_error() {
        use tempfile::TempDir;

        let temp_dir = TempDir::new().expect("create temp dir");
        let args = Args {
            data_dir: Some(temp_dir.path().to_path_buf()),
            config: None,
            list: false,
            run: Some("F24".to_string()),
        };

        let err = run_application(args).await.unwrap_err();
        assert!(err.to_string().contains("Failed to run key 'F24'"));
    }
}

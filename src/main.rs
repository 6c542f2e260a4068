//! tty-focus - interactive demo of the input decoder and focus dispatcher
//!
//! Reads raw terminal input, shows every decoded event, and hosts two modal
//! surfaces that take focus while visible.
//!
//! # Keys (base screen)
//!
//! | Key | Action |
//! |-----|--------|
//! | m | Open context menu |
//! | / | Open selection list |
//! | q, Ctrl+C | Quit |

use std::cell::RefCell;
use std::env;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;

use anyhow::Context;
use crossterm::terminal;
use tracing::{debug, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use tty_focus::config::Config;
use tty_focus::core::{ControlKey, DecodeError, Input, Response, StreamDecoder};
use tty_focus::ui::{ContextMenu, ContextMenuAction, Dispatcher, Renderer, Screen, Selector};

/// Version string from Cargo.toml
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Cursor position query (DSR 6)
const QUERY_CURSOR_POSITION: &[u8] = b"\x1b[6n";

/// Lines kept in the event log
const LOG_LIMIT: usize = 200;

/// Command line options
#[derive(Debug, Default)]
struct Args {
    config_path: Option<PathBuf>,
}

fn print_version() {
    eprintln!("tty-focus {}", VERSION);
}

fn print_help() {
    eprintln!("tty-focus {} - terminal input decoder and focus dispatcher demo", VERSION);
    eprintln!();
    eprintln!("Usage: tty-focus [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -c, --config <PATH>   Load configuration from PATH");
    eprintln!("  -v, --version         Show version");
    eprintln!("  -h, --help            Show this help");
    eprintln!();
    eprintln!("Keys:");
    eprintln!("  m                     Open context menu");
    eprintln!("  /                     Open selection list");
    eprintln!("  q, Ctrl+C             Quit");
    eprintln!();
    eprintln!("Configuration: ~/.tty-focus/config.toml");
    eprintln!("Log level:     RUST_LOG overrides [log] level");
}

fn parse_args() -> Result<Args, String> {
    let args: Vec<String> = env::args().collect();
    let mut parsed = Args::default();
    let mut i = 1;

    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            "-v" | "--version" => {
                print_version();
                std::process::exit(0);
            }
            "-c" | "--config" => {
                i += 1;
                if i >= args.len() {
                    return Err("Missing config path".to_string());
                }
                parsed.config_path = Some(PathBuf::from(&args[i]));
            }
            arg => {
                return Err(format!("Unknown argument: {}. Use -h for help.", arg));
            }
        }
        i += 1;
    }

    Ok(parsed)
}

/// Install a file subscriber. Stdout is the render target, so nothing is
/// logged there.
fn init_logging(config: &Config) {
    let Some(log_path) = config.log_path() else {
        return;
    };
    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .ok();

    if let Some(file) = log_file {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&config.log.level));
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(filter)
            .with_writer(std::sync::Mutex::new(file))
            .with_ansi(false)
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    }
}

/// Spawn the single reader of stdin. The channel closes at end of input.
fn spawn_reader(buffer_size: usize) -> Receiver<Vec<u8>> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let mut stdin = io::stdin().lock();
        let mut buf = vec![0u8; buffer_size.max(1)];
        loop {
            match stdin.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => {
                    if tx.send(buf[..n].to_vec()).is_err() {
                        break;
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    warn!("stdin read failed: {}", e);
                    break;
                }
            }
        }
        debug!("reader thread exiting");
    });
    rx
}

/// Work requested by surface callbacks, applied after `Dispatcher::handle`
/// returns.
#[derive(Debug)]
enum Command {
    Menu(ContextMenuAction),
    Picked(Option<String>),
}

struct App {
    decoder: StreamDecoder,
    dispatcher: Dispatcher,
    menu: ContextMenu,
    selector: Selector,
    renderer: Renderer,
    outbox: Rc<RefCell<Vec<Command>>>,
    log: Vec<String>,
    status: String,
    quit: bool,
}

impl App {
    fn new(config: &Config) -> Self {
        let outbox: Rc<RefCell<Vec<Command>>> = Rc::new(RefCell::new(Vec::new()));

        let menu_outbox = outbox.clone();
        let menu = ContextMenu::new(move |action| {
            menu_outbox.borrow_mut().push(Command::Menu(action));
        });

        let pick_outbox = outbox.clone();
        let selector = Selector::new(config.selector.entries.clone(), move |pick| {
            pick_outbox.borrow_mut().push(Command::Picked(pick));
        });

        Self {
            decoder: StreamDecoder::new(),
            dispatcher: Dispatcher::with_limits(
                config.dispatch.queue_capacity,
                config.dispatch.batch_quota,
            ),
            menu,
            selector,
            renderer: Renderer::new(),
            outbox,
            log: Vec::new(),
            status: "m: menu  /: select  q: quit".to_string(),
            quit: false,
        }
    }

    fn run(&mut self, rx: Receiver<Vec<u8>>, config: &Config) -> anyhow::Result<()> {
        let timeout = config.escape_timeout();
        self.renderer.init().context("failed to initialize screen")?;
        self.draw()?;

        while !self.quit {
            match rx.recv_timeout(timeout) {
                Ok(chunk) => {
                    let decoded = self.decoder.feed(&chunk);
                    self.on_decoded(decoded);
                }
                Err(RecvTimeoutError::Timeout) => {
                    let events = self.decoder.flush_idle();
                    // An empty batch still drains events left buffered by a focus change
                    if events.is_empty() && self.dispatcher.pending() == 0 {
                        continue;
                    }
                    self.route(events);
                }
                Err(RecvTimeoutError::Disconnected) => {
                    info!("input closed");
                    let decoded = self.decoder.flush();
                    self.on_decoded(decoded);
                    break;
                }
            }
            self.apply_commands()?;
            self.draw()?;
        }

        self.renderer.cleanup().context("failed to restore screen")?;
        Ok(())
    }

    fn on_decoded(&mut self, decoded: Result<Vec<Input>, DecodeError>) {
        match decoded {
            Ok(events) => self.route(events),
            Err(e) => {
                warn!(bytes = ?e.bytes(), "decode error: {}", e);
                self.push_log(format!("! {}", e));
                self.decoder.reset();
            }
        }
    }

    /// Hand events to the focused surface. Whatever arrives while nothing is
    /// focused, including events a surface left buffered when it closed,
    /// drives the base screen.
    fn route(&mut self, events: Vec<Input>) {
        for event in &events {
            self.push_log(format!("{:?}", event));
        }

        let mut batch = if self.dispatcher.has_focus() {
            self.dispatcher.handle(events);
            self.leftover_after_dismissal()
        } else {
            let mut leftover = self.dispatcher.take_pending();
            leftover.extend(events);
            leftover
        };

        while !batch.is_empty() {
            let mut rest = batch.into_iter();
            batch = Vec::new();
            while let Some(event) = rest.next() {
                self.on_base_input(event);
                if self.quit {
                    return;
                }
                if self.dispatcher.has_focus() {
                    // A surface opened; it gets the remainder of the batch
                    self.dispatcher.handle(rest.collect());
                    batch = self.leftover_after_dismissal();
                    break;
                }
            }
        }
    }

    /// Events a surface left buffered when it closed with nothing focused
    /// beneath it.
    fn leftover_after_dismissal(&mut self) -> Vec<Input> {
        if self.dispatcher.has_focus() {
            Vec::new()
        } else {
            self.dispatcher.take_pending()
        }
    }

    fn on_base_input(&mut self, event: Input) {
        match event {
            Input::Ascii(b'm') => {
                let (cols, rows) = Renderer::size().unwrap_or((80, 24));
                self.menu.show(&mut self.dispatcher, cols / 4, rows / 4, cols, rows);
            }
            Input::Ascii(b'/') => self.selector.show(&mut self.dispatcher),
            Input::Ascii(b'q') | Input::Key(ControlKey::Etx) => {
                info!("quit requested");
                self.quit = true;
            }
            Input::Response(Response::CursorPosition { row, column }) => {
                self.status = format!("cursor at row {}, column {}", row, column);
            }
            _ => {}
        }
    }

    fn apply_commands(&mut self) -> anyhow::Result<()> {
        let commands: Vec<Command> = self.outbox.borrow_mut().drain(..).collect();
        for command in commands {
            debug!(?command, "applying command");
            match command {
                Command::Menu(ContextMenuAction::OpenSelector) => {
                    self.selector.show(&mut self.dispatcher);
                }
                Command::Menu(ContextMenuAction::ReportCursor) => {
                    let mut stdout = io::stdout();
                    stdout
                        .write_all(QUERY_CURSOR_POSITION)
                        .and_then(|_| stdout.flush())
                        .context("failed to query cursor position")?;
                }
                Command::Menu(ContextMenuAction::ClearLog) => self.log.clear(),
                Command::Menu(ContextMenuAction::Quit) => self.quit = true,
                Command::Menu(ContextMenuAction::Cancel) => {}
                Command::Picked(Some(entry)) => {
                    self.status = format!("picked: {}", entry);
                    self.selector.push_entry(entry);
                }
                Command::Picked(None) => self.status = "selection cancelled".to_string(),
            }
        }
        Ok(())
    }

    fn push_log(&mut self, line: String) {
        self.log.push(line);
        let overflow = self.log.len().saturating_sub(LOG_LIMIT);
        self.log.drain(..overflow);
    }

    fn draw(&self) -> anyhow::Result<()> {
        let title = format!("tty-focus {}  focus depth {}", VERSION, self.dispatcher.depth());
        let screen = Screen {
            title: &title,
            status: &self.status,
            log: &self.log,
        };
        let menu = self.menu.state();
        let selector = self.selector.state();
        self.renderer
            .render(&screen, Some(&*menu), Some(&*selector))
            .context("failed to render")
    }
}

fn main() -> anyhow::Result<()> {
    let args = match parse_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!("Use --help for usage information");
            std::process::exit(1);
        }
    };

    let config = match &args.config_path {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
    .context("failed to load configuration")?;

    init_logging(&config);
    info!("tty-focus {} starting", VERSION);
    debug!(?config, "configuration loaded");

    terminal::enable_raw_mode().context("failed to enable raw mode")?;
    let rx = spawn_reader(config.input.read_buffer_size);

    let mut app = App::new(&config);
    let result = app.run(rx, &config);

    // Restore the terminal even if the loop failed
    drop(app);
    terminal::disable_raw_mode().context("failed to disable raw mode")?;

    info!("tty-focus exiting");
    result
}

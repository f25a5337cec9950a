//! miditok-viz - A terminal visualizer for tokenized MIDI.
//!
//! Opens one or more tokenizer responses (JSON files holding the token tree,
//! per-track notes and file metrics) and shows them side by side: the token
//! grid on the left, the piano roll of one track on the right. Hovering or
//! clicking a token highlights the note it encodes, and the other way round.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- response.json                     # One file
//! cargo run -- -c viz.json a.json b.json         # Several files, custom config
//! RUST_LOG=debug cargo run -- --log viz.log a.json
//! ```

use miditok_viz::app::App;
use miditok_viz::config::Config;
use miditok_viz::ui;

use anyhow::{bail, Context, Result};
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, KeyModifiers,
    MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use std::fs::File;
use std::io::{self, Stdout};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Zoom factor applied by one `+` or `-` key press.
const ZOOM_STEP: f64 = 0.8;

/// Command-line options for the application.
#[derive(Debug, Default, PartialEq)]
struct CliOptions {
    /// Path to a JSON config file.
    config: Option<PathBuf>,
    /// File that receives log output instead of stderr.
    log: Option<PathBuf>,
    /// Response files to open, one tab each.
    files: Vec<PathBuf>,
}

/// What the command line asked for.
#[derive(Debug, PartialEq)]
enum Command {
    Run(CliOptions),
    Help,
}

impl CliOptions {
    /// Parses the process arguments, printing help and exiting on `--help`.
    fn parse() -> Result<Self> {
        match Self::parse_from(std::env::args().skip(1))? {
            Command::Run(options) => Ok(options),
            Command::Help => {
                print_help();
                std::process::exit(0);
            }
        }
    }

    /// Parses command-line arguments.
    ///
    /// Supports:
    /// - `--config <path>` or `-c <path>`: Load settings from a JSON file
    /// - `--log <path>`: Write log output to a file
    /// - `--help` or `-h`: Print help
    /// - Anything else is a response file to open
    fn parse_from<I>(args: I) -> Result<Command>
    where
        I: IntoIterator<Item = String>,
    {
        let mut options = CliOptions::default();
        let mut args = args.into_iter();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" | "-c" => match args.next() {
                    Some(path) => options.config = Some(PathBuf::from(path)),
                    None => bail!("--config requires a path argument"),
                },
                "--log" => match args.next() {
                    Some(path) => options.log = Some(PathBuf::from(path)),
                    None => bail!("--log requires a path argument"),
                },
                "--help" | "-h" => return Ok(Command::Help),
                other if other.starts_with('-') && other.len() > 1 => {
                    bail!("Unknown option: {} (use --help for usage)", other)
                }
                file => options.files.push(PathBuf::from(file)),
            }
        }

        Ok(Command::Run(options))
    }
}

fn print_help() {
    eprintln!("miditok-viz - Terminal visualizer for tokenized MIDI");
    eprintln!();
    eprintln!("Usage: miditok-viz [OPTIONS] <response.json>...");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -c, --config PATH  Load settings from a JSON config file");
    eprintln!("      --log PATH     Write log output to PATH (filtered by RUST_LOG)");
    eprintln!("  -h, --help         Print this help message");
}

/// Installs the global tracing subscriber.
///
/// Output goes to `log` when given. Otherwise it goes to stderr, which the
/// alternate screen hides until exit.
fn init_logging(log: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::from_default_env();
    match log {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
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

fn main() -> Result<()> {
    let cli = CliOptions::parse()?;
    init_logging(cli.log.as_deref())?;

    let config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => Config::default(),
    };
    tracing::info!(files = cli.files.len(), "starting");

    let mut app = App::new(config);
    for path in &cli.files {
        app.open_file(path);
    }
    app.active_tab = 0;

    let mut terminal = setup_terminal()?;

    // Run main loop
    let result = run_app(&mut terminal, &mut app);

    // Restore terminal
    restore_terminal(&mut terminal).context("Failed to restore terminal")?;

    result
}

/// Sets up the terminal for TUI rendering.
fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)
        .context("Failed to enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend).context("Failed to create terminal")?;
    Ok(terminal)
}

/// Restores the terminal to its original state.
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode().context("Failed to disable raw mode")?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )
    .context("Failed to leave alternate screen")?;
    terminal.show_cursor().context("Failed to show cursor")?;
    Ok(())
}

/// Main application loop.
fn run_app(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> Result<()> {
    loop {
        app.clear_expired_status();

        terminal.draw(|frame| ui::render(frame, app))?;

        if event::poll(Duration::from_millis(16))? {
            match event::read()? {
                // Only handle key press events (not release)
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    if handle_key(app, key.code, key.modifiers) {
                        return Ok(());
                    }
                }
                Event::Mouse(mouse) => handle_mouse(app, mouse),
                _ => {}
            }
        }
    }
}

/// Handles a mouse event.
///
/// Movement drives hover; a left click selects; the wheel scrolls the panel
/// under the pointer, or zooms the piano roll with Ctrl held.
fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    let x = mouse.column;
    let y = mouse.row;
    let ctrl_held = mouse.modifiers.contains(KeyModifiers::CONTROL)
        || mouse.modifiers.contains(KeyModifiers::SUPER);

    match mouse.kind {
        MouseEventKind::Moved | MouseEventKind::Drag(MouseButton::Left) => {
            app.handle_mouse_move(x, y);
        }
        MouseEventKind::Down(MouseButton::Left) => {
            app.handle_mouse_click(x, y);
        }
        MouseEventKind::ScrollUp => app.handle_mouse_scroll(x, y, 0, 1, ctrl_held),
        MouseEventKind::ScrollDown => app.handle_mouse_scroll(x, y, 0, -1, ctrl_held),
        MouseEventKind::ScrollLeft => app.handle_mouse_scroll(x, y, -1, 0, ctrl_held),
        MouseEventKind::ScrollRight => app.handle_mouse_scroll(x, y, 1, 0, ctrl_held),
        _ => {}
    }
}

/// Handles a key press event.
///
/// # Returns
///
/// `true` if the application should quit
fn handle_key(app: &mut App, code: KeyCode, modifiers: KeyModifiers) -> bool {
    match code {
        KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => return true,
        KeyCode::Char('q') => return true,

        // Files
        KeyCode::Char('[') => app.prev_tab(),
        KeyCode::Char(']') => app.next_tab(),
        KeyCode::Char('w') => app.close_active_tab(),

        // Token grid
        KeyCode::Left => app.prev_page(),
        KeyCode::Right => app.next_page(),
        KeyCode::Char('p') => app.toggle_pagination(),
        KeyCode::Char('t') => app.toggle_token_types(),
        KeyCode::Char('j') => app.scroll_grid(1),
        KeyCode::Char('k') => app.scroll_grid(-1),

        // Piano roll
        KeyCode::Char(',') => app.prev_track(),
        KeyCode::Char('.') => app.next_track(),
        KeyCode::Up => app.scroll_roll(0, -1),
        KeyCode::Down => app.scroll_roll(0, 1),
        KeyCode::PageUp => app.scroll_roll(-screen_columns(app), 0),
        KeyCode::PageDown => app.scroll_roll(screen_columns(app), 0),
        KeyCode::Home => app.scroll_roll_home(),
        KeyCode::Char('+') | KeyCode::Char('=') => app.zoom(ZOOM_STEP),
        KeyCode::Char('-') => app.zoom(1.0 / ZOOM_STEP),

        KeyCode::Esc => app.clear_selection(),
        _ => {}
    }
    false
}

/// Width of the visible piano roll in columns, at least one.
fn screen_columns(app: &App) -> i32 {
    (app.layout.roll_grid.width as i32).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_files_and_options() {
        let command =
            CliOptions::parse_from(args(&["-c", "viz.json", "a.json", "--log", "out.log", "b.json"]))
                .unwrap();
        assert_eq!(
            command,
            Command::Run(CliOptions {
                config: Some(PathBuf::from("viz.json")),
                log: Some(PathBuf::from("out.log")),
                files: vec![PathBuf::from("a.json"), PathBuf::from("b.json")],
            })
        );
    }

    #[test]
    fn test_parse_help_and_errors() {
        assert_eq!(CliOptions::parse_from(args(&["a.json", "-h"])).unwrap(), Command::Help);
        assert!(CliOptions::parse_from(args(&["--config"])).is_err());
        assert!(CliOptions::parse_from(args(&["--frobnicate"])).is_err());
        // A lone dash is a file name, not an option.
        assert!(matches!(
            CliOptions::parse_from(args(&["-"])).unwrap(),
            Command::Run(CliOptions { files, .. }) if files == vec![PathBuf::from("-")]
        ));
    }

    #[test]
    fn test_quit_keys() {
        let mut app = App::new(Config::default());
        assert!(handle_key(&mut app, KeyCode::Char('q'), KeyModifiers::NONE));
        assert!(handle_key(&mut app, KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(!handle_key(&mut app, KeyCode::Char('c'), KeyModifiers::NONE));
        assert!(!handle_key(&mut app, KeyCode::Esc, KeyModifiers::NONE));
    }

    #[test]
    fn test_keys_without_files_are_harmless() {
        let mut app = App::new(Config::default());
        for code in [
            KeyCode::Left,
            KeyCode::Right,
            KeyCode::Up,
            KeyCode::PageDown,
            KeyCode::Home,
            KeyCode::Char(']'),
            KeyCode::Char('.'),
            KeyCode::Char('+'),
            KeyCode::Char('w'),
        ] {
            assert!(!handle_key(&mut app, code, KeyModifiers::NONE));
        }
        assert!(app.tabs().is_empty());
    }
}

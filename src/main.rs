mod ui;

use std::error::Error;
use std::io::{self, stdin};
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use crossterm::{
    event::{DisableFocusChange, EnableFocusChange, KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};

use velo::config::{ConfigStore, Difficulty, FileConfigStore, Mode, Settings};
use velo::engine::{Engine, Status};
use velo::input;
use velo::passages::{Library, SourceText};
use velo::runtime::{AppEvent, CrosstermEventSource, EventSource, FixedTicker, Runner, Ticker};
use velo::store::{SessionStore, SessionSummary, SqliteStore};
use velo::TICK_RATE_MS;

/// terminal typing speed test with live metrics and session history
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A terminal typing speed test with live WPM and accuracy, a per-word speed heatmap, consistency scoring, and sqlite-backed history with per-mode personal bests."
)]
pub struct Cli {
    /// test mode: t:15, t:30, t:60, t:120, t:180, or passage
    #[clap(short, long)]
    mode: Option<Mode>,

    /// passage category to draw from
    #[clap(short, long)]
    category: Option<String>,

    /// passage difficulty filter
    #[clap(short, long, value_enum)]
    difficulty: Option<Difficulty>,

    /// type a custom text instead of a library passage
    #[clap(short = 'p', long)]
    text: Option<String>,

    /// export session history to a csv file and exit
    #[clap(long, value_name = "PATH")]
    export: Option<PathBuf>,

    /// list passage categories and exit
    #[clap(long)]
    list_categories: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AppState {
    Typing,
    Results,
    History,
}

pub struct App {
    pub settings: Settings,
    pub library: Library,
    pub custom_text: Option<String>,
    pub engine: Engine,
    pub state: AppState,
    pub store: Option<SqliteStore>,
    pub best: Option<SessionSummary>,
    pub history: Vec<SessionSummary>,
    pub save_error: Option<String>,
    saved: bool,
}

fn build_engine(library: &Library, settings: &Settings, custom: Option<&str>) -> Engine {
    let source = match custom {
        Some(text) => SourceText::custom(text.to_string()),
        None => library
            .pick(
                settings.category.as_deref(),
                settings.difficulty,
                &mut rand::thread_rng(),
            )
            .unwrap_or_else(|| {
                SourceText::custom("the quick brown fox jumps over the lazy dog".to_string())
            }),
    };
    Engine::new(source, settings.mode)
}

impl App {
    pub fn new(settings: Settings, custom_text: Option<String>) -> Self {
        let library = Library::load();
        let engine = build_engine(&library, &settings, custom_text.as_deref());
        let store = SqliteStore::open_default().ok();
        Self {
            settings,
            library,
            custom_text,
            engine,
            state: AppState::Typing,
            store,
            best: None,
            history: Vec::new(),
            save_error: None,
            saved: false,
        }
    }

    /// Start over, on the same text (retry) or a freshly picked one.
    pub fn next_test(&mut self, same_text: bool) {
        if same_text {
            self.engine.reset();
        } else {
            self.engine = build_engine(
                &self.library,
                &self.settings,
                self.custom_text.as_deref(),
            );
        }
        self.state = AppState::Typing;
        self.save_error = None;
        self.saved = false;
    }

    /// Hand the finished session to the store, fire-and-forget: the results
    /// on screen stand whether or not the save works out. A failed save only
    /// turns into a notice on the results screen.
    pub fn on_finished(&mut self) {
        if self.saved || self.engine.status() != Status::Finished {
            return;
        }
        self.saved = true;
        if let Some(record) = self.engine.record() {
            if let Some(store) = self.store.as_mut() {
                // snapshot the previous best first so the results screen can
                // show the delta this session achieved
                self.best = store.personal_best(&record.mode).ok().flatten();
                if let Err(e) = store.save(record) {
                    self.save_error = Some(format!("session not saved: {e}"));
                }
                self.history = store.recent(10).unwrap_or_default();
            }
        }
        self.state = AppState::Results;
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if cli.list_categories {
        let library = Library::load();
        for category in library.categories() {
            println!("{category}");
        }
        return Ok(());
    }

    if let Some(path) = cli.export.as_ref() {
        let store = SqliteStore::open_default()?;
        let rows = store.export_csv(path)?;
        println!("exported {rows} sessions to {}", path.display());
        return Ok(());
    }

    let config_store = FileConfigStore::new();
    let mut settings = config_store.load();
    if let Some(mode) = cli.mode {
        settings.mode = mode;
    }
    if let Some(category) = cli.category.clone() {
        settings.category = Some(category);
    }
    if let Some(difficulty) = cli.difficulty {
        settings.difficulty = Some(difficulty);
    }
    let _ = config_store.save(&settings);

    if !stdin().is_tty() {
        use clap::{error::ErrorKind, CommandFactory};
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableFocusChange)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(settings, cli.text.clone());
    let runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::new(Duration::from_millis(TICK_RATE_MS)),
    );
    let result = run(&mut terminal, &mut app, &runner);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), DisableFocusChange, LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run<B: Backend, E: EventSource, T: Ticker>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    runner: &Runner<E, T>,
) -> Result<(), Box<dyn Error>> {
    loop {
        terminal.draw(|f| ui::draw(app, f))?;

        match runner.step() {
            AppEvent::Tick => {
                app.engine.tick();
                app.on_finished();
            }
            AppEvent::Resize => {}
            AppEvent::FocusLost => app.engine.pause(),
            AppEvent::FocusGained => app.engine.resume(),
            AppEvent::Key(key) => {
                if is_quit(&key) {
                    break;
                }
                match app.state {
                    AppState::Typing => handle_typing_key(app, &key),
                    AppState::Results => match key.code {
                        KeyCode::Char('r') => app.next_test(true),
                        KeyCode::Char('n') => app.next_test(false),
                        KeyCode::Char('h') => app.state = AppState::History,
                        _ => {}
                    },
                    AppState::History => match key.code {
                        KeyCode::Char('b') | KeyCode::Backspace => app.state = AppState::Results,
                        KeyCode::Char('n') => app.next_test(false),
                        _ => {}
                    },
                }
            }
        }
    }

    Ok(())
}

fn is_quit(key: &KeyEvent) -> bool {
    key.code == KeyCode::Esc
        || (key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL))
}

fn handle_typing_key(app: &mut App, key: &KeyEvent) {
    if key.code == KeyCode::Tab {
        app.next_test(false);
        return;
    }
    if let Some(input) = input::classify(key) {
        app.engine.apply(input);
        app.on_finished();
    }
}

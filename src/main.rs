use clap::{error::ErrorKind, CommandFactory, Parser, Subcommand};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use quizmind::{
    api::http::HttpGateway,
    app::App,
    app_dirs::AppDirs,
    config::{ConfigOverrides, ConfigStore, FileConfigStore, API_URL_ENV},
    dispatch::Dispatcher,
    history::HistoryDb,
    logging::init_file_logging,
    password,
    runtime::{AppEvent, CrosstermEventSource, FixedTicker, Runner},
    session::{FileTokenStore, SessionContext},
    ui,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    io::{self, stdin},
    sync::Arc,
    time::{Duration, Instant},
};
use tracing::{info, warn};

const TICK_RATE_MS: u64 = 100;

/// study your PDFs as timed multiple-choice quizzes
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A terminal client for a PDF-to-quiz service: upload PDFs, answer generated multiple-choice questions against a countdown, and track your accuracy per document."
)]
pub struct Cli {
    /// base URL of the quiz service
    #[clap(short = 'a', long, env = API_URL_ENV)]
    api_url: Option<String>,

    /// number of questions to request per quiz (1-50)
    #[clap(short = 'n', long = "limit")]
    question_limit: Option<usize>,

    /// length of the quiz countdown in seconds
    #[clap(short = 's', long = "secs")]
    quiz_secs: Option<u64>,

    /// write the effective settings to the config file
    #[clap(long)]
    save_config: bool,

    #[clap(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
enum Command {
    /// rate a password the way the registration form does
    Strength { password: String },
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            api_url: self.api_url.clone(),
            question_limit: self.question_limit,
            quiz_secs: self.quiz_secs,
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if let Some(Command::Strength { password }) = &cli.command {
        println!("{}", describe_strength(password));
        return Ok(());
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    if let Err(err) = init_file_logging(&AppDirs::log_path()) {
        eprintln!("logging disabled: {err}");
    }

    let store = FileConfigStore::new();
    let config = store.load().with_overrides(&cli.overrides());
    if cli.save_config {
        store.save(&config)?;
        info!(path = %store.path().display(), "saved config");
    }
    info!(api_url = %config.api_url, "starting");

    let gateway = HttpGateway::new(config.api_url.clone())?;
    let event_source = CrosstermEventSource::new();
    let dispatcher = Dispatcher::new(Arc::new(gateway), event_source.sender());
    let session = SessionContext::load(Box::new(FileTokenStore::new()));
    let history = match HistoryDb::open(&AppDirs::history_db_path()) {
        Ok(db) => Some(db),
        Err(err) => {
            warn!(%err, "score history unavailable");
            None
        }
    };
    let mut app = App::new(config, session, dispatcher, history);

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let runner = Runner::new(
        event_source,
        FixedTicker::new(Duration::from_millis(TICK_RATE_MS)),
    );
    let result = start_tui(&mut terminal, &mut app, &runner);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn start_tui<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    runner: &Runner<CrosstermEventSource, FixedTicker>,
) -> Result<(), Box<dyn Error>> {
    let mut last_tick = Instant::now();

    while !app.should_quit() {
        terminal.draw(|f| ui::draw(app, f))?;

        match runner.step() {
            AppEvent::Tick => {
                let now = Instant::now();
                app.on_tick(now.duration_since(last_tick));
                last_tick = now;
            }
            AppEvent::Key(key) => app.handle_key(key),
            AppEvent::Api(reply) => app.handle_api(reply),
            AppEvent::Resize => {}
        }
    }

    info!("exiting");
    Ok(())
}

fn describe_strength(candidate: &str) -> String {
    let strength = password::strength(candidate);
    let label = if strength.label.is_empty() {
        "Too weak"
    } else {
        strength.label
    };
    format!("{}/4 {}", strength.score, label)
}

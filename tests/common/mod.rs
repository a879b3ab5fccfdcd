// Shared fixtures for driving the app headlessly against an in-memory service.
#![allow(dead_code)]

use std::path::Path;
use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use uuid::Uuid;

use quizmind::api::{
    ApiError, ApiGateway, AuthToken, Credentials, DifficultyStats, OptionKey, PdfId, PdfSummary,
    ProgressFn, Question, StatsSummary, SubmitOutcome, SubmitRequest,
};
use quizmind::app::App;
use quizmind::config::Config;
use quizmind::dispatch::Dispatcher;
use quizmind::runtime::{AppEvent, FixedTicker, Runner, TestEventSource};
use quizmind::session::{MemoryTokenStore, SessionContext};

pub const PASSWORD: &str = "Correct-h0rse";
pub const PDF_ID: PdfId = Uuid::from_u128(42);
pub const QUESTIONS: u128 = 3;

/// Service double: one PDF, three questions whose right answer is B
#[derive(Default)]
pub struct FakeService {
    answers: Mutex<Vec<bool>>,
}

impl ApiGateway for FakeService {
    fn login(&self, credentials: &Credentials) -> Result<AuthToken, ApiError> {
        if credentials.password == PASSWORD {
            Ok(AuthToken::new("token-1"))
        } else {
            Err(ApiError::Unauthorized {
                detail: Some("Invalid email or password".into()),
            })
        }
    }

    fn register(&self, _credentials: &Credentials) -> Result<AuthToken, ApiError> {
        Err(ApiError::Status {
            status: 400,
            detail: Some("Email already registered".into()),
        })
    }

    fn list_pdfs(&self, _token: &AuthToken) -> Result<Vec<PdfSummary>, ApiError> {
        Ok(vec![PdfSummary {
            id: PDF_ID,
            filename: "cell-biology.pdf".into(),
            chunk_count: 12,
            uploaded_at: "2024-05-01T09:30:00".into(),
        }])
    }

    fn delete_pdf(&self, _token: &AuthToken, _pdf_id: PdfId) -> Result<(), ApiError> {
        Ok(())
    }

    fn upload_pdf(
        &self,
        _token: &AuthToken,
        _path: &Path,
        mut progress: ProgressFn,
    ) -> Result<PdfSummary, ApiError> {
        progress(100);
        Err(ApiError::Transport("uploads are not served here".into()))
    }

    fn fetch_questions(
        &self,
        _token: &AuthToken,
        _pdf_id: PdfId,
        limit: usize,
    ) -> Result<Vec<Question>, ApiError> {
        Ok((1..=QUESTIONS)
            .take(limit)
            .map(|n| {
                Question::new(
                    Uuid::from_u128(n),
                    format!("Question {n}?"),
                    OptionKey::ALL.map(|k| (k, format!("answer {k}"))),
                )
            })
            .collect())
    }

    fn submit_answer(
        &self,
        _token: &AuthToken,
        request: &SubmitRequest,
    ) -> Result<SubmitOutcome, ApiError> {
        let correct = request.selected == OptionKey::B;
        self.answers.lock().unwrap().push(correct);
        Ok(SubmitOutcome {
            is_correct: correct,
            correct_answer: OptionKey::B,
            explanation: "B is stated in chapter one".into(),
        })
    }

    fn fetch_stats(&self, _token: &AuthToken, _pdf_id: PdfId) -> Result<StatsSummary, ApiError> {
        let answers = self.answers.lock().unwrap();
        let total = answers.len() as u64;
        let correct = answers.iter().filter(|c| **c).count() as u64;
        let accuracy = if total == 0 {
            0.0
        } else {
            correct as f64 * 100.0 / total as f64
        };
        Ok(StatsSummary {
            total_attempts: total,
            correct_count: correct,
            accuracy_percent: accuracy,
            by_difficulty: Some(
                [(
                    "medium".to_string(),
                    DifficultyStats {
                        correct,
                        total,
                        accuracy,
                    },
                )]
                .into(),
            ),
        })
    }
}

/// A signed-out app wired to `FakeService`, plus its event loop parts
pub struct Harness {
    pub app: App,
    pub tx: Sender<AppEvent>,
    pub runner: Runner<TestEventSource, FixedTicker>,
    pub tick: Duration,
}

impl Harness {
    pub fn new(config: Config) -> Self {
        let (tx, rx) = mpsc::channel();
        let dispatcher = Dispatcher::new(Arc::new(FakeService::default()), tx.clone());
        let session = SessionContext::load(Box::new(MemoryTokenStore));
        let app = App::new(config, session, dispatcher, None);
        let runner = Runner::new(
            TestEventSource::new(rx),
            FixedTicker::new(Duration::from_millis(5)),
        );
        Self {
            app,
            tx,
            runner,
            tick: Duration::from_millis(5),
        }
    }

    pub fn press(&self, code: KeyCode) {
        self.tx
            .send(AppEvent::Key(KeyEvent::new(code, KeyModifiers::NONE)))
            .unwrap();
    }

    pub fn type_text(&self, text: &str) {
        for c in text.chars() {
            self.press(KeyCode::Char(c));
        }
    }

    /// Process one event the way the binary's loop does
    pub fn step(&mut self) {
        match self.runner.step() {
            AppEvent::Tick => self.app.on_tick(self.tick),
            AppEvent::Key(key) => self.app.handle_key(key),
            AppEvent::Api(reply) => self.app.handle_api(reply),
            AppEvent::Resize => {}
        }
    }

    /// Step until `done` holds; panics after a bounded number of steps
    pub fn run_until(&mut self, what: &str, done: impl Fn(&App) -> bool) {
        for _ in 0..2_000u32 {
            if done(&self.app) {
                return;
            }
            self.step();
        }
        panic!("gave up waiting for {what}");
    }

    pub fn login(&mut self) {
        self.type_text("student@example.com");
        self.press(KeyCode::Tab);
        self.type_text(PASSWORD);
        self.press(KeyCode::Enter);
        self.run_until("library", |app| !app.library.pdfs.is_empty());
    }
}

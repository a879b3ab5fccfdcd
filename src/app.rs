//! Application state: routes, per-screen state and the handlers that move
//! between them in response to keys, request replies and ticks.

use std::collections::HashMap;
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use tracing::{debug, info, warn};

use crate::api::{ApiError, AuthToken, OptionKey, PdfId, PdfSummary, QuestionId, StatsSummary};
use crate::auth::{AuthForm, AuthMode};
use crate::config::Config;
use crate::dispatch::{ApiReply, Dispatcher};
use crate::history::{HistoryDb, HistoryEntry};
use crate::quiz::{Phase, QuizSession, SessionId};
use crate::session::SessionContext;
use crate::timer::Countdown;
use crate::upload::UploadForm;

pub const DELETE_FAILED_MESSAGE: &str = "Failed to delete PDF. Please try again.";
pub const SESSION_EXPIRED_MESSAGE: &str = "Your session has expired. Please log in again.";
pub const LIST_FAILED_MESSAGE: &str = "Could not load your PDFs.";
pub const QUESTIONS_FAILED_MESSAGE: &str = "Could not load questions.";
pub const STATS_FAILED_MESSAGE: &str = "Could not load stats.";
pub const SUBMIT_FAILED_MESSAGE: &str = "Failed to submit answer.";
pub const TIME_UP_MESSAGE: &str = "Time's up! You can still review your answers.";

/// Score history rows shown on the stats screen
const HISTORY_ROWS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum Route {
    Login,
    Register,
    Dashboard,
    Upload,
    Quiz,
    Stats,
}

impl Route {
    /// Routes that need a signed-in session
    pub fn is_private(self) -> bool {
        !matches!(self, Route::Login | Route::Register)
    }
}

/// The PDF library on the dashboard
#[derive(Debug, Default)]
pub struct LibraryState {
    pub pdfs: Vec<PdfSummary>,
    pub selected: usize,
    pub loading: bool,
    /// Why the list is empty when the fetch failed
    pub error: Option<String>,
    pub confirm_delete: Option<PdfId>,
    pub deleting: Option<PdfId>,
    pub alert: Option<String>,
}

impl LibraryState {
    pub fn selected_pdf(&self) -> Option<&PdfSummary> {
        self.pdfs.get(self.selected)
    }

    pub fn find(&self, pdf_id: PdfId) -> Option<&PdfSummary> {
        self.pdfs.iter().find(|p| p.id == pdf_id)
    }

    pub fn select_next(&mut self) {
        if self.selected + 1 < self.pdfs.len() {
            self.selected += 1;
        }
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    fn set(&mut self, result: Result<Vec<PdfSummary>, ApiError>) {
        self.loading = false;
        match result {
            Ok(pdfs) => {
                self.pdfs = pdfs;
                self.error = None;
            }
            Err(err) => {
                self.pdfs.clear();
                self.error = Some(err.user_message(LIST_FAILED_MESSAGE));
            }
        }
        self.selected = self.selected.min(self.pdfs.len().saturating_sub(1));
    }

    fn remove(&mut self, pdf_id: PdfId) {
        self.pdfs.retain(|p| p.id != pdf_id);
        self.selected = self.selected.min(self.pdfs.len().saturating_sub(1));
    }
}

/// One quiz attempt on screen. Dropping it drops its countdown.
#[derive(Debug)]
pub struct QuizState {
    pub pdf_name: String,
    pub session: QuizSession,
    pub timer: Countdown,
    /// Option highlighted on the current card
    pub selected: Option<OptionKey>,
    pub notice: Option<String>,
    /// Question number typed after `g`
    pub jump: Option<String>,
    pending: HashMap<QuestionId, usize>,
    recorded: bool,
}

impl QuizState {
    fn new(pdf_id: PdfId, pdf_name: String, secs: u64) -> Self {
        Self {
            pdf_name,
            session: QuizSession::loading(pdf_id),
            timer: Countdown::new(secs),
            selected: None,
            notice: None,
            jump: None,
            pending: HashMap::new(),
            recorded: false,
        }
    }

    /// Whether a submission for the current question is still in flight
    pub fn is_submitting(&self) -> bool {
        self.session
            .current()
            .is_some_and(|q| self.pending.contains_key(&q.id))
    }

    fn sync_selection(&mut self) {
        self.selected = self
            .session
            .current()
            .and_then(|q| self.session.answer(q.id))
            .map(|a| a.selected);
    }

    fn move_selection(&mut self, forward: bool) {
        let index = match (self.selected, forward) {
            (None, _) => 0,
            (Some(key), true) => (key.index() + 1) % OptionKey::ALL.len(),
            (Some(key), false) => (key.index() + OptionKey::ALL.len() - 1) % OptionKey::ALL.len(),
        };
        self.selected = Some(OptionKey::ALL[index]);
    }

    fn settle(&mut self, question_id: QuestionId) {
        if let Some(count) = self.pending.get_mut(&question_id) {
            *count -= 1;
            if *count == 0 {
                self.pending.remove(&question_id);
            }
        }
    }
}

/// Stats for one PDF plus the attempts recorded on this machine
#[derive(Debug)]
pub struct StatsState {
    pub pdf_id: PdfId,
    pub pdf_name: String,
    pub loading: bool,
    pub summary: Option<StatsSummary>,
    pub error: Option<String>,
    pub history: Vec<HistoryEntry>,
}

pub struct App {
    pub config: Config,
    pub route: Route,
    pub session: SessionContext,
    pub login: AuthForm,
    pub register: AuthForm,
    pub library: LibraryState,
    pub upload: UploadForm,
    pub quiz: Option<QuizState>,
    pub stats: Option<StatsState>,
    dispatcher: Dispatcher,
    history: Option<HistoryDb>,
    should_quit: bool,
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("route", &self.route)
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

impl App {
    /// Build the app and enter the first screen: the dashboard when a saved
    /// token exists, the login form otherwise.
    pub fn new(
        config: Config,
        session: SessionContext,
        dispatcher: Dispatcher,
        history: Option<HistoryDb>,
    ) -> Self {
        let mut app = Self {
            config,
            route: Route::Login,
            session,
            login: AuthForm::default(),
            register: AuthForm::default(),
            library: LibraryState::default(),
            upload: UploadForm::default(),
            quiz: None,
            stats: None,
            dispatcher,
            history,
            should_quit: false,
        };
        app.navigate(Route::Dashboard);
        app
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn auth_form(&self, mode: AuthMode) -> &AuthForm {
        match mode {
            AuthMode::Login => &self.login,
            AuthMode::Register => &self.register,
        }
    }

    fn auth_form_mut(&mut self, mode: AuthMode) -> &mut AuthForm {
        match mode {
            AuthMode::Login => &mut self.login,
            AuthMode::Register => &mut self.register,
        }
    }

    /// Switch screens. Private routes fall back to login without a token.
    pub fn navigate(&mut self, route: Route) {
        let route = if route.is_private() && !self.session.is_authenticated() {
            Route::Login
        } else {
            route
        };
        debug!(from = %self.route, to = %route, "navigate");

        if route != Route::Quiz {
            self.quiz = None;
        }
        if route != Route::Stats {
            self.stats = None;
        }
        self.route = route;

        match route {
            Route::Dashboard => self.refresh_library(),
            Route::Upload => {
                if !self.upload.is_uploading() {
                    self.upload = UploadForm::default();
                }
            }
            _ => {}
        }
    }

    fn refresh_library(&mut self) {
        if let Some(token) = self.session.token().cloned() {
            self.library.loading = true;
            self.library.confirm_delete = None;
            self.dispatcher.list_pdfs(token);
        }
    }

    /// Start a fresh attempt on `pdf_id`
    pub fn start_quiz(&mut self, pdf_id: PdfId) {
        self.navigate(Route::Quiz);
        if self.route != Route::Quiz {
            return;
        }
        let Some(token) = self.session.token().cloned() else {
            return;
        };
        let name = self.pdf_name(pdf_id);
        let state = QuizState::new(pdf_id, name, self.config.quiz_secs);
        info!(%pdf_id, session = ?state.session.id(), "starting quiz");
        self.dispatcher.fetch_questions(
            token,
            state.session.id(),
            pdf_id,
            self.config.question_limit,
        );
        self.quiz = Some(state);
    }

    pub fn open_stats(&mut self, pdf_id: PdfId) {
        self.navigate(Route::Stats);
        if self.route != Route::Stats {
            return;
        }
        let Some(token) = self.session.token().cloned() else {
            return;
        };
        self.stats = Some(StatsState {
            pdf_id,
            pdf_name: self.pdf_name(pdf_id),
            loading: true,
            summary: None,
            error: None,
            history: self.recent_history(pdf_id),
        });
        self.dispatcher.fetch_stats(token, pdf_id);
    }

    fn pdf_name(&self, pdf_id: PdfId) -> String {
        self.library
            .find(pdf_id)
            .map(|p| p.filename.clone())
            .unwrap_or_else(|| pdf_id.to_string())
    }

    fn recent_history(&self, pdf_id: PdfId) -> Vec<HistoryEntry> {
        let Some(db) = &self.history else {
            return Vec::new();
        };
        db.recent(pdf_id, HISTORY_ROWS).unwrap_or_else(|err| {
            warn!(%err, "could not read score history");
            Vec::new()
        })
    }

    pub fn logout(&mut self) {
        if let Err(err) = self.session.sign_out() {
            warn!(%err, "could not remove saved session");
        }
        info!("signed out");
        self.library = LibraryState::default();
        self.upload = UploadForm::default();
        self.navigate(Route::Login);
    }

    fn expire_session(&mut self) {
        warn!("server rejected token, signing out");
        self.logout();
        self.login.error = Some(SESSION_EXPIRED_MESSAGE.to_string());
    }

    /// Advance the quiz countdown by wall-clock time since the previous tick
    pub fn on_tick(&mut self, elapsed: Duration) {
        let Some(quiz) = self.quiz.as_mut() else {
            return;
        };
        if quiz.session.phase() != Phase::Active {
            return;
        }
        if quiz.timer.advance(elapsed) {
            quiz.session.expire();
            quiz.notice = Some(TIME_UP_MESSAGE.to_string());
        }
    }

    pub fn handle_api(&mut self, reply: ApiReply) {
        match reply {
            ApiReply::Authenticated { mode, result } => self.on_authenticated(mode, result),
            ApiReply::Pdfs { token, .. }
            | ApiReply::Deleted { token, .. }
            | ApiReply::Uploaded { token, .. }
            | ApiReply::Stats { token, .. }
                if !self.issued_by_current_session(&token) =>
            {
                debug!("dropping reply issued before the last sign-in");
            }
            ApiReply::Pdfs { result, .. } => {
                if let Err(err) = &result {
                    if err.is_unauthorized() {
                        return self.expire_session();
                    }
                    warn!(%err, "listing pdfs failed");
                }
                self.library.set(result);
            }
            ApiReply::Deleted { pdf_id, result, .. } => {
                self.library.deleting = None;
                match result {
                    Ok(()) => {
                        info!(%pdf_id, "pdf deleted");
                        self.library.remove(pdf_id);
                        if let Some(db) = &self.history {
                            if let Err(err) = db.forget(pdf_id) {
                                warn!(%err, "could not drop score history");
                            }
                        }
                    }
                    Err(err) if err.is_unauthorized() => self.expire_session(),
                    Err(err) => {
                        warn!(%pdf_id, %err, "delete failed");
                        self.library.alert = Some(DELETE_FAILED_MESSAGE.to_string());
                    }
                }
            }
            ApiReply::UploadProgress(percent) => self.upload.on_progress(percent),
            ApiReply::Uploaded { result, .. } => match result {
                Ok(pdf) => {
                    info!(pdf_id = %pdf.id, filename = %pdf.filename, "upload complete");
                    self.upload.succeed();
                    match self.route {
                        Route::Upload => self.navigate(Route::Dashboard),
                        Route::Dashboard => self.refresh_library(),
                        _ => {}
                    }
                }
                Err(err) if err.is_unauthorized() => {
                    self.upload.fail(&err);
                    self.expire_session();
                }
                Err(err) => {
                    warn!(%err, "upload failed");
                    self.upload.fail(&err);
                }
            },
            ApiReply::Questions { session, result } => {
                let Some(quiz) = self.quiz_for(session) else {
                    return;
                };
                if result.as_ref().is_err_and(ApiError::is_unauthorized) {
                    return self.expire_session();
                }
                quiz.session.load(result);
                quiz.sync_selection();
            }
            ApiReply::Submitted {
                session,
                question_id,
                selected,
                result,
            } => self.on_submitted(session, question_id, selected, result),
            ApiReply::Stats { pdf_id, result, .. } => {
                let Some(stats) = self.stats.as_mut().filter(|s| s.pdf_id == pdf_id) else {
                    debug!(%pdf_id, "dropping stats for a closed screen");
                    return;
                };
                if result.as_ref().is_err_and(ApiError::is_unauthorized) {
                    return self.expire_session();
                }
                stats.loading = false;
                match result {
                    Ok(summary) => stats.summary = Some(summary),
                    Err(err) => {
                        warn!(%pdf_id, %err, "stats fetch failed");
                        stats.error = Some(err.user_message(STATS_FAILED_MESSAGE));
                    }
                }
            }
        }
    }

    fn issued_by_current_session(&self, token: &AuthToken) -> bool {
        self.session.token() == Some(token)
    }

    /// The live quiz, if `session` is still the one on screen
    fn quiz_for(&mut self, session: SessionId) -> Option<&mut QuizState> {
        let quiz = self.quiz.as_mut().filter(|q| q.session.id() == session);
        if quiz.is_none() {
            debug!(?session, "dropping reply for a finished quiz");
        }
        quiz
    }

    fn on_authenticated(&mut self, mode: AuthMode, result: Result<AuthToken, ApiError>) {
        match result {
            Ok(token) => {
                info!(%mode, "authenticated");
                if let Err(err) = self.session.sign_in(token) {
                    warn!(%err, "could not persist session");
                }
                for form in [&mut self.login, &mut self.register] {
                    form.pending = false;
                    form.password.clear();
                    form.error = None;
                }
                self.navigate(Route::Dashboard);
            }
            Err(err) => {
                info!(%mode, %err, "authentication failed");
                self.auth_form_mut(mode).fail(mode, &err);
            }
        }
    }

    fn on_submitted(
        &mut self,
        session: SessionId,
        question_id: QuestionId,
        selected: OptionKey,
        result: Result<crate::api::SubmitOutcome, ApiError>,
    ) {
        let Some(quiz) = self.quiz_for(session) else {
            return;
        };
        if result.as_ref().is_err_and(ApiError::is_unauthorized) {
            return self.expire_session();
        }
        quiz.settle(question_id);
        match result {
            Ok(outcome) => {
                if let Err(err) = quiz.session.record_answer(question_id, selected, outcome) {
                    warn!(%err, "discarding answer reply");
                    return;
                }
                if quiz.session.current().is_some_and(|q| q.id == question_id) {
                    quiz.selected = Some(selected);
                }
            }
            Err(err) => {
                warn!(%question_id, %err, "submit failed");
                quiz.notice = Some(err.user_message(SUBMIT_FAILED_MESSAGE));
                return;
            }
        }

        if quiz.session.is_complete() && !quiz.recorded {
            quiz.recorded = true;
            let score = quiz.session.score();
            let pdf_id = quiz.session.pdf_id();
            info!(%pdf_id, correct = score.correct, total = score.total, "quiz complete");
            if let Some(db) = &self.history {
                if let Err(err) = db.record(pdf_id, score) {
                    warn!(%err, "could not record score history");
                }
            }
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.kind == KeyEventKind::Release {
            return;
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }

        match self.route {
            Route::Login => self.on_auth_key(AuthMode::Login, key),
            Route::Register => self.on_auth_key(AuthMode::Register, key),
            Route::Dashboard => self.on_dashboard_key(key),
            Route::Upload => self.on_upload_key(key),
            Route::Quiz => self.on_quiz_key(key),
            Route::Stats => self.on_stats_key(key),
        }
    }

    fn on_auth_key(&mut self, mode: AuthMode, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('t') if ctrl => self.auth_form_mut(mode).toggle_visibility(),
            KeyCode::Char('r') if ctrl => self.navigate(match mode.other() {
                AuthMode::Login => Route::Login,
                AuthMode::Register => Route::Register,
            }),
            KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => {
                self.auth_form_mut(mode).toggle_focus()
            }
            KeyCode::Backspace => self.auth_form_mut(mode).pop(),
            KeyCode::Enter => {
                if let Some(credentials) = self.auth_form_mut(mode).submit() {
                    self.dispatcher.authenticate(mode, credentials);
                }
            }
            KeyCode::Char(c) if !ctrl => self.auth_form_mut(mode).push(c),
            _ => {}
        }
    }

    fn on_dashboard_key(&mut self, key: KeyEvent) {
        if let Some(pdf_id) = self.library.confirm_delete {
            match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') => {
                    self.library.confirm_delete = None;
                    if let Some(token) = self.session.token().cloned() {
                        self.library.deleting = Some(pdf_id);
                        self.dispatcher.delete_pdf(token, pdf_id);
                    }
                }
                _ => self.library.confirm_delete = None,
            }
            return;
        }
        self.library.alert = None;

        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Up | KeyCode::Char('k') => self.library.select_prev(),
            KeyCode::Down | KeyCode::Char('j') => self.library.select_next(),
            KeyCode::Char('r') => self.refresh_library(),
            KeyCode::Char('u') => self.navigate(Route::Upload),
            KeyCode::Char('o') => self.logout(),
            KeyCode::Enter => {
                if let Some(pdf) = self.library.selected_pdf() {
                    let pdf_id = pdf.id;
                    self.start_quiz(pdf_id);
                }
            }
            KeyCode::Char('s') => {
                if let Some(pdf) = self.library.selected_pdf() {
                    let pdf_id = pdf.id;
                    self.open_stats(pdf_id);
                }
            }
            KeyCode::Char('d') | KeyCode::Delete => {
                if self.library.deleting.is_none() {
                    self.library.confirm_delete = self.library.selected_pdf().map(|p| p.id);
                }
            }
            _ => {}
        }
    }

    fn on_upload_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.navigate(Route::Dashboard),
            _ if self.upload.is_uploading() => {}
            KeyCode::Backspace => {
                self.upload.path_input.pop();
            }
            KeyCode::Enter => {
                let Some(token) = self.session.token().cloned() else {
                    return;
                };
                match self.upload.begin() {
                    Ok(path) => {
                        info!(path = %path.display(), "uploading");
                        self.dispatcher.upload_pdf(token, path);
                    }
                    Err(err) => debug!(%err, "upload rejected locally"),
                }
            }
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.upload.path_input.push(c);
                self.upload.error = None;
            }
            _ => {}
        }
    }

    fn on_quiz_key(&mut self, key: KeyEvent) {
        if self.quiz.as_ref().is_some_and(|q| q.jump.is_some()) {
            return self.on_jump_key(key);
        }
        if key.code == KeyCode::Esc {
            self.navigate(Route::Dashboard);
            return;
        }
        let token = self.session.token().cloned();
        let Some(quiz) = self.quiz.as_mut() else {
            return;
        };
        if quiz.session.phase() != Phase::Active {
            return;
        }

        let moved = match key.code {
            KeyCode::Left | KeyCode::Char('h') => quiz.session.prev(),
            KeyCode::Right | KeyCode::Char('l') => quiz.session.next(),
            KeyCode::Char(c @ '1'..='9') => quiz.session.navigate(c as usize - '1' as usize),
            KeyCode::Char('0') => quiz.session.navigate(9),
            KeyCode::Char('g') => {
                quiz.jump = Some(String::new());
                false
            }
            KeyCode::Up | KeyCode::Char('k') => {
                quiz.move_selection(false);
                false
            }
            KeyCode::Down | KeyCode::Char('j') => {
                quiz.move_selection(true);
                false
            }
            KeyCode::Char('p') => {
                quiz.timer.toggle();
                debug!(running = quiz.timer.is_running(), "timer toggled");
                false
            }
            KeyCode::Char(c) => {
                if let Some(option) = OptionKey::from_char(c) {
                    quiz.selected = Some(option);
                }
                false
            }
            KeyCode::Enter => {
                let (Some(question_id), Some(selected), Some(token)) =
                    (quiz.session.current().map(|q| q.id), quiz.selected, token)
                else {
                    return;
                };
                match quiz.session.begin_submit(question_id, selected) {
                    Ok(request) => {
                        *quiz.pending.entry(request.question_id).or_default() += 1;
                        quiz.notice = None;
                        self.dispatcher
                            .submit_answer(token, quiz.session.id(), request);
                    }
                    Err(err) => {
                        debug!(%err, "submission refused");
                        quiz.notice = Some(err.to_string());
                    }
                }
                false
            }
            _ => false,
        };

        if moved {
            quiz.sync_selection();
        }
    }

    fn on_jump_key(&mut self, key: KeyEvent) {
        let Some(quiz) = self.quiz.as_mut() else {
            return;
        };
        let Some(input) = quiz.jump.as_mut() else {
            return;
        };
        match key.code {
            KeyCode::Char(c) if c.is_ascii_digit() && input.len() < 3 => input.push(c),
            KeyCode::Backspace => {
                input.pop();
            }
            KeyCode::Esc => quiz.jump = None,
            KeyCode::Enter => {
                // numbers are 1-based on screen
                let target = input.parse::<usize>().ok().and_then(|n| n.checked_sub(1));
                quiz.jump = None;
                if target.is_some_and(|index| quiz.session.navigate(index)) {
                    quiz.sync_selection();
                }
            }
            _ => {}
        }
    }

    fn on_stats_key(&mut self, key: KeyEvent) {
        let pdf_id = self.stats.as_ref().map(|s| s.pdf_id);
        match (key.code, pdf_id) {
            (KeyCode::Esc, _) => self.navigate(Route::Dashboard),
            (KeyCode::Char('r'), Some(pdf_id)) => self.open_stats(pdf_id),
            (KeyCode::Enter | KeyCode::Char('t'), Some(pdf_id)) => self.start_quiz(pdf_id),
            _ => {}
        }
    }
}

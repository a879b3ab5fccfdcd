// Headless integration using the internal runtime, dispatcher and App without a TTY.
// Requests go through the real worker threads to an in-memory service.
mod common;

use std::time::Duration;

use crossterm::event::KeyCode;
use uuid::Uuid;

use common::{Harness, PDF_ID, QUESTIONS};
use quizmind::app::{Route, TIME_UP_MESSAGE};
use quizmind::config::Config;
use quizmind::quiz::Phase;

fn quiz_phase(app: &quizmind::app::App) -> Option<Phase> {
    app.quiz.as_ref().map(|q| q.session.phase())
}

#[test]
fn headless_login_quiz_and_stats_flow() {
    let mut h = Harness::new(Config::default());
    assert_eq!(h.app.route, Route::Login);

    h.login();
    assert_eq!(h.app.route, Route::Dashboard);
    assert!(h.app.session.is_authenticated());

    h.press(KeyCode::Enter);
    h.run_until("questions", |app| quiz_phase(app) == Some(Phase::Active));
    assert_eq!(h.app.quiz.as_ref().unwrap().session.len(), QUESTIONS as usize);

    for (n, choice) in [(1u128, 'b'), (2, 'a'), (3, 'b')] {
        h.press(KeyCode::Char(choice));
        h.press(KeyCode::Enter);
        h.run_until("answer", |app| {
            app.quiz
                .as_ref()
                .is_some_and(|q| q.session.answer(Uuid::from_u128(n)).is_some())
        });
        h.press(KeyCode::Right);
    }
    h.run_until("last key", |app| {
        app.quiz.as_ref().is_some_and(|q| q.session.index() == 2)
    });

    let quiz = h.app.quiz.as_ref().unwrap();
    assert!(quiz.session.is_complete());
    let score = quiz.session.score();
    assert_eq!((score.correct, score.total), (2, 3));
    assert_eq!(score.percent(), Some(67));

    h.press(KeyCode::Esc);
    h.press(KeyCode::Char('s'));
    h.run_until("stats", |app| {
        app.stats.as_ref().is_some_and(|s| !s.loading)
    });
    let stats = h.app.stats.as_ref().unwrap();
    assert_eq!(stats.pdf_id, PDF_ID);
    let summary = stats.summary.as_ref().unwrap();
    assert_eq!(summary.total_attempts, 3);
    assert_eq!(summary.correct_count, 2);
    assert!(h.app.quiz.is_none());
}

#[test]
fn headless_wrong_password_stays_on_login() {
    let mut h = Harness::new(Config::default());
    h.type_text("student@example.com");
    h.press(KeyCode::Tab);
    h.type_text("guess");
    h.press(KeyCode::Enter);
    h.run_until("auth reply", |app| app.login.error.is_some());

    assert_eq!(h.app.route, Route::Login);
    assert!(!h.app.session.is_authenticated());
    assert_eq!(
        h.app.login.error.as_deref(),
        Some("Invalid email or password")
    );
    assert!(!h.app.login.pending);
}

#[test]
fn headless_countdown_expiry_blocks_new_answers() {
    let mut h = Harness::new(Config {
        quiz_secs: 1,
        ..Config::default()
    });
    h.tick = Duration::from_millis(250);
    h.login();

    h.press(KeyCode::Enter);
    h.run_until("questions", |app| quiz_phase(app) == Some(Phase::Active));
    h.run_until("expiry", |app| {
        app.quiz.as_ref().is_some_and(|q| q.session.is_expired())
    });
    let quiz = h.app.quiz.as_ref().unwrap();
    assert_eq!(quiz.notice.as_deref(), Some(TIME_UP_MESSAGE));
    assert!(quiz.timer.is_expired());

    h.press(KeyCode::Char('b'));
    h.press(KeyCode::Enter);
    h.press(KeyCode::Right);
    h.run_until("review", |app| {
        app.quiz.as_ref().is_some_and(|q| q.session.index() == 1)
    });

    let quiz = h.app.quiz.as_ref().unwrap();
    assert_eq!(quiz.session.score().total, 0);
    assert!(!quiz.is_submitting());
}

#[test]
fn headless_logout_returns_to_login() {
    let mut h = Harness::new(Config::default());
    h.login();
    h.press(KeyCode::Char('o'));
    h.run_until("logout", |app| app.route == Route::Login);
    assert!(!h.app.session.is_authenticated());
    assert!(h.app.library.pdfs.is_empty());
}

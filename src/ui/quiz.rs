use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph, Widget, Wrap},
};

use crate::api::OptionKey;
use crate::app::{App, QuizState, QUESTIONS_FAILED_MESSAGE};
use crate::quiz::{Direction as Arrival, Phase, QuizSession};
use crate::ui::{difficulty_color, screen::Screen, truncate, AMBER, GOLD, GREEN, RED};

pub struct QuizScreen;

impl Screen for QuizScreen {
    fn title(&self, app: &App) -> String {
        match &app.quiz {
            Some(quiz) => format!("Quiz · {}", truncate(&quiz.pdf_name, 48)),
            None => "Quiz".to_string(),
        }
    }

    fn render(&self, app: &App, area: Rect, buf: &mut Buffer) {
        let Some(quiz) = &app.quiz else {
            return;
        };

        match quiz.session.phase() {
            Phase::Loading => message("Loading questions…", Style::default(), area, buf),
            Phase::Empty => match quiz.session.load_error() {
                Some(err) => message(
                    &err.user_message(QUESTIONS_FAILED_MESSAGE),
                    Style::default().fg(RED),
                    area,
                    buf,
                ),
                None => message(
                    "No questions for this PDF yet.",
                    Style::default().add_modifier(Modifier::DIM),
                    area,
                    buf,
                ),
            },
            Phase::Active => render_active(quiz, area, buf),
        }
    }

    fn legend(&self, app: &App) -> &'static str {
        match app.quiz.as_ref().map(|q| q.session.phase()) {
            Some(Phase::Active) => {
                "(a-d/↑↓) choose / (enter) submit / (←→) prev/next / (1-9/g) jump / (p)ause / (esc) back"
            }
            _ => "(esc) back",
        }
    }
}

fn message(text: &str, style: Style, area: Rect, buf: &mut Buffer) {
    Paragraph::new(Span::styled(text, style))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .render(area, buf);
}

fn render_active(quiz: &QuizState, area: Rect, buf: &mut Buffer) {
    let session = &quiz.session;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // counter, score, timer
            Constraint::Length(1), // progress
            Constraint::Length(1), // question dots
            Constraint::Length(1), // padding
            Constraint::Min(8),    // card
            Constraint::Length(1), // final score / notice
            Constraint::Length(1), // prev / next
        ])
        .split(area);

    render_topbar(quiz, chunks[0], buf);

    Gauge::default()
        .gauge_style(Style::default().fg(GOLD))
        .percent(session.progress_percent())
        .label("")
        .render(chunks[1], buf);

    Paragraph::new(question_dots(session)).render(chunks[2], buf);

    render_card(quiz, chunks[4], buf);

    let footer = if let Some(input) = &quiz.jump {
        Span::styled(
            format!("Go to question (1-{}): {input}_", session.len()),
            Style::default().fg(GOLD),
        )
    } else if let Some(notice) = &quiz.notice {
        Span::styled(notice.as_str(), Style::default().fg(AMBER))
    } else if session.is_complete() {
        let score = session.score();
        Span::styled(
            format!(
                "🎉 {}/{} correct · {}%",
                score.correct,
                session.len(),
                score.percent().unwrap_or(0)
            ),
            Style::default().fg(GOLD).add_modifier(Modifier::BOLD),
        )
    } else {
        Span::raw("")
    };
    Paragraph::new(footer)
        .alignment(Alignment::Center)
        .render(chunks[5], buf);

    let enabled = Style::default().add_modifier(Modifier::BOLD);
    let disabled = Style::default().add_modifier(Modifier::DIM);
    let nav = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[6]);
    Paragraph::new(Span::styled(
        "← Prev",
        if session.can_prev() { enabled } else { disabled },
    ))
    .render(nav[0], buf);
    Paragraph::new(Span::styled(
        "Next →",
        if session.can_next() { enabled } else { disabled },
    ))
    .alignment(Alignment::Right)
    .render(nav[1], buf);
}

fn render_topbar(quiz: &QuizState, area: Rect, buf: &mut Buffer) {
    let session = &quiz.session;
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let score = session.score();

    let mut left = vec![
        Span::styled(format!("Q {}", session.index() + 1), bold),
        Span::styled(
            format!("/{}", session.len()),
            Style::default().add_modifier(Modifier::DIM),
        ),
    ];
    if score.total > 0 {
        left.push(Span::styled(
            format!("   ✓ {}/{}", score.correct, score.total),
            Style::default().fg(GREEN),
        ));
    }

    let timer = &quiz.timer;
    let timer_style = if timer.is_expired() {
        Style::default().fg(RED).add_modifier(Modifier::BOLD)
    } else if timer.remaining_secs() <= 60 {
        Style::default().fg(AMBER).add_modifier(Modifier::BOLD)
    } else {
        bold
    };
    let timer_text = if timer.is_expired() {
        "Time's up".to_string()
    } else if timer.is_running() {
        timer.display()
    } else {
        format!("{} paused", timer.display())
    };

    let halves = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);
    Paragraph::new(Line::from(left)).render(halves[0], buf);
    Paragraph::new(Span::styled(timer_text, timer_style))
        .alignment(Alignment::Right)
        .render(halves[1], buf);
}

/// One marker per question: current, answered right, answered wrong, open
fn question_dots(session: &QuizSession) -> Line<'static> {
    let spans = session
        .questions()
        .iter()
        .enumerate()
        .map(|(idx, q)| {
            let color = match session.answer(q.id) {
                Some(record) if record.correct => GREEN,
                Some(_) => RED,
                None => Color::DarkGray,
            };
            let symbol = if idx == session.index() { "◉ " } else { "● " };
            Span::styled(symbol, Style::default().fg(color))
        })
        .collect::<Vec<_>>();
    Line::from(spans)
}

fn render_card(quiz: &QuizState, area: Rect, buf: &mut Buffer) {
    let session = &quiz.session;
    let Some(question) = session.current() else {
        return;
    };
    let record = session.answer(question.id);

    // the arrow points the way the card arrived
    let arrow = match session.direction() {
        Arrival::Forward => "›",
        Arrival::Backward => "‹",
    };
    let mut title = vec![Span::raw(format!(" {arrow} Question {} ", session.index() + 1))];
    if let Some(difficulty) = &question.difficulty {
        title.push(Span::styled(
            format!("{difficulty} "),
            Style::default().fg(difficulty_color(difficulty)),
        ));
    }

    let mut lines = vec![
        Line::from(Span::styled(
            question.prompt.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
    ];

    for key in OptionKey::ALL {
        let chosen = quiz.selected == Some(key);
        let mut style = Style::default();
        if let Some(record) = record {
            if key == record.correct_answer {
                style = style.fg(GREEN);
            } else if key == record.selected && !record.correct {
                style = style.fg(RED);
            }
        }
        if chosen {
            style = style.add_modifier(Modifier::BOLD | Modifier::REVERSED);
        }
        lines.push(Line::from(vec![
            Span::raw(if chosen { "● " } else { "○ " }),
            Span::styled(format!("{key}. {}", question.option_text(key)), style),
        ]));
    }

    lines.push(Line::from(""));
    if quiz.is_submitting() {
        lines.push(Line::from(Span::styled(
            "Checking…",
            Style::default().add_modifier(Modifier::ITALIC),
        )));
    } else if let Some(record) = record {
        let verdict = if record.correct {
            Span::styled(" ✓ Correct", Style::default().fg(GREEN))
        } else {
            Span::styled(
                format!(" ✗ Correct: {}", record.correct_answer),
                Style::default().fg(RED),
            )
        };
        lines.push(Line::from(vec![
            Span::raw("Your answer: "),
            Span::styled(record.selected.to_string(), Style::default().add_modifier(Modifier::BOLD)),
            verdict,
        ]));
        if !record.explanation.is_empty() {
            lines.push(Line::from(Span::styled(
                record.explanation.clone(),
                Style::default().add_modifier(Modifier::ITALIC),
            )));
        }
    }

    Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(Line::from(title)))
        .wrap(Wrap { trim: false })
        .render(area, buf);
}

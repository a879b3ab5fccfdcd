use itertools::Itertools;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Gauge, Paragraph, Row, Table, Widget, Wrap},
};

use crate::api::{DifficultyStats, StatsSummary};
use crate::app::{App, StatsState};
use crate::history::HistoryEntry;
use crate::ui::{accuracy_color, difficulty_color, screen::Screen, truncate, RED};

pub struct StatsScreen;

impl Screen for StatsScreen {
    fn title(&self, app: &App) -> String {
        match &app.stats {
            Some(stats) => format!("Performance Stats · {}", truncate(&stats.pdf_name, 48)),
            None => "Performance Stats".to_string(),
        }
    }

    fn render(&self, app: &App, area: Rect, buf: &mut Buffer) {
        let Some(stats) = &app.stats else {
            return;
        };

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(8), Constraint::Length(score_board_height(stats))])
            .split(area);

        render_summary(stats, chunks[0], buf);
        render_score_board(&stats.history, chunks[1], buf);
    }

    fn legend(&self, _app: &App) -> &'static str {
        "(t)ake a quiz / (r)efresh / (esc) back"
    }
}

fn render_summary(stats: &StatsState, area: Rect, buf: &mut Buffer) {
    let centered_message = |text: &str, style: Style, buf: &mut Buffer| {
        Paragraph::new(Span::styled(text.to_string(), style))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .render(area, buf);
    };

    match (&stats.summary, &stats.error) {
        _ if stats.loading => centered_message("Loading stats…", Style::default(), buf),
        (_, Some(error)) => centered_message(error, Style::default().fg(RED), buf),
        (Some(summary), None) if summary.has_attempts() => render_overview(summary, area, buf),
        _ => centered_message(
            "No quiz attempts yet for this PDF. Press (t) to take a quiz.",
            Style::default().add_modifier(Modifier::DIM),
            buf,
        ),
    }
}

fn render_overview(summary: &StatsSummary, area: Rect, buf: &mut Buffer) {
    let breakdown = ordered_difficulties(summary);
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // totals
            Constraint::Length(1), // padding
            Constraint::Length(1), // gauge
            Constraint::Length(2), // description
            Constraint::Length(if breakdown.is_empty() {
                0
            } else {
                breakdown.len() as u16 + 1
            }),
            Constraint::Min(0),
        ])
        .split(area);

    let bold = Style::default().add_modifier(Modifier::BOLD);
    let accuracy = summary.accuracy_percent;
    Paragraph::new(Line::from(vec![
        Span::raw("Attempts "),
        Span::styled(summary.total_attempts.to_string(), bold),
        Span::raw("   Correct "),
        Span::styled(summary.correct_count.to_string(), bold),
        Span::raw("   Accuracy "),
        Span::styled(
            format!("{}%", accuracy.round()),
            bold.fg(accuracy_color(accuracy)),
        ),
    ]))
    .render(chunks[0], buf);

    Gauge::default()
        .gauge_style(Style::default().fg(accuracy_color(accuracy)))
        .percent(accuracy.clamp(0.0, 100.0).round() as u16)
        .label(format!("{}%", accuracy.round()))
        .render(chunks[2], buf);

    Paragraph::new(format!(
        "You've answered {} out of {} questions correctly across all difficulty levels.",
        summary.correct_count, summary.total_attempts
    ))
    .style(Style::default().add_modifier(Modifier::DIM))
    .wrap(Wrap { trim: true })
    .render(chunks[3], buf);

    if breakdown.is_empty() {
        return;
    }
    let mut lines = vec![Line::from(Span::styled("By Difficulty", bold))];
    lines.extend(breakdown.into_iter().map(|(name, d)| {
        Line::from(vec![
            Span::styled(
                format!("{:<8}", capitalize(name)),
                Style::default().fg(difficulty_color(name)),
            ),
            Span::raw(format!(
                " {:>4}%  {}/{} correct",
                d.accuracy.round(),
                d.correct,
                d.total
            )),
        ])
    }));
    Paragraph::new(lines).render(chunks[4], buf);
}

/// easy, medium, hard first; anything else after them alphabetically
pub fn ordered_difficulties(summary: &StatsSummary) -> Vec<(&str, &DifficultyStats)> {
    let rank = |name: &str| match name.to_ascii_lowercase().as_str() {
        "easy" => 0,
        "medium" => 1,
        "hard" => 2,
        _ => 3,
    };
    summary
        .by_difficulty
        .iter()
        .flatten()
        .map(|(name, stats)| (name.as_str(), stats))
        .sorted_by_key(|(name, _)| (rank(name), name.to_string()))
        .collect()
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn score_board_height(stats: &StatsState) -> u16 {
    // borders + header, or one message line
    if stats.history.is_empty() {
        3
    } else {
        stats.history.len() as u16 + 3
    }
}

/// Attempts finished on this machine
fn render_score_board(history: &[HistoryEntry], area: Rect, buf: &mut Buffer) {
    let block = Block::default().borders(Borders::ALL).title("Score History");
    if history.is_empty() {
        Paragraph::new(Span::styled(
            "No attempts yet.",
            Style::default().add_modifier(Modifier::DIM),
        ))
        .block(block)
        .render(area, buf);
        return;
    }

    let header = Row::new(vec!["Date", "Correct", "Total", "%"]).style(
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
    );
    let rows = history.iter().map(|entry| {
        Row::new(vec![
            Cell::from(entry.finished_at.format("%b %-d, %Y %H:%M").to_string()),
            Cell::from(entry.correct.to_string()),
            Cell::from(entry.total.to_string()),
            Cell::from(format!("{}%", entry.percent()))
                .style(Style::default().fg(accuracy_color(entry.percent() as f64))),
        ])
    });
    Table::new(
        rows,
        [
            Constraint::Length(20),
            Constraint::Length(8),
            Constraint::Length(6),
            Constraint::Length(5),
        ],
    )
    .header(header)
    .block(block)
    .render(area, buf);
}

pub mod auth;
pub mod dashboard;
pub mod quiz;
pub mod screen;
pub mod stats;
pub mod upload;

use std::time::Duration;

use chrono::{DateTime, Utc};
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
    Frame,
};
use time_humanize::{Accuracy, HumanTime, Tense};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::{app::App, ui::screen::current_screen};

pub const BRAND: &str = "QuizMind";

const HORIZONTAL_MARGIN: u16 = 2;

pub const GREEN: Color = Color::Rgb(0x22, 0xc5, 0x5e);
pub const AMBER: Color = Color::Rgb(0xf5, 0x9e, 0x0b);
pub const RED: Color = Color::Rgb(0xef, 0x44, 0x44);
pub const GOLD: Color = Color::Rgb(0xf0, 0xa5, 0x00);

/// Draw the whole frame: title bar, the active screen and its key legend
pub fn draw(app: &App, f: &mut Frame) {
    f.render_widget(app, f.area());
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .constraints([
                Constraint::Length(1), // title bar
                Constraint::Length(1), // padding
                Constraint::Min(1),    // screen
                Constraint::Length(1), // legend
            ])
            .split(area);

        let screen = current_screen(self.route);

        let bold_style = Style::default().add_modifier(Modifier::BOLD);
        Paragraph::new(Line::from(vec![
            Span::styled(BRAND, bold_style.fg(GOLD)),
            Span::styled(format!("  {}", screen.title(self)), bold_style),
        ]))
        .render(chunks[0], buf);

        screen.render(self, chunks[2], buf);

        Paragraph::new(Span::styled(
            screen.legend(self),
            Style::default().add_modifier(Modifier::ITALIC | Modifier::DIM),
        ))
        .alignment(Alignment::Center)
        .render(chunks[3], buf);
    }
}

/// Cut `text` to at most `width` terminal columns, marking the cut with an ellipsis
pub fn truncate(text: &str, width: usize) -> String {
    if text.width() <= width {
        return text.to_string();
    }
    if width == 0 {
        return String::new();
    }

    let mut out = String::new();
    let mut used = 0;
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w + 1 > width {
            break;
        }
        used += w;
        out.push(c);
    }
    out.push('…');
    out
}

/// Rect of at most `width` x `height` centered in `area`
pub fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

/// Green from 70%, amber from 40%, red below
pub fn accuracy_color(percent: f64) -> Color {
    if percent >= 70.0 {
        GREEN
    } else if percent >= 40.0 {
        AMBER
    } else {
        RED
    }
}

pub fn difficulty_color(difficulty: &str) -> Color {
    match difficulty.to_ascii_lowercase().as_str() {
        "easy" => GREEN,
        "medium" => AMBER,
        "hard" => RED,
        _ => Color::Gray,
    }
}

/// "3 days ago" style age of a server timestamp
pub fn humanize_age(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = (now - then).to_std().unwrap_or(Duration::ZERO);
    if elapsed < Duration::from_secs(60) {
        return "just now".to_string();
    }
    HumanTime::from(elapsed).to_text_en(Accuracy::Rough, Tense::Past)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn truncate_respects_display_width() {
        assert_eq!(truncate("notes.pdf", 20), "notes.pdf");
        assert_eq!(truncate("lecture-notes.pdf", 8), "lecture…");
        // wide characters take two columns each
        assert_eq!(truncate("日本語のノート", 5), "日本…");
        assert_eq!(truncate("abc", 0), "");
    }

    #[test]
    fn centered_rect_stays_inside() {
        let area = Rect::new(0, 0, 80, 24);
        assert_eq!(centered(area, 40, 10), Rect::new(20, 7, 40, 10));
        assert_eq!(centered(area, 200, 50), area);
    }

    #[test]
    fn accuracy_thresholds() {
        assert_eq!(accuracy_color(70.0), GREEN);
        assert_eq!(accuracy_color(69.9), AMBER);
        assert_eq!(accuracy_color(40.0), AMBER);
        assert_eq!(accuracy_color(39.0), RED);
    }

    #[test]
    fn difficulty_colors_ignore_case() {
        assert_eq!(difficulty_color("Easy"), GREEN);
        assert_eq!(difficulty_color("medium"), AMBER);
        assert_eq!(difficulty_color("HARD"), RED);
        assert_eq!(difficulty_color("expert"), Color::Gray);
    }

    #[test]
    fn draw_renders_brand_screen_and_legend() {
        use crate::app::testing::app;
        use ratatui::{backend::TestBackend, Terminal};

        let (app, _rx) = app(false);
        let mut terminal = Terminal::new(TestBackend::new(100, 24)).unwrap();
        terminal.draw(|f| draw(&app, f)).unwrap();

        let content: String = terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|c| c.symbol())
            .collect();
        assert!(content.contains("QuizMind  Welcome back"));
        assert!(content.contains("(enter) sign in"));
    }

    #[test]
    fn recent_timestamps_read_just_now() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        assert_eq!(humanize_age(now, now), "just now");
        // clock skew into the future is not an error
        assert_eq!(humanize_age(now + chrono::Duration::hours(1), now), "just now");
        assert!(humanize_age(now - chrono::Duration::days(3), now).contains("ago"));
    }
}

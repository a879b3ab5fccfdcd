use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph, Widget},
};

use crate::app::App;
use crate::auth::{AuthField, AuthForm, AuthMode};
use crate::ui::{centered, screen::Screen, RED};

const FORM_WIDTH: u16 = 56;

pub struct AuthScreen(pub AuthMode);

impl Screen for AuthScreen {
    fn title(&self, _app: &App) -> String {
        match self.0 {
            AuthMode::Login => "Welcome back".to_string(),
            AuthMode::Register => "Create your account".to_string(),
        }
    }

    fn render(&self, app: &App, area: Rect, buf: &mut Buffer) {
        let form = app.auth_form(self.0);
        let register = self.0 == AuthMode::Register;
        let area = centered(area, FORM_WIDTH, if register { 13 } else { 11 });

        let mut constraints = vec![
            Constraint::Length(3), // email
            Constraint::Length(3), // password
        ];
        if register {
            constraints.push(Constraint::Length(2)); // strength
        }
        constraints.push(Constraint::Length(2)); // status
        constraints.push(Constraint::Min(0));

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(area);

        field(
            "Email",
            &form.email,
            form.focus == AuthField::Email,
        )
        .render(chunks[0], buf);
        field(
            if form.show_password {
                "Password (visible)"
            } else {
                "Password"
            },
            &form.password_display(),
            form.focus == AuthField::Password,
        )
        .render(chunks[1], buf);

        let status_chunk = if register {
            render_strength(form, chunks[2], buf);
            chunks[3]
        } else {
            chunks[2]
        };

        let status = if form.pending {
            Span::styled(
                match self.0 {
                    AuthMode::Login => "Signing in…",
                    AuthMode::Register => "Creating account…",
                },
                Style::default().add_modifier(Modifier::ITALIC),
            )
        } else if let Some(error) = &form.error {
            Span::styled(error.as_str(), Style::default().fg(RED))
        } else {
            Span::raw("")
        };
        Paragraph::new(status).render(status_chunk, buf);
    }

    fn legend(&self, _app: &App) -> &'static str {
        match self.0 {
            AuthMode::Login => "(tab) switch field / (enter) sign in / (ctrl+t) show password / (ctrl+r) register / (esc)ape",
            AuthMode::Register => "(tab) switch field / (enter) create account / (ctrl+t) show password / (ctrl+r) sign in / (esc)ape",
        }
    }
}

fn field<'a>(label: &'a str, value: &'a str, focused: bool) -> Paragraph<'a> {
    let border_style = if focused {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().add_modifier(Modifier::DIM)
    };
    let mut spans = vec![Span::raw(value)];
    if focused {
        spans.push(Span::styled("▏", Style::default().add_modifier(Modifier::SLOW_BLINK)));
    }
    Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .title(label),
    )
}

fn render_strength(form: &AuthForm, area: Rect, buf: &mut Buffer) {
    if form.password.is_empty() {
        return;
    }
    let strength = form.strength();
    let color = strength
        .rgb()
        .map(|(r, g, b)| Color::Rgb(r, g, b))
        .unwrap_or(Color::DarkGray);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1)])
        .split(area);

    Gauge::default()
        .gauge_style(Style::default().fg(color))
        .percent(strength.percent())
        .label("")
        .render(rows[0], buf);
    Paragraph::new(Span::styled(
        if strength.label.is_empty() {
            "Too weak".to_string()
        } else {
            strength.label.to_string()
        },
        Style::default().fg(color),
    ))
    .render(rows[1], buf);
}

use chrono::Utc;
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};

use crate::api::PdfSummary;
use crate::app::App;
use crate::ui::{humanize_age, screen::Screen, truncate, AMBER, RED};

pub struct DashboardScreen;

impl Screen for DashboardScreen {
    fn title(&self, app: &App) -> String {
        let count = app.library.pdfs.len();
        format!(
            "Your Library · {} PDF{} · ready to study",
            count,
            if count == 1 { "" } else { "s" }
        )
    }

    fn render(&self, app: &App, area: Rect, buf: &mut Buffer) {
        let library = &app.library;
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(1), Constraint::Length(1)])
            .split(area);

        let block = Block::default().borders(Borders::ALL).title("PDFs");

        if library.pdfs.is_empty() {
            let (text, style) = if library.loading {
                ("Loading your PDFs…".to_string(), Style::default())
            } else if let Some(error) = &library.error {
                (error.clone(), Style::default().fg(RED))
            } else {
                (
                    "No PDFs yet. Upload one to generate quiz questions. Press (u) to upload."
                        .to_string(),
                    Style::default().add_modifier(Modifier::DIM),
                )
            };
            Paragraph::new(Span::styled(text, style))
                .block(block)
                .wrap(Wrap { trim: true })
                .render(chunks[0], buf);
        } else {
            let inner_width = chunks[0].width.saturating_sub(4) as usize;
            let lines: Vec<Line> = library
                .pdfs
                .iter()
                .enumerate()
                .map(|(idx, pdf)| {
                    pdf_line(
                        pdf,
                        idx == library.selected,
                        library.deleting == Some(pdf.id),
                        inner_width,
                    )
                })
                .collect();

            // keep the selection visible
            let visible = chunks[0].height.saturating_sub(2) as usize;
            let scroll = library.selected.saturating_sub(visible.saturating_sub(1));
            Paragraph::new(lines)
                .block(block)
                .scroll((scroll as u16, 0))
                .render(chunks[0], buf);
        }

        let status = if let Some(pdf_id) = library.confirm_delete {
            let name = library
                .find(pdf_id)
                .map(|p| p.filename.as_str())
                .unwrap_or("this PDF");
            Span::styled(
                format!("Delete \"{name}\"? (y/n)"),
                Style::default().fg(AMBER).add_modifier(Modifier::BOLD),
            )
        } else if let Some(alert) = &library.alert {
            Span::styled(alert.as_str(), Style::default().fg(RED))
        } else {
            Span::raw("")
        };
        Paragraph::new(status).render(chunks[1], buf);
    }

    fn legend(&self, _app: &App) -> &'static str {
        "(enter) quiz / (s)tats / (u)pload / (d)elete / (r)efresh / l(o)gout / (q)uit"
    }
}

fn pdf_line(pdf: &PdfSummary, selected: bool, deleting: bool, width: usize) -> Line<'static> {
    let age = pdf
        .uploaded_at_utc()
        .map(|t| humanize_age(t, Utc::now()))
        .unwrap_or_else(|| pdf.uploaded_at.clone());
    let meta = format!(
        "  {} chunks · {}{}",
        pdf.chunk_count,
        age,
        if deleting { " · deleting…" } else { "" }
    );
    let marker = if selected { "▶ " } else { "  " };
    let name_width = width.saturating_sub(meta.chars().count() + marker.len());

    let name_style = if selected {
        Style::default().add_modifier(Modifier::BOLD).fg(Color::Yellow)
    } else {
        Style::default()
    };

    Line::from(vec![
        Span::styled(marker, name_style),
        Span::styled(truncate(&pdf.filename, name_width), name_style),
        Span::styled(meta, Style::default().add_modifier(Modifier::DIM)),
    ])
}

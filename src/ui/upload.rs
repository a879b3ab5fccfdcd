use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::Span,
    widgets::{Block, Borders, Gauge, Paragraph, Widget, Wrap},
};

use crate::app::App;
use crate::ui::{screen::Screen, GOLD, GREEN, RED};
use crate::upload::{UploadStatus, MAX_UPLOAD_BYTES};

pub struct UploadScreen;

impl Screen for UploadScreen {
    fn title(&self, _app: &App) -> String {
        "Upload a PDF".to_string()
    }

    fn render(&self, app: &App, area: Rect, buf: &mut Buffer) {
        let form = &app.upload;
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2), // hint
                Constraint::Length(3), // path input
                Constraint::Length(1), // padding
                Constraint::Length(1), // progress
                Constraint::Length(1), // padding
                Constraint::Min(1),    // status
            ])
            .split(area);

        Paragraph::new(format!(
            "Type the path of a PDF (up to {} MB). Questions are generated once it has been processed.",
            MAX_UPLOAD_BYTES / (1024 * 1024)
        ))
        .style(Style::default().add_modifier(Modifier::DIM))
        .wrap(Wrap { trim: true })
        .render(chunks[0], buf);

        let input_style = if form.is_uploading() {
            Style::default().add_modifier(Modifier::DIM)
        } else {
            Style::default().fg(Color::Yellow)
        };
        Paragraph::new(form.path_input.as_str())
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(input_style)
                    .title("File"),
            )
            .render(chunks[1], buf);

        if form.status != UploadStatus::Idle {
            Gauge::default()
                .gauge_style(Style::default().fg(GOLD))
                .percent(u16::from(form.progress))
                .label(format!("{}%", form.progress))
                .render(chunks[3], buf);
        }

        let status = match (&form.error, &form.status) {
            (Some(error), _) => Span::styled(error.as_str(), Style::default().fg(RED)),
            (None, UploadStatus::Uploading) => Span::styled(
                "Uploading…",
                Style::default().add_modifier(Modifier::ITALIC),
            ),
            (None, UploadStatus::Done) => {
                Span::styled("Upload complete.", Style::default().fg(GREEN))
            }
            (None, UploadStatus::Idle) => Span::raw(""),
        };
        Paragraph::new(status)
            .wrap(Wrap { trim: true })
            .render(chunks[5], buf);
    }

    fn legend(&self, app: &App) -> &'static str {
        if app.upload.is_uploading() {
            "(esc) back to library, the upload continues"
        } else {
            "(enter) upload / (esc) back"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiError;
    use crate::app::testing::{app, key, saved_token};
    use crate::app::Route;
    use crate::dispatch::ApiReply;
    use crate::upload::{INVALID_FILE_MESSAGE, UPLOAD_FAILED_MESSAGE};
    use crossterm::event::KeyCode;
    use tempfile::tempdir;

    fn rendered(app: &App) -> String {
        let area = Rect::new(0, 0, 100, 20);
        let mut buffer = Buffer::empty(area);
        app.render(area, &mut buffer);
        buffer.content.iter().map(|c| c.symbol()).collect()
    }

    #[test]
    fn invalid_file_is_reported_without_uploading() {
        let (mut app, _rx) = app(true);
        app.navigate(Route::Upload);
        for c in "/nope/missing.txt".chars() {
            app.handle_key(key(KeyCode::Char(c)));
        }
        app.handle_key(key(KeyCode::Enter));
        assert!(!app.upload.is_uploading());
        assert!(rendered(&app).contains(INVALID_FILE_MESSAGE));
    }

    #[test]
    fn progress_then_failure_resets_bar() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("notes.pdf");
        std::fs::write(&path, b"%PDF-1.4 test").unwrap();

        let (mut app, _rx) = app(true);
        app.navigate(Route::Upload);
        app.upload.path_input = path.display().to_string();
        app.handle_key(key(KeyCode::Enter));
        assert!(app.upload.is_uploading());

        app.handle_api(ApiReply::UploadProgress(40));
        assert!(rendered(&app).contains("40%"));

        app.handle_api(ApiReply::Uploaded {
            token: saved_token(),
            result: Err(ApiError::Transport("reset".into())),
        });
        assert_eq!(app.upload.progress, 0);
        assert!(rendered(&app).contains(UPLOAD_FAILED_MESSAGE));
    }
}

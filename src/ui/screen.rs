use ratatui::{buffer::Buffer, layout::Rect};

use crate::app::{App, Route};
use crate::auth::AuthMode;
use crate::ui::{
    auth::AuthScreen, dashboard::DashboardScreen, quiz::QuizScreen, stats::StatsScreen,
    upload::UploadScreen,
};

/// A UI Screen boundary: title, body rendering and the key legend shown under it
pub trait Screen {
    fn title(&self, app: &App) -> String;
    fn render(&self, app: &App, area: Rect, buf: &mut Buffer);
    fn legend(&self, app: &App) -> &'static str;
}

/// Helper to construct the appropriate screen for the current route
pub fn current_screen(route: Route) -> Box<dyn Screen> {
    match route {
        Route::Login => Box::new(AuthScreen(AuthMode::Login)),
        Route::Register => Box::new(AuthScreen(AuthMode::Register)),
        Route::Dashboard => Box::new(DashboardScreen),
        Route::Upload => Box::new(UploadScreen),
        Route::Quiz => Box::new(QuizScreen),
        Route::Stats => Box::new(StatsScreen),
    }
}

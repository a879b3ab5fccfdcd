// Library surface for the binary, headless/integration tests and reuse.
pub mod api;
pub mod app;
pub mod app_dirs;
pub mod auth;
pub mod config;
pub mod dispatch;
pub mod history;
pub mod logging;
pub mod password;
pub mod quiz;
pub mod runtime;
pub mod session;
pub mod timer;
pub mod ui;
pub mod upload;

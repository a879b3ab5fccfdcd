use directories::ProjectDirs;
use std::path::PathBuf;

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    pub fn state_dir() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            Some(
                PathBuf::from(home)
                    .join(".local")
                    .join("state")
                    .join("quizmind"),
            )
        } else {
            ProjectDirs::from("", "", "quizmind")
                .map(|proj_dirs| proj_dirs.data_local_dir().to_path_buf())
        }
    }

    pub fn config_path() -> PathBuf {
        if let Some(pd) = ProjectDirs::from("", "", "quizmind") {
            pd.config_dir().join("config.json")
        } else {
            PathBuf::from("quizmind_config.json")
        }
    }

    pub fn session_path() -> PathBuf {
        Self::state_file("session.json")
    }

    pub fn history_db_path() -> PathBuf {
        Self::state_file("history.db")
    }

    pub fn log_path() -> PathBuf {
        Self::state_file("quizmind.log")
    }

    fn state_file(name: &str) -> PathBuf {
        Self::state_dir()
            .map(|dir| dir.join(name))
            .unwrap_or_else(|| PathBuf::from(format!("quizmind_{name}")))
    }
}

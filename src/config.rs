use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::app_dirs::AppDirs;
use crate::timer::QUIZ_SECONDS;

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const DEFAULT_QUESTION_LIMIT: usize = 10;
/// The server accepts 1..=50 questions per quiz
pub const MAX_QUESTION_LIMIT: usize = 50;

pub const API_URL_ENV: &str = "QUIZMIND_API_URL";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub api_url: String,
    pub question_limit: usize,
    pub quiz_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            question_limit: DEFAULT_QUESTION_LIMIT,
            quiz_secs: QUIZ_SECONDS,
        }
    }
}

/// Command-line or environment values that take precedence over the stored file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigOverrides {
    pub api_url: Option<String>,
    pub question_limit: Option<usize>,
    pub quiz_secs: Option<u64>,
}

impl Config {
    pub fn with_overrides(mut self, overrides: &ConfigOverrides) -> Self {
        if let Some(url) = &overrides.api_url {
            self.api_url = url.clone();
        }
        if let Some(limit) = overrides.question_limit {
            self.question_limit = limit;
        }
        if let Some(secs) = overrides.quiz_secs {
            self.quiz_secs = secs;
        }
        self.question_limit = self.question_limit.clamp(1, MAX_QUESTION_LIMIT);
        self
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self {
            path: AppDirs::config_path(),
        }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        if let Ok(bytes) = fs::read(&self.path) {
            match serde_json::from_slice::<Config>(&bytes) {
                Ok(cfg) => return cfg,
                Err(err) => {
                    tracing::warn!(path = %self.path.display(), %err, "ignoring unreadable config")
                }
            }
        }
        Config::default()
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg)?;
        fs::write(&self.path, data)
    }
}

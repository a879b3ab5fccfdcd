use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type PdfId = Uuid;
pub type QuestionId = Uuid;

/// One of the four answer letters a question offers
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum_macros::Display,
)]
#[serde(try_from = "String", into = "String")]
pub enum OptionKey {
    A,
    B,
    C,
    D,
}

impl OptionKey {
    pub const ALL: [OptionKey; 4] = [OptionKey::A, OptionKey::B, OptionKey::C, OptionKey::D];

    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'A' => Some(OptionKey::A),
            'B' => Some(OptionKey::B),
            'C' => Some(OptionKey::C),
            'D' => Some(OptionKey::D),
            _ => None,
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

impl TryFrom<String> for OptionKey {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let mut chars = value.trim().chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => {
                OptionKey::from_char(c).ok_or_else(|| format!("unknown option key {value:?}"))
            }
            _ => Err(format!("unknown option key {value:?}")),
        }
    }
}

impl From<OptionKey> for String {
    fn from(key: OptionKey) -> Self {
        key.to_string()
    }
}

/// A multiple-choice question served for a quiz; the answer stays on the server
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "WireQuestion")]
pub struct Question {
    pub id: QuestionId,
    pub prompt: String,
    pub options: BTreeMap<OptionKey, String>,
    pub difficulty: Option<String>,
}

impl Question {
    pub fn new<I, S>(id: QuestionId, prompt: impl Into<String>, options: I) -> Self
    where
        I: IntoIterator<Item = (OptionKey, S)>,
        S: Into<String>,
    {
        Self {
            id,
            prompt: prompt.into(),
            options: options.into_iter().map(|(k, v)| (k, v.into())).collect(),
            difficulty: None,
        }
    }

    pub fn option_text(&self, key: OptionKey) -> &str {
        self.options.get(&key).map(String::as_str).unwrap_or("")
    }
}

#[derive(Deserialize)]
struct WireQuestion {
    id: QuestionId,
    question: String,
    #[serde(default)]
    options: BTreeMap<String, String>,
    #[serde(default)]
    difficulty: Option<String>,
}

impl From<WireQuestion> for Question {
    fn from(wire: WireQuestion) -> Self {
        // generated questions occasionally carry numeric keys; only letters are answerable
        let options = wire
            .options
            .into_iter()
            .filter_map(|(k, v)| OptionKey::try_from(k).ok().map(|key| (key, v)))
            .collect();
        Self {
            id: wire.id,
            prompt: wire.question,
            options,
            difficulty: wire.difficulty,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SubmitRequest {
    pub question_id: QuestionId,
    pub selected: OptionKey,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SubmitOutcome {
    #[serde(alias = "correct")]
    pub is_correct: bool,
    pub correct_answer: OptionKey,
    #[serde(default)]
    pub explanation: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PdfSummary {
    pub id: PdfId,
    pub filename: String,
    #[serde(default)]
    pub chunk_count: u32,
    pub uploaded_at: String,
}

impl PdfSummary {
    /// The server may send either an offset timestamp or a naive UTC one
    pub fn uploaded_at_utc(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.uploaded_at)
    }
}

pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct DifficultyStats {
    #[serde(default)]
    pub correct: u64,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub accuracy: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StatsSummary {
    pub total_attempts: u64,
    pub correct_count: u64,
    pub accuracy_percent: f64,
    #[serde(default)]
    pub by_difficulty: Option<BTreeMap<String, DifficultyStats>>,
}

impl StatsSummary {
    pub fn has_attempts(&self) -> bool {
        self.total_attempts > 0
    }
}

#[derive(Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Bearer token issued by `/auth/login` and `/auth/register`
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthToken(String);

impl AuthToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthToken(<redacted>)")
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: AuthToken,
}

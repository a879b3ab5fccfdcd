//! State of a single quiz attempt.
//!
//! A `QuizSession` is created in the `Loading` phase, receives its question list
//! once, and from then on only changes through navigation and answer replies.
//! Score and completion are derived from the answer map on every call.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use itertools::Itertools;
use thiserror::Error;
use tracing::{debug, info};

use crate::api::{
    ApiError, ApiGateway, AuthToken, OptionKey, PdfId, Question, QuestionId, SubmitOutcome,
    SubmitRequest,
};

/// Distinguishes one attempt from the next so late replies can be dropped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(u64);

impl SessionId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        SessionId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerRecord {
    pub selected: OptionKey,
    pub correct: bool,
    pub correct_answer: OptionKey,
    pub explanation: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum Phase {
    Loading,
    Empty,
    Active,
}

/// Which way the last navigation went; only used to pick a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Forward,
    Backward,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Score {
    pub correct: usize,
    pub total: usize,
}

impl Score {
    pub fn percent(&self) -> Option<u32> {
        (self.total > 0).then(|| ((self.correct as f64 / self.total as f64) * 100.0).round() as u32)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("questions have not been loaded")]
    NotLoaded,
    #[error("question {0} is not part of this quiz")]
    UnknownQuestion(QuestionId),
    #[error("time is up")]
    Expired,
    #[error(transparent)]
    Api(#[from] ApiError),
}

#[derive(Debug, Clone)]
pub struct QuizSession {
    id: SessionId,
    pdf_id: PdfId,
    phase: Phase,
    questions: Vec<Question>,
    index: usize,
    answers: HashMap<QuestionId, AnswerRecord>,
    direction: Direction,
    load_error: Option<ApiError>,
    expired: bool,
}

impl QuizSession {
    pub fn loading(pdf_id: PdfId) -> Self {
        Self {
            id: SessionId::next(),
            pdf_id,
            phase: Phase::Loading,
            questions: Vec::new(),
            index: 0,
            answers: HashMap::new(),
            direction: Direction::default(),
            load_error: None,
            expired: false,
        }
    }

    /// Fetch up to `limit` questions and build a session from them.
    /// A failed fetch yields an empty session that remembers why.
    pub fn initialize<G: ApiGateway + ?Sized>(
        gateway: &G,
        token: &AuthToken,
        pdf_id: PdfId,
        limit: usize,
    ) -> Self {
        let mut session = Self::loading(pdf_id);
        session.load(gateway.fetch_questions(token, pdf_id, limit));
        session
    }

    /// Apply the question fetch. Only the first load takes effect.
    pub fn load(&mut self, result: Result<Vec<Question>, ApiError>) {
        if self.phase != Phase::Loading {
            return;
        }
        let questions = match result {
            Ok(questions) => questions,
            Err(err) => {
                info!(pdf_id = %self.pdf_id, %err, "question fetch failed");
                self.load_error = Some(err);
                Vec::new()
            }
        };
        // duplicate ids would make completion unreachable
        self.questions = questions.into_iter().unique_by(|q| q.id).collect();
        self.index = 0;
        self.answers.clear();
        self.phase = if self.questions.is_empty() {
            Phase::Empty
        } else {
            Phase::Active
        };
        debug!(pdf_id = %self.pdf_id, count = self.questions.len(), phase = %self.phase, "quiz loaded");
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn pdf_id(&self) -> PdfId {
        self.pdf_id
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn load_error(&self) -> Option<&ApiError> {
        self.load_error.as_ref()
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn current(&self) -> Option<&Question> {
        self.questions.get(self.index)
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn answer(&self, question_id: QuestionId) -> Option<&AnswerRecord> {
        self.answers.get(&question_id)
    }

    pub fn contains(&self, question_id: QuestionId) -> bool {
        self.questions.iter().any(|q| q.id == question_id)
    }

    pub fn is_expired(&self) -> bool {
        self.expired
    }

    /// Stop accepting new submissions; navigation stays available for review
    pub fn expire(&mut self) {
        if !self.expired {
            info!(pdf_id = %self.pdf_id, "quiz time expired");
        }
        self.expired = true;
    }

    pub fn can_prev(&self) -> bool {
        self.phase == Phase::Active && self.index > 0
    }

    pub fn can_next(&self) -> bool {
        self.phase == Phase::Active && self.index + 1 < self.questions.len()
    }

    /// Jump to `target`. Out-of-range targets and the current index are no-ops.
    /// Returns whether the index changed.
    pub fn navigate(&mut self, target: usize) -> bool {
        if target >= self.questions.len() || target == self.index {
            return false;
        }
        self.direction = if target > self.index {
            Direction::Forward
        } else {
            Direction::Backward
        };
        self.index = target;
        true
    }

    pub fn next(&mut self) -> bool {
        self.can_next() && self.navigate(self.index + 1)
    }

    pub fn prev(&mut self) -> bool {
        self.can_prev() && self.navigate(self.index - 1)
    }

    /// Validate a submission and produce the request to send
    pub fn begin_submit(
        &self,
        question_id: QuestionId,
        selected: OptionKey,
    ) -> Result<SubmitRequest, SessionError> {
        if self.phase != Phase::Active {
            return Err(SessionError::NotLoaded);
        }
        if self.expired {
            return Err(SessionError::Expired);
        }
        if !self.contains(question_id) {
            return Err(SessionError::UnknownQuestion(question_id));
        }
        Ok(SubmitRequest {
            question_id,
            selected,
        })
    }

    /// Apply a submission reply to the question it was issued for.
    /// A later reply for the same question replaces the earlier record.
    pub fn record_answer(
        &mut self,
        question_id: QuestionId,
        selected: OptionKey,
        outcome: SubmitOutcome,
    ) -> Result<&AnswerRecord, SessionError> {
        if !self.contains(question_id) {
            return Err(SessionError::UnknownQuestion(question_id));
        }
        let record = AnswerRecord {
            selected,
            correct: outcome.is_correct,
            correct_answer: outcome.correct_answer,
            explanation: outcome.explanation,
        };
        self.answers.insert(question_id, record);
        Ok(&self.answers[&question_id])
    }

    /// Submit synchronously through `gateway` and record the reply
    pub fn submit_answer<G: ApiGateway + ?Sized>(
        &mut self,
        gateway: &G,
        token: &AuthToken,
        question_id: QuestionId,
        selected: OptionKey,
    ) -> Result<&AnswerRecord, SessionError> {
        let request = self.begin_submit(question_id, selected)?;
        let outcome = gateway.submit_answer(token, &request)?;
        self.record_answer(question_id, selected, outcome)
    }

    pub fn score(&self) -> Score {
        Score {
            correct: self.answers.values().filter(|a| a.correct).count(),
            total: self.answers.len(),
        }
    }

    pub fn is_complete(&self) -> bool {
        !self.questions.is_empty()
            && self
                .questions
                .iter()
                .all(|q| self.answers.contains_key(&q.id))
    }

    /// Position through the quiz, 0-100
    pub fn progress_percent(&self) -> u16 {
        if self.questions.is_empty() {
            0
        } else {
            (((self.index + 1) * 100) / self.questions.len()) as u16
        }
    }
}

//! 答题会话状态机：loading → active → complete

use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

use crate::quiz::builders::build_set;
use crate::quiz::catalog::ItemCatalog;
use crate::quiz::config::SchedulerConfig;
use crate::quiz::ledger::Ledger;
use crate::quiz::sampler::QuizRng;
use crate::quiz::types::{AnswerRecord, Item, QuizMode};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Loading,
    Active,
    Complete,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("session is not active")]
    NotActive,
    #[error("answer is for item {got}, current item is {expected}")]
    ItemMismatch { expected: String, got: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    /// 1-based position of the current item; equals `total` once complete.
    pub current: usize,
    pub total: usize,
    pub answered: usize,
}

#[derive(Debug, Clone)]
pub struct SessionDriver {
    mode: Option<QuizMode>,
    items: Vec<Item>,
    position: usize,
    answers: Vec<AnswerRecord>,
    state: SessionState,
}

impl Default for SessionDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionDriver {
    pub fn new() -> Self {
        Self {
            mode: None,
            items: Vec::new(),
            position: 0,
            answers: Vec::new(),
            state: SessionState::Loading,
        }
    }

    /// Builds the item list for `mode` and begins the session.
    pub fn start(
        &mut self,
        mode: QuizMode,
        catalog: &ItemCatalog,
        ledger: &Ledger,
        today: NaiveDate,
        config: &SchedulerConfig,
        rng: &mut QuizRng,
    ) -> SessionState {
        let items = build_set(mode, catalog, ledger, today, config, rng);
        self.begin(mode, items)
    }

    /// 空题单直接进入 complete，这是合法终态而不是错误
    pub fn begin(&mut self, mode: QuizMode, items: Vec<Item>) -> SessionState {
        self.mode = Some(mode);
        self.items = items;
        self.position = 0;
        self.answers.clear();
        self.state = if self.items.is_empty() {
            SessionState::Complete
        } else {
            SessionState::Active
        };
        self.state
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn mode(&self) -> Option<QuizMode> {
        self.mode
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn answers(&self) -> &[AnswerRecord] {
        &self.answers
    }

    pub fn is_complete(&self) -> bool {
        self.state == SessionState::Complete
    }

    pub fn current_item(&self) -> Option<&Item> {
        match self.state {
            SessionState::Active => self.items.get(self.position),
            SessionState::Loading | SessionState::Complete => None,
        }
    }

    pub fn progress(&self) -> Progress {
        let total = self.items.len();
        let current = match self.state {
            SessionState::Loading => 0,
            SessionState::Active => self.position + 1,
            SessionState::Complete => total,
        };
        Progress {
            current,
            total,
            answered: self.answers.len(),
        }
    }

    /// Validates `record` against the current item without changing anything.
    pub fn check(&self, record: &AnswerRecord) -> Result<&Item, SessionError> {
        let current = self.current_item().ok_or(SessionError::NotActive)?;
        if current.id != record.item_id {
            return Err(SessionError::ItemMismatch {
                expected: current.id.clone(),
                got: record.item_id.clone(),
            });
        }
        Ok(current)
    }

    pub fn submit(&mut self, record: AnswerRecord) -> Result<SessionState, SessionError> {
        self.check(&record)?;
        self.answers.push(record);
        if self.position + 1 < self.items.len() {
            self.position += 1;
        } else {
            self.state = SessionState::Complete;
        }
        Ok(self.state)
    }
}

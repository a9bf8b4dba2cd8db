use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::Display;

use crate::card::Card;
use crate::error::{FlashcardError, Result};
use crate::mode::{ModeConfig, StudyMode};

/// Randomly generated session key, stable for the lifetime of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session-{:016x}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Active,
    Ended,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// Position of the answered card within the session deck.
    pub card_index: usize,
    pub card_id: String,
    pub correct: bool,
    pub tags: Vec<String>,
    pub answered_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudySession {
    pub id: SessionId,
    pub user_id: String,
    pub mode: StudyMode,
    pub cards: Vec<Card>,
    pub current_index: usize,
    pub started_at: DateTime<Utc>,
    pub responses: Vec<Response>,
    pub settings: ModeConfig,
    state: SessionState,
}

/// What a finished session reports back for profile updates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionResult {
    pub session_id: Option<SessionId>,
    pub mode: StudyMode,
    pub responses: Vec<Response>,
    pub study_time_minutes: u32,
}

impl SessionResult {
    pub fn accuracy(&self) -> f32 {
        accuracy(&self.responses)
    }
}

/// Fraction of correct responses, zero when there are none.
pub(crate) fn accuracy(responses: &[Response]) -> f32 {
    if responses.is_empty() {
        return 0.0;
    }
    let correct = responses.iter().filter(|r| r.correct).count();
    correct as f32 / responses.len() as f32
}

impl StudySession {
    pub(crate) fn new(
        id: SessionId,
        user_id: String,
        mode: StudyMode,
        cards: Vec<Card>,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            user_id,
            mode,
            cards,
            current_index: 0,
            started_at,
            responses: Vec::new(),
            settings: mode.config(),
            state: SessionState::Active,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn current_card(&self) -> Option<&Card> {
        match self.state {
            SessionState::Active => self.cards.get(self.current_index),
            SessionState::Ended => None,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.current_index >= self.cards.len()
    }

    /// Records an answer for the current card and moves to the next one.
    pub fn record_response(&mut self, correct: bool, now: DateTime<Utc>) -> Result<()> {
        if self.state == SessionState::Ended {
            return Err(FlashcardError::SessionEnded);
        }
        let card = self
            .cards
            .get(self.current_index)
            .ok_or(FlashcardError::NoCurrentCard)?;
        self.responses.push(Response {
            card_index: self.current_index,
            card_id: card.id.clone(),
            correct,
            tags: card.tags.clone(),
            answered_at: now,
        });
        self.current_index += 1;
        Ok(())
    }

    pub fn accuracy(&self) -> f32 {
        accuracy(&self.responses)
    }

    pub fn end(&mut self, now: DateTime<Utc>) -> Result<SessionResult> {
        if self.state == SessionState::Ended {
            return Err(FlashcardError::SessionEnded);
        }
        self.state = SessionState::Ended;
        let minutes = (now - self.started_at).num_minutes().max(0);
        Ok(SessionResult {
            session_id: Some(self.id),
            mode: self.mode,
            responses: self.responses.clone(),
            study_time_minutes: u32::try_from(minutes).unwrap_or(u32::MAX),
        })
    }
}

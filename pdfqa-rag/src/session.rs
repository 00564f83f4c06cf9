//! Interactive chat session state.
//!
//! [`ChatSession`] tracks the question currently in flight and the history of
//! answered questions for one loaded document. Front ends drive it with
//! [`SessionEvent`]s; events that make no sense in the current state are
//! rejected and leave the session untouched.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::document::AnswerRecord;
use crate::error::{QaError, Result};

/// Where the session is in the ask/answer cycle.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SessionState {
    /// No question pending and nothing displayed.
    #[default]
    Idle,
    /// A question was submitted and its answer is being computed.
    AwaitingAnswer {
        /// The pending question.
        question: String,
    },
    /// The last question was answered.
    Answered {
        /// The answered question.
        question: String,
        /// Its answer.
        answer: Box<AnswerRecord>,
    },
}

impl SessionState {
    fn label(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::AwaitingAnswer { .. } => "awaiting_answer",
            Self::Answered { .. } => "answered",
        }
    }
}

/// Inputs that drive a [`ChatSession`].
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// The user submitted a question.
    Ask(String),
    /// The user cleared the current question and answer.
    Clear,
    /// The answer to the pending question arrived.
    AnswerReceived(AnswerRecord),
}

impl SessionEvent {
    fn label(&self) -> &'static str {
        match self {
            Self::Ask(_) => "ask",
            Self::Clear => "clear",
            Self::AnswerReceived(_) => "answer_received",
        }
    }
}

/// One answered question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// The question as asked.
    pub question: String,
    /// The answer record.
    pub answer: AnswerRecord,
    /// When the question was submitted.
    pub asked_at: DateTime<Utc>,
}

/// Question/answer state for one loaded document.
#[derive(Debug, Clone, Default)]
pub struct ChatSession {
    state: SessionState,
    history: Vec<HistoryEntry>,
    pending_since: Option<DateTime<Utc>>,
}

impl ChatSession {
    /// A fresh idle session with empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// The current state.
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Apply `event`.
    ///
    /// # Errors
    ///
    /// Returns [`QaError::InvalidTransition`] when `event` is not valid in the
    /// current state; the session is left unchanged.
    pub fn handle(&mut self, event: SessionEvent) -> Result<&SessionState> {
        let from = self.state.label();
        let next = match (&self.state, event) {
            (_, SessionEvent::Clear) => {
                self.pending_since = None;
                SessionState::Idle
            }
            (SessionState::Idle | SessionState::Answered { .. }, SessionEvent::Ask(question)) => {
                self.pending_since = Some(Utc::now());
                SessionState::AwaitingAnswer { question }
            }
            (SessionState::AwaitingAnswer { question }, SessionEvent::AnswerReceived(answer)) => {
                let question = question.clone();
                self.history.push(HistoryEntry {
                    question: question.clone(),
                    answer: answer.clone(),
                    asked_at: self.pending_since.take().unwrap_or_else(Utc::now),
                });
                SessionState::Answered { question, answer: Box::new(answer) }
            }
            (state, event) => {
                return Err(QaError::InvalidTransition { state: state.label(), event: event.label() });
            }
        };

        debug!(from, to = next.label(), "session transition");
        self.state = next;
        Ok(&self.state)
    }

    /// Answered questions, newest first.
    pub fn history(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.history.iter().rev()
    }

    /// Number of answered questions.
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Forget all answered questions and return to idle.
    pub fn clear_history(&mut self) {
        self.history.clear();
        self.state = SessionState::Idle;
        self.pending_since = None;
    }

    /// Reset for a newly loaded document.
    pub fn reset_for_new_document(&mut self) {
        self.clear_history();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn answer(text: &str) -> AnswerRecord {
        AnswerRecord { answer: text.to_string(), ..AnswerRecord::no_context() }
    }

    #[test]
    fn ask_then_answer_appends_one_entry() {
        let mut session = ChatSession::new();
        session.handle(SessionEvent::Ask("What is mango?".into())).unwrap();
        assert!(matches!(session.state(), SessionState::AwaitingAnswer { .. }));
        assert_eq!(session.history_len(), 0);

        session.handle(SessionEvent::AnswerReceived(answer("a fruit"))).unwrap();
        assert!(matches!(session.state(), SessionState::Answered { question, .. } if question == "What is mango?"));
        assert_eq!(session.history_len(), 1);
    }

    #[test]
    fn history_is_newest_first() {
        let mut session = ChatSession::new();
        for q in ["first", "second"] {
            session.handle(SessionEvent::Ask(q.into())).unwrap();
            session.handle(SessionEvent::AnswerReceived(answer(q))).unwrap();
        }
        let questions: Vec<&str> = session.history().map(|e| e.question.as_str()).collect();
        assert_eq!(questions, vec!["second", "first"]);
    }

    #[test]
    fn answer_without_question_is_rejected() {
        let mut session = ChatSession::new();
        let err = session.handle(SessionEvent::AnswerReceived(answer("x"))).unwrap_err();
        assert!(matches!(err, QaError::InvalidTransition { state: "idle", event: "answer_received" }));
        assert_eq!(session.state(), &SessionState::Idle);
        assert_eq!(session.history_len(), 0);
    }

    #[test]
    fn ask_while_awaiting_is_rejected() {
        let mut session = ChatSession::new();
        session.handle(SessionEvent::Ask("one".into())).unwrap();
        let err = session.handle(SessionEvent::Ask("two".into())).unwrap_err();
        assert!(matches!(err, QaError::InvalidTransition { state: "awaiting_answer", event: "ask" }));
        assert!(matches!(session.state(), SessionState::AwaitingAnswer { question } if question == "one"));
    }

    #[test]
    fn clear_keeps_history() {
        let mut session = ChatSession::new();
        session.handle(SessionEvent::Ask("q".into())).unwrap();
        session.handle(SessionEvent::AnswerReceived(answer("a"))).unwrap();
        session.handle(SessionEvent::Clear).unwrap();
        assert_eq!(session.state(), &SessionState::Idle);
        assert_eq!(session.history_len(), 1);

        session.handle(SessionEvent::Ask("pending".into())).unwrap();
        session.handle(SessionEvent::Clear).unwrap();
        assert_eq!(session.history_len(), 1);
    }

    #[test]
    fn new_document_resets_everything() {
        let mut session = ChatSession::new();
        session.handle(SessionEvent::Ask("q".into())).unwrap();
        session.handle(SessionEvent::AnswerReceived(answer("a"))).unwrap();
        session.reset_for_new_document();
        assert_eq!(session.state(), &SessionState::Idle);
        assert_eq!(session.history().count(), 0);
    }
}

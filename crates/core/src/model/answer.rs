use std::collections::BTreeSet;

use chrono::{DateTime, Utc};

use crate::model::ids::{ChoiceCode, QuestionId};
use crate::model::question::QuestionKind;

/// Answer submitted by the user, keyed by the same modality as the question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmittedAnswer {
    SingleChoice(ChoiceCode),
    MultipleChoice(BTreeSet<ChoiceCode>),
    Text(String),
}

impl SubmittedAnswer {
    #[must_use]
    pub fn kind(&self) -> QuestionKind {
        match self {
            Self::SingleChoice(_) => QuestionKind::SingleChoice,
            Self::MultipleChoice(_) => QuestionKind::MultipleChoice,
            Self::Text(_) => QuestionKind::TextAnswer,
        }
    }

    /// An empty selection or whitespace-only text. Blank answers are never submitted.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        match self {
            Self::SingleChoice(_) => false,
            Self::MultipleChoice(codes) => codes.is_empty(),
            Self::Text(text) => text.trim().is_empty(),
        }
    }

    /// Whether this answer selected `code`. Always false for free text.
    #[must_use]
    pub fn selects(&self, code: &ChoiceCode) -> bool {
        match self {
            Self::SingleChoice(selected) => selected == code,
            Self::MultipleChoice(selected) => selected.contains(code),
            Self::Text(_) => false,
        }
    }
}

/// Graded answer recorded once per question per session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAnswer {
    pub question_id: QuestionId,
    pub answer: SubmittedAnswer,
    pub is_correct: bool,
    pub answered_at: DateTime<Utc>,
}

impl UserAnswer {
    #[must_use]
    pub fn new(
        question_id: QuestionId,
        answer: SubmittedAnswer,
        is_correct: bool,
        answered_at: DateTime<Utc>,
    ) -> Self {
        Self {
            question_id,
            answer,
            is_correct,
            answered_at,
        }
    }
}

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::model::ids::{ChoiceCode, QuestionId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

/// Reasons a raw question payload is rejected at ingestion.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question title cannot be empty")]
    EmptyTitle,

    #[error("unrecognized question type: {0}")]
    UnknownKind(String),

    #[error("difficulty must be between 1 and 4, got {0}")]
    InvalidDifficulty(u8),

    #[error("choice code cannot be empty")]
    EmptyChoiceCode,

    #[error("duplicate choice code: {0}")]
    DuplicateChoice(String),

    #[error("choice questions need at least 2 choices, got {count}")]
    TooFewChoices { count: usize },

    #[error("correct answer references unknown choice: {0}")]
    UnknownChoice(String),

    #[error("correct answer cannot be empty")]
    EmptyCorrectAnswer,

    #[error("correct answer shape does not match question type {kind}")]
    AnswerShapeMismatch { kind: QuestionKind },

    #[error("free-text questions cannot carry choices")]
    ChoicesOnTextAnswer,
}

//
// ─── KIND & DIFFICULTY ─────────────────────────────────────────────────────────
//

/// Answer modality of a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuestionKind {
    SingleChoice,
    MultipleChoice,
    TextAnswer,
}

impl QuestionKind {
    /// Parse the wire name used by the question source.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim() {
            "singleChoice" => Some(Self::SingleChoice),
            "multipleChoice" => Some(Self::MultipleChoice),
            "textAnswer" => Some(Self::TextAnswer),
            _ => None,
        }
    }

    /// Map the backend's numeric type code.
    ///
    /// Fill-blank, programming, design and essay questions (3..=6) are all graded
    /// as free text.
    #[must_use]
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Self::SingleChoice),
            2 => Some(Self::MultipleChoice),
            3..=6 => Some(Self::TextAnswer),
            _ => None,
        }
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::SingleChoice => "singleChoice",
            Self::MultipleChoice => "multipleChoice",
            Self::TextAnswer => "textAnswer",
        }
    }

    #[must_use]
    pub fn has_choices(self) -> bool {
        !matches!(self, Self::TextAnswer)
    }
}

impl fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Ordinal difficulty, 1 (easy) to 4 (hell).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
    Hell,
}

impl Difficulty {
    /// Converts a numeric level (1-4) to a `Difficulty`.
    #[must_use]
    pub fn from_level(level: u8) -> Option<Self> {
        match level {
            1 => Some(Self::Easy),
            2 => Some(Self::Medium),
            3 => Some(Self::Hard),
            4 => Some(Self::Hell),
            _ => None,
        }
    }

    #[must_use]
    pub fn level(self) -> u8 {
        match self {
            Self::Easy => 1,
            Self::Medium => 2,
            Self::Hard => 3,
            Self::Hell => 4,
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Easy => "Easy",
            Self::Medium => "Medium",
            Self::Hard => "Hard",
            Self::Hell => "Hell",
        }
    }
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    pub code: ChoiceCode,
    pub content: String,
}

/// Expected answer, shaped by the question kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorrectAnswer {
    Single(ChoiceCode),
    Multiple(BTreeSet<ChoiceCode>),
    Text(String),
}

impl CorrectAnswer {
    #[must_use]
    pub fn kind(&self) -> QuestionKind {
        match self {
            Self::Single(_) => QuestionKind::SingleChoice,
            Self::Multiple(_) => QuestionKind::MultipleChoice,
            Self::Text(_) => QuestionKind::TextAnswer,
        }
    }

    /// Whether `code` is part of the expected answer. Always false for free text.
    #[must_use]
    pub fn includes(&self, code: &ChoiceCode) -> bool {
        match self {
            Self::Single(expected) => expected == code,
            Self::Multiple(expected) => expected.contains(code),
            Self::Text(_) => false,
        }
    }
}

/// A validated question. Built only through [`QuestionDraft::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    id: QuestionId,
    uuid: Uuid,
    title: String,
    content: String,
    difficulty: Difficulty,
    choices: Vec<Choice>,
    correct_answer: CorrectAnswer,
    hint: Option<String>,
    source: Option<String>,
    is_official: bool,
    submit_count: u32,
    tags: BTreeSet<String>,
}

impl Question {
    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Markdown body.
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    #[must_use]
    pub fn kind(&self) -> QuestionKind {
        self.correct_answer.kind()
    }

    #[must_use]
    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    /// Ordered choices; empty for free-text questions.
    #[must_use]
    pub fn choices(&self) -> &[Choice] {
        &self.choices
    }

    #[must_use]
    pub fn correct_answer(&self) -> &CorrectAnswer {
        &self.correct_answer
    }

    #[must_use]
    pub fn hint(&self) -> Option<&str> {
        self.hint.as_deref()
    }

    #[must_use]
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    #[must_use]
    pub fn is_official(&self) -> bool {
        self.is_official
    }

    #[must_use]
    pub fn submit_count(&self) -> u32 {
        self.submit_count
    }

    #[must_use]
    pub fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }

    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    #[must_use]
    pub fn has_choice(&self, code: &ChoiceCode) -> bool {
        self.choices.iter().any(|choice| &choice.code == code)
    }

    /// Convert back into the wire shape, e.g. for persistence.
    #[must_use]
    pub fn to_draft(&self) -> QuestionDraft {
        let correct_answer = match &self.correct_answer {
            CorrectAnswer::Single(code) => AnswerDraft::One(code.to_string()),
            CorrectAnswer::Multiple(codes) => {
                AnswerDraft::Many(codes.iter().map(ToString::to_string).collect())
            }
            CorrectAnswer::Text(text) => AnswerDraft::One(text.clone()),
        };
        let choices = self
            .choices
            .iter()
            .map(|choice| ChoiceDraft {
                id: choice.code.to_string(),
                content: choice.content.clone(),
            })
            .collect::<Vec<_>>();

        QuestionDraft {
            id: self.id,
            uuid: self.uuid,
            title: self.title.clone(),
            content: self.content.clone(),
            kind: KindDraft::Name(self.kind().name().to_string()),
            difficulty: self.difficulty.level(),
            choices: (!choices.is_empty()).then_some(choices),
            correct_answer,
            hint: self.hint.clone(),
            source: self.source.clone(),
            is_official: self.is_official,
            submit_count: self.submit_count,
            tags: self.tags.iter().cloned().collect(),
        }
    }
}

//
// ─── RAW PAYLOAD ───────────────────────────────────────────────────────────────
//

/// Question type as delivered by the source: a wire name or a numeric code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KindDraft {
    Code(u8),
    Name(String),
}

impl KindDraft {
    fn resolve(&self) -> Result<QuestionKind, QuestionError> {
        match self {
            Self::Code(code) => QuestionKind::from_code(*code)
                .ok_or_else(|| QuestionError::UnknownKind(code.to_string())),
            Self::Name(name) => {
                QuestionKind::from_name(name).ok_or_else(|| QuestionError::UnknownKind(name.clone()))
            }
        }
    }
}

/// Correct answer as delivered by the source: one string or a list of codes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerDraft {
    One(String),
    Many(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceDraft {
    pub id: String,
    pub content: String,
}

/// Unvalidated question payload, in the source's camelCase wire shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionDraft {
    pub id: QuestionId,
    pub uuid: Uuid,
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(rename = "type")]
    pub kind: KindDraft,
    pub difficulty: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub choices: Option<Vec<ChoiceDraft>>,
    pub correct_answer: AnswerDraft,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default)]
    pub is_official: bool,
    #[serde(default)]
    pub submit_count: u32,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl QuestionDraft {
    fn base(id: u64, title: &str, kind: QuestionKind, correct_answer: AnswerDraft) -> Self {
        Self {
            id: QuestionId::new(id),
            uuid: Uuid::new_v4(),
            title: title.to_string(),
            content: String::new(),
            kind: KindDraft::Name(kind.name().to_string()),
            difficulty: 1,
            choices: None,
            correct_answer,
            hint: None,
            source: None,
            is_official: false,
            submit_count: 0,
            tags: Vec::new(),
        }
    }

    fn lettered(choices: &[&str]) -> Vec<ChoiceDraft> {
        choices
            .iter()
            .map(|code| ChoiceDraft {
                id: (*code).to_string(),
                content: format!("Option {code}"),
            })
            .collect()
    }

    /// Single-choice draft whose choice contents are generated from the codes.
    #[must_use]
    pub fn single_choice(id: u64, title: &str, choices: &[&str], correct: &str) -> Self {
        Self {
            choices: Some(Self::lettered(choices)),
            ..Self::base(
                id,
                title,
                QuestionKind::SingleChoice,
                AnswerDraft::One(correct.to_string()),
            )
        }
    }

    #[must_use]
    pub fn multiple_choice(id: u64, title: &str, choices: &[&str], correct: &[&str]) -> Self {
        Self {
            choices: Some(Self::lettered(choices)),
            ..Self::base(
                id,
                title,
                QuestionKind::MultipleChoice,
                AnswerDraft::Many(correct.iter().map(|c| (*c).to_string()).collect()),
            )
        }
    }

    #[must_use]
    pub fn text_answer(id: u64, title: &str, reference: &str) -> Self {
        Self::base(
            id,
            title,
            QuestionKind::TextAnswer,
            AnswerDraft::One(reference.to_string()),
        )
    }

    #[must_use]
    pub fn with_tags(mut self, tags: &[&str]) -> Self {
        self.tags = tags.iter().map(|tag| (*tag).to_string()).collect();
        self
    }

    /// Validate the payload against the question invariants.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` when the type is unrecognized, a choice question has
    /// fewer than 2 choices, the correct answer references an absent choice, or any
    /// other invariant is violated.
    pub fn validate(self) -> Result<Question, QuestionError> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(QuestionError::EmptyTitle);
        }
        let kind = self.kind.resolve()?;
        let difficulty = Difficulty::from_level(self.difficulty)
            .ok_or(QuestionError::InvalidDifficulty(self.difficulty))?;

        let mut choices: Vec<Choice> = Vec::new();
        for raw in self.choices.unwrap_or_default() {
            let code = ChoiceCode::new(raw.id).map_err(|_| QuestionError::EmptyChoiceCode)?;
            if choices.iter().any(|existing| existing.code == code) {
                return Err(QuestionError::DuplicateChoice(code.to_string()));
            }
            choices.push(Choice {
                code,
                content: raw.content,
            });
        }

        let correct_answer = if kind.has_choices() {
            if choices.len() < 2 {
                return Err(QuestionError::TooFewChoices {
                    count: choices.len(),
                });
            }
            choice_answer(kind, self.correct_answer, &choices)?
        } else {
            if !choices.is_empty() {
                return Err(QuestionError::ChoicesOnTextAnswer);
            }
            match self.correct_answer {
                AnswerDraft::One(text) if text.trim().is_empty() => {
                    return Err(QuestionError::EmptyCorrectAnswer);
                }
                AnswerDraft::One(text) => CorrectAnswer::Text(text),
                AnswerDraft::Many(_) => return Err(QuestionError::AnswerShapeMismatch { kind }),
            }
        };

        Ok(Question {
            id: self.id,
            uuid: self.uuid,
            title: title.to_string(),
            content: self.content,
            difficulty,
            choices,
            correct_answer,
            hint: normalize_optional(self.hint),
            source: normalize_optional(self.source),
            is_official: self.is_official,
            submit_count: self.submit_count,
            tags: self
                .tags
                .into_iter()
                .map(|tag| tag.trim().to_string())
                .filter(|tag| !tag.is_empty())
                .collect(),
        })
    }
}

/// Validate a raw question payload. See [`QuestionDraft::validate`].
///
/// # Errors
///
/// Returns `QuestionError` for any violated invariant.
pub fn parse_question(raw: QuestionDraft) -> Result<Question, QuestionError> {
    raw.validate()
}

fn known_code(raw: String, choices: &[Choice]) -> Result<ChoiceCode, QuestionError> {
    let code = ChoiceCode::new(raw).map_err(|_| QuestionError::EmptyCorrectAnswer)?;
    if !choices.iter().any(|choice| choice.code == code) {
        return Err(QuestionError::UnknownChoice(code.to_string()));
    }
    Ok(code)
}

fn choice_answer(
    kind: QuestionKind,
    raw: AnswerDraft,
    choices: &[Choice],
) -> Result<CorrectAnswer, QuestionError> {
    match (kind, raw) {
        (QuestionKind::SingleChoice, AnswerDraft::One(code)) => {
            Ok(CorrectAnswer::Single(known_code(code, choices)?))
        }
        (QuestionKind::MultipleChoice, AnswerDraft::One(code)) => {
            Ok(CorrectAnswer::Multiple(BTreeSet::from([known_code(code, choices)?])))
        }
        (QuestionKind::MultipleChoice, AnswerDraft::Many(codes)) => {
            if codes.is_empty() {
                return Err(QuestionError::EmptyCorrectAnswer);
            }
            let set = codes
                .into_iter()
                .map(|code| known_code(code, choices))
                .collect::<Result<BTreeSet<_>, _>>()?;
            Ok(CorrectAnswer::Multiple(set))
        }
        (kind, _) => Err(QuestionError::AnswerShapeMismatch { kind }),
    }
}

fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|val| val.trim().to_string())
        .filter(|val| !val.is_empty())
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

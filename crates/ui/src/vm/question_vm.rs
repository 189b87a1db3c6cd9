use std::collections::BTreeSet;

use quiz_core::model::{ChoiceCode, CorrectAnswer, Question, QuestionKind, SubmittedAnswer, UserAnswer};
use services::SessionProgress;

use super::markdown_vm::{inline_markdown_to_html, markdown_to_html};
use super::time_fmt::format_datetime;

//
// ─── ANSWER INPUT ──────────────────────────────────────────────────────────────
//

/// Unsubmitted answer being edited for the current question.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AnswerInput {
    Single(Option<ChoiceCode>),
    Multiple(BTreeSet<ChoiceCode>),
    Text(String),
}

impl AnswerInput {
    #[must_use]
    pub fn empty_for(kind: QuestionKind) -> Self {
        match kind {
            QuestionKind::SingleChoice => Self::Single(None),
            QuestionKind::MultipleChoice => Self::Multiple(BTreeSet::new()),
            QuestionKind::TextAnswer => Self::Text(String::new()),
        }
    }

    /// The answer to submit, or `None` when nothing has been entered.
    #[must_use]
    pub fn to_submitted(&self) -> Option<SubmittedAnswer> {
        let answer = match self {
            Self::Single(code) => SubmittedAnswer::SingleChoice(code.clone()?),
            Self::Multiple(codes) => SubmittedAnswer::MultipleChoice(codes.clone()),
            Self::Text(text) => SubmittedAnswer::Text(text.clone()),
        };
        (!answer.is_blank()).then_some(answer)
    }

    #[must_use]
    pub fn selects(&self, code: &ChoiceCode) -> bool {
        match self {
            Self::Single(selected) => selected.as_ref() == Some(code),
            Self::Multiple(selected) => selected.contains(code),
            Self::Text(_) => false,
        }
    }
}

//
// ─── CARD ──────────────────────────────────────────────────────────────────────
//

/// How a choice is drawn. Marks other than `Selected` appear only once revealed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChoiceMark {
    Neutral,
    Selected,
    Correct,
    WrongSelection,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChoiceVm {
    pub code: String,
    pub content_html: String,
    pub mark: ChoiceMark,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuestionCardVm {
    pub title: String,
    pub content_html: String,
    pub kind: QuestionKind,
    pub difficulty_label: &'static str,
    pub tags: Vec<String>,
    pub source: Option<String>,
    pub is_official: bool,
    pub choices: Vec<ChoiceVm>,
    pub text_input: Option<String>,
    pub hint_html: Option<String>,
    pub has_hint: bool,
    pub revealed: bool,
    pub is_correct: Option<bool>,
    pub reference_answer_html: Option<String>,
    pub answered_at_label: Option<String>,
    pub is_favorite: bool,
    pub is_first: bool,
    pub is_last: bool,
    pub progress_label: String,
    pub progress_percent: u8,
    pub stats_label: String,
}

/// Everything about the current question needed to draw its card.
pub(crate) struct CardContext<'a> {
    pub question: &'a Question,
    pub answer: Option<&'a UserAnswer>,
    pub input: &'a AnswerInput,
    pub show_hint: bool,
    pub is_favorite: bool,
    pub is_first: bool,
    pub is_last: bool,
    pub progress: SessionProgress,
}

fn reference_answer_markdown(question: &Question) -> String {
    match question.correct_answer() {
        CorrectAnswer::Single(code) => code.to_string(),
        CorrectAnswer::Multiple(codes) => codes
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", "),
        CorrectAnswer::Text(text) => text.clone(),
    }
}

fn choice_mark(
    code: &ChoiceCode,
    correct: &CorrectAnswer,
    answer: Option<&UserAnswer>,
    input: &AnswerInput,
) -> ChoiceMark {
    let Some(answer) = answer else {
        return if input.selects(code) {
            ChoiceMark::Selected
        } else {
            ChoiceMark::Neutral
        };
    };
    if correct.includes(code) {
        ChoiceMark::Correct
    } else if answer.answer.selects(code) {
        ChoiceMark::WrongSelection
    } else {
        ChoiceMark::Neutral
    }
}

impl QuestionCardVm {
    pub(crate) fn build(ctx: &CardContext<'_>) -> Self {
        let question = ctx.question;
        let revealed = ctx.answer.is_some();

        let choices = question
            .choices()
            .iter()
            .map(|choice| ChoiceVm {
                code: choice.code.to_string(),
                content_html: inline_markdown_to_html(&choice.content),
                mark: choice_mark(&choice.code, question.correct_answer(), ctx.answer, ctx.input),
            })
            .collect();

        let text_input = match (ctx.answer.map(|a| &a.answer), ctx.input) {
            (Some(SubmittedAnswer::Text(text)), _) => Some(text.clone()),
            (None, AnswerInput::Text(text)) => Some(text.clone()),
            _ => None,
        };

        let progress = ctx.progress;
        Self {
            title: question.title().to_string(),
            content_html: markdown_to_html(question.content()),
            kind: question.kind(),
            difficulty_label: question.difficulty().label(),
            tags: question.tags().iter().cloned().collect(),
            source: question.source().map(str::to_string),
            is_official: question.is_official(),
            choices,
            text_input,
            hint_html: question
                .hint()
                .filter(|_| ctx.show_hint)
                .map(markdown_to_html),
            has_hint: question.hint().is_some(),
            revealed,
            is_correct: ctx.answer.map(|a| a.is_correct),
            reference_answer_html: revealed
                .then(|| markdown_to_html(&reference_answer_markdown(question))),
            answered_at_label: ctx.answer.map(|a| format_datetime(a.answered_at)),
            is_favorite: ctx.is_favorite,
            is_first: ctx.is_first,
            is_last: ctx.is_last,
            progress_label: format!("{}/{}", progress.position, progress.total),
            progress_percent: progress.percent,
            stats_label: format!(
                "Answered {} · Correct {}",
                progress.answered, progress.correct
            ),
        }
    }
}

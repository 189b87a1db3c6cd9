//! Deterministic answer grading.
//!
//! Choice questions are all-or-nothing: a multiple-choice answer is correct only when
//! the selected set equals the expected set, order ignored, no partial credit.
//!
//! Free-text answers are checked with a prefix heuristic: the submission must contain
//! the first `prefix_chars` characters of the reference answer. This is observed
//! behavior, not semantic grading. Paraphrased correct answers fail and copied
//! prefixes pass.

use thiserror::Error;

use crate::model::{CorrectAnswer, Question, QuestionKind, QuizSettings, SubmittedAnswer};

/// Why an answer could not be graded. Never shown to the user; grades as incorrect.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum GradingInputError {
    #[error("no answer submitted")]
    Missing,

    #[error("{submitted} answer submitted for a {expected} question")]
    KindMismatch {
        expected: QuestionKind,
        submitted: QuestionKind,
    },
}

/// Default number of reference characters a free-text answer must contain.
pub const DEFAULT_TEXT_MATCH_PREFIX: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grader {
    prefix_chars: usize,
}

impl Default for Grader {
    fn default() -> Self {
        Self {
            prefix_chars: DEFAULT_TEXT_MATCH_PREFIX,
        }
    }
}

impl Grader {
    #[must_use]
    pub fn new(prefix_chars: usize) -> Self {
        Self {
            prefix_chars: prefix_chars.max(1),
        }
    }

    #[must_use]
    pub fn from_settings(settings: &QuizSettings) -> Self {
        Self::new(settings.text_match_prefix_chars())
    }

    #[must_use]
    pub fn prefix_chars(&self) -> usize {
        self.prefix_chars
    }

    /// Grade an answer. Missing or mismatched answers grade as incorrect.
    #[must_use]
    pub fn grade(&self, question: &Question, submitted: Option<&SubmittedAnswer>) -> bool {
        self.try_grade(question, submitted).unwrap_or(false)
    }

    /// Grade an answer, reporting why it could not be graded.
    ///
    /// # Errors
    ///
    /// Returns `GradingInputError::Missing` for `None` and
    /// `GradingInputError::KindMismatch` when the answer modality differs from the question's.
    pub fn try_grade(
        &self,
        question: &Question,
        submitted: Option<&SubmittedAnswer>,
    ) -> Result<bool, GradingInputError> {
        let submitted = submitted.ok_or(GradingInputError::Missing)?;
        match (question.correct_answer(), submitted) {
            (CorrectAnswer::Single(expected), SubmittedAnswer::SingleChoice(code)) => {
                Ok(expected == code)
            }
            (CorrectAnswer::Multiple(expected), SubmittedAnswer::MultipleChoice(codes)) => {
                Ok(expected == codes)
            }
            (CorrectAnswer::Text(reference), SubmittedAnswer::Text(text)) => {
                Ok(self.text_matches(reference, text))
            }
            (expected, submitted) => Err(GradingInputError::KindMismatch {
                expected: expected.kind(),
                submitted: submitted.kind(),
            }),
        }
    }

    fn text_matches(&self, reference: &str, text: &str) -> bool {
        if text.trim().is_empty() {
            return false;
        }
        let end = reference
            .char_indices()
            .nth(self.prefix_chars)
            .map_or(reference.len(), |(idx, _)| idx);
        text.contains(&reference[..end])
    }
}

/// Grade with the default text-match prefix.
#[must_use]
pub fn grade(question: &Question, submitted: Option<&SubmittedAnswer>) -> bool {
    Grader::default().grade(question, submitted)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::model::{ChoiceCode, QuestionDraft};

    fn code(value: &str) -> ChoiceCode {
        ChoiceCode::new(value).unwrap()
    }

    fn codes(values: &[&str]) -> SubmittedAnswer {
        SubmittedAnswer::MultipleChoice(values.iter().map(|v| code(v)).collect::<BTreeSet<_>>())
    }

    fn single() -> Question {
        QuestionDraft::single_choice(1, "Virtual DOM", &["A", "B", "C"], "B")
            .validate()
            .unwrap()
    }

    fn multiple() -> Question {
        QuestionDraft::multiple_choice(2, "Flexbox", &["A", "B", "C", "D"], &["A", "D"])
            .validate()
            .unwrap()
    }

    fn text(reference: &str) -> Question {
        QuestionDraft::text_answer(3, "Prototype chain", reference)
            .validate()
            .unwrap()
    }

    #[test]
    fn single_choice_exact_code() {
        let q = single();
        assert!(grade(&q, Some(&SubmittedAnswer::SingleChoice(code("B")))));
        assert!(!grade(&q, Some(&SubmittedAnswer::SingleChoice(code("A")))));
        assert!(!grade(&q, Some(&SubmittedAnswer::SingleChoice(code("b")))));
    }

    #[test]
    fn multiple_choice_is_order_independent() {
        let q = multiple();
        assert_eq!(grade(&q, Some(&codes(&["D", "A"]))), grade(&q, Some(&codes(&["A", "D"]))));
        assert!(grade(&q, Some(&codes(&["D", "A"]))));
    }

    #[test]
    fn multiple_choice_has_no_partial_credit() {
        let q = multiple();
        assert!(!grade(&q, Some(&codes(&["A"]))));
        assert!(!grade(&q, Some(&codes(&["A", "B", "D"]))));
        assert!(!grade(&q, Some(&codes(&[]))));
    }

    #[test]
    fn text_answer_prefix_heuristic() {
        let q = text("Prototype chain is how JavaScript objects inherit");
        let grader = Grader::default();
        assert!(grader.grade(
            &q,
            Some(&SubmittedAnswer::Text("I think: Prototype chain is it".into()))
        ));
        assert!(!grader.grade(
            &q,
            Some(&SubmittedAnswer::Text("objects inherit via prototypes".into()))
        ));
    }

    #[test]
    fn text_prefix_counts_characters_not_bytes() {
        let q = text("原型链是JavaScript实现继承的主要方法");
        let grader = Grader::new(3);
        assert!(grader.grade(&q, Some(&SubmittedAnswer::Text("答：原型链".into()))));
        assert!(!grader.grade(&q, Some(&SubmittedAnswer::Text("原型".into()))));
    }

    #[test]
    fn short_reference_uses_whole_reference() {
        let q = text("RAII");
        assert!(grade(&q, Some(&SubmittedAnswer::Text("it is RAII".into()))));
    }

    #[test]
    fn blank_text_is_incorrect() {
        let q = text("RAII");
        assert!(!grade(&q, Some(&SubmittedAnswer::Text("   ".into()))));
    }

    #[test]
    fn missing_and_mismatched_answers_grade_incorrect() {
        let q = single();
        assert!(!grade(&q, None));
        assert_eq!(Grader::default().try_grade(&q, None), Err(GradingInputError::Missing));

        let mismatched = SubmittedAnswer::Text("B".into());
        assert!(!grade(&q, Some(&mismatched)));
        assert_eq!(
            Grader::default().try_grade(&q, Some(&mismatched)),
            Err(GradingInputError::KindMismatch {
                expected: QuestionKind::SingleChoice,
                submitted: QuestionKind::TextAnswer,
            })
        );
    }

    #[test]
    fn grader_from_settings_uses_prefix() {
        let settings = QuizSettings::new(4, 80.0, 300.0, 300).unwrap();
        assert_eq!(Grader::from_settings(&settings).prefix_chars(), 4);
        assert_eq!(Grader::new(0).prefix_chars(), 1);
    }
}

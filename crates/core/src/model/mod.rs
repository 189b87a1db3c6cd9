mod answer;
mod ids;
mod question;
mod settings;

pub use answer::{SubmittedAnswer, UserAnswer};
pub use ids::{ChoiceCode, EmptyChoiceCode, ParseIdError, QuestionId};
pub use question::{
    AnswerDraft, Choice, ChoiceDraft, CorrectAnswer, Difficulty, KindDraft, Question,
    QuestionDraft, QuestionError, QuestionKind, parse_question,
};
pub use settings::{QuizSettings, SettingsError};

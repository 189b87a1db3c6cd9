mod markdown_vm;
mod question_vm;
mod quiz_vm;
mod time_fmt;

pub use markdown_vm::{html_to_markdown, inline_markdown_to_html, markdown_to_html, sanitize_html};
pub use question_vm::{AnswerInput, ChoiceMark, ChoiceVm, QuestionCardVm};
pub use quiz_vm::{QuizIntent, QuizOutcome, QuizScreen, QuizVm};
pub use time_fmt::format_datetime;

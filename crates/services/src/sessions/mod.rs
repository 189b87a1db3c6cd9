mod progress;
mod service;
mod workflow;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use progress::SessionProgress;
pub use service::{QuestionState, QuizSession, SessionSnapshot, SessionStatus, SubmitOutcome};
pub use workflow::{LOAD_FAILED_MESSAGE, QuizLoopService};

use std::sync::Arc;

use quiz_core::model::{Question, QuestionDraft, QuestionId, QuizSettings, SubmittedAnswer, UserAnswer};
use rand::seq::SliceRandom;
use storage::repository::{AnswerLogRepository, FavoriteRepository, QuestionFilter, QuestionSource};

use super::service::{QuizSession, SessionSnapshot, SessionStatus, SubmitOutcome};
use crate::Clock;
use crate::error::SessionError;

/// Message shown when the question source cannot be reached.
pub const LOAD_FAILED_MESSAGE: &str = "Failed to load questions. Please try again later.";

/// Orchestrates session bootstrap and persisted answering.
#[derive(Clone)]
pub struct QuizLoopService {
    clock: Clock,
    source: Arc<dyn QuestionSource>,
    favorites: Arc<dyn FavoriteRepository>,
    answers: Arc<dyn AnswerLogRepository>,
    shuffle: bool,
    carry_favorites: bool,
}

impl QuizLoopService {
    #[must_use]
    pub fn new(
        clock: Clock,
        source: Arc<dyn QuestionSource>,
        favorites: Arc<dyn FavoriteRepository>,
        answers: Arc<dyn AnswerLogRepository>,
    ) -> Self {
        Self {
            clock,
            source,
            favorites,
            answers,
            shuffle: false,
            carry_favorites: false,
        }
    }

    #[must_use]
    pub fn with_shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    /// Keep favorites across bootstraps instead of clearing them.
    #[must_use]
    pub fn with_carry_favorites(mut self, carry: bool) -> Self {
        self.carry_favorites = carry;
        self
    }

    /// A fresh session using this service's clock.
    #[must_use]
    pub fn new_session(&self, settings: &QuizSettings) -> QuizSession {
        QuizSession::with_settings(settings, self.clock)
    }

    /// Fetch and validate a batch. Invalid drafts are dropped and logged.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Source` when the fetch fails and
    /// `SessionError::EmptyBatch` when no question survives validation.
    pub async fn load_batch(&self, filter: &QuestionFilter) -> Result<Vec<Question>, SessionError> {
        let drafts = self
            .source
            .fetch_question_batch(filter)
            .await
            .map_err(SessionError::Source)?;

        let mut questions = validate_batch(drafts);
        if questions.is_empty() {
            return Err(SessionError::EmptyBatch);
        }
        if self.shuffle {
            questions.shuffle(&mut rand::rng());
        }
        Ok(questions)
    }

    /// Apply a load result to `session`. Failures become session states.
    pub fn seed(
        &self,
        session: &mut QuizSession,
        loaded: Result<Vec<Question>, SessionError>,
    ) -> SessionStatus {
        match loaded {
            Ok(questions) => {
                self.seed_questions(session, questions);
            }
            Err(SessionError::EmptyBatch) => {
                log::warn!("question batch is empty after validation");
                self.seed_questions(session, Vec::new());
            }
            Err(err) => {
                log::error!("failed to load questions: {err}");
                session.fail(LOAD_FAILED_MESSAGE);
            }
        }
        session.status().clone()
    }

    fn seed_questions(&self, session: &mut QuizSession, questions: Vec<Question>) {
        if self.carry_favorites {
            session.bootstrap_carrying_favorites(questions);
        } else {
            session.bootstrap(questions);
        }
    }

    /// Load a batch into a session that is owned exclusively by the caller.
    pub async fn bootstrap(&self, session: &mut QuizSession, filter: &QuestionFilter) -> SessionStatus {
        session.begin_loading();
        let loaded = self.load_batch(filter).await;
        self.seed(session, loaded)
    }

    /// Mark persisted favorites in `session`. Returns how many were added.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if favorites cannot be read.
    pub async fn restore_favorites(&self, session: &mut QuizSession) -> Result<usize, SessionError> {
        let ids = self.stored_favorites().await?;
        Ok(session.restore_favorites(&ids))
    }

    /// # Errors
    ///
    /// Returns `SessionError::Storage` if favorites cannot be read.
    pub async fn stored_favorites(&self) -> Result<Vec<QuestionId>, SessionError> {
        Ok(self.favorites.list_favorites().await?)
    }

    /// Submit to the session and append a recorded answer to the log.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if the answer cannot be logged. The
    /// session keeps the answer either way.
    pub async fn submit_current(
        &self,
        session: &mut QuizSession,
        answer: SubmittedAnswer,
    ) -> Result<SubmitOutcome, SessionError> {
        let outcome = session.submit(answer);
        if let SubmitOutcome::Recorded(recorded) = &outcome {
            self.log_answer(recorded).await?;
        }
        Ok(outcome)
    }

    /// # Errors
    ///
    /// Returns `SessionError::Storage` if the answer cannot be logged.
    pub async fn log_answer(&self, answer: &UserAnswer) -> Result<i64, SessionError> {
        Ok(self.answers.append_answer(answer).await?)
    }

    /// Write the snapshot's favorites as the stored favorite set.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if the snapshot cannot be written.
    pub async fn persist_favorites(&self, snapshot: &SessionSnapshot) -> Result<(), SessionError> {
        self.favorites.replace_favorites(&snapshot.favorites).await?;
        Ok(())
    }

    /// Answers given to `question_id` in earlier sessions, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` on read failures.
    pub async fn question_history(
        &self,
        question_id: QuestionId,
    ) -> Result<Vec<UserAnswer>, SessionError> {
        Ok(self.answers.answers_for_question(question_id).await?)
    }
}

fn validate_batch(drafts: Vec<QuestionDraft>) -> Vec<Question> {
    drafts
        .into_iter()
        .filter_map(|draft| {
            let id = draft.id;
            match draft.validate() {
                Ok(question) => Some(question),
                Err(err) => {
                    log::warn!("dropping question {id}: {err}");
                    None
                }
            }
        })
        .collect()
}

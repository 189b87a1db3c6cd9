use async_trait::async_trait;
use quiz_core::model::{Question, QuestionDraft, QuestionId, UserAnswer};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Narrows a question batch. An empty filter returns the whole bank.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuestionFilter {
    pub category_tag: Option<String>,
}

impl QuestionFilter {
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn category(tag: impl Into<String>) -> Self {
        let tag = tag.into().trim().to_string();
        Self {
            category_tag: (!tag.is_empty()).then_some(tag),
        }
    }

    #[must_use]
    pub fn matches(&self, draft: &QuestionDraft) -> bool {
        self.category_tag
            .as_ref()
            .is_none_or(|tag| draft.tags.iter().any(|t| t.trim() == tag))
    }
}

/// Provider of question batches.
///
/// Returns raw payloads; the session validates them at ingestion and drops the
/// malformed ones.
#[async_trait]
pub trait QuestionSource: Send + Sync {
    /// Fetch a finite batch of questions matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the batch cannot be fetched. No partial batch is returned.
    async fn fetch_question_batch(
        &self,
        filter: &QuestionFilter,
    ) -> Result<Vec<QuestionDraft>, StorageError>;
}

#[async_trait]
pub trait QuestionRepository: Send + Sync {
    /// Persist or update a question.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the question cannot be stored.
    async fn upsert_question(&self, question: &Question) -> Result<(), StorageError>;

    /// Number of stored questions.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on read failures.
    async fn count_questions(&self) -> Result<u64, StorageError>;
}

/// Sink for favorite snapshots taken from a session.
#[async_trait]
pub trait FavoriteRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` on read failures.
    async fn list_favorites(&self) -> Result<Vec<QuestionId>, StorageError>;

    /// Replace the stored favorites with `ids`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the snapshot cannot be written.
    async fn replace_favorites(&self, ids: &[QuestionId]) -> Result<(), StorageError>;
}

/// Per-question answer history across sessions.
#[async_trait]
pub trait AnswerLogRepository: Send + Sync {
    /// Append a graded answer and return its log id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the answer cannot be stored.
    async fn append_answer(&self, answer: &UserAnswer) -> Result<i64, StorageError>;

    /// Answers recorded for `question_id`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on read failures.
    async fn answers_for_question(
        &self,
        question_id: QuestionId,
    ) -> Result<Vec<UserAnswer>, StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    questions: Arc<Mutex<BTreeMap<QuestionId, QuestionDraft>>>,
    favorites: Arc<Mutex<Vec<QuestionId>>>,
    answers: Arc<Mutex<Vec<UserAnswer>>>,
    fail_fetch: Arc<AtomicBool>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Repository preloaded with raw drafts, including ones that would fail validation.
    #[must_use]
    pub fn with_drafts(drafts: impl IntoIterator<Item = QuestionDraft>) -> Self {
        let repo = Self::new();
        if let Ok(mut guard) = repo.questions.lock() {
            for draft in drafts {
                guard.insert(draft.id, draft);
            }
        }
        repo
    }

    /// Make subsequent batch fetches fail with a connection error.
    pub fn set_fail_fetch(&self, fail: bool) {
        self.fail_fetch.store(fail, Ordering::SeqCst);
    }
}

fn poisoned<E: std::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

#[async_trait]
impl QuestionSource for InMemoryRepository {
    async fn fetch_question_batch(
        &self,
        filter: &QuestionFilter,
    ) -> Result<Vec<QuestionDraft>, StorageError> {
        if self.fail_fetch.load(Ordering::SeqCst) {
            return Err(StorageError::Connection("question source unavailable".into()));
        }
        let guard = self.questions.lock().map_err(poisoned)?;
        Ok(guard
            .values()
            .filter(|draft| filter.matches(draft))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl QuestionRepository for InMemoryRepository {
    async fn upsert_question(&self, question: &Question) -> Result<(), StorageError> {
        let mut guard = self.questions.lock().map_err(poisoned)?;
        guard.insert(question.id(), question.to_draft());
        Ok(())
    }

    async fn count_questions(&self) -> Result<u64, StorageError> {
        let guard = self.questions.lock().map_err(poisoned)?;
        Ok(guard.len() as u64)
    }
}

#[async_trait]
impl FavoriteRepository for InMemoryRepository {
    async fn list_favorites(&self) -> Result<Vec<QuestionId>, StorageError> {
        let guard = self.favorites.lock().map_err(poisoned)?;
        Ok(guard.clone())
    }

    async fn replace_favorites(&self, ids: &[QuestionId]) -> Result<(), StorageError> {
        let mut guard = self.favorites.lock().map_err(poisoned)?;
        guard.clear();
        for id in ids {
            if !guard.contains(id) {
                guard.push(*id);
            }
        }
        Ok(())
    }
}

#[async_trait]
impl AnswerLogRepository for InMemoryRepository {
    async fn append_answer(&self, answer: &UserAnswer) -> Result<i64, StorageError> {
        let mut guard = self.answers.lock().map_err(poisoned)?;
        guard.push(answer.clone());
        i64::try_from(guard.len()).map_err(|_| StorageError::Serialization("id overflow".into()))
    }

    async fn answers_for_question(
        &self,
        question_id: QuestionId,
    ) -> Result<Vec<UserAnswer>, StorageError> {
        let guard = self.answers.lock().map_err(poisoned)?;
        Ok(guard
            .iter()
            .filter(|answer| answer.question_id == question_id)
            .cloned()
            .collect())
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub questions: Arc<dyn QuestionRepository>,
    pub source: Arc<dyn QuestionSource>,
    pub favorites: Arc<dyn FavoriteRepository>,
    pub answers: Arc<dyn AnswerLogRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        Self::from_in_memory(InMemoryRepository::new())
    }

    #[must_use]
    pub fn from_in_memory(repo: InMemoryRepository) -> Self {
        let questions: Arc<dyn QuestionRepository> = Arc::new(repo.clone());
        let source: Arc<dyn QuestionSource> = Arc::new(repo.clone());
        let favorites: Arc<dyn FavoriteRepository> = Arc::new(repo.clone());
        let answers: Arc<dyn AnswerLogRepository> = Arc::new(repo);
        Self {
            questions,
            source,
            favorites,
            answers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::{ChoiceCode, SubmittedAnswer};
    use quiz_core::time::fixed_now;

    #[tokio::test]
    async fn fetch_filters_by_category_tag() {
        let repo = InMemoryRepository::with_drafts([
            QuestionDraft::text_answer(1, "Prototype chain", "ref").with_tags(&["JavaScript"]),
            QuestionDraft::single_choice(2, "Virtual DOM", &["A", "B"], "B")
                .with_tags(&["React", "JavaScript"]),
            QuestionDraft::multiple_choice(3, "Flexbox", &["A", "B"], &["A"]).with_tags(&["CSS"]),
        ]);

        let all = repo.fetch_question_batch(&QuestionFilter::all()).await.unwrap();
        assert_eq!(all.len(), 3);

        let js = repo
            .fetch_question_batch(&QuestionFilter::category("JavaScript"))
            .await
            .unwrap();
        let ids: Vec<_> = js.iter().map(|d| d.id.value()).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[tokio::test]
    async fn fetch_can_be_forced_to_fail() {
        let repo = InMemoryRepository::new();
        repo.set_fail_fetch(true);
        let err = repo
            .fetch_question_batch(&QuestionFilter::all())
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Connection(_)));
    }

    #[tokio::test]
    async fn favorites_are_replaced_and_deduplicated() {
        let repo = InMemoryRepository::new();
        repo.replace_favorites(&[QuestionId::new(1), QuestionId::new(2), QuestionId::new(1)])
            .await
            .unwrap();
        assert_eq!(
            repo.list_favorites().await.unwrap(),
            vec![QuestionId::new(1), QuestionId::new(2)]
        );

        repo.replace_favorites(&[]).await.unwrap();
        assert!(repo.list_favorites().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn answer_log_is_per_question() {
        let repo = InMemoryRepository::new();
        let answer = UserAnswer::new(
            QuestionId::new(2),
            SubmittedAnswer::SingleChoice(ChoiceCode::new("B").unwrap()),
            true,
            fixed_now(),
        );
        repo.append_answer(&answer).await.unwrap();

        assert_eq!(
            repo.answers_for_question(QuestionId::new(2)).await.unwrap(),
            vec![answer]
        );
        assert!(repo.answers_for_question(QuestionId::new(1)).await.unwrap().is_empty());
    }

    #[test]
    fn blank_category_means_all() {
        assert_eq!(QuestionFilter::category("  "), QuestionFilter::all());
    }
}

use quiz_core::model::Question;

use super::{
    SqliteRepository,
    mapping::{id_i64, kind_to_str, map_question_row, ser},
};
use crate::repository::{QuestionFilter, QuestionRepository, QuestionSource, StorageError};

#[async_trait::async_trait]
impl QuestionRepository for SqliteRepository {
    async fn upsert_question(&self, question: &Question) -> Result<(), StorageError> {
        let draft = question.to_draft();
        let choices = draft
            .choices
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(ser)?;
        let correct_answer = serde_json::to_string(&draft.correct_answer).map_err(ser)?;
        let tags = serde_json::to_string(&draft.tags).map_err(ser)?;

        sqlx::query(
            r"
            INSERT INTO questions (
                id, uuid, title, content, kind, difficulty, choices, correct_answer,
                hint, source, is_official, submit_count, tags
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                content = excluded.content,
                kind = excluded.kind,
                difficulty = excluded.difficulty,
                choices = excluded.choices,
                correct_answer = excluded.correct_answer,
                hint = excluded.hint,
                source = excluded.source,
                is_official = excluded.is_official,
                submit_count = excluded.submit_count,
                tags = excluded.tags
            ",
        )
        .bind(id_i64("question_id", draft.id.value())?)
        .bind(draft.uuid.to_string())
        .bind(&draft.title)
        .bind(&draft.content)
        .bind(kind_to_str(&draft.kind))
        .bind(i64::from(draft.difficulty))
        .bind(choices)
        .bind(correct_answer)
        .bind(&draft.hint)
        .bind(&draft.source)
        .bind(draft.is_official)
        .bind(i64::from(draft.submit_count))
        .bind(tags)
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(())
    }

    async fn count_questions(&self) -> Result<u64, StorageError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM questions")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        u64::try_from(count).map_err(|_| StorageError::Serialization("count overflow".into()))
    }
}

#[async_trait::async_trait]
impl QuestionSource for SqliteRepository {
    async fn fetch_question_batch(
        &self,
        filter: &QuestionFilter,
    ) -> Result<Vec<quiz_core::model::QuestionDraft>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT
                    id, uuid, title, content, kind, difficulty, choices, correct_answer,
                    hint, source, is_official, submit_count, tags
                FROM questions
                ORDER BY id ASC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        // Tags live in a JSON column, so the category filter runs after decoding.
        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let draft = map_question_row(&row)?;
            if filter.matches(&draft) {
                out.push(draft);
            }
        }
        log::debug!("fetched {} questions for {filter:?}", out.len());
        Ok(out)
    }
}

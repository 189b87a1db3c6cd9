use quiz_core::model::{QuestionId, UserAnswer};

use super::{
    SqliteRepository,
    mapping::{answer_to_json, id_i64, map_answer_row},
};
use crate::repository::{AnswerLogRepository, StorageError};

#[async_trait::async_trait]
impl AnswerLogRepository for SqliteRepository {
    async fn append_answer(&self, answer: &UserAnswer) -> Result<i64, StorageError> {
        let res = sqlx::query(
            r"
                INSERT INTO answer_log (question_id, answer, is_correct, answered_at)
                VALUES (?1, ?2, ?3, ?4)
            ",
        )
        .bind(id_i64("question_id", answer.question_id.value())?)
        .bind(answer_to_json(&answer.answer)?)
        .bind(answer.is_correct)
        .bind(answer.answered_at)
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(res.last_insert_rowid())
    }

    async fn answers_for_question(
        &self,
        question_id: QuestionId,
    ) -> Result<Vec<UserAnswer>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT question_id, answer, is_correct, answered_at
                FROM answer_log
                WHERE question_id = ?1
                ORDER BY answered_at ASC, id ASC
            ",
        )
        .bind(id_i64("question_id", question_id.value())?)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_answer_row(&row)?);
        }
        Ok(out)
    }
}

use chrono::Utc;
use quiz_core::model::QuestionId;

use super::{
    SqliteRepository,
    mapping::{id_i64, question_id_from_i64},
};
use crate::repository::{FavoriteRepository, StorageError};

#[async_trait::async_trait]
impl FavoriteRepository for SqliteRepository {
    async fn list_favorites(&self) -> Result<Vec<QuestionId>, StorageError> {
        let ids: Vec<i64> = sqlx::query_scalar(
            r"
                SELECT question_id
                FROM question_favorites
                ORDER BY created_at ASC, question_id ASC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        ids.into_iter().map(question_id_from_i64).collect()
    }

    async fn replace_favorites(&self, ids: &[QuestionId]) -> Result<(), StorageError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        sqlx::query("DELETE FROM question_favorites")
            .execute(&mut *tx)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        let now = Utc::now();
        for id in ids {
            let res = sqlx::query(
                r"
                    INSERT INTO question_favorites (question_id, created_at)
                    VALUES (?1, ?2)
                    ON CONFLICT(question_id) DO NOTHING
                ",
            )
            .bind(id_i64("question_id", id.value())?)
            .bind(now)
            .execute(&mut *tx)
            .await;

            if let Err(e) = res {
                tx.rollback()
                    .await
                    .map_err(|e| StorageError::Connection(e.to_string()))?;
                // Favoriting a question that is not in the bank violates the foreign key.
                if e
                    .as_database_error()
                    .is_some_and(|db| db.is_foreign_key_violation())
                {
                    return Err(StorageError::NotFound);
                }
                return Err(StorageError::Connection(e.to_string()));
            }
        }

        tx.commit()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(())
    }
}

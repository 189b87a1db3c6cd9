use std::collections::BTreeSet;

use quiz_core::model::{
    AnswerDraft, ChoiceCode, ChoiceDraft, KindDraft, QuestionDraft, QuestionId, SubmittedAnswer,
    UserAnswer,
};
use serde::{Deserialize, Serialize};
use sqlx::Row;
use uuid::Uuid;

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

fn i64_to_u64(field: &'static str, v: i64) -> Result<u64, StorageError> {
    u64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} sign overflow")))
}

pub(crate) fn id_i64(field: &'static str, v: u64) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

pub(crate) fn question_id_from_i64(v: i64) -> Result<QuestionId, StorageError> {
    Ok(QuestionId::new(i64_to_u64("question_id", v)?))
}

/// Answer payload as stored in `answer_log.answer`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
enum StoredAnswer {
    SingleChoice(String),
    MultipleChoice(Vec<String>),
    Text(String),
}

pub(crate) fn answer_to_json(answer: &SubmittedAnswer) -> Result<String, StorageError> {
    let stored = match answer {
        SubmittedAnswer::SingleChoice(code) => StoredAnswer::SingleChoice(code.to_string()),
        SubmittedAnswer::MultipleChoice(codes) => {
            StoredAnswer::MultipleChoice(codes.iter().map(ToString::to_string).collect())
        }
        SubmittedAnswer::Text(text) => StoredAnswer::Text(text.clone()),
    };
    serde_json::to_string(&stored).map_err(ser)
}

pub(crate) fn answer_from_json(raw: &str) -> Result<SubmittedAnswer, StorageError> {
    let stored: StoredAnswer = serde_json::from_str(raw).map_err(ser)?;
    Ok(match stored {
        StoredAnswer::SingleChoice(code) => {
            SubmittedAnswer::SingleChoice(ChoiceCode::new(code).map_err(ser)?)
        }
        StoredAnswer::MultipleChoice(codes) => SubmittedAnswer::MultipleChoice(
            codes
                .into_iter()
                .map(ChoiceCode::new)
                .collect::<Result<BTreeSet<_>, _>>()
                .map_err(ser)?,
        ),
        StoredAnswer::Text(text) => SubmittedAnswer::Text(text),
    })
}

pub(crate) fn kind_to_str(kind: &KindDraft) -> String {
    match kind {
        KindDraft::Code(code) => code.to_string(),
        KindDraft::Name(name) => name.clone(),
    }
}

pub(crate) fn kind_from_str(raw: String) -> KindDraft {
    raw.parse::<u8>()
        .map_or(KindDraft::Name(raw), KindDraft::Code)
}

/// Map a `questions` row back into its raw payload; validation happens at session ingestion.
pub(crate) fn map_question_row(row: &sqlx::sqlite::SqliteRow) -> Result<QuestionDraft, StorageError> {
    let choices: Option<Vec<ChoiceDraft>> = row
        .try_get::<Option<String>, _>("choices")
        .map_err(ser)?
        .map(|raw| serde_json::from_str(&raw))
        .transpose()
        .map_err(ser)?;
    let correct_answer: AnswerDraft =
        serde_json::from_str(&row.try_get::<String, _>("correct_answer").map_err(ser)?)
            .map_err(ser)?;
    let tags: Vec<String> =
        serde_json::from_str(&row.try_get::<String, _>("tags").map_err(ser)?).map_err(ser)?;

    let difficulty_i64: i64 = row.try_get("difficulty").map_err(ser)?;
    let difficulty = u8::try_from(difficulty_i64).map_err(|_| {
        StorageError::Serialization(format!("invalid difficulty: {difficulty_i64}"))
    })?;
    let submit_count_i64: i64 = row.try_get("submit_count").map_err(ser)?;
    let submit_count = u32::try_from(submit_count_i64).map_err(|_| {
        StorageError::Serialization(format!("invalid submit_count: {submit_count_i64}"))
    })?;

    Ok(QuestionDraft {
        id: question_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?,
        uuid: Uuid::parse_str(&row.try_get::<String, _>("uuid").map_err(ser)?).map_err(ser)?,
        title: row.try_get("title").map_err(ser)?,
        content: row.try_get("content").map_err(ser)?,
        kind: kind_from_str(row.try_get("kind").map_err(ser)?),
        difficulty,
        choices,
        correct_answer,
        hint: row.try_get("hint").map_err(ser)?,
        source: row.try_get("source").map_err(ser)?,
        is_official: row.try_get("is_official").map_err(ser)?,
        submit_count,
        tags,
    })
}

pub(crate) fn map_answer_row(row: &sqlx::sqlite::SqliteRow) -> Result<UserAnswer, StorageError> {
    let raw: String = row.try_get("answer").map_err(ser)?;
    Ok(UserAnswer::new(
        question_id_from_i64(row.try_get::<i64, _>("question_id").map_err(ser)?)?,
        answer_from_json(&raw)?,
        row.try_get("is_correct").map_err(ser)?,
        row.try_get("answered_at").map_err(ser)?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stored_answer_json_is_tagged() {
        let answer = SubmittedAnswer::MultipleChoice(BTreeSet::from([
            ChoiceCode::new("D").unwrap(),
            ChoiceCode::new("A").unwrap(),
        ]));
        let json = answer_to_json(&answer).unwrap();
        assert_eq!(json, r#"{"kind":"multipleChoice","value":["A","D"]}"#);
        assert_eq!(answer_from_json(&json).unwrap(), answer);
    }

    #[test]
    fn stored_answer_rejects_empty_code() {
        let err = answer_from_json(r#"{"kind":"singleChoice","value":" "}"#).unwrap_err();
        assert!(matches!(err, StorageError::Serialization(_)));
    }

    #[test]
    fn numeric_kinds_survive_storage() {
        assert_eq!(kind_from_str("5".into()), KindDraft::Code(5));
        assert_eq!(
            kind_from_str("textAnswer".into()),
            KindDraft::Name("textAnswer".into())
        );
        assert_eq!(kind_to_str(&KindDraft::Code(2)), "2");
    }
}

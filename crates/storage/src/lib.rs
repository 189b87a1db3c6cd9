#![forbid(unsafe_code)]

pub mod repository;
pub mod sample;
pub mod sqlite;

pub use repository::{
    AnswerLogRepository, FavoriteRepository, InMemoryRepository, QuestionFilter,
    QuestionRepository, QuestionSource, Storage, StorageError,
};

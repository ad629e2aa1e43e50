use thiserror::Error;

use crate::types::{BubbleId, Category};

#[derive(Error, Debug)]
pub enum ScoreError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Scoring failed ({}): {reason}", scope_label(.category))]
    ComputationFailure {
        category: Option<Category>,
        reason:   String,
    },

    #[error("Bubble '{bubble_id}' not initialized")]
    BubbleNotInitialized { bubble_id: BubbleId },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type ScoreResult<T> = Result<T, ScoreError>;

fn scope_label(category: &Option<Category>) -> &'static str {
    category.map(|c| c.as_str()).unwrap_or("all categories")
}

use thiserror::Error;

pub type ModelResult<T> = Result<T, ModelError>;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Invalid snapshot JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Mark '{mark_type}' on node '{node_id}' has inverted range {start}..{end}")]
    InvertedMarkRange {
        node_id: String,
        mark_type: String,
        start: usize,
        end: usize,
    },
}

use thiserror::Error;

pub type RenderResult<T> = Result<T, RenderError>;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("No template registered for type '{stype}' (node '{node_id}')")]
    TemplateNotFound { stype: String, node_id: String },

    #[error("Template for type '{stype}' must produce exactly one root element")]
    InvalidTemplateRoot { stype: String },

    #[error("Invalid pattern '{name}': {source}")]
    InvalidPattern {
        name: String,
        #[source]
        source: regex::Error,
    },

    #[error("Invalid engine configuration: {0}")]
    Config(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

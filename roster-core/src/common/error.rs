use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("source read failed: {message}")]
    Read { message: String },

    #[error("validation failed for {field}: {message}")]
    Validation { field: String, message: String },

    #[error("insufficient data for {stage}: {available} usable rows, {required} required")]
    InsufficientData {
        stage: &'static str,
        available: usize,
        required: usize,
    },

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("model error: {message}")]
    Model { message: String },
}

pub type Result<T> = std::result::Result<T, PipelineError>;

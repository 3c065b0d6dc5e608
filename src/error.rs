use thiserror::Error;

#[derive(Error, Debug)]
pub enum TraceError {
    #[error("Failed to start slicer `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed coordinate on line {line}: {content:?}")]
    Parse { line: usize, content: String },

    #[error("Invalid setting {0:?}, expected key=value")]
    InvalidSetting(String),

    #[error("Trace contains no points")]
    EmptyTrace,

    #[error("Layer {0} contains no points")]
    EmptyLayer(i64),

    #[error("Invalid canvas size {width}x{height}")]
    InvalidCanvas { width: u32, height: u32 },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, TraceError>;

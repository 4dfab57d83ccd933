use thiserror::Error;

#[derive(Error, Debug)]
pub enum MdmError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Malformed response: {message}")]
    Format { message: String },

    #[error("Unsupported response version: this client understands up to version {supported}, server sent version {received}")]
    UnsupportedVersion { supported: u8, received: u8 },

    #[error("Server reported query failure (code {code}): {message}")]
    ServerFailure {
        code: i16,
        message: String,
        request: Option<String>,
    },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),
}

pub type MdmResult<T> = Result<T, MdmError>;

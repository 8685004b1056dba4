use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChainError {
    /// The request never produced an HTTP response.
    #[error("transport error: {0}")]
    Transport(String),

    #[error("node returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("node error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("invalid response: {0}")]
    Decode(String),

    /// The call succeeded but `result` was null, e.g. a block that does not
    /// exist yet.
    #[error("empty result for {0}")]
    MissingResult(String),
}

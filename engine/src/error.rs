use chainwatch_client::ChainError;
use chainwatch_store::StoreError;
use chainwatch_types::TypesError;
use thiserror::Error;

/// Coarse classification used by presentation layers to pick a status.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Conflict,
    Validation,
    Upstream,
    Aggregated,
    NotReady,
    Config,
    Store,
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("already exists: {0}")]
    Conflict(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("{context}: {source}")]
    Upstream {
        context: String,
        #[source]
        source: ChainError,
    },

    /// Every per-block failure of one concurrent scan.
    #[error("{} block scans failed: {}", .0.len(), join_errors(.0))]
    Aggregated(Vec<EngineError>),

    #[error("current block is not parsed yet")]
    NotReady,

    #[error("config error: {0}")]
    Config(String),

    #[error("store error: {0}")]
    Store(StoreError),
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::NotFound(_) => ErrorKind::NotFound,
            EngineError::Conflict(_) => ErrorKind::Conflict,
            EngineError::Validation(_) => ErrorKind::Validation,
            EngineError::Upstream { .. } => ErrorKind::Upstream,
            EngineError::Aggregated(_) => ErrorKind::Aggregated,
            EngineError::NotReady => ErrorKind::NotReady,
            EngineError::Config(_) => ErrorKind::Config,
            EngineError::Store(_) => ErrorKind::Store,
        }
    }

    pub(crate) fn upstream(context: impl Into<String>, source: ChainError) -> Self {
        EngineError::Upstream {
            context: context.into(),
            source,
        }
    }
}

fn join_errors(errors: &[EngineError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl From<ChainError> for EngineError {
    fn from(e: ChainError) -> Self {
        EngineError::upstream("chain request failed", e)
    }
}

impl From<StoreError> for EngineError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(key) => EngineError::NotFound(key),
            StoreError::Conflict(key) => EngineError::Conflict(key),
            other => EngineError::Store(other),
        }
    }
}

impl From<TypesError> for EngineError {
    fn from(e: TypesError) -> Self {
        EngineError::Validation(e.to_string())
    }
}

use crate::backing::StateId;

/// State container result type.
pub type StateResult<Ok> = Result<Ok, StateError>;

/// Error variants thrown by state container views.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("unknown service `{0}`")]
    UnknownService(String),
    #[error("unknown state id {1} in service `{0}`")]
    UnknownState(String, StateId),
    #[error("state {id} in service `{service}` is {actual}, not {requested}")]
    WrongShape {
        service: String,
        id: StateId,
        actual: &'static str,
        requested: &'static str,
    },
    /// Lazy point-in-time lookup against the backing source failed.
    #[error("backing read failed: {0}")]
    Backing(#[from] anyhow::Error),
}

use persrun_common::ActorId;
use persrun_pool::PoolError;

/// Errors from the streaming core.
///
/// Everything except [`StreamError::Pool`] is a configuration or call-order
/// error and is raised before any segment is placed.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    #[error("segment catalog is empty")]
    EmptyCatalog,
    #[error("invalid stream config: {0}")]
    InvalidConfig(String),
    #[error("start zone {zone} has no `{marker}` marker")]
    MissingStartMarker { zone: ActorId, marker: String },
    #[error("streamer must be seeded before polling")]
    NotSeeded,
    #[error("streamer was already seeded")]
    AlreadySeeded,
    #[error("pool error: {0}")]
    Pool(#[from] PoolError),
}

use persrun_kernel::HostError;

/// Errors from pool operations.
///
/// Acquiring only fails when the host cannot construct a fresh actor.
#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    #[error("actor host error: {0}")]
    Host(#[from] HostError),
}

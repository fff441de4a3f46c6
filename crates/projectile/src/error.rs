use persrun_common::TemplateId;
use persrun_pool::PoolError;

/// Errors from projectile operations.
#[derive(Debug, thiserror::Error)]
pub enum ProjectileError {
    #[error("no projectile spec registered for {0}")]
    UnknownTemplate(TemplateId),
    #[error("invalid projectile spec: {0}")]
    InvalidSpec(String),
    #[error("pool error: {0}")]
    Pool(#[from] PoolError),
}

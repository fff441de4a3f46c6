use persrun_kernel::HostError;
use persrun_pool::PoolError;
use persrun_projectile::ProjectileError;
use persrun_stream::StreamError;

/// Errors from loading or validating a session configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported config format: {0}")]
    UnsupportedFormat(String),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Errors from building or driving a session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("stream error: {0}")]
    Stream(#[from] StreamError),
    #[error("projectile error: {0}")]
    Projectile(#[from] ProjectileError),
    #[error("pool error: {0}")]
    Pool(#[from] PoolError),
    #[error("actor host error: {0}")]
    Host(#[from] HostError),
}

//! Welfare Client
//!
//! Client core for employee loans, welfare grants and dependents. Each
//! resource collection lives in an optimistic store:
//! - domain: records and provisional identities
//! - resource / resources: per-resource validation and request mapping
//! - remote: API access (HTTP adapter behind a trait)
//! - store: the optimistic create / fetch / update / delete engine
//! - context: explicit wiring of the three stores

pub mod config;
pub mod context;
pub mod domain;
pub mod envelope;
pub mod identity;
pub mod notifier;
pub mod remote;
pub mod resource;
pub mod resources;
pub mod store;
pub mod validation;

pub use config::{ClientConfig, ConfigError, GuardPolicy};
pub use context::ResourceContexts;
pub use envelope::{Envelope, Failure, TransportError};
pub use identity::{IdentitySource, Session, User};
pub use notifier::{ChannelNotifier, LogNotifier, Notifier, Toast, ToastKind, ToastOptions};
pub use remote::{HttpRemote, RemoteOperation};
pub use resource::Resource;
pub use store::{
    BlockReason, FetchOutcome, MutationOutcome, OptimisticStore, StoreSettings, StoreSnapshot,
    SubmitOutcome,
};
pub use validation::ValidationResult;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Install the rolling file logger in the configured log directory
pub fn init_logging(config: &ClientConfig) -> Result<(), rolling_logger::LoggerError> {
    rolling_logger::init_logger(config.log_dir(), &config.app_name)
}

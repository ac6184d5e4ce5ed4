//! Remote Operation - Core Trait
//!
//! Abstract interface to the API for one resource type. The HTTP adapter is
//! the real implementation; tests script their own.

use async_trait::async_trait;

use crate::envelope::{Envelope, TransportError};
use crate::resource::Resource;

/// `Ok` whenever the server answered with an envelope, even `success: false`
pub type RemoteResult<T> = Result<Envelope<T>, TransportError>;

#[async_trait]
pub trait RemoteOperation<R: Resource>: Send + Sync {
    async fn create(&self, request: &R::CreateRequest) -> RemoteResult<R::Created>;

    async fn list(&self) -> RemoteResult<Vec<R::Item>>;

    async fn update(&self, _id: &str, _patch: &R::Patch) -> RemoteResult<R::Item> {
        Err(TransportError::Unsupported("update"))
    }

    async fn delete(&self, _id: &str) -> RemoteResult<serde_json::Value> {
        Err(TransportError::Unsupported("delete"))
    }
}

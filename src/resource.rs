//! Resource Instantiation
//!
//! The store engine is generic; a `Resource` tells it how one resource type
//! validates input, what its provisional entries look like, how the create
//! request is enveloped, and how the server's answer maps back to items.
//! Updates target one record and carry their own body type.

use std::fmt::Debug;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::domain::{Entity, ProvisionalIds};
use crate::identity::User;
use crate::validation::ValidationResult;

pub trait Resource: Send + Sync + 'static {
    /// Record held in the collection
    type Item: Entity + Serialize + DeserializeOwned + Debug + 'static;
    /// Form input for create
    type Draft: Serialize + Clone + Debug + Send + Sync + 'static;
    /// Body of the update call for a single record
    type Patch: Serialize + Clone + Debug + Send + Sync + 'static;
    /// Body of the create call
    type CreateRequest: Serialize + Debug + Send + Sync + 'static;
    /// `data` of a successful create envelope
    type Created: DeserializeOwned + Send + 'static;

    /// Singular name used in logs and fallback messages
    const NAME: &'static str;
    /// Plural path segment on the API
    const PATH: &'static str;

    fn validate(draft: &Self::Draft) -> ValidationResult;

    fn validate_patch(patch: &Self::Patch) -> ValidationResult;

    /// Entries shown before the server confirms; one per item being created
    fn provisional_items(draft: &Self::Draft, owner: &User, ids: &ProvisionalIds) -> Vec<Self::Item>;

    fn create_request(draft: &Self::Draft, owner: &User, provisional: &[Self::Item]) -> Self::CreateRequest;

    /// Server-confirmed items, in the same order as the provisional batch
    fn confirmed_items(created: Self::Created) -> Vec<Self::Item>;
}

//! Remote Layer
//!
//! Access to the API, behind a trait so stores can be driven by any backend.

mod http;
mod traits;

pub use http::HttpRemote;
pub use traits::{RemoteOperation, RemoteResult};

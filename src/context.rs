//! Resource Contexts
//!
//! One store per resource type, wired explicitly to its HTTP adapter, the
//! shared notifier and the identity source. Pass this around instead of
//! looking stores up globally.

use std::sync::Arc;

use reqwest::Client;

use crate::config::ClientConfig;
use crate::identity::IdentitySource;
use crate::notifier::Notifier;
use crate::remote::HttpRemote;
use crate::resources::{Dependents, Grants, Loans};
use crate::store::{FetchOutcome, OptimisticStore, StoreSettings};
use crate::ClientError;

#[derive(Clone)]
pub struct ResourceContexts {
    pub dependents: OptimisticStore<Dependents>,
    pub grants: OptimisticStore<Grants>,
    pub loans: OptimisticStore<Loans>,
}

impl ResourceContexts {
    /// Build every store against the API described by `config`
    pub fn connect(
        config: &ClientConfig,
        identity: Arc<dyn IdentitySource>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, ClientError> {
        let base = config.base_url()?;
        let client = Client::builder().timeout(config.request_timeout()).build()?;
        let settings = StoreSettings::from(config);
        log::info!("connecting resource stores to {}", base);

        Ok(Self {
            dependents: OptimisticStore::new(
                Arc::new(HttpRemote::<Dependents>::new(client.clone(), base.clone(), identity.clone())),
                identity.clone(),
                notifier.clone(),
                settings,
            ),
            grants: OptimisticStore::new(
                Arc::new(HttpRemote::<Grants>::new(client.clone(), base.clone(), identity.clone())),
                identity.clone(),
                notifier.clone(),
                settings,
            ),
            loans: OptimisticStore::new(
                Arc::new(HttpRemote::<Loans>::new(client, base, identity.clone())),
                identity,
                notifier,
                settings,
            ),
        })
    }

    /// Load all three collections concurrently
    pub async fn refresh_all(&self) -> (FetchOutcome, FetchOutcome, FetchOutcome) {
        tokio::join!(
            self.dependents.fetch_all(),
            self.grants.fetch_all(),
            self.loans.fetch_all()
        )
    }

    /// Tear down every store, e.g. on sign out
    pub async fn dispose(&self) {
        self.dependents.dispose().await;
        self.grants.dispose().await;
        self.loans.dispose().await;
    }
}

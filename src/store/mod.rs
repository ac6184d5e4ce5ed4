//! Optimistic Resource Store
//!
//! Owns the ordered collection for one resource type. Creation is
//! optimistic: provisional entries are appended before the request goes out,
//! then promoted to the server's records on success or removed when the
//! request fails in transport. A `success: false` answer leaves them in place.
//! Updates and deletes are applied only after the server confirms.
//!
//! All state changes happen under the state lock between awaits; the lock is
//! never held while a remote call is pending, so several operations can be
//! in flight against one store. The `submitting` and `loading` flags are
//! counts of those operations, so one finishing never clears another's flag.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;

use crate::config::{ClientConfig, GuardPolicy};
use crate::domain::{is_provisional, Entity, ProvisionalIds};
use crate::envelope::Failure;
use crate::identity::IdentitySource;
use crate::notifier::{Notifier, ToastOptions, DEFAULT_TOAST_DURATION};
use crate::remote::RemoteOperation;
use crate::resource::Resource;
use crate::validation::ValidationResult;


/// Per-store behaviour picked from the client config
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreSettings {
    pub guard_policy: GuardPolicy,
    pub toast_duration: Duration,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            guard_policy: GuardPolicy::default(),
            toast_duration: DEFAULT_TOAST_DURATION,
        }
    }
}

impl From<&ClientConfig> for StoreSettings {
    fn from(config: &ClientConfig) -> Self {
        Self {
            guard_policy: config.guard_policy,
            toast_duration: config.toast_duration(),
        }
    }
}

// ========================
// Outcomes
// ========================

/// Why an operation did not start
#[derive(Debug, Clone, PartialEq)]
pub enum BlockReason {
    Invalid(ValidationResult),
    /// Another mutation is in flight and the guard policy forbids overlap
    Busy,
    Unauthenticated,
    /// The item has not been confirmed by the server yet
    Provisional,
    Disposed,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome<T> {
    /// Server-confirmed items that replaced the provisional entries
    Promoted(Vec<T>),
    /// Server declined; provisional entries were left in the collection
    Rejected { message: String },
    /// Request failed; provisional entries were removed
    RolledBack { failure: Failure },
    Blocked(BlockReason),
}

#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Loaded(usize),
    /// A load was already running
    Skipped,
    Rejected { message: String },
    Failed(Failure),
}

#[derive(Debug, Clone, PartialEq)]
pub enum MutationOutcome<T> {
    /// Updated record, or the removed one for deletes
    Applied(Option<T>),
    Rejected { message: String },
    Failed(Failure),
    Blocked(BlockReason),
}

/// Point-in-time copy of a store's state
#[derive(Debug, Clone, PartialEq)]
pub struct StoreSnapshot<T> {
    pub items: Vec<T>,
    pub submitting: bool,
    pub loading: bool,
    pub errors: ValidationResult,
}

#[derive(Debug)]
struct StoreState<T> {
    items: Vec<T>,
    /// Creates, updates and deletes awaiting the server
    mutations: usize,
    /// Fetches and creates awaiting the server
    loads: usize,
    errors: ValidationResult,
    disposed: bool,
}

impl<T> Default for StoreState<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            mutations: 0,
            loads: 0,
            errors: ValidationResult::default(),
            disposed: false,
        }
    }
}

impl<T> StoreState<T> {
    fn submitting(&self) -> bool {
        self.mutations > 0
    }

    fn loading(&self) -> bool {
        self.loads > 0
    }

    fn finish_mutation(&mut self) {
        self.mutations = self.mutations.saturating_sub(1);
    }

    fn finish_load(&mut self) {
        self.loads = self.loads.saturating_sub(1);
    }
}

type Effect<T> = Box<dyn FnOnce(&T) + Send>;

struct Inner<R: Resource> {
    state: Mutex<StoreState<R::Item>>,
    remote: Arc<dyn RemoteOperation<R>>,
    identity: Arc<dyn IdentitySource>,
    notifier: Arc<dyn Notifier>,
    ids: ProvisionalIds,
    settings: StoreSettings,
}

/// Shared handle; clones operate on the same collection
pub struct OptimisticStore<R: Resource> {
    inner: Arc<Inner<R>>,
}

impl<R: Resource> Clone for OptimisticStore<R> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<R: Resource> OptimisticStore<R> {
    pub fn new(
        remote: Arc<dyn RemoteOperation<R>>,
        identity: Arc<dyn IdentitySource>,
        notifier: Arc<dyn Notifier>,
        settings: StoreSettings,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(StoreState::default()),
                remote,
                identity,
                notifier,
                ids: ProvisionalIds::new(),
                settings,
            }),
        }
    }

    // ========================
    // Queries
    // ========================

    pub async fn snapshot(&self) -> StoreSnapshot<R::Item> {
        let state = self.inner.state.lock().await;
        StoreSnapshot {
            items: state.items.clone(),
            submitting: state.submitting(),
            loading: state.loading(),
            errors: state.errors.clone(),
        }
    }

    pub async fn items(&self) -> Vec<R::Item> {
        self.inner.state.lock().await.items.clone()
    }

    pub async fn get(&self, id: &str) -> Option<R::Item> {
        let state = self.inner.state.lock().await;
        state.items.iter().find(|item| item.id() == id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.inner.state.lock().await.items.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Entries still waiting for server confirmation
    pub async fn provisional_count(&self) -> usize {
        let state = self.inner.state.lock().await;
        state.items.iter().filter(|item| item.is_provisional()).count()
    }

    pub async fn errors(&self) -> ValidationResult {
        self.inner.state.lock().await.errors.clone()
    }

    pub async fn is_submitting(&self) -> bool {
        self.inner.state.lock().await.submitting()
    }

    pub async fn is_loading(&self) -> bool {
        self.inner.state.lock().await.loading()
    }

    pub async fn is_disposed(&self) -> bool {
        self.inner.state.lock().await.disposed
    }

    // ========================
    // Local state
    // ========================

    /// Check `draft` and keep the result for display
    pub async fn validate(&self, draft: &R::Draft) -> ValidationResult {
        let result = R::validate(draft);
        let errors = result.clone();
        self.apply(|state| state.errors = errors).await;
        result
    }

    pub async fn clear_errors(&self) {
        self.apply(|state| state.errors = ValidationResult::default()).await;
    }

    /// Tear the store down. Operations still in flight finish their remote
    /// call but no longer touch the collection or flags.
    pub async fn dispose(&self) {
        self.inner.state.lock().await.disposed = true;
        log::debug!("{} store disposed", R::NAME);
    }

    /// Run `f` on the state unless the store has been disposed
    async fn apply<F>(&self, f: F) -> bool
    where
        F: FnOnce(&mut StoreState<R::Item>),
    {
        let mut state = self.inner.state.lock().await;
        if state.disposed {
            log::debug!("ignoring write to disposed {} store", R::NAME);
            return false;
        }
        f(&mut state);
        true
    }

    /// Strict stores run one mutation at a time
    fn exclusive_busy(&self, state: &StoreState<R::Item>) -> bool {
        self.inner.settings.guard_policy == GuardPolicy::Strict && state.submitting()
    }

    fn toast(&self) -> ToastOptions {
        ToastOptions::lasting(self.inner.settings.toast_duration)
    }

    fn report(&self, failure: &Failure) {
        self.inner
            .notifier
            .failure(failure, self.inner.settings.toast_duration);
    }

    fn report_block(&self, reason: &BlockReason) {
        match reason {
            BlockReason::Invalid(result) => self.report(&Failure::Validation(result.clone())),
            BlockReason::Unauthenticated => self
                .inner
                .notifier
                .error("You must be signed in to continue", self.toast()),
            BlockReason::Provisional => self.inner.notifier.error(
                &format!("This {} is still being saved", R::NAME),
                self.toast(),
            ),
            BlockReason::Busy => log::debug!("{} submission already in flight", R::NAME),
            BlockReason::Disposed => log::debug!("{} store is disposed", R::NAME),
        }
    }

    // ========================
    // Create
    // ========================

    pub async fn submit(&self, draft: R::Draft) -> SubmitOutcome<R::Item> {
        self.run_submit(draft, None).await
    }

    /// Submit, then run `effect` with the confirmed item. The effect only
    /// runs when exactly one item was promoted.
    pub async fn submit_then<F>(&self, draft: R::Draft, effect: F) -> SubmitOutcome<R::Item>
    where
        F: FnOnce(&R::Item) + Send + 'static,
    {
        self.run_submit(draft, Some(Box::new(effect))).await
    }

    async fn run_submit(
        &self,
        draft: R::Draft,
        effect: Option<Effect<R::Item>>,
    ) -> SubmitOutcome<R::Item> {
        let validation = R::validate(&draft);
        let valid = validation.is_valid();

        let started = {
            let mut state = self.inner.state.lock().await;
            if state.disposed {
                Err(BlockReason::Disposed)
            } else {
                state.errors = validation.clone();
                if self.inner.settings.guard_policy.blocks(valid, state.submitting()) {
                    Err(if valid {
                        BlockReason::Busy
                    } else {
                        BlockReason::Invalid(validation)
                    })
                } else if let Some(owner) = self.inner.identity.current_user() {
                    let provisional = R::provisional_items(&draft, &owner, &self.inner.ids);
                    state.mutations += 1;
                    state.loads += 1;
                    state.items.extend(provisional.iter().cloned());
                    Ok((owner, provisional))
                } else {
                    Err(BlockReason::Unauthenticated)
                }
            }
        };

        let (owner, provisional) = match started {
            Ok(started) => started,
            Err(reason) => {
                self.report_block(&reason);
                return SubmitOutcome::Blocked(reason);
            }
        };

        let provisional_ids: Vec<String> =
            provisional.iter().map(|item| item.id().to_string()).collect();
        let request = R::create_request(&draft, &owner, &provisional);
        log::debug!("creating {} {}(s) {:?}", provisional.len(), R::NAME, provisional_ids);

        match self.inner.remote.create(&request).await {
            Ok(envelope) if envelope.success => {
                let message = if envelope.message.is_empty() {
                    format!("Saved {}", R::NAME)
                } else {
                    envelope.message
                };
                self.inner.notifier.success(&message, self.toast());

                let confirmed = envelope.data.map(R::confirmed_items).unwrap_or_default();
                if confirmed.len() != provisional_ids.len() {
                    log::warn!(
                        "{} create returned {} items for {} provisional",
                        R::NAME,
                        confirmed.len(),
                        provisional_ids.len()
                    );
                }
                let promoted = confirmed.clone();
                let live = self
                    .apply(|state| {
                        promote(&mut state.items, &provisional_ids, confirmed);
                        state.finish_mutation();
                        state.finish_load();
                    })
                    .await;
                log::info!("promoted {} {}(s)", promoted.len(), R::NAME);

                if let (true, Some(effect), [item]) = (live, effect, promoted.as_slice()) {
                    effect(item);
                }
                SubmitOutcome::Promoted(promoted)
            }
            Ok(envelope) => {
                let failure = Failure::rejected(envelope.message);
                self.report(&failure);
                self.apply(|state| {
                    state.finish_mutation();
                    state.finish_load();
                })
                .await;
                log::warn!("{} create rejected: {}", R::NAME, failure.message());
                SubmitOutcome::Rejected {
                    message: failure.message(),
                }
            }
            Err(err) => {
                let failure = Failure::Transport(err);
                self.report(&failure);
                self.apply(|state| {
                    rollback(&mut state.items, &provisional_ids);
                    state.finish_mutation();
                    state.finish_load();
                })
                .await;
                log::warn!("{} create failed, rolled back: {}", R::NAME, failure);
                SubmitOutcome::RolledBack { failure }
            }
        }
    }

    // ========================
    // Read
    // ========================

    /// Replace the collection with the server's list. Skipped while any load
    /// or submission holds the loading flag.
    pub async fn fetch_all(&self) -> FetchOutcome {
        {
            let mut state = self.inner.state.lock().await;
            if state.disposed || state.loading() {
                log::debug!("{} fetch skipped", R::NAME);
                return FetchOutcome::Skipped;
            }
            state.loads += 1;
        }

        match self.inner.remote.list().await {
            Ok(envelope) if envelope.success => {
                let items = dedupe(envelope.data.unwrap_or_default());
                let count = items.len();
                self.apply(|state| {
                    state.items = items;
                    state.finish_load();
                })
                .await;
                log::info!("loaded {} {}(s)", count, R::NAME);
                FetchOutcome::Loaded(count)
            }
            Ok(envelope) => {
                let failure = Failure::rejected(envelope.message);
                self.report(&failure);
                self.apply(|state| state.finish_load()).await;
                FetchOutcome::Rejected {
                    message: failure.message(),
                }
            }
            Err(err) => {
                let failure = Failure::Transport(err);
                self.report(&failure);
                self.apply(|state| state.finish_load()).await;
                log::warn!("{} fetch failed: {}", R::NAME, failure);
                FetchOutcome::Failed(failure)
            }
        }
    }

    // ========================
    // Update / Delete
    // ========================

    /// Send changes for a confirmed item; the collection changes only after
    /// the server accepts them. Under the strict policy this waits its turn
    /// like a create does.
    pub async fn update(&self, id: &str, patch: R::Patch) -> MutationOutcome<R::Item> {
        let validation = R::validate_patch(&patch);

        let started = {
            let mut state = self.inner.state.lock().await;
            if state.disposed {
                Err(BlockReason::Disposed)
            } else {
                state.errors = validation.clone();
                if !validation.is_valid() {
                    Err(BlockReason::Invalid(validation))
                } else if is_provisional(id) {
                    Err(BlockReason::Provisional)
                } else if self.exclusive_busy(&state) {
                    Err(BlockReason::Busy)
                } else {
                    state.mutations += 1;
                    Ok(())
                }
            }
        };
        if let Err(reason) = started {
            self.report_block(&reason);
            return MutationOutcome::Blocked(reason);
        }

        log::debug!("updating {} {}", R::NAME, id);
        match self.inner.remote.update(id, &patch).await {
            Ok(envelope) if envelope.success => {
                let message = if envelope.message.is_empty() {
                    format!("Updated {}", R::NAME)
                } else {
                    envelope.message
                };
                self.inner.notifier.success(&message, self.toast());
                let updated = envelope.data;
                let replacement = updated.clone();
                self.apply(|state| {
                    if let Some(item) = replacement {
                        replace(&mut state.items, id, item);
                    }
                    state.finish_mutation();
                })
                .await;
                MutationOutcome::Applied(updated)
            }
            Ok(envelope) => {
                let failure = Failure::rejected(envelope.message);
                self.report(&failure);
                self.apply(|state| state.finish_mutation()).await;
                MutationOutcome::Rejected {
                    message: failure.message(),
                }
            }
            Err(err) => {
                let failure = Failure::Transport(err);
                self.report(&failure);
                self.apply(|state| state.finish_mutation()).await;
                log::warn!("{} update failed: {}", R::NAME, failure);
                MutationOutcome::Failed(failure)
            }
        }
    }

    pub async fn delete(&self, id: &str) -> MutationOutcome<R::Item> {
        let started = {
            let mut state = self.inner.state.lock().await;
            if state.disposed {
                Err(BlockReason::Disposed)
            } else if is_provisional(id) {
                Err(BlockReason::Provisional)
            } else if self.exclusive_busy(&state) {
                Err(BlockReason::Busy)
            } else {
                state.mutations += 1;
                Ok(())
            }
        };
        if let Err(reason) = started {
            self.report_block(&reason);
            return MutationOutcome::Blocked(reason);
        }

        log::debug!("deleting {} {}", R::NAME, id);
        match self.inner.remote.delete(id).await {
            Ok(envelope) if envelope.success => {
                let message = if envelope.message.is_empty() {
                    format!("Deleted {}", R::NAME)
                } else {
                    envelope.message
                };
                self.inner.notifier.success(&message, self.toast());
                let mut removed = None;
                self.apply(|state| {
                    if let Some(pos) = state.items.iter().position(|item| item.id() == id) {
                        removed = Some(state.items.remove(pos));
                    }
                    state.finish_mutation();
                })
                .await;
                MutationOutcome::Applied(removed)
            }
            Ok(envelope) => {
                let failure = Failure::rejected(envelope.message);
                self.report(&failure);
                self.apply(|state| state.finish_mutation()).await;
                MutationOutcome::Rejected {
                    message: failure.message(),
                }
            }
            Err(err) => {
                let failure = Failure::Transport(err);
                self.report(&failure);
                self.apply(|state| state.finish_mutation()).await;
                log::warn!("{} delete failed: {}", R::NAME, failure);
                MutationOutcome::Failed(failure)
            }
        }
    }
}

// ========================
// Collection helpers
// ========================

/// Replace or append by id
fn upsert<T: Entity>(items: &mut Vec<T>, item: T) {
    match items.iter().position(|existing| existing.id() == item.id()) {
        Some(pos) => items[pos] = item,
        None => items.push(item),
    }
}

/// Swap the entry at `id` for `item`, keeping its position
fn replace<T: Entity>(items: &mut Vec<T>, id: &str, item: T) {
    let Some(pos) = items.iter().position(|existing| existing.id() == id) else {
        upsert(items, item);
        return;
    };
    let new_id = item.id().to_string();
    items[pos] = item;
    let mut index = 0;
    items.retain(|existing| {
        let keep = index == pos || existing.id() != new_id;
        index += 1;
        keep
    });
}

/// Map provisional entries to confirmed items, pairing them by position.
/// Provisional entries without a counterpart are dropped; extra confirmed
/// items are appended.
fn promote<T: Entity>(items: &mut Vec<T>, provisional: &[String], confirmed: Vec<T>) {
    let mut confirmed = confirmed.into_iter();
    for temp_id in provisional {
        let slot = items.iter().position(|item| item.id() == temp_id);
        match (slot, confirmed.next()) {
            (Some(pos), Some(server)) => {
                let existing = items
                    .iter()
                    .position(|item| item.id() == server.id())
                    .filter(|existing| *existing != pos);
                match existing {
                    // Already listed under its server id, e.g. a refresh landed first
                    Some(existing) => {
                        items[existing] = server;
                        items.remove(pos);
                    }
                    None => items[pos] = server,
                }
            }
            (Some(pos), None) => {
                items.remove(pos);
            }
            (None, Some(server)) => upsert(items, server),
            (None, None) => {}
        }
    }
    for server in confirmed {
        upsert(items, server);
    }
}

fn rollback<T: Entity>(items: &mut Vec<T>, provisional: &[String]) {
    items.retain(|item| !provisional.iter().any(|id| id == item.id()));
}

/// Keep the first occurrence of every id
fn dedupe<T: Entity>(items: Vec<T>) -> Vec<T> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.id().to_string()))
        .collect()
}

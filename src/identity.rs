//! Session / Identity
//!
//! Who is signed in, and the token the HTTP adapter attaches to requests.
//! Stores only read from it.

use std::sync::{Mutex, MutexGuard, RwLock};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl User {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            email: None,
        }
    }
}

/// Called with the new user on sign in, `None` on sign out
pub type AuthListener = Box<dyn Fn(Option<&User>) + Send + Sync>;

pub trait IdentitySource: Send + Sync {
    fn current_user(&self) -> Option<User>;

    fn auth_token(&self) -> Option<String>;

    fn on_auth_change(&self, listener: AuthListener);
}

#[derive(Debug, Default)]
struct SessionState {
    user: Option<User>,
    token: Option<String>,
}

/// In-memory identity provider
#[derive(Default)]
pub struct Session {
    state: RwLock<SessionState>,
    listeners: Mutex<Vec<AuthListener>>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("user", &self.current_user())
            .finish_non_exhaustive()
    }
}

fn listeners(mutex: &Mutex<Vec<AuthListener>>) -> MutexGuard<'_, Vec<AuthListener>> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Session that starts signed in
    pub fn signed_in(user: User, token: impl Into<String>) -> Self {
        let session = Self::new();
        session.sign_in(user, token);
        session
    }

    pub fn sign_in(&self, user: User, token: impl Into<String>) {
        {
            let mut state = self.state.write().unwrap_or_else(|poisoned| poisoned.into_inner());
            state.user = Some(user.clone());
            state.token = Some(token.into());
        }
        log::info!("signed in as {}", user.id);
        self.fire(Some(&user));
    }

    pub fn sign_out(&self) {
        {
            let mut state = self.state.write().unwrap_or_else(|poisoned| poisoned.into_inner());
            state.user = None;
            state.token = None;
        }
        log::info!("signed out");
        self.fire(None);
    }

    // Listeners must not register further listeners from inside the callback
    fn fire(&self, user: Option<&User>) {
        for listener in listeners(&self.listeners).iter() {
            listener(user);
        }
    }
}

impl IdentitySource for Session {
    fn current_user(&self) -> Option<User> {
        self.state
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .user
            .clone()
    }

    fn auth_token(&self) -> Option<String> {
        self.state
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .token
            .clone()
    }

    fn on_auth_change(&self, listener: AuthListener) {
        listeners(&self.listeners).push(listener);
    }
}

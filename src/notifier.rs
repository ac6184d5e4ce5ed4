//! User Notifications
//!
//! Sink for success/error toasts. Rendering is someone else's job; the store
//! only hands over what to say.

use std::time::Duration;

use tokio::sync::mpsc;

use crate::envelope::Failure;

/// Display time when the caller does not pick one
pub const DEFAULT_TOAST_DURATION: Duration = Duration::from_millis(5000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub kind: ToastKind,
    pub message: String,
    pub description: Option<String>,
    pub duration: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToastOptions {
    pub description: Option<String>,
    pub duration: Duration,
}

impl Default for ToastOptions {
    fn default() -> Self {
        Self {
            description: None,
            duration: DEFAULT_TOAST_DURATION,
        }
    }
}

impl ToastOptions {
    pub fn lasting(duration: Duration) -> Self {
        Self {
            description: None,
            duration,
        }
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }
}

/// Receives user-facing notifications
pub trait Notifier: Send + Sync {
    fn notify(&self, toast: Toast);

    fn success(&self, message: &str, options: ToastOptions) {
        self.notify(Toast {
            kind: ToastKind::Success,
            message: message.to_string(),
            description: options.description,
            duration: options.duration,
        });
    }

    fn error(&self, message: &str, options: ToastOptions) {
        self.notify(Toast {
            kind: ToastKind::Error,
            message: message.to_string(),
            description: options.description,
            duration: options.duration,
        });
    }

    /// Report a store failure using its message and detail
    fn failure(&self, failure: &Failure, duration: Duration) {
        self.error(
            &failure.message(),
            ToastOptions::lasting(duration).with_description(failure.detail()),
        );
    }
}

/// Writes toasts to the log instead of a screen
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, toast: Toast) {
        let description = toast.description.as_deref().unwrap_or("");
        match toast.kind {
            ToastKind::Success => log::info!("[toast] {} {}", toast.message, description),
            ToastKind::Error => log::warn!("[toast] {} {}", toast.message, description),
        }
    }
}

/// Forwards toasts over a channel to whatever renders them
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: mpsc::UnboundedSender<Toast>,
}

impl ChannelNotifier {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Toast>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, toast: Toast) {
        if self.tx.send(toast).is_err() {
            log::debug!("toast dropped, receiver closed");
        }
    }
}

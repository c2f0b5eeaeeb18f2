//! User-facing notices ("toasts"). Every failure in the client ends up as a
//! notice plus a log line; nothing is fatal.

use domains::AppError;
use tokio::sync::broadcast;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
    /// Stays on screen until dismissed (misconfigured backend rules).
    pub sticky: bool,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
            sticky: false,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
            sticky: false,
        }
    }

    /// The notice shown for `err` while doing `action` (e.g. "loading
    /// streams"). Validation messages are shown verbatim.
    pub fn from_error(action: &str, err: &AppError) -> Self {
        match err {
            AppError::Validation(msg) | AppError::Unauthorized(msg) => Notice::error(msg.clone()),
            AppError::PermissionDenied(_) => Self {
                level: NoticeLevel::Error,
                message: "The backend's security rules rejected this request. \
                          Check the document store access rules."
                    .to_string(),
                sticky: true,
            },
            AppError::NotFound(..) => Notice::error(format!("Error {action}: it no longer exists")),
            _ => Notice::error(format!("Error {action}")),
        }
    }
}

/// Fan-out of notices to whatever displays them.
#[derive(Clone)]
pub struct Notifier {
    tx: broadcast::Sender<Notice>,
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new(64)
    }
}

impl Notifier {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.tx.subscribe()
    }

    pub fn notify(&self, notice: Notice) {
        // No receivers just means nobody is displaying notices.
        let _ = self.tx.send(notice);
    }

    pub fn success(&self, message: impl Into<String>) {
        self.notify(Notice::success(message));
    }

    /// Logs `err` and surfaces it as a notice.
    pub fn report(&self, action: &str, err: &AppError) {
        match err {
            AppError::Validation(_) | AppError::Unauthorized(_) => {
                tracing::info!(action, error = %err, "request rejected")
            }
            _ => tracing::error!(action, error = %err, "operation failed"),
        }
        self.notify(Notice::from_error(action, err));
    }
}

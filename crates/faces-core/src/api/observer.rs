//! Out-of-band error reporting for the storefront client.
//!
//! Every failure already reaches the caller through the operation's `Result`.
//! Authentication failures additionally fan out to the registered observers so
//! the UI can force a re-login no matter which screen issued the request.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

/// Kinds of API errors that are broadcast to observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ApiErrorKind {
    /// A request was answered with HTTP 401.
    Unauthenticated,
}

/// Receives API error notifications.
///
/// Deciding what to do (log out, prompt for login) is up to the observer.
pub trait ApiErrorObserver: Send + Sync {
    fn api_responded_with_error(&self, kind: ApiErrorKind);
}

impl<F> ApiErrorObserver for F
where
    F: Fn(ApiErrorKind) + Send + Sync,
{
    fn api_responded_with_error(&self, kind: ApiErrorKind) {
        (self)(kind)
    }
}

/// Registered observers. Cloning shares the same list.
#[derive(Clone, Default)]
pub struct ErrorObservers {
    observers: Arc<RwLock<Vec<Arc<dyn ApiErrorObserver>>>>,
}

impl ErrorObservers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, observer: Arc<dyn ApiErrorObserver>) {
        self.observers.write().push(observer);
    }

    /// Notify every observer once.
    pub fn notify(&self, kind: ApiErrorKind) {
        // Snapshot so an observer may register another without deadlocking
        let observers: Vec<_> = self.observers.read().iter().cloned().collect();
        debug!(?kind, observers = observers.len(), "Notifying API error observers");
        for observer in observers {
            observer.api_responded_with_error(kind);
        }
    }
}

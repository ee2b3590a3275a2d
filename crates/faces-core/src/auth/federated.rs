use parking_lot::RwLock;
use serde::Serialize;

/// Identity providers accepted by `POST auth/`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FederatedProvider {
    Facebook,
}

impl FederatedProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            FederatedProvider::Facebook => "facebook",
        }
    }
}

/// Session held by a social-login SDK.
///
/// Only revocation matters here: logging out calls
/// `set_current_access_token(None)` so the provider session ends as well.
pub trait FederatedSession: Send + Sync {
    fn set_current_access_token(&self, token: Option<String>);

    fn current_access_token(&self) -> Option<String>;
}

/// Provider session kept in memory for the lifetime of the process
#[derive(Debug, Default)]
pub struct InMemoryFederatedSession {
    token: RwLock<Option<String>>,
}

impl InMemoryFederatedSession {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FederatedSession for InMemoryFederatedSession {
    fn set_current_access_token(&self, token: Option<String>) {
        *self.token.write() = token;
    }

    fn current_access_token(&self) -> Option<String> {
        self.token.read().clone()
    }
}

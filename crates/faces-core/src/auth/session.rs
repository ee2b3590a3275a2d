use std::sync::Arc;

use anyhow::{Context, Result};
use parking_lot::RwLock;
use reqwest::header::HeaderValue;
use tracing::{debug, info, warn};

use super::{CredentialStore, FederatedSession, SessionToken, TOKEN_KEY};
use crate::models::User;

#[derive(Default)]
struct SessionState {
    token: Option<SessionToken>,
    auth_header: Option<HeaderValue>,
    user: Option<User>,
    /// Bumped on every logout so late responses cannot restore the session
    generation: u64,
}

/// Single source of truth for the session token and the current user.
///
/// Logged in means a user is held, not merely a token: right after startup
/// or login the token can be present while the user is still being fetched.
pub struct SessionStore {
    credentials: Arc<dyn CredentialStore>,
    federated: Arc<dyn FederatedSession>,
    state: RwLock<SessionState>,
}

impl SessionStore {
    /// Create an empty session without reading persisted credentials
    pub fn new(credentials: Arc<dyn CredentialStore>, federated: Arc<dyn FederatedSession>) -> Self {
        Self {
            credentials,
            federated,
            state: RwLock::new(SessionState::default()),
        }
    }

    /// Create a session and restore a previously persisted token.
    ///
    /// No network call is made; the user still has to be fetched.
    pub fn initialize(
        credentials: Arc<dyn CredentialStore>,
        federated: Arc<dyn FederatedSession>,
    ) -> Self {
        let store = Self::new(credentials, federated);

        match store.credentials.get(TOKEN_KEY) {
            Ok(Some(raw)) => {
                let token = SessionToken::new(raw);
                match token.header_value() {
                    Ok(header) => {
                        let mut state = store.state.write();
                        state.token = Some(token);
                        state.auth_header = Some(header);
                        debug!("Restored persisted session token");
                    }
                    Err(e) => warn!(error = %e, "Ignoring persisted token that is not a valid header"),
                }
            }
            Ok(None) => debug!("No persisted session token"),
            Err(e) => warn!(error = %e, "Failed to read persisted session token"),
        }

        store
    }

    /// Replace the session token and persist it (`None` deletes it).
    ///
    /// The in-memory token and header change before this returns, so every
    /// request built afterwards uses the new value. A persistence error is
    /// returned after the in-memory update has already happened.
    pub fn set_token(&self, token: Option<SessionToken>) -> Result<()> {
        let header = Self::header_for(token.as_ref())?;
        let mut state = self.state.write();
        state.token = token;
        state.auth_header = header;
        self.persist(&state)
    }

    /// Install the token and user of a login that started at `generation`.
    ///
    /// Returns `Ok(false)` without touching anything when the session was
    /// logged out in the meantime. Like [`set_token`](Self::set_token), a
    /// persistence error comes back after memory has been updated.
    pub fn log_in(&self, token: SessionToken, user: User, generation: u64) -> Result<bool> {
        let header = Self::header_for(Some(&token))?;
        let mut state = self.state.write();
        if state.generation != generation {
            debug!("Session logged out during login, discarding result");
            return Ok(false);
        }
        state.token = Some(token);
        state.auth_header = header;
        state.user = Some(user);
        self.persist(&state).map(|()| true)
    }

    fn header_for(token: Option<&SessionToken>) -> Result<Option<HeaderValue>> {
        token
            .map(SessionToken::header_value)
            .transpose()
            .context("Session token contains characters not allowed in a header")
    }

    // Called under the write lock so stored order matches call order
    fn persist(&self, state: &SessionState) -> Result<()> {
        self.credentials
            .set(TOKEN_KEY, state.token.as_ref().map(SessionToken::expose))
            .context("Failed to persist session token")
    }

    /// Logout counter; pass it back to the `*_if_current` setters
    pub fn generation(&self) -> u64 {
        self.state.read().generation
    }

    pub fn token(&self) -> Option<SessionToken> {
        self.state.read().token.clone()
    }

    pub fn has_token(&self) -> bool {
        self.state.read().token.is_some()
    }

    /// `Authorization` header for the next request, if a token is set
    pub fn auth_header(&self) -> Option<HeaderValue> {
        self.state.read().auth_header.clone()
    }

    pub fn user(&self) -> Option<User> {
        self.state.read().user.clone()
    }

    pub fn user_id(&self) -> Option<i64> {
        self.state.read().user.as_ref().map(|u| u.id)
    }

    pub fn set_user(&self, user: Option<User>) {
        self.state.write().user = user;
    }

    /// Store `user` unless the session was logged out since `generation`
    pub fn set_user_if_current(&self, user: User, generation: u64) -> bool {
        let mut state = self.state.write();
        if state.generation != generation {
            debug!("Session logged out while fetching user, discarding result");
            return false;
        }
        state.user = Some(user);
        true
    }

    pub fn is_logged(&self) -> bool {
        self.state.read().user.is_some()
    }

    /// Clear token and user, and end the federated provider session.
    ///
    /// Memory is always cleared; a failure to delete the persisted token is
    /// returned afterwards.
    pub fn log_out(&self) -> Result<()> {
        info!("Logging out");
        let result = {
            let mut state = self.state.write();
            state.token = None;
            state.auth_header = None;
            state.user = None;
            state.generation = state.generation.wrapping_add(1);
            self.persist(&state)
        };
        self.federated.set_current_access_token(None);
        result
    }
}

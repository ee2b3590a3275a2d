//! Authentication module for managing the user session and credentials.
//!
//! This module provides:
//! - `SessionStore`: bearer token, derived auth header and current user
//! - `CredentialStore`: durable token persistence (OS keychain or memory)
//! - `FederatedSession`: the social-login SDK session revoked on logout
//!
//! The token is persisted under a single key, `"token"`.

pub mod credentials;
pub mod federated;
pub mod session;
pub mod token;

pub use credentials::{CredentialStore, KeyringCredentialStore, MemoryCredentialStore, TOKEN_KEY};
pub use federated::{FederatedProvider, FederatedSession, InMemoryFederatedSession};
pub use session::SessionStore;
pub use token::SessionToken;

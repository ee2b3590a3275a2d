//! Shared fixtures for the storefront integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use faces_core::auth::{
    InMemoryFederatedSession, MemoryCredentialStore, SessionStore, SessionToken, TOKEN_KEY,
};
use faces_core::{ApiErrorKind, ClientConfig, Product, StorefrontClient, User};
use rust_decimal::Decimal;
use wiremock::MockServer;

pub struct Harness {
    pub server: MockServer,
    pub client: StorefrontClient,
    pub session: Arc<SessionStore>,
    pub credentials: Arc<MemoryCredentialStore>,
    pub federated: Arc<InMemoryFederatedSession>,
    unauthenticated: Arc<AtomicUsize>,
}

impl Harness {
    /// Client against a fresh mock server, optionally with a persisted token
    pub async fn start(persisted_token: Option<&str>) -> Self {
        let server = MockServer::start().await;

        let credentials = Arc::new(match persisted_token {
            Some(token) => MemoryCredentialStore::with_entry(TOKEN_KEY, token),
            None => MemoryCredentialStore::new(),
        });
        let federated = Arc::new(InMemoryFederatedSession::new());
        let session = Arc::new(SessionStore::initialize(credentials.clone(), federated.clone()));

        let config = ClientConfig {
            base_url: format!("{}/api", server.uri()),
            timeout: Duration::from_secs(5),
            rate_limit_backoff: Duration::from_millis(5),
        };
        let client = StorefrontClient::new(config, session.clone()).expect("Failed to build client");

        let unauthenticated = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&unauthenticated);
        client.register_error_observer(Arc::new(move |kind: ApiErrorKind| {
            if kind == ApiErrorKind::Unauthenticated {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        }));

        Self {
            server,
            client,
            session,
            credentials,
            federated,
            unauthenticated,
        }
    }

    /// Logged-in session: token set and user held
    pub async fn logged_in(token: &str, user_id: i64) -> Self {
        let harness = Self::start(Some(token)).await;
        harness.session.set_user(Some(user(user_id)));
        harness
    }

    pub fn unauthenticated_notifications(&self) -> usize {
        self.unauthenticated.load(Ordering::SeqCst)
    }

    pub fn set_token(&self, token: &str) {
        self.session
            .set_token(Some(SessionToken::new(token)))
            .expect("Failed to set token");
    }

    /// Authorization headers of every request received so far
    pub async fn received_auth_headers(&self) -> Vec<Option<String>> {
        self.server
            .received_requests()
            .await
            .expect("request recording enabled")
            .iter()
            .map(|r| {
                r.headers
                    .get("authorization")
                    .map(|v| v.to_str().expect("ascii header").to_string())
            })
            .collect()
    }

    pub async fn request_count(&self) -> usize {
        self.server
            .received_requests()
            .await
            .expect("request recording enabled")
            .len()
    }
}

pub fn user(id: i64) -> User {
    User {
        id,
        name: format!("User {}", id),
        avatar: None,
        access_token: None,
    }
}

pub fn product(id: i64) -> Product {
    Product {
        id,
        name: "iPhone 4".to_string(),
        price: Decimal::from(21),
        description: "Barely used".to_string(),
        images: vec![],
    }
}

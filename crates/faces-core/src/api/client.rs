//! API client for the Faces storefront REST API.
//!
//! This module provides the `StorefrontClient` struct. Every request reads
//! the `Authorization` header from the shared [`SessionStore`] at send time,
//! so a login or logout applies to the very next request.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{header, Client, Method, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::{ApiError, ApiErrorKind, ApiErrorObserver, ErrorObservers};
use crate::auth::{FederatedProvider, SessionStore};
use crate::images::ImageDownloader;
use crate::models::{Product, User};

// ============================================================================
// Constants
// ============================================================================

/// Production API root
pub const DEFAULT_API_URL: &str = "https://faces.hern.as/api";

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Maximum number of retries for rate-limited (429) requests.
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Initial backoff delay in milliseconds for rate limiting.
const INITIAL_BACKOFF_MS: u64 = 1000;

const CURRENT_USER_PATH: &str = "users/me/";
const RECOMMENDATION_PATH: &str = "products/recommendation/";
const AUTH_PATH: &str = "auth/";

/// Connection settings handed to [`StorefrontClient::new`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
    /// First delay after a 429; doubled on every retry
    pub rate_limit_backoff: Duration,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
            rate_limit_backoff: Duration::from_millis(INITIAL_BACKOFF_MS),
        }
    }
}

/// Responses documented as "first element is X" come either as a list or
/// as a bare object.
#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> OneOrMany<T> {
    fn into_first(self) -> Option<T> {
        match self {
            OneOrMany::Many(items) => items.into_iter().next(),
            OneOrMany::One(item) => Some(item),
        }
    }
}

#[derive(Debug, Serialize)]
struct FederatedAuthRequest<'a> {
    #[serde(rename = "type")]
    provider: FederatedProvider,
    access_token: &'a str,
}

/// API client for the Faces storefront.
/// Clone is cheap - the HTTP pool, session and observer list are shared.
#[derive(Clone)]
pub struct StorefrontClient {
    client: Client,
    base_url: Arc<str>,
    rate_limit_backoff: Duration,
    session: Arc<SessionStore>,
    observers: ErrorObservers,
    images: ImageDownloader,
}

impl StorefrontClient {
    /// Create a new client bound to a session
    pub fn new(config: ClientConfig, session: Arc<SessionStore>) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            images: ImageDownloader::new(client.clone()),
            client,
            base_url: Arc::from(config.base_url.trim_end_matches('/')),
            rate_limit_backoff: config.rate_limit_backoff,
            session,
            observers: ErrorObservers::new(),
        })
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    /// Register a listener for out-of-band error notifications
    pub fn register_error_observer(&self, observer: Arc<dyn ApiErrorObserver>) {
        self.observers.register(observer);
    }

    pub fn images(&self) -> &ImageDownloader {
        &self.images
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn auth_headers(&self) -> header::HeaderMap {
        let mut headers = header::HeaderMap::new();
        if let Some(value) = self.session.auth_header() {
            headers.insert(header::AUTHORIZATION, value);
        }
        headers
    }

    /// Check if response is successful, returning an error with body if not.
    /// Returns Ok(Some(response)) for success, Ok(None) for rate limit (should retry),
    /// or Err for other errors.
    async fn check_response_for_retry(response: Response) -> Result<Option<Response>, ApiError> {
        if response.status().is_success() {
            Ok(Some(response))
        } else if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            Ok(None)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    /// Send a request, retrying on 429 and reporting 401 to the observers.
    async fn send<F>(&self, method: Method, path: &str, build: F) -> Result<Response, ApiError>
    where
        F: Fn(RequestBuilder) -> RequestBuilder,
    {
        let url = self.url(path);
        let mut retries = 0;
        let mut backoff = self.rate_limit_backoff;

        loop {
            debug!(method = %method, url = %url, "Sending request");
            let request = self
                .client
                .request(method.clone(), &url)
                .headers(self.auth_headers())
                .header(header::ACCEPT, "application/json");

            let response = build(request).send().await?;

            match Self::check_response_for_retry(response).await {
                Ok(Some(response)) => return Ok(response),
                // Also applies to POST: a 429 is answered before the request is processed
                Ok(None) => {
                    retries += 1;
                    if retries > MAX_RATE_LIMIT_RETRIES {
                        return Err(ApiError::RateLimited);
                    }
                    warn!(url = %url, retry = retries, backoff_ms = backoff.as_millis() as u64, "Rate limited, backing off");
                    tokio::time::sleep(backoff).await;
                    backoff *= 2;
                }
                Err(e) => {
                    if matches!(e, ApiError::Unauthorized) {
                        warn!(url = %url, "Request rejected as unauthenticated");
                        self.observers.notify(ApiErrorKind::Unauthenticated);
                    }
                    return Err(e);
                }
            }
        }
    }

    async fn parse_json<T: DeserializeOwned>(response: Response, path: &str) -> Result<T, ApiError> {
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| {
            ApiError::InvalidResponse(format!("Failed to parse JSON response from {}: {}", path, e))
        })
    }

    pub(crate) async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let response = self
            .send(Method::GET, path, |req| {
                if query.is_empty() {
                    req
                } else {
                    req.query(query)
                }
            })
            .await?;
        Self::parse_json(response, path).await
    }

    pub(crate) async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let response = self.post_raw(path, body).await?;
        Self::parse_json(response, path).await
    }

    /// POST whose response body is not interpreted
    pub(crate) async fn post_raw<B: Serialize>(&self, path: &str, body: &B) -> Result<Response, ApiError> {
        self.send(Method::POST, path, |req| req.json(body)).await
    }

    fn first<T>(envelope: OneOrMany<T>, path: &str) -> Result<T, ApiError> {
        envelope
            .into_first()
            .ok_or_else(|| ApiError::InvalidResponse(format!("Empty response from {}", path)))
    }

    // ===== Session =====

    /// Fetch the user the session token belongs to and store it in the session.
    ///
    /// Fails without touching the network when no token is set. Any failure
    /// clears the session's user. A response that arrives after a logout is
    /// dropped with [`ApiError::LoggedOut`].
    pub async fn fetch_current_user(&self) -> Result<User, ApiError> {
        if !self.session.has_token() {
            debug!("No session token, not fetching current user");
            return Err(ApiError::MissingToken);
        }

        let generation = self.session.generation();
        let result = self
            .get::<OneOrMany<User>>(CURRENT_USER_PATH, &[])
            .await
            .and_then(|envelope| Self::first(envelope, CURRENT_USER_PATH));

        match result {
            Ok(mut user) => {
                user.access_token = None;
                if !self.session.set_user_if_current(user.clone(), generation) {
                    return Err(ApiError::LoggedOut);
                }
                info!(user_id = user.id, "Fetched current user");
                Ok(user)
            }
            Err(e) => {
                self.session.set_user(None);
                Err(e)
            }
        }
    }

    /// Exchange a social-login token for a session token.
    ///
    /// The session token returned inside the user is moved into the session
    /// store before the user is handed out. A token that cannot be sent as a
    /// header fails the login; failing to persist it only costs durability.
    pub async fn authenticate_with_federated_token(
        &self,
        provider: FederatedProvider,
        token: &str,
    ) -> Result<User, ApiError> {
        let body = FederatedAuthRequest {
            provider,
            access_token: token,
        };
        let generation = self.session.generation();
        let envelope: OneOrMany<User> = self.post(AUTH_PATH, &body).await?;
        let mut user = Self::first(envelope, AUTH_PATH)?;

        let session_token = user.take_access_token().ok_or_else(|| {
            ApiError::InvalidResponse("Auth response carried no session token".to_string())
        })?;
        if let Err(e) = session_token.header_value() {
            return Err(ApiError::InvalidResponse(format!(
                "Auth response carried an unusable session token: {}",
                e
            )));
        }

        match self.session.log_in(session_token, user.clone(), generation) {
            Ok(true) => {}
            Ok(false) => return Err(ApiError::LoggedOut),
            Err(e) => warn!(error = %e, "Session token could not be persisted, login lasts until exit"),
        }
        info!(user_id = user.id, provider = provider.as_str(), "Authenticated");

        Ok(user)
    }

    /// End the session and drop cached images
    pub fn log_out(&self) -> anyhow::Result<()> {
        self.images.cache().clear();
        self.session.log_out()
    }

    // ===== Products =====

    /// Fetch the product recommended for a user
    pub async fn fetch_recommended_product(&self, user_id: i64) -> Result<Product, ApiError> {
        let envelope: OneOrMany<Product> = self
            .get(RECOMMENDATION_PATH, &[("user_id", user_id.to_string())])
            .await?;
        let product = Self::first(envelope, RECOMMENDATION_PATH)?;
        debug!(product_id = product.id, images = product.images.len(), "Recommendation received");
        Ok(product)
    }

    /// Fetch the recommendation for the user held by the session
    pub async fn fetch_recommendation_for_current_user(&self) -> Result<Product, ApiError> {
        let user_id = self.session.user_id().ok_or(ApiError::NotLoggedIn)?;
        self.fetch_recommended_product(user_id).await
    }

    /// Start downloading every product image in the background.
    ///
    /// `on_complete` fires once, after all downloads have finished whether
    /// they succeeded or not. Must be called from within a Tokio runtime.
    pub fn prefetch_images<C>(&self, product: &Product, on_complete: C) -> JoinHandle<()>
    where
        C: FnOnce() + Send + 'static,
    {
        self.images.prefetch(&product.images, on_complete)
    }
}

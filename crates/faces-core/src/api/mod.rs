//! REST API client module for the Faces storefront.
//!
//! This module provides the `StorefrontClient` for the user, recommendation,
//! federated login and order endpoints, plus the observer contract used to
//! report authentication failures to the UI.
//!
//! The API uses `JWT <token>` authorization headers; the token is owned by
//! the [`SessionStore`](crate::auth::SessionStore) and read on every request.

pub mod client;
pub mod error;
pub mod observer;
mod orders;

pub use client::{ClientConfig, StorefrontClient};
pub use error::ApiError;
pub use observer::{ApiErrorKind, ApiErrorObserver, ErrorObservers};

//! Core library for the Faces storefront.
//!
//! This crate holds everything a frontend needs to talk to the Faces API:
//!
//! - [`auth`]: the session store (bearer token, current user, credential persistence)
//! - [`api`]: the storefront client (user, recommendation, federated login, orders)
//! - [`models`]: API data types
//! - [`images`]: concurrent product image download with a single completion callback
//! - [`payment`]: the request handed to the external payment sheet
//! - [`config`]: on-disk configuration

pub mod api;
pub mod auth;
pub mod config;
pub mod images;
pub mod models;
pub mod payment;
pub mod utils;

pub use api::{ApiError, ApiErrorKind, ApiErrorObserver, ClientConfig, StorefrontClient};
pub use auth::{
    CredentialStore, FederatedSession, InMemoryFederatedSession, KeyringCredentialStore,
    MemoryCredentialStore, SessionStore, SessionToken,
};
pub use config::Config;
pub use models::{ImageRef, OrderReceipt, Product, User};

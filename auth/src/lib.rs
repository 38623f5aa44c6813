//! Authentication core for the storefront.
//!
//! This crate owns user accounts, password credentials and the two-factor
//! challenge flow consumed by the storefront API. State lives behind store
//! traits with in-memory implementations; nothing is persisted across
//! restarts.

pub mod challenge;
pub mod config;
pub mod credential;
pub mod errors;
pub mod jwt;
pub mod seed;
pub mod service;
pub mod store;
pub mod sweeper;
pub mod types;

pub use challenge::*;
pub use config::*;
pub use credential::{Credential, hash_credential, verify_credential};
pub use errors::*;
pub use jwt::*;
pub use service::AuthService;
pub use store::*;
pub use sweeper::spawn_challenge_sweeper;
pub use types::*;

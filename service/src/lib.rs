//! Async runtime layer for the users API.
//!
//! `userlist-core` builds requests and parses responses without touching the
//! network. This crate executes them: a [`Transport`] sends an
//! [`HttpRequest`](userlist_core::HttpRequest), [`UserService`] pairs the core
//! client with a transport, and [`UserStore`] keeps the accumulated list
//! behind a single-writer actor.
//!
//! ```no_run
//! # async fn demo() -> Result<(), userlist_service::ConfigError> {
//! use userlist_service::{Config, UserService, UserStore};
//!
//! let config = Config::load(std::path::Path::new("userlist.toml"))?;
//! let store = UserStore::spawn(UserService::from_config(&config)?);
//! store.bootstrap().await;
//! println!("{} users", store.snapshot().users.len());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod service;
pub mod store;
pub mod transport;

#[cfg(test)]
mod testing;

pub use config::{Config, RetryConfig};
pub use error::{ConfigError, TransportError};
pub use service::{DefaultTransport, UserService};
pub use store::UserStore;
pub use transport::{ReqwestTransport, Retrying, Transport};

//! Synchronous API client core for the users service.
//!
//! # Overview
//! Builds `HttpRequest` values and parses `HttpResponse` values without
//! touching the network (host-does-IO pattern), and owns the pure list
//! reducer that turns request outcomes into UI state.
//!
//! # Design
//! - `UserClient` is stateless; it holds only the base URL and bearer token.
//! - Each operation is split into `build_*` and `parse_*`, so the I/O
//!   boundary is explicit.
//! - Every failure is normalized into `ApiError` before it leaves the crate.
//! - `RetryPolicy` computes backoff; the caller decides what is retryable.
//! - `state::reduce` is a pure `(ListState, ListEvent) -> ListState`.

pub mod client;
pub mod error;
pub mod http;
pub mod retry;
pub mod state;
pub mod types;

pub use client::UserClient;
pub use error::{ApiError, CreateUserError};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use retry::RetryPolicy;
pub use state::{reduce, ListEvent, ListState, LoadStatus, Placement};
pub use types::{CreateUser, FieldError, User, UserPage, ValidationErrors};

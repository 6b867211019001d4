//! Domain DTOs for the users API.
//!
//! # Design
//! These mirror the server's JSON but are defined independently of the
//! mock-server crate; the integration tests catch schema drift.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A user as returned by the API. `id` is assigned by the server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub gender: String,
    pub status: String,
}

/// Request payload for creating a user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreateUser {
    pub name: String,
    pub email: String,
    pub gender: String,
    pub status: String,
}

/// One page of users plus the pagination metadata read from the response
/// headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserPage {
    pub users: Vec<User>,
    pub total_pages: u32,
    pub current_page: u32,
}

/// One element of a 422 response body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Field name to validation message, as shown next to each form input.
pub type ValidationErrors = BTreeMap<String, String>;

//! Stateless HTTP request builder and response parser for the users API.
//!
//! # Design
//! `UserClient` holds the base URL and the bearer token and carries no
//! mutable state between calls. Each operation is split into a `build_*`
//! method that produces an `HttpRequest` and a `parse_*` method that consumes
//! an `HttpResponse`. The caller executes the round-trip in between.

use serde::de::DeserializeOwned;

use crate::error::{ApiError, CreateUserError};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{CreateUser, FieldError, User, UserPage, ValidationErrors};

const USERS_PATH: &str = "/public/v2/users";

pub const PAGE_HEADER: &str = "X-Pagination-Page";
pub const PAGES_HEADER: &str = "X-Pagination-Pages";

/// Key used when a failed create's body is not a list of field errors.
pub const GENERAL_ERROR_FIELD: &str = "general";
const GENERAL_ERROR_MESSAGE: &str = "Unexpected error occurred";

/// Synchronous, stateless client for the users API.
#[derive(Debug, Clone)]
pub struct UserClient {
    base_url: String,
    token: String,
}

impl UserClient {
    pub fn new(base_url: &str, token: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn build_list_users(&self, page: u32) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            path: format!("{}{USERS_PATH}?page={page}", self.base_url),
            headers: self.auth_headers(),
            body: None,
        }
    }

    pub fn build_create_user(&self, input: &CreateUser) -> Result<HttpRequest, ApiError> {
        let body = serde_json::to_string(input).map_err(|e| {
            tracing::warn!(error = %e, "failed to serialize create payload");
            ApiError::Unknown
        })?;
        let mut headers = self.auth_headers();
        headers.push(("content-type".to_string(), "application/json".to_string()));
        Ok(HttpRequest {
            method: HttpMethod::Post,
            path: format!("{}{USERS_PATH}", self.base_url),
            headers,
            body: Some(body),
        })
    }

    pub fn build_delete_user(&self, id: i64) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Delete,
            path: format!("{}{USERS_PATH}/{id}", self.base_url),
            headers: self.auth_headers(),
            body: None,
        }
    }

    /// Parse one page of users. Pagination headers that are missing or not
    /// a positive integer read as 1.
    pub fn parse_list_users(&self, response: HttpResponse) -> Result<UserPage, ApiError> {
        check_status(&response)?;
        let total_pages = pagination_header(&response, PAGES_HEADER);
        let current_page = pagination_header(&response, PAGE_HEADER);
        let users: Vec<User> = decode_body(&response.body)?;
        Ok(UserPage {
            users,
            total_pages,
            current_page,
        })
    }

    pub fn parse_create_user(&self, response: HttpResponse) -> Result<User, CreateUserError> {
        if !response.is_success() {
            return Err(CreateUserError {
                kind: ApiError::from_status(response.status),
                validation: parse_validation_errors(&response.body),
            });
        }
        decode_body(&response.body).map_err(CreateUserError::from)
    }

    /// `Ok(true)` when the server accepted the delete.
    pub fn parse_delete_user(&self, response: HttpResponse) -> Result<bool, ApiError> {
        check_status(&response)?;
        Ok(true)
    }

    fn auth_headers(&self) -> Vec<(String, String)> {
        vec![
            ("authorization".to_string(), format!("Bearer {}", self.token)),
            ("accept".to_string(), "application/json".to_string()),
        ]
    }
}

fn check_status(response: &HttpResponse) -> Result<(), ApiError> {
    if response.is_success() {
        Ok(())
    } else {
        Err(ApiError::from_status(response.status))
    }
}

fn decode_body<T: DeserializeOwned>(body: &str) -> Result<T, ApiError> {
    if body.trim().is_empty() {
        tracing::debug!("response body is empty");
        return Err(ApiError::Unknown);
    }
    serde_json::from_str(body).map_err(|e| {
        tracing::warn!(error = %e, "failed to decode response body");
        ApiError::Unknown
    })
}

fn pagination_header(response: &HttpResponse, name: &str) -> u32 {
    response
        .header(name)
        .and_then(|value| value.trim().parse::<u32>().ok())
        .filter(|n| *n >= 1)
        .unwrap_or(1)
}

/// Turn a 422 body into a field → message map. Later entries for the same
/// field overwrite earlier ones.
pub fn parse_validation_errors(body: &str) -> ValidationErrors {
    match serde_json::from_str::<Vec<FieldError>>(body) {
        Ok(errors) => errors
            .into_iter()
            .map(|FieldError { field, message }| (field, message))
            .collect(),
        Err(_) => ValidationErrors::from([(
            GENERAL_ERROR_FIELD.to_string(),
            GENERAL_ERROR_MESSAGE.to_string(),
        )]),
    }
}

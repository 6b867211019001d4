//! Error taxonomy for the users API client.
//!
//! # Design
//! Every failure, whether an HTTP status, a transport error, or an
//! undecodable body, is folded into the closed `ApiError` set before it
//! reaches the list state. Validation failures on create travel separately
//! as a field → message map inside `CreateUserError`.

use thiserror::Error;

use crate::types::ValidationErrors;

/// Closed set of failure kinds surfaced to the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum ApiError {
    #[error("bad request")]
    BadRequest,

    #[error("unauthorized")]
    Unauthorized,

    #[error("forbidden")]
    Forbidden,

    #[error("resource not found")]
    NotFound,

    #[error("request timed out")]
    Timeout,

    #[error("payload too large")]
    PayloadTooLarge,

    #[error("too many requests")]
    RateLimited,

    #[error("server error")]
    ServerError,

    /// Any other status, a transport failure, or a body that could not be
    /// decoded.
    #[error("unknown error")]
    Unknown,
}

impl ApiError {
    /// Map a non-success HTTP status to its error kind.
    pub fn from_status(status: u16) -> Self {
        match status {
            400 => ApiError::BadRequest,
            401 => ApiError::Unauthorized,
            403 => ApiError::Forbidden,
            404 => ApiError::NotFound,
            408 => ApiError::Timeout,
            413 => ApiError::PayloadTooLarge,
            429 => ApiError::RateLimited,
            500 => ApiError::ServerError,
            _ => ApiError::Unknown,
        }
    }
}

/// A failed create: the error kind plus whatever field errors the server
/// reported.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}")]
pub struct CreateUserError {
    pub kind: ApiError,
    pub validation: ValidationErrors,
}

impl CreateUserError {
    /// A failure that carries no field-level detail, e.g. a transport error.
    pub fn without_fields(kind: ApiError) -> Self {
        Self {
            kind,
            validation: ValidationErrors::new(),
        }
    }
}

impl From<ApiError> for CreateUserError {
    fn from(kind: ApiError) -> Self {
        Self::without_fields(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_statuses_map_to_their_kind() {
        let cases = [
            (400, ApiError::BadRequest),
            (401, ApiError::Unauthorized),
            (403, ApiError::Forbidden),
            (404, ApiError::NotFound),
            (408, ApiError::Timeout),
            (413, ApiError::PayloadTooLarge),
            (429, ApiError::RateLimited),
            (500, ApiError::ServerError),
        ];
        for (status, kind) in cases {
            assert_eq!(ApiError::from_status(status), kind, "status {status}");
        }
    }

    #[test]
    fn unlisted_statuses_are_unknown() {
        for status in [302, 405, 422, 502, 503] {
            assert_eq!(ApiError::from_status(status), ApiError::Unknown);
        }
    }

    #[test]
    fn create_error_displays_its_kind() {
        let err = CreateUserError::without_fields(ApiError::RateLimited);
        assert_eq!(err.to_string(), "too many requests");
        assert!(err.validation.is_empty());
    }
}

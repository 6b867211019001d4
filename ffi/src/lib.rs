//! C-ABI wrapper around `userlist-core`.
//!
//! # Overview
//! Exposes the users API through `extern "C"` functions so a host with its
//! own networking stack can build requests and parse responses without
//! linking to Rust's async runtime or serde directly.
//!
//! # Design
//! - Every `extern "C"` function wraps its body in `catch_unwind` so panics
//!   never cross the FFI boundary.
//! - Per-operation `build_*` / `parse_*` mirrors the core API 1:1.
//! - A single `FfiUserResult` envelope with `FfiDataTag` + `void* data`
//!   conveys success payloads, validation messages and errors uniformly.
//! - The C caller owns all returned pointers and must call the matching
//!   `userlist_free_*` function to release them.
//! - The list state itself stays on the host side; `userlist_retry_delay_ms`
//!   exposes the backoff schedule so the host can retry the same way the
//!   async service does.

pub mod types;

use std::os::raw::c_char;
use std::panic::catch_unwind;
use std::time::Duration;

use userlist_core::{CreateUser, RetryPolicy, UserClient};

use types::*;

// ---------------------------------------------------------------------------
// Client lifecycle
// ---------------------------------------------------------------------------

/// Create a new `UserClient` bound to `base_url` that authenticates with
/// the bearer `token`.
///
/// Returns null if either argument is null or if an internal panic occurs.
/// The caller must free the returned pointer with `userlist_client_free`.
#[unsafe(no_mangle)]
pub extern "C" fn userlist_client_new(
    base_url: *const c_char,
    token: *const c_char,
) -> *mut FfiUserClient {
    catch_unwind(|| {
        if base_url.is_null() || token.is_null() {
            return std::ptr::null_mut();
        }
        let (url, token) = unsafe { (borrow_str(base_url), borrow_str(token)) };
        let client = UserClient::new(url, token);
        Box::into_raw(Box::new(FfiUserClient { inner: client }))
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Free a client created by `userlist_client_new`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn userlist_client_free(client: *mut FfiUserClient) {
    if !client.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { Box::from_raw(client) });
        });
    }
}

// ---------------------------------------------------------------------------
// Build request functions
// ---------------------------------------------------------------------------

/// Build an HTTP request for one page of users. Pages are 1-based.
///
/// Returns null if `client` is null or `page` is 0.
/// The caller must free the returned pointer with `userlist_free_request`.
#[unsafe(no_mangle)]
pub extern "C" fn userlist_build_list_users(
    client: *const FfiUserClient,
    page: u32,
) -> *mut FfiHttpRequest {
    catch_unwind(|| {
        if client.is_null() || page == 0 {
            return std::ptr::null_mut();
        }
        let client = unsafe { &*client };
        FfiHttpRequest::from_core(client.inner.build_list_users(page))
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Build an HTTP request for creating a user.
///
/// Returns null if any argument is null or if serialization fails.
#[unsafe(no_mangle)]
pub extern "C" fn userlist_build_create_user(
    client: *const FfiUserClient,
    name: *const c_char,
    email: *const c_char,
    gender: *const c_char,
    status: *const c_char,
) -> *mut FfiHttpRequest {
    catch_unwind(|| {
        if client.is_null() || name.is_null() || email.is_null() || gender.is_null() || status.is_null()
        {
            return std::ptr::null_mut();
        }
        let client = unsafe { &*client };
        let input = unsafe {
            CreateUser {
                name: borrow_str(name).to_string(),
                email: borrow_str(email).to_string(),
                gender: borrow_str(gender).to_string(),
                status: borrow_str(status).to_string(),
            }
        };
        match client.inner.build_create_user(&input) {
            Ok(req) => FfiHttpRequest::from_core(req),
            Err(_) => std::ptr::null_mut(),
        }
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Build an HTTP request for deleting a user by id.
///
/// Returns null if `client` is null.
#[unsafe(no_mangle)]
pub extern "C" fn userlist_build_delete_user(
    client: *const FfiUserClient,
    id: i64,
) -> *mut FfiHttpRequest {
    catch_unwind(|| {
        if client.is_null() {
            return std::ptr::null_mut();
        }
        let client = unsafe { &*client };
        FfiHttpRequest::from_core(client.inner.build_delete_user(id))
    })
    .unwrap_or(std::ptr::null_mut())
}

// ---------------------------------------------------------------------------
// Parse response functions
// ---------------------------------------------------------------------------

/// Parse the response to a list request.
///
/// Returns a result with `data_tag = Page` on success. Missing or invalid
/// pagination headers read as 1.
#[unsafe(no_mangle)]
pub extern "C" fn userlist_parse_list_users(
    client: *const FfiUserClient,
    response: *const FfiHttpResponse,
) -> *mut FfiUserResult {
    catch_unwind(|| {
        if client.is_null() {
            return FfiUserResult::null_arg("client");
        }
        if response.is_null() {
            return FfiUserResult::null_arg("response");
        }
        let client = unsafe { &*client };
        let resp = unsafe { (*response).to_core() };
        let status = resp.status;
        match client.inner.parse_list_users(resp) {
            Ok(page) => FfiUserResult::ok_page(page, status),
            Err(e) => FfiUserResult::from_error(e, status),
        }
    })
    .unwrap_or_else(|_| FfiUserResult::panic("panic in userlist_parse_list_users"))
}

/// Parse the response to a create request.
///
/// Returns a result with `data_tag = User` on success. A rejected create
/// carries `data_tag = Validation` when the server named offending fields.
#[unsafe(no_mangle)]
pub extern "C" fn userlist_parse_create_user(
    client: *const FfiUserClient,
    response: *const FfiHttpResponse,
) -> *mut FfiUserResult {
    catch_unwind(|| {
        if client.is_null() {
            return FfiUserResult::null_arg("client");
        }
        if response.is_null() {
            return FfiUserResult::null_arg("response");
        }
        let client = unsafe { &*client };
        let resp = unsafe { (*response).to_core() };
        let status = resp.status;
        match client.inner.parse_create_user(resp) {
            Ok(user) => FfiUserResult::ok_user(user, status),
            Err(e) => FfiUserResult::from_create_error(e, status),
        }
    })
    .unwrap_or_else(|_| FfiUserResult::panic("panic in userlist_parse_create_user"))
}

/// Parse the response to a delete request.
///
/// Returns a result with `data_tag = None` on any 2xx status.
#[unsafe(no_mangle)]
pub extern "C" fn userlist_parse_delete_user(
    client: *const FfiUserClient,
    response: *const FfiHttpResponse,
) -> *mut FfiUserResult {
    catch_unwind(|| {
        if client.is_null() {
            return FfiUserResult::null_arg("client");
        }
        if response.is_null() {
            return FfiUserResult::null_arg("response");
        }
        let client = unsafe { &*client };
        let resp = unsafe { (*response).to_core() };
        let status = resp.status;
        match client.inner.parse_delete_user(resp) {
            Ok(true) => FfiUserResult::ok_empty(status),
            Ok(false) => FfiUserResult::from_error(userlist_core::ApiError::Unknown, status),
            Err(e) => FfiUserResult::from_error(e, status),
        }
    })
    .unwrap_or_else(|_| FfiUserResult::panic("panic in userlist_parse_delete_user"))
}

// ---------------------------------------------------------------------------
// Retry schedule
// ---------------------------------------------------------------------------

/// Milliseconds to wait after failed attempt `attempt` (1-based) before
/// trying again, or -1 when no further attempt should be made.
///
/// Only failures where no response arrived are worth retrying; a response
/// with an error status goes to `userlist_parse_*` instead.
#[unsafe(no_mangle)]
pub extern "C" fn userlist_retry_delay_ms(
    max_attempts: u32,
    base_delay_ms: u64,
    max_delay_ms: u64,
    attempt: u32,
) -> i64 {
    let policy = RetryPolicy {
        max_attempts,
        base_delay: Duration::from_millis(base_delay_ms),
        max_delay: Duration::from_millis(max_delay_ms),
    };
    match policy.delay_after(attempt) {
        Some(delay) => i64::try_from(delay.as_millis()).unwrap_or(i64::MAX),
        None => -1,
    }
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

/// Free an `FfiHttpRequest` returned by any `userlist_build_*` function.
/// Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn userlist_free_request(req: *mut FfiHttpRequest) {
    if req.is_null() {
        return;
    }
    let _ = catch_unwind(|| unsafe {
        let req = Box::from_raw(req);
        free_c_string(req.path);
        free_c_string(req.body);
        for h in reclaim(req.headers, req.headers_len) {
            free_c_string(h.key);
            free_c_string(h.value);
        }
    });
}

/// Free an `FfiUserResult` returned by any `userlist_parse_*` function.
/// Safe to call with null. Uses `data_tag` to determine what `data` points to.
#[unsafe(no_mangle)]
pub extern "C" fn userlist_free_result(result: *mut FfiUserResult) {
    if result.is_null() {
        return;
    }
    let _ = catch_unwind(|| unsafe {
        let result = Box::from_raw(result);
        free_c_string(result.error_message);
        if result.data.is_null() {
            return;
        }
        match result.data_tag {
            FfiDataTag::User => {
                let user = Box::from_raw(result.data as *mut FfiUser);
                free_user_fields(&user);
            }
            FfiDataTag::Page => {
                let page = Box::from_raw(result.data as *mut FfiUserPage);
                for user in &reclaim(page.users, page.len) {
                    free_user_fields(user);
                }
            }
            FfiDataTag::Validation => {
                let errors = Box::from_raw(result.data as *mut FfiValidationErrors);
                for item in reclaim(errors.items, errors.len) {
                    free_c_string(item.field);
                    free_c_string(item.message);
                }
            }
            FfiDataTag::None => {}
        }
    });
}

/// Free a C string allocated by this library. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn userlist_free_string(s: *mut c_char) {
    if !s.is_null() {
        let _ = catch_unwind(|| unsafe { free_c_string(s) });
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

//! `#[repr(C)]` types for the FFI boundary.
//!
//! # Design
//! Each type mirrors a core type but uses C-compatible representations:
//! `*mut c_char` instead of `String`, raw pointers instead of `Vec`, and
//! tagged enums with explicit discriminants. Conversion functions live here
//! to keep `lib.rs` focused on the `extern "C"` surface.

use std::ffi::{c_void, CStr, CString};
use std::os::raw::c_char;

use userlist_core::{
    ApiError, CreateUserError, HttpMethod, HttpRequest, HttpResponse, User, UserPage,
    ValidationErrors,
};

/// Opaque handle to a `UserClient`. C callers receive a pointer to this
/// and pass it back into every FFI function.
pub struct FfiUserClient {
    pub(crate) inner: userlist_core::UserClient,
}

/// Copy a Rust string into a C string owned by the caller. Interior NULs
/// are dropped.
pub(crate) fn into_c_string(s: String) -> *mut c_char {
    let cleaned = if s.contains('\0') {
        s.replace('\0', "")
    } else {
        s
    };
    CString::new(cleaned).unwrap_or_default().into_raw()
}

/// Borrow a caller-provided C string. Invalid UTF-8 reads as empty.
///
/// # Safety
/// `ptr` must be non-null and point to a NUL-terminated string that outlives
/// the returned slice.
pub(crate) unsafe fn borrow_str<'a>(ptr: *const c_char) -> &'a str {
    unsafe { CStr::from_ptr(ptr) }.to_str().unwrap_or("")
}

/// Turn a `Vec` into a raw `(ptr, len)` pair, null for an empty vector.
/// Reclaimed with `Vec::from_raw_parts(ptr, len, len)`.
fn into_raw_parts<T>(items: Vec<T>) -> (*mut T, u32) {
    if items.is_empty() {
        return (std::ptr::null_mut(), 0);
    }
    let mut items = items.into_boxed_slice();
    let len = items.len() as u32;
    let ptr = items.as_mut_ptr();
    std::mem::forget(items);
    (ptr, len)
}

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// HTTP method as a C enum.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiHttpMethod {
    Get = 0,
    Post = 1,
    Delete = 2,
}

impl From<HttpMethod> for FfiHttpMethod {
    fn from(m: HttpMethod) -> Self {
        match m {
            HttpMethod::Get => FfiHttpMethod::Get,
            HttpMethod::Post => FfiHttpMethod::Post,
            HttpMethod::Delete => FfiHttpMethod::Delete,
        }
    }
}

/// A single HTTP header as a key-value pair of C strings.
#[repr(C)]
pub struct FfiHeader {
    pub key: *mut c_char,
    pub value: *mut c_char,
}

/// An HTTP request described as C-compatible plain data.
///
/// Built by `userlist_build_*` functions. The C caller executes the request
/// (adding every header, the bearer token included) and passes the response
/// back through `userlist_parse_*`.
#[repr(C)]
pub struct FfiHttpRequest {
    pub method: FfiHttpMethod,
    pub path: *mut c_char,
    pub headers: *mut FfiHeader,
    pub headers_len: u32,
    pub body: *mut c_char,
}

impl FfiHttpRequest {
    /// Convert a core `HttpRequest` into a heap-allocated `FfiHttpRequest`.
    pub(crate) fn from_core(req: HttpRequest) -> *mut Self {
        let body = match req.body {
            Some(b) => into_c_string(b),
            None => std::ptr::null_mut(),
        };
        let headers: Vec<FfiHeader> = req
            .headers
            .into_iter()
            .map(|(k, v)| FfiHeader {
                key: into_c_string(k),
                value: into_c_string(v),
            })
            .collect();
        let (headers, headers_len) = into_raw_parts(headers);

        Box::into_raw(Box::new(FfiHttpRequest {
            method: req.method.into(),
            path: into_c_string(req.path),
            headers,
            headers_len,
            body,
        }))
    }
}

// ---------------------------------------------------------------------------
// Response input (caller-provided, not heap-allocated by us)
// ---------------------------------------------------------------------------

/// A response header supplied by the caller. Read, never freed.
#[repr(C)]
pub struct FfiHeaderRef {
    pub key: *const c_char,
    pub value: *const c_char,
}

/// An HTTP response described as C-compatible plain data.
///
/// The C caller constructs this on the stack after executing an HTTP
/// request, then passes a pointer to a `userlist_parse_*` function. The
/// list parser needs the `X-Pagination-*` headers; `headers` may be null
/// when `headers_len` is 0. The FFI layer reads but does not free these
/// fields.
#[repr(C)]
pub struct FfiHttpResponse {
    pub status: u16,
    pub headers: *const FfiHeaderRef,
    pub headers_len: u32,
    pub body: *const c_char,
}

impl FfiHttpResponse {
    /// Copy the caller's response into a core `HttpResponse`. Headers with
    /// a null key or value are skipped.
    ///
    /// # Safety
    /// `headers` must point to `headers_len` valid entries (or be null) and
    /// every non-null string must be NUL-terminated.
    pub(crate) unsafe fn to_core(&self) -> HttpResponse {
        let body = if self.body.is_null() {
            String::new()
        } else {
            unsafe { borrow_str(self.body) }.to_string()
        };

        let headers = if self.headers.is_null() || self.headers_len == 0 {
            Vec::new()
        } else {
            let raw = unsafe { std::slice::from_raw_parts(self.headers, self.headers_len as usize) };
            raw.iter()
                .filter(|h| !h.key.is_null() && !h.value.is_null())
                .map(|h| unsafe {
                    (
                        borrow_str(h.key).to_string(),
                        borrow_str(h.value).to_string(),
                    )
                })
                .collect()
        };

        HttpResponse {
            status: self.status,
            headers,
            body,
        }
    }
}

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Error codes returned in `FfiUserResult`. Codes 1 to 9 mirror the API
/// error taxonomy.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiErrorCode {
    Ok = 0,
    BadRequest = 1,
    Unauthorized = 2,
    Forbidden = 3,
    NotFound = 4,
    Timeout = 5,
    PayloadTooLarge = 6,
    RateLimited = 7,
    ServerError = 8,
    Unknown = 9,
    NullArg = 10,
    Panic = 11,
}

impl From<ApiError> for FfiErrorCode {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::BadRequest => FfiErrorCode::BadRequest,
            ApiError::Unauthorized => FfiErrorCode::Unauthorized,
            ApiError::Forbidden => FfiErrorCode::Forbidden,
            ApiError::NotFound => FfiErrorCode::NotFound,
            ApiError::Timeout => FfiErrorCode::Timeout,
            ApiError::PayloadTooLarge => FfiErrorCode::PayloadTooLarge,
            ApiError::RateLimited => FfiErrorCode::RateLimited,
            ApiError::ServerError => FfiErrorCode::ServerError,
            ApiError::Unknown => FfiErrorCode::Unknown,
        }
    }
}

/// Tag that tells `userlist_free_result` what `FfiUserResult::data` points to.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiDataTag {
    None = 0,
    User = 1,
    Page = 2,
    Validation = 3,
}

/// A single user exposed to C.
#[repr(C)]
pub struct FfiUser {
    pub id: i64,
    pub name: *mut c_char,
    pub email: *mut c_char,
    pub gender: *mut c_char,
    pub status: *mut c_char,
}

impl FfiUser {
    fn from_core(user: User) -> Self {
        FfiUser {
            id: user.id,
            name: into_c_string(user.name),
            email: into_c_string(user.email),
            gender: into_c_string(user.gender),
            status: into_c_string(user.status),
        }
    }
}

/// One page of users plus the pagination headers it came with.
#[repr(C)]
pub struct FfiUserPage {
    pub users: *mut FfiUser,
    pub len: u32,
    pub total_pages: u32,
    pub current_page: u32,
}

/// One field-level validation message.
#[repr(C)]
pub struct FfiFieldError {
    pub field: *mut c_char,
    pub message: *mut c_char,
}

/// Validation messages from a rejected create, sorted by field name.
#[repr(C)]
pub struct FfiValidationErrors {
    pub items: *mut FfiFieldError,
    pub len: u32,
}

/// Result envelope for all parse operations.
///
/// On success `error_code` is `Ok`, `error_message` is null, and `data`
/// points to the parsed payload (tagged by `data_tag`). On failure
/// `error_code` names the error kind and `error_message` is a
/// human-readable C string; a rejected create may still carry
/// `FfiValidationErrors` in `data`. `http_status` is the status of the
/// parsed response, or 0 when no response was read.
#[repr(C)]
pub struct FfiUserResult {
    pub error_code: FfiErrorCode,
    pub error_message: *mut c_char,
    pub http_status: u16,
    pub data_tag: FfiDataTag,
    pub data: *mut c_void,
}

impl FfiUserResult {
    fn build(
        error_code: FfiErrorCode,
        error_message: Option<String>,
        http_status: u16,
        data_tag: FfiDataTag,
        data: *mut c_void,
    ) -> *mut Self {
        Box::into_raw(Box::new(FfiUserResult {
            error_code,
            error_message: error_message.map_or(std::ptr::null_mut(), into_c_string),
            http_status,
            data_tag,
            data,
        }))
    }

    /// Build a success result carrying a single `FfiUser`.
    pub(crate) fn ok_user(user: User, http_status: u16) -> *mut Self {
        let data = Box::into_raw(Box::new(FfiUser::from_core(user)));
        Self::build(
            FfiErrorCode::Ok,
            None,
            http_status,
            FfiDataTag::User,
            data as *mut c_void,
        )
    }

    /// Build a success result carrying an `FfiUserPage`.
    pub(crate) fn ok_page(page: UserPage, http_status: u16) -> *mut Self {
        let users: Vec<FfiUser> = page.users.into_iter().map(FfiUser::from_core).collect();
        let (users, len) = into_raw_parts(users);
        let data = Box::into_raw(Box::new(FfiUserPage {
            users,
            len,
            total_pages: page.total_pages,
            current_page: page.current_page,
        }));
        Self::build(
            FfiErrorCode::Ok,
            None,
            http_status,
            FfiDataTag::Page,
            data as *mut c_void,
        )
    }

    /// Build a success result with no data payload (e.g. delete).
    pub(crate) fn ok_empty(http_status: u16) -> *mut Self {
        Self::build(
            FfiErrorCode::Ok,
            None,
            http_status,
            FfiDataTag::None,
            std::ptr::null_mut(),
        )
    }

    /// Build an error result from an `ApiError`.
    pub(crate) fn from_error(err: ApiError, http_status: u16) -> *mut Self {
        Self::build(
            err.into(),
            Some(err.to_string()),
            http_status,
            FfiDataTag::None,
            std::ptr::null_mut(),
        )
    }

    /// Build an error result from a rejected create, attaching the field
    /// messages when there are any.
    pub(crate) fn from_create_error(err: CreateUserError, http_status: u16) -> *mut Self {
        if err.validation.is_empty() {
            return Self::from_error(err.kind, http_status);
        }
        let data = validation_into_raw(err.validation);
        Self::build(
            err.kind.into(),
            Some(err.kind.to_string()),
            http_status,
            FfiDataTag::Validation,
            data as *mut c_void,
        )
    }

    /// Build an error result for a null argument.
    pub(crate) fn null_arg(name: &str) -> *mut Self {
        Self::build(
            FfiErrorCode::NullArg,
            Some(format!("null argument: {name}")),
            0,
            FfiDataTag::None,
            std::ptr::null_mut(),
        )
    }

    /// Build an error result for a caught panic.
    pub(crate) fn panic(msg: &str) -> *mut Self {
        Self::build(
            FfiErrorCode::Panic,
            Some(msg.to_string()),
            0,
            FfiDataTag::None,
            std::ptr::null_mut(),
        )
    }
}

fn validation_into_raw(validation: ValidationErrors) -> *mut FfiValidationErrors {
    let items: Vec<FfiFieldError> = validation
        .into_iter()
        .map(|(field, message)| FfiFieldError {
            field: into_c_string(field),
            message: into_c_string(message),
        })
        .collect();
    let (items, len) = into_raw_parts(items);
    Box::into_raw(Box::new(FfiValidationErrors { items, len }))
}

// ---------------------------------------------------------------------------
// Freeing
// ---------------------------------------------------------------------------

/// Free a C string produced by `into_c_string`. Null is ignored.
///
/// # Safety
/// `s` must come from `into_c_string` and not have been freed yet.
pub(crate) unsafe fn free_c_string(s: *mut c_char) {
    if !s.is_null() {
        drop(unsafe { CString::from_raw(s) });
    }
}

/// Reclaim a `(ptr, len)` pair produced by `into_raw_parts`.
///
/// # Safety
/// `ptr` and `len` must come from the same `into_raw_parts` call.
pub(crate) unsafe fn reclaim<T>(ptr: *mut T, len: u32) -> Vec<T> {
    if ptr.is_null() || len == 0 {
        return Vec::new();
    }
    unsafe { Vec::from_raw_parts(ptr, len as usize, len as usize) }
}

/// Free the C-string fields of an `FfiUser` (but not the struct itself).
pub(crate) unsafe fn free_user_fields(user: &FfiUser) {
    unsafe {
        free_c_string(user.name);
        free_c_string(user.email);
        free_c_string(user.gender);
        free_c_string(user.status);
    }
}

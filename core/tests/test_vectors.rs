//! Verify build/parse methods against JSON test vectors stored in `test-vectors/`.
//!
//! Each vector file describes inputs, expected requests, simulated responses,
//! and expected parse results. Comparing parsed JSON (not raw strings) avoids
//! false negatives from field-ordering differences.

use userlist_core::{
    ApiError, CreateUser, HttpMethod, HttpResponse, User, UserClient, ValidationErrors,
};

const BASE_URL: &str = "http://localhost:3000";
const TOKEN: &str = "vector-token";

fn client() -> UserClient {
    UserClient::new(BASE_URL, TOKEN)
}

/// Parse the method string from test vectors into `HttpMethod`.
fn parse_method(s: &str) -> HttpMethod {
    match s {
        "GET" => HttpMethod::Get,
        "POST" => HttpMethod::Post,
        "DELETE" => HttpMethod::Delete,
        other => panic!("unknown method: {other}"),
    }
}

/// Parse an error name from test vectors into `ApiError`.
fn parse_error(s: &str) -> ApiError {
    match s {
        "BadRequest" => ApiError::BadRequest,
        "Unauthorized" => ApiError::Unauthorized,
        "Forbidden" => ApiError::Forbidden,
        "NotFound" => ApiError::NotFound,
        "Timeout" => ApiError::Timeout,
        "PayloadTooLarge" => ApiError::PayloadTooLarge,
        "RateLimited" => ApiError::RateLimited,
        "ServerError" => ApiError::ServerError,
        "Unknown" => ApiError::Unknown,
        other => panic!("unknown expected_error: {other}"),
    }
}

fn simulated_response(sim: &serde_json::Value) -> HttpResponse {
    let headers: Vec<(String, String)> = sim
        .get("headers")
        .and_then(|h| h.as_array())
        .map(|headers| {
            headers
                .iter()
                .map(|h| {
                    let pair = h.as_array().unwrap();
                    (
                        pair[0].as_str().unwrap().to_string(),
                        pair[1].as_str().unwrap().to_string(),
                    )
                })
                .collect()
        })
        .unwrap_or_default();
    HttpResponse {
        status: sim["status"].as_u64().unwrap() as u16,
        headers,
        body: sim["body"].as_str().unwrap().to_string(),
    }
}

fn assert_auth_header(headers: &[(String, String)], name: &str) {
    assert!(
        headers.contains(&("authorization".to_string(), format!("Bearer {TOKEN}"))),
        "{name}: bearer token missing"
    );
}

// ---------------------------------------------------------------------------
// List
// ---------------------------------------------------------------------------

#[test]
fn list_test_vectors() {
    let raw = include_str!("../../test-vectors/list.json");
    let vectors: serde_json::Value = serde_json::from_str(raw).unwrap();

    let c = client();
    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let page = case["input_page"].as_u64().unwrap() as u32;
        let expected_req = &case["expected_request"];

        // Verify build
        let req = c.build_list_users(page);
        assert_eq!(req.method, parse_method(expected_req["method"].as_str().unwrap()), "{name}: method");
        assert_eq!(req.path, format!("{BASE_URL}{}", expected_req["path"].as_str().unwrap()), "{name}: path");
        assert!(req.body.is_none(), "{name}: body should be None");
        assert_auth_header(&req.headers, name);

        // Verify parse
        let result = c.parse_list_users(simulated_response(&case["simulated_response"]));

        if let Some(expected_error) = case.get("expected_error") {
            let err = result.unwrap_err();
            assert_eq!(err, parse_error(expected_error.as_str().unwrap()), "{name}: error");
        } else {
            let page = result.unwrap();
            let expected = &case["expected_result"];
            let users: Vec<User> = serde_json::from_value(expected["users"].clone()).unwrap();
            assert_eq!(page.users, users, "{name}: users");
            assert_eq!(page.total_pages as u64, expected["total_pages"].as_u64().unwrap(), "{name}: total_pages");
            assert_eq!(page.current_page as u64, expected["current_page"].as_u64().unwrap(), "{name}: current_page");
        }
    }
}

// ---------------------------------------------------------------------------
// Create
// ---------------------------------------------------------------------------

#[test]
fn create_test_vectors() {
    let raw = include_str!("../../test-vectors/create.json");
    let vectors: serde_json::Value = serde_json::from_str(raw).unwrap();

    let c = client();
    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let input: CreateUser = serde_json::from_value(case["input"].clone()).unwrap();
        let expected_req = &case["expected_request"];

        // Verify build
        let req = c.build_create_user(&input).unwrap();
        assert_eq!(req.method, parse_method(expected_req["method"].as_str().unwrap()), "{name}: method");
        assert_eq!(req.path, format!("{BASE_URL}{}", expected_req["path"].as_str().unwrap()), "{name}: path");
        assert_auth_header(&req.headers, name);
        assert!(
            req.headers.contains(&("content-type".to_string(), "application/json".to_string())),
            "{name}: content-type"
        );

        let req_body: serde_json::Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(req_body, expected_req["body"], "{name}: body");

        // Verify parse
        let result = c.parse_create_user(simulated_response(&case["simulated_response"]));

        if let Some(expected_error) = case.get("expected_error") {
            let err = result.unwrap_err();
            assert_eq!(err.kind, parse_error(expected_error.as_str().unwrap()), "{name}: kind");
            let expected: ValidationErrors =
                serde_json::from_value(case["expected_validation"].clone()).unwrap();
            assert_eq!(err.validation, expected, "{name}: validation");
        } else {
            let user = result.unwrap();
            let expected: User = serde_json::from_value(case["expected_result"].clone()).unwrap();
            assert_eq!(user, expected, "{name}: parsed result");
        }
    }
}

// ---------------------------------------------------------------------------
// Delete
// ---------------------------------------------------------------------------

#[test]
fn delete_test_vectors() {
    let raw = include_str!("../../test-vectors/delete.json");
    let vectors: serde_json::Value = serde_json::from_str(raw).unwrap();

    let c = client();
    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let id = case["input_id"].as_i64().unwrap();
        let expected_req = &case["expected_request"];

        // Verify build
        let req = c.build_delete_user(id);
        assert_eq!(req.method, parse_method(expected_req["method"].as_str().unwrap()), "{name}: method");
        assert_eq!(req.path, format!("{BASE_URL}{}", expected_req["path"].as_str().unwrap()), "{name}: path");
        assert!(req.body.is_none(), "{name}: body should be None");
        assert_auth_header(&req.headers, name);

        // Verify parse
        let result = c.parse_delete_user(simulated_response(&case["simulated_response"]));

        if let Some(expected_error) = case.get("expected_error") {
            let err = result.unwrap_err();
            assert_eq!(err, parse_error(expected_error.as_str().unwrap()), "{name}: error");
        } else {
            assert!(result.unwrap(), "{name}: expected success");
        }
    }
}

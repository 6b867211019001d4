//! Scripted transport for unit tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use tokio::sync::Semaphore;
use userlist_core::{HttpRequest, HttpResponse, User};

use crate::error::TransportError;
use crate::transport::Transport;

type Outcome = Result<HttpResponse, TransportError>;

#[derive(Default)]
struct Script {
    outcomes: Mutex<VecDeque<Outcome>>,
    requests: Mutex<Vec<HttpRequest>>,
    gate: Option<Semaphore>,
}

/// Replays canned outcomes in order and records every request it sees.
///
/// A gated script parks each request until `release` hands out a permit,
/// which lets a test observe the store while a request is in flight.
#[derive(Clone, Default)]
pub(crate) struct Scripted {
    script: Arc<Script>,
}

impl Scripted {
    pub(crate) fn new(outcomes: Vec<Outcome>) -> Self {
        Self {
            script: Arc::new(Script {
                outcomes: Mutex::new(outcomes.into()),
                ..Script::default()
            }),
        }
    }

    pub(crate) fn gated(outcomes: Vec<Outcome>) -> Self {
        Self {
            script: Arc::new(Script {
                outcomes: Mutex::new(outcomes.into()),
                requests: Mutex::default(),
                gate: Some(Semaphore::new(0)),
            }),
        }
    }

    pub(crate) fn release(&self, permits: usize) {
        if let Some(gate) = &self.script.gate {
            gate.add_permits(permits);
        }
    }

    pub(crate) fn requests(&self) -> Vec<HttpRequest> {
        self.script.requests.lock().unwrap().clone()
    }

    pub(crate) fn paths(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.path).collect()
    }
}

impl Transport for Scripted {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.script.requests.lock().unwrap().push(request);
        if let Some(gate) = &self.script.gate {
            gate.acquire().await.unwrap().forget();
        }
        self.script
            .outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Connection("script exhausted".to_string())))
    }
}

pub(crate) fn response(status: u16, headers: &[(&str, &str)], body: &str) -> HttpResponse {
    HttpResponse {
        status,
        headers: headers
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
        body: body.to_string(),
    }
}

pub(crate) fn user(id: i64) -> User {
    User {
        id,
        name: format!("user {id}"),
        email: format!("user{id}@example.com"),
        gender: "male".to_string(),
        status: "active".to_string(),
    }
}

/// A 200 list response carrying pagination headers.
pub(crate) fn page_response(users: &[User], total_pages: u32, current_page: u32) -> Outcome {
    let body = serde_json::to_string(users).unwrap();
    Ok(response(
        200,
        &[
            ("X-Pagination-Pages", &total_pages.to_string()),
            ("X-Pagination-Page", &current_page.to_string()),
        ],
        &body,
    ))
}

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};

pub const DEFAULT_PER_PAGE: usize = 10;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub gender: String,
    pub status: String,
}

/// Missing fields deserialize as empty strings so they surface as 422
/// field errors instead of extractor rejections.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CreateUser {
    pub name: String,
    pub email: String,
    pub gender: String,
    pub status: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

#[derive(Clone, Debug)]
pub struct Options {
    /// When set, every request must carry `Authorization: Bearer <token>`.
    pub token: Option<String>,
    pub per_page: usize,
    pub seed_users: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            token: None,
            per_page: DEFAULT_PER_PAGE,
            seed_users: 0,
        }
    }
}

#[derive(Debug, Default)]
pub struct Db {
    users: Vec<User>,
    next_id: i64,
}

impl Db {
    fn seeded(count: usize) -> Self {
        let mut db = Db {
            users: Vec::with_capacity(count),
            next_id: 1,
        };
        for n in 1..=count {
            let gender = if n % 2 == 0 { "female" } else { "male" };
            db.insert(CreateUser {
                name: format!("User {n}"),
                email: format!("user{n}@example.com"),
                gender: gender.to_string(),
                status: "active".to_string(),
            });
        }
        db
    }

    fn insert(&mut self, input: CreateUser) -> User {
        let user = User {
            id: self.next_id,
            name: input.name,
            email: input.email,
            gender: input.gender,
            status: input.status,
        };
        self.next_id += 1;
        self.users.push(user.clone());
        user
    }
}

#[derive(Clone)]
struct AppState {
    db: Arc<RwLock<Db>>,
    options: Arc<Options>,
}

pub fn app() -> Router {
    app_with(Options::default())
}

pub fn app_with(options: Options) -> Router {
    let state = AppState {
        db: Arc::new(RwLock::new(Db::seeded(options.seed_users))),
        options: Arc::new(options),
    };
    Router::new()
        .route("/public/v2/users", get(list_users).post(create_user))
        .route("/public/v2/users/{id}", delete(delete_user))
        .with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    run_with(listener, Options::default()).await
}

pub async fn run_with(listener: TcpListener, options: Options) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with(options)).await
}

#[derive(Deserialize)]
struct ListParams {
    page: Option<usize>,
}

fn page_count(total: usize, per_page: usize) -> usize {
    let per_page = per_page.max(1);
    total.div_ceil(per_page).max(1)
}

fn message(status: StatusCode, text: &str) -> Response {
    (status, Json(serde_json::json!({ "message": text }))).into_response()
}

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), Response> {
    let Some(token) = state.options.token.as_deref() else {
        return Ok(());
    };
    let expected = format!("Bearer {token}");
    let presented = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());
    if presented == Some(expected.as_str()) {
        Ok(())
    } else {
        Err(message(StatusCode::UNAUTHORIZED, "Authentication failed"))
    }
}

async fn list_users(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<ListParams>,
) -> Response {
    if let Err(resp) = authorize(&state, &headers) {
        return resp;
    }
    let per_page = state.options.per_page.max(1);
    let page = params.page.unwrap_or(1).max(1);

    let db = state.db.read().await;
    let total = db.users.len();
    let pages = page_count(total, per_page);
    let users: Vec<User> = db
        .users
        .iter()
        .skip((page - 1).saturating_mul(per_page))
        .take(per_page)
        .cloned()
        .collect();

    (
        [
            ("X-Pagination-Page", page.to_string()),
            ("X-Pagination-Pages", pages.to_string()),
            ("X-Pagination-Limit", per_page.to_string()),
            ("X-Pagination-Total", total.to_string()),
        ],
        Json(users),
    )
        .into_response()
}

fn validate(input: &CreateUser, existing: &[User]) -> Vec<FieldError> {
    let mut errors = Vec::new();
    let mut push = |field: &str, message: &str| {
        errors.push(FieldError {
            field: field.to_string(),
            message: message.to_string(),
        });
    };

    if input.name.trim().is_empty() {
        push("name", "can't be blank");
    }
    if input.email.trim().is_empty() {
        push("email", "can't be blank");
    } else if !input.email.contains('@') {
        push("email", "is invalid");
    } else if existing.iter().any(|u| u.email == input.email) {
        push("email", "has already been taken");
    }
    if !matches!(input.gender.as_str(), "male" | "female") {
        push("gender", "can't be blank, can be male of female");
    }
    if !matches!(input.status.as_str(), "active" | "inactive") {
        push("status", "can't be blank");
    }
    errors
}

async fn create_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<CreateUser>,
) -> Response {
    if let Err(resp) = authorize(&state, &headers) {
        return resp;
    }
    let mut db = state.db.write().await;
    let errors = validate(&input, &db.users);
    if !errors.is_empty() {
        tracing::debug!(count = errors.len(), "rejecting create");
        return (StatusCode::UNPROCESSABLE_ENTITY, Json(errors)).into_response();
    }
    let user = db.insert(input);
    tracing::debug!(id = user.id, "created user");
    (StatusCode::CREATED, Json(user)).into_response()
}

async fn delete_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    if let Err(resp) = authorize(&state, &headers) {
        return resp;
    }
    let mut db = state.db.write().await;
    match db.users.iter().position(|u| u.id == id) {
        Some(index) => {
            db.users.remove(index);
            tracing::debug!(id, "deleted user");
            StatusCode::NO_CONTENT.into_response()
        }
        None => message(StatusCode::NOT_FOUND, "Resource not found"),
    }
}

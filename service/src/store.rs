//! Single-writer store for the accumulated user list.
//!
//! # Design
//! A spawned actor owns the `ListState` and the `UserService`. Handles send
//! commands over an mpsc queue and the actor runs them one at a time, so no
//! two list mutations can interleave. Each step goes through the core
//! reducer and is published on a `watch` channel for observers.
//!
//! Page loads are guarded twice. Handles share a pending-load flag that is
//! raised before a load command is queued, so a second load requested while
//! one is queued or in flight returns without reaching the actor. Each load
//! command also carries the cursor the handle saw; the actor drops it when
//! the cursor has moved since, or when the page is out of range.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, watch};
use userlist_core::{reduce, ApiError, CreateUser, ListEvent, ListState, Placement, User};

use crate::service::UserService;
use crate::transport::Transport;

const COMMAND_BUFFER: usize = 16;

enum Command {
    Bootstrap {
        respond_to: oneshot::Sender<bool>,
    },
    LoadMore {
        from_page: u32,
        respond_to: oneshot::Sender<bool>,
    },
    LoadPrevious {
        from_page: u32,
        respond_to: oneshot::Sender<bool>,
    },
    Create {
        input: CreateUser,
        respond_to: oneshot::Sender<bool>,
    },
    Delete {
        user: User,
        respond_to: oneshot::Sender<bool>,
    },
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Command::Bootstrap { .. } => "bootstrap",
            Command::LoadMore { .. } => "load_more",
            Command::LoadPrevious { .. } => "load_previous",
            Command::Create { .. } => "create",
            Command::Delete { .. } => "delete",
        }
    }
}

/// Cloneable handle to the store actor.
///
/// Every operation resolves to `true` when it issued a request that
/// succeeded and `false` otherwise (no-op, failure, or the actor is gone).
/// Failures are visible in the published state, never as an `Err`.
#[derive(Clone)]
pub struct UserStore {
    sender: mpsc::Sender<Command>,
    state: watch::Receiver<ListState>,
    page_load: Arc<AtomicBool>,
}

/// Lowers the shared pending-load flag when the load call finishes or is
/// dropped.
struct PendingLoad(Arc<AtomicBool>);

impl PendingLoad {
    fn acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(Arc::clone(flag)))
    }
}

impl Drop for PendingLoad {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl UserStore {
    /// Spawn the actor on the current tokio runtime.
    pub fn spawn<T: Transport>(service: UserService<T>) -> Self {
        let (sender, receiver) = mpsc::channel(COMMAND_BUFFER);
        let (state_tx, state_rx) = watch::channel(ListState::default());
        let actor = StoreActor {
            service,
            receiver,
            state: state_tx,
        };
        tokio::spawn(actor.run());
        Self {
            sender,
            state: state_rx,
            page_load: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn snapshot(&self) -> ListState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ListState> {
        self.state.clone()
    }

    /// Fetch page 1 to learn the page count, then show the last page.
    pub async fn bootstrap(&self) -> bool {
        self.request(|respond_to| Command::Bootstrap { respond_to })
            .await
    }

    /// Fetch `current_page + 1` and append it.
    pub async fn load_more(&self) -> bool {
        let Some(_pending) = PendingLoad::acquire(&self.page_load) else {
            tracing::debug!("load_more ignored, a page load is pending");
            return false;
        };
        let from_page = {
            let state = self.state.borrow();
            match state.next_page() {
                Some(_) => state.current_page,
                None => return false,
            }
        };
        self.request(|respond_to| Command::LoadMore {
            from_page,
            respond_to,
        })
        .await
    }

    /// Fetch `current_page - 1` and prepend it.
    pub async fn load_previous(&self) -> bool {
        let Some(_pending) = PendingLoad::acquire(&self.page_load) else {
            tracing::debug!("load_previous ignored, a page load is pending");
            return false;
        };
        let from_page = {
            let state = self.state.borrow();
            match state.previous_page() {
                Some(_) => state.current_page,
                None => return false,
            }
        };
        self.request(|respond_to| Command::LoadPrevious {
            from_page,
            respond_to,
        })
        .await
    }

    pub async fn create(&self, name: &str, email: &str, gender: &str, status: &str) -> bool {
        let input = CreateUser {
            name: name.to_string(),
            email: email.to_string(),
            gender: gender.to_string(),
            status: status.to_string(),
        };
        self.request(|respond_to| Command::Create { input, respond_to })
            .await
    }

    pub async fn delete(&self, user: &User) -> bool {
        let user = user.clone();
        self.request(|respond_to| Command::Delete { user, respond_to })
            .await
    }

    async fn request(&self, make: impl FnOnce(oneshot::Sender<bool>) -> Command) -> bool {
        let (respond_to, receiver) = oneshot::channel();
        let command = make(respond_to);
        let name = command.name();
        if self.sender.send(command).await.is_err() {
            tracing::warn!(command = name, "store actor is gone");
            return false;
        }
        receiver.await.unwrap_or(false)
    }
}

struct StoreActor<T> {
    service: UserService<T>,
    receiver: mpsc::Receiver<Command>,
    state: watch::Sender<ListState>,
}

impl<T: Transport> StoreActor<T> {
    async fn run(mut self) {
        while let Some(command) = self.receiver.recv().await {
            let name = command.name();
            let (ok, respond_to) = match command {
                Command::Bootstrap { respond_to } => (self.bootstrap().await, respond_to),
                Command::LoadMore {
                    from_page,
                    respond_to,
                } => {
                    let page = self.target_page(from_page, ListState::next_page);
                    (self.load_page(page, Placement::Append).await, respond_to)
                }
                Command::LoadPrevious {
                    from_page,
                    respond_to,
                } => {
                    let page = self.target_page(from_page, ListState::previous_page);
                    (self.load_page(page, Placement::Prepend).await, respond_to)
                }
                Command::Create { input, respond_to } => (self.create(input).await, respond_to),
                Command::Delete { user, respond_to } => (self.delete(user).await, respond_to),
            };
            if respond_to.send(ok).is_err() {
                tracing::trace!(command = name, "store response dropped (receiver gone)");
            }
        }
        tracing::debug!("store command queue closed");
    }

    /// The page a queued load should fetch, or `None` when the cursor has
    /// moved since the handle queued it.
    fn target_page(&self, from_page: u32, pick: fn(&ListState) -> Option<u32>) -> Option<u32> {
        let state = self.state.borrow();
        if state.current_page != from_page {
            tracing::debug!(
                from_page,
                current_page = state.current_page,
                "stale page load dropped"
            );
            return None;
        }
        pick(&state)
    }

    fn apply(&self, event: ListEvent) {
        self.state.send_modify(|state| {
            let current = std::mem::take(state);
            *state = reduce(current, event);
        });
    }

    async fn bootstrap(&self) -> bool {
        self.apply(ListEvent::LoadStarted);
        let first = match self.service.list_users(1).await {
            Ok(first) => first,
            Err(kind) => return self.load_failed(kind),
        };

        let last = first.total_pages;
        tracing::debug!(total_pages = last, "bootstrap discovered page count");
        match self.service.list_users(last).await {
            Ok(result) => {
                tracing::info!(page = last, users = result.users.len(), "bootstrap loaded");
                self.apply(ListEvent::PageLoaded {
                    page: last,
                    result,
                    placement: Placement::Replace,
                });
                true
            }
            Err(kind) => self.load_failed(kind),
        }
    }

    async fn load_page(&self, page: Option<u32>, placement: Placement) -> bool {
        let Some(page) = page else {
            return false;
        };
        self.apply(ListEvent::LoadStarted);
        match self.service.list_users(page).await {
            Ok(result) => {
                tracing::debug!(page, users = result.users.len(), ?placement, "page loaded");
                self.apply(ListEvent::PageLoaded {
                    page,
                    result,
                    placement,
                });
                true
            }
            Err(kind) => self.load_failed(kind),
        }
    }

    fn load_failed(&self, kind: ApiError) -> bool {
        tracing::warn!(%kind, "page load failed");
        self.apply(ListEvent::LoadFailed(kind));
        false
    }

    async fn create(&self, input: CreateUser) -> bool {
        self.apply(ListEvent::CreateStarted);
        match self.service.create_user(&input).await {
            Ok(user) => {
                tracing::info!(id = user.id, "user created");
                self.apply(ListEvent::UserCreated(user));
                true
            }
            Err(err) => {
                tracing::info!(kind = %err.kind, fields = err.validation.len(), "create rejected");
                self.apply(ListEvent::CreateFailed(err));
                false
            }
        }
    }

    async fn delete(&self, user: User) -> bool {
        self.apply(ListEvent::DeleteStarted);
        match self.service.delete_user(user.id).await {
            Ok(true) => {
                tracing::info!(id = user.id, "user deleted");
                self.apply(ListEvent::UserDeleted(user));
                true
            }
            Ok(false) => {
                self.apply(ListEvent::DeleteFailed(ApiError::Unknown));
                false
            }
            Err(kind) => {
                tracing::warn!(id = user.id, %kind, "delete failed");
                self.apply(ListEvent::DeleteFailed(kind));
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;
    use crate::testing::{page_response, response, user, Scripted};
    use userlist_core::{LoadStatus, UserClient};

    const BASE: &str = "http://api.test/public/v2/users";

    fn store(script: &Scripted) -> UserStore {
        UserStore::spawn(UserService::new(
            UserClient::new("http://api.test", "token"),
            script.clone(),
        ))
    }

    fn page_path(page: u32) -> String {
        format!("{BASE}?page={page}")
    }

    #[tokio::test]
    async fn bootstrap_shows_only_the_last_page() {
        let script = Scripted::new(vec![
            page_response(&[user(1)], 3, 1),
            page_response(&[user(2), user(3)], 3, 3),
        ]);
        let store = store(&script);

        assert!(store.bootstrap().await);

        let state = store.snapshot();
        assert_eq!(state.users, vec![user(2), user(3)]);
        assert_eq!(state.current_page, 3);
        assert_eq!(state.total_pages, 3);
        assert_eq!(state.status, LoadStatus::Success);
        assert_eq!(script.paths(), vec![page_path(1), page_path(3)]);
    }

    #[tokio::test]
    async fn bootstrap_failure_sets_error() {
        let script = Scripted::new(vec![Ok(response(401, &[], ""))]);
        let store = store(&script);

        assert!(!store.bootstrap().await);

        let state = store.snapshot();
        assert_eq!(state.status, LoadStatus::Error(ApiError::Unauthorized));
        assert!(state.users.is_empty());
        assert_eq!(state.current_page, 1);
    }

    #[tokio::test]
    async fn load_more_on_last_page_is_a_noop() {
        let script = Scripted::new(vec![
            page_response(&[user(1)], 2, 1),
            page_response(&[user(2)], 2, 2),
        ]);
        let store = store(&script);
        assert!(store.bootstrap().await);

        assert!(!store.load_more().await);
        assert_eq!(script.requests().len(), 2);
    }

    #[tokio::test]
    async fn load_previous_prepends_and_moves_cursor_back() {
        let script = Scripted::new(vec![
            page_response(&[user(1)], 3, 1),
            page_response(&[user(5), user(6)], 3, 3),
            page_response(&[user(3), user(4)], 3, 2),
            page_response(&[user(5), user(6)], 3, 3),
        ]);
        let store = store(&script);
        assert!(store.bootstrap().await);

        assert!(store.load_previous().await);
        let state = store.snapshot();
        assert_eq!(state.users, vec![user(3), user(4), user(5), user(6)]);
        assert_eq!(state.current_page, 2);

        // the cursor is a single page counter, so moving forward re-fetches page 3
        assert!(store.load_more().await);
        let state = store.snapshot();
        assert_eq!(state.current_page, 3);
        assert_eq!(state.users.len(), 6);
        assert_eq!(script.paths().last(), Some(&page_path(3)));
    }

    #[tokio::test]
    async fn load_previous_on_first_page_is_a_noop() {
        let script = Scripted::new(vec![
            page_response(&[user(1)], 1, 1),
            page_response(&[user(1)], 1, 1),
        ]);
        let store = store(&script);
        assert!(store.bootstrap().await);

        assert!(!store.load_previous().await);
        assert_eq!(script.requests().len(), 2);
    }

    #[tokio::test]
    async fn load_more_while_loading_issues_no_request() {
        let script = Scripted::gated(vec![
            page_response(&[user(1)], 3, 1),
            page_response(&[user(5)], 3, 3),
        ]);
        let store = store(&script);
        let mut observed = store.subscribe();

        let bootstrap = {
            let store = store.clone();
            tokio::spawn(async move { store.bootstrap().await })
        };
        observed
            .wait_for(|state| state.status.is_loading())
            .await
            .unwrap();

        assert!(!store.load_more().await);
        assert!(!store.load_previous().await);

        script.release(2);
        assert!(bootstrap.await.unwrap());
        assert_eq!(script.paths(), vec![page_path(1), page_path(3)]);
    }

    #[tokio::test]
    async fn failed_page_load_keeps_list_and_cursor() {
        let script = Scripted::new(vec![
            page_response(&[user(1)], 3, 1),
            page_response(&[user(5)], 3, 3),
            Err(TransportError::Connection("offline".to_string())),
        ]);
        let store = store(&script);
        assert!(store.bootstrap().await);

        assert!(!store.load_previous().await);
        let state = store.snapshot();
        assert_eq!(state.users, vec![user(5)]);
        assert_eq!(state.current_page, 3);
        assert_eq!(state.status, LoadStatus::Error(ApiError::Unknown));
    }

    #[tokio::test]
    async fn create_appends_new_user_once() {
        let created = serde_json::to_string(&user(9)).unwrap();
        let script = Scripted::new(vec![
            page_response(&[user(1)], 1, 1),
            page_response(&[user(1)], 1, 1),
            Ok(response(201, &[], &created)),
        ]);
        let store = store(&script);
        assert!(store.bootstrap().await);

        assert!(
            store
                .create("user 9", "user9@example.com", "male", "active")
                .await
        );

        let state = store.snapshot();
        assert_eq!(state.users, vec![user(1), user(9)]);
        assert!(state.validation_errors.is_empty());
        assert_eq!(state.status, LoadStatus::Success);
    }

    #[tokio::test]
    async fn failed_create_records_validation_errors() {
        let script = Scripted::new(vec![
            page_response(&[user(1)], 1, 1),
            page_response(&[user(1)], 1, 1),
            Ok(response(
                422,
                &[],
                r#"[{"field":"email","message":"is invalid"}]"#,
            )),
        ]);
        let store = store(&script);
        assert!(store.bootstrap().await);

        assert!(!store.create("Ann", "nope", "female", "active").await);

        let state = store.snapshot();
        assert_eq!(state.users, vec![user(1)]);
        assert_eq!(state.validation_errors.len(), 1);
        assert_eq!(state.validation_errors["email"], "is invalid");
        assert_eq!(state.status, LoadStatus::Error(ApiError::Unknown));
    }

    #[tokio::test]
    async fn delete_removes_user_on_success() {
        let script = Scripted::new(vec![
            page_response(&[user(1)], 1, 1),
            page_response(&[user(1), user(2)], 1, 1),
            Ok(response(204, &[], "")),
        ]);
        let store = store(&script);
        assert!(store.bootstrap().await);

        assert!(store.delete(&user(1)).await);

        let state = store.snapshot();
        assert!(state.users.iter().all(|u| u.id != 1));
        assert_eq!(state.users, vec![user(2)]);
        assert_eq!(script.paths().last(), Some(&format!("{BASE}/1")));
    }

    #[tokio::test]
    async fn failed_delete_keeps_list_and_sets_error() {
        let script = Scripted::new(vec![
            page_response(&[user(1)], 1, 1),
            page_response(&[user(1), user(2)], 1, 1),
            Ok(response(404, &[], r#"{"message":"Resource not found"}"#)),
        ]);
        let store = store(&script);
        assert!(store.bootstrap().await);

        assert!(!store.delete(&user(1)).await);

        let state = store.snapshot();
        assert_eq!(state.users, vec![user(1), user(2)]);
        assert_eq!(state.status, LoadStatus::Error(ApiError::NotFound));
    }

    #[tokio::test]
    async fn concurrent_mutations_are_serialized() {
        let created = serde_json::to_string(&user(3)).unwrap();
        let script = Scripted::new(vec![
            page_response(&[user(1)], 1, 1),
            page_response(&[user(1), user(2)], 1, 1),
            Ok(response(201, &[], &created)),
            Ok(response(204, &[], "")),
        ]);
        let store = store(&script);
        assert!(store.bootstrap().await);

        let doomed = user(1);
        let (created_ok, deleted_ok) = tokio::join!(
            store.create("user 3", "user3@example.com", "male", "active"),
            store.delete(&doomed),
        );

        assert!(created_ok);
        assert!(deleted_ok);
        assert_eq!(store.snapshot().users, vec![user(2), user(3)]);
    }

    #[tokio::test]
    async fn back_to_back_load_previous_fetches_once() {
        let script = Scripted::new(vec![
            page_response(&[user(1)], 5, 1),
            page_response(&[user(9)], 5, 5),
            page_response(&[user(7), user(8)], 5, 4),
            page_response(&[user(5), user(6)], 5, 3),
        ]);
        let store = store(&script);
        assert!(store.bootstrap().await);

        let (first, second) = tokio::join!(store.load_previous(), store.load_previous());

        assert!(first);
        assert!(!second);
        assert_eq!(
            script.paths(),
            vec![page_path(1), page_path(5), page_path(4)]
        );
        let state = store.snapshot();
        assert_eq!(state.current_page, 4);
        assert_eq!(state.users, vec![user(7), user(8), user(9)]);
    }

    #[tokio::test]
    async fn back_to_back_load_more_from_clones_fetches_once() {
        let script = Scripted::new(vec![
            page_response(&[user(1)], 3, 1),
            page_response(&[user(5)], 3, 3),
            page_response(&[user(3), user(4)], 3, 2),
            page_response(&[user(5)], 3, 3),
            page_response(&[user(5)], 3, 3),
        ]);
        let store = store(&script);
        assert!(store.bootstrap().await);
        assert!(store.load_previous().await);

        let other = store.clone();
        let (first, second) = tokio::join!(store.load_more(), other.load_more());

        assert!(first);
        assert!(!second);
        assert_eq!(script.requests().len(), 4);
        assert_eq!(store.snapshot().current_page, 3);

        // the flag is released once the first load finishes
        assert!(!store.load_more().await);
        assert!(store.load_previous().await);
    }

    #[tokio::test]
    async fn failed_load_releases_pending_flag() {
        let script = Scripted::new(vec![
            page_response(&[user(1)], 3, 1),
            page_response(&[user(5)], 3, 3),
            Err(TransportError::Connection("offline".to_string())),
            page_response(&[user(3), user(4)], 3, 2),
        ]);
        let store = store(&script);
        assert!(store.bootstrap().await);

        assert!(!store.load_previous().await);
        assert!(store.load_previous().await);
        assert_eq!(store.snapshot().current_page, 2);
    }
}

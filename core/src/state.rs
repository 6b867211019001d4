//! Accumulated list state and the reducer that advances it.
//!
//! # Design
//! `ListState` is an immutable value. `reduce` consumes the current state
//! and a `ListEvent` and returns the next state; it is the only place where
//! the list, the page cursor, or the status change. The async store feeds it
//! events as requests start and finish.
//!
//! The page cursor moves only on `PageLoaded`, i.e. after a fetch succeeded.
//! Errors never clear the list.

use crate::error::{ApiError, CreateUserError};
use crate::types::{User, UserPage, ValidationErrors};

/// Status of the list surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadStatus {
    #[default]
    Idle,
    Loading,
    Success,
    Error(ApiError),
}

impl LoadStatus {
    pub fn is_loading(self) -> bool {
        matches!(self, LoadStatus::Loading)
    }

    pub fn error(self) -> Option<ApiError> {
        match self {
            LoadStatus::Error(kind) => Some(kind),
            _ => None,
        }
    }
}

/// Where a freshly loaded page goes relative to the users already held.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Replace,
    Append,
    Prepend,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListState {
    pub users: Vec<User>,
    pub current_page: u32,
    pub total_pages: u32,
    pub status: LoadStatus,
    /// Populated only by a failed create; cleared when the next create starts.
    pub validation_errors: ValidationErrors,
}

impl Default for ListState {
    fn default() -> Self {
        Self {
            users: Vec::new(),
            current_page: 1,
            total_pages: 1,
            status: LoadStatus::Idle,
            validation_errors: ValidationErrors::new(),
        }
    }
}

impl ListState {
    /// Page a "load more" should fetch, or `None` when a load is in flight
    /// or the cursor is already on the last page.
    pub fn next_page(&self) -> Option<u32> {
        if self.status.is_loading() || self.current_page >= self.total_pages {
            None
        } else {
            Some(self.current_page + 1)
        }
    }

    /// Page a "load previous" should fetch, or `None` when a load is in
    /// flight or the cursor is on page 1.
    pub fn previous_page(&self) -> Option<u32> {
        if self.status.is_loading() || self.current_page <= 1 {
            None
        } else {
            Some(self.current_page - 1)
        }
    }

    pub fn is_last_page(&self) -> bool {
        self.current_page >= self.total_pages
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListEvent {
    LoadStarted,
    /// `page` is the page that was requested; the cursor moves there.
    PageLoaded {
        page: u32,
        result: UserPage,
        placement: Placement,
    },
    LoadFailed(ApiError),
    CreateStarted,
    UserCreated(User),
    CreateFailed(CreateUserError),
    DeleteStarted,
    UserDeleted(User),
    DeleteFailed(ApiError),
}

pub fn reduce(state: ListState, event: ListEvent) -> ListState {
    match event {
        ListEvent::LoadStarted | ListEvent::DeleteStarted => ListState {
            status: LoadStatus::Loading,
            ..state
        },

        ListEvent::PageLoaded {
            page,
            result,
            placement,
        } => {
            let users = match placement {
                Placement::Replace => result.users,
                Placement::Append => {
                    let mut users = state.users;
                    users.extend(result.users);
                    users
                }
                Placement::Prepend => {
                    let mut users = result.users;
                    users.extend(state.users);
                    users
                }
            };
            ListState {
                users,
                current_page: page,
                total_pages: result.total_pages,
                status: LoadStatus::Success,
                ..state
            }
        }

        ListEvent::LoadFailed(kind) | ListEvent::DeleteFailed(kind) => ListState {
            status: LoadStatus::Error(kind),
            ..state
        },

        ListEvent::CreateStarted => ListState {
            status: LoadStatus::Loading,
            validation_errors: ValidationErrors::new(),
            ..state
        },

        ListEvent::UserCreated(user) => {
            let mut users = state.users;
            users.push(user);
            ListState {
                users,
                status: LoadStatus::Success,
                ..state
            }
        }

        ListEvent::CreateFailed(err) => ListState {
            status: LoadStatus::Error(err.kind),
            validation_errors: err.validation,
            ..state
        },

        ListEvent::UserDeleted(user) => {
            let mut users = state.users;
            // overlapping page fetches can leave stale copies behind
            users.retain(|u| u.id != user.id);
            ListState {
                users,
                status: LoadStatus::Success,
                ..state
            }
        }
    }
}

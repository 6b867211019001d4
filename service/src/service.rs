//! Async users API: build with the core client, execute over a transport,
//! parse with the core client.

use userlist_core::{
    ApiError, CreateUser, CreateUserError, HttpRequest, HttpResponse, User, UserClient, UserPage,
};

use crate::config::Config;
use crate::error::ConfigError;
use crate::transport::{ReqwestTransport, Retrying, Transport};

/// The transport stack used outside of tests.
pub type DefaultTransport = Retrying<ReqwestTransport>;

pub struct UserService<T> {
    client: UserClient,
    transport: T,
}

impl UserService<DefaultTransport> {
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let token = config.api_token()?;
        let transport = Retrying::new(ReqwestTransport::from_config(config)?, config.retry_policy());
        Ok(Self::new(UserClient::new(&config.base_url, &token), transport))
    }
}

impl<T: Transport> UserService<T> {
    pub fn new(client: UserClient, transport: T) -> Self {
        Self { client, transport }
    }

    /// Fetch one page. Pages are 1-based; page 0 is rejected without a
    /// request.
    pub async fn list_users(&self, page: u32) -> Result<UserPage, ApiError> {
        if page == 0 {
            return Err(ApiError::BadRequest);
        }
        let response = self.send(self.client.build_list_users(page)).await?;
        self.client.parse_list_users(response)
    }

    pub async fn create_user(&self, input: &CreateUser) -> Result<User, CreateUserError> {
        let request = self.client.build_create_user(input)?;
        let response = self.send(request).await?;
        self.client.parse_create_user(response)
    }

    pub async fn delete_user(&self, id: i64) -> Result<bool, ApiError> {
        let response = self.send(self.client.build_delete_user(id)).await?;
        self.client.parse_delete_user(response)
    }

    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        let method = request.method;
        tracing::debug!(%method, path = %request.path, "sending request");
        match self.transport.execute(request).await {
            Ok(response) => {
                tracing::debug!(%method, status = response.status, "received response");
                Ok(response)
            }
            Err(err) => {
                tracing::warn!(%method, error = %err, "request failed without a response");
                Err(ApiError::Unknown)
            }
        }
    }
}

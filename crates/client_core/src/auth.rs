use std::sync::Arc;

use chrono::NaiveDateTime;
use shared::{
    domain::UserId,
    error::{ApiError, ErrorCode},
    protocol::{CaptchaChallenge, LoginRequest, LoginResponse, UserInfo},
};
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::{transport::ApiClient, ClientEvent};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUser {
    pub id: UserId,
    pub username: String,
    pub full_name: Option<String>,
    pub is_admin: bool,
    pub last_login: Option<NaiveDateTime>,
}

impl From<&LoginResponse> for SessionUser {
    fn from(value: &LoginResponse) -> Self {
        Self {
            id: value.user_id,
            username: value.username.clone(),
            full_name: value.full_name.clone(),
            is_admin: value.is_admin,
            last_login: value.last_login,
        }
    }
}

impl From<UserInfo> for SessionUser {
    fn from(value: UserInfo) -> Self {
        Self {
            id: value.id,
            username: value.username,
            full_name: value.full_name,
            is_admin: value.is_admin,
            last_login: value.last_login,
        }
    }
}

/// Login state on top of the token store shared with [`ApiClient`].
pub struct AuthSession {
    api: Arc<ApiClient>,
    user: RwLock<Option<SessionUser>>,
}

impl AuthSession {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self {
            api,
            user: RwLock::new(None),
        }
    }

    pub async fn current_user(&self) -> Option<SessionUser> {
        self.user.read().await.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.user.read().await.is_some()
    }

    pub async fn captcha(&self) -> Result<CaptchaChallenge, ApiError> {
        self.api.captcha().await
    }

    pub async fn login(&self, credentials: &LoginRequest) -> Result<SessionUser, ApiError> {
        let response = match self.api.login(credentials).await {
            Ok(response) => response,
            Err(err) => {
                self.user.write().await.take();
                return Err(err);
            }
        };

        self.api.tokens().save(&response.access_token).map_err(|err| {
            ApiError::new(
                ErrorCode::Internal,
                format!("failed to persist session token: {err:#}"),
            )
        })?;

        let user = SessionUser::from(&response);
        *self.user.write().await = Some(user.clone());
        info!(user_id = user.id.0, username = %user.username, "session: logged in");
        self.api.emit(ClientEvent::LoggedIn {
            user_id: user.id,
            username: user.username.clone(),
        });
        Ok(user)
    }

    /// Validates the stored token against the server. Without a token, or on
    /// any failure, the session is cleared and `false` is returned.
    pub async fn check_auth(&self) -> bool {
        if self.api.tokens().load().is_none() {
            self.user.write().await.take();
            return false;
        }

        match self.api.current_user().await {
            Ok(info) => {
                *self.user.write().await = Some(SessionUser::from(info));
                true
            }
            Err(err) => {
                warn!(code = ?err.code, "session: stored token rejected: {err}");
                if let Err(clear_err) = self.api.tokens().clear() {
                    warn!("session: failed to clear token: {clear_err:#}");
                }
                self.user.write().await.take();
                false
            }
        }
    }

    pub async fn logout(&self) {
        if let Err(err) = self.api.tokens().clear() {
            warn!("session: failed to clear token: {err:#}");
        }
        self.user.write().await.take();
        self.api.emit(ClientEvent::LoggedOut);
    }
}

#[cfg(test)]
#[path = "tests/auth_tests.rs"]
mod tests;

use tokio::sync::RwLock;

use nevu_api::traits::AccountService;
use nevu_core::models::UserData;

/// The plex.tv account the session is logged in as.
pub struct SessionStore<A> {
    service: A,
    user: RwLock<Option<UserData>>,
}

impl<A: AccountService> SessionStore<A> {
    pub fn new(service: A) -> Self {
        Self {
            service,
            user: RwLock::new(None),
        }
    }

    /// Load the account. A failure clears the stored user.
    pub async fn load_user(&self) -> Option<UserData> {
        let user = match self.service.get_logged_in_user().await {
            Ok(user) => {
                tracing::info!(username = %user.username, "logged in");
                Some(user)
            }
            Err(e) => {
                tracing::warn!("Failed to load account: {e}");
                None
            }
        };
        *self.user.write().await = user.clone();
        user
    }

    pub async fn user(&self) -> Option<UserData> {
        self.user.read().await.clone()
    }

    pub async fn auth_token(&self) -> Option<String> {
        self.user.read().await.as_ref().map(|u| u.auth_token.clone())
    }
}

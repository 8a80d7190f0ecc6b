//! Account stub: mock phone/OTP authentication.
//!
//! Nothing is verified: any six-digit code logs the visitor in. The stub
//! only simulates backend latency and remembers the signed-in user in a
//! local store.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::error::AccountError;

use super::model::{DEFAULT_USER_NAME, User, validate_otp, validate_phone};
use super::store::AccountStore;

/// Mock credential holder.
pub struct AccountStub {
    store: Arc<dyn AccountStore>,
    latency: Duration,
    user: RwLock<Option<User>>,
}

impl AccountStub {
    pub fn new(store: Arc<dyn AccountStore>, latency: Duration) -> Self {
        Self {
            store,
            latency,
            user: RwLock::new(None),
        }
    }

    /// Load a previously signed-in user. A corrupt entry is discarded.
    pub async fn restore(&self) -> Result<Option<User>, AccountError> {
        let Some(json) = self.store.load().await? else {
            return Ok(None);
        };

        match serde_json::from_str::<User>(&json) {
            Ok(user) => {
                info!(user_id = %user.id, "Restored signed-in user");
                *self.user.write().await = Some(user.clone());
                Ok(Some(user))
            }
            Err(e) => {
                warn!(error = %e, "Failed to parse stored user data");
                self.store.clear().await?;
                Ok(None)
            }
        }
    }

    /// Pretend to send a one-time code.
    pub async fn request_otp(&self, phone: &str) -> Result<(), AccountError> {
        let phone = validate_phone(phone)?;
        info!(phone = %phone, "Requesting OTP");
        self.simulate_latency().await;
        info!(phone = %phone, "OTP sent");
        Ok(())
    }

    /// Sign in with any six-digit code.
    pub async fn login(&self, phone: &str, otp: &str) -> Result<User, AccountError> {
        let phone = validate_phone(phone)?;
        info!(phone = %phone, "Logging in");
        self.simulate_latency().await;
        validate_otp(otp)?;

        let user = User::new(DEFAULT_USER_NAME, phone);
        self.set_user(user.clone()).await?;
        info!(user_id = %user.id, "Login successful");
        Ok(user)
    }

    /// Register a new account.
    pub async fn signup(&self, name: &str, phone: &str) -> Result<User, AccountError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AccountError::EmptyName);
        }
        let phone = validate_phone(phone)?;
        info!(name = %name, phone = %phone, "Signing up");
        self.simulate_latency().await;

        let user = User::new(name, phone);
        self.set_user(user.clone()).await?;
        info!(user_id = %user.id, "Registration successful");
        Ok(user)
    }

    /// Forget the signed-in user.
    pub async fn logout(&self) -> Result<(), AccountError> {
        let previous = self.user.write().await.take();
        self.store.clear().await?;
        if let Some(user) = previous {
            info!(user_id = %user.id, "Logged out");
        }
        Ok(())
    }

    pub async fn current(&self) -> Option<User> {
        self.user.read().await.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.user.read().await.is_some()
    }

    async fn set_user(&self, user: User) -> Result<(), AccountError> {
        let json = serde_json::to_string(&user)?;
        self.store.save(&json).await?;
        *self.user.write().await = Some(user);
        Ok(())
    }

    async fn simulate_latency(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::store::{JsonFileStore, MemoryStore};

    fn stub(store: Arc<dyn AccountStore>) -> AccountStub {
        AccountStub::new(store, Duration::ZERO)
    }

    #[tokio::test]
    async fn login_with_six_digits_creates_user() {
        let store = Arc::new(MemoryStore::new());
        let accounts = stub(Arc::clone(&store) as Arc<dyn AccountStore>);

        let user = accounts.login("5551234567", "123456").await.unwrap();
        assert_eq!(user.name, "User");
        assert_eq!(user.phone, "5551234567");
        assert!(accounts.is_authenticated().await);
        assert_eq!(accounts.current().await, Some(user.clone()));

        let stored: User = serde_json::from_str(&store.load().await.unwrap().unwrap()).unwrap();
        assert_eq!(stored, user);
    }

    #[tokio::test]
    async fn login_with_bad_code_fails() {
        let accounts = stub(Arc::new(MemoryStore::new()));
        let err = accounts.login("5551234567", "12345").await.unwrap_err();
        assert!(matches!(err, AccountError::InvalidOtp));
        assert!(!accounts.is_authenticated().await);
    }

    #[tokio::test]
    async fn short_phone_is_rejected() {
        let accounts = stub(Arc::new(MemoryStore::new()));
        assert!(matches!(
            accounts.request_otp("12345").await,
            Err(AccountError::InvalidPhone(_))
        ));
        assert!(accounts.request_otp("5551234567").await.is_ok());
    }

    #[tokio::test]
    async fn signup_uses_given_name() {
        let accounts = stub(Arc::new(MemoryStore::new()));
        let user = accounts.signup("  Dana Reyes ", "5551234567").await.unwrap();
        assert_eq!(user.name, "Dana Reyes");
        assert!(matches!(
            accounts.signup("   ", "5551234567").await,
            Err(AccountError::EmptyName)
        ));
    }

    #[tokio::test]
    async fn logout_clears_user_and_store() {
        let store = Arc::new(MemoryStore::new());
        let accounts = stub(Arc::clone(&store) as Arc<dyn AccountStore>);
        accounts.login("5551234567", "654321").await.unwrap();

        accounts.logout().await.unwrap();
        assert!(!accounts.is_authenticated().await);
        assert_eq!(store.load().await.unwrap(), None);
    }

    #[tokio::test]
    async fn restore_reads_previous_login_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("user.json");

        let first = stub(Arc::new(JsonFileStore::new(&path)));
        let user = first.signup("Dana", "5551234567").await.unwrap();

        let second = stub(Arc::new(JsonFileStore::new(&path)));
        assert!(!second.is_authenticated().await);
        assert_eq!(second.restore().await.unwrap(), Some(user));
        assert!(second.is_authenticated().await);
    }

    #[tokio::test]
    async fn corrupt_entry_is_discarded() {
        let store = Arc::new(MemoryStore::with_value("{not json"));
        let accounts = stub(Arc::clone(&store) as Arc<dyn AccountStore>);

        assert_eq!(accounts.restore().await.unwrap(), None);
        assert_eq!(store.load().await.unwrap(), None);
    }

    #[tokio::test]
    async fn restore_with_empty_store() {
        let accounts = stub(Arc::new(MemoryStore::new()));
        assert_eq!(accounts.restore().await.unwrap(), None);
    }
}

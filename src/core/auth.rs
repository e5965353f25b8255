use crate::domain::model::Role;
use crate::domain::ports::Storage;
use crate::utils::error::{Result, TrackerError};

pub const DEFAULT_SECRET: &str = "admin";

/// Local, advisory admin switch for a shared classroom device.
///
/// The secret lives in clear text next to the data it guards. It keeps
/// accidental clicks out, nothing more.
#[derive(Debug, Clone)]
pub struct AccessGate {
    role: Role,
    secret: String,
    secret_key: String,
}

impl AccessGate {
    pub fn new(secret_key: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            role: Role::Guest,
            secret: secret.into(),
            secret_key: secret_key.into(),
        }
    }

    /// 讀取密碼欄位，沒有就用預設值
    pub async fn load<S: Storage>(storage: &S, secret_key: &str, default_secret: &str) -> Result<Self> {
        let secret = match storage.read_slot(secret_key).await? {
            Some(bytes) => match String::from_utf8(bytes) {
                Ok(s) if !s.is_empty() => s,
                _ => {
                    tracing::warn!("⚠️ Stored admin secret is unreadable, using the default");
                    default_secret.to_string()
                }
            },
            None => default_secret.to_string(),
        };
        Ok(Self::new(secret_key, secret))
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn login(&mut self, attempt: &str) -> Result<()> {
        if attempt == self.secret {
            self.role = Role::Admin;
            tracing::info!("🔓 Admin mode enabled");
            Ok(())
        } else {
            tracing::info!("Admin login rejected");
            Err(TrackerError::AuthError {
                message: "Incorrect password.".to_string(),
            })
        }
    }

    pub fn logout(&mut self) {
        self.role = Role::Guest;
    }

    /// Returns `Ok(false)` for guests without touching anything.
    pub async fn change_secret<S: Storage>(
        &mut self,
        storage: &S,
        current: &str,
        new_secret: &str,
    ) -> Result<bool> {
        if !self.is_admin() {
            tracing::debug!("Secret change refused for guest");
            return Ok(false);
        }
        if current != self.secret {
            return Err(TrackerError::AuthError {
                message: "Incorrect current password.".to_string(),
            });
        }
        if new_secret.trim().is_empty() {
            return Err(TrackerError::ValidationError {
                message: "Password cannot be empty.".to_string(),
            });
        }
        storage.write_slot(&self.secret_key, new_secret.as_bytes()).await?;
        self.secret = new_secret.to_string();
        tracing::info!("🔑 Admin password changed");
        Ok(true)
    }
}

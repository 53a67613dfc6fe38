use crate::error::{FolioError, Result};
use crate::storage::{LocalStorage, AUTH_KEY, SESSION_TOKEN_KEY};

/// Header carrying the shared secret for the content proxy.
pub const CONSOLE_TOKEN_HEADER: &str = "x-aisa-console-token";
/// Header carrying the shared secret for the builder proxies.
pub const ADMIN_TOKEN_HEADER: &str = "x-aisa-admin-token";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    /// Any non-empty credentials unlock the console. Nothing is checked.
    Cosmetic,
    /// The secret is kept as the session token and sent to the proxies,
    /// which are the ones that actually check it.
    Token,
}

/// Local "authed" flag plus the session token. Not an authentication
/// system: it only gates the console UI.
pub struct AuthGate<'a> {
    storage: &'a LocalStorage,
}

impl<'a> AuthGate<'a> {
    pub fn new(storage: &'a LocalStorage) -> Self {
        AuthGate { storage }
    }

    pub fn is_authed(&self) -> bool {
        matches!(self.storage.get_item(AUTH_KEY), Ok(Some(v)) if v == "1")
    }

    pub fn login(&self, user: &str, secret: &str, mode: AuthMode) -> Result<()> {
        if user.trim().is_empty() || secret.is_empty() {
            return Err(FolioError::Auth("User and password are required".into()));
        }
        if mode == AuthMode::Token {
            self.set_token(secret)?;
        }
        self.storage.set_item(AUTH_KEY, "1")?;
        log::info!("Console unlocked for '{}'", user.trim());
        Ok(())
    }

    /// Clear the flag and the session token.
    pub fn logout(&self) -> Result<()> {
        self.storage.remove_item(AUTH_KEY)?;
        self.storage.remove_item(SESSION_TOKEN_KEY)
    }

    pub fn token(&self) -> Result<Option<String>> {
        self.storage.get_item(SESSION_TOKEN_KEY)
    }

    pub fn set_token(&self, token: &str) -> Result<()> {
        self.storage.set_item(SESSION_TOKEN_KEY, token.trim())
    }
}

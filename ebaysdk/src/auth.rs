//! Credential collaborators.
//!
//! The SDK never acquires OAuth tokens itself. REST calls ask a
//! [`TokenProvider`] for a bearer token right before the request is built, so
//! providers are free to cache, refresh or rotate tokens however they like.
//!
//! # Examples
//!
//! ```
//! use ebaysdk::auth::{StaticToken, TokenProvider};
//!
//! let provider = StaticToken::new("v^1.1#i^1#p^1");
//! assert_eq!(provider.access_token()?, "v^1.1#i^1#p^1");
//! # Ok::<(), ebaysdk::EbayError>(())
//! ```

use std::fmt;

use crate::error::{EbayError, Result};

/// Supplies OAuth access tokens.
pub trait TokenProvider: Send + Sync + fmt::Debug {
    /// Returns a currently valid access token.
    ///
    /// # Errors
    ///
    /// Returns [`EbayError::Auth`] when no token can be produced.
    fn access_token(&self) -> Result<String>;
}

/// A fixed token, e.g. one minted by an external OAuth flow.
#[derive(Clone)]
pub struct StaticToken(String);

impl StaticToken {
    /// Wraps a token.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

impl fmt::Debug for StaticToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("StaticToken").field(&"<redacted>").finish()
    }
}

impl TokenProvider for StaticToken {
    fn access_token(&self) -> Result<String> {
        if self.0.trim().is_empty() {
            return Err(EbayError::Auth("static token is empty".to_owned()));
        }
        Ok(self.0.clone())
    }
}

use chrono::{DateTime, Utc};

use crate::store::StoredConfig;

/// OAuth token plus the short-lived IAM access token derived from it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub oauth_token: String,
    pub access_token: String,
    pub access_token_expiry: Option<DateTime<Utc>>,
}

impl Credentials {
    pub fn from_stored(stored: &StoredConfig) -> Self {
        Self {
            oauth_token: stored.oauth_token.clone(),
            access_token: stored.iam_token.clone(),
            access_token_expiry: stored.iam_token_expire,
        }
    }

    /// Copy the token fields into a stored document, leaving the folder alone.
    pub fn write_into(&self, stored: &mut StoredConfig) {
        stored.oauth_token = self.oauth_token.clone();
        stored.iam_token = self.access_token.clone();
        stored.iam_token_expire = self.access_token_expiry;
    }

    /// An empty token is always expired; otherwise valid strictly before the expiry.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        if self.access_token.is_empty() {
            return true;
        }
        match self.access_token_expiry {
            Some(expiry) => now >= expiry,
            None => true,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

//! This module defines the `PortalToken` structure returned by `generateToken` when trading a
//! username and password.
//!
//! Tokens are never stored: one is obtained per run and refused once expired.
//!

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Expirable;

/// Access token derived from username/password
///
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq, Serialize)]
pub struct PortalToken {
    /// The actual token
    pub token: String,
    /// Expiration date in milliseconds since the epoch
    pub expires: i64,
    /// Whether the portal wants every request over https
    #[serde(default)]
    pub ssl: bool,
    /// Who we got it for, filled by the client
    #[serde(skip)]
    pub username: String,
}

impl Expirable for PortalToken {
    #[inline]
    fn is_expired(&self) -> bool {
        Utc::now().timestamp_millis() > self.expires
    }

    #[inline]
    fn key(&self) -> String {
        self.username.clone()
    }
}

impl PortalToken {
    /// Expiration as a date, if it makes sense
    ///
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.expires)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::Duration;

    #[test]
    fn test_token_decode() {
        let data = r##"{"token":"FOOBAR","expires":1700000000000,"ssl":true}"##;
        let t: PortalToken = serde_json::from_str(data).unwrap();

        assert_eq!("FOOBAR", t.token);
        assert!(t.ssl);
        assert!(t.is_expired());
        assert_eq!(1700000000, t.expires_at().unwrap().timestamp());
    }

    #[test]
    fn test_token_not_expired() {
        let t = PortalToken {
            token: "FOOBAR".to_string(),
            expires: (Utc::now() + Duration::minutes(5)).timestamp_millis(),
            ssl: false,
            username: "john".to_string(),
        };
        assert!(!t.is_expired());
        assert_eq!("john", t.key());
    }
}

use axum::http::{HeaderMap, header};

use crate::error::GatewayError;
use crate::rate_limit::{Feature, IdentityRule};

// Set by the auth layer in front of the gateway
pub const USER_HEADER: &str = "x-user-id";
pub const GUEST_COOKIE: &str = "studyai_guest";
const GUEST_COOKIE_MAX_AGE: u64 = 60 * 60 * 24 * 365;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub user_id: Option<String>,
    pub guest_id: String,
    // minted for this request, must be sent back
    pub issued_guest: bool,
}

impl Caller {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let user_id = headers
            .get(USER_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string);

        match cookie_value(headers, GUEST_COOKIE).filter(|id| is_valid_guest_id(id)) {
            Some(guest_id) => Self {
                user_id,
                guest_id,
                issued_guest: false,
            },
            None => Self {
                user_id,
                guest_id: uuid::Uuid::new_v4().to_string(),
                issued_guest: true,
            },
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.user_id.is_some()
    }

    pub fn identity_for(&self, feature: Feature) -> Result<(&str, bool), GatewayError> {
        match (feature.identity_rule(), self.user_id.as_deref()) {
            (IdentityRule::GuestOnly, _) => Ok((self.guest_id.as_str(), false)),
            (IdentityRule::UserOrGuest, Some(user_id)) => Ok((user_id, true)),
            (IdentityRule::UserOrGuest, None) => Ok((self.guest_id.as_str(), false)),
            (IdentityRule::UserOnly, Some(user_id)) => Ok((user_id, true)),
            (IdentityRule::UserOnly, None) => Err(GatewayError::Unauthenticated(feature)),
        }
    }
}

pub fn guest_cookie(guest_id: &str) -> String {
    format!(
        "{GUEST_COOKIE}={guest_id}; Max-Age={GUEST_COOKIE_MAX_AGE}; Path=/; HttpOnly; SameSite=Lax"
    )
}

fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim().to_string())
}

fn is_valid_guest_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= 64
        && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

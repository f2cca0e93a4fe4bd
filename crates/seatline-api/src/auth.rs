// Trusted identity claims
//
// Token verification is an upstream concern: the fronting auth layer
// terminates the credential and forwards `{id, role}` claims as headers.
// This module only parses and trusts them.

use axum::http::HeaderMap;
use uuid::Uuid;

use seatline_core::TicketingError;

pub const USER_HEADER: &str = "x-seatline-user";
pub const ROLE_HEADER: &str = "x-seatline-role";

/// Caller role, as claimed by the fronting auth layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Attendee,
    Organizer,
    Admin,
}

impl From<&str> for Role {
    fn from(s: &str) -> Self {
        match s {
            "organizer" => Role::Organizer,
            "admin" => Role::Admin,
            _ => Role::Attendee,
        }
    }
}

/// Authenticated identity for a request
#[derive(Debug, Clone, Copy)]
pub struct Claims {
    pub user_id: Uuid,
    pub role: Role,
}

impl Claims {
    /// Whether the caller may act for the given organizer's event
    pub fn can_manage(&self, organizer_id: Uuid) -> bool {
        match self.role {
            Role::Admin => true,
            Role::Organizer => self.user_id == organizer_id,
            Role::Attendee => false,
        }
    }
}

/// Parse claims from the trusted headers, if present
pub fn claims_from_headers(headers: &HeaderMap) -> Option<Claims> {
    let user_id = headers
        .get(USER_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| Uuid::parse_str(v).ok())?;
    let role = headers
        .get(ROLE_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(Role::from)
        .unwrap_or(Role::Attendee);
    Some(Claims { user_id, role })
}

/// Parse claims or fail the request
pub fn require_claims(headers: &HeaderMap) -> Result<Claims, TicketingError> {
    claims_from_headers(headers)
        .ok_or_else(|| TicketingError::not_authorized("authentication required"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn parses_user_and_role() {
        let id = Uuid::now_v7();
        let mut headers = HeaderMap::new();
        headers.insert(USER_HEADER, HeaderValue::from_str(&id.to_string()).unwrap());
        headers.insert(ROLE_HEADER, HeaderValue::from_static("organizer"));

        let claims = claims_from_headers(&headers).unwrap();
        assert_eq!(claims.user_id, id);
        assert_eq!(claims.role, Role::Organizer);
    }

    #[test]
    fn missing_user_yields_no_claims() {
        let headers = HeaderMap::new();
        assert!(claims_from_headers(&headers).is_none());
    }

    #[test]
    fn organizer_manages_only_own_events() {
        let organizer = Uuid::now_v7();
        let claims = Claims {
            user_id: organizer,
            role: Role::Organizer,
        };
        assert!(claims.can_manage(organizer));
        assert!(!claims.can_manage(Uuid::now_v7()));

        let admin = Claims {
            user_id: Uuid::now_v7(),
            role: Role::Admin,
        };
        assert!(admin.can_manage(organizer));
    }
}

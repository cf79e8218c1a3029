use crate::error::ApiError;
use axum::http::HeaderMap;
use std::str::FromStr;
use velora_core::identity::{Actor, Role};

/// Identity is an external collaborator: the gateway authenticates the
/// caller and injects these headers. The core trusts them as-is.
const USER_HEADER: &str = "x-user-id";
const ROLE_HEADER: &str = "x-user-role";

pub fn actor_from_headers(headers: &HeaderMap) -> Result<Actor, ApiError> {
    let user_id = headers
        .get(USER_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::Unauthenticated(format!("missing {USER_HEADER} header")))?;

    let role = match headers.get(ROLE_HEADER).and_then(|v| v.to_str().ok()) {
        Some(raw) => Role::from_str(raw).map_err(ApiError::BadRequest)?,
        None => Role::Customer,
    };

    Ok(Actor { user_id: user_id.to_string(), role })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_actor_extraction() {
        let mut headers = HeaderMap::new();
        headers.insert(USER_HEADER, HeaderValue::from_static("guest-7"));
        headers.insert(ROLE_HEADER, HeaderValue::from_static("operator"));

        let actor = actor_from_headers(&headers).unwrap();
        assert_eq!(actor.user_id, "guest-7");
        assert_eq!(actor.role, Role::Operator);
    }

    #[test]
    fn test_role_defaults_to_customer() {
        let mut headers = HeaderMap::new();
        headers.insert(USER_HEADER, HeaderValue::from_static("guest-7"));

        let actor = actor_from_headers(&headers).unwrap();
        assert_eq!(actor.role, Role::Customer);
    }

    #[test]
    fn test_missing_user_rejected() {
        let headers = HeaderMap::new();
        assert!(matches!(
            actor_from_headers(&headers),
            Err(ApiError::Unauthenticated(_))
        ));
    }
}

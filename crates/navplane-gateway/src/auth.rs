//! Bearer-token auth for the HTTP surface (spec.md §6/§9: the gateway is
//! expected to sit behind a bearer token when exposed beyond localhost).
//! Grounded in the teacher's `agenticlaw-gateway::auth` constant-time
//! comparison, with the config type made gateway-local since no
//! `AuthConfig`/`AuthMode` equivalent exists in `navplane_core`.

use navplane_core::{Error, Result};

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

/// Whether the gateway requires a bearer token on every request.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AuthMode {
    None,
    Token,
}

#[derive(Clone, Debug)]
pub struct GatewayAuth {
    mode: AuthMode,
    token: Option<String>,
}

impl GatewayAuth {
    pub fn none() -> Self {
        Self { mode: AuthMode::None, token: None }
    }

    pub fn token(token: impl Into<String>) -> Self {
        Self { mode: AuthMode::Token, token: Some(token.into()) }
    }

    /// `None` disables auth; `Some(token)` requires an exact bearer match.
    pub fn from_optional_token(token: Option<String>) -> Self {
        match token {
            Some(t) => Self::token(t),
            None => Self::none(),
        }
    }

    pub fn verify(&self, provided: Option<&str>) -> Result<()> {
        match self.mode {
            AuthMode::None => Ok(()),
            AuthMode::Token => {
                let expected = self.token.as_deref().ok_or_else(|| Error::auth_failed("no token configured"))?;
                let provided = provided.ok_or_else(|| Error::auth_failed("missing bearer token"))?;
                if !constant_time_eq(expected.as_bytes(), provided.as_bytes()) {
                    return Err(Error::auth_failed("invalid bearer token"));
                }
                Ok(())
            }
        }
    }
}

/// Pulls the bearer token out of an `Authorization: Bearer <token>` header value.
pub fn bearer_token(header_value: Option<&str>) -> Option<&str> {
    header_value.and_then(|v| v.strip_prefix("Bearer "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_mode_requires_exact_match() {
        let auth = GatewayAuth::token("test-token-123");
        assert!(auth.verify(Some("test-token-123")).is_ok());
        assert!(auth.verify(Some("wrong-token")).is_err());
        assert!(auth.verify(None).is_err());
    }

    #[test]
    fn none_mode_always_passes() {
        let auth = GatewayAuth::none();
        assert!(auth.verify(None).is_ok());
        assert!(auth.verify(Some("anything")).is_ok());
    }

    #[test]
    fn bearer_token_strips_prefix() {
        assert_eq!(bearer_token(Some("Bearer abc123")), Some("abc123"));
        assert_eq!(bearer_token(Some("abc123")), None);
        assert_eq!(bearer_token(None), None);
    }
}

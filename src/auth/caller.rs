// src/auth/caller.rs
use crate::errors::ServerError;
use astra::Request;
use base64::Engine;
use serde::Deserialize;

/// Display name used when the app runs without sign-in.
pub const LOCAL_USER: &str = "Local User";

/// Who is making the request, and the token they presented.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    /// Raw bearer token (a Microsoft identity access token for this API).
    pub token: Option<String>,
    pub display_name: String,
}

#[derive(Deserialize)]
struct Claims {
    name: Option<String>,
    preferred_username: Option<String>,
}

impl Caller {
    pub fn local() -> Self {
        Self {
            token: None,
            display_name: LOCAL_USER.to_string(),
        }
    }

    /// Reads `Authorization: Bearer ...`.
    ///
    /// With `require_token`, a missing token is a 401; otherwise the caller
    /// falls back to the local user.
    pub fn from_request(req: &Request, require_token: bool) -> Result<Self, ServerError> {
        let token = req
            .headers()
            .get("Authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty());

        match token {
            Some(token) => Ok(Self {
                token: Some(token.to_string()),
                display_name: display_name_from_jwt(token).unwrap_or_else(|| LOCAL_USER.to_string()),
            }),
            None if require_token => Err(ServerError::Unauthorized("sign-in required".into())),
            None => Ok(Self::local()),
        }
    }

    pub fn bearer(&self) -> Result<&str, ServerError> {
        self.token
            .as_deref()
            .ok_or_else(|| ServerError::Unauthorized("sign-in required".into()))
    }
}

/// Pulls a display name out of a JWT's payload.
///
/// The signature is not checked here; Graph validates the token when it is
/// exchanged on-behalf-of.
pub fn display_name_from_jwt(token: &str) -> Option<String> {
    let payload = token.split('.').nth(1)?;
    let bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .ok()?;
    let claims: Claims = serde_json::from_slice(&bytes).ok()?;

    claims
        .name
        .or(claims.preferred_username)
        .filter(|n| !n.trim().is_empty())
}

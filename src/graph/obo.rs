// src/graph/obo.rs

use crate::errors::ServerError;
use crate::graph::client::upstream_error;
use reqwest::blocking::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

pub const GRAPH_SCOPE: &str = "https://graph.microsoft.com/.default";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

// Tokens are refreshed this long before Azure says they expire.
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: Option<u64>,
}

struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

/// Swaps a caller's API token for a Graph token (OAuth 2.0 on-behalf-of).
pub struct OboExchanger {
    tenant_id: String,
    client_id: String,
    client_secret: String,
    client: Client,
    cache: Mutex<HashMap<String, CachedToken>>,
}

impl OboExchanger {
    pub fn new(tenant_id: String, client_id: String, client_secret: String, client: Client) -> Self {
        Self {
            tenant_id,
            client_id,
            client_secret,
            client,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn token_endpoint(&self) -> String {
        format!(
            "https://login.microsoftonline.com/{}/oauth2/v2.0/token",
            self.tenant_id
        )
    }

    fn form<'a>(&'a self, assertion: &'a str) -> [(&'static str, &'a str); 6] {
        [
            ("grant_type", JWT_BEARER_GRANT),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("assertion", assertion),
            ("scope", GRAPH_SCOPE),
            ("requested_token_use", "on_behalf_of"),
        ]
    }

    fn cached(&self, user_token: &str) -> Option<String> {
        let cache = self.cache.lock().ok()?;
        cache
            .get(user_token)
            .filter(|t| t.expires_at > Instant::now())
            .map(|t| t.access_token.clone())
    }

    /// A Graph access token for the user behind `user_token`.
    pub fn exchange(&self, user_token: &str) -> Result<String, ServerError> {
        if let Some(token) = self.cached(user_token) {
            return Ok(token);
        }

        let response = self
            .client
            .post(self.token_endpoint())
            .form(&self.form(user_token))
            .send()
            .map_err(|e| ServerError::Upstream {
                status: 502,
                message: format!("token request failed: {e}"),
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().unwrap_or_else(|_| "(no body)".to_string());
            log::warn!("on-behalf-of exchange rejected: {status}");
            // An assertion Azure refuses means the caller has to sign in again.
            let status = if status.as_u16() == 400 { 401 } else { status.as_u16() };
            return Err(upstream_error(status, &text));
        }

        let token: TokenResponse = response.json().map_err(|e| ServerError::Upstream {
            status: 502,
            message: format!("unreadable token response: {e}"),
        })?;

        let lifetime = Duration::from_secs(token.expires_in.unwrap_or(3600));
        if let Ok(mut cache) = self.cache.lock() {
            cache.retain(|_, t| t.expires_at > Instant::now());
            cache.insert(
                user_token.to_string(),
                CachedToken {
                    access_token: token.access_token.clone(),
                    expires_at: Instant::now() + lifetime.saturating_sub(EXPIRY_MARGIN),
                },
            );
        }

        log::debug!("exchanged caller token for a Graph token");
        Ok(token.access_token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exchanger() -> OboExchanger {
        OboExchanger::new("tenant-1".into(), "client-1".into(), "shh".into(), Client::new())
    }

    #[test]
    fn token_endpoint_uses_tenant() {
        assert_eq!(
            exchanger().token_endpoint(),
            "https://login.microsoftonline.com/tenant-1/oauth2/v2.0/token"
        );
    }

    #[test]
    fn form_carries_on_behalf_of_grant() {
        let ex = exchanger();
        let form: HashMap<_, _> = ex.form("user-jwt").into_iter().collect();
        assert_eq!(form["grant_type"], "urn:ietf:params:oauth:grant-type:jwt-bearer");
        assert_eq!(form["assertion"], "user-jwt");
        assert_eq!(form["requested_token_use"], "on_behalf_of");
        assert_eq!(form["scope"], GRAPH_SCOPE);
        assert_eq!(form["client_id"], "client-1");
    }

    #[test]
    fn cached_tokens_are_reused_until_expiry() {
        let ex = exchanger();
        {
            let mut cache = ex.cache.lock().unwrap();
            cache.insert(
                "fresh".into(),
                CachedToken {
                    access_token: "graph-1".into(),
                    expires_at: Instant::now() + Duration::from_secs(300),
                },
            );
            cache.insert(
                "stale".into(),
                CachedToken {
                    access_token: "graph-0".into(),
                    expires_at: Instant::now() - Duration::from_secs(1),
                },
            );
        }
        assert_eq!(ex.exchange("fresh").unwrap(), "graph-1");
        assert_eq!(ex.cached("stale"), None);
    }
}

//! Service-to-service credentials.
//!
//! A calling service presents its name and a shared token. A verified caller
//! becomes a service-account principal acting on behalf of the original user
//! it forwards, if any.

use std::collections::HashMap;

use subtle::ConstantTimeEq;

/// Checks a `(service name, token)` pair presented by a calling service.
pub trait ServiceTokenVerifier: Send + Sync {
    fn verify(&self, service_name: &str, token: &str) -> bool;
}

/// Fixed table of service tokens, typically loaded once at startup.
#[derive(Default, Clone)]
pub struct StaticServiceTokens {
    tokens: HashMap<String, String>,
}

impl std::fmt::Debug for StaticServiceTokens {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut services: Vec<&str> = self.tokens.keys().map(String::as_str).collect();
        services.sort_unstable();
        f.debug_struct("StaticServiceTokens")
            .field("services", &services)
            .finish()
    }
}

impl StaticServiceTokens {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `token` for `service_name`. Blank names or tokens are ignored.
    pub fn with(mut self, service_name: impl Into<String>, token: impl Into<String>) -> Self {
        let (name, token) = (service_name.into(), token.into());
        let (name, token) = (name.trim(), token.trim());
        if !name.is_empty() && !token.is_empty() {
            self.tokens.insert(name.to_string(), token.to_string());
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Parse `name=token` pairs separated by commas.
    pub fn parse(raw: &str) -> Self {
        raw.split(',')
            .filter_map(|pair| pair.split_once('='))
            .fold(Self::new(), |acc, (name, token)| acc.with(name, token))
    }

    /// Load from `AUTHHUB_SERVICE_TOKENS`. Unset means no service may call in.
    pub fn from_env() -> Self {
        let tokens = std::env::var("AUTHHUB_SERVICE_TOKENS")
            .map(|raw| Self::parse(&raw))
            .unwrap_or_default();
        if tokens.is_empty() {
            tracing::info!("no service tokens configured; service-to-service calls are rejected");
        }
        tokens
    }
}

impl ServiceTokenVerifier for StaticServiceTokens {
    fn verify(&self, service_name: &str, token: &str) -> bool {
        self.tokens
            .get(service_name.trim())
            .is_some_and(|expected| constant_time_eq(expected.as_bytes(), token.trim().as_bytes()))
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

//! Token verification settings.

use std::path::PathBuf;

use serde::Deserialize;

pub const DEFAULT_ISSUER: &str = "authhub";

const DEV_SECRET: &str = "authhub-dev-secret-change-me";

/// How bearer tokens are verified.
///
/// HMAC with `secret` by default; RSA with the public key at
/// `rsa.public_key_path` when `rsa.enabled` and the path is non-blank.
/// `leeway_secs` is the clock skew tolerated on `exp`; zero unless configured.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct JwtValidationConfig {
    pub secret: String,
    pub issuer: String,
    pub leeway_secs: u64,
    pub rsa: RsaConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RsaConfig {
    pub enabled: bool,
    pub public_key_path: Option<PathBuf>,
}

impl Default for JwtValidationConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            issuer: DEFAULT_ISSUER.to_string(),
            leeway_secs: 0,
            rsa: RsaConfig::default(),
        }
    }
}

impl JwtValidationConfig {
    pub fn hmac(secret: impl Into<String>, issuer: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            issuer: issuer.into(),
            leeway_secs: 0,
            rsa: RsaConfig::default(),
        }
    }

    pub fn with_rsa(mut self, public_key_path: impl Into<Option<PathBuf>>) -> Self {
        self.rsa = RsaConfig {
            enabled: true,
            public_key_path: public_key_path.into(),
        };
        self
    }

    pub fn with_leeway(mut self, leeway_secs: u64) -> Self {
        self.leeway_secs = leeway_secs;
        self
    }

    /// Load from `AUTHHUB_JWT_*` environment variables.
    pub fn from_env() -> Self {
        let secret = std::env::var("AUTHHUB_JWT_SECRET").unwrap_or_else(|_| {
            tracing::warn!("AUTHHUB_JWT_SECRET not set; using insecure dev default");
            DEV_SECRET.to_string()
        });

        let issuer = std::env::var("AUTHHUB_JWT_ISSUER")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_ISSUER.to_string());

        let leeway_secs = std::env::var("AUTHHUB_JWT_LEEWAY_SECS")
            .ok()
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(0);

        let enabled = std::env::var("AUTHHUB_JWT_RSA_ENABLED")
            .map(|v| parse_flag(&v))
            .unwrap_or(false);

        let public_key_path = std::env::var_os("AUTHHUB_JWT_RSA_PUBLIC_KEY_PATH").map(PathBuf::from);

        Self {
            secret,
            issuer,
            leeway_secs,
            rsa: RsaConfig {
                enabled,
                public_key_path,
            },
        }
    }

    /// The RSA key path to load, if RSA is enabled and the path is not blank.
    pub fn rsa_key_path(&self) -> Option<&PathBuf> {
        if !self.rsa.enabled {
            return None;
        }
        self.rsa
            .public_key_path
            .as_ref()
            .filter(|p| !p.as_os_str().to_string_lossy().trim().is_empty())
    }
}

fn parse_flag(raw: &str) -> bool {
    matches!(raw.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes" | "on")
}

//! Error taxonomy of the authorization core.
//!
//! Only two kinds of failure are ever surfaced: fatal configuration errors at
//! startup and caller-contract violations. Authorization outcomes and token
//! rejections are booleans / `None`, never errors.

use std::path::PathBuf;

use thiserror::Error;

/// Fatal, startup-time configuration failure.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("Failed to load RSA public key from '{}': {reason}", path.display())]
    RsaPublicKey { path: PathBuf, reason: String },
}

/// Programmer error: the holder was used outside its contract.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PreconditionViolation {
    #[error("identity context must be bound inside an active request scope")]
    NoRequestScope,
}

/// Why a token was rejected.
///
/// Internal only: the reason is logged and then dropped so callers cannot
/// tell one rejection from another.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TokenRejected {
    Blank,
    Malformed,
    BadSignature,
    WrongIssuer,
    Expired,
    Revoked,
    Invalid,
}

impl TokenRejected {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Blank => "blank",
            Self::Malformed => "malformed",
            Self::BadSignature => "bad_signature",
            Self::WrongIssuer => "wrong_issuer",
            Self::Expired => "expired",
            Self::Revoked => "revoked",
            Self::Invalid => "invalid",
        }
    }
}

impl From<jsonwebtoken::errors::Error> for TokenRejected {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match e.kind() {
            ErrorKind::InvalidToken
            | ErrorKind::Base64(_)
            | ErrorKind::Json(_)
            | ErrorKind::Utf8(_) => Self::Malformed,
            ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => Self::BadSignature,
            ErrorKind::InvalidIssuer => Self::WrongIssuer,
            ErrorKind::ExpiredSignature => Self::Expired,
            _ => Self::Invalid,
        }
    }
}

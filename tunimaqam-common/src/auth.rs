//! Role-gated bearer tokens
//!
//! # Token format
//!
//! ```text
//! <email>|<role>|<expires_at_ms>|<signature>
//! ```
//!
//! The signature is the SHA-256 (64 hex chars) of `<email>|<role>|<expires_at_ms>`
//! followed by the shared secret as a decimal i64. A shared secret of `0`
//! disables checking altogether; the HTTP layer skips validation in that case.
//!
//! This module holds pure functions only. The axum middleware lives in the
//! service crate.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Access roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Expert,
    Learner,
}

impl Role {
    /// Every role; the learning and analysis surface is open to all of them
    pub const ALL: [Role; 3] = [Role::Admin, Role::Expert, Role::Learner];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Expert => "expert",
            Role::Learner => "learner",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "expert" => Ok(Role::Expert),
            "learner" => Ok(Role::Learner),
            other => Err(AuthError::UnknownRole(other.to_string())),
        }
    }
}

/// Identity carried by a validated token
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Claims {
    pub email: String,
    pub role: Role,
    pub expires_at_ms: i64,
}

/// Authorization failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Missing bearer token")]
    MissingToken,

    #[error("Malformed token: {0}")]
    Malformed(String),

    #[error("Unknown role: {0}")]
    UnknownRole(String),

    #[error("Token expired at {expires_at_ms} (now {now_ms})")]
    Expired { expires_at_ms: i64, now_ms: i64 },

    #[error("Invalid token signature")]
    InvalidSignature,

    #[error("Role {role} is not allowed here")]
    Forbidden { role: Role },
}

fn signing_input(email: &str, role: Role, expires_at_ms: i64) -> String {
    format!("{}|{}|{}", email, role, expires_at_ms)
}

/// Hex SHA-256 of the claims followed by the shared secret
pub fn sign(email: &str, role: Role, expires_at_ms: i64, secret: i64) -> String {
    let mut hasher = Sha256::new();
    hasher.update(signing_input(email, role, expires_at_ms).as_bytes());
    hasher.update(secret.to_string().as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Build a token that expires `ttl_secs` after `now_ms`
pub fn issue_token(email: &str, role: Role, ttl_secs: i64, secret: i64, now_ms: i64) -> String {
    let expires_at_ms = now_ms + ttl_secs * 1000;
    let signature = sign(email, role, expires_at_ms, secret);
    format!("{}|{}", signing_input(email, role, expires_at_ms), signature)
}

/// Check structure, expiry and signature of a token
pub fn validate_token(token: &str, secret: i64, now_ms: i64) -> Result<Claims, AuthError> {
    // Split from the right so an email may contain anything but the last three fields
    let mut parts = token.trim().rsplitn(4, '|');
    let (Some(signature), Some(expires), Some(role), Some(email)) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(AuthError::Malformed("expected 4 fields".to_string()));
    };

    if email.is_empty() {
        return Err(AuthError::Malformed("empty email".to_string()));
    }
    let role: Role = role.parse()?;
    let expires_at_ms: i64 = expires
        .parse()
        .map_err(|e| AuthError::Malformed(format!("bad expiry: {}", e)))?;

    let expected = sign(email, role, expires_at_ms, secret);
    if !constant_time_eq(expected.as_bytes(), signature.as_bytes()) {
        return Err(AuthError::InvalidSignature);
    }

    if expires_at_ms < now_ms {
        return Err(AuthError::Expired {
            expires_at_ms,
            now_ms,
        });
    }

    Ok(Claims {
        email: email.to_string(),
        role,
        expires_at_ms,
    })
}

/// Byte comparison whose running time depends only on the lengths
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Check the claims' role against an allowed set
pub fn authorize(claims: &Claims, allowed: &[Role]) -> Result<(), AuthError> {
    if allowed.contains(&claims.role) {
        Ok(())
    } else {
        Err(AuthError::Forbidden { role: claims.role })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: i64 = 123456789;
    const NOW: i64 = 1_730_000_000_000;

    #[test]
    fn test_issue_then_validate() {
        let token = issue_token("amira@example.tn", Role::Expert, 3600, SECRET, NOW);
        let claims = validate_token(&token, SECRET, NOW + 1000).unwrap();
        assert_eq!(claims.email, "amira@example.tn");
        assert_eq!(claims.role, Role::Expert);
        assert_eq!(claims.expires_at_ms, NOW + 3_600_000);
    }

    #[test]
    fn test_signature_is_hex_sha256() {
        let sig = sign("a@b.c", Role::Learner, NOW, SECRET);
        assert_eq!(sig.len(), 64);
        assert!(sig.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(sig, sign("a@b.c", Role::Learner, NOW, SECRET + 1));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = issue_token("a@b.c", Role::Learner, 60, SECRET, NOW);
        assert_eq!(
            validate_token(&token, 987654321, NOW),
            Err(AuthError::InvalidSignature)
        );
    }

    #[test]
    fn test_tampered_role_rejected() {
        let token = issue_token("a@b.c", Role::Learner, 60, SECRET, NOW);
        let tampered = token.replacen("|learner|", "|admin|", 1);
        assert_eq!(
            validate_token(&tampered, SECRET, NOW),
            Err(AuthError::InvalidSignature)
        );
    }

    #[test]
    fn test_signature_comparison() {
        assert!(constant_time_eq(b"abc123", b"abc123"));
        assert!(!constant_time_eq(b"abc123", b"abc124"));
        assert!(!constant_time_eq(b"abc123", b"abc12"));
        assert!(constant_time_eq(b"", b""));

        // Same length, last hex digit flipped
        let token = issue_token("a@b.c", Role::Learner, 60, SECRET, NOW);
        let last = token.chars().last().unwrap();
        let flipped = if last == '0' { '1' } else { '0' };
        let forged = format!("{}{}", &token[..token.len() - 1], flipped);
        assert_eq!(
            validate_token(&forged, SECRET, NOW),
            Err(AuthError::InvalidSignature)
        );
    }

    #[test]
    fn test_expired_token_rejected() {
        let token = issue_token("a@b.c", Role::Admin, 1, SECRET, NOW);
        assert!(matches!(
            validate_token(&token, SECRET, NOW + 5000),
            Err(AuthError::Expired { .. })
        ));
    }

    #[test]
    fn test_malformed_tokens() {
        assert!(matches!(
            validate_token("garbage", SECRET, NOW),
            Err(AuthError::Malformed(_))
        ));
        assert!(matches!(
            validate_token("a@b.c|wizard|1|abc", SECRET, NOW),
            Err(AuthError::UnknownRole(_))
        ));
        assert!(matches!(
            validate_token("a@b.c|admin|soon|abc", SECRET, NOW),
            Err(AuthError::Malformed(_))
        ));
    }

    #[test]
    fn test_authorize_roles() {
        let claims = Claims {
            email: "a@b.c".to_string(),
            role: Role::Learner,
            expires_at_ms: NOW,
        };
        assert!(authorize(&claims, &Role::ALL).is_ok());
        assert_eq!(
            authorize(&claims, &[Role::Admin, Role::Expert]),
            Err(AuthError::Forbidden { role: Role::Learner })
        );
    }

    #[test]
    fn test_role_from_str() {
        assert_eq!("Admin".parse::<Role>(), Ok(Role::Admin));
        assert_eq!(" learner ".parse::<Role>(), Ok(Role::Learner));
        assert!("root".parse::<Role>().is_err());
    }
}

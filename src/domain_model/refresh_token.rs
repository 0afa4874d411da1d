use base64::Engine;
use chrono::{DateTime, Utc};
use rand::RngCore;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

pub const REFRESH_TOKEN_VERSION: &str = "rt1";
const SECRET_LEN: usize = 32;

/// Plaintext refresh token, `rt1.<base64url>`. Handed to the client once.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RefreshToken(pub String);

impl fmt::Debug for RefreshToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RefreshToken(***)")
    }
}

/// Hex SHA-256 of the full plaintext. This is all the store ever sees.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RefreshTokenHash(pub String);

impl fmt::Display for RefreshTokenHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl RefreshToken {
    /// Draws 32 bytes from the OS CSPRNG and formats them as a versioned token.
    pub fn generate() -> Result<Self, rand::Error> {
        let mut bytes = [0u8; SECRET_LEN];
        OsRng.try_fill_bytes(&mut bytes)?;
        let opaque = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes);
        Ok(RefreshToken(format!("{REFRESH_TOKEN_VERSION}.{opaque}")))
    }

    pub fn is_supported_version(&self) -> bool {
        self.0
            .strip_prefix(REFRESH_TOKEN_VERSION)
            .is_some_and(|rest| rest.starts_with('.'))
    }

    pub fn hash(&self) -> RefreshTokenHash {
        RefreshTokenHash(hex::encode(Sha256::digest(self.0.as_bytes())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A freshly minted refresh token together with its absolute expiry.
#[derive(Debug, Clone)]
pub struct IssuedRefreshToken {
    pub token: RefreshToken,
    pub expires_at: DateTime<Utc>,
}

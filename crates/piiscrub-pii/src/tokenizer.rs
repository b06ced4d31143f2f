//! Deterministic one-way tokens
//!
//! A token is `{PREFIX}_{12 base32 chars}` where the base32 block is taken from
//! HMAC-SHA256(secret, normalized value). Equal values under the same secret
//! always map to the same token; there is no way back.

use data_encoding::BASE32_NOPAD;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::{Error, Result};
use crate::recognizer::PiiType;

type HmacSha256 = Hmac<Sha256>;

/// Length of the encoded digest kept in a token
pub const TOKEN_LEN: usize = 12;

/// Canonical form of a value before hashing
///
/// Phone, SSN and card numbers keep only their digits so formatting does not
/// change the token; everything else is lowercased with whitespace collapsed.
pub fn normalize(pii_type: PiiType, raw_value: &str) -> String {
    match pii_type {
        PiiType::Phone | PiiType::Ssn | PiiType::CreditCard => {
            raw_value.chars().filter(|c| c.is_ascii_digit()).collect()
        }
        PiiType::Name | PiiType::Email | PiiType::Address => raw_value
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase(),
    }
}

/// Derive the token for a value
///
/// Fails with [`Error::Configuration`] when the secret is absent or empty.
pub fn token(pii_type: PiiType, raw_value: &str, secret: Option<&str>) -> Result<String> {
    let key = secret.filter(|s| !s.is_empty()).ok_or_else(Error::missing_secret)?;

    let mut mac = HmacSha256::new_from_slice(key.as_bytes())
        .map_err(|e| Error::Configuration(format!("invalid HMAC key: {}", e)))?;
    mac.update(normalize(pii_type, raw_value).as_bytes());
    let digest = mac.finalize().into_bytes();

    let encoded = BASE32_NOPAD.encode(&digest);
    let short: String = encoded.chars().take(TOKEN_LEN).collect::<String>().to_lowercase();

    Ok(format!("{}_{}", pii_type.token_prefix(), short))
}

//! Shared-secret verification.
//!
//! Stored secrets come in two shapes. `scrypt$<hex salt>:<hex key>` is
//! verified by re-deriving the key (N = 2^14, r = 16, p = 1, 64-byte key).
//! Anything else is a literal secret provisioned before hashing existed and
//! is compared as-is. Both comparisons run in constant time.

use rand::RngCore;
use scrypt::{Params, scrypt};
use subtle::ConstantTimeEq;

use crate::error::AuthError;

const SCRYPT_PREFIX: &str = "scrypt$";
const SALT_BYTES: usize = 16;
const KEY_BYTES: usize = 64;

/// Hash a secret into the `scrypt$salt:key` form accepted by [`verify_secret`].
pub fn hash_secret(secret: &str) -> Result<String, AuthError> {
    let mut salt = [0u8; SALT_BYTES];
    rand::thread_rng().fill_bytes(&mut salt);
    let salt_hex = hex::encode(salt);

    let key = derive_key(secret, &salt_hex)?;
    Ok(format!("{SCRYPT_PREFIX}{salt_hex}:{}", hex::encode(key)))
}

/// Check an entered password against a stored secret.
pub fn verify_secret(stored: &str, entered: &str) -> Result<bool, AuthError> {
    let Some(hashed) = stored.strip_prefix(SCRYPT_PREFIX) else {
        return Ok(constant_time_equal(stored.as_bytes(), entered.as_bytes()));
    };

    let (salt_hex, key_hex) = hashed
        .split_once(':')
        .ok_or_else(|| AuthError::SecretFormat("missing ':' separator".to_string()))?;
    let expected =
        hex::decode(key_hex).map_err(|e| AuthError::SecretFormat(format!("bad key hex: {e}")))?;

    let derived = derive_key(entered, salt_hex)?;
    Ok(constant_time_equal(&derived, &expected))
}

fn derive_key(secret: &str, salt: &str) -> Result<Vec<u8>, AuthError> {
    let params = Params::new(14, 16, 1, KEY_BYTES)
        .map_err(|e| AuthError::Verification(format!("invalid scrypt params: {e}")))?;

    let mut output = vec![0u8; KEY_BYTES];
    scrypt(secret.as_bytes(), salt.as_bytes(), &params, &mut output)
        .map_err(|e| AuthError::Verification(format!("scrypt failed: {e}")))?;
    Ok(output)
}

fn constant_time_equal(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_secret_requires_exact_match() {
        assert!(verify_secret("hunter2", "hunter2").unwrap());
        assert!(!verify_secret("hunter2", "Hunter2").unwrap());
        assert!(!verify_secret("hunter2", "hunter2 ").unwrap());
        assert!(!verify_secret("hunter2", "").unwrap());
    }

    #[test]
    fn hashed_secret_round_trip() {
        let stored = hash_secret("correct horse").unwrap();
        assert!(stored.starts_with(SCRYPT_PREFIX));
        assert!(verify_secret(&stored, "correct horse").unwrap());
        assert!(!verify_secret(&stored, "wrong horse").unwrap());
    }

    #[test]
    fn malformed_hash_is_an_error() {
        assert!(matches!(
            verify_secret("scrypt$nocolon", "x"),
            Err(AuthError::SecretFormat(_))
        ));
        assert!(matches!(
            verify_secret("scrypt$abcd:zz", "x"),
            Err(AuthError::SecretFormat(_))
        ));
    }
}

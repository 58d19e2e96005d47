use rand::RngCore;

/// Random bytes in a device token (256 bits).
pub const DEVICE_TOKEN_BYTES: usize = 32;

/// Generate a new device credential: 32 bytes from the OS-seeded CSPRNG,
/// hex encoded.
pub fn generate_device_token() -> String {
    let mut bytes = [0u8; DEVICE_TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Whether `token` has the shape [`generate_device_token`] produces. Anything
/// else cannot be a registered device and never reaches the store.
pub fn is_well_formed(token: &str) -> bool {
    token.len() == DEVICE_TOKEN_BYTES * 2
        && token.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_is_64_hex_chars() {
        let token = generate_device_token();
        assert_eq!(token.len(), DEVICE_TOKEN_BYTES * 2);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn only_generated_shapes_are_well_formed() {
        assert!(is_well_formed(&generate_device_token()));
        assert!(!is_well_formed(""));
        assert!(!is_well_formed(&"a".repeat(63)));
        assert!(!is_well_formed(&"a".repeat(4096)));
        assert!(!is_well_formed(&"A".repeat(64)));
        assert!(!is_well_formed(&format!("../{}", "a".repeat(61))));
    }

    #[test]
    fn tokens_are_unique() {
        assert_ne!(generate_device_token(), generate_device_token());
    }
}

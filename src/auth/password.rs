//! Salted password hashing.
//!
//! Each account gets its own random 16-byte salt, stored hex-encoded next to the
//! bcrypt hash. Verification re-hashes the candidate password under the stored
//! salt and cost and compares the result with the stored hash.

use crate::error::AppError;
use bcrypt::{hash_with_salt, Version};
use rand::RngCore;

const SALT_LEN: usize = 16;

/// Generates a fresh random salt, hex-encoded.
pub fn generate_salt() -> String {
    let mut salt = [0u8; SALT_LEN];
    rand::thread_rng().fill_bytes(&mut salt);
    hex::encode(salt)
}

pub fn hash_password(password: &str, salt: &str, cost: u32) -> Result<String, AppError> {
    let salt = decode_salt(salt)?;
    hash_with_salt(password, cost, salt)
        .map(|parts| parts.format_for_version(Version::TwoB))
        .map_err(|e| AppError::InternalServerError(format!("Failed to hash password: {}", e)))
}

pub fn verify_password(password: &str, salt: &str, hashed_password: &str) -> Result<bool, AppError> {
    let cost = cost_of(hashed_password)?;
    Ok(hash_password(password, salt, cost)? == hashed_password)
}

fn decode_salt(salt: &str) -> Result<[u8; SALT_LEN], AppError> {
    hex::decode(salt)
        .ok()
        .and_then(|bytes| <[u8; SALT_LEN]>::try_from(bytes).ok())
        .ok_or_else(|| AppError::InternalServerError("Stored salt is malformed".into()))
}

/// Reads the cost field out of a `$2b$<cost>$...` hash.
fn cost_of(hashed_password: &str) -> Result<u32, AppError> {
    hashed_password
        .split('$')
        .nth(2)
        .and_then(|cost| cost.parse().ok())
        .ok_or_else(|| {
            AppError::InternalServerError("Failed to verify password: malformed hash".into())
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const COST: u32 = 4;

    #[test]
    fn test_password_hashing_and_verification() {
        let password = "test_password123";
        let salt = generate_salt();
        let hashed = hash_password(password, &salt, COST).unwrap();

        assert!(hashed.starts_with("$2b$04$"));
        assert!(verify_password(password, &salt, &hashed).unwrap());
        assert!(!verify_password("wrong_password", &salt, &hashed).unwrap());
    }

    #[test]
    fn test_salts_are_random() {
        let first = generate_salt();
        let second = generate_salt();
        assert_eq!(first.len(), SALT_LEN * 2);
        assert_ne!(first, second);

        let password = "same_password";
        assert_ne!(
            hash_password(password, &first, COST).unwrap(),
            hash_password(password, &second, COST).unwrap()
        );
    }

    #[test]
    fn test_verification_depends_on_stored_salt() {
        let password = "test_password123";
        let salt = generate_salt();
        let hashed = hash_password(password, &salt, COST).unwrap();

        assert!(!verify_password(password, &generate_salt(), &hashed).unwrap());
    }

    #[test]
    fn test_verify_with_invalid_hash() {
        match verify_password("test_password123", &generate_salt(), "invalidhashformat") {
            Err(AppError::InternalServerError(msg)) => {
                assert!(msg.contains("Failed to verify password"))
            }
            other => panic!("Unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_malformed_salt() {
        assert!(matches!(
            hash_password("test_password123", "not-hex", COST),
            Err(AppError::InternalServerError(_))
        ));
    }
}

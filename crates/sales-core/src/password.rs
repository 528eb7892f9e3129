use bcrypt::{hash, verify};

use crate::errors::AppError;

/// The lowest cost bcrypt accepts. Keeps hashing fast in tests.
pub const TEST_BCRYPT_COST: u32 = 4;

/// Hashes with an explicit bcrypt cost, normally `bcrypt::DEFAULT_COST`.
pub fn hash_password_with_cost(password: &str, cost: u32) -> Result<String, AppError> {
    hash(password, cost)
        .map_err(|e| AppError::internal(anyhow::anyhow!("failed to hash password: {}", e)))
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    verify(password, hash)
        .map_err(|e| AppError::internal(anyhow::anyhow!("failed to verify password: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hashed = hash_password_with_cost("gophers", TEST_BCRYPT_COST).unwrap();
        assert_ne!(hashed, "gophers");
        assert!(verify_password("gophers", &hashed).unwrap());
        assert!(!verify_password("rustaceans", &hashed).unwrap());
    }

    #[test]
    fn test_same_password_different_hashes() {
        let a = hash_password_with_cost("secret", TEST_BCRYPT_COST).unwrap();
        let b = hash_password_with_cost("secret", TEST_BCRYPT_COST).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_cost_below_minimum_is_rejected() {
        assert!(hash_password_with_cost("secret", TEST_BCRYPT_COST - 1).is_err());
    }

    #[test]
    fn test_verify_garbage_hash_is_internal() {
        let err = verify_password("secret", "not-a-bcrypt-hash").unwrap_err();
        assert_eq!(err.kind, crate::ErrorKind::Internal);
    }
}

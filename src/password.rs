/// Password hashing with Argon2id
///
/// Hashing and verification are CPU-bound and run on the blocking thread
/// pool so concurrent requests are not stalled behind a key derivation.
use crate::error::{AppError, AppResult};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString},
    Argon2,
};

/// One-way, salted, adaptive password hasher
#[derive(Debug, Clone, Default)]
pub struct PasswordHasher;

impl PasswordHasher {
    pub fn new() -> Self {
        Self
    }

    /// Hash a plaintext password, salting independently per invocation
    pub async fn hash(&self, plaintext: &str) -> AppResult<String> {
        let plaintext = plaintext.to_owned();
        tokio::task::spawn_blocking(move || {
            let salt = SaltString::generate(&mut OsRng);
            Argon2::default()
                .hash_password(plaintext.as_bytes(), &salt)
                .map(|hash| hash.to_string())
                .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
        })
        .await
        .map_err(|e| AppError::Internal(format!("Hashing task failed: {}", e)))?
    }

    /// Verify a plaintext password against a stored digest
    ///
    /// Returns false for a malformed digest rather than erroring; the
    /// underlying comparison is constant-time.
    pub async fn verify(&self, plaintext: &str, digest: &str) -> AppResult<bool> {
        let plaintext = plaintext.to_owned();
        let digest = digest.to_owned();
        tokio::task::spawn_blocking(move || {
            let Ok(parsed) = PasswordHash::new(&digest) else {
                return false;
            };
            Argon2::default()
                .verify_password(plaintext.as_bytes(), &parsed)
                .is_ok()
        })
        .await
        .map_err(|e| AppError::Internal(format!("Verification task failed: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_hash_and_verify_round_trip() {
        let hasher = PasswordHasher::new();
        let digest = hasher.hash("secret1").await.unwrap();

        assert!(hasher.verify("secret1", &digest).await.unwrap());
        assert!(!hasher.verify("secret2", &digest).await.unwrap());
    }

    #[tokio::test]
    async fn test_equal_inputs_yield_different_digests() {
        let hasher = PasswordHasher::new();
        let a = hasher.hash("secret1").await.unwrap();
        let b = hasher.hash("secret1").await.unwrap();

        assert_ne!(a, b);
        assert!(hasher.verify("secret1", &a).await.unwrap());
        assert!(hasher.verify("secret1", &b).await.unwrap());
    }

    #[tokio::test]
    async fn test_malformed_digest_is_false_not_error() {
        let hasher = PasswordHasher::new();
        assert!(!hasher.verify("secret1", "not-a-phc-string").await.unwrap());
        assert!(!hasher.verify("secret1", "").await.unwrap());
    }
}

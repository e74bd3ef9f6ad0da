//! Bcrypt hashing for account passwords.
//!
//! Used at registration and by the default-admin seeding on first start;
//! login verifies against the stored hash.

use bcrypt::{hash, verify, BcryptError, DEFAULT_COST};

/// Hash a plaintext password for storage.
pub fn hash_password(password: &str) -> Result<String, BcryptError> {
    hash(password, DEFAULT_COST)
}

/// Check a login attempt against the stored hash.
pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool, BcryptError> {
    verify(password, stored_hash)
}

//! Password hashing for voter login
//!
//! Voters are identified by email; the password is stored as a salted
//! SHA-256 digest (`password_hash`, `password_salt` columns).
//!
//! # Pure Functions
//!
//! No HTTP or database dependencies. The login flow itself lives in the
//! voting service crate.

use rand::Rng;
use sha2::{Digest, Sha256};

/// Generate a random 128-bit salt as 32 hex characters
pub fn generate_salt() -> String {
    let bytes: [u8; 16] = rand::thread_rng().gen();
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Hash a password with the given salt
///
/// # Examples
///
/// ```
/// use writein_common::auth::hash_password;
///
/// let hash = hash_password("hunter2", "abcd");
/// assert_eq!(hash.len(), 64); // SHA-256 is 64 hex chars
/// ```
pub fn hash_password(password: &str, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Check a password against a stored hash and salt
pub fn verify_password(password: &str, salt: &str, expected_hash: &str) -> bool {
    hash_password(password, salt) == expected_hash
}

use sha2::{Digest, Sha256};

/// Hex SHA-256 of a login and password. Only the digest of an accepted
/// password is kept in memory.
pub fn credential_digest(username: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(username.as_bytes());
    hasher.update([0u8]);
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

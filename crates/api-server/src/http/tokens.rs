use sha2::{Digest, Sha256};

/// SHA-256 of a bearer token as stored in `auth_sessions.access_token_hash`.
pub fn hash_token(value: &str) -> Vec<u8> {
    let digest = Sha256::digest(value.as_bytes());
    digest.to_vec()
}

//! 비밀값 해시 및 승인 토큰 생성

use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// 승인 토큰 엔트로피 (256비트)
pub const TOKEN_BYTES: usize = 32;

/// 비밀값의 SHA-256 해시 (hex)
pub fn hash_secret(secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    hex::encode(hasher.finalize())
}

/// 256비트 난수 토큰 생성 (hex 64자)
pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// 두 해시를 상수 시간으로 비교
pub fn hashes_match(expected_hash: &str, candidate_hash: &str) -> bool {
    let expected = expected_hash.as_bytes();
    let candidate = candidate_hash.as_bytes();
    expected.len() == candidate.len() && bool::from(expected.ct_eq(candidate))
}

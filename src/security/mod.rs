//! 보안 유틸리티
//!
//! 토큰/PIN은 원문으로 비교하지 않고 항상 해시 커밋먼트로만 비교합니다.

pub mod hash;

pub use hash::{generate_token, hash_secret, hashes_match, TOKEN_BYTES};

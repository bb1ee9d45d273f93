use sha2::{Digest, Sha256};
use uuid::Uuid;

const MAX_ATTEMPTS: usize = 64;

/// Draws random positive ids until `exists` reports no collision.
pub fn generate_id<F>(mut exists: F) -> Option<i64>
where
    F: FnMut(i64) -> bool,
{
    for attempt in 0..MAX_ATTEMPTS {
        let candidate = random_id();
        if candidate == 0 {
            continue;
        }
        if !exists(candidate) {
            return Some(candidate);
        }
        tracing::warn!(attempt, candidate, "generated id collided, retrying");
    }
    None
}

fn random_id() -> i64 {
    let seed = Uuid::now_v7();
    let mut hasher = Sha256::new();
    hasher.update(seed.as_bytes());
    let digest = hasher.finalize();
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    (u64::from_be_bytes(bytes) >> 1) as i64
}

//! Master key derivation. The seed string is stretched with
//! PBKDF2-HMAC-SHA512 (salt "VanitySearch", 2048 rounds, 64-byte output)
//! so that short seeds cannot be walked back cheaply; the SHA-256 of the
//! stretched block, reduced into the curve order, is the master scalar.

use k256::elliptic_curve::ops::Reduce;
use k256::{Scalar, U256};
use pbkdf2::pbkdf2_hmac;
use sha2::{Digest, Sha256, Sha512};

const SALT: &[u8] = b"VanitySearch";
const ROUNDS: u32 = 2048;

pub fn derive_start_key(seed: &str) -> Scalar {
    let mut stretched = [0u8; 64];
    pbkdf2_hmac::<Sha512>(seed.as_bytes(), SALT, ROUNDS, &mut stretched);
    let digest = Sha256::digest(stretched);
    let bytes = k256::FieldBytes::clone_from_slice(&digest);
    <Scalar as Reduce<U256>>::reduce_bytes(&bytes)
}

/// Fallback seed when the user supplies none: the current time.
pub fn default_seed() -> String {
    chrono::Utc::now().timestamp_millis().to_string()
}

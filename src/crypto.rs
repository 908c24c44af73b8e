//! hash160 paths over SEC1 point serializations.

use ripemd::Ripemd160;
use sha2::{Digest, Sha256};

/// hash160 = RIPEMD160(SHA256(data))
#[inline]
pub fn hash160(data: &[u8]) -> [u8; 20] {
    let sha = Sha256::digest(data);
    let ripemd = Ripemd160::digest(sha);
    let mut out = [0u8; 20];
    out.copy_from_slice(&ripemd);
    out
}

/// hash160 of the 33-byte compressed encoding of (x, y).
#[inline]
pub fn hash160_compressed(x: &[u8; 32], y_is_odd: bool) -> [u8; 20] {
    let mut pubkey = [0u8; 33];
    pubkey[0] = if y_is_odd { 0x03 } else { 0x02 };
    pubkey[1..33].copy_from_slice(x);
    hash160(&pubkey)
}

/// hash160 of the 65-byte uncompressed encoding of (x, y).
#[inline]
pub fn hash160_uncompressed(x: &[u8; 32], y: &[u8; 32]) -> [u8; 20] {
    let mut pubkey = [0u8; 65];
    pubkey[0] = 0x04;
    pubkey[1..33].copy_from_slice(x);
    pubkey[33..65].copy_from_slice(y);
    hash160(&pubkey)
}

/// First four bytes of double-SHA256, the Base58Check checksum.
#[inline]
pub fn checksum4(data: &[u8]) -> [u8; 4] {
    let digest = Sha256::digest(Sha256::digest(data));
    let mut out = [0u8; 4];
    out.copy_from_slice(&digest[..4]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    // Private key 1: the most basic vector. If this fails, nothing works.
    const PUBKEY_1_COMPRESSED: &str =
        "0279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798";
    const HASH160_1: &str = "751e76e8199196d454941c45d1b3a323f1433bd6";

    #[test]
    fn hash160_known_vector() {
        let pubkey = hex::decode(PUBKEY_1_COMPRESSED).unwrap();
        let expected: [u8; 20] = hex::decode(HASH160_1).unwrap().try_into().unwrap();
        assert_eq!(hash160(&pubkey), expected);
    }

    #[test]
    fn compressed_path_matches_generic_hash() {
        let pubkey = hex::decode(PUBKEY_1_COMPRESSED).unwrap();
        let x: [u8; 32] = pubkey[1..33].try_into().unwrap();
        // generator y is even, so the prefix byte is 0x02
        assert_eq!(hash160_compressed(&x, false), hash160(&pubkey));
    }

    #[test]
    fn uncompressed_path_uses_04_prefix() {
        let x = [0x11u8; 32];
        let y = [0x22u8; 32];
        let mut manual = vec![0x04u8];
        manual.extend_from_slice(&x);
        manual.extend_from_slice(&y);
        assert_eq!(hash160_uncompressed(&x, &y), hash160(&manual));
    }

    #[test]
    fn checksum_is_leading_double_sha(){
        let digest = Sha256::digest(Sha256::digest(b"vanity"));
        assert_eq!(checksum4(b"vanity"), digest[..4]);
    }
}

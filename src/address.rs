//! Base58Check address and WIF encoding.

use crate::crypto::checksum4;

/// Base58Check: version byte, payload, 4-byte double-SHA256 checksum.
pub fn base58_check(version: u8, payload: &[u8]) -> String {
    let mut data = Vec::with_capacity(payload.len() + 5);
    data.push(version);
    data.extend_from_slice(payload);
    let checksum = checksum4(&data);
    data.extend_from_slice(&checksum);
    bs58::encode(data).into_string()
}

/// P2PKH address (version byte 0x00) of a hash160.
#[inline]
pub fn p2pkh_address(hash160: &[u8; 20]) -> String {
    base58_check(0x00, hash160)
}

/// Plain Base58 decode, no checksum validation.
pub fn decode_base58(s: &str) -> Option<Vec<u8>> {
    bs58::decode(s).into_vec().ok()
}

/// Private key to WIF. Compressed keys carry the trailing 0x01 flag;
/// using the wrong flag derives a different address.
pub fn to_wif(key: &[u8; 32], compressed: bool) -> String {
    let mut data = Vec::with_capacity(if compressed { 38 } else { 37 });
    data.push(0x80);
    data.extend_from_slice(key);
    if compressed {
        data.push(0x01);
    }
    let checksum = checksum4(&data);
    data.extend_from_slice(&checksum);
    bs58::encode(data).into_string()
}

//! Prefix compiler: turns a user-supplied Base58 string into a lookup
//! entry, classified as a full address, a textual prefix, or an all-'1'
//! prefix.
//!
//! Partial Base58 prefixes are not byte-aligned against the 25-byte
//! address payload. Padding the prefix with '1' (digit value 0) yields the
//! smallest completion that decodes to a full payload; the number of
//! synthesized digits encodes the remaining entropy and drives the
//! difficulty estimate.

use std::sync::atomic::{AtomicBool, Ordering};

use thiserror::Error;

use crate::address::decode_base58;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PrefixError {
    #[error("too short")]
    TooShort,
    #[error("must start with 1")]
    MustStartWithOne,
    #[error("0, I, O and l not allowed")]
    IllegalCharacter,
    #[error("too much 1")]
    TooManyOnes,
    #[error("invalid size")]
    InvalidSize,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PrefixKind {
    /// All-'1' prefix, length <= 21.
    Singular,
    /// Textual Base58 prefix.
    Partial,
    /// Complete 25-byte address.
    Full,
}

#[derive(Debug)]
pub struct PrefixEntry {
    pub kind: PrefixKind,
    pub text: String,
    pub short16: u16,
    pub long32: u32,
    pub hash160: [u8; 20],
    pub difficulty: f64,
    found: AtomicBool,
}

impl PrefixEntry {
    #[inline]
    pub fn is_found(&self) -> bool {
        self.found.load(Ordering::Relaxed)
    }

    /// Monotone false -> true; marking an already-found entry is a no-op.
    #[inline]
    pub fn mark_found(&self) {
        self.found.store(true, Ordering::Relaxed);
    }

    /// Hash comparison for full addresses, leading-string comparison for
    /// partial and singular prefixes.
    #[inline]
    pub fn matches(&self, hash160: &[u8; 20], address: Option<&str>) -> bool {
        match self.kind {
            PrefixKind::Full => &self.hash160 == hash160,
            PrefixKind::Partial | PrefixKind::Singular => {
                address.map_or(false, |a| a.starts_with(&self.text))
            }
        }
    }
}

fn is_singular(prefix: &str) -> bool {
    prefix.bytes().all(|b| b == b'1')
}

/// Compile one textual prefix into a lookup entry.
pub fn compile(prefix: &str) -> Result<PrefixEntry, PrefixError> {
    if prefix.len() < 2 {
        return Err(PrefixError::TooShort);
    }
    if !prefix.starts_with('1') {
        return Err(PrefixError::MustStartWithOne);
    }

    let decoded = decode_base58(prefix).ok_or(PrefixError::IllegalCharacter)?;

    // All-'1' prefixes decode to all-zero payloads and would otherwise be
    // swallowed by the full-address branch below.
    if is_singular(prefix) {
        if prefix.len() > 21 {
            return Err(PrefixError::TooManyOnes);
        }
        return Ok(PrefixEntry {
            kind: PrefixKind::Singular,
            text: prefix.to_string(),
            short16: 0,
            long32: 0,
            hash160: [0u8; 20],
            difficulty: 256f64.powi(prefix.len() as i32 - 1),
            found: AtomicBool::new(false),
        });
    }

    if decoded.len() > 21 {
        // complete address attack
        let mut hash160 = [0u8; 20];
        hash160.copy_from_slice(&decoded[1..21]);
        return Ok(PrefixEntry {
            kind: PrefixKind::Full,
            text: prefix.to_string(),
            short16: u16::from_be_bytes([hash160[0], hash160[1]]),
            long32: u32::from_be_bytes([hash160[0], hash160[1], hash160[2], hash160[3]]),
            hash160,
            difficulty: 2f64.powi(160),
            found: AtomicBool::new(false),
        });
    }

    // Synthesize the smallest completion: right-pad with '1' until the
    // decoding reaches the 25-byte payload size.
    let mut work = prefix.to_string();
    let mut padded = decoded;
    let mut nb_digit = 0;
    while padded.len() < 25 {
        work.push('1');
        nb_digit += 1;
        padded = decode_base58(&work).ok_or(PrefixError::IllegalCharacter)?;
    }
    if padded.len() != 25 {
        return Err(PrefixError::InvalidSize);
    }

    let mut short16 = u16::from_be_bytes([padded[1], padded[2]]);

    // One further '1' may still decode to 25 bytes; that completion is the
    // more probable one, so it supplies the 16-bit prefix.
    work.push('1');
    if let Some(longer) = decode_base58(&work) {
        if longer.len() == 25 {
            short16 = u16::from_be_bytes([longer[1], longer[2]]);
            nb_digit += 1;
        }
    }

    Ok(PrefixEntry {
        kind: PrefixKind::Partial,
        text: prefix.to_string(),
        short16,
        long32: 0,
        hash160: [0u8; 20],
        difficulty: 2f64.powi(192) / 58f64.powi(nb_digit),
        found: AtomicBool::new(false),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_length_one_accepts_length_two() {
        assert_eq!(compile("1").unwrap_err(), PrefixError::TooShort);
        assert_eq!(compile("1A").unwrap().kind, PrefixKind::Partial);
    }

    #[test]
    fn rejects_wrong_leading_character() {
        assert_eq!(compile("3Ab").unwrap_err(), PrefixError::MustStartWithOne);
    }

    #[test]
    fn rejects_non_base58_characters() {
        assert_eq!(compile("1Illegal").unwrap_err(), PrefixError::IllegalCharacter);
        assert_eq!(compile("1O0l").unwrap_err(), PrefixError::IllegalCharacter);
    }

    #[test]
    fn full_address_is_recognized() {
        let entry = compile("1BgGZ9tcN4rm9KBzDn7KprQz87SZ26SAMH").unwrap();
        assert_eq!(entry.kind, PrefixKind::Full);
        let expected: [u8; 20] = hex::decode("751e76e8199196d454941c45d1b3a323f1433bd6")
            .unwrap()
            .try_into()
            .unwrap();
        assert_eq!(entry.hash160, expected);
        assert_eq!(entry.short16, 0x751e);
        assert_eq!(entry.long32, 0x751e76e8);
        assert_eq!(entry.difficulty, 2f64.powi(160));
    }

    #[test]
    fn singular_prefix_classification() {
        let entry = compile("11111111").unwrap();
        assert_eq!(entry.kind, PrefixKind::Singular);
        assert_eq!(entry.short16, 0);
        assert_eq!(entry.difficulty, 256f64.powi(7));
    }

    #[test]
    fn singular_length_boundaries() {
        let twenty_one = "1".repeat(21);
        assert_eq!(compile(&twenty_one).unwrap().kind, PrefixKind::Singular);
        let twenty_two = "1".repeat(22);
        assert_eq!(compile(&twenty_two).unwrap_err(), PrefixError::TooManyOnes);
    }

    #[test]
    fn partial_prefix_is_deterministic() {
        let a = compile("1BitcoinEater").unwrap();
        let b = compile("1BitcoinEater").unwrap();
        assert_eq!(a.kind, PrefixKind::Partial);
        assert_eq!(a.short16, b.short16);
        assert_eq!(a.difficulty, b.difficulty);
        assert!(a.difficulty > 1.0);
        assert!(a.difficulty < 2f64.powi(160));
    }

    #[test]
    fn partial_difficulty_tracks_synthesized_digits() {
        // a longer prefix needs fewer synthesized digits, so it is harder
        let short = compile("1AB").unwrap();
        let long = compile("1ABCDEFG").unwrap();
        assert!(long.difficulty > short.difficulty);
    }

    #[test]
    fn match_dispatch_per_kind() {
        let full = compile("1BgGZ9tcN4rm9KBzDn7KprQz87SZ26SAMH").unwrap();
        let h = full.hash160;
        assert!(full.matches(&h, None));
        assert!(!full.matches(&[0u8; 20], None));

        let partial = compile("1Bg").unwrap();
        assert!(partial.matches(&h, Some("1BgGZ9tcN4rm9KBzDn7KprQz87SZ26SAMH")));
        assert!(!partial.matches(&h, Some("1cMh228HTCiwS8ZsaakH8A8wze1JR5ZsP")));
        assert!(!partial.matches(&h, None));
    }

    #[test]
    fn found_flag_is_monotone() {
        let entry = compile("1AB").unwrap();
        assert!(!entry.is_found());
        entry.mark_found();
        assert!(entry.is_found());
        entry.mark_found();
        assert!(entry.is_found());
    }
}

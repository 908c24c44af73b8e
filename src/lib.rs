//! vanityhunt: multi-threaded Base58 prefix search over secp256k1 P2PKH
//! addresses.
//!
//! Layering, leaves first:
//! - `math`: base-field limbs with a grouped inverse, affine points, GLV
//!   constants; order arithmetic rides on `k256`
//! - `crypto` / `address`: hash160 paths, Base58Check, WIF
//! - `prefix` / `index`: the compiler from textual prefixes to lookup
//!   entries and the two-level 16/32-bit prefix dictionary
//! - `engine`: the batched-window CPU search loop with the
//!   endomorphism/symmetry fan-out and hit validation
//! - `backend`: the pluggable accelerator contract, validated host-side
//!   through the same path as CPU hits
//! - `coordinator`: worker pool, rate smoothing, ETA, rekey timer

pub mod address;
pub mod backend;
pub mod cli;
pub mod coordinator;
pub mod crypto;
pub mod engine;
pub mod error;
pub mod index;
pub mod math;
pub mod output;
pub mod prefix;
pub mod seed;

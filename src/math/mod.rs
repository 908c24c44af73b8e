//! Curve-level constants and scalar helpers.
//!
//! The base-field hot path lives in [`field`]; affine points and the
//! generator table in [`point`]. Order arithmetic (key reconstruction,
//! endomorphism scalar multiplication) rides on `k256::Scalar`.

pub mod field;
pub mod point;

pub use field::{batch_invert, FieldElement};
pub use point::{GroupTable, Point};

use k256::elliptic_curve::PrimeField;
use k256::Scalar;
use rand::RngCore;
use std::sync::LazyLock;

pub const GENERATOR_X: FieldElement = FieldElement::from_limbs([
    0x59F2_815B_16F8_1798,
    0x029B_FCDB_2DCE_28D9,
    0x55A0_6295_CE87_0B07,
    0x79BE_667E_F9DC_BBAC,
]);

pub const GENERATOR_Y: FieldElement = FieldElement::from_limbs([
    0x9C47_D08F_FB10_D4B8,
    0xFD17_B448_A685_5419,
    0x5DA4_FBFC_0E11_08A8,
    0x483A_DA77_26A3_C465,
]);

/// Nontrivial cube root of unity in the base field: (beta*x, y) = lambda*(x, y).
pub const BETA: FieldElement = FieldElement::from_limbs([
    0xC139_6C28_7195_01EE,
    0x9CF0_4975_12F5_8995,
    0x6E64_479E_AC34_34E9,
    0x7AE9_6A2B_657C_0710,
]);

/// beta^2 = beta^-1.
pub const BETA2: FieldElement = FieldElement::from_limbs([
    0x3EC6_93D6_8E6A_FA40,
    0x630F_B68A_ED0A_766A,
    0x919B_B861_53CB_CB16,
    0x8516_95D4_9A83_F8EF,
]);

/// Nontrivial cube root of unity modulo the curve order.
pub static LAMBDA: LazyLock<Scalar> = LazyLock::new(|| {
    scalar_from_hex("5363ad4cc05c30e0a5261c028812645a122e22ea20816678df02967c1b23bd72")
});

/// lambda^2 = lambda^-1.
pub static LAMBDA2: LazyLock<Scalar> = LazyLock::new(|| {
    scalar_from_hex("ac9c52b33fa3cf1f5ad9e3fd77ed9ba4a880b9fc8ec739c2e0cfc810b51283ce")
});

fn scalar_from_hex(s: &str) -> Scalar {
    let bytes = hex::decode(s).expect("valid hex constant");
    let arr: [u8; 32] = bytes.as_slice().try_into().expect("32-byte constant");
    Scalar::from_repr_vartime(arr.into()).expect("constant below curve order")
}

/// A u64 value shifted left by a whole number of bytes, as an order
/// scalar. Used for the deterministic per-worker key offsets.
pub fn scalar_shifted(v: u64, shift_bits: usize) -> Scalar {
    debug_assert!(shift_bits % 8 == 0 && shift_bits <= 192);
    let mut bytes = [0u8; 32];
    let end = 32 - shift_bits / 8;
    bytes[end - 8..end].copy_from_slice(&v.to_be_bytes());
    Scalar::from_repr_vartime(bytes.into()).expect("shifted offset below curve order")
}

/// Uniform nonzero scalar by rejection sampling.
pub fn random_scalar(rng: &mut impl RngCore) -> Scalar {
    loop {
        let mut buf = [0u8; 32];
        rng.fill_bytes(&mut buf);
        if let Some(s) = Scalar::from_repr_vartime(buf.into()) {
            if s != Scalar::ZERO {
                return s;
            }
        }
    }
}

pub fn scalar_to_bytes(k: &Scalar) -> [u8; 32] {
    let mut out = [0u8; 32];
    out.copy_from_slice(&k.to_repr());
    out
}

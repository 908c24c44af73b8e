//! Affine curve points over the crate field element, plus the precomputed
//! generator table the incremental window walk runs on. Scalar
//! multiplication itself is delegated to the curve library; everything on
//! the hot path is plain affine chord-and-tangent arithmetic.

use k256::elliptic_curve::sec1::ToEncodedPoint;
use k256::{ProjectivePoint, Scalar};

use super::field::FieldElement;
use super::{GENERATOR_X, GENERATOR_Y};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Point {
    pub x: FieldElement,
    pub y: FieldElement,
}

impl Point {
    pub const GENERATOR: Point = Point {
        x: GENERATOR_X,
        y: GENERATOR_Y,
    };

    /// k*G through the curve library. `k` must be nonzero.
    pub fn from_scalar(k: &Scalar) -> Point {
        let affine = (ProjectivePoint::GENERATOR * *k).to_affine();
        let enc = affine.to_encoded_point(false);
        let mut x = [0u8; 32];
        let mut y = [0u8; 32];
        x.copy_from_slice(enc.x().expect("nonzero scalar"));
        y.copy_from_slice(enc.y().expect("nonzero scalar"));
        Point {
            x: FieldElement::from_bytes(&x).expect("coordinate below field modulus"),
            y: FieldElement::from_bytes(&y).expect("coordinate below field modulus"),
        }
    }

    #[inline]
    pub fn negate(&self) -> Point {
        Point {
            x: self.x,
            y: self.y.negate(),
        }
    }

    /// Chord addition; the two x-coordinates must differ.
    pub fn add_affine(&self, q: &Point) -> Point {
        let s = q.y.sub(&self.y).mul(&q.x.sub(&self.x).invert());
        let rx = s.square().sub(&self.x).sub(&q.x);
        let ry = s.mul(&self.x.sub(&rx)).sub(&self.y);
        Point { x: rx, y: ry }
    }

    /// Tangent doubling; `y` must be nonzero.
    pub fn double_affine(&self) -> Point {
        let s = self
            .x
            .square()
            .mul(&FieldElement::from_u64(3))
            .mul(&self.y.add(&self.y).invert());
        let rx = s.square().sub(&self.x).sub(&self.x);
        let ry = s.mul(&self.x.sub(&rx)).sub(&self.y);
        Point { x: rx, y: ry }
    }
}

/// Precomputed generator multiples for one window: `gn[i] = (i+1)*G` for
/// the first half of the window, and `delta = size*G` for advancing the
/// window center by a full stride.
pub struct GroupTable {
    pub gn: Vec<Point>,
    pub delta: Point,
    pub size: usize,
}

impl GroupTable {
    pub fn new(size: usize) -> Self {
        assert!(
            size >= 4 && size.is_power_of_two(),
            "window size must be a power of two >= 4"
        );
        let half = size / 2;
        let g = Point::GENERATOR;
        let mut gn = Vec::with_capacity(half);
        gn.push(g);
        gn.push(g.double_affine());
        for i in 2..half {
            gn.push(gn[i - 1].add_affine(&g));
        }
        let delta = gn[half - 1].double_affine();
        GroupTable { gn, delta, size }
    }
}

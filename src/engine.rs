//! CPU search engine.
//!
//! Each worker walks windows of `W` consecutive scalars. For a window
//! centered on `C = k*G`, the additions `C + i*G` and `C - i*G` share the
//! denominator `Gn[i].x - C.x` (negating a point keeps its x-coordinate),
//! so one grouped inverse over `W/2 + 1` deltas yields the whole window
//! plus the next center. Every produced point then fans out into six
//! hash160 candidates through the two GLV endomorphisms and the curve's
//! y-negation symmetry, each probed against the prefix index.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use k256::Scalar;
use rand::RngCore;

use crate::address;
use crate::coordinator::WorkerSlot;
use crate::crypto;
use crate::index::{Bucket, PrefixIndex};
use crate::math::{self, batch_invert, FieldElement, GroupTable, Point, BETA, BETA2, LAMBDA, LAMBDA2};
use crate::output::OutputSink;
use crate::prefix::PrefixEntry;

/// Scalars per window. Power of two; one grouped inverse serves the
/// whole window.
pub const CPU_GRP_SIZE: usize = 1024;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SearchMode {
    Uncompressed,
    Compressed,
    Both,
}

impl SearchMode {
    pub fn label(&self) -> &'static str {
        match self {
            SearchMode::Uncompressed => "Uncompressed",
            SearchMode::Compressed => "Compressed",
            SearchMode::Both => "Compressed or Uncompressed",
        }
    }
}

/// Everything the workers share. Read-only after construction except for
/// the monotone `found` bits, the found counter, and the end latch.
pub struct SearchContext {
    pub index: PrefixIndex,
    pub mode: SearchMode,
    pub stop_when_found: bool,
    /// Rekey interval in Mkeys; 0 means deterministic keys from `start_key`.
    pub rekey: u64,
    pub start_key: Scalar,
    pub table: GroupTable,
    pub sink: OutputSink,
    pub end_of_search: AtomicBool,
    pub found_count: AtomicU64,
}

impl SearchContext {
    pub fn new(
        index: PrefixIndex,
        mode: SearchMode,
        stop_when_found: bool,
        rekey: u64,
        start_key: Scalar,
        sink: OutputSink,
        grp_size: usize,
    ) -> Self {
        SearchContext {
            index,
            mode,
            stop_when_found,
            rekey,
            start_key,
            table: GroupTable::new(grp_size),
            sink,
            end_of_search: AtomicBool::new(false),
            found_count: AtomicU64::new(0),
        }
    }

    #[inline(always)]
    pub fn search_over(&self) -> bool {
        self.end_of_search.load(Ordering::Relaxed)
    }

    pub fn request_stop(&self) {
        self.end_of_search.store(true, Ordering::Relaxed);
    }
}

/// Starting scalar for a CPU worker: random under rekeying, otherwise the
/// master key offset by `thread_id << 64`. Returns the bottom-of-window
/// scalar and the window center point.
fn cpu_starting_key(
    ctx: &SearchContext,
    thread_id: usize,
    rng: &mut impl RngCore,
) -> (Scalar, Point) {
    let key = if ctx.rekey > 0 {
        math::random_scalar(rng)
    } else {
        ctx.start_key + math::scalar_shifted(thread_id as u64, 64)
    };
    let center = key + Scalar::from((ctx.table.size / 2) as u64);
    (key, Point::from_scalar(&center))
}

/// Produce the window around `center` into `pts` and return the next
/// center. `pts[j]` ends up holding `(k + j)*G` where `k` is the scalar
/// `W/2` below the center; the stride between consecutive windows is
/// exactly `W`.
pub(crate) fn fill_window(
    table: &GroupTable,
    center: &Point,
    dx: &mut [FieldElement],
    dx_inv: &mut [FieldElement],
    pts: &mut [Point],
) -> Point {
    let half = table.size / 2;
    let h_len = half - 1;

    for i in 0..half {
        dx[i] = table.gn[i].x.sub(&center.x);
    }
    dx[half] = table.delta.x.sub(&center.x);

    batch_invert(&dx[..half + 1], dx_inv);

    pts[half] = *center;

    for i in 0..h_len {
        let gn = &table.gn[i];
        let inv = &dx_inv[i];

        // C + (i+1)*G
        let s = gn.y.sub(&center.y).mul(inv);
        let rx = s.square().sub(&center.x).sub(&gn.x);
        let ry = s.mul(&gn.x.sub(&rx)).sub(&gn.y);
        pts[half + i + 1] = Point { x: rx, y: ry };

        // C - (i+1)*G, reusing the same inverse
        let sn = gn.y.negate().sub(&center.y).mul(inv);
        let rxn = sn.square().sub(&center.x).sub(&gn.x);
        let ryn = sn.mul(&gn.x.sub(&rxn)).add(&gn.y);
        pts[half - i - 1] = Point { x: rxn, y: ryn };
    }

    // leftmost slot: C - (W/2)*G
    {
        let gn = &table.gn[h_len];
        let inv = &dx_inv[h_len];
        let sn = gn.y.negate().sub(&center.y).mul(inv);
        let rxn = sn.square().sub(&center.x).sub(&gn.x);
        let ryn = sn.mul(&gn.x.sub(&rxn)).add(&gn.y);
        pts[0] = Point { x: rxn, y: ryn };
    }

    // next center: C + W*G
    let d = &table.delta;
    let inv = &dx_inv[half];
    let s = d.y.sub(&center.y).mul(inv);
    let rx = s.square().sub(&center.x).sub(&d.x);
    let ry = s.mul(&d.x.sub(&rx)).sub(&d.y);
    Point { x: rx, y: ry }
}

/// Worker loop. Runs until the end latch is set; rekey requests are
/// honored at window boundaries only.
pub fn find_key_cpu(ctx: &SearchContext, slot: &WorkerSlot, thread_id: usize) {
    let grp = ctx.table.size;
    let half = grp / 2;

    let mut rng = rand::thread_rng();
    let (mut key, mut center) = cpu_starting_key(ctx, thread_id, &mut rng);

    let mut dx = vec![FieldElement::ZERO; half + 1];
    let mut dx_inv = vec![FieldElement::ZERO; half + 1];
    let mut pts = vec![Point::GENERATOR; grp];

    slot.rekey_request.store(false, Ordering::Relaxed);
    slot.has_started.store(true, Ordering::Release);

    while !ctx.search_over() {
        if slot.rekey_request.swap(false, Ordering::Relaxed) {
            let (k, c) = cpu_starting_key(ctx, thread_id, &mut rng);
            key = k;
            center = c;
        }

        let next_center = fill_window(&ctx.table, &center, &mut dx, &mut dx_inv, &mut pts);

        for (i, point) in pts.iter().enumerate() {
            if ctx.search_over() {
                break;
            }
            match ctx.mode {
                SearchMode::Compressed => check_candidates(ctx, true, &key, i as i64, point),
                SearchMode::Uncompressed => check_candidates(ctx, false, &key, i as i64, point),
                SearchMode::Both => {
                    check_candidates(ctx, true, &key, i as i64, point);
                    check_candidates(ctx, false, &key, i as i64, point);
                }
            }
        }

        key = key + Scalar::from(grp as u64);
        center = next_center;
        // point + endo1 + endo2, and their symmetric halves
        slot.counter.fetch_add((6 * grp) as u64, Ordering::Relaxed);
    }

    slot.is_running.store(false, Ordering::Release);
}

/// Six hash160 candidates per point: the point itself, the two GLV
/// endomorphisms, and the y-negated trio mapping to the negated scalars.
fn check_candidates(ctx: &SearchContext, compressed: bool, key: &Scalar, incr: i64, p: &Point) {
    let beta_x = p.x.mul(&BETA);
    let beta2_x = p.x.mul(&BETA2);
    let neg_y = p.y.negate();

    let variants: [(&FieldElement, &FieldElement, i64, u8); 6] = [
        (&p.x, &p.y, incr, 0),
        (&beta_x, &p.y, incr, 1),
        (&beta2_x, &p.y, incr, 2),
        (&p.x, &neg_y, -incr, 0),
        (&beta_x, &neg_y, -incr, 1),
        (&beta2_x, &neg_y, -incr, 2),
    ];

    for (x, y, inc, endo) in variants {
        let h = if compressed {
            crypto::hash160_compressed(&x.to_bytes(), y.is_odd())
        } else {
            crypto::hash160_uncompressed(&x.to_bytes(), &y.to_bytes())
        };
        if let Some(bucket) = ctx.index.probe(&h) {
            check_bucket(ctx, bucket, &h, key, inc, endo, compressed);
        }
    }
}

/// Probe entry point for candidates coming from an accelerator backend.
pub fn process_candidate(
    ctx: &SearchContext,
    hash160: &[u8; 20],
    key: &Scalar,
    incr: i64,
    endo: u8,
    compressed: bool,
) {
    if let Some(bucket) = ctx.index.probe(hash160) {
        check_bucket(ctx, bucket, hash160, key, incr, endo, compressed);
    }
}

fn check_bucket(
    ctx: &SearchContext,
    bucket: &Bucket,
    hash160: &[u8; 20],
    key: &Scalar,
    incr: i64,
    endo: u8,
    compressed: bool,
) {
    if ctx.index.only_full() {
        for entry in &bucket.entries {
            if ctx.stop_when_found && entry.is_found() {
                continue;
            }
            if entry.matches(hash160, None)
                && check_priv_key(ctx, &address::p2pkh_address(hash160), key, incr, endo, compressed)
            {
                mark_found(ctx, entry);
            }
        }
    } else {
        // partial entries compare against the (unverified) Base58Check
        // rendering of the candidate hash
        let addr = address::p2pkh_address(hash160);
        for entry in &bucket.entries {
            if ctx.stop_when_found && entry.is_found() {
                continue;
            }
            if entry.matches(hash160, Some(&addr))
                && check_priv_key(ctx, &addr, key, incr, endo, compressed)
            {
                mark_found(ctx, entry);
            }
        }
    }
}

fn mark_found(ctx: &SearchContext, entry: &PrefixEntry) {
    entry.mark_found();
    ctx.found_count.fetch_add(1, Ordering::Relaxed);
    ctx.index.refresh_difficulty();
    if ctx.stop_when_found && ctx.index.all_found() {
        ctx.end_of_search.store(true, Ordering::Relaxed);
    }
}

fn derive_address(k: &Scalar, compressed: bool) -> String {
    let p = Point::from_scalar(k);
    let h = if compressed {
        crypto::hash160_compressed(&p.x.to_bytes(), p.y.is_odd())
    } else {
        crypto::hash160_uncompressed(&p.x.to_bytes(), &p.y.to_bytes())
    };
    address::p2pkh_address(&h)
}

/// Reconstruct the private key behind a matched candidate and emit it.
///
/// The scalar is the window key plus the (signed) slot offset, multiplied
/// through the matching endomorphism. A compressed address loses the
/// y-parity of the public key, so `n - k` is tried before declaring a
/// false positive.
fn check_priv_key(
    ctx: &SearchContext,
    address: &str,
    base_key: &Scalar,
    incr: i64,
    endo: u8,
    compressed: bool,
) -> bool {
    let mut k = if incr < 0 {
        -(*base_key + Scalar::from(incr.unsigned_abs()))
    } else {
        *base_key + Scalar::from(incr as u64)
    };
    match endo {
        1 => k = k * *LAMBDA,
        2 => k = k * *LAMBDA2,
        _ => {}
    }
    if k == Scalar::ZERO {
        return false;
    }

    let mut derived = derive_address(&k, compressed);
    if derived != address {
        if compressed {
            k = -k;
            derived = derive_address(&k, compressed);
        }
        if derived != address {
            println!("\nWarning, wrong private key generated !");
            println!("  Addr :{}", address);
            println!("  Check:{}", derived);
            return false;
        }
    }

    let key_bytes = math::scalar_to_bytes(&k);
    ctx.sink.write_match(
        address,
        &address::to_wif(&key_bytes, compressed),
        &hex::encode(key_bytes),
    );
    true
}

//! Pluggable accelerator contract.
//!
//! An accelerator engine receives a snapshot of the prefix index, the
//! search mode, and one starting point per lane, then streams back
//! candidate items. The host validates every item through the same
//! private-key reconstruction path as a CPU hit, so a backend can only
//! cost throughput, never correctness. A CPU-only build carries no
//! backend; requesting one degrades to a warning at device-open time.

use std::sync::atomic::Ordering;

use k256::Scalar;
use rand::RngCore;

use crate::coordinator::WorkerSlot;
use crate::engine::{self, SearchContext, SearchMode};
use crate::error::{Result, VanityError};
use crate::index::{LongPrefixes, PrefixIndex};
use crate::math::{self, Point};

/// One candidate reported by an accelerator.
pub struct FoundItem {
    pub hash160: [u8; 20],
    /// Lane whose starting key produced the candidate.
    pub lane: u32,
    /// Signed step offset from the lane's window key.
    pub incr: i32,
    /// 0 = plain point, 1 and 2 = the GLV endomorphisms.
    pub endo: u8,
    pub compressed: bool,
}

/// Read-only copy of the prefix index in the layout backends consume:
/// the used 16-bit buckets, and per bucket the sorted 32-bit prefixes.
pub struct PrefixSnapshot {
    pub only_full: bool,
    pub short16: Vec<u16>,
    pub long32: Vec<LongPrefixes>,
}

pub fn snapshot(index: &PrefixIndex) -> PrefixSnapshot {
    let (long32, _, _) = index.second_level();
    PrefixSnapshot {
        only_full: index.only_full(),
        short16: long32.iter().map(|l| l.short16).collect(),
        long32,
    }
}

pub trait AcceleratorEngine: Send {
    fn device_name(&self) -> String;
    fn lane_count(&self) -> usize;
    fn group_size(&self) -> usize;
    /// Capacity hint for the result buffer.
    fn max_found(&self) -> usize {
        65536
    }
    fn set_search_mode(&mut self, mode: SearchMode);
    fn set_prefixes(&mut self, snapshot: &PrefixSnapshot) -> Result<()>;
    fn set_starting_points(&mut self, points: &[Point]) -> Result<()>;
    fn launch(&mut self) -> Result<Vec<FoundItem>>;
}

/// Open an accelerator device. No backend is compiled into this build.
pub fn open_device(gpu_id: usize, _grid_size: i32) -> Result<Box<dyn AcceleratorEngine>> {
    Err(VanityError::Backend(format!(
        "GPU backend not compiled in (device {})",
        gpu_id
    )))
}

/// Starting scalars for every accelerator lane: random under rekeying,
/// otherwise the master key offset by `(lane << 80) | (device << 112)`.
/// Returns the per-lane window keys and their center points.
pub fn gpu_starting_keys(
    ctx: &SearchContext,
    device_id: usize,
    group_size: usize,
    lanes: usize,
    rng: &mut impl RngCore,
) -> (Vec<Scalar>, Vec<Point>) {
    let mut keys = Vec::with_capacity(lanes);
    let mut points = Vec::with_capacity(lanes);
    for lane in 0..lanes {
        let key = if ctx.rekey > 0 {
            math::random_scalar(rng)
        } else {
            ctx.start_key
                + math::scalar_shifted(lane as u64, 80)
                + math::scalar_shifted(device_id as u64, 112)
        };
        let center = key + Scalar::from((group_size / 2) as u64);
        keys.push(key);
        points.push(Point::from_scalar(&center));
    }
    (keys, points)
}

/// Host side of the accelerator loop.
pub fn find_key_gpu(
    ctx: &SearchContext,
    slot: &WorkerSlot,
    device_id: usize,
    mut device: Box<dyn AcceleratorEngine>,
) {
    println!("GPU: {}", device.device_name());
    let lanes = device.lane_count();
    let step = device.group_size();
    let mut rng = rand::thread_rng();

    let (mut keys, points) = gpu_starting_keys(ctx, device_id, step, lanes, &mut rng);
    device.set_search_mode(ctx.mode);
    let mut ok = true;
    if let Err(e) = device.set_prefixes(&snapshot(&ctx.index)) {
        println!("[!] accelerator setup failed: {}", e);
        ok = false;
    }
    if ok {
        if let Err(e) = device.set_starting_points(&points) {
            println!("[!] accelerator setup failed: {}", e);
            ok = false;
        }
    }

    slot.rekey_request.store(false, Ordering::Relaxed);
    slot.has_started.store(true, Ordering::Release);

    while ok && !ctx.search_over() {
        if slot.rekey_request.swap(false, Ordering::Relaxed) {
            let (new_keys, new_points) = gpu_starting_keys(ctx, device_id, step, lanes, &mut rng);
            keys = new_keys;
            if let Err(e) = device.set_starting_points(&new_points) {
                println!("[!] accelerator rekey failed: {}", e);
                break;
            }
        }

        match device.launch() {
            Ok(items) => {
                for item in items {
                    if ctx.search_over() {
                        break;
                    }
                    if let Some(key) = keys.get(item.lane as usize) {
                        engine::process_candidate(
                            ctx,
                            &item.hash160,
                            key,
                            item.incr as i64,
                            item.endo,
                            item.compressed,
                        );
                    }
                }
                for key in keys.iter_mut() {
                    *key = *key + Scalar::from(step as u64);
                }
                slot.counter
                    .fetch_add((6 * step * lanes) as u64, Ordering::Relaxed);
            }
            Err(e) => {
                println!("[!] accelerator failure: {}", e);
                break;
            }
        }
    }

    slot.is_running.store(false, Ordering::Release);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto;
    use crate::engine::SearchMode;
    use crate::index::PrefixIndex;
    use crate::output::OutputSink;
    use std::sync::Arc;

    /// Backend double: reports one planted candidate, then runs dry.
    struct MockEngine {
        item: Option<FoundItem>,
    }

    impl AcceleratorEngine for MockEngine {
        fn device_name(&self) -> String {
            "mock-0".to_string()
        }
        fn lane_count(&self) -> usize {
            4
        }
        fn group_size(&self) -> usize {
            64
        }
        fn set_search_mode(&mut self, _mode: SearchMode) {}
        fn set_prefixes(&mut self, snapshot: &PrefixSnapshot) -> Result<()> {
            assert!(snapshot.only_full);
            assert!(!snapshot.short16.is_empty());
            Ok(())
        }
        fn set_starting_points(&mut self, points: &[Point]) -> Result<()> {
            assert_eq!(points.len(), self.lane_count());
            Ok(())
        }
        fn launch(&mut self) -> Result<Vec<FoundItem>> {
            match self.item.take() {
                Some(item) => Ok(vec![item]),
                None => Err(VanityError::Backend("drained".to_string())),
            }
        }
    }

    #[test]
    fn host_validates_backend_items_like_cpu_hits() {
        let secret = Scalar::from(0xACCE55u64);
        let p = Point::from_scalar(&secret);
        let h = crypto::hash160_compressed(&p.x.to_bytes(), p.y.is_odd());
        let target = crate::address::p2pkh_address(&h);

        // lane 0 carries the master key; plant the secret 7 steps above it
        let start = secret + (-Scalar::from(7u64));
        let index = PrefixIndex::build(&[target]).unwrap();
        let ctx = Arc::new(SearchContext::new(
            index,
            SearchMode::Compressed,
            true,
            0,
            start,
            OutputSink::new(None),
            64,
        ));

        let device = Box::new(MockEngine {
            item: Some(FoundItem {
                hash160: h,
                lane: 0,
                incr: 7,
                endo: 0,
                compressed: true,
            }),
        });

        let slot = WorkerSlot::new(true);
        find_key_gpu(&ctx, &slot, 0, device);

        assert_eq!(ctx.found_count.load(Ordering::Relaxed), 1);
        assert!(ctx.search_over());
        assert!(!slot.is_running.load(Ordering::Relaxed));
        assert_eq!(slot.counter.load(Ordering::Relaxed), 6 * 64 * 4);
    }

    #[test]
    fn lane_offsets_are_disjoint() {
        let index = PrefixIndex::build(&["1BgGZ9tcN4rm9KBzDn7KprQz87SZ26SAMH".to_string()]).unwrap();
        let ctx = SearchContext::new(
            index,
            SearchMode::Compressed,
            false,
            0,
            Scalar::from(1u64),
            OutputSink::new(None),
            64,
        );
        let mut rng = rand::thread_rng();
        let (keys, points) = gpu_starting_keys(&ctx, 1, 64, 3, &mut rng);
        assert_eq!(keys.len(), 3);
        assert_eq!(points.len(), 3);
        assert_ne!(keys[0], keys[1]);
        assert_ne!(keys[1], keys[2]);
        // lane stride is 2^80
        let stride = math::scalar_shifted(1, 80);
        assert_eq!(keys[1], keys[0] + stride);
    }

    #[test]
    fn open_device_degrades_to_error() {
        assert!(open_device(0, -1).is_err());
    }
}

//! Worker pool and console coordinator.
//!
//! The coordinator owns the per-worker slots (counter, liveness, rekey
//! request), polls them twice a second, and re-emits the status line every
//! two seconds with the key rate smoothed through an 8-entry filter.
//! Counters are written only by their owning worker and read here; torn
//! reads would only perturb the rate estimate.

use std::io::Write;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::backend;
use crate::engine::{self, SearchContext};

const FILTER_SIZE: usize = 8;

pub struct WorkerSlot {
    pub counter: AtomicU64,
    pub has_started: AtomicBool,
    pub is_running: AtomicBool,
    pub rekey_request: AtomicBool,
    pub gpu: bool,
}

impl WorkerSlot {
    pub fn new(gpu: bool) -> Self {
        WorkerSlot {
            counter: AtomicU64::new(0),
            has_started: AtomicBool::new(false),
            is_running: AtomicBool::new(true),
            rekey_request: AtomicBool::new(false),
            gpu,
        }
    }
}

/// Minimal pool over OS threads: spawn with an owned slot, broadcast
/// rekey requests, join at the end.
pub struct WorkerPool {
    slots: Vec<Arc<WorkerSlot>>,
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    pub fn new() -> Self {
        WorkerPool {
            slots: Vec::new(),
            handles: Vec::new(),
        }
    }

    pub fn spawn<F>(&mut self, gpu: bool, f: F)
    where
        F: FnOnce(Arc<WorkerSlot>) + Send + 'static,
    {
        let slot = Arc::new(WorkerSlot::new(gpu));
        let worker_slot = Arc::clone(&slot);
        self.slots.push(slot);
        self.handles.push(thread::spawn(move || f(worker_slot)));
    }

    pub fn broadcast_rekey(&self) {
        for slot in &self.slots {
            slot.rekey_request.store(true, Ordering::Relaxed);
        }
    }

    pub fn all_started(&self) -> bool {
        self.slots
            .iter()
            .all(|s| s.has_started.load(Ordering::Acquire))
    }

    pub fn all_running(&self) -> bool {
        self.slots
            .iter()
            .all(|s| s.is_running.load(Ordering::Acquire))
    }

    pub fn worker_count(&self) -> usize {
        self.slots.len()
    }

    /// Sum of the counters for CPU (`gpu == false`) or GPU workers.
    pub fn key_count(&self, gpu: bool) -> u64 {
        self.slots
            .iter()
            .filter(|s| s.gpu == gpu)
            .map(|s| s.counter.load(Ordering::Relaxed))
            .sum()
    }

    pub fn join_all(self) {
        for handle in self.handles {
            let _ = handle.join();
        }
    }
}

impl Default for WorkerPool {
    fn default() -> Self {
        Self::new()
    }
}

fn log1m_taylor(x: f64) -> f64 {
    // log(1-x) for x too small for the direct logarithm
    -x - x * x / 2.0 - x * x * x / 3.0 - x * x * x * x / 4.0
}

/// `[P <current>%][<target>% in <eta>]` for the status line.
///
/// With per-trial success probability `P = 1/difficulty` and `key_count`
/// tries behind us, the current hit probability is `1 - (1-P)^key_count`.
/// The target is the next multiple of 0.1 above it, capped at 0.99;
/// the remaining tries solve `1 - (1-P)^k = target`.
pub fn expected_time(difficulty: f64, key_rate: f64, key_count: f64) -> String {
    let p = 1.0 / difficulty;
    let cp = 1.0 - (1.0 - p).powf(key_count);

    let mut out = format!("[P {:.2}%]", cp * 100.0);

    let mut desired = 0.5;
    while desired < cp {
        desired += 0.1;
    }
    if desired >= 0.99 {
        desired = 0.99;
    }

    let mut k = (1.0 - desired).ln() / (1.0 - p).ln();
    if k.is_infinite() {
        k = (1.0 - desired).ln() / log1m_taylor(p);
    }
    let mut dtime = if key_rate > 0.0 {
        (k - key_count) / key_rate
    } else {
        0.0
    };
    if dtime < 0.0 {
        dtime = 0.0;
    }

    let nb_day = dtime / 86400.0;
    if nb_day >= 1.0 {
        let nb_year = nb_day / 365.0;
        if nb_year > 1.0 {
            if nb_year < 5.0 {
                out.push_str(&format!("[{:.2}% in {:.1}y]", desired * 100.0, nb_year));
            } else {
                out.push_str(&format!("[{:.2}% in {:e}y]", desired * 100.0, nb_year));
            }
        } else {
            out.push_str(&format!("[{:.2}% in {:.1}d]", desired * 100.0, nb_day));
        }
    } else {
        let itime = dtime as u64;
        out.push_str(&format!(
            "[{:.2}% in {:02}:{:02}:{:02}]",
            desired * 100.0,
            (itime % 86400) / 3600,
            (itime % 3600) / 60,
            itime % 60
        ));
    }
    out
}

pub struct Coordinator {
    ctx: Arc<SearchContext>,
}

impl Coordinator {
    pub fn new(ctx: Arc<SearchContext>) -> Self {
        Coordinator { ctx }
    }

    pub fn run(&self, cpu_threads: usize, gpu_ids: &[usize], grid_sizes: &[i32]) {
        let mut pool = WorkerPool::new();

        println!("Number of CPU thread: {}", cpu_threads);
        for thread_id in 0..cpu_threads {
            let ctx = Arc::clone(&self.ctx);
            pool.spawn(false, move |slot| engine::find_key_cpu(&ctx, &slot, thread_id));
        }

        for (i, &gpu_id) in gpu_ids.iter().enumerate() {
            let grid = grid_sizes.get(i).copied().unwrap_or(-1);
            match backend::open_device(gpu_id, grid) {
                Ok(device) => {
                    let ctx = Arc::clone(&self.ctx);
                    pool.spawn(true, move |slot| {
                        backend::find_key_gpu(&ctx, &slot, gpu_id, device)
                    });
                }
                Err(e) => println!("[!] {} — continuing without GPU {}", e, gpu_id),
            }
        }

        if pool.worker_count() == 0 {
            println!("[!] no workers to run");
            return;
        }

        while !pool.all_started() {
            thread::sleep(Duration::from_millis(500));
        }

        let mut rate_filter = [0f64; FILTER_SIZE];
        let mut gpu_rate_filter = [0f64; FILTER_SIZE];
        let mut filter_pos = 0usize;
        let mut last_count = 0u64;
        let mut last_gpu_count = 0u64;
        let mut last_rekey = 0u64;
        let mut tick = Instant::now();

        while pool.all_running() {
            let mut delay = 2000i64;
            while pool.all_running() && delay > 0 {
                thread::sleep(Duration::from_millis(500));
                delay -= 500;
            }

            let gpu_count = pool.key_count(true);
            let count = pool.key_count(false) + gpu_count;
            let dt = tick.elapsed().as_secs_f64();
            tick = Instant::now();

            rate_filter[filter_pos % FILTER_SIZE] = (count - last_count) as f64 / dt;
            gpu_rate_filter[filter_pos % FILTER_SIZE] = (gpu_count - last_gpu_count) as f64 / dt;
            filter_pos += 1;

            let samples = filter_pos.min(FILTER_SIZE);
            let avg_rate: f64 = rate_filter[..samples].iter().sum::<f64>() / samples as f64;
            let avg_gpu_rate: f64 = gpu_rate_filter[..samples].iter().sum::<f64>() / samples as f64;

            if pool.all_running() {
                print!(
                    "\r{:.3} MK/s (GPU {:.3} MK/s) (2^{:.2}) {}[{}]  ",
                    avg_rate / 1_000_000.0,
                    avg_gpu_rate / 1_000_000.0,
                    (count.max(1) as f64).log2(),
                    expected_time(self.ctx.index.difficulty(), avg_rate, count as f64),
                    self.ctx.found_count.load(Ordering::Relaxed)
                );
                let _ = std::io::stdout().flush();
            }

            if self.ctx.rekey > 0 && count - last_rekey > 1_000_000 * self.ctx.rekey {
                pool.broadcast_rekey();
                last_rekey = count;
            }

            last_count = count;
            last_gpu_count = gpu_count;
        }

        pool.join_all();
        println!();
    }
}

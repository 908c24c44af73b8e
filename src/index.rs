//! Two-level prefix lookup: a dense 65536-bucket table keyed by the first
//! two bytes of hash160, each bucket holding the compiled entries whose
//! synthesized 16-bit prefix lands there. A compact sorted list of 32-bit
//! prefixes per bucket is kept for accelerator backends.
//!
//! After build the structure is read-only except for the monotone `found`
//! bits; probing depends only on the first two bytes of the candidate
//! hash, so a matching scalar is never skipped regardless of where in the
//! bucket its entry sits.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use rayon::prelude::*;

use crate::error::{Result, VanityError};
use crate::prefix::{self, PrefixEntry, PrefixKind};

pub const BUCKET_COUNT: usize = 65536;

pub struct Bucket {
    pub entries: Vec<PrefixEntry>,
    all_found: AtomicBool,
}

/// Second-level record: every 32-bit prefix present in one bucket, sorted.
pub struct LongPrefixes {
    pub short16: u16,
    pub long32: Vec<u32>,
}

pub struct PrefixIndex {
    buckets: Vec<Bucket>,
    used: Vec<u16>,
    only_full: bool,
    n_entries: usize,
    difficulty_bits: AtomicU64,
}

impl PrefixIndex {
    /// Compile and insert every input prefix. Malformed inputs are warned
    /// about and skipped; an index with zero surviving entries is an error.
    pub fn build(inputs: &[String]) -> Result<PrefixIndex> {
        let bulk = inputs.len() > 1000;
        if bulk {
            print!("[Building lookup16   0.0%]\r");
        }

        let compiled: Vec<(String, std::result::Result<PrefixEntry, prefix::PrefixError>)> =
            if bulk {
                inputs
                    .par_iter()
                    .map(|s| (s.clone(), prefix::compile(s)))
                    .collect()
            } else {
                inputs
                    .iter()
                    .map(|s| (s.clone(), prefix::compile(s)))
                    .collect()
            };

        let mut buckets: Vec<Bucket> = (0..BUCKET_COUNT)
            .map(|_| Bucket {
                entries: Vec::new(),
                all_found: AtomicBool::new(false),
            })
            .collect();
        let mut used: Vec<u16> = Vec::new();
        let mut only_full = true;
        let mut n_entries = 0usize;

        let total = compiled.len();
        for (i, (text, result)) in compiled.into_iter().enumerate() {
            match result {
                Ok(entry) => {
                    only_full &= entry.kind == PrefixKind::Full;
                    let bucket = &mut buckets[entry.short16 as usize];
                    if bucket.entries.is_empty() {
                        used.push(entry.short16);
                    }
                    bucket.entries.push(entry);
                    n_entries += 1;
                }
                Err(reason) => println!("Ignoring prefix \"{}\" ({})", text, reason),
            }
            if bulk && i % 1000 == 0 {
                print!(
                    "[Building lookup16 {:5.1}%]\r",
                    i as f64 / (total - 1) as f64 * 100.0
                );
            }
        }
        if bulk {
            println!();
        }

        if n_entries == 0 {
            return Err(VanityError::NothingToSearch);
        }
        used.sort_unstable();

        let index = PrefixIndex {
            buckets,
            used,
            only_full,
            n_entries,
            difficulty_bits: AtomicU64::new(0),
        };
        index.refresh_difficulty();
        Ok(index)
    }

    /// Bucket holding the candidate's 16-bit prefix, if non-empty.
    #[inline(always)]
    pub fn probe(&self, hash160: &[u8; 20]) -> Option<&Bucket> {
        let short = u16::from_be_bytes([hash160[0], hash160[1]]) as usize;
        let bucket = &self.buckets[short];
        if bucket.entries.is_empty() {
            None
        } else {
            Some(bucket)
        }
    }

    #[inline]
    pub fn only_full(&self) -> bool {
        self.only_full
    }

    #[inline]
    pub fn entry_count(&self) -> usize {
        self.n_entries
    }

    #[inline]
    pub fn used_bucket_count(&self) -> usize {
        self.used.len()
    }

    pub fn first_entry(&self) -> &PrefixEntry {
        &self.buckets[self.used[0] as usize].entries[0]
    }

    /// Compact second level for accelerator backends: per used bucket, the
    /// sorted 32-bit prefixes, with the [min,max] list size for reporting.
    pub fn second_level(&self) -> (Vec<LongPrefixes>, usize, usize) {
        let mut list = Vec::with_capacity(self.used.len());
        let mut min = usize::MAX;
        let mut max = 0usize;
        for &short in &self.used {
            let mut long32: Vec<u32> = self.buckets[short as usize]
                .entries
                .iter()
                .map(|e| e.long32)
                .collect();
            long32.sort_unstable();
            if self.only_full {
                long32.dedup();
            }
            min = min.min(long32.len());
            max = max.max(long32.len());
            list.push(LongPrefixes { short16: short, long32 });
        }
        (list, min, max)
    }

    /// Current minimum difficulty over the not-yet-found entries. Fixed to
    /// 2^160 when every entry is a full address.
    pub fn difficulty(&self) -> f64 {
        f64::from_bits(self.difficulty_bits.load(Ordering::Relaxed))
    }

    pub fn refresh_difficulty(&self) {
        let mut min = 2f64.powi(160);
        if !self.only_full {
            for &short in &self.used {
                for entry in &self.buckets[short as usize].entries {
                    if !entry.is_found() && entry.difficulty < min {
                        min = entry.difficulty;
                    }
                }
            }
        }
        self.difficulty_bits.store(min.to_bits(), Ordering::Relaxed);
    }

    /// Refresh per-bucket found flags; true once every entry is found.
    pub fn all_found(&self) -> bool {
        let mut all = true;
        for &short in &self.used {
            let bucket = &self.buckets[short as usize];
            let mut bucket_found = bucket.all_found.load(Ordering::Relaxed);
            if !bucket_found {
                bucket_found = bucket.entries.iter().all(|e| e.is_found());
                if bucket_found {
                    bucket.all_found.store(true, Ordering::Relaxed);
                }
            }
            all &= bucket_found;
        }
        all
    }
}

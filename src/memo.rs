use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex, PoisonError,
        atomic::{AtomicU64, Ordering},
    },
};

use tracing::trace;

use crate::{
    aggregate,
    domain::{FlowRecord, GroupKey, KeyTotal, RankedRecord, RollingStat},
    error::{FlowResult, IoError},
};

#[derive(Debug, Clone)]
enum CachedOutput {
    Ranked(Arc<Vec<RankedRecord>>),
    Totals(Arc<Vec<KeyTotal>>),
    Rolling(Arc<Vec<RollingStat>>),
}

#[derive(Debug, Clone, Copy)]
enum Op {
    RankDaily,
    TopN(usize),
    Totals(GroupKey),
    Rolling(usize),
}

impl Op {
    fn tag(&self) -> &'static [u8] {
        match self {
            Op::RankDaily => b"rank_daily",
            Op::TopN(_) => b"top_n_per_day",
            Op::Totals(_) => b"totals_by",
            Op::Rolling(_) => b"rolling_stats",
        }
    }

    fn param(&self) -> u64 {
        match self {
            Op::RankDaily => 0,
            Op::TopN(n) | Op::Rolling(n) => *n as u64,
            Op::Totals(GroupKey::EtfTicker) => 0,
            Op::Totals(GroupKey::Region) => 1,
        }
    }
}

/// Caller-owned memoization around the pure [`aggregate`] functions.
///
/// Results are keyed by a blake3 hash of the operation, its parameter and the postcard encoding
/// of the input, so two equal inputs share an entry no matter where they live. Errors are never
/// cached. The cache grows until [`clear`](Self::clear) is called.
///
/// The aggregate functions themselves hold no cache; share one `MemoizedAggregator` (e.g. in an
/// `Arc`) where reuse across calls is wanted.
#[derive(Debug, Default)]
pub struct MemoizedAggregator {
    entries: Mutex<HashMap<blake3::Hash, CachedOutput>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl MemoizedAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rank_daily(&self, records: &[FlowRecord]) -> FlowResult<Arc<Vec<RankedRecord>>> {
        let key = cache_key(Op::RankDaily, records)?;
        if let Some(CachedOutput::Ranked(hit)) = self.lookup(&key) {
            return Ok(hit);
        }
        let out = Arc::new(aggregate::rank_daily(records)?);
        self.store(key, CachedOutput::Ranked(Arc::clone(&out)));
        Ok(out)
    }

    /// Ranks (through the cache) and keeps ranks `<= n`.
    pub fn top_n_per_day(
        &self,
        records: &[FlowRecord],
        n: usize,
    ) -> FlowResult<Arc<Vec<RankedRecord>>> {
        let key = cache_key(Op::TopN(n), records)?;
        if let Some(CachedOutput::Ranked(hit)) = self.lookup(&key) {
            return Ok(hit);
        }
        let ranked = self.rank_daily(records)?;
        let out = Arc::new(aggregate::top_n_per_day(&ranked, n)?);
        self.store(key, CachedOutput::Ranked(Arc::clone(&out)));
        Ok(out)
    }

    pub fn totals_by(
        &self,
        records: &[FlowRecord],
        key: GroupKey,
    ) -> FlowResult<Arc<Vec<KeyTotal>>> {
        let entry = cache_key(Op::Totals(key), records)?;
        if let Some(CachedOutput::Totals(hit)) = self.lookup(&entry) {
            return Ok(hit);
        }
        let out = Arc::new(aggregate::totals_by(records, key)?);
        self.store(entry, CachedOutput::Totals(Arc::clone(&out)));
        Ok(out)
    }

    pub fn rolling_stats(
        &self,
        records: &[FlowRecord],
        window: usize,
    ) -> FlowResult<Arc<Vec<RollingStat>>> {
        let key = cache_key(Op::Rolling(window), records)?;
        if let Some(CachedOutput::Rolling(hit)) = self.lookup(&key) {
            return Ok(hit);
        }
        let out = Arc::new(aggregate::rolling_stats(records, window)?);
        self.store(key, CachedOutput::Rolling(Arc::clone(&out)));
        Ok(out)
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    fn lookup(&self, key: &blake3::Hash) -> Option<CachedOutput> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        match entries.get(key) {
            Some(hit) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                trace!(key = %key.to_hex(), "Aggregation cache hit");
                Some(hit.clone())
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    fn store(&self, key: blake3::Hash, value: CachedOutput) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, value);
    }
}

fn cache_key(op: Op, records: &[FlowRecord]) -> FlowResult<blake3::Hash> {
    let encoded = postcard::to_allocvec(records).map_err(IoError::Encoding)?;

    let mut hasher = blake3::Hasher::new();
    hasher.update(op.tag());
    hasher.update(&op.param().to_le_bytes());
    hasher.update(&encoded);
    Ok(hasher.finalize())
}

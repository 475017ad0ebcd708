use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::{debug, info};

use common::{Clock, Timeframe};

use crate::{Decision, Signal};

type Key = (String, Timeframe);

/// Emitted signals per (symbol, timeframe), valid for `ttl` after generation.
///
/// Writes replace whole records under the map's per-key lock, so readers
/// never observe a partially written signal.
pub struct SignalCache {
    entries: DashMap<Key, Signal>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl SignalCache {
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            clock,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn is_fresh(&self, signal: &Signal, now: DateTime<Utc>) -> bool {
        now - signal.generated_at < self.ttl
    }

    /// The cached signal, if still within its TTL.
    pub fn get(&self, symbol: &str, timeframe: Timeframe) -> Option<Signal> {
        let entry = self.entries.get(&(symbol.to_string(), timeframe))?;
        if self.is_fresh(&entry, self.clock.now()) {
            debug!(symbol, %timeframe, id = %entry.id, "Signal cache hit");
            Some(entry.clone())
        } else {
            None
        }
    }

    /// Record a freshly computed decision.
    ///
    /// A fresh entry written concurrently for the same key wins and is
    /// returned instead. An emitted signal replaces any stale entry; an
    /// absence evicts it.
    pub fn resolve(&self, symbol: &str, timeframe: Timeframe, decision: Decision) -> Decision {
        let now = self.clock.now();
        match self.entries.entry((symbol.to_string(), timeframe)) {
            Entry::Occupied(mut occupied) => {
                if self.is_fresh(occupied.get(), now) {
                    return Decision::Emit(occupied.get().clone());
                }
                match decision {
                    Decision::Emit(signal) => {
                        info!(symbol, %timeframe, id = %signal.id, "Signal cache refreshed");
                        occupied.insert(signal.clone());
                        Decision::Emit(signal)
                    }
                    no_signal => {
                        occupied.remove();
                        no_signal
                    }
                }
            }
            Entry::Vacant(vacant) => {
                if let Decision::Emit(signal) = &decision {
                    info!(symbol, %timeframe, id = %signal.id, "Signal cached");
                    vacant.insert(signal.clone());
                }
                decision
            }
        }
    }

    pub fn invalidate(&self, symbol: &str, timeframe: Timeframe) -> Option<Signal> {
        self.entries
            .remove(&(symbol.to_string(), timeframe))
            .map(|(_, signal)| signal)
    }

    /// Drop every expired entry; returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let before = self.entries.len();
        self.entries.retain(|_, signal| now - signal.generated_at < self.ttl);
        before.saturating_sub(self.entries.len())
    }

    /// Number of entries, including expired ones not yet purged.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

//! Shared dedup and quota tracking across tiers and crawl workers.
//!
//! One [`CrawlState`] is created per run and shared (via `Arc`) between the
//! Tier 1 loop and the crawl-phase workers. It is the single source of truth
//! for "have we already handled this URL" and "how many records are saved".
//!
//! The seen set covers both job-detail URLs and list-page URLs; tracking the
//! latter prevents infinite pagination loops on cyclic "next" links.
//!
//! Critical sections never await, so a `std::sync::Mutex` suffices even
//! though multiple detail pages can complete and try to increment the count
//! simultaneously.

use std::collections::HashSet;
use std::sync::Mutex;

/// Dedup set and saved-count tracker shared across concurrent workers.
#[derive(Debug)]
pub struct CrawlState {
    inner: Mutex<Inner>,
    results_wanted: usize,
}

#[derive(Debug, Default)]
struct Inner {
    seen: HashSet<String>,
    saved: usize,
}

impl CrawlState {
    pub fn new(results_wanted: usize) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            results_wanted,
        }
    }

    /// Mark a URL seen. Returns `true` the first time a URL is offered and
    /// `false` (a no-op) on every subsequent call with the same URL.
    ///
    /// Test-and-mark happens under one lock acquisition, so for any URL at
    /// most one caller across all workers ever gets `true`.
    pub fn should_process(&self, url: &str) -> bool {
        let mut inner = self.inner.lock().unwrap();
        inner.seen.insert(url.to_string())
    }

    /// Claim one emission slot against the quota.
    ///
    /// Returns the new saved count, or `None` when the quota is already met —
    /// the caller must then drop the record. Checking and incrementing under
    /// one lock keeps the saved count from ever exceeding the quota, even
    /// when several in-flight detail pages finish at once.
    pub fn claim_slot(&self) -> Option<usize> {
        let mut inner = self.inner.lock().unwrap();
        if inner.saved >= self.results_wanted {
            return None;
        }
        inner.saved += 1;
        Some(inner.saved)
    }

    pub fn saved(&self) -> usize {
        self.inner.lock().unwrap().saved
    }

    pub fn quota_met(&self) -> bool {
        self.saved() >= self.results_wanted
    }

    pub fn remaining_quota(&self) -> usize {
        self.results_wanted.saturating_sub(self.saved())
    }

    pub fn results_wanted(&self) -> usize {
        self.results_wanted
    }
}

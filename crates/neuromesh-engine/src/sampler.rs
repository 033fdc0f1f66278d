/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # Samplers
//!
//! Sampler registration is driven from the simulation: a sampler is a
//! (probe predicate, schedule, callback, policy) association identified by
//! a dense handle, broadcast to every cell group. The semantics of taking a
//! sample belong to the group.

use std::sync::Arc;

use neuromesh_types::{ProbeId, Result, SamplerHandle, Schedule, SimulationError, Time};

/// Selects which probes a sampler is attached to.
pub type ProbePredicate = Arc<dyn Fn(ProbeId) -> bool + Send + Sync>;

/// A predicate accepting every probe.
pub fn all_probes() -> ProbePredicate {
    Arc::new(|_| true)
}

/// A predicate accepting exactly one probe.
pub fn one_probe(id: ProbeId) -> ProbePredicate {
    Arc::new(move |p| p == id)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub time: Time,
    pub value: f64,
}

/// Invoked by a cell group after an advance, once per probe with the
/// samples taken in that epoch.
pub type SamplerCallback = Arc<dyn Fn(ProbeId, &[Sample]) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplingPolicy {
    /// Sample values may be taken from the nearest integration state.
    Lax,
    /// Sample values must be interpolated to the exact schedule time.
    Exact,
}

#[derive(Clone)]
pub struct SamplerAssociation {
    pub handle: SamplerHandle,
    pub probes: ProbePredicate,
    pub schedule: Schedule,
    pub callback: SamplerCallback,
    pub policy: SamplingPolicy,
}

/// Pool of dense sampler handles. Handles are recycled smallest-first so
/// ids stay compact over add/remove churn.
#[derive(Debug, Default)]
pub struct HandlePool {
    next: u32,
    free: Vec<u32>,
    live: ahash::AHashSet<u32>,
}

impl HandlePool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn acquire(&mut self) -> SamplerHandle {
        let id = match self.free.pop() {
            Some(id) => id,
            None => {
                let id = self.next;
                self.next += 1;
                id
            }
        };
        self.live.insert(id);
        SamplerHandle(id)
    }

    /// Releasing an unknown or already-released handle is a precondition
    /// error.
    pub fn release(&mut self, handle: SamplerHandle) -> Result<()> {
        if !self.live.remove(&handle.0) {
            return Err(SimulationError::UnknownSampler(handle));
        }
        self.free.push(handle.0);
        self.free.sort_unstable_by(|a, b| b.cmp(a));
        Ok(())
    }

    pub fn contains(&self, handle: SamplerHandle) -> bool {
        self.live.contains(&handle.0)
    }

    pub fn clear(&mut self) {
        self.next = 0;
        self.free.clear();
        self.live.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use neuromesh_types::NeuronId;

    #[test]
    fn test_handles_are_dense() {
        let mut pool = HandlePool::new();
        assert_eq!(pool.acquire(), SamplerHandle(0));
        assert_eq!(pool.acquire(), SamplerHandle(1));
        assert_eq!(pool.acquire(), SamplerHandle(2));
    }

    #[test]
    fn test_released_handles_are_recycled_smallest_first() {
        let mut pool = HandlePool::new();
        let h0 = pool.acquire();
        let h1 = pool.acquire();
        let _h2 = pool.acquire();

        pool.release(h1).unwrap();
        pool.release(h0).unwrap();
        assert_eq!(pool.acquire(), SamplerHandle(0));
        assert_eq!(pool.acquire(), SamplerHandle(1));
    }

    #[test]
    fn test_double_release_fails_fast() {
        let mut pool = HandlePool::new();
        let h = pool.acquire();
        pool.release(h).unwrap();

        let err = pool.release(h).unwrap_err();
        assert!(matches!(err, SimulationError::UnknownSampler(_)));
    }

    #[test]
    fn test_release_of_never_acquired_handle_fails() {
        let mut pool = HandlePool::new();
        assert!(pool.release(SamplerHandle(9)).is_err());
    }

    #[test]
    fn test_clear() {
        let mut pool = HandlePool::new();
        let h = pool.acquire();
        pool.clear();
        assert!(!pool.contains(h));
        assert_eq!(pool.acquire(), SamplerHandle(0));
    }

    #[test]
    fn test_probe_predicates() {
        let id = ProbeId {
            gid: NeuronId(1),
            index: 0,
        };
        let other = ProbeId {
            gid: NeuronId(2),
            index: 0,
        };
        assert!(all_probes()(id));
        assert!(one_probe(id)(id));
        assert!(!one_probe(id)(other));
    }
}

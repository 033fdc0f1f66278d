/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # Threaded Multi-Rank Transport
//!
//! N ranks inside one process, one transport handle per rank, each handle
//! owned by its own thread. Collectives rendezvous through shared slots:
//! every rank publishes its contribution, waits at a barrier, reads the
//! assembled result, then waits at a second barrier before the slots may be
//! reused. Contributions are genuinely distinct per rank, so the
//! partitioned exchange paths behave exactly as they would across
//! processes.
//!
//! The collective contract applies: every rank of the group must call the
//! same collectives in the same order, or the group deadlocks at a barrier.

use std::sync::{Arc, Barrier};

use parking_lot::Mutex;

use neuromesh_types::{NeuronId, Result, Spike};

use crate::gathered::partition_from_counts;
use crate::{Distributed, GatheredVector};

struct Shared {
    size: usize,
    barrier: Barrier,
    spike_slots: Mutex<Vec<Vec<Spike>>>,
    gid_slots: Mutex<Vec<Vec<NeuronId>>>,
    scalar_slots: Mutex<Vec<f64>>,
    count_slots: Mutex<Vec<u64>>,
}

pub struct ThreadedTransport {
    rank: usize,
    shared: Arc<Shared>,
}

impl ThreadedTransport {
    /// Create a group of `size` rank handles. Hand each handle to the
    /// thread that will act as that rank.
    pub fn group(size: usize) -> Vec<ThreadedTransport> {
        assert!(size > 0, "transport group needs at least one rank");
        let shared = Arc::new(Shared {
            size,
            barrier: Barrier::new(size),
            spike_slots: Mutex::new(vec![Vec::new(); size]),
            gid_slots: Mutex::new(vec![Vec::new(); size]),
            scalar_slots: Mutex::new(vec![0.0; size]),
            count_slots: Mutex::new(vec![0; size]),
        });
        tracing::debug!(size, "created threaded transport group");

        (0..size)
            .map(|rank| ThreadedTransport {
                rank,
                shared: Arc::clone(&shared),
            })
            .collect()
    }

    fn gather_impl<T: Clone>(
        &self,
        slots: &Mutex<Vec<Vec<T>>>,
        local: &[T],
    ) -> GatheredVector<T> {
        slots.lock()[self.rank] = local.to_vec();
        self.shared.barrier.wait();

        let gathered = {
            let guard = slots.lock();
            let counts: Vec<usize> = guard.iter().map(|v| v.len()).collect();
            let partition = partition_from_counts(&counts);
            let total = *partition.last().unwrap() as usize;
            let mut values = Vec::with_capacity(total);
            for contribution in guard.iter() {
                values.extend_from_slice(contribution);
            }
            GatheredVector::new(values, partition)
        };

        // Slots must not be reused until every rank has read them.
        self.shared.barrier.wait();
        gathered
    }

    fn reduce_scalar(&self, value: f64, fold: impl Fn(f64, f64) -> f64) -> f64 {
        self.shared.scalar_slots.lock()[self.rank] = value;
        self.shared.barrier.wait();

        let reduced = {
            let guard = self.shared.scalar_slots.lock();
            let mut acc = guard[0];
            for &v in &guard[1..] {
                acc = fold(acc, v);
            }
            acc
        };

        self.shared.barrier.wait();
        reduced
    }
}

impl Distributed for ThreadedTransport {
    fn name(&self) -> &'static str {
        "threaded"
    }

    fn id(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.shared.size
    }

    fn barrier(&self) -> Result<()> {
        self.shared.barrier.wait();
        Ok(())
    }

    fn gather_spikes(&self, local: &[Spike]) -> Result<GatheredVector<Spike>> {
        Ok(self.gather_impl(&self.shared.spike_slots, local))
    }

    fn gather_gids(&self, local: &[NeuronId]) -> Result<GatheredVector<NeuronId>> {
        Ok(self.gather_impl(&self.shared.gid_slots, local))
    }

    fn min(&self, value: f64) -> Result<f64> {
        Ok(self.reduce_scalar(value, f64::min))
    }

    fn max(&self, value: f64) -> Result<f64> {
        Ok(self.reduce_scalar(value, f64::max))
    }

    fn sum(&self, value: u64) -> Result<u64> {
        self.shared.count_slots.lock()[self.rank] = value;
        self.shared.barrier.wait();

        let total: u64 = self.shared.count_slots.lock().iter().sum();

        self.shared.barrier.wait();
        Ok(total)
    }
}

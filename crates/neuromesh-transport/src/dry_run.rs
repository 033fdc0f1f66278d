/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # Dry-Run Transport
//!
//! Emulates an N-rank execution from a single process: every collective
//! replicates the calling rank's contribution N times, shifting cell
//! identifiers by `rank * cells_per_tile` so each replica looks like a
//! distinct tile of a larger network. Downstream code (partitioned
//! exchange, event generation) runs unchanged, which makes this mode the
//! cheapest way to exercise the multi-rank code paths.

use neuromesh_types::{Endpoint, NeuronId, Result, Spike};

use crate::{Distributed, GatheredVector};

#[derive(Debug, Clone, Copy)]
pub struct DryRunTransport {
    num_ranks: usize,
    cells_per_tile: u32,
}

impl DryRunTransport {
    pub fn new(num_ranks: usize, cells_per_tile: u32) -> Self {
        assert!(num_ranks > 0, "dry run needs at least one rank");
        Self {
            num_ranks,
            cells_per_tile,
        }
    }

    pub fn cells_per_tile(&self) -> u32 {
        self.cells_per_tile
    }

    #[inline]
    fn shift(&self, ep: Endpoint, rank: usize) -> Endpoint {
        Endpoint::new(
            NeuronId(ep.neuron.0 + rank as u32 * self.cells_per_tile),
            ep.index,
        )
    }
}

impl Distributed for DryRunTransport {
    fn name(&self) -> &'static str {
        "dry run"
    }

    fn id(&self) -> usize {
        0
    }

    fn size(&self) -> usize {
        self.num_ranks
    }

    fn barrier(&self) -> Result<()> {
        Ok(())
    }

    fn gather_spikes(&self, local: &[Spike]) -> Result<GatheredVector<Spike>> {
        let n_local = local.len();
        let mut values = Vec::with_capacity(n_local * self.num_ranks);
        let mut partition = Vec::with_capacity(self.num_ranks + 1);
        partition.push(0);

        for rank in 0..self.num_ranks {
            for s in local {
                values.push(Spike::new(self.shift(s.source, rank), s.time));
            }
            partition.push(((rank + 1) * n_local) as u32);
        }

        Ok(GatheredVector::new(values, partition))
    }

    fn gather_gids(&self, local: &[NeuronId]) -> Result<GatheredVector<NeuronId>> {
        let n_local = local.len();
        let mut values = Vec::with_capacity(n_local * self.num_ranks);
        let mut partition = Vec::with_capacity(self.num_ranks + 1);
        partition.push(0);

        for rank in 0..self.num_ranks {
            for gid in local {
                values.push(NeuronId(gid.0 + rank as u32 * self.cells_per_tile));
            }
            partition.push(((rank + 1) * n_local) as u32);
        }

        Ok(GatheredVector::new(values, partition))
    }

    fn min(&self, value: f64) -> Result<f64> {
        Ok(value)
    }

    fn max(&self, value: f64) -> Result<f64> {
        Ok(value)
    }

    fn sum(&self, value: u64) -> Result<u64> {
        Ok(value * self.num_ranks as u64)
    }
}

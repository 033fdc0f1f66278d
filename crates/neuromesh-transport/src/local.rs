/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! Single-rank transport: every collective is a local copy.

use neuromesh_types::{NeuronId, Result, Spike};

use crate::{Distributed, GatheredVector};

#[derive(Debug, Default, Clone, Copy)]
pub struct LocalTransport;

impl LocalTransport {
    pub fn new() -> Self {
        Self
    }
}

impl Distributed for LocalTransport {
    fn name(&self) -> &'static str {
        "local"
    }

    fn id(&self) -> usize {
        0
    }

    fn size(&self) -> usize {
        1
    }

    fn barrier(&self) -> Result<()> {
        Ok(())
    }

    fn gather_spikes(&self, local: &[Spike]) -> Result<GatheredVector<Spike>> {
        let n = local.len() as u32;
        Ok(GatheredVector::new(local.to_vec(), vec![0, n]))
    }

    fn gather_gids(&self, local: &[NeuronId]) -> Result<GatheredVector<NeuronId>> {
        let n = local.len() as u32;
        Ok(GatheredVector::new(local.to_vec(), vec![0, n]))
    }

    fn min(&self, value: f64) -> Result<f64> {
        Ok(value)
    }

    fn max(&self, value: f64) -> Result<f64> {
        Ok(value)
    }

    fn sum(&self, value: u64) -> Result<u64> {
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use neuromesh_types::Endpoint;

    #[test]
    fn test_local_gather_preserves_order() {
        let t = LocalTransport::new();
        let spikes = vec![
            Spike::new(Endpoint::new(NeuronId(1), 0), 0.5),
            Spike::new(Endpoint::new(NeuronId(0), 0), 0.7),
        ];

        let g = t.gather_spikes(&spikes).unwrap();
        assert_eq!(g.num_ranks(), 1);
        assert_eq!(g.rank_slice(0), spikes.as_slice());
    }

    #[test]
    fn test_local_reductions_are_identity() {
        let t = LocalTransport::new();
        assert_eq!(t.min(3.5).unwrap(), 3.5);
        assert_eq!(t.max(3.5).unwrap(), 3.5);
        assert_eq!(t.sum(7).unwrap(), 7);
        assert_eq!(t.size(), 1);
        assert_eq!(t.id(), 0);
    }
}

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # Domain Decomposition
//!
//! Assigns every cell of the global network to a rank and, on that rank, to
//! a cell group. Ranks receive contiguous blocks of either `⌊N/R⌋` or
//! `⌈N/R⌉` cells; within a rank, cells connected by gap junctions are kept
//! in one group (the couplings tie their linear systems together), cells of
//! different kinds never share a group, and each group is tagged with the
//! backend it will run on.

mod load_balance;

pub use load_balance::partition_load_balance;

use neuromesh_transport::GatheredVector;
use neuromesh_types::{BackendKind, CellKind, NeuronId};

/// Meta data for one local cell group.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GroupDescription {
    pub kind: CellKind,
    /// Cells of this group; members of a gap-junction component are
    /// consecutive.
    pub gids: Vec<NeuronId>,
    pub backend: BackendKind,
}

impl GroupDescription {
    pub fn new(kind: CellKind, gids: Vec<NeuronId>, backend: BackendKind) -> Self {
        Self {
            kind,
            gids,
            backend,
        }
    }

    pub fn num_cells(&self) -> usize {
        self.gids.len()
    }
}

/// Per-kind sizing preferences for group packing.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PartitionHint {
    pub cpu_group_size: usize,
    pub gpu_group_size: usize,
    pub prefer_gpu: bool,
}

impl Default for PartitionHint {
    fn default() -> Self {
        Self {
            cpu_group_size: 1,
            gpu_group_size: usize::MAX,
            prefer_gpu: true,
        }
    }
}

pub type PartitionHintMap = ahash::AHashMap<CellKind, PartitionHint>;

/// Whether a kind has a GPU group implementation available in this build.
///
/// The cable integrator lives outside this repository and neither the LIF
/// nor the spike-source group has a device path, so nothing reports GPU
/// capability here.
pub fn has_gpu_backend(kind: CellKind) -> bool {
    match kind {
        CellKind::Cable => false,
        CellKind::Lif => false,
        CellKind::SpikeSource => false,
    }
}

/// The computed decomposition: group descriptions for this rank plus the
/// global cell-to-rank table. Constructed once, read-only afterwards.
#[derive(Debug, Clone)]
pub struct DomainDecomposition {
    num_domains: usize,
    domain_id: usize,
    num_global_cells: u32,
    num_local_cells: usize,
    groups: Vec<GroupDescription>,
    /// All-gathered per-rank sorted local GID lists; authoritative for
    /// `gid_domain`.
    gid_divisions: GatheredVector<NeuronId>,
}

impl DomainDecomposition {
    pub(crate) fn new(
        num_domains: usize,
        domain_id: usize,
        num_global_cells: u32,
        num_local_cells: usize,
        groups: Vec<GroupDescription>,
        gid_divisions: GatheredVector<NeuronId>,
    ) -> Self {
        Self {
            num_domains,
            domain_id,
            num_global_cells,
            num_local_cells,
            groups,
            gid_divisions,
        }
    }

    /// The rank owning `gid`.
    ///
    /// Per-rank GID lists are sorted, so each rank partition answers with a
    /// binary search.
    pub fn gid_domain(&self, gid: NeuronId) -> Option<usize> {
        for rank in 0..self.num_domains {
            if self.gid_divisions.rank_slice(rank).binary_search(&gid).is_ok() {
                return Some(rank);
            }
        }
        None
    }

    pub fn is_local(&self, gid: NeuronId) -> bool {
        self.gid_domain(gid) == Some(self.domain_id)
    }

    pub fn num_domains(&self) -> usize {
        self.num_domains
    }

    pub fn domain_id(&self) -> usize {
        self.domain_id
    }

    pub fn num_global_cells(&self) -> u32 {
        self.num_global_cells
    }

    pub fn num_local_cells(&self) -> usize {
        self.num_local_cells
    }

    pub fn num_local_groups(&self) -> usize {
        self.groups.len()
    }

    pub fn group(&self, i: usize) -> &GroupDescription {
        &self.groups[i]
    }

    pub fn groups(&self) -> &[GroupDescription] {
        &self.groups
    }
}

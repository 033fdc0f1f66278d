/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # Neuromesh
//!
//! Distributed, multi-backend simulator core for networks of spiking
//! neurons. This crate is a facade over the workspace:
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  Foundation: neuromesh-types                            │
//! │  (ids, spikes, events, connections, recipes)            │
//! └─────────────────────────────────────────────────────────┘
//!                         ↓
//! ┌─────────────────────────────────────────────────────────┐
//! │  Distribution: neuromesh-transport, neuromesh-partition │
//! │  (collectives, contexts, domain decomposition)          │
//! └─────────────────────────────────────────────────────────┘
//!                         ↓
//! ┌─────────────────────────────────────────────────────────┐
//! │  Exchange: neuromesh-comm                               │
//! │  (connection table, spike store, event queues)          │
//! └─────────────────────────────────────────────────────────┘
//!                         ↓
//! ┌─────────────────────────────────────────────────────────┐
//! │  Execution: neuromesh-engine                            │
//! │  (cell groups, event lanes, the epoch driver)           │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use neuromesh::prelude::*;
//!
//! let ctx = Context::local();
//! let decomp = partition_load_balance(&recipe, &ctx, &PartitionHintMap::new())?;
//! let mut sim = Simulation::new(&recipe, &decomp, &ctx)?;
//! sim.run(100.0, 0.025)?;
//! println!("{} spikes", sim.num_spikes());
//! ```

pub use neuromesh_comm as comm;
pub use neuromesh_engine as engine;
pub use neuromesh_partition as partition;
pub use neuromesh_transport as transport;
pub use neuromesh_types as types;

/// Prelude - commonly used types and entry points.
pub mod prelude {
    pub use crate::comm::{Communicator, SpikeStore};
    pub use crate::engine::{
        all_probes, one_probe, BinningPolicy, CellGroup, Sample, SamplingPolicy, Simulation,
        SpikeExportCallback,
    };
    pub use crate::partition::{
        partition_load_balance, DomainDecomposition, GroupDescription, PartitionHint,
        PartitionHintMap,
    };
    pub use crate::transport::{Context, Distributed, DryRunTransport, LocalTransport};
    pub use crate::types::*;
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_facade_imports() {
        use crate::prelude::*;
        let _gid = NeuronId(0);
        let _ctx = Context::local_with_threads(1);
    }
}

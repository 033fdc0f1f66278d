/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # Neuromesh Engine
//!
//! Cell groups and the epoch-stepping simulation driver.
//!
//! ## Architecture
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │ Simulation                                   │
//! ├──────────────────────────────────────────────┤
//! │ - cell groups (lif, spike source)            │
//! │ - event lane banks (current / next)          │
//! │ - communicator + local spike store           │
//! │ - sampler handle pool                        │
//! └──────────────────────────────────────────────┘
//!          ↓ per epoch (rayon::join)
//! advance(groups, lanes.current)  ||  exchange -> merge -> lanes.next
//! ```

pub mod binning;
pub mod cell_group;
pub mod export;
pub mod lanes;
pub mod lif_group;
pub mod sampler;
pub mod simulation;
pub mod spike_source_group;

pub use binning::{BinningPolicy, EventBinner};
pub use cell_group::{cell_group_factory, CellGroup};
pub use export::write_spike_records;
pub use lanes::{merge_events, EventLanes};
pub use lif_group::LifCellGroup;
pub use sampler::{
    all_probes, one_probe, HandlePool, ProbePredicate, Sample, SamplerAssociation,
    SamplerCallback, SamplingPolicy,
};
pub use simulation::{Simulation, SpikeExportCallback};
pub use spike_source_group::SpikeSourceGroup;

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # Cell Group Contract
//!
//! A cell group integrates a disjoint subset of cells of one kind on one
//! backend. The driver treats groups as opaque: it hands each group its
//! event lane for the epoch and pulls the spikes out afterwards. A group
//! must appear atomic with respect to other groups, however it parallelizes
//! internally.

use neuromesh_partition::GroupDescription;
use neuromesh_types::{
    BackendKind, CellKind, Epoch, PostsynapticEvent, Recipe, Result, SamplerHandle,
    SimulationError, Spike, Time,
};

use crate::binning::BinningPolicy;
use crate::lif_group::LifCellGroup;
use crate::sampler::SamplerAssociation;
use crate::spike_source_group::SpikeSourceGroup;

pub trait CellGroup: Send {
    fn kind(&self) -> CellKind;

    /// Integrate from `epoch.t_begin` to `epoch.t_end`.
    ///
    /// `events` is this group's current event lane, sorted in delivery
    /// order; entries with `time >= epoch.t_end` belong to later epochs and
    /// must be left alone. The group may subdivide the interval by `dt`
    /// internally. Spikes from threshold crossings accumulate in an
    /// internal buffer until [`CellGroup::clear_spikes`].
    fn advance(&mut self, epoch: Epoch, dt: Time, events: &[PostsynapticEvent]) -> Result<()>;

    /// Spikes produced by the most recent advance.
    fn spikes(&self) -> &[Spike];

    fn clear_spikes(&mut self);

    /// Restore initial state; clears spike and sampler buffers but keeps
    /// sampler registrations.
    fn reset(&mut self);

    fn add_sampler(&mut self, association: SamplerAssociation);

    fn remove_sampler(&mut self, handle: SamplerHandle);

    fn remove_all_samplers(&mut self);

    fn set_binning_policy(&mut self, policy: BinningPolicy, bin_interval: Time);
}

/// Build the group implementation for one group description.
///
/// Backend polymorphism is resolved here, once: the description carries a
/// backend tag and the factory returns an implementation satisfying the
/// trait. No further dispatch happens at the driver level.
pub fn cell_group_factory(
    rec: &dyn Recipe,
    description: &GroupDescription,
) -> Result<Box<dyn CellGroup>> {
    if description.backend == BackendKind::Gpu {
        return Err(SimulationError::BackendUnavailable {
            kind: description.kind,
            backend: description.backend,
        });
    }

    match description.kind {
        CellKind::Lif => Ok(Box::new(LifCellGroup::new(rec, description)?)),
        CellKind::SpikeSource => Ok(Box::new(SpikeSourceGroup::new(rec, description)?)),
        // The cable integrator lives outside this repository.
        CellKind::Cable => Err(SimulationError::BackendUnavailable {
            kind: CellKind::Cable,
            backend: description.backend,
        }),
    }
}

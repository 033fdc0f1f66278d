/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # Simulation Driver
//!
//! Owns the epoch loop. Each epoch is half the global minimum delay, which
//! makes the following overlap legal: while the cell groups integrate the
//! current epoch (consuming events delivered by the previous exchange), the
//! exchange task gathers the *previous* epoch's spikes and merges the
//! resulting events into the next epoch's lanes. A spike emitted inside an
//! epoch can never require delivery inside that same epoch, because every
//! delay is at least two epochs long.
//!
//! ```text
//! epoch k   : advance(lanes[k])  ||  exchange(spikes[k-1]) -> lanes[k+1]
//! join, rotate lane banks, k += 1
//! ```

use std::sync::Arc;

use rayon::prelude::*;

use neuromesh_comm::{Communicator, EventQueue, SpikeStore};
use neuromesh_partition::DomainDecomposition;
use neuromesh_transport::Context;
use neuromesh_types::{
    Epoch, Recipe, Result, SamplerHandle, Schedule, SimulationError, Spike, Time,
};

use crate::binning::BinningPolicy;
use crate::cell_group::{cell_group_factory, CellGroup};
use crate::lanes::{merge_events, EventLanes};
use crate::sampler::{
    HandlePool, ProbePredicate, SamplerAssociation, SamplerCallback, SamplingPolicy,
};

/// Invoked once per epoch with the spikes observed in that epoch's
/// exchange.
pub type SpikeExportCallback = Box<dyn Fn(&[Spike]) + Send + Sync>;

pub struct Simulation {
    t: Time,
    epoch_id: u64,
    cell_groups: Vec<Box<dyn CellGroup>>,
    event_lanes: EventLanes,
    communicator: Communicator,
    local_spikes: SpikeStore,
    sampler_handles: HandlePool,
    global_spike_callback: Option<SpikeExportCallback>,
    local_spike_callback: Option<SpikeExportCallback>,
    pool: Arc<rayon::ThreadPool>,
}

impl Simulation {
    pub fn new(rec: &dyn Recipe, decomp: &DomainDecomposition, ctx: &Context) -> Result<Self> {
        let pool = Arc::new(
            rayon::ThreadPoolBuilder::new()
                .num_threads(ctx.num_threads())
                .build()
                .map_err(|e| SimulationError::ResourceError {
                    reason: e.to_string(),
                })?,
        );

        let (cell_groups, communicator) = pool.install(|| -> Result<_> {
            // One task per cell group.
            let groups: Vec<Box<dyn CellGroup>> = decomp
                .groups()
                .par_iter()
                .map(|d| cell_group_factory(rec, d))
                .collect::<Result<_>>()?;
            let comm = Communicator::new(rec, decomp, Arc::clone(ctx.transport()))?;
            Ok((groups, comm))
        })?;

        let event_lanes = EventLanes::new(cell_groups.len());

        tracing::info!(
            num_groups = cell_groups.len(),
            min_delay = communicator.min_delay(),
            rank = ctx.id(),
            "simulation constructed"
        );

        Ok(Self {
            t: 0.0,
            epoch_id: 0,
            cell_groups,
            event_lanes,
            communicator,
            local_spikes: SpikeStore::new(),
            sampler_handles: HandlePool::new(),
            global_spike_callback: None,
            local_spike_callback: None,
            pool,
        })
    }

    /// Advance the simulation to `t_final`, integrating cell state with
    /// time step `dt` where a group integrates numerically. Returns the
    /// time actually reached.
    pub fn run(&mut self, t_final: Time, dt: Time) -> Result<Time> {
        let pool = Arc::clone(&self.pool);
        pool.install(|| self.run_inner(t_final, dt))
    }

    fn run_inner(&mut self, t_final: Time, dt: Time) -> Result<Time> {
        // Largest interval that may pass before spikes must be
        // communicated; half the minimum delay so that exchange and
        // advance can overlap.
        let t_interval = self.communicator.min_delay() / 2.0;

        let mut t_next = (self.t + t_interval).min(t_final);
        while self.t < t_final {
            let epoch = Epoch::new(self.epoch_id, self.t, t_next);

            // Previous epoch's spikes move to the read side; the write side
            // collects the spikes generated by this epoch's advance.
            self.local_spikes.exchange();
            self.local_spikes.clear_current();

            let Simulation {
                communicator,
                cell_groups,
                event_lanes,
                local_spikes,
                global_spike_callback,
                local_spike_callback,
                ..
            } = self;
            let (lanes_current, lanes_next) = event_lanes.split(epoch.id);
            let store = &*local_spikes;

            let (exchange_result, advance_result) = rayon::join(
                || {
                    exchange_task(
                        communicator,
                        store,
                        lanes_current,
                        lanes_next,
                        epoch,
                        global_spike_callback.as_deref(),
                        local_spike_callback.as_deref(),
                    )
                },
                || advance_task(cell_groups, lanes_current, store, epoch, dt),
            );
            exchange_result?;
            advance_result?;

            self.t = t_next;
            t_next = (self.t + t_interval).min(t_final);
            self.epoch_id += 1;
        }

        // One final exchange so the spikes of the last epoch reach the
        // callbacks and the tally. Their events are merged into the next
        // bank; a subsequent run() picks them up.
        self.local_spikes.exchange();
        self.local_spikes.clear_current();
        {
            let epoch = Epoch::new(self.epoch_id, self.t, self.t);
            let Simulation {
                communicator,
                event_lanes,
                local_spikes,
                global_spike_callback,
                local_spike_callback,
                ..
            } = self;
            let (lanes_current, lanes_next) = event_lanes.split(epoch.id);
            exchange_task(
                communicator,
                &*local_spikes,
                lanes_current,
                lanes_next,
                epoch,
                global_spike_callback.as_deref(),
                local_spike_callback.as_deref(),
            )?;
        }
        self.epoch_id += 1;

        Ok(self.t)
    }

    /// Restore the simulation to its just-constructed state. Sampler
    /// registrations survive a reset; recorded state does not.
    pub fn reset(&mut self) {
        self.t = 0.0;
        self.epoch_id = 0;
        for group in &mut self.cell_groups {
            group.reset();
        }
        self.event_lanes.clear();
        self.communicator.reset();
        self.local_spikes.clear_both();
    }

    pub fn add_sampler(
        &mut self,
        probes: ProbePredicate,
        schedule: Schedule,
        callback: SamplerCallback,
        policy: SamplingPolicy,
    ) -> SamplerHandle {
        let handle = self.sampler_handles.acquire();
        let association = SamplerAssociation {
            handle,
            probes,
            schedule,
            callback,
            policy,
        };
        let pool = Arc::clone(&self.pool);
        pool.install(|| {
            self.cell_groups
                .par_iter_mut()
                .for_each(|g| g.add_sampler(association.clone()));
        });
        handle
    }

    pub fn remove_sampler(&mut self, handle: SamplerHandle) -> Result<()> {
        self.sampler_handles.release(handle)?;
        let pool = Arc::clone(&self.pool);
        pool.install(|| {
            self.cell_groups
                .par_iter_mut()
                .for_each(|g| g.remove_sampler(handle));
        });
        Ok(())
    }

    pub fn remove_all_samplers(&mut self) {
        let pool = Arc::clone(&self.pool);
        pool.install(|| {
            self.cell_groups
                .par_iter_mut()
                .for_each(|g| g.remove_all_samplers());
        });
        self.sampler_handles.clear();
    }

    /// Apply one binning policy to every cell group.
    pub fn set_binning_policy(&mut self, policy: BinningPolicy, bin_interval: Time) {
        for group in &mut self.cell_groups {
            group.set_binning_policy(policy, bin_interval);
        }
    }

    pub fn set_global_spike_callback(&mut self, callback: SpikeExportCallback) {
        self.global_spike_callback = Some(callback);
    }

    pub fn set_local_spike_callback(&mut self, callback: SpikeExportCallback) {
        self.local_spike_callback = Some(callback);
    }

    /// Cumulative count of spikes observed in exchanges, over all ranks
    /// and all epochs. Monotonic between resets.
    pub fn num_spikes(&self) -> u64 {
        self.communicator.num_spikes()
    }

    pub fn num_groups(&self) -> usize {
        self.cell_groups.len()
    }

    pub fn time(&self) -> Time {
        self.t
    }
}

/// Gather the previous epoch's spikes, report them, and merge the derived
/// events into the next lane bank.
#[allow(clippy::too_many_arguments)]
fn exchange_task(
    communicator: &mut Communicator,
    store: &SpikeStore,
    lanes_current: &[EventQueue],
    lanes_next: &mut [EventQueue],
    epoch: Epoch,
    global_callback: Option<&(dyn Fn(&[Spike]) + Send + Sync)>,
    local_callback: Option<&(dyn Fn(&[Spike]) + Send + Sync)>,
) -> Result<()> {
    let local_spikes = store.gather_previous();
    let global_spikes = communicator.exchange(local_spikes.clone())?;

    if let Some(callback) = local_callback {
        callback(&local_spikes);
    }
    if let Some(callback) = global_callback {
        callback(global_spikes.values());
    }

    let mut queues = communicator.make_event_queues(&global_spikes);
    for (lane, queue) in queues.iter_mut().enumerate() {
        merge_events(queue, &lanes_current[lane], &mut lanes_next[lane], epoch.t_end);
    }
    Ok(())
}

/// Advance every cell group over the epoch, in parallel, collecting the
/// spikes into the store. Errors surface at the join; the first one wins.
fn advance_task(
    groups: &mut [Box<dyn CellGroup>],
    lanes_current: &[EventQueue],
    store: &SpikeStore,
    epoch: Epoch,
    dt: Time,
) -> Result<()> {
    groups
        .par_iter_mut()
        .enumerate()
        .try_for_each(|(i, group)| {
            group.advance(epoch, dt, &lanes_current[i])?;
            store.insert(group.spikes());
            group.clear_spikes();
            Ok(())
        })
}

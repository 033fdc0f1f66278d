/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! Spike-source cell group: each cell emits spikes at its schedule's times
//! and receives nothing. No probes, no binning, no state beyond the
//! schedules themselves.

use neuromesh_partition::GroupDescription;
use neuromesh_types::{
    CellDescription, CellKind, Endpoint, Epoch, NeuronId, PostsynapticEvent, Recipe, Result,
    SamplerHandle, Schedule, SimulationError, Spike, Time,
};

use crate::binning::BinningPolicy;
use crate::cell_group::CellGroup;
use crate::sampler::SamplerAssociation;

pub struct SpikeSourceGroup {
    gids: Vec<NeuronId>,
    schedules: Vec<Schedule>,
    spikes: Vec<Spike>,
}

impl SpikeSourceGroup {
    pub fn new(rec: &dyn Recipe, description: &GroupDescription) -> Result<Self> {
        let mut schedules = Vec::with_capacity(description.gids.len());
        for &gid in &description.gids {
            match rec.cell_description(gid) {
                CellDescription::SpikeSource(schedule) => schedules.push(schedule),
                other => {
                    return Err(SimulationError::RecipeError {
                        gid,
                        reason: format!(
                            "cell description has kind {} but the group is spike_source",
                            other.kind()
                        ),
                    })
                }
            }
        }
        Ok(Self {
            gids: description.gids.clone(),
            schedules,
            spikes: Vec::new(),
        })
    }
}

impl CellGroup for SpikeSourceGroup {
    fn kind(&self) -> CellKind {
        CellKind::SpikeSource
    }

    fn advance(&mut self, epoch: Epoch, _dt: Time, _events: &[PostsynapticEvent]) -> Result<()> {
        for (gid, schedule) in self.gids.iter().zip(self.schedules.iter()) {
            for t in schedule.events(epoch.t_begin, epoch.t_end) {
                self.spikes.push(Spike::new(Endpoint::new(*gid, 0), t));
            }
        }
        Ok(())
    }

    fn spikes(&self) -> &[Spike] {
        &self.spikes
    }

    fn clear_spikes(&mut self) {
        self.spikes.clear();
    }

    fn reset(&mut self) {
        self.spikes.clear();
    }

    fn add_sampler(&mut self, _association: SamplerAssociation) {}

    fn remove_sampler(&mut self, _handle: SamplerHandle) {}

    fn remove_all_samplers(&mut self) {}

    fn set_binning_policy(&mut self, _policy: BinningPolicy, _bin_interval: Time) {}
}

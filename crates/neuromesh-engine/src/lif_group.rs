/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # LIF Cell Group
//!
//! Event-driven leaky integrate-and-fire group. Between events the membrane
//! voltage follows the exact solution of the leak equation, so integration
//! jumps from event to event and `dt` plays no role:
//!
//! ```text
//! V(t_ev) = V(t) * exp(-(t_ev - t) / tau_m) + weight / C_m
//! V >= V_th  =>  spike at t_ev, V := V_reset, refractory until t_ev + t_ref
//! ```
//!
//! Events that land inside a cell's refractory window are dropped.

use ahash::AHashMap;

use neuromesh_partition::GroupDescription;
use neuromesh_types::{
    CellDescription, CellKind, Endpoint, Epoch, EventGenerator, LifCell, NeuronId, PostsynapticEvent,
    ProbeId, Recipe, Result, SamplerHandle, SimulationError, Spike, Time,
};

use crate::binning::{BinningPolicy, EventBinner};
use crate::cell_group::CellGroup;
use crate::sampler::{Sample, SamplerAssociation};

#[derive(Debug, Clone, Copy)]
struct CellState {
    v: f64,
    /// The cell's local time: last update, or the end of the refractory
    /// window if that is later.
    t: Time,
}

pub struct LifCellGroup {
    gids: Vec<NeuronId>,
    params: Vec<LifCell>,
    state: Vec<CellState>,
    generators: Vec<Vec<EventGenerator>>,
    probes: Vec<Vec<ProbeId>>,
    gid_to_lid: AHashMap<NeuronId, usize>,
    binning: (BinningPolicy, Time),
    binners: Vec<EventBinner>,
    spikes: Vec<Spike>,
    samplers: Vec<SamplerAssociation>,
    // Per-cell event staging, reused across epochs.
    cell_events: Vec<Vec<PostsynapticEvent>>,
}

impl LifCellGroup {
    pub fn new(rec: &dyn Recipe, description: &GroupDescription) -> Result<Self> {
        let n = description.gids.len();
        let mut params = Vec::with_capacity(n);
        let mut generators = Vec::with_capacity(n);
        let mut probes = Vec::with_capacity(n);
        let mut gid_to_lid = AHashMap::with_capacity(n);

        for (lid, &gid) in description.gids.iter().enumerate() {
            match rec.cell_description(gid) {
                CellDescription::Lif(cell) => params.push(cell),
                other => {
                    return Err(SimulationError::RecipeError {
                        gid,
                        reason: format!(
                            "cell description has kind {} but the group is lif",
                            other.kind()
                        ),
                    })
                }
            }
            generators.push(rec.event_generators_on(gid));
            probes.push(
                (0..rec.num_probes(gid))
                    .map(|index| ProbeId { gid, index })
                    .collect(),
            );
            gid_to_lid.insert(gid, lid);
        }

        let state = params
            .iter()
            .map(|p| CellState { v: p.v_m, t: 0.0 })
            .collect();

        Ok(Self {
            gids: description.gids.clone(),
            params,
            state,
            generators,
            probes,
            gid_to_lid,
            binning: (BinningPolicy::None, 0.0),
            binners: vec![EventBinner::none(); n],
            spikes: Vec::new(),
            samplers: Vec::new(),
            cell_events: vec![Vec::new(); n],
        })
    }

    fn integrate_cell(&mut self, lid: usize) {
        let params = self.params[lid];
        let gid = self.gids[lid];
        let events = std::mem::take(&mut self.cell_events[lid]);

        for ev in &events {
            let t_ev = self.binners[lid].bin(ev.time);
            let state = &mut self.state[lid];

            // Inside the refractory window; the event is lost.
            if t_ev < state.t {
                continue;
            }

            state.v *= (-(t_ev - state.t) / params.tau_m).exp();
            state.v += ev.weight as f64 / params.c_m;
            state.t = t_ev;

            if state.v >= params.v_th {
                self.spikes.push(Spike::new(Endpoint::new(gid, 0), t_ev));
                state.v = params.v_reset;
                state.t = t_ev + params.t_ref;
            }
        }

        let mut events = events;
        events.clear();
        self.cell_events[lid] = events;
    }

    /// Membrane voltage read from the cell's last integration state (lax
    /// sampling: no interpolation through events).
    fn voltage_at(&self, lid: usize, t: Time) -> f64 {
        let state = self.state[lid];
        let params = self.params[lid];
        if t <= state.t {
            state.v
        } else {
            state.v * (-(t - state.t) / params.tau_m).exp()
        }
    }

    fn run_samplers(&self, epoch: Epoch) {
        for assoc in &self.samplers {
            let times = assoc.schedule.events(epoch.t_begin, epoch.t_end);
            if times.is_empty() {
                continue;
            }
            for (lid, cell_probes) in self.probes.iter().enumerate() {
                for &probe in cell_probes {
                    if !(assoc.probes)(probe) {
                        continue;
                    }
                    let samples: Vec<Sample> = times
                        .iter()
                        .map(|&t| Sample {
                            time: t,
                            value: self.voltage_at(lid, t),
                        })
                        .collect();
                    (assoc.callback)(probe, &samples);
                }
            }
        }
    }
}

impl CellGroup for LifCellGroup {
    fn kind(&self) -> CellKind {
        CellKind::Lif
    }

    fn advance(&mut self, epoch: Epoch, _dt: Time, events: &[PostsynapticEvent]) -> Result<()> {
        // Only the prefix scheduled inside this epoch is deliverable.
        let deliverable = &events[..events.partition_point(|e| e.time < epoch.t_end)];

        for ev in deliverable {
            match self.gid_to_lid.get(&ev.target.neuron) {
                Some(&lid) => self.cell_events[lid].push(*ev),
                None => {
                    debug_assert!(false, "event routed to a cell outside this group");
                }
            }
        }

        for lid in 0..self.gids.len() {
            for gen in &self.generators[lid] {
                let target = Endpoint::new(self.gids[lid], gen.target_index);
                for t in gen.schedule.events(epoch.t_begin, epoch.t_end) {
                    self.cell_events[lid].push(PostsynapticEvent::new(target, t, gen.weight));
                }
            }
            self.cell_events[lid].sort_by(PostsynapticEvent::delivery_order);
        }

        for lid in 0..self.gids.len() {
            self.integrate_cell(lid);
        }

        self.run_samplers(epoch);
        Ok(())
    }

    fn spikes(&self) -> &[Spike] {
        &self.spikes
    }

    fn clear_spikes(&mut self) {
        self.spikes.clear();
    }

    fn reset(&mut self) {
        for (state, params) in self.state.iter_mut().zip(self.params.iter()) {
            state.v = params.v_m;
            state.t = 0.0;
        }
        for binner in &mut self.binners {
            binner.reset();
        }
        for lane in &mut self.cell_events {
            lane.clear();
        }
        self.spikes.clear();
    }

    fn add_sampler(&mut self, association: SamplerAssociation) {
        self.samplers.push(association);
    }

    fn remove_sampler(&mut self, handle: SamplerHandle) {
        self.samplers.retain(|a| a.handle != handle);
    }

    fn remove_all_samplers(&mut self) {
        self.samplers.clear();
    }

    fn set_binning_policy(&mut self, policy: BinningPolicy, bin_interval: Time) {
        self.binning = (policy, bin_interval);
        self.binners = vec![EventBinner::new(policy, bin_interval); self.gids.len()];
    }
}

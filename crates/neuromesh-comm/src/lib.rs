/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # Communicator
//!
//! Owns the rank-local connection table and turns gathered spikes into
//! per-group event queues.
//!
//! ## Connection table layout
//! One flat array partitioned by the rank of the connection's *source*
//! cell, with a separate offsets table; within a partition, connections are
//! sorted by source endpoint. Event generation is then a linear sweep of
//! two sorted sequences per source rank, walking whichever side is smaller.

mod spike_store;

pub use spike_store::SpikeStore;

use std::sync::Arc;

use rayon::prelude::*;

use neuromesh_partition::DomainDecomposition;
use neuromesh_transport::{Distributed, GatheredVector};
use neuromesh_types::{
    event::sort_spikes_by_source, Connection, Endpoint, NeuronId, PostsynapticEvent, Recipe,
    Result, SimulationError, Spike, Time,
};

/// Events bound for one cell group after an exchange.
pub type EventQueue = Vec<PostsynapticEvent>;

pub struct Communicator {
    num_domains: usize,
    num_local_groups: usize,
    connections: Vec<Connection>,
    /// Offsets of the per-source-rank partitions; `num_domains + 1` entries.
    connection_part: Vec<usize>,
    min_delay: Time,
    num_spikes: u64,
    transport: Arc<dyn Distributed>,
}

impl Communicator {
    pub fn new(
        rec: &dyn Recipe,
        decomp: &DomainDecomposition,
        transport: Arc<dyn Distributed>,
    ) -> Result<Self> {
        let num_domains = transport.size();
        let num_local_groups = decomp.num_local_groups();
        let num_cells = rec.num_cells();

        // Enumerate incoming connections of every local cell, recording the
        // source rank of each so the table can be scatter-filled in one
        // pass.
        struct GidInfo {
            gid: NeuronId,
            group: usize,
            conns: Vec<neuromesh_types::CellConnection>,
        }

        let mut gid_infos: Vec<GidInfo> = Vec::with_capacity(decomp.num_local_cells());
        let mut src_domains: Vec<usize> = Vec::new();
        let mut src_counts = vec![0usize; num_domains];
        let mut n_cons = 0usize;

        for group in 0..num_local_groups {
            for &gid in &decomp.group(group).gids {
                let conns = rec.connections_on(gid);
                for con in &conns {
                    if con.delay <= 0.0 {
                        return Err(SimulationError::RecipeError {
                            gid,
                            reason: format!(
                                "connection from {} has non-positive delay {}",
                                con.source, con.delay
                            ),
                        });
                    }
                    if con.source.neuron.0 >= num_cells {
                        return Err(SimulationError::RecipeError {
                            gid,
                            reason: format!("connection source {} is out of range", con.source),
                        });
                    }
                    let src = decomp.gid_domain(con.source.neuron).ok_or_else(|| {
                        SimulationError::RecipeError {
                            gid,
                            reason: format!("connection source {} is not assigned to any rank", con.source),
                        }
                    })?;
                    src_domains.push(src);
                    src_counts[src] += 1;
                }
                n_cons += conns.len();
                gid_infos.push(GidInfo { gid, group, conns });
            }
        }

        // Offsets table, then scatter-fill the flat array bucketed by
        // source rank. The fill is stable within each bucket.
        let mut connection_part = Vec::with_capacity(num_domains + 1);
        let mut acc = 0usize;
        connection_part.push(0);
        for &c in &src_counts {
            acc += c;
            connection_part.push(acc);
        }

        let placeholder = Connection::new(Endpoint::new(NeuronId(0), 0), Endpoint::new(NeuronId(0), 0), 0.0, 0.0, 0);
        let mut connections = vec![placeholder; n_cons];
        let mut offsets = connection_part.clone();
        let mut pos = 0usize;
        for info in &gid_infos {
            for con in &info.conns {
                let slot = offsets[src_domains[pos]];
                offsets[src_domains[pos]] += 1;
                connections[slot] = Connection::new(
                    con.source,
                    Endpoint::new(info.gid, con.target_index),
                    con.weight,
                    con.delay,
                    info.group,
                );
                pos += 1;
            }
        }

        // Each source-rank partition sorts independently.
        {
            let mut rest: &mut [Connection] = &mut connections;
            let mut partitions: Vec<&mut [Connection]> = Vec::with_capacity(num_domains);
            for dom in 0..num_domains {
                let len = connection_part[dom + 1] - connection_part[dom];
                let (head, tail) = rest.split_at_mut(len);
                partitions.push(head);
                rest = tail;
            }
            partitions
                .into_par_iter()
                .for_each(|p| p.sort_by_key(|c| c.source));
        }

        // Global minimum delay: local minimum reduced across ranks. With no
        // connections anywhere this stays infinite and the driver runs the
        // whole interval as one epoch.
        let local_min = connections
            .iter()
            .map(|c| c.delay)
            .fold(Time::INFINITY, Time::min);
        let min_delay = transport.min(local_min)?;

        tracing::debug!(
            num_connections = connections.len(),
            num_domains,
            min_delay,
            "communicator constructed"
        );

        Ok(Self {
            num_domains,
            num_local_groups,
            connections,
            connection_part,
            min_delay,
            num_spikes: 0,
            transport,
        })
    }

    /// The minimum delay of all connections in the global network. Constant
    /// after construction.
    pub fn min_delay(&self) -> Time {
        self.min_delay
    }

    /// Gather this rank's spikes against every other rank's.
    ///
    /// Sorts the local spikes by source endpoint first; the returned vector
    /// is partitioned by source rank.
    pub fn exchange(&mut self, mut local_spikes: Vec<Spike>) -> Result<GatheredVector<Spike>> {
        sort_spikes_by_source(&mut local_spikes);
        let global_spikes = self.transport.gather_spikes(&local_spikes)?;
        self.num_spikes += global_spikes.size() as u64;
        Ok(global_spikes)
    }

    /// Check each global spike against the connection table and build the
    /// event queues, one per local cell group.
    ///
    /// Per source rank, both the spike slice and the connection partition
    /// are sorted by source endpoint; the sweep iterates the smaller side
    /// and locates the matching run in the larger with a pair of binary
    /// searches.
    pub fn make_event_queues(
        &self,
        global_spikes: &GatheredVector<Spike>,
    ) -> Vec<EventQueue> {
        let mut queues: Vec<EventQueue> = vec![Vec::new(); self.num_local_groups];

        for dom in 0..self.num_domains {
            let cons =
                &self.connections[self.connection_part[dom]..self.connection_part[dom + 1]];
            let spks = global_spikes.rank_slice(dom);

            if cons.len() < spks.len() {
                let mut sp = 0usize;
                for con in cons {
                    let lo = sp + spks[sp..].partition_point(|s| s.source < con.source);
                    let hi = lo + spks[lo..].partition_point(|s| s.source == con.source);
                    for s in &spks[lo..hi] {
                        queues[con.group_index].push(con.make_event(s));
                    }
                    sp = lo;
                }
            } else {
                let mut cn = 0usize;
                for s in spks {
                    let lo = cn + cons[cn..].partition_point(|c| c.source < s.source);
                    let hi = lo + cons[lo..].partition_point(|c| c.source == s.source);
                    for con in &cons[lo..hi] {
                        queues[con.group_index].push(con.make_event(s));
                    }
                    cn = lo;
                }
            }
        }

        queues
    }

    /// Cumulative count of global spikes observed in exchanges.
    pub fn num_spikes(&self) -> u64 {
        self.num_spikes
    }

    pub fn num_local_groups(&self) -> usize {
        self.num_local_groups
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    pub fn reset(&mut self) {
        self.num_spikes = 0;
    }
}

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! Multi-rank scenarios: the in-process rank group and dry-run
//! replication. Every rank must observe the identical global spike stream.

mod common;

use std::sync::{Arc, Mutex};
use std::thread;

use common::{AllToAllRecipe, RingRecipe};
use neuromesh::prelude::*;

#[test]
fn test_all_to_all_across_two_ranks() {
    let ctxs = Context::threaded_group(2, 1);

    let handles: Vec<_> = ctxs
        .into_iter()
        .map(|ctx| {
            thread::spawn(move || {
                let rec = AllToAllRecipe {
                    n: 8,
                    delay: 2.0,
                    weight: 0.1,
                    drive_time: 0.1,
                };
                let decomp =
                    partition_load_balance(&rec, &ctx, &PartitionHintMap::new()).unwrap();
                let mut sim = Simulation::new(&rec, &decomp, &ctx).unwrap();

                let epochs: Arc<Mutex<Vec<Vec<Spike>>>> = Arc::new(Mutex::new(Vec::new()));
                let sink = Arc::clone(&epochs);
                sim.set_global_spike_callback(Box::new(move |spikes| {
                    sink.lock().unwrap().push(spikes.to_vec());
                }));

                let reached = sim.run(5.0, 0.025).unwrap();
                let observed = epochs.lock().unwrap().clone();
                (ctx.id(), reached, sim.num_spikes(), observed)
            })
        })
        .collect();

    let mut results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    results.sort_by_key(|r| r.0);

    // The subthreshold fan-out never triggers a secondary spike: one spike
    // in the whole network, and both ranks agree on the count.
    for (_, reached, num_spikes, _) in &results {
        assert_eq!(*reached, 5.0);
        assert_eq!(*num_spikes, 1);
    }

    // Every rank observed the identical global spike stream, epoch by
    // epoch.
    let (_, _, _, reference) = &results[0];
    for (_, _, _, observed) in &results[1..] {
        assert_eq!(observed, reference);
    }

    let all: Vec<Spike> = reference.iter().flatten().copied().collect();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].source.neuron, NeuronId(0));
    assert_eq!(all[0].time, 0.1);
}

#[test]
fn test_ring_under_threaded_ranks_matches_single_rank() {
    // The same 4-ring, once on one rank and once split over two; the
    // global spike multiset must not depend on the decomposition.
    let single = {
        let rec = RingRecipe::single(4, 1.0);
        let ctx = Context::local_with_threads(1);
        let decomp = partition_load_balance(&rec, &ctx, &PartitionHintMap::new()).unwrap();
        let mut sim = Simulation::new(&rec, &decomp, &ctx).unwrap();

        let recorded: Arc<Mutex<Vec<Spike>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&recorded);
        sim.set_global_spike_callback(Box::new(move |spikes| {
            sink.lock().unwrap().extend_from_slice(spikes);
        }));
        sim.run(5.0, 0.025).unwrap();
        let mut spikes = recorded.lock().unwrap().clone();
        spikes.sort_by(|a, b| a.time.total_cmp(&b.time));
        spikes
    };

    let ctxs = Context::threaded_group(2, 1);
    let handles: Vec<_> = ctxs
        .into_iter()
        .map(|ctx| {
            thread::spawn(move || {
                let rec = RingRecipe::single(4, 1.0);
                let decomp =
                    partition_load_balance(&rec, &ctx, &PartitionHintMap::new()).unwrap();
                let mut sim = Simulation::new(&rec, &decomp, &ctx).unwrap();

                let recorded: Arc<Mutex<Vec<Spike>>> = Arc::new(Mutex::new(Vec::new()));
                let sink = Arc::clone(&recorded);
                sim.set_global_spike_callback(Box::new(move |spikes| {
                    sink.lock().unwrap().extend_from_slice(spikes);
                }));
                sim.run(5.0, 0.025).unwrap();
                let mut spikes = recorded.lock().unwrap().clone();
                spikes.sort_by(|a, b| a.time.total_cmp(&b.time));
                spikes
            })
        })
        .collect();

    for h in handles {
        let distributed = h.join().unwrap();
        assert_eq!(distributed.len(), single.len());
        for (a, b) in distributed.iter().zip(single.iter()) {
            assert_eq!(a.source, b.source);
            assert_eq!(a.time, b.time);
        }
    }
}

#[test]
fn test_dry_run_replicates_spikes_per_tile() {
    // Three tiles of four cells; the transport replicates rank 0's spikes
    // with tile-shifted sources.
    let rec = RingRecipe::tiled(3, 4, 1.0);
    let ctx = Context::dry_run(3, 4);
    let decomp = partition_load_balance(&rec, &ctx, &PartitionHintMap::new()).unwrap();
    let mut sim = Simulation::new(&rec, &decomp, &ctx).unwrap();

    let local_epochs: Arc<Mutex<Vec<Vec<Spike>>>> = Arc::new(Mutex::new(Vec::new()));
    let global_epochs: Arc<Mutex<Vec<Vec<Spike>>>> = Arc::new(Mutex::new(Vec::new()));
    {
        let sink = Arc::clone(&local_epochs);
        sim.set_local_spike_callback(Box::new(move |spikes| {
            sink.lock().unwrap().push(spikes.to_vec());
        }));
        let sink = Arc::clone(&global_epochs);
        sim.set_global_spike_callback(Box::new(move |spikes| {
            sink.lock().unwrap().push(spikes.to_vec());
        }));
    }

    sim.run(5.0, 0.025).unwrap();

    let local_epochs = local_epochs.lock().unwrap();
    let global_epochs = global_epochs.lock().unwrap();
    assert_eq!(local_epochs.len(), global_epochs.len());

    for (local, global) in local_epochs.iter().zip(global_epochs.iter()) {
        // Per epoch, the global vector is three tiled copies of the local
        // one.
        assert_eq!(global.len(), 3 * local.len());
        for tile in 0..3u32 {
            for spike in local {
                let shifted = NeuronId(spike.source.neuron.0 + tile * 4);
                assert!(global
                    .iter()
                    .any(|g| g.source.neuron == shifted && g.time == spike.time));
            }
        }
    }

    // Four local spikes, counted once per tile.
    assert_eq!(sim.num_spikes(), 12);
}

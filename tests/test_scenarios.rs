/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! End-to-end single-rank scenarios: quiet networks, ring propagation,
//! event binning and spike record output.

mod common;

use std::sync::{Arc, Mutex};

use common::{RingRecipe, SingleCellRecipe};
use neuromesh::engine::write_spike_records;
use neuromesh::prelude::*;

fn build(rec: &dyn Recipe, ctx: &Context) -> Simulation {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let decomp = partition_load_balance(rec, ctx, &PartitionHintMap::new()).unwrap();
    Simulation::new(rec, &decomp, ctx).unwrap()
}

fn record_global_spikes(sim: &mut Simulation) -> Arc<Mutex<Vec<Spike>>> {
    let recorded: Arc<Mutex<Vec<Spike>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&recorded);
    sim.set_global_spike_callback(Box::new(move |spikes| {
        sink.lock().unwrap().extend_from_slice(spikes);
    }));
    recorded
}

#[test]
fn test_single_cell_without_connections_stays_silent() {
    let ctx = Context::local_with_threads(1);
    let mut sim = build(&SingleCellRecipe, &ctx);

    let reached = sim.run(10.0, 0.025).unwrap();
    assert_eq!(reached, 10.0);
    assert_eq!(sim.num_spikes(), 0);
}

#[test]
fn test_ring_of_four_propagates_one_spike_per_cell() {
    let rec = RingRecipe::single(4, 1.0);
    let ctx = Context::local_with_threads(2);
    let mut sim = build(&rec, &ctx);
    let recorded = record_global_spikes(&mut sim);

    let reached = sim.run(5.0, 0.025).unwrap();
    assert_eq!(reached, 5.0);
    assert_eq!(sim.num_spikes(), 4);

    let mut spikes = recorded.lock().unwrap().clone();
    spikes.sort_by(|a, b| a.time.total_cmp(&b.time));

    let times: Vec<f64> = spikes.iter().map(|s| s.time).collect();
    assert_eq!(times, vec![0.1, 1.1, 2.1, 3.1]);
    let gids: Vec<u32> = spikes.iter().map(|s| s.source.neuron.0).collect();
    assert_eq!(gids, vec![0, 1, 2, 3]);
}

#[test]
fn test_num_spikes_matches_callback_totals() {
    let rec = RingRecipe::single(4, 1.0);
    let ctx = Context::local_with_threads(1);
    let mut sim = build(&rec, &ctx);

    let global_total = Arc::new(Mutex::new(0usize));
    let local_total = Arc::new(Mutex::new(0usize));
    {
        let sink = Arc::clone(&global_total);
        sim.set_global_spike_callback(Box::new(move |spikes| {
            *sink.lock().unwrap() += spikes.len();
        }));
        let sink = Arc::clone(&local_total);
        sim.set_local_spike_callback(Box::new(move |spikes| {
            *sink.lock().unwrap() += spikes.len();
        }));
    }

    sim.run(5.0, 0.025).unwrap();

    assert_eq!(sim.num_spikes(), 4);
    assert_eq!(*global_total.lock().unwrap(), 4);
    // On a single rank the local stream is the global stream.
    assert_eq!(*local_total.lock().unwrap(), 4);
}

#[test]
fn test_spike_record_output() {
    let rec = RingRecipe::single(4, 1.0);
    let ctx = Context::local_with_threads(1);
    let mut sim = build(&rec, &ctx);
    let recorded = record_global_spikes(&mut sim);

    sim.run(5.0, 0.025).unwrap();

    let spikes = recorded.lock().unwrap();
    let mut buf = Vec::new();
    write_spike_records(&mut buf, &spikes).unwrap();
    let text = String::from_utf8(buf).unwrap();

    assert_eq!(text, "0 0.1000\n1 1.1000\n2 2.1000\n3 3.1000\n");
}

/// Regular binning of 0.1 rounds event times {0.13, 0.17, 0.22} down to
/// {0.1, 0.1, 0.2} before delivery.
#[test]
fn test_regular_binning_rounds_delivery_times() {
    struct DrivenCell;

    impl Recipe for DrivenCell {
        fn num_cells(&self) -> u32 {
            1
        }

        fn cell_kind(&self, _gid: NeuronId) -> CellKind {
            CellKind::Lif
        }

        fn cell_description(&self, _gid: NeuronId) -> CellDescription {
            CellDescription::Lif(LifCell {
                v_th: 100.0,
                c_m: 1.0,
                tau_m: 10.0,
                ..LifCell::default()
            })
        }

        fn connections_on(&self, _gid: NeuronId) -> Vec<CellConnection> {
            Vec::new()
        }

        fn event_generators_on(&self, _gid: NeuronId) -> Vec<EventGenerator> {
            vec![EventGenerator::new(
                0,
                1.0,
                Schedule::explicit(vec![0.13, 0.17, 0.22]),
            )]
        }

        fn num_probes(&self, _gid: NeuronId) -> u32 {
            1
        }
    }

    let ctx = Context::local_with_threads(1);
    let rec = DrivenCell;
    let mut sim = build(&rec, &ctx);
    sim.set_binning_policy(BinningPolicy::Regular, 0.1);

    let samples: Arc<Mutex<Vec<Sample>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&samples);
    sim.add_sampler(
        all_probes(),
        Schedule::explicit(vec![0.25]),
        Arc::new(move |_, recorded| {
            sink.lock().unwrap().extend_from_slice(recorded);
        }),
        SamplingPolicy::Lax,
    );

    sim.run(1.0, 0.025).unwrap();

    let samples = samples.lock().unwrap();
    assert_eq!(samples.len(), 1);

    // Two jumps land at the 0.1 bin, one at 0.2; the voltage at 0.25 is
    // the decayed sum of exactly those binned arrivals.
    let tau: f64 = 10.0;
    let v_at_bin2 = 2.0 * (-0.1f64 / tau).exp() + 1.0;
    let expected = v_at_bin2 * (-0.05f64 / tau).exp();
    assert!((samples[0].value - expected).abs() < 1e-9);
}

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! Shared test recipes: small networks with hand-checkable spike timing.

// Each integration test binary compiles this module; not every binary uses
// every recipe.
#![allow(dead_code)]

use neuromesh::prelude::*;

/// Suprathreshold LIF parameters: a single weight-1.0 event fires the cell
/// at the event time. The long refractory period keeps ring traffic from
/// re-triggering a cell within a short run.
pub fn test_cell() -> LifCell {
    LifCell {
        v_th: 0.5,
        c_m: 1.0,
        t_ref: 5.0,
        ..LifCell::default()
    }
}

/// One or more independent rings of LIF cells.
///
/// Cells are laid out in `num_tiles` tiles of `tile_size` cells; within a
/// tile each cell receives a connection from its predecessor (wrapping), so
/// tile t is the ring `[t*size, (t+1)*size)`. Cell 0 carries an explicit
/// drive.
pub struct RingRecipe {
    pub num_tiles: u32,
    pub tile_size: u32,
    pub delay: f64,
    pub weight: f32,
    pub drive_time: f64,
}

impl RingRecipe {
    pub fn single(tile_size: u32, delay: f64) -> Self {
        Self {
            num_tiles: 1,
            tile_size,
            delay,
            weight: 1.0,
            drive_time: 0.1,
        }
    }

    pub fn tiled(num_tiles: u32, tile_size: u32, delay: f64) -> Self {
        Self {
            num_tiles,
            tile_size,
            delay,
            weight: 1.0,
            drive_time: 0.1,
        }
    }
}

impl Recipe for RingRecipe {
    fn num_cells(&self) -> u32 {
        self.num_tiles * self.tile_size
    }

    fn cell_kind(&self, _gid: NeuronId) -> CellKind {
        CellKind::Lif
    }

    fn cell_description(&self, _gid: NeuronId) -> CellDescription {
        CellDescription::Lif(test_cell())
    }

    fn connections_on(&self, gid: NeuronId) -> Vec<CellConnection> {
        let base = gid.0 / self.tile_size * self.tile_size;
        let local = gid.0 - base;
        let source = base + (local + self.tile_size - 1) % self.tile_size;
        vec![CellConnection::new(
            Endpoint::new(NeuronId(source), 0),
            0,
            self.weight,
            self.delay,
        )]
    }

    fn event_generators_on(&self, gid: NeuronId) -> Vec<EventGenerator> {
        if gid.0 == 0 {
            vec![EventGenerator::new(
                0,
                1.0,
                Schedule::explicit(vec![self.drive_time]),
            )]
        } else {
            Vec::new()
        }
    }
}

/// Fully connected LIF network with subthreshold weights; cell 0 carries a
/// suprathreshold drive. One spike total, reaching every other cell one
/// delay later without triggering secondaries.
pub struct AllToAllRecipe {
    pub n: u32,
    pub delay: f64,
    pub weight: f32,
    pub drive_time: f64,
}

impl Recipe for AllToAllRecipe {
    fn num_cells(&self) -> u32 {
        self.n
    }

    fn cell_kind(&self, _gid: NeuronId) -> CellKind {
        CellKind::Lif
    }

    fn cell_description(&self, _gid: NeuronId) -> CellDescription {
        CellDescription::Lif(test_cell())
    }

    fn connections_on(&self, gid: NeuronId) -> Vec<CellConnection> {
        (0..self.n)
            .filter(|&src| src != gid.0)
            .map(|src| {
                CellConnection::new(Endpoint::new(NeuronId(src), 0), 0, self.weight, self.delay)
            })
            .collect()
    }

    fn event_generators_on(&self, gid: NeuronId) -> Vec<EventGenerator> {
        if gid.0 == 0 {
            vec![EventGenerator::new(
                0,
                1.0,
                Schedule::explicit(vec![self.drive_time]),
            )]
        } else {
            Vec::new()
        }
    }
}

/// A single unconnected LIF cell.
pub struct SingleCellRecipe;

impl Recipe for SingleCellRecipe {
    fn num_cells(&self) -> u32 {
        1
    }

    fn cell_kind(&self, _gid: NeuronId) -> CellKind {
        CellKind::Lif
    }

    fn cell_description(&self, _gid: NeuronId) -> CellDescription {
        CellDescription::Lif(LifCell::default())
    }

    fn connections_on(&self, _gid: NeuronId) -> Vec<CellConnection> {
        Vec::new()
    }
}

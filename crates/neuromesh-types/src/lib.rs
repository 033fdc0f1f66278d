/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # Neuromesh Core Types
//!
//! Shared types for the neuromesh distributed neural simulator.
//!
//! ## Design Philosophy
//! - **Type-safe**: strong newtypes instead of bare integers
//! - **Deterministic**: every ordering used for event delivery is a total
//!   order, so simulations replay identically
//! - **Read-mostly**: connections, descriptions and recipes are immutable
//!   once the simulation is constructed

use std::fmt;

pub mod event;
pub mod recipe;
pub mod schedule;

pub use event::{Connection, Epoch, PostsynapticEvent, Spike};
pub use recipe::{
    CellConnection, CellDescription, EventGenerator, GapJunction, LifCell, ProbeId, ProbeInfo,
    ProbeKind, Recipe,
};
pub use schedule::Schedule;

/// Simulation time in milliseconds.
pub type Time = f64;

/// Global neuron identifier, dense in `[0, num_cells)`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct NeuronId(pub u32);

impl fmt::Display for NeuronId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Neuron({})", self.0)
    }
}

/// A synaptic endpoint: a cell plus a local endpoint index on that cell.
///
/// The derived ordering is lexicographic (neuron, then index), which is the
/// sort order used for spike exchange and the connection table.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct Endpoint {
    pub neuron: NeuronId,
    pub index: u32,
}

impl Endpoint {
    #[inline(always)]
    pub fn new(neuron: NeuronId, index: u32) -> Self {
        Self { neuron, index }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.neuron.0, self.index)
    }
}

/// Cell kind tag, used to sort cells into homogeneous groups.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
pub enum CellKind {
    /// Multi-compartment cable neuron. The cable integrator is an external
    /// collaborator; this crate only routes its cells and events.
    Cable,
    /// Leaky integrate-and-fire neuron.
    Lif,
    /// Cell that emits spikes on a fixed schedule and receives nothing.
    SpikeSource,
}

impl fmt::Display for CellKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellKind::Cable => write!(f, "cable"),
            CellKind::Lif => write!(f, "lif"),
            CellKind::SpikeSource => write!(f, "spike_source"),
        }
    }
}

/// Execution backend for one cell group.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
pub enum BackendKind {
    Multicore,
    Gpu,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Multicore => write!(f, "multicore"),
            BackendKind::Gpu => write!(f, "gpu"),
        }
    }
}

/// Handle identifying a registered sampler.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct SamplerHandle(pub u32);

/// Error type shared across the simulator core.
#[derive(Debug, thiserror::Error)]
pub enum SimulationError {
    #[error("invalid recipe for cell {gid}: {reason}")]
    RecipeError { gid: NeuronId, reason: String },

    #[error("gap junction component containing cell {gid} mixes cell kinds")]
    GapJunctionKindMismatch { gid: NeuronId },

    #[error("cell group {index} is empty")]
    EmptyGroup { index: usize },

    #[error("backend {backend} unavailable for cell kind {kind}")]
    BackendUnavailable { kind: CellKind, backend: BackendKind },

    #[error("transport failure during {op}: {reason}")]
    Transport { op: &'static str, reason: String },

    #[error("execution resource error: {reason}")]
    ResourceError { reason: String },

    #[error("cell {gid} failed to integrate: {reason}")]
    IntegrationError { gid: NeuronId, reason: String },

    #[error("unknown sampler handle {0:?}")]
    UnknownSampler(SamplerHandle),

    #[error("probe {index} does not exist on cell {gid}")]
    UnknownProbe { gid: NeuronId, index: u32 },
}

pub type Result<T> = std::result::Result<T, SimulationError>;
pub type Error = SimulationError;

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # Recipe
//!
//! Pull-model description of a network. The recipe is queried, possibly
//! many times per cell, by the domain decomposition and the communicator;
//! every method must be pure, reproducible, and identical on every rank.
//!
//! Contract highlights:
//! - connections are listed on their *destination* cell only;
//! - gap junctions form an undirected graph and must be reported from both
//!   endpoints;
//! - all delays are strictly positive.

use crate::schedule::Schedule;
use crate::{CellKind, Endpoint, NeuronId, Result, SimulationError, Time};

/// An incoming synaptic connection as described by the recipe, before it is
/// resolved against the domain decomposition.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CellConnection {
    /// Source endpoint anywhere in the global network.
    pub source: Endpoint,
    /// Local endpoint index on the destination cell.
    pub target_index: u32,
    pub weight: f32,
    pub delay: Time,
}

impl CellConnection {
    pub fn new(source: Endpoint, target_index: u32, weight: f32, delay: Time) -> Self {
        Self {
            source,
            target_index,
            weight,
            delay,
        }
    }
}

/// One side of a bidirectional electrical coupling.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GapJunction {
    pub peer: NeuronId,
    /// Coupling conductance; consumed by the cable integrator, carried here
    /// only so the decomposition can keep coupled cells together.
    pub conductance: f64,
}

impl GapJunction {
    pub fn new(peer: NeuronId, conductance: f64) -> Self {
        Self { peer, conductance }
    }
}

/// External event source attached to one cell: injects synthetic synaptic
/// events at schedule times, independent of any network connection.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct EventGenerator {
    pub target_index: u32,
    pub weight: f32,
    pub schedule: Schedule,
}

impl EventGenerator {
    pub fn new(target_index: u32, weight: f32, schedule: Schedule) -> Self {
        Self {
            target_index,
            weight,
            schedule,
        }
    }
}

/// Address of one probe on one cell.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct ProbeId {
    pub gid: NeuronId,
    pub index: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ProbeKind {
    MembraneVoltage,
}

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ProbeInfo {
    pub id: ProbeId,
    pub kind: ProbeKind,
}

/// Parameters of a leaky integrate-and-fire cell.
///
/// Units: membrane time constant and refractory period in ms, capacitance in
/// pF, voltages in mV.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LifCell {
    pub tau_m: f64,
    pub v_th: f64,
    pub c_m: f64,
    pub e_l: f64,
    pub v_m: f64,
    pub v_reset: f64,
    pub t_ref: f64,
}

impl Default for LifCell {
    fn default() -> Self {
        Self {
            tau_m: 10.0,
            v_th: 10.0,
            c_m: 20.0,
            e_l: 0.0,
            v_m: 0.0,
            v_reset: 0.0,
            t_ref: 2.0,
        }
    }
}

/// Opaque cell payload handed to the group factory, tagged by kind.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum CellDescription {
    Lif(LifCell),
    SpikeSource(Schedule),
    /// Placeholder for the external cable integrator's payload.
    Cable,
}

impl CellDescription {
    pub fn kind(&self) -> CellKind {
        match self {
            CellDescription::Lif(_) => CellKind::Lif,
            CellDescription::SpikeSource(_) => CellKind::SpikeSource,
            CellDescription::Cable => CellKind::Cable,
        }
    }
}

/// Pull-model network description.
///
/// Implementations must be side-effect free: the same query returns the same
/// answer on every rank and every call.
pub trait Recipe: Send + Sync {
    /// Total number of cells in the global network, identical on all ranks.
    fn num_cells(&self) -> u32;

    fn cell_kind(&self, gid: NeuronId) -> CellKind;

    fn cell_description(&self, gid: NeuronId) -> CellDescription;

    /// Incoming connections terminating on `gid`, from any source.
    fn connections_on(&self, gid: NeuronId) -> Vec<CellConnection>;

    /// Gap-junction peers of `gid`. Must agree when queried from either
    /// endpoint of a junction.
    fn gap_junctions_on(&self, _gid: NeuronId) -> Vec<GapJunction> {
        Vec::new()
    }

    /// External event generators attached to `gid`.
    fn event_generators_on(&self, _gid: NeuronId) -> Vec<EventGenerator> {
        Vec::new()
    }

    fn num_probes(&self, _gid: NeuronId) -> u32 {
        0
    }

    fn probe(&self, id: ProbeId) -> Result<ProbeInfo> {
        Err(SimulationError::UnknownProbe {
            gid: id.gid,
            index: id.index,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TwoCellRecipe;

    impl Recipe for TwoCellRecipe {
        fn num_cells(&self) -> u32 {
            2
        }

        fn cell_kind(&self, _gid: NeuronId) -> CellKind {
            CellKind::Lif
        }

        fn cell_description(&self, _gid: NeuronId) -> CellDescription {
            CellDescription::Lif(LifCell::default())
        }

        fn connections_on(&self, gid: NeuronId) -> Vec<CellConnection> {
            if gid == NeuronId(1) {
                vec![CellConnection::new(
                    Endpoint::new(NeuronId(0), 0),
                    0,
                    1.0,
                    0.5,
                )]
            } else {
                Vec::new()
            }
        }

        fn num_probes(&self, _gid: NeuronId) -> u32 {
            1
        }

        fn probe(&self, id: ProbeId) -> Result<ProbeInfo> {
            if id.index == 0 {
                Ok(ProbeInfo {
                    id,
                    kind: ProbeKind::MembraneVoltage,
                })
            } else {
                Err(SimulationError::UnknownProbe {
                    gid: id.gid,
                    index: id.index,
                })
            }
        }
    }

    #[test]
    fn test_minimal_recipe_surface() {
        let rec = TwoCellRecipe;
        assert_eq!(rec.num_cells(), 2);
        assert_eq!(rec.connections_on(NeuronId(0)).len(), 0);
        assert_eq!(rec.connections_on(NeuronId(1)).len(), 1);
        assert!(rec.gap_junctions_on(NeuronId(0)).is_empty());
        assert!(rec.event_generators_on(NeuronId(0)).is_empty());
    }

    #[test]
    fn test_probe_lookup() {
        let rec = TwoCellRecipe;
        let ok = rec.probe(ProbeId {
            gid: NeuronId(0),
            index: 0,
        });
        assert!(ok.is_ok());

        let missing = rec.probe(ProbeId {
            gid: NeuronId(0),
            index: 3,
        });
        assert!(matches!(
            missing,
            Err(SimulationError::UnknownProbe { index: 3, .. })
        ));
    }

    #[test]
    fn test_description_kind_tags() {
        assert_eq!(
            CellDescription::Lif(LifCell::default()).kind(),
            CellKind::Lif
        );
        assert_eq!(
            CellDescription::SpikeSource(Schedule::empty()).kind(),
            CellKind::SpikeSource
        );
        assert_eq!(CellDescription::Cable.kind(), CellKind::Cable);
    }
}

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # Distributed Transport
//!
//! Rank-aware collective operations behind one trait, so the simulator core
//! is identical whether it runs in a single process, across a group of
//! communicating ranks, or in dry-run replication mode.
//!
//! ## Implementations
//! - [`LocalTransport`]: one rank, gathers are copies.
//! - [`ThreadedTransport`]: N in-process ranks rendezvousing through shared
//!   slots; each rank runs the full exchange code path against genuinely
//!   distinct contributions.
//! - [`DryRunTransport`]: replicates one rank's contribution N times with
//!   shifted cell identifiers, emulating a larger network from a single
//!   process while exercising the exact downstream code paths.
//!
//! Transport failures are fatal: the driver never attempts to recover a
//! lost rank.

mod context;
mod dry_run;
mod gathered;
mod local;
mod threaded;

pub use context::Context;
pub use dry_run::DryRunTransport;
pub use gathered::GatheredVector;
pub use local::LocalTransport;
pub use threaded::ThreadedTransport;

use neuromesh_types::{NeuronId, Result, Spike};

/// Collective operations over a group of ranks.
///
/// All gather/reduce/barrier operations are collective: every rank of the
/// group must call the same operation in the same order. `id` and `size`
/// are plain readers.
pub trait Distributed: Send + Sync {
    /// Short name for diagnostics ("local", "threaded", "dry run").
    fn name(&self) -> &'static str;

    /// Rank of this process in `[0, size)`.
    fn id(&self) -> usize;

    /// Number of ranks in the group.
    fn size(&self) -> usize;

    fn barrier(&self) -> Result<()>;

    /// Gather every rank's spikes. The returned partition has `size() + 1`
    /// entries; slice `[partition[r], partition[r+1])` holds rank r's
    /// contribution in the order that rank provided it.
    fn gather_spikes(&self, local: &[Spike]) -> Result<GatheredVector<Spike>>;

    /// Gather every rank's sorted local cell list, same shape as
    /// [`Distributed::gather_spikes`]. Used to build the global
    /// cell-to-rank table.
    fn gather_gids(&self, local: &[NeuronId]) -> Result<GatheredVector<NeuronId>>;

    /// Minimum of `value` over all ranks.
    fn min(&self, value: f64) -> Result<f64>;

    /// Maximum of `value` over all ranks.
    fn max(&self, value: f64) -> Result<f64>;

    /// Sum of `value` over all ranks.
    fn sum(&self, value: u64) -> Result<u64>;
}

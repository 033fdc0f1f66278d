/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # Execution Context
//!
//! The resource-allocation surface handed to the decomposition and the
//! simulation driver: worker thread count, optional GPU, and the transport
//! the run communicates over.

use std::sync::Arc;

use crate::{Distributed, DryRunTransport, LocalTransport, ThreadedTransport};

#[derive(Clone)]
pub struct Context {
    num_threads: usize,
    gpu_id: Option<u32>,
    transport: Arc<dyn Distributed>,
}

impl Context {
    pub fn new(num_threads: usize, gpu_id: Option<u32>, transport: Arc<dyn Distributed>) -> Self {
        assert!(num_threads > 0, "context needs at least one worker thread");
        Self {
            num_threads,
            gpu_id,
            transport,
        }
    }

    /// Single-rank context using all available hardware threads.
    pub fn local() -> Self {
        let threads = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        Self::new(threads, None, Arc::new(LocalTransport::new()))
    }

    pub fn local_with_threads(num_threads: usize) -> Self {
        Self::new(num_threads, None, Arc::new(LocalTransport::new()))
    }

    /// Dry-run context emulating `num_ranks` ranks of `cells_per_tile`
    /// cells each.
    pub fn dry_run(num_ranks: usize, cells_per_tile: u32) -> Self {
        Self::new(
            1,
            None,
            Arc::new(DryRunTransport::new(num_ranks, cells_per_tile)),
        )
    }

    /// One context per rank of an in-process multi-rank group.
    pub fn threaded_group(num_ranks: usize, threads_per_rank: usize) -> Vec<Self> {
        ThreadedTransport::group(num_ranks)
            .into_iter()
            .map(|t| Self::new(threads_per_rank, None, Arc::new(t)))
            .collect()
    }

    pub fn num_threads(&self) -> usize {
        self.num_threads
    }

    pub fn gpu_id(&self) -> Option<u32> {
        self.gpu_id
    }

    pub fn has_gpu(&self) -> bool {
        self.gpu_id.is_some()
    }

    pub fn transport(&self) -> &Arc<dyn Distributed> {
        &self.transport
    }

    pub fn id(&self) -> usize {
        self.transport.id()
    }

    pub fn size(&self) -> usize {
        self.transport.size()
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("num_threads", &self.num_threads)
            .field("gpu_id", &self.gpu_id)
            .field("transport", &self.transport.name())
            .field("rank", &self.transport.id())
            .field("size", &self.transport.size())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_context() {
        let ctx = Context::local_with_threads(2);
        assert_eq!(ctx.num_threads(), 2);
        assert!(!ctx.has_gpu());
        assert_eq!(ctx.size(), 1);
        assert_eq!(ctx.id(), 0);
    }

    #[test]
    fn test_dry_run_context_reports_group_size() {
        let ctx = Context::dry_run(5, 8);
        assert_eq!(ctx.size(), 5);
        assert_eq!(ctx.id(), 0);
        assert_eq!(ctx.transport().name(), "dry run");
    }

    #[test]
    fn test_threaded_group_contexts() {
        let ctxs = Context::threaded_group(3, 1);
        assert_eq!(ctxs.len(), 3);
        for (i, ctx) in ctxs.iter().enumerate() {
            assert_eq!(ctx.id(), i);
            assert_eq!(ctx.size(), 3);
        }
    }
}

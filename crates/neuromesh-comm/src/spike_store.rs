/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # Local Spike Store
//!
//! Double-buffered per-rank spike accumulator. Cell groups append into the
//! current (write) buffer while the previous (read) buffer is being
//! exchanged; the driver swaps the two between epochs. Inserts may arrive
//! from multiple groups in parallel and keep their arrival order within the
//! buffer; the communicator sorts by source endpoint before the gather.

use parking_lot::Mutex;

use neuromesh_types::Spike;

#[derive(Debug, Default)]
pub struct SpikeStore {
    current: Mutex<Vec<Spike>>,
    previous: Mutex<Vec<Spike>>,
}

impl SpikeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append spikes to the current buffer. Callable from multiple cell
    /// groups in parallel.
    pub fn insert(&self, spikes: &[Spike]) {
        self.current.lock().extend_from_slice(spikes);
    }

    /// Swap the current and previous buffers. Called by the driver at the
    /// epoch boundary, outside the parallel section.
    pub fn exchange(&self) {
        let mut current = self.current.lock();
        let mut previous = self.previous.lock();
        std::mem::swap(&mut *current, &mut *previous);
    }

    /// Empty the current buffer.
    pub fn clear_current(&self) {
        self.current.lock().clear();
    }

    /// Snapshot the previous buffer for the collective gather.
    pub fn gather_previous(&self) -> Vec<Spike> {
        self.previous.lock().clone()
    }

    pub fn current_len(&self) -> usize {
        self.current.lock().len()
    }

    pub fn clear_both(&self) {
        self.current.lock().clear();
        self.previous.lock().clear();
    }
}

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # Event Binning
//!
//! Buckets incoming event times to reduce jitter. A bin time is never
//! later than the event time it replaces.

use neuromesh_types::Time;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinningPolicy {
    /// Deliver at the exact event time.
    None,
    /// Round down to a multiple of the bin interval.
    Regular,
    /// Reuse the previous bin time while events stay within one interval
    /// of it.
    Following,
}

/// Per-cell binner state. Events must be presented in non-decreasing time
/// order, which the sorted lanes guarantee.
#[derive(Debug, Clone)]
pub struct EventBinner {
    policy: BinningPolicy,
    bin_interval: Time,
    last_bin: Option<Time>,
}

impl EventBinner {
    pub fn new(policy: BinningPolicy, bin_interval: Time) -> Self {
        Self {
            policy,
            bin_interval,
            last_bin: None,
        }
    }

    pub fn none() -> Self {
        Self::new(BinningPolicy::None, 0.0)
    }

    pub fn reset(&mut self) {
        self.last_bin = None;
    }

    pub fn bin(&mut self, t: Time) -> Time {
        match self.policy {
            BinningPolicy::None => t,
            BinningPolicy::Regular => {
                if self.bin_interval <= 0.0 {
                    t
                } else {
                    (t / self.bin_interval).floor() * self.bin_interval
                }
            }
            BinningPolicy::Following => match self.last_bin {
                Some(last) if t - last < self.bin_interval => last,
                _ => {
                    self.last_bin = Some(t);
                    t
                }
            },
        }
    }
}

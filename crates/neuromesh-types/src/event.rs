/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # Spikes, Events, Connections and Epochs
//!
//! The wire-level entities of the simulation loop. A `Spike` is produced by
//! a cell group, exchanged across ranks, and turned into one
//! `PostsynapticEvent` per matching `Connection`. Events are delivered in
//! (time, target, weight) order, which is a total order and therefore
//! deterministic.

use std::cmp::Ordering;

use crate::{Endpoint, Time};

/// A threshold crossing emitted by a cell.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Spike {
    pub source: Endpoint,
    pub time: Time,
}

impl Spike {
    #[inline(always)]
    pub fn new(source: Endpoint, time: Time) -> Self {
        Self { source, time }
    }
}

/// A weighted impulse scheduled for delivery to one synaptic endpoint.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PostsynapticEvent {
    pub target: Endpoint,
    pub time: Time,
    pub weight: f32,
}

impl PostsynapticEvent {
    #[inline(always)]
    pub fn new(target: Endpoint, time: Time, weight: f32) -> Self {
        Self {
            target,
            time,
            weight,
        }
    }

    /// Delivery order: time, then target endpoint, then weight.
    ///
    /// Ties between simultaneous events to the same endpoint are broken by
    /// weight so that the order is total and replays identically.
    #[inline]
    pub fn delivery_order(&self, other: &Self) -> Ordering {
        self.time
            .total_cmp(&other.time)
            .then_with(|| self.target.cmp(&other.target))
            .then_with(|| self.weight.total_cmp(&other.weight))
    }
}

/// Immutable synaptic link from a source endpoint to a target endpoint.
///
/// Constructed once from the recipe when the communicator is built and never
/// mutated. `group_index` caches the local cell group of the target so that
/// event generation can bucket events without a lookup.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Connection {
    pub source: Endpoint,
    pub target: Endpoint,
    pub weight: f32,
    pub delay: Time,
    pub group_index: usize,
}

impl Connection {
    pub fn new(
        source: Endpoint,
        target: Endpoint,
        weight: f32,
        delay: Time,
        group_index: usize,
    ) -> Self {
        Self {
            source,
            target,
            weight,
            delay,
            group_index,
        }
    }

    /// The event a spike on this connection's source produces.
    #[inline(always)]
    pub fn make_event(&self, spike: &Spike) -> PostsynapticEvent {
        PostsynapticEvent {
            target: self.target,
            time: spike.time + self.delay,
            weight: self.weight,
        }
    }
}

/// One integration interval of the driver.
///
/// Epochs are contiguous and non-overlapping; the driver sizes them at half
/// the global minimum delay so that a spike emitted inside an epoch can
/// never require delivery inside the same epoch.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Epoch {
    pub id: u64,
    pub t_begin: Time,
    pub t_end: Time,
}

impl Epoch {
    pub fn new(id: u64, t_begin: Time, t_end: Time) -> Self {
        Self { id, t_begin, t_end }
    }

    /// The successor epoch ending at `t_next`.
    pub fn advance(&self, t_next: Time) -> Self {
        Self {
            id: self.id + 1,
            t_begin: self.t_end,
            t_end: t_next,
        }
    }

    #[inline(always)]
    pub fn contains(&self, t: Time) -> bool {
        t >= self.t_begin && t < self.t_end
    }

    pub fn duration(&self) -> Time {
        self.t_end - self.t_begin
    }
}

/// Sort spikes by source endpoint, preserving emission order between equal
/// sources. This is the pre-exchange order the communicator relies on.
pub fn sort_spikes_by_source(spikes: &mut [Spike]) {
    spikes.sort_by_key(|s| s.source);
}

/// Sort events into delivery order.
pub fn sort_events_for_delivery(events: &mut [PostsynapticEvent]) {
    events.sort_by(PostsynapticEvent::delivery_order);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NeuronId;

    fn endpoint(gid: u32, index: u32) -> Endpoint {
        Endpoint::new(NeuronId(gid), index)
    }

    #[test]
    fn test_connection_make_event_applies_delay() {
        let con = Connection::new(endpoint(0, 0), endpoint(3, 1), 0.5, 1.25, 2);
        let spike = Spike::new(endpoint(0, 0), 0.1);

        let ev = con.make_event(&spike);
        assert_eq!(ev.target, endpoint(3, 1));
        assert_eq!(ev.weight, 0.5);
        assert!((ev.time - 1.35).abs() < 1e-12);
    }

    #[test]
    fn test_delivery_order_breaks_ties_by_target_then_weight() {
        let a = PostsynapticEvent::new(endpoint(1, 0), 2.0, 0.1);
        let b = PostsynapticEvent::new(endpoint(1, 1), 2.0, 0.1);
        let c = PostsynapticEvent::new(endpoint(1, 1), 2.0, 0.2);
        let d = PostsynapticEvent::new(endpoint(0, 0), 2.5, 0.0);

        let mut events = vec![d, c, b, a];
        sort_events_for_delivery(&mut events);
        assert_eq!(events, vec![a, b, c, d]);
    }

    #[test]
    fn test_spike_sort_is_stable_per_source() {
        let mut spikes = vec![
            Spike::new(endpoint(2, 0), 0.3),
            Spike::new(endpoint(1, 0), 0.9),
            Spike::new(endpoint(2, 0), 0.1),
        ];
        sort_spikes_by_source(&mut spikes);

        assert_eq!(spikes[0].source, endpoint(1, 0));
        // Emission order preserved between spikes with the same source.
        assert_eq!(spikes[1].time, 0.3);
        assert_eq!(spikes[2].time, 0.1);
    }

    #[test]
    fn test_epoch_advance_is_contiguous() {
        let e0 = Epoch::new(0, 0.0, 0.5);
        let e1 = e0.advance(1.0);

        assert_eq!(e1.id, 1);
        assert_eq!(e1.t_begin, 0.5);
        assert_eq!(e1.t_end, 1.0);
        assert!(e1.contains(0.5));
        assert!(!e1.contains(1.0));
        assert_eq!(e1.duration(), 0.5);
    }
}

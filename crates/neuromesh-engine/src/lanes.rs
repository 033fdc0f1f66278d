/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # Event Lanes
//!
//! Two banks of per-group event lanes, rotated every epoch: the current
//! bank is read by the advance task while the next bank is written by the
//! exchange task's merge. The banks are disjoint, so the two tasks need no
//! locking.
//!
//! Lanes are kept sorted in delivery order (time, target, weight).

use neuromesh_comm::EventQueue;
use neuromesh_types::{PostsynapticEvent, Time};

pub struct EventLanes {
    banks: [Vec<EventQueue>; 2],
}

impl EventLanes {
    pub fn new(num_groups: usize) -> Self {
        Self {
            banks: [vec![Vec::new(); num_groups], vec![Vec::new(); num_groups]],
        }
    }

    /// The bank read during epoch `epoch_id` and the bank written for the
    /// next epoch.
    pub fn split(&mut self, epoch_id: u64) -> (&[EventQueue], &mut [EventQueue]) {
        let (a, b) = self.banks.split_at_mut(1);
        if epoch_id % 2 == 0 {
            (&a[0], &mut b[0])
        } else {
            (&b[0], &mut a[0])
        }
    }

    pub fn current(&self, epoch_id: u64) -> &[EventQueue] {
        &self.banks[(epoch_id % 2) as usize]
    }

    pub fn num_groups(&self) -> usize {
        self.banks[0].len()
    }

    pub fn clear(&mut self) {
        for bank in &mut self.banks {
            for lane in bank.iter_mut() {
                lane.clear();
            }
        }
    }
}

/// Merge one lane for the epoch boundary.
///
/// `events` are freshly derived from this exchange (unsorted);
/// `lane_current` is the lane the just-finished advance consumed, whose
/// prefix with `time < t_end` has been delivered. The result, written to
/// `lane_next`, is the delivery-ordered merge of the new events with the
/// undelivered suffix.
pub fn merge_events(
    events: &mut Vec<PostsynapticEvent>,
    lane_current: &[PostsynapticEvent],
    lane_next: &mut Vec<PostsynapticEvent>,
    t_end: Time,
) {
    events.sort_by(PostsynapticEvent::delivery_order);

    let pos = lane_current.partition_point(|e| e.time < t_end);
    let suffix = &lane_current[pos..];

    lane_next.clear();
    lane_next.reserve(events.len() + suffix.len());

    // Two-way merge; new events win ties so the merge is stable with the
    // fresh side first.
    let mut i = 0;
    let mut j = 0;
    while i < events.len() && j < suffix.len() {
        if events[i].delivery_order(&suffix[j]) != std::cmp::Ordering::Greater {
            lane_next.push(events[i]);
            i += 1;
        } else {
            lane_next.push(suffix[j]);
            j += 1;
        }
    }
    lane_next.extend_from_slice(&events[i..]);
    lane_next.extend_from_slice(&suffix[j..]);
}

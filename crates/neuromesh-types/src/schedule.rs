/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # Time Schedules
//!
//! Deterministic sequences of time points, queried by half-open interval.
//! Schedules drive spike-source cells, external event generators and
//! sampler callbacks. Queries are pure: the same interval always yields the
//! same times, so resetting a simulation replays identically.

use crate::Time;

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Schedule {
    /// No time points.
    Empty,
    /// Points at `t_begin + k*dt` for integer k, up to but excluding `t_end`.
    Regular {
        t_begin: Time,
        dt: Time,
        t_end: Time,
    },
    /// An explicit, ascending list of time points.
    Explicit { times: Vec<Time> },
}

impl Schedule {
    pub fn empty() -> Self {
        Schedule::Empty
    }

    /// Regular schedule with no upper bound.
    pub fn regular(t_begin: Time, dt: Time) -> Self {
        Schedule::Regular {
            t_begin,
            dt,
            t_end: Time::INFINITY,
        }
    }

    pub fn regular_until(t_begin: Time, dt: Time, t_end: Time) -> Self {
        Schedule::Regular { t_begin, dt, t_end }
    }

    /// Explicit schedule; `times` must already be ascending.
    pub fn explicit(times: Vec<Time>) -> Self {
        debug_assert!(times.windows(2).all(|w| w[0] <= w[1]));
        Schedule::Explicit { times }
    }

    /// All schedule points in `[t0, t1)`, in ascending order.
    pub fn events(&self, t0: Time, t1: Time) -> Vec<Time> {
        match self {
            Schedule::Empty => Vec::new(),
            Schedule::Regular { t_begin, dt, t_end } => {
                let stop = t1.min(*t_end);
                if stop <= t0 || *dt <= 0.0 {
                    return Vec::new();
                }
                // Step index near t0, backed off by one so rounding in the
                // division can never skip a grid point; the t >= t0 guard
                // below drops any early ones.
                let k0 = if t0 <= *t_begin {
                    0
                } else {
                    (((t0 - t_begin) / dt).floor() as u64).saturating_sub(1)
                };
                let mut times = Vec::new();
                let mut k = k0;
                loop {
                    let t = t_begin + k as Time * dt;
                    if t >= stop {
                        break;
                    }
                    if t >= t0 {
                        times.push(t);
                    }
                    k += 1;
                }
                times
            }
            Schedule::Explicit { times } => {
                let lb = times.partition_point(|&t| t < t0);
                let ub = times.partition_point(|&t| t < t1);
                times[lb..ub].to_vec()
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Schedule::Empty)
            || matches!(self, Schedule::Explicit { times } if times.is_empty())
    }
}

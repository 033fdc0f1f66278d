/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! Spike record output: one spike per line, `<gid> <time>` with four
//! fractional digits, in the order given.

use std::io::{self, Write};

use neuromesh_types::Spike;

pub fn write_spike_records<W: Write>(out: &mut W, spikes: &[Spike]) -> io::Result<()> {
    for spike in spikes {
        writeln!(out, "{} {:.4}", spike.source.neuron.0, spike.time)?;
    }
    Ok(())
}

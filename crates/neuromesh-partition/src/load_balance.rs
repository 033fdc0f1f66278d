/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # Load Balance
//!
//! Computes the domain decomposition from a recipe and an execution
//! context. Cells are dealt to ranks in contiguous blocks; gap-junction
//! connected components are discovered by BFS and owned by the rank whose
//! block contains the component's smallest GID, so every super-cell is
//! assigned exactly once.

use std::collections::VecDeque;

use ahash::{AHashMap, AHashSet};

use neuromesh_transport::Context;
use neuromesh_types::{
    BackendKind, CellKind, NeuronId, Recipe, Result, SimulationError,
};

use crate::{
    has_gpu_backend, DomainDecomposition, GroupDescription, PartitionHint, PartitionHintMap,
};

/// A packable unit on this rank: a single independent cell or an index into
/// the super-cell list.
enum LocalItem {
    Cell(NeuronId),
    SuperCell(usize),
}

pub fn partition_load_balance(
    rec: &dyn Recipe,
    ctx: &Context,
    hints: &PartitionHintMap,
) -> Result<DomainDecomposition> {
    let num_domains = ctx.size();
    let domain_id = ctx.id();
    let num_global_cells = rec.num_cells();

    // Block rule: every rank receives ⌊N/R⌋ or ⌈N/R⌉ cells.
    let base = num_global_cells / num_domains as u32;
    let remainder = num_global_cells - base * num_domains as u32;
    let dom_size = |dom: usize| -> u32 { base + u32::from((dom as u32) < remainder) };

    let block_begin: u32 = (0..domain_id).map(&dom_size).sum();
    let block_end: u32 = block_begin + dom_size(domain_id);

    // Connected components of the gap-junction graph, seeded from cells in
    // this rank's block. A component may reach outside the block; ownership
    // is resolved below by the smallest-GID rule.
    let mut super_cells: Vec<Vec<NeuronId>> = Vec::new();
    let mut reg_cells: Vec<NeuronId> = Vec::new();
    let mut visited: AHashSet<NeuronId> = AHashSet::new();

    let mut queue: VecDeque<NeuronId> = VecDeque::new();
    for raw in block_begin..block_end {
        let gid = NeuronId(raw);
        let junctions = rec.gap_junctions_on(gid);
        if junctions.is_empty() {
            reg_cells.push(gid);
            continue;
        }
        if visited.contains(&gid) {
            continue;
        }

        let mut component = Vec::new();
        queue.push_back(gid);
        visited.insert(gid);
        while let Some(element) = queue.pop_front() {
            component.push(element);
            for junction in rec.gap_junctions_on(element) {
                let peer = junction.peer;
                if peer.0 >= num_global_cells {
                    return Err(SimulationError::RecipeError {
                        gid: element,
                        reason: format!("gap junction peer {peer} is out of range"),
                    });
                }
                if visited.insert(peer) {
                    queue.push_back(peer);
                }
            }
        }
        component.sort();
        super_cells.push(component);
    }

    // Keep a component only if its smallest GID falls in this block; the
    // rank owning that GID keeps the whole super-cell.
    super_cells.retain(|component| component[0].0 >= block_begin);

    // Cells coupled by gap junctions are integrated together, so a
    // component spanning kinds cannot be grouped.
    for component in &super_cells {
        let kind = rec.cell_kind(component[0]);
        for &gid in component {
            if rec.cell_kind(gid) != kind {
                return Err(SimulationError::GapJunctionKindMismatch { gid });
            }
        }
    }

    // Sort local cells into kind lists; kinds keep first-seen order so the
    // resulting group list is deterministic.
    let mut local_gids: Vec<NeuronId> = Vec::new();
    let mut kind_lists: AHashMap<CellKind, Vec<LocalItem>> = AHashMap::new();
    let mut kinds: Vec<CellKind> = Vec::new();

    fn note_kind(kind: CellKind, kinds: &mut Vec<CellKind>) {
        if !kinds.contains(&kind) {
            kinds.push(kind);
        }
    }

    for &gid in &reg_cells {
        let kind = rec.cell_kind(gid);
        note_kind(kind, &mut kinds);
        kind_lists.entry(kind).or_default().push(LocalItem::Cell(gid));
        local_gids.push(gid);
    }
    for (i, component) in super_cells.iter().enumerate() {
        let kind = rec.cell_kind(component[0]);
        note_kind(kind, &mut kinds);
        kind_lists.entry(kind).or_default().push(LocalItem::SuperCell(i));
        local_gids.extend_from_slice(component);
    }

    // GPU-capable kinds go first so their groups are scheduled ahead of the
    // multicore groups.
    kinds.sort_by_key(|k| !has_gpu_backend(*k));

    let gpu_avail = ctx.has_gpu();
    let mut groups: Vec<GroupDescription> = Vec::new();
    for kind in kinds {
        let hint: PartitionHint = hints.get(&kind).copied().unwrap_or_default();

        let (backend, group_size) = if hint.prefer_gpu && gpu_avail && has_gpu_backend(kind) {
            (BackendKind::Gpu, hint.gpu_group_size)
        } else {
            (BackendKind::Multicore, hint.cpu_group_size)
        };
        let group_size = group_size.max(1);

        let mut elements: Vec<NeuronId> = Vec::new();
        for item in &kind_lists[&kind] {
            match item {
                LocalItem::Cell(gid) => elements.push(*gid),
                LocalItem::SuperCell(i) => {
                    let component = &super_cells[*i];
                    // A super-cell is indivisible; flush the open group
                    // rather than split the component.
                    if !elements.is_empty() && elements.len() + component.len() > group_size {
                        groups.push(GroupDescription::new(
                            kind,
                            std::mem::take(&mut elements),
                            backend,
                        ));
                    }
                    elements.extend_from_slice(component);
                }
            }
            if elements.len() >= group_size {
                groups.push(GroupDescription::new(
                    kind,
                    std::mem::take(&mut elements),
                    backend,
                ));
            }
        }
        if !elements.is_empty() {
            groups.push(GroupDescription::new(kind, elements, backend));
        }
    }

    for (index, group) in groups.iter().enumerate() {
        if group.gids.is_empty() {
            return Err(SimulationError::EmptyGroup { index });
        }
    }

    // Exchange the local GID list so every rank can answer gid_domain.
    local_gids.sort();
    let num_local_cells = local_gids.len();
    let gid_divisions = ctx.transport().gather_gids(&local_gids)?;

    tracing::info!(
        num_domains,
        domain_id,
        num_local_cells,
        num_groups = groups.len(),
        "domain decomposition complete"
    );

    Ok(DomainDecomposition::new(
        num_domains,
        domain_id,
        num_global_cells,
        num_local_cells,
        groups,
        gid_divisions,
    ))
}

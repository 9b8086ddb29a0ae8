// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Cellweave-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Cellweave and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

/// Per-op mutation helpers used by `apply_ops`.
/// Keeps `ops::mod` focused on public op types and orchestration.
fn apply_add(
    document: &mut Document,
    cell_id: &CellId,
    fragment: &str,
    delta: &mut DeltaBuilder,
    fixes: &mut Vec<Fix>,
) -> Result<(), ApplyError> {
    if cell_id.is_sentinel() {
        return Err(ApplyError::ReservedId { cell_id: cell_id.clone() });
    }
    if document.contains(cell_id.as_str()) {
        return Err(ApplyError::AlreadyExists { cell_id: cell_id.clone() });
    }

    let (cell, cell_fixes) = single_cell(cell_id, fragment)?;
    check_cell_references(document, &cell)?;

    document.push_cell(cell);
    fixes.extend(cell_fixes);
    delta.record_added(cell_id.clone());
    Ok(())
}

fn apply_update(
    document: &mut Document,
    cell_id: &CellId,
    fragment: &str,
    delta: &mut DeltaBuilder,
    fixes: &mut Vec<Fix>,
) -> Result<(), ApplyError> {
    if cell_id.is_sentinel() {
        return Err(ApplyError::ReservedId { cell_id: cell_id.clone() });
    }
    if !document.contains(cell_id.as_str()) {
        return Err(ApplyError::NotFound { cell_id: cell_id.clone() });
    }

    let (cell, cell_fixes) = single_cell(cell_id, fragment)?;
    check_cell_references(document, &cell)?;

    let Some(previous) = document.replace_cell(cell) else {
        return Err(ApplyError::NotFound { cell_id: cell_id.clone() });
    };
    if !document.resolves_to_root(cell_id.as_str()) {
        document.replace_cell(previous);
        return Err(ApplyError::ParentCycle { cell_id: cell_id.clone() });
    }

    fixes.extend(cell_fixes);
    delta.record_updated(cell_id.clone());
    Ok(())
}

/// Returns `Ok(false)` when the target is already gone.
fn apply_delete(
    document: &mut Document,
    cell_id: &CellId,
    delta: &mut DeltaBuilder,
) -> Result<bool, ApplyError> {
    if cell_id.is_sentinel() {
        return Err(ApplyError::ReservedId { cell_id: cell_id.clone() });
    }
    if !document.contains(cell_id.as_str()) {
        return Ok(false);
    }

    let doomed = cascade_closure(document, cell_id);
    for removed in document.remove_cells(&doomed) {
        delta.record_removed(removed.id().clone());
    }
    Ok(true)
}

/// Everything deleting `start` takes with it: descendants by parent, edges whose source or
/// target is in the set, and the descendants of those edges, until nothing new is reached.
pub fn cascade_closure(document: &Document, start: &CellId) -> BTreeSet<CellId> {
    let mut visited = BTreeSet::new();
    let mut worklist = vec![start.clone()];

    while let Some(cell_id) = worklist.pop() {
        if cell_id.is_sentinel() || !visited.insert(cell_id.clone()) {
            continue;
        }
        worklist.extend(
            document
                .children_of(cell_id.as_str())
                .chain(document.edges_referencing(cell_id.as_str()))
                .filter(|next| !visited.contains(*next))
                .cloned(),
        );
    }

    visited
}

fn single_cell(
    cell_id: &CellId,
    fragment: &str,
) -> Result<(Cell, Fixes), ApplyError> {
    let checked = check_fragment(fragment).map_err(ApplyError::Fragment)?;
    let found = checked.cells.len();
    let mut cells = checked.cells.into_iter();
    let (Some(cell), None) = (cells.next(), cells.next()) else {
        return Err(ApplyError::FragmentCellCount { found });
    };
    if cell.id() != cell_id {
        return Err(ApplyError::IdMismatch { expected: cell_id.clone(), found: cell.id().clone() });
    }
    Ok((cell, checked.fixes))
}

fn check_cell_references(document: &Document, cell: &Cell) -> Result<(), ApplyError> {
    for (attribute, referenced) in cell.references() {
        if referenced == cell.id() && attribute == "parent" {
            return Err(ApplyError::ParentCycle { cell_id: cell.id().clone() });
        }
        if !document.contains(referenced.as_str()) {
            return Err(ApplyError::DanglingReference(DanglingReference {
                cell_id: cell.id().clone(),
                attribute,
                missing: referenced.clone(),
            }));
        }
    }
    Ok(())
}

// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Cellweave-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Cellweave and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use super::cell::Cell;
use super::ids::CellId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentError {
    DuplicateCellId { cell_id: CellId },
    ReservedCellId { cell_id: CellId },
}

impl fmt::Display for DocumentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateCellId { cell_id } => write!(f, "duplicate cell id '{cell_id}'"),
            Self::ReservedCellId { cell_id } => {
                write!(f, "cell id '{cell_id}' is reserved for the implicit root cells")
            }
        }
    }
}

impl std::error::Error for DocumentError {}

/// A reference that does not resolve inside the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DanglingReference {
    pub cell_id: CellId,
    pub attribute: &'static str,
    pub missing: CellId,
}

impl fmt::Display for DanglingReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cell '{}' has {}=\"{}\" but no cell with that id exists",
            self.cell_id, self.attribute, self.missing
        )
    }
}

/// The cell graph of one diagram page.
///
/// Cells live in a flat id-keyed map; `order` keeps document order for export. Two
/// indexes are maintained alongside: `children` (parent id -> child ids) and `edge_refs`
/// (endpoint id -> edges whose `source`/`target` name it). Both may hold entries for ids
/// that are not (or no longer) present; lookups go through `cells` first.
///
/// The sentinel cells `"0"` and `"1"` are always present and are never part of `order`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    cells: BTreeMap<CellId, Cell>,
    order: Vec<CellId>,
    children: BTreeMap<CellId, BTreeSet<CellId>>,
    edge_refs: BTreeMap<CellId, BTreeSet<CellId>>,
    rev: u64,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// An empty document holding only the sentinel cells.
    pub fn new() -> Self {
        let root = Cell::new(CellId::root());
        let mut layer = Cell::new(CellId::layer());
        layer.set_parent(Some(CellId::root()));

        let mut document = Self {
            cells: BTreeMap::new(),
            order: Vec::new(),
            children: BTreeMap::new(),
            edge_refs: BTreeMap::new(),
            rev: 0,
        };
        document.index_cell(&layer);
        document.cells.insert(root.id().clone(), root);
        document.cells.insert(layer.id().clone(), layer);
        document
    }

    /// Builds a document from caller cells in order. Sentinel ids and duplicates are rejected;
    /// references are not checked here (see [`Document::dangling_references`]).
    pub fn from_cells(cells: impl IntoIterator<Item = Cell>) -> Result<Self, DocumentError> {
        let mut document = Self::new();
        for cell in cells {
            if cell.id().is_sentinel() {
                return Err(DocumentError::ReservedCellId { cell_id: cell.id().clone() });
            }
            if document.contains(cell.id().as_str()) {
                return Err(DocumentError::DuplicateCellId { cell_id: cell.id().clone() });
            }
            document.push_cell(cell);
        }
        Ok(document)
    }

    pub fn rev(&self) -> u64 {
        self.rev
    }

    pub fn set_rev(&mut self, rev: u64) {
        self.rev = rev;
    }

    pub fn bump_rev(&mut self) {
        self.rev = self.rev.saturating_add(1);
    }

    /// Number of caller cells (sentinels excluded).
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, cell_id: &str) -> bool {
        self.cells.contains_key(cell_id)
    }

    pub fn get(&self, cell_id: &str) -> Option<&Cell> {
        self.cells.get(cell_id)
    }

    /// Caller cells in document order.
    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.order.iter().filter_map(|cell_id| self.cells.get(cell_id))
    }

    pub fn cell_ids(&self) -> impl Iterator<Item = &CellId> {
        self.order.iter()
    }

    /// Direct children of `cell_id`, in id order.
    pub fn children_of(&self, cell_id: &str) -> impl Iterator<Item = &CellId> {
        self.children
            .get(cell_id)
            .into_iter()
            .flatten()
            .filter(|child| self.cells.contains_key(child.as_str()))
    }

    /// Edges naming `cell_id` as `source` or `target`, in id order.
    pub fn edges_referencing(&self, cell_id: &str) -> impl Iterator<Item = &CellId> {
        self.edge_refs
            .get(cell_id)
            .into_iter()
            .flatten()
            .filter(|edge| self.cells.contains_key(edge.as_str()))
    }

    /// Every `parent`/`source`/`target` that does not resolve, in document order.
    pub fn dangling_references(&self) -> Vec<DanglingReference> {
        let mut dangling = Vec::new();
        for cell in self.cells() {
            for (attribute, referenced) in cell.references() {
                if !self.contains(referenced.as_str()) {
                    dangling.push(DanglingReference {
                        cell_id: cell.id().clone(),
                        attribute,
                        missing: referenced.clone(),
                    });
                }
            }
        }
        dangling
    }

    /// Walks the parent chain of `cell_id` and reports whether it reaches the root sentinel.
    /// Loops and dangling links report false.
    pub fn resolves_to_root(&self, cell_id: &str) -> bool {
        let mut seen = BTreeSet::new();
        let mut current = cell_id;
        loop {
            if current == CellId::root().as_str() {
                return true;
            }
            if !seen.insert(current) {
                return false;
            }
            let Some(parent) = self.cells.get(current).and_then(Cell::parent) else {
                return false;
            };
            current = parent.as_str();
        }
    }

    /// Highest purely numeric cell id plus one, never below 2.
    pub fn next_numeric_id(&self) -> u64 {
        self.order
            .iter()
            .filter_map(|cell_id| cell_id.as_str().parse::<u64>().ok())
            .max()
            .map_or(2, |max| max.saturating_add(1).max(2))
    }

    pub(crate) fn push_cell(&mut self, cell: Cell) {
        self.index_cell(&cell);
        self.order.push(cell.id().clone());
        self.cells.insert(cell.id().clone(), cell);
    }

    /// Replaces an existing caller cell in place. Returns the previous cell.
    pub(crate) fn replace_cell(&mut self, cell: Cell) -> Option<Cell> {
        let previous = self.cells.get(cell.id().as_str()).cloned()?;
        self.unindex_cell(&previous);
        self.index_cell(&cell);
        self.cells.insert(cell.id().clone(), cell);
        Some(previous)
    }

    /// Removes the given caller cells; sentinel ids in `cell_ids` are ignored.
    pub(crate) fn remove_cells(&mut self, cell_ids: &BTreeSet<CellId>) -> Vec<Cell> {
        let mut removed = Vec::new();
        for cell_id in cell_ids {
            if cell_id.is_sentinel() {
                continue;
            }
            if let Some(cell) = self.cells.remove(cell_id.as_str()) {
                self.unindex_cell(&cell);
                self.children.remove(cell_id.as_str());
                self.edge_refs.remove(cell_id.as_str());
                removed.push(cell);
            }
        }
        self.order.retain(|cell_id| !cell_ids.contains(cell_id));
        removed
    }

    fn index_cell(&mut self, cell: &Cell) {
        if let Some(parent) = cell.parent() {
            self.children.entry(parent.clone()).or_default().insert(cell.id().clone());
        }
        for endpoint in [cell.source(), cell.target()].into_iter().flatten() {
            self.edge_refs.entry(endpoint.clone()).or_default().insert(cell.id().clone());
        }
    }

    fn unindex_cell(&mut self, cell: &Cell) {
        if let Some(parent) = cell.parent() {
            if let Some(children) = self.children.get_mut(parent.as_str()) {
                children.remove(cell.id().as_str());
            }
        }
        for endpoint in [cell.source(), cell.target()].into_iter().flatten() {
            if let Some(edges) = self.edge_refs.get_mut(endpoint.as_str()) {
                edges.remove(cell.id().as_str());
            }
        }
    }
}

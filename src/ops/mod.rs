// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Cellweave-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Cellweave and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Id-addressed cell mutations.
//!
//! A batch is applied in order against the live document. Each op either takes effect or
//! records a failure; failures never abort the batch, and later ops observe every earlier
//! successful op. The result carries a minimal delta so callers can report exactly what
//! changed, including everything a cascade delete took with it.

use std::collections::BTreeSet;
use std::fmt;

use crate::failure::FailureKind;
use crate::model::{Cell, CellId, DanglingReference, Document, IdError};
use crate::validate::{check_fragment, Fix, Fixes, ValidationError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    /// Appends a new cell. `fragment` must hold exactly one cell whose id is `cell_id`.
    Add { cell_id: CellId, fragment: String },
    /// Replaces an existing cell in place, keeping its position in document order.
    Update { cell_id: CellId, fragment: String },
    /// Removes a cell together with its descendants and every edge attached to any removed cell.
    Delete { cell_id: CellId },
}

impl Op {
    pub fn kind(&self) -> OpKind {
        match self {
            Self::Add { .. } => OpKind::Add,
            Self::Update { .. } => OpKind::Update,
            Self::Delete { .. } => OpKind::Delete,
        }
    }

    pub fn cell_id(&self) -> &CellId {
        match self {
            Self::Add { cell_id, .. } | Self::Update { cell_id, .. } | Self::Delete { cell_id } => {
                cell_id
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpKind {
    Add,
    Update,
    Delete,
}

impl OpKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One op of a batch that did not take effect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpFailure {
    /// Position of the op in the submitted batch.
    pub index: usize,
    pub op: OpKind,
    pub cell_id: CellId,
    pub error: ApplyError,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyResult {
    pub new_rev: u64,
    pub applied: usize,
    pub failures: Vec<OpFailure>,
    /// Delete targets that were already gone.
    pub skipped: Vec<CellId>,
    pub delta: Delta,
    pub fixes: Vec<Fix>,
}

impl ApplyResult {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Cell ids touched by a batch, each list sorted and free of duplicates.
///
/// An id added and then removed within the same batch appears in neither list.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Delta {
    pub added: Vec<CellId>,
    pub updated: Vec<CellId>,
    pub removed: Vec<CellId>,
}

impl Delta {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.updated.is_empty() && self.removed.is_empty()
    }
}

#[derive(Debug, Default)]
struct DeltaBuilder {
    added: BTreeSet<CellId>,
    updated: BTreeSet<CellId>,
    removed: BTreeSet<CellId>,
}

impl DeltaBuilder {
    fn record_added(&mut self, cell_id: CellId) {
        self.updated.remove(&cell_id);
        if !self.removed.remove(&cell_id) {
            self.added.insert(cell_id);
        } else {
            // Removed and re-added under the same id reads as a replacement.
            self.updated.insert(cell_id);
        }
    }

    fn record_removed(&mut self, cell_id: CellId) {
        self.updated.remove(&cell_id);
        if !self.added.remove(&cell_id) {
            self.removed.insert(cell_id);
        }
    }

    fn record_updated(&mut self, cell_id: CellId) {
        if self.added.contains(&cell_id) || self.removed.contains(&cell_id) {
            return;
        }
        self.updated.insert(cell_id);
    }

    fn finish(self) -> Delta {
        Delta {
            added: self.added.into_iter().collect(),
            updated: self.updated.into_iter().collect(),
            removed: self.removed.into_iter().collect(),
        }
    }
}

/// Applies `ops` to `document` in order.
///
/// The revision is bumped once when at least one op took effect. An empty batch, or a batch
/// in which every op failed or was skipped, leaves the document untouched.
pub fn apply_ops(document: &mut Document, ops: &[Op]) -> ApplyResult {
    let mut delta = DeltaBuilder::default();
    let mut failures = Vec::new();
    let mut skipped = Vec::new();
    let mut fixes = Vec::new();
    let mut applied = 0usize;

    for (index, op) in ops.iter().enumerate() {
        let outcome = match op {
            Op::Add { cell_id, fragment } => {
                apply_add(document, cell_id, fragment, &mut delta, &mut fixes).map(|()| true)
            }
            Op::Update { cell_id, fragment } => {
                apply_update(document, cell_id, fragment, &mut delta, &mut fixes).map(|()| true)
            }
            Op::Delete { cell_id } => apply_delete(document, cell_id, &mut delta),
        };
        match outcome {
            Ok(true) => applied += 1,
            Ok(false) => skipped.push(op.cell_id().clone()),
            Err(error) => failures.push(OpFailure {
                index,
                op: op.kind(),
                cell_id: op.cell_id().clone(),
                error,
            }),
        }
    }

    if applied > 0 {
        document.bump_rev();
    }

    ApplyResult {
        new_rev: document.rev(),
        applied,
        failures,
        skipped,
        delta: delta.finish(),
        fixes,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyError {
    AlreadyExists { cell_id: CellId },
    NotFound { cell_id: CellId },
    IdMismatch { expected: CellId, found: CellId },
    ReservedId { cell_id: CellId },
    MissingFragment { op: OpKind },
    FragmentCellCount { found: usize },
    Fragment(ValidationError),
    DanglingReference(DanglingReference),
    ParentCycle { cell_id: CellId },
    InvalidId { value: String, reason: IdError },
}

impl ApplyError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::AlreadyExists { .. } | Self::NotFound { .. } | Self::IdMismatch { .. } => {
                FailureKind::IdConflict
            }
            Self::Fragment(error) => error.kind(),
            Self::ReservedId { .. }
            | Self::MissingFragment { .. }
            | Self::FragmentCellCount { .. }
            | Self::DanglingReference(_)
            | Self::ParentCycle { .. }
            | Self::InvalidId { .. } => FailureKind::Structural,
        }
    }
}

impl fmt::Display for ApplyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyExists { cell_id } => {
                write!(f, "a cell with id '{cell_id}' already exists; use update or pick a new id")
            }
            Self::NotFound { cell_id } => write!(f, "no cell with id '{cell_id}' exists"),
            Self::IdMismatch { expected, found } => write!(
                f,
                "new_xml carries id '{found}' but the operation targets '{expected}'; the ids must match"
            ),
            Self::ReservedId { cell_id } => {
                write!(f, "cell '{cell_id}' is a root cell and cannot be added, updated or deleted")
            }
            Self::MissingFragment { op } => write!(f, "{op} requires new_xml"),
            Self::FragmentCellCount { found } => {
                write!(f, "new_xml must contain exactly one <mxCell>, found {found}")
            }
            Self::Fragment(error) => error.fmt(f),
            Self::DanglingReference(dangling) => dangling.fmt(f),
            Self::ParentCycle { cell_id } => {
                write!(f, "the new parent of cell '{cell_id}' would make it its own ancestor")
            }
            Self::InvalidId { value, reason } => write!(f, "invalid cell_id '{value}': {reason}"),
        }
    }
}

impl std::error::Error for ApplyError {}

// Per-op mutation and cascade collection.
include!("ops_impl.rs");

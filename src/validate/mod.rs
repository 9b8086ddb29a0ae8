// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Cellweave-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Cellweave and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Schema checks and safe repairs for agent-authored cell markup.
//!
//! Checks run in a fixed order and stop at the first hard error:
//! wrappers, sibling-only structure and well-formedness (one parse pass), then reserved and
//! duplicate ids on the parsed cells. Reference resolution happens when the cells are placed
//! into a document (`build_document`, or the operation applier).
//! Repairs are applied only when the intent is unambiguous and are always reported.

use std::collections::BTreeSet;
use std::fmt;

use smallvec::SmallVec;

use crate::failure::FailureKind;
use crate::format::drawio::{
    export_cell, leading_element, parse_cell_fragment, wrap_fragment, CellForm, ParseError,
    ScanError, StructureViolation, DEFAULT_PAGE_NAME,
};
use crate::model::{Cell, CellId, DanglingReference, Document, DocumentError};

const SNIPPET_RADIUS: usize = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationMode {
    /// Bare cell list authored by the agent. Fully checked.
    Fragment,
    /// Trusted or previously approved content. Only the wrapper repair is applied.
    FullDocument,
}

/// A repair the validator applied on its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fix {
    WrappedInDocument,
    DefaultParent { cell_id: CellId },
    SelfClosed { cell_id: CellId },
}

impl fmt::Display for Fix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WrappedInDocument => {
                f.write_str("wrapped the bare fragment in the document skeleton")
            }
            Self::DefaultParent { cell_id } => {
                write!(f, "cell '{cell_id}' had no parent; assigned parent=\"1\"")
            }
            Self::SelfClosed { cell_id } => {
                write!(f, "cell '{cell_id}' had an empty body; rewrote it as self-closing")
            }
        }
    }
}

pub type Fixes = SmallVec<[Fix; 4]>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    Empty,
    Parse { error: ParseError, snippet: Option<String> },
    Structure { violation: StructureViolation, snippet: Option<String> },
    ReservedId { cell_id: CellId, snippet: Option<String> },
    DuplicateId { cell_id: CellId },
    DanglingReference(DanglingReference),
    ParentCycle { cell_id: CellId },
}

impl ValidationError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Parse { .. } => FailureKind::Parse,
            Self::DuplicateId { .. } => FailureKind::IdConflict,
            Self::Empty
            | Self::Structure { .. }
            | Self::ReservedId { .. }
            | Self::DanglingReference(_)
            | Self::ParentCycle { .. } => FailureKind::Structural,
        }
    }

    /// The offending markup excerpt, when the failure points at a location.
    pub fn snippet(&self) -> Option<&str> {
        match self {
            Self::Parse { snippet, .. }
            | Self::Structure { snippet, .. }
            | Self::ReservedId { snippet, .. } => snippet.as_deref(),
            _ => None,
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("the XML contains no <mxCell> elements"),
            Self::Parse { error, .. } => error.fmt(f),
            Self::Structure { violation, .. } => violation.fmt(f),
            Self::ReservedId { cell_id, .. } => write!(
                f,
                "cell id '{cell_id}' is reserved for the automatic root cells; start numbering at \"2\""
            ),
            Self::DuplicateId { cell_id } => write!(f, "cell id '{cell_id}' is used more than once"),
            Self::DanglingReference(dangling) => dangling.fmt(f),
            Self::ParentCycle { cell_id } => {
                write!(f, "the parent chain of cell '{cell_id}' loops back on itself")
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Outcome of [`validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validation {
    pub valid: bool,
    pub error: Option<ValidationError>,
    /// Repaired markup, present only when at least one fix was applied.
    pub fixed: Option<String>,
    pub fixes: Fixes,
}

impl Validation {
    fn rejected(error: ValidationError) -> Self {
        Self { valid: false, error: Some(error), fixed: None, fixes: Fixes::new() }
    }
}

/// Cells of a fragment that passed the structural checks, with repairs applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckedFragment {
    pub cells: Vec<Cell>,
    pub fixes: Fixes,
}

impl CheckedFragment {
    /// The repaired fragment serialized back to markup.
    pub fn to_markup(&self) -> String {
        let mut out = String::new();
        for cell in &self.cells {
            export_cell(cell, &mut out);
            out.push('\n');
        }
        out
    }
}

pub fn validate(markup: &str, mode: ValidationMode) -> Validation {
    match mode {
        ValidationMode::FullDocument => {
            if has_wrapper(markup) {
                return Validation { valid: true, error: None, fixed: None, fixes: Fixes::new() };
            }
            let mut fixes = Fixes::new();
            fixes.push(Fix::WrappedInDocument);
            Validation {
                valid: true,
                error: None,
                fixed: Some(wrap_fragment(markup, DEFAULT_PAGE_NAME)),
                fixes,
            }
        }
        ValidationMode::Fragment => match check_fragment(markup) {
            Ok(checked) => {
                let fixed = (!checked.fixes.is_empty()).then(|| checked.to_markup());
                Validation { valid: true, error: None, fixed, fixes: checked.fixes }
            }
            Err(error) => Validation::rejected(error),
        },
    }
}

/// Builds a document from checked cells and resolves every reference against it: each
/// `parent`/`source`/`target` must name a cell of the fragment or a sentinel, and every
/// parent chain must reach the root.
pub fn build_document(checked: &CheckedFragment) -> Result<Document, ValidationError> {
    let document = Document::from_cells(checked.cells.iter().cloned()).map_err(|err| match err {
        DocumentError::DuplicateCellId { cell_id } => ValidationError::DuplicateId { cell_id },
        DocumentError::ReservedCellId { cell_id } => {
            ValidationError::ReservedId { cell_id, snippet: None }
        }
    })?;
    check_references(&document)?;
    Ok(document)
}

pub fn check_references(document: &Document) -> Result<(), ValidationError> {
    if let Some(dangling) = document.dangling_references().into_iter().next() {
        return Err(ValidationError::DanglingReference(dangling));
    }
    if let Some(cell) = document.cells().find(|cell| !document.resolves_to_root(cell.id().as_str())) {
        return Err(ValidationError::ParentCycle { cell_id: cell.id().clone() });
    }
    Ok(())
}

/// The fragment checks of [`validate`]. References are left to the caller, which resolves
/// them against the document the cells end up in.
pub fn check_fragment(markup: &str) -> Result<CheckedFragment, ValidationError> {
    if markup.trim().is_empty() {
        return Err(ValidationError::Empty);
    }

    let parsed = parse_cell_fragment(markup).map_err(|err| {
        let snippet = err.offset().map(|offset| snippet_at(markup, offset));
        match err {
            ScanError::Parse(error) => ValidationError::Parse { error, snippet },
            ScanError::Structure(violation) => ValidationError::Structure { violation, snippet },
        }
    })?;
    if parsed.is_empty() {
        return Err(ValidationError::Empty);
    }

    let mut seen = BTreeSet::new();
    let mut fixes = Fixes::new();
    let mut cells = Vec::with_capacity(parsed.len());
    for entry in parsed {
        let mut cell = entry.cell;
        if cell.id().is_sentinel() {
            return Err(ValidationError::ReservedId {
                cell_id: cell.id().clone(),
                snippet: Some(snippet_at(markup, entry.span.start)),
            });
        }
        if !seen.insert(cell.id().clone()) {
            return Err(ValidationError::DuplicateId { cell_id: cell.id().clone() });
        }
        if cell.parent().is_none() {
            cell.set_parent(Some(CellId::layer()));
            fixes.push(Fix::DefaultParent { cell_id: cell.id().clone() });
        }
        if entry.form == CellForm::Paired && cell.body().is_none() {
            fixes.push(Fix::SelfClosed { cell_id: cell.id().clone() });
        }
        cells.push(cell);
    }

    Ok(CheckedFragment { cells, fixes })
}

/// True when the markup opens with an XML declaration or an element of the document skeleton.
pub fn has_wrapper(markup: &str) -> bool {
    leading_element(markup).is_some_and(|element| element.is_wrapper())
}

/// An excerpt of at most `2 * SNIPPET_RADIUS` bytes around `offset`, cut on char boundaries.
pub fn snippet_at(markup: &str, offset: usize) -> String {
    let offset = offset.min(markup.len());
    let mut start = offset.saturating_sub(SNIPPET_RADIUS);
    while !markup.is_char_boundary(start) {
        start -= 1;
    }
    let mut end = offset.saturating_add(SNIPPET_RADIUS).min(markup.len());
    while !markup.is_char_boundary(end) {
        end += 1;
    }
    markup[start..end].to_owned()
}

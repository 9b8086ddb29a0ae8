// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Cellweave-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Cellweave and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! The draw.io cell dialect: `<mxfile>` → `<diagram>` → `<mxGraphModel>` → `<root>` → `<mxCell>`.

pub mod compressed;
pub mod export;
pub mod parse;

pub use compressed::{decode_diagram_payload, PayloadDecodeError};
pub use export::{export_cell, export_document, export_fragment, wrap_fragment};
pub use parse::{
    leading_element, parse_cell_fragment, parse_document, CellForm, LeadingElement, ParseError,
    ParsedCell, ScanError, StructureViolation,
};

pub const CELL_ELEMENT: &str = "mxCell";

/// Page name used when a document skeleton is injected.
pub const DEFAULT_PAGE_NAME: &str = "Page-1";

/// Name reported for an `<?xml ...?>` declaration, which never belongs in a fragment.
pub const XML_DECLARATION: &str = "?xml";

/// Elements that belong to the injected document skeleton, never to a fragment.
pub const WRAPPER_ELEMENTS: [&str; 4] = ["mxfile", "diagram", "mxGraphModel", "root"];

pub fn is_wrapper_element(name: &str) -> bool {
    WRAPPER_ELEMENTS.contains(&name)
}

#[cfg(test)]
mod tests;

// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Cellweave-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Cellweave and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use quick_xml::escape::escape;

use super::CELL_ELEMENT;
use crate::model::{Cell, CellRole, Document, LAYER_CELL_ID, ROOT_CELL_ID};

/// Serializes one cell element. Attribute order follows draw.io's own output.
pub fn export_cell(cell: &Cell, out: &mut String) {
    out.push('<');
    out.push_str(CELL_ELEMENT);
    push_attr(out, "id", cell.id().as_str());
    if let Some(value) = cell.value() {
        push_attr(out, "value", value);
    }
    if let Some(style) = cell.style() {
        push_attr(out, "style", style);
    }
    match cell.role() {
        CellRole::Vertex => push_attr(out, "vertex", "1"),
        CellRole::Edge => push_attr(out, "edge", "1"),
        CellRole::Plain => {}
    }
    if let Some(parent) = cell.parent() {
        push_attr(out, "parent", parent.as_str());
    }
    if let Some(source) = cell.source() {
        push_attr(out, "source", source.as_str());
    }
    if let Some(target) = cell.target() {
        push_attr(out, "target", target.as_str());
    }
    for (key, value) in cell.extra() {
        push_attr(out, key, value);
    }

    match cell.body() {
        Some(body) => {
            out.push('>');
            out.push_str(body);
            out.push_str("</");
            out.push_str(CELL_ELEMENT);
            out.push('>');
        }
        None => out.push_str(" />"),
    }
}

/// Caller cells only, one element per line.
pub fn export_fragment(document: &Document) -> String {
    let mut out = String::new();
    for cell in document.cells() {
        export_cell(cell, &mut out);
        out.push('\n');
    }
    out
}

/// The full wrapped document: container, page, graph model, root, sentinels, then cells.
pub fn export_document(document: &Document, page_name: &str) -> String {
    let mut out = String::new();
    open_skeleton(&mut out, page_name);
    for cell in document.cells() {
        out.push_str("        ");
        export_cell(cell, &mut out);
        out.push('\n');
    }
    close_skeleton(&mut out);
    out
}

/// Wraps raw fragment text in the minimal document skeleton without reparsing it.
pub fn wrap_fragment(fragment: &str, page_name: &str) -> String {
    let mut out = String::with_capacity(fragment.len() + 256);
    open_skeleton(&mut out, page_name);
    let trimmed = fragment.trim();
    if !trimmed.is_empty() {
        out.push_str("        ");
        out.push_str(trimmed);
        out.push('\n');
    }
    close_skeleton(&mut out);
    out
}

fn open_skeleton(out: &mut String, page_name: &str) {
    out.push_str("<mxfile>\n  <diagram");
    push_attr(out, "name", page_name);
    push_attr(out, "id", "page-1");
    out.push_str(">\n    <mxGraphModel>\n      <root>\n");
    out.push_str("        <mxCell id=\"");
    out.push_str(ROOT_CELL_ID);
    out.push_str("\" />\n        <mxCell id=\"");
    out.push_str(LAYER_CELL_ID);
    out.push_str("\" parent=\"");
    out.push_str(ROOT_CELL_ID);
    out.push_str("\" />\n");
}

fn close_skeleton(out: &mut String) {
    out.push_str("      </root>\n    </mxGraphModel>\n  </diagram>\n</mxfile>\n");
}

fn push_attr(out: &mut String, key: &str, value: &str) {
    out.push(' ');
    out.push_str(key);
    out.push_str("=\"");
    // Raw line breaks and tabs would be normalized to spaces by any XML reader.
    for ch in escape(value).chars() {
        match ch {
            '\n' => out.push_str("&#xa;"),
            '\r' => out.push_str("&#xd;"),
            '\t' => out.push_str("&#x9;"),
            _ => out.push(ch),
        }
    }
    out.push('"');
}

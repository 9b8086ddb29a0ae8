// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Cellweave-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Cellweave and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use super::*;
use crate::model::{CellRole, Document};

const SHAPES: &str = r#"<mxCell id="2" value="Start" style="rounded=1;" vertex="1" parent="1">
  <mxGeometry x="40" y="40" width="120" height="60" as="geometry" />
</mxCell>
<mxCell id="3" value="End" vertex="1" parent="1"><mxGeometry x="40" y="200" width="120" height="60" as="geometry"/></mxCell>
<mxCell id="4" edge="1" parent="1" source="2" target="3" data-note="x"><mxGeometry relative="1" as="geometry"/></mxCell>"#;

#[test]
fn parses_sibling_cells_with_opaque_geometry() {
    let parsed = parse_cell_fragment(SHAPES).expect("parse");
    assert_eq!(parsed.len(), 3);

    let start = &parsed[0].cell;
    assert_eq!(start.id().as_str(), "2");
    assert_eq!(start.value(), Some("Start"));
    assert_eq!(start.style(), Some("rounded=1;"));
    assert_eq!(start.role(), CellRole::Vertex);
    assert!(start.body().expect("geometry").contains("width=\"120\""));
    assert_eq!(parsed[0].form, CellForm::Paired);

    let edge = &parsed[2].cell;
    assert!(edge.is_edge());
    assert_eq!(edge.source().map(|id| id.as_str()), Some("2"));
    assert_eq!(edge.target().map(|id| id.as_str()), Some("3"));
    assert_eq!(edge.extra(), &[("data-note".to_owned(), "x".to_owned())]);
    assert_eq!(&SHAPES[parsed[2].span.clone()][..12], "<mxCell id=\"");
}

#[test]
fn self_closing_cells_have_no_body_and_keep_missing_parent() {
    let parsed = parse_cell_fragment(r#"<mxCell id="new1" value="A &amp; B" vertex="1"/>"#)
        .expect("parse");
    assert_eq!(parsed[0].form, CellForm::SelfClosing);
    assert_eq!(parsed[0].cell.parent(), None);
    assert_eq!(parsed[0].cell.body(), None);
    assert_eq!(parsed[0].cell.value(), Some("A & B"));
}

#[test]
fn nested_cells_are_a_structure_violation() {
    let err = parse_cell_fragment(
        r#"<mxCell id="2" vertex="1" parent="1"><mxCell id="3" vertex="1" parent="2"/></mxCell>"#,
    )
    .unwrap_err();
    assert!(matches!(err, ScanError::Structure(StructureViolation::NestedCell { offset: 37 })));
}

#[test]
fn wrapper_elements_are_a_structure_violation() {
    let err = parse_cell_fragment("<root><mxCell id=\"2\"/></root>").unwrap_err();
    assert!(matches!(
        err,
        ScanError::Structure(StructureViolation::WrapperElement { ref name, offset: 0 }) if name == "root"
    ));
}

#[test]
fn raw_less_than_in_attribute_is_a_parse_error() {
    let err = parse_cell_fragment(r#"<mxCell id="2" value="a<b" vertex="1"/>"#).unwrap_err();
    assert!(matches!(
        err,
        ScanError::Parse(ParseError::UnescapedLessThan { ref attribute, .. }) if attribute == "value"
    ));
}

#[test]
fn bare_ampersand_is_a_parse_error() {
    let err = parse_cell_fragment(r#"<mxCell id="2" value="R&D" vertex="1"/>"#).unwrap_err();
    assert!(matches!(err, ScanError::Parse(ParseError::Entity { .. })));
}

#[test]
fn unclosed_cell_is_a_parse_error() {
    let err = parse_cell_fragment(r#"<mxCell id="2" vertex="1"><mxGeometry as="geometry"/>"#)
        .unwrap_err();
    assert!(matches!(
        err,
        ScanError::Parse(ParseError::UnclosedElement { ref name, offset: 0 }) if name == "mxCell"
    ));
}

#[test]
fn conflicting_roles_are_rejected() {
    let err = parse_cell_fragment(r#"<mxCell id="2" vertex="1" edge="1"/>"#).unwrap_err();
    assert!(matches!(err, ScanError::Structure(StructureViolation::ConflictingRoles { .. })));
}

#[test]
fn export_then_parse_document_preserves_cells() {
    let cells = parse_cell_fragment(SHAPES)
        .expect("parse")
        .into_iter()
        .map(|parsed| parsed.cell)
        .collect::<Vec<_>>();
    let document = Document::from_cells(cells.clone()).expect("document");

    let xml = export_document(&document, "Page-1");
    assert!(xml.starts_with("<mxfile>"));
    assert!(xml.contains("<mxCell id=\"0\" />"));
    assert!(xml.contains("<mxCell id=\"1\" parent=\"0\" />"));

    assert_eq!(parse_document(&xml).expect("parse document"), cells);
}

#[test]
fn export_escapes_attribute_values() {
    let parsed = parse_cell_fragment(r#"<mxCell id="2" value="&lt;b&gt;&quot;x&quot;" vertex="1" parent="1"/>"#)
        .expect("parse");
    let mut out = String::new();
    export_cell(&parsed[0].cell, &mut out);
    assert_eq!(out, r#"<mxCell id="2" value="&lt;b&gt;&quot;x&quot;" vertex="1" parent="1" />"#);
}

#[test]
fn wrapped_fragment_parses_as_document() {
    let wrapped = wrap_fragment("<mxCell id=\"2\" vertex=\"1\" parent=\"1\"/>", "Page-1");
    let cells = parse_document(&wrapped).expect("parse document");
    assert_eq!(cells.len(), 1);
    assert_eq!(cells[0].id().as_str(), "2");
}

#[test]
fn document_without_root_is_rejected() {
    assert_eq!(parse_document("<mxfile><diagram/></mxfile>"), Err(ParseError::MissingRoot));
}

#[test]
fn compressed_page_is_decoded() {
    use std::io::Write;

    use base64::Engine as _;
    use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};

    let model = r#"<mxGraphModel><root><mxCell id="0"/><mxCell id="1" parent="0"/><mxCell id="2" value="Zipped" vertex="1" parent="1"/></root></mxGraphModel>"#;
    let escaped = utf8_percent_encode(model, NON_ALPHANUMERIC).to_string();
    let mut encoder = flate2::write::DeflateEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(escaped.as_bytes()).expect("deflate");
    let payload = base64::engine::general_purpose::STANDARD.encode(encoder.finish().expect("finish"));

    let xml = format!(r#"<mxfile><diagram name="Page-1" id="p1">{payload}</diagram></mxfile>"#);
    let cells = parse_document(&xml).expect("parse compressed document");
    assert_eq!(cells.len(), 1);
    assert_eq!(cells[0].value(), Some("Zipped"));
}

#[test]
fn line_breaks_in_values_survive_export() {
    let markup = r#"<mxCell id="2" value="line1&#xa;line2&#x9;tab&#xd;" vertex="1" parent="1"/>"#;
    let parsed = parse_cell_fragment(markup).expect("parse");
    assert_eq!(parsed[0].cell.value(), Some("line1\nline2\ttab\r"));

    let mut out = String::new();
    export_cell(&parsed[0].cell, &mut out);
    assert_eq!(
        out,
        r#"<mxCell id="2" value="line1&#xa;line2&#x9;tab&#xd;" vertex="1" parent="1" />"#
    );

    let reparsed = parse_cell_fragment(&out).expect("reparse");
    assert_eq!(reparsed[0].cell, parsed[0].cell);
}

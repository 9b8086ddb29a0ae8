// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Cellweave-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Cellweave and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::fmt;
use std::ops::Range;
use std::str;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::compressed::{decode_diagram_payload, PayloadDecodeError};
use super::{is_wrapper_element, CELL_ELEMENT, XML_DECLARATION};
use crate::model::{Cell, CellId, CellRole, IdError};

/// Well-formedness failures. Offsets are byte offsets into the parsed input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    Xml { offset: usize, message: String },
    Attribute { offset: usize, message: String },
    UnescapedLessThan { offset: usize, attribute: String },
    Entity { offset: usize, message: String },
    NonUtf8Name { offset: usize },
    UnclosedElement { name: String, offset: usize },
    UnexpectedClosingTag { name: String, offset: usize },
    MissingCellId { offset: usize },
    InvalidCellId { offset: usize, attribute: &'static str, value: String, reason: IdError },
    MissingRoot,
    Payload(PayloadDecodeError),
}

impl ParseError {
    pub fn offset(&self) -> Option<usize> {
        match self {
            Self::Xml { offset, .. }
            | Self::Attribute { offset, .. }
            | Self::UnescapedLessThan { offset, .. }
            | Self::Entity { offset, .. }
            | Self::NonUtf8Name { offset }
            | Self::UnclosedElement { offset, .. }
            | Self::UnexpectedClosingTag { offset, .. }
            | Self::MissingCellId { offset }
            | Self::InvalidCellId { offset, .. } => Some(*offset),
            Self::MissingRoot | Self::Payload(_) => None,
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Xml { offset, message } => write!(f, "malformed XML at byte {offset}: {message}"),
            Self::Attribute { offset, message } => {
                write!(f, "malformed attribute at byte {offset}: {message}")
            }
            Self::UnescapedLessThan { offset, attribute } => write!(
                f,
                "attribute '{attribute}' at byte {offset} contains a raw '<'; escape it as &lt;"
            ),
            Self::Entity { offset, message } => write!(
                f,
                "invalid character reference at byte {offset} ({message}); escape '&' as &amp;"
            ),
            Self::NonUtf8Name { offset } => write!(f, "element name at byte {offset} is not UTF-8"),
            Self::UnclosedElement { name, offset } => {
                write!(f, "element <{name}> opened at byte {offset} is never closed")
            }
            Self::UnexpectedClosingTag { name, offset } => {
                write!(f, "closing tag </{name}> at byte {offset} has no matching opening tag")
            }
            Self::MissingCellId { offset } => {
                write!(f, "<{CELL_ELEMENT}> at byte {offset} has no id attribute")
            }
            Self::InvalidCellId { offset, attribute, value, reason } => {
                write!(f, "invalid {attribute}=\"{value}\" at byte {offset}: {reason}")
            }
            Self::MissingRoot => f.write_str("document has no <root> element"),
            Self::Payload(err) => write!(f, "cannot decode compressed diagram: {err}"),
        }
    }
}

impl std::error::Error for ParseError {}

/// Shape violations of a bare cell list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StructureViolation {
    WrapperElement { name: String, offset: usize },
    NestedCell { offset: usize },
    UnexpectedElement { name: String, offset: usize },
    StrayText { offset: usize },
    ConflictingRoles { cell_id: CellId, offset: usize },
}

impl StructureViolation {
    pub fn offset(&self) -> usize {
        match self {
            Self::WrapperElement { offset, .. }
            | Self::NestedCell { offset }
            | Self::UnexpectedElement { offset, .. }
            | Self::StrayText { offset }
            | Self::ConflictingRoles { offset, .. } => *offset,
        }
    }
}

impl fmt::Display for StructureViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WrapperElement { name, offset } => write!(
                f,
                "wrapper element <{name}> at byte {offset}; send bare <{CELL_ELEMENT}> elements only, the document wrapper and root cells are added automatically"
            ),
            Self::NestedCell { offset } => write!(
                f,
                "<{CELL_ELEMENT}> at byte {offset} is nested inside another <{CELL_ELEMENT}>; cells must be siblings, use the parent attribute for containment"
            ),
            Self::UnexpectedElement { name, offset } => write!(
                f,
                "unexpected top-level element <{name}> at byte {offset}; only <{CELL_ELEMENT}> elements are allowed"
            ),
            Self::StrayText { offset } => {
                write!(f, "text outside of any <{CELL_ELEMENT}> at byte {offset}")
            }
            Self::ConflictingRoles { cell_id, offset } => write!(
                f,
                "cell '{cell_id}' at byte {offset} sets both vertex=\"1\" and edge=\"1\""
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanError {
    Parse(ParseError),
    Structure(StructureViolation),
}

impl ScanError {
    pub fn offset(&self) -> Option<usize> {
        match self {
            Self::Parse(err) => err.offset(),
            Self::Structure(violation) => Some(violation.offset()),
        }
    }
}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(err) => err.fmt(f),
            Self::Structure(violation) => violation.fmt(f),
        }
    }
}

impl std::error::Error for ScanError {}

impl From<ParseError> for ScanError {
    fn from(err: ParseError) -> Self {
        Self::Parse(err)
    }
}

impl From<StructureViolation> for ScanError {
    fn from(violation: StructureViolation) -> Self {
        Self::Structure(violation)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellForm {
    SelfClosing,
    Paired,
}

/// One top-level cell element with its source span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCell {
    pub cell: Cell,
    pub span: Range<usize>,
    pub form: CellForm,
}

struct OpenCell {
    cell: Cell,
    start: usize,
    body_start: usize,
}

/// Parses a bare list of sibling `<mxCell>` elements.
///
/// Stops at the first well-formedness error or structure violation. Missing `parent`
/// attributes are left as `None`; defaulting is the validator's call.
pub fn parse_cell_fragment(xml: &str) -> Result<Vec<ParsedCell>, ScanError> {
    let mut reader = Reader::from_str(xml);
    let mut cells = Vec::new();
    let mut open: Option<OpenCell> = None;
    let mut stack: Vec<(String, usize)> = Vec::new();

    loop {
        let before = reader.buffer_position() as usize;
        let event = reader.read_event().map_err(|err| ParseError::Xml {
            offset: reader.error_position() as usize,
            message: err.to_string(),
        })?;

        match event {
            Event::Start(e) => {
                let name = element_name(&e, before)?;
                if is_wrapper_element(&name) {
                    return Err(StructureViolation::WrapperElement { name, offset: before }.into());
                }
                if name == CELL_ELEMENT {
                    if open.is_some() {
                        return Err(StructureViolation::NestedCell { offset: before }.into());
                    }
                    let cell = cell_from_start(&e, before)?;
                    open = Some(OpenCell {
                        cell,
                        start: before,
                        body_start: reader.buffer_position() as usize,
                    });
                } else if open.is_none() {
                    return Err(StructureViolation::UnexpectedElement { name, offset: before }.into());
                } else {
                    check_attributes(&e, before)?;
                }
                stack.push((name, before));
            }
            Event::Empty(e) => {
                let name = element_name(&e, before)?;
                if is_wrapper_element(&name) {
                    return Err(StructureViolation::WrapperElement { name, offset: before }.into());
                }
                if name == CELL_ELEMENT {
                    if open.is_some() {
                        return Err(StructureViolation::NestedCell { offset: before }.into());
                    }
                    let cell = cell_from_start(&e, before)?;
                    cells.push(ParsedCell {
                        cell,
                        span: before..reader.buffer_position() as usize,
                        form: CellForm::SelfClosing,
                    });
                } else if open.is_none() {
                    return Err(StructureViolation::UnexpectedElement { name, offset: before }.into());
                } else {
                    check_attributes(&e, before)?;
                }
            }
            Event::End(e) => {
                let name = str::from_utf8(e.name().as_ref())
                    .map_err(|_| ParseError::NonUtf8Name { offset: before })?
                    .to_owned();
                if stack.pop().is_none() {
                    return Err(ParseError::UnexpectedClosingTag { name, offset: before }.into());
                }
                if name == CELL_ELEMENT && stack.is_empty() {
                    if let Some(OpenCell { mut cell, start, body_start }) = open.take() {
                        cell.set_body(Some(&xml[body_start..before]));
                        cells.push(ParsedCell {
                            cell,
                            span: start..reader.buffer_position() as usize,
                            form: CellForm::Paired,
                        });
                    }
                }
            }
            Event::Text(t) => {
                t.unescape()
                    .map_err(|err| ParseError::Entity { offset: before, message: err.to_string() })?;
                if open.is_none() && !t.iter().all(u8::is_ascii_whitespace) {
                    return Err(StructureViolation::StrayText { offset: before }.into());
                }
            }
            Event::CData(_) => {
                if open.is_none() {
                    return Err(StructureViolation::StrayText { offset: before }.into());
                }
            }
            Event::Decl(_) => {
                return Err(StructureViolation::WrapperElement {
                    name: XML_DECLARATION.to_owned(),
                    offset: before,
                }
                .into());
            }
            Event::DocType(_) => {
                return Err(StructureViolation::UnexpectedElement {
                    name: "!DOCTYPE".to_owned(),
                    offset: before,
                }
                .into());
            }
            Event::Comment(_) | Event::PI(_) => {}
            Event::Eof => break,
        }
    }

    if let Some((name, offset)) = stack.pop() {
        return Err(ParseError::UnclosedElement { name, offset }.into());
    }

    Ok(cells)
}

/// The first element of some markup, with its `id` attribute if it has one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeadingElement {
    pub name: String,
    pub id: Option<String>,
}

impl LeadingElement {
    /// An XML declaration or a skeleton element.
    pub fn is_wrapper(&self) -> bool {
        self.name == XML_DECLARATION || is_wrapper_element(&self.name)
    }
}

/// Reads the first element past a BOM, whitespace, comments, processing instructions and a
/// doctype. `None` when text, a closing tag or broken markup comes first.
pub fn leading_element(xml: &str) -> Option<LeadingElement> {
    let xml = xml.strip_prefix('\u{feff}').unwrap_or(xml);
    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event().ok()? {
            Event::Start(e) | Event::Empty(e) => {
                let name = str::from_utf8(e.name().as_ref()).ok()?.to_owned();
                let id = e
                    .attributes()
                    .flatten()
                    .find(|attr| attr.key.as_ref() == b"id")
                    .and_then(|attr| attr.unescape_value().ok().map(|value| value.into_owned()));
                return Some(LeadingElement { name, id });
            }
            Event::Decl(_) => {
                return Some(LeadingElement { name: XML_DECLARATION.to_owned(), id: None })
            }
            Event::Text(t) if t.iter().all(u8::is_ascii_whitespace) => {}
            Event::Comment(_) | Event::PI(_) | Event::DocType(_) => {}
            _ => return None,
        }
    }
}

/// Parses a trusted full document and returns its caller cells (sentinels dropped).
///
/// Accepts `<mxfile>`, `<diagram>`, `<mxGraphModel>` or `<root>` at the top, and decodes a
/// compressed `<diagram>` payload when the page carries one instead of a graph model. Only
/// the first page is read.
pub fn parse_document(xml: &str) -> Result<Vec<Cell>, ParseError> {
    let root_inner = match locate_root(xml)? {
        RootLocation::Inline(range) => xml[range].to_owned(),
        RootLocation::Compressed(payload) => {
            let decoded = decode_diagram_payload(&payload).map_err(ParseError::Payload)?;
            match locate_root(&decoded)? {
                RootLocation::Inline(range) => decoded[range].to_owned(),
                RootLocation::Compressed(_) | RootLocation::Missing => {
                    return Err(ParseError::MissingRoot)
                }
            }
        }
        RootLocation::Missing => return Err(ParseError::MissingRoot),
    };

    let parsed = parse_trusted_cells(&root_inner)?;
    Ok(parsed.into_iter().filter(|cell| !cell.id().is_sentinel()).collect())
}

enum RootLocation {
    Inline(Range<usize>),
    Compressed(String),
    Missing,
}

fn locate_root(xml: &str) -> Result<RootLocation, ParseError> {
    let mut reader = Reader::from_str(xml);
    let mut depth = 0usize;
    let mut root_start: Option<(usize, usize)> = None;
    let mut diagram_depth: Option<usize> = None;
    let mut payload = String::new();

    loop {
        let before = reader.buffer_position() as usize;
        let event = reader.read_event().map_err(|err| ParseError::Xml {
            offset: reader.error_position() as usize,
            message: err.to_string(),
        })?;
        match event {
            Event::Start(e) => {
                let name = element_name(&e, before)?;
                depth += 1;
                if name == "root" && root_start.is_none() {
                    root_start = Some((reader.buffer_position() as usize, depth));
                } else if name == "diagram" && diagram_depth.is_none() {
                    diagram_depth = Some(depth);
                }
            }
            Event::End(_) => {
                if let Some((inner_start, root_depth)) = root_start {
                    if root_depth == depth {
                        return Ok(RootLocation::Inline(inner_start..before));
                    }
                }
                if diagram_depth == Some(depth) && !payload.trim().is_empty() {
                    return Ok(RootLocation::Compressed(payload));
                }
                depth = depth.saturating_sub(1);
            }
            Event::Empty(e) => {
                if element_name(&e, before)? == "root" && root_start.is_none() {
                    return Ok(RootLocation::Inline(before..before));
                }
            }
            Event::Text(t) => {
                if diagram_depth == Some(depth) && root_start.is_none() {
                    let text = t.unescape().map_err(|err| ParseError::Entity {
                        offset: before,
                        message: err.to_string(),
                    })?;
                    payload.push_str(&text);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    match root_start {
        Some((_, _)) => Err(ParseError::UnclosedElement { name: "root".to_owned(), offset: 0 }),
        None => Ok(RootLocation::Missing),
    }
}

/// Cells of trusted content: nesting is tolerated by flattening, wrapper checks are skipped.
fn parse_trusted_cells(xml: &str) -> Result<Vec<Cell>, ParseError> {
    let mut reader = Reader::from_str(xml);
    let mut cells = Vec::new();
    let mut open: Vec<OpenCell> = Vec::new();

    loop {
        let before = reader.buffer_position() as usize;
        let event = reader.read_event().map_err(|err| ParseError::Xml {
            offset: reader.error_position() as usize,
            message: err.to_string(),
        })?;
        match event {
            Event::Start(e) => {
                if element_name(&e, before)? == CELL_ELEMENT {
                    let cell = cell_from_start(&e, before).map_err(trusted_error)?;
                    open.push(OpenCell {
                        cell,
                        start: before,
                        body_start: reader.buffer_position() as usize,
                    });
                }
            }
            Event::Empty(e) => {
                if element_name(&e, before)? == CELL_ELEMENT {
                    cells.push(cell_from_start(&e, before).map_err(trusted_error)?);
                }
            }
            Event::End(e) => {
                if e.name().as_ref() == CELL_ELEMENT.as_bytes() {
                    if let Some(OpenCell { mut cell, body_start, .. }) = open.pop() {
                        cell.set_body(Some(&xml[body_start..before]));
                        cells.push(cell);
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(unclosed) = open.pop() {
        return Err(ParseError::UnclosedElement {
            name: CELL_ELEMENT.to_owned(),
            offset: unclosed.start,
        });
    }

    Ok(cells)
}

fn trusted_error(err: ScanError) -> ParseError {
    match err {
        ScanError::Parse(err) => err,
        ScanError::Structure(violation) => {
            ParseError::Xml { offset: violation.offset(), message: violation.to_string() }
        }
    }
}

fn element_name(e: &BytesStart<'_>, offset: usize) -> Result<String, ParseError> {
    str::from_utf8(e.name().as_ref())
        .map(ToOwned::to_owned)
        .map_err(|_| ParseError::NonUtf8Name { offset })
}

fn check_attributes(e: &BytesStart<'_>, offset: usize) -> Result<(), ParseError> {
    for attr in e.attributes() {
        let attr =
            attr.map_err(|err| ParseError::Attribute { offset, message: err.to_string() })?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        if memchr::memchr(b'<', &attr.value).is_some() {
            return Err(ParseError::UnescapedLessThan { offset, attribute: key });
        }
        attr.unescape_value()
            .map_err(|err| ParseError::Entity { offset, message: err.to_string() })?;
    }
    Ok(())
}

fn cell_from_start(e: &BytesStart<'_>, offset: usize) -> Result<Cell, ScanError> {
    let mut id: Option<CellId> = None;
    let mut parent = None;
    let mut source = None;
    let mut target = None;
    let mut value = None;
    let mut style = None;
    let mut vertex = false;
    let mut edge = false;
    let mut extra = Vec::new();

    for attr in e.attributes() {
        let attr =
            attr.map_err(|err| ParseError::Attribute { offset, message: err.to_string() })?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        if memchr::memchr(b'<', &attr.value).is_some() {
            return Err(ParseError::UnescapedLessThan { offset, attribute: key }.into());
        }
        let raw = attr
            .unescape_value()
            .map_err(|err| ParseError::Entity { offset, message: err.to_string() })?
            .into_owned();

        match key.as_str() {
            "id" => id = Some(reference_id(raw, "id", offset)?),
            "parent" => parent = optional_reference(raw, "parent", offset)?,
            "source" => source = optional_reference(raw, "source", offset)?,
            "target" => target = optional_reference(raw, "target", offset)?,
            "value" => value = Some(raw),
            "style" => style = Some(raw),
            "vertex" => vertex = is_flag_set(&raw),
            "edge" => edge = is_flag_set(&raw),
            _ => extra.push((key, raw)),
        }
    }

    let id = id.ok_or(ParseError::MissingCellId { offset })?;
    let role = match (vertex, edge) {
        (true, true) => {
            return Err(StructureViolation::ConflictingRoles { cell_id: id, offset }.into())
        }
        (true, false) => CellRole::Vertex,
        (false, true) => CellRole::Edge,
        (false, false) => CellRole::Plain,
    };

    let mut cell = Cell::new(id);
    cell.set_parent(parent);
    cell.set_role(role);
    cell.set_source(source);
    cell.set_target(target);
    cell.set_value(value);
    cell.set_style(style);
    for (key, raw) in extra {
        cell.push_extra(key, raw);
    }
    Ok(cell)
}

fn reference_id(raw: String, attribute: &'static str, offset: usize) -> Result<CellId, ParseError> {
    CellId::new(&raw).map_err(|reason| ParseError::InvalidCellId {
        offset,
        attribute,
        value: raw,
        reason,
    })
}

fn optional_reference(
    raw: String,
    attribute: &'static str,
    offset: usize,
) -> Result<Option<CellId>, ParseError> {
    if raw.is_empty() {
        return Ok(None);
    }
    reference_id(raw, attribute, offset).map(Some)
}

fn is_flag_set(raw: &str) -> bool {
    matches!(raw.trim(), "1" | "true" | "TRUE" | "True")
}

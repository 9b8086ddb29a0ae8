// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Cellweave-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Cellweave and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use super::ids::CellId;

/// Role flag of a cell. `vertex` and `edge` are mutually exclusive by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CellRole {
    Vertex,
    Edge,
    /// Neither flag set, e.g. a pure label container or a layer.
    #[default]
    Plain,
}

/// A node of the diagram graph.
///
/// `parent`, `source` and `target` are id strings resolved through the owning
/// [`super::Document`], never references. Geometry and any other child markup is kept as an
/// opaque, already well-formed `body` string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    id: CellId,
    parent: Option<CellId>,
    role: CellRole,
    source: Option<CellId>,
    target: Option<CellId>,
    value: Option<String>,
    style: Option<String>,
    extra: Vec<(String, String)>,
    body: Option<String>,
}

impl Cell {
    pub fn new(id: CellId) -> Self {
        Self {
            id,
            parent: None,
            role: CellRole::Plain,
            source: None,
            target: None,
            value: None,
            style: None,
            extra: Vec::new(),
            body: None,
        }
    }

    pub fn vertex(id: CellId, parent: CellId) -> Self {
        let mut cell = Self::new(id);
        cell.parent = Some(parent);
        cell.role = CellRole::Vertex;
        cell
    }

    pub fn edge(id: CellId, parent: CellId, source: Option<CellId>, target: Option<CellId>) -> Self {
        let mut cell = Self::new(id);
        cell.parent = Some(parent);
        cell.role = CellRole::Edge;
        cell.source = source;
        cell.target = target;
        cell
    }

    pub fn id(&self) -> &CellId {
        &self.id
    }

    pub fn parent(&self) -> Option<&CellId> {
        self.parent.as_ref()
    }

    pub fn set_parent(&mut self, parent: Option<CellId>) {
        self.parent = parent;
    }

    pub fn role(&self) -> CellRole {
        self.role
    }

    pub fn set_role(&mut self, role: CellRole) {
        self.role = role;
    }

    pub fn is_vertex(&self) -> bool {
        self.role == CellRole::Vertex
    }

    pub fn is_edge(&self) -> bool {
        self.role == CellRole::Edge
    }

    pub fn source(&self) -> Option<&CellId> {
        self.source.as_ref()
    }

    pub fn set_source(&mut self, source: Option<CellId>) {
        self.source = source;
    }

    pub fn target(&self) -> Option<&CellId> {
        self.target.as_ref()
    }

    pub fn set_target(&mut self, target: Option<CellId>) {
        self.target = target;
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    pub fn set_value<T: Into<String>>(&mut self, value: Option<T>) {
        self.value = value.map(Into::into);
    }

    pub fn style(&self) -> Option<&str> {
        self.style.as_deref()
    }

    pub fn set_style<T: Into<String>>(&mut self, style: Option<T>) {
        self.style = style.map(Into::into);
    }

    /// Attributes the engine does not interpret, in source order.
    pub fn extra(&self) -> &[(String, String)] {
        &self.extra
    }

    pub fn push_extra(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.extra.push((key.into(), value.into()));
    }

    /// Raw child markup (normally a single `mxGeometry`), `None` for self-closing cells.
    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    pub fn set_body<T: Into<String>>(&mut self, body: Option<T>) {
        self.body = body.map(Into::into).filter(|body: &String| !body.trim().is_empty());
    }

    /// Ids this cell points at: parent first, then edge endpoints.
    pub fn references(&self) -> impl Iterator<Item = (&'static str, &CellId)> {
        self.parent
            .iter()
            .map(|id| ("parent", id))
            .chain(self.source.iter().map(|id| ("source", id)))
            .chain(self.target.iter().map(|id| ("target", id)))
    }
}

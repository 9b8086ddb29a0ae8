// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Cellweave-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Cellweave and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! The tool-call surface: `display`, `edit` and `append`.
//!
//! Every expected outcome, success or failure, comes back as a [`ToolReply`] whose text is meant
//! to be replayed to the calling agent. Only broken internal invariants surface as
//! [`EngineError`].

mod feedback;

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::failure::FailureKind;
use crate::format::drawio::{export_document, parse_document, DEFAULT_PAGE_NAME};
use crate::model::{CellId, Document, DocumentError, SessionId};
use crate::ops::{apply_ops, ApplyError, Op, OpFailure, OpKind};
use crate::stream::{continuation_tail, AppendError, Feed, PartialAssembly};
use crate::validate::{build_document, check_fragment, check_references, validate, ValidationMode};

pub use feedback::suggest_cell_ids;

/// Characters of unfinished markup echoed back in a continuation request.
pub const DEFAULT_CONTINUATION_CONTEXT_CHARS: usize = 500;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub continuation_context_chars: usize,
    pub default_page_name: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            continuation_context_chars: DEFAULT_CONTINUATION_CONTEXT_CHARS,
            default_page_name: DEFAULT_PAGE_NAME.to_owned(),
        }
    }
}

/// One entry of an `edit` call, as the agent sends it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct EditRequest {
    pub operation: EditOperation,
    pub cell_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_xml: Option<String>,
}

impl EditRequest {
    pub fn add(cell_id: impl Into<String>, new_xml: impl Into<String>) -> Self {
        Self { operation: EditOperation::Add, cell_id: cell_id.into(), new_xml: Some(new_xml.into()) }
    }

    pub fn update(cell_id: impl Into<String>, new_xml: impl Into<String>) -> Self {
        Self {
            operation: EditOperation::Update,
            cell_id: cell_id.into(),
            new_xml: Some(new_xml.into()),
        }
    }

    pub fn delete(cell_id: impl Into<String>) -> Self {
        Self { operation: EditOperation::Delete, cell_id: cell_id.into(), new_xml: None }
    }

    fn to_op(&self) -> Result<Op, ApplyError> {
        let cell_id = CellId::new(&self.cell_id).map_err(|reason| ApplyError::InvalidId {
            value: self.cell_id.clone(),
            reason,
        })?;
        let fragment = || {
            self.new_xml
                .clone()
                .ok_or(ApplyError::MissingFragment { op: self.operation.kind() })
        };
        Ok(match self.operation {
            EditOperation::Add => Op::Add { cell_id, fragment: fragment()? },
            EditOperation::Update => Op::Update { cell_id, fragment: fragment()? },
            EditOperation::Delete => Op::Delete { cell_id },
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum EditOperation {
    Add,
    Update,
    Delete,
}

impl EditOperation {
    pub fn kind(self) -> OpKind {
        match self {
            Self::Add => OpKind::Add,
            Self::Update => OpKind::Update,
            Self::Delete => OpKind::Delete,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyStatus {
    /// A full replace took effect.
    Committed,
    /// An edit batch ran with no failures.
    Edited,
    /// The markup is unfinished; the agent should call `append`.
    ContinuationRequested,
    Failed(FailureKind),
}

impl ReplyStatus {
    pub fn label(self) -> &'static str {
        match self {
            Self::Committed => "committed",
            Self::Edited => "edited",
            Self::ContinuationRequested => "continuation_requested",
            Self::Failed(_) => "failed",
        }
    }

    /// Failure class of the outcome. A continuation request is classified as truncation
    /// without being a failure.
    pub fn failure(self) -> Option<FailureKind> {
        match self {
            Self::Failed(kind) => Some(kind),
            Self::ContinuationRequested => Some(FailureKind::Truncation),
            Self::Committed | Self::Edited => None,
        }
    }
}

/// Outcome of a tool call, rendered for the agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolReply {
    pub status: ReplyStatus,
    pub text: String,
    /// Revision of the session document after the call, if one exists.
    pub rev: Option<u64>,
}

impl ToolReply {
    fn new(status: ReplyStatus, text: String, rev: Option<u64>) -> Self {
        Self { status, text, rev }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self.status, ReplyStatus::Failed(_))
    }
}

/// Read-back of a session document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentSnapshot {
    pub xml: String,
    pub rev: u64,
    pub cells: usize,
}

/// Failures that are not the agent's to fix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// A mutation that passed every check left the document inconsistent.
    BrokenInvariant { session_id: SessionId, detail: String },
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BrokenInvariant { session_id, detail } => {
                write!(f, "document invariant broken in session '{session_id}': {detail}")
            }
        }
    }
}

impl std::error::Error for EngineError {}

#[derive(Debug, Clone, Default)]
struct EngineSession {
    document: Option<Document>,
    assembly: PartialAssembly,
}

impl EngineSession {
    fn rev(&self) -> Option<u64> {
        self.document.as_ref().map(Document::rev)
    }
}

/// Session-keyed diagram engine. Each session owns one document and one partial assembly;
/// sessions never share state.
#[derive(Debug, Clone, Default)]
pub struct DiagramEngine {
    config: EngineConfig,
    sessions: BTreeMap<SessionId, EngineSession>,
}

impl DiagramEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config, sessions: BTreeMap::new() }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn document(&self, session_id: &SessionId) -> Option<&Document> {
        self.sessions.get(session_id).and_then(|session| session.document.as_ref())
    }

    /// True while a `display` is waiting for continuations.
    pub fn has_pending_partial(&self, session_id: &SessionId) -> bool {
        self.sessions.get(session_id).is_some_and(|session| session.assembly.is_pending())
    }

    pub fn pending_partial(&self, session_id: &SessionId) -> Option<&str> {
        self.sessions
            .get(session_id)
            .filter(|session| session.assembly.is_pending())
            .map(|session| session.assembly.buffer())
    }

    /// Full replace. Unfinished markup starts a partial assembly instead.
    pub fn display(&mut self, session_id: &SessionId, xml: &str) -> Result<ToolReply, EngineError> {
        debug!(session = %session_id, bytes = xml.len(), "display");
        let config = &self.config;
        let session = self.sessions.entry(session_id.clone()).or_default();
        session.assembly.clear();

        if xml.trim().is_empty() {
            warn!(session = %session_id, "display rejected: empty markup");
            return Ok(ToolReply::new(
                ReplyStatus::Failed(FailureKind::Structural),
                feedback::empty_display_text(),
                session.rev(),
            ));
        }

        match session.assembly.begin(xml) {
            Feed::Incomplete => Ok(continuation_reply(config, session)),
            Feed::Complete(markup) => commit(session_id, session, &markup, config, false),
        }
    }

    /// Continues a `display` that was cut off.
    pub fn append(&mut self, session_id: &SessionId, xml: &str) -> Result<ToolReply, EngineError> {
        debug!(session = %session_id, bytes = xml.len(), "append");
        let config = &self.config;
        let session = self.sessions.entry(session_id.clone()).or_default();

        match session.assembly.append(xml) {
            Ok(Feed::Incomplete) => {
                debug!(
                    session = %session_id,
                    fragments = session.assembly.fragments(),
                    buffered = session.assembly.buffer().len(),
                    "still incomplete"
                );
                Ok(continuation_reply(config, session))
            }
            Ok(Feed::Complete(markup)) => commit(session_id, session, &markup, config, true),
            Err(err @ AppendError::Restart { .. }) => {
                warn!(session = %session_id, %err, "continuation rejected");
                let tail = continuation_tail(
                    session.assembly.buffer(),
                    config.continuation_context_chars,
                );
                Ok(ToolReply::new(
                    ReplyStatus::Failed(err.kind()),
                    feedback::restart_text(&err, tail),
                    session.rev(),
                ))
            }
            Err(err @ AppendError::NoPendingPartial) => {
                warn!(session = %session_id, "append without a pending display");
                Ok(ToolReply::new(
                    ReplyStatus::Failed(err.kind()),
                    feedback::no_pending_text(),
                    session.rev(),
                ))
            }
        }
    }

    /// Applies an id-based edit batch to the session document (an empty one before the first
    /// display). Failed entries are reported; the rest take effect.
    pub fn edit(
        &mut self,
        session_id: &SessionId,
        requests: &[EditRequest],
    ) -> Result<ToolReply, EngineError> {
        debug!(session = %session_id, ops = requests.len(), "edit");
        let session = self.sessions.entry(session_id.clone()).or_default();

        let mut failures = Vec::new();
        let mut ops = Vec::with_capacity(requests.len());
        let mut positions = Vec::with_capacity(requests.len());
        for (index, request) in requests.iter().enumerate() {
            match request.to_op() {
                Ok(op) => {
                    ops.push(op);
                    positions.push(index);
                }
                Err(error) => failures.push(EditFailure::new(index, request, error)),
            }
        }

        let mut working = session.document.clone().unwrap_or_default();
        let result = apply_ops(&mut working, &ops);
        for OpFailure { index, error, .. } in &result.failures {
            let index = positions.get(*index).copied().unwrap_or(*index);
            if let Some(request) = requests.get(index) {
                failures.push(EditFailure::new(index, request, error.clone()));
            }
        }
        failures.sort_by_key(|failure| failure.index);

        if result.applied > 0 {
            check_references(&working).map_err(|err| EngineError::BrokenInvariant {
                session_id: session_id.clone(),
                detail: err.to_string(),
            })?;
            info!(
                session = %session_id,
                rev = working.rev(),
                applied = result.applied,
                added = result.delta.added.len(),
                updated = result.delta.updated.len(),
                removed = result.delta.removed.len(),
                "edit applied"
            );
            session.document = Some(working);
        }
        if !failures.is_empty() {
            warn!(session = %session_id, failed = failures.len(), "edit operations rejected");
        }

        let empty = Document::new();
        let document = session.document.as_ref().unwrap_or(&empty);
        let text = feedback::edit_text(&result, &failures, requests.len(), document);
        let status = match failures.first() {
            Some(failure) => ReplyStatus::Failed(failure.error.kind()),
            None => ReplyStatus::Edited,
        };
        Ok(ToolReply::new(status, text, session.rev()))
    }

    /// Commits a trusted full document (wrapped, compressed or bare) without fragment checks.
    /// Document invariants still apply.
    pub fn load_document(
        &mut self,
        session_id: &SessionId,
        xml: &str,
    ) -> Result<ToolReply, EngineError> {
        debug!(session = %session_id, bytes = xml.len(), "load");
        let session = self.sessions.entry(session_id.clone()).or_default();
        session.assembly.clear();

        let validation = validate(xml, ValidationMode::FullDocument);
        let source = validation.fixed.as_deref().unwrap_or(xml);
        let loaded = parse_document(source)
            .map_err(|err| (FailureKind::Parse, err.to_string()))
            .and_then(|cells| {
                Document::from_cells(cells).map_err(|err| {
                    let kind = match err {
                        DocumentError::DuplicateCellId { .. } => FailureKind::IdConflict,
                        DocumentError::ReservedCellId { .. } => FailureKind::Structural,
                    };
                    (kind, err.to_string())
                })
            })
            .and_then(|document| {
                check_references(&document)
                    .map(|()| document)
                    .map_err(|err| (err.kind(), err.to_string()))
            });

        match loaded {
            Ok(mut document) => {
                document.set_rev(session.rev().unwrap_or(0) + 1);
                info!(session = %session_id, rev = document.rev(), cells = document.len(), "document loaded");
                let text = feedback::loaded_text(&document, &validation.fixes);
                session.document = Some(document);
                Ok(ToolReply::new(ReplyStatus::Committed, text, session.rev()))
            }
            Err((kind, detail)) => {
                warn!(session = %session_id, %kind, "load rejected");
                Ok(ToolReply::new(
                    ReplyStatus::Failed(kind),
                    feedback::load_failure_text(&detail),
                    session.rev(),
                ))
            }
        }
    }

    /// The session document wrapped as a full draw.io file, or an empty skeleton.
    pub fn current_xml(&self, session_id: &SessionId) -> DocumentSnapshot {
        let empty = Document::new();
        let document = self.document(session_id).unwrap_or(&empty);
        DocumentSnapshot {
            xml: export_document(document, &self.config.default_page_name),
            rev: document.rev(),
            cells: document.len(),
        }
    }
}

fn continuation_reply(config: &EngineConfig, session: &EngineSession) -> ToolReply {
    let tail = continuation_tail(session.assembly.buffer(), config.continuation_context_chars);
    ToolReply::new(
        ReplyStatus::ContinuationRequested,
        feedback::continuation_text(tail),
        session.rev(),
    )
}

/// Validates assembled markup and replaces the session document with it.
fn commit(
    session_id: &SessionId,
    session: &mut EngineSession,
    markup: &str,
    config: &EngineConfig,
    assembled: bool,
) -> Result<ToolReply, EngineError> {
    let built = check_fragment(markup).and_then(|checked| {
        let document = build_document(&checked)?;
        Ok((document, checked.fixes))
    });

    match built {
        Ok((mut document, fixes)) => {
            document.set_rev(session.rev().unwrap_or(0) + 1);
            info!(
                session = %session_id,
                rev = document.rev(),
                cells = document.len(),
                fixes = fixes.len(),
                "diagram committed"
            );
            let text = feedback::committed_text(&document, &fixes, &config.default_page_name);
            session.document = Some(document);
            Ok(ToolReply::new(ReplyStatus::Committed, text, session.rev()))
        }
        Err(error) => {
            warn!(session = %session_id, kind = %error.kind(), %error, "display rejected");
            Ok(ToolReply::new(
                ReplyStatus::Failed(error.kind()),
                feedback::validation_failure_text(&error, assembled),
                session.rev(),
            ))
        }
    }
}

/// A rejected edit entry, named by the id the agent sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditFailure {
    /// Position in the submitted batch.
    pub index: usize,
    pub op: OpKind,
    pub cell_id: String,
    pub error: ApplyError,
}

impl EditFailure {
    fn new(index: usize, request: &EditRequest, error: ApplyError) -> Self {
        Self { index, op: request.operation.kind(), cell_id: request.cell_id.clone(), error }
    }
}

#[cfg(test)]
mod tests;

// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Cellweave-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Cellweave and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Natural-language rendering of tool outcomes. Everything here is replayed to the agent.

use crate::format::drawio::export_fragment;
use crate::model::{CellId, Document};
use crate::ops::{ApplyError, ApplyResult, OpKind};
use crate::stream::AppendError;
use crate::validate::{Fix, ValidationError};

use super::EditFailure;

const MAX_SUGGESTIONS: usize = 3;
const MIN_SUGGESTION_RATIO: f64 = 0.4;

pub(super) fn empty_display_text() -> String {
    "display received no XML. Send bare <mxCell> elements (ids from \"2\", parent=\"1\" for \
     top-level shapes); the document wrapper and root cells are added automatically."
        .to_owned()
}

pub(super) fn continuation_text(tail: &str) -> String {
    format!(
        "The diagram XML was cut off before the last <mxCell> element closed. Call append with \
         the rest of the XML, starting exactly where the text below ends. Do not start over and \
         do not repeat the document wrapper or the root cells.\n\nLast characters received:\n\
         ```xml\n{tail}\n```"
    )
}

pub(super) fn restart_text(error: &AppendError, tail: &str) -> String {
    format!(
        "append rejected: {error}. The unfinished XML is kept. Call append again with only the \
         missing continuation, starting exactly where the text below ends.\n\n\
         Last characters received:\n```xml\n{tail}\n```"
    )
}

pub(super) fn no_pending_text() -> String {
    "append rejected: there is no unfinished diagram to continue. Call display with the complete \
     diagram XML instead."
        .to_owned()
}

pub(super) fn committed_text(document: &Document, fixes: &[Fix], page_name: &str) -> String {
    let mut text = format!(
        "Diagram displayed on page '{page_name}' (rev {}, {} cells).",
        document.rev(),
        document.len()
    );
    push_fixes(&mut text, fixes);
    text
}

pub(super) fn loaded_text(document: &Document, fixes: &[Fix]) -> String {
    let mut text =
        format!("Diagram loaded (rev {}, {} cells).", document.rev(), document.len());
    push_fixes(&mut text, fixes);
    text
}

pub(super) fn load_failure_text(detail: &str) -> String {
    format!("The diagram file could not be loaded: {detail}.")
}

pub(super) fn validation_failure_text(error: &ValidationError, assembled: bool) -> String {
    let mut text = format!("display rejected ({}): {error}.", error.kind());
    if let Some(snippet) = error.snippet() {
        text.push_str(&format!("\n\nNear:\n```xml\n{snippet}\n```"));
    }
    if assembled {
        text.push_str(
            "\n\nThe assembled XML was discarded. Call display again with the corrected, complete \
             diagram.",
        );
    } else {
        text.push_str("\n\nFix the XML and call display again.");
    }
    text
}

pub(super) fn edit_text(
    result: &ApplyResult,
    failures: &[EditFailure],
    requested: usize,
    document: &Document,
) -> String {
    let mut text = if failures.is_empty() {
        format!("Applied {} of {requested} operations (rev {}).", result.applied, document.rev())
    } else {
        format!(
            "{} of {requested} operations failed; {} applied (rev {}).",
            failures.len(),
            result.applied,
            document.rev()
        )
    };

    if !result.delta.removed.is_empty() {
        text.push_str(&format!("\nRemoved: {}.", join_ids(&result.delta.removed)));
    }
    if !result.skipped.is_empty() {
        text.push_str(&format!(
            "\nAlready gone, nothing to delete: {}.",
            join_ids(&result.skipped)
        ));
    }
    push_fixes(&mut text, &result.fixes);

    if failures.is_empty() {
        return text;
    }

    text.push_str("\n\nFailed operations:");
    for failure in failures {
        text.push_str(&format!(
            "\n- #{} {} '{}': {}",
            failure.index, failure.op, failure.cell_id, failure.error
        ));
        if let Some(hint) = failure_hint(failure, document) {
            text.push_str(&format!(" {hint}"));
        }
    }

    text.push_str(
        "\n\nRetry only the failed operations with corrected ids. Current diagram cells:\n```xml\n",
    );
    text.push_str(&export_fragment(document));
    text.push_str("```");
    text
}

fn failure_hint(failure: &EditFailure, document: &Document) -> Option<String> {
    let mut next = itoa::Buffer::new();
    let next_id = next.format(document.next_numeric_id());
    match &failure.error {
        ApplyError::NotFound { cell_id } => {
            let suggestions = suggest_cell_ids(document, cell_id.as_str(), MAX_SUGGESTIONS);
            let mut hint = String::new();
            if !suggestions.is_empty() {
                hint.push_str(&format!("Did you mean {}? ", join_ids(suggestions)));
            }
            if failure.op == OpKind::Update {
                hint.push_str(&format!("To create it, use add. Next free id: \"{next_id}\"."));
            }
            (!hint.is_empty()).then(|| hint.trim_end().to_owned())
        }
        ApplyError::AlreadyExists { .. } => Some(format!("Next free id: \"{next_id}\".")),
        ApplyError::ReservedId { .. } => Some(format!("Start numbering at \"{next_id}\".")),
        ApplyError::Fragment(error) => {
            error.snippet().map(|snippet| format!("Near: `{snippet}`"))
        }
        _ => None,
    }
}

/// Up to `limit` existing ids closest to `missing`, best first.
pub fn suggest_cell_ids<'a>(document: &'a Document, missing: &str, limit: usize) -> Vec<&'a CellId> {
    let mut scored = document
        .cell_ids()
        .map(|cell_id| (rapidfuzz::fuzz::ratio(missing.chars(), cell_id.as_str().chars()), cell_id))
        .filter(|(ratio, _)| *ratio >= MIN_SUGGESTION_RATIO)
        .collect::<Vec<_>>();
    scored.sort_by(|(a, a_id), (b, b_id)| b.total_cmp(a).then_with(|| a_id.cmp(b_id)));
    scored.into_iter().take(limit).map(|(_, cell_id)| cell_id).collect()
}

fn push_fixes(text: &mut String, fixes: &[Fix]) {
    if fixes.is_empty() {
        return;
    }
    text.push_str("\nAuto-fixed:");
    for fix in fixes {
        text.push_str(&format!("\n- {fix}"));
    }
}

fn join_ids<'a>(ids: impl IntoIterator<Item = &'a CellId>) -> String {
    ids.into_iter().map(|cell_id| format!("'{cell_id}'")).collect::<Vec<_>>().join(", ")
}

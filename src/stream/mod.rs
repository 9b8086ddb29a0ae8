// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Cellweave-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Cellweave and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Reassembly of cell markup that arrives in pieces.
//!
//! A model writing a large `display` payload may be cut off mid-element. The buffer is kept and
//! the model is asked to continue; continuations are appended verbatim until the trailing cell
//! element closes. Completion is judged by a small lexer that only counts tags outside quoted
//! attribute values, comments and CDATA sections.

use std::fmt;
use std::sync::OnceLock;

use memchr::{memchr, memchr3, memmem};
use regex::Regex;

use crate::failure::FailureKind;
use crate::format::drawio::{leading_element, CELL_ELEMENT};
use crate::model::is_sentinel_id;

/// Where the last cell element of a buffer stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trailing {
    /// The last cell element is self-closed or has its matching closing tag.
    Closed,
    /// The last cell element is open and nothing closes it yet.
    Open,
    /// The buffer ends inside a tag, a quoted value, a comment or a CDATA section.
    Truncated,
    /// No cell element at all, and nothing cut off.
    NoCell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CellTag {
    Open { self_closing: bool },
    Close,
}

pub fn trailing_state(buffer: &str) -> Trailing {
    let bytes = buffer.as_bytes();
    let mut tags = Vec::new();
    let mut pos = 0;

    while let Some(hit) = memchr(b'<', &bytes[pos..]) {
        let start = pos + hit;
        let rest = &bytes[start..];

        let skip_to = if rest.starts_with(b"<!--") {
            memmem::find(&rest[4..], b"-->").map(|end| start + 4 + end + 3)
        } else if rest.starts_with(b"<![CDATA[") {
            memmem::find(&rest[9..], b"]]>").map(|end| start + 9 + end + 3)
        } else {
            let Some(end) = tag_end(bytes, start + 1) else {
                return Trailing::Truncated;
            };
            if let Some(tag) = classify(&bytes[start..=end]) {
                tags.push(tag);
            }
            Some(end + 1)
        };
        match skip_to {
            Some(next) => pos = next,
            None => return Trailing::Truncated,
        }
    }

    let Some(last_open) = tags.iter().rposition(|tag| matches!(tag, CellTag::Open { .. })) else {
        return Trailing::NoCell;
    };
    if tags[last_open] == (CellTag::Open { self_closing: true }) {
        return Trailing::Closed;
    }

    let mut depth = 1usize;
    for tag in &tags[last_open + 1..] {
        match tag {
            CellTag::Open { self_closing: false } => depth += 1,
            CellTag::Open { self_closing: true } => {}
            CellTag::Close => {
                depth -= 1;
                if depth == 0 {
                    return Trailing::Closed;
                }
            }
        }
    }
    Trailing::Open
}

/// True when the trailing cell element of `buffer` is syntactically closed.
pub fn is_complete(buffer: &str) -> bool {
    trailing_state(buffer) == Trailing::Closed
}

/// Index of the `>` ending the tag whose name starts at `pos`, skipping quoted values.
fn tag_end(bytes: &[u8], mut pos: usize) -> Option<usize> {
    loop {
        let at = pos + memchr3(b'>', b'"', b'\'', bytes.get(pos..)?)?;
        let quote = bytes[at];
        if quote == b'>' {
            return Some(at);
        }
        let close = memchr(quote, bytes.get(at + 1..)?)?;
        pos = at + 1 + close + 1;
    }
}

fn classify(tag: &[u8]) -> Option<CellTag> {
    let (closing, name_start) = match tag.get(1) {
        Some(b'/') => (true, 2),
        _ => (false, 1),
    };
    let name = tag.get(name_start..)?.strip_prefix(CELL_ELEMENT.as_bytes())?;
    if !matches!(name.first(), Some(b) if b.is_ascii_whitespace() || *b == b'/' || *b == b'>') {
        return None;
    }
    if closing {
        return Some(CellTag::Close);
    }
    let self_closing = tag.len() >= 2 && tag[tag.len() - 2] == b'/';
    Some(CellTag::Open { self_closing })
}

/// True when a continuation starts a new document instead of continuing: past a BOM and
/// leading comments, it opens with a wrapper element or with one of the sentinel cells.
pub fn detect_restart(fragment: &str) -> bool {
    restart_marker(fragment).is_some()
}

fn restart_marker(fragment: &str) -> Option<String> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(r"^<(?:\?xml|mxfile|diagram|mxGraphModel|root)\b").expect("valid restart regex")
    });

    let lead = skip_prelude(fragment)?;
    if let Some(found) = re.find(lead) {
        return Some(found.as_str().to_owned());
    }
    let element = leading_element(lead)?;
    let id = element.id.filter(|id| element.name == CELL_ELEMENT && is_sentinel_id(id))?;
    Some(format!("<{CELL_ELEMENT} id=\"{id}\""))
}

/// Drops a BOM, whitespace and complete leading comments. `None` while a comment is still open.
fn skip_prelude(fragment: &str) -> Option<&str> {
    let mut rest = fragment.strip_prefix('\u{feff}').unwrap_or(fragment);
    loop {
        rest = rest.trim_start();
        let Some(comment) = rest.strip_prefix("<!--") else {
            return Some(rest);
        };
        let end = memmem::find(comment.as_bytes(), b"-->")?;
        rest = &comment[end + 3..];
    }
}

/// Result of the pure [`feed`] step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fed {
    pub buffer: String,
    pub complete: bool,
}

/// Appends `fragment` verbatim and re-evaluates completion.
pub fn feed(buffer: &str, fragment: &str) -> Fed {
    let mut next = String::with_capacity(buffer.len() + fragment.len());
    next.push_str(buffer);
    next.push_str(fragment);
    let complete = is_complete(&next);
    Fed { buffer: next, complete }
}

/// The last `chars` characters of `buffer`.
pub fn continuation_tail(buffer: &str, chars: usize) -> &str {
    if chars == 0 {
        return "";
    }
    match buffer.char_indices().rev().nth(chars - 1) {
        Some((start, _)) => &buffer[start..],
        None => buffer,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AssemblyState {
    #[default]
    Idle,
    Accumulating,
    /// The last continuation was a restart. The buffer is kept for another attempt.
    Rejected,
}

/// What a fragment did to the assembly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Feed {
    /// The trailing element closed. The assembled buffer is handed out and the assembly is
    /// back to idle.
    Complete(String),
    /// Still open; the buffer is kept and a continuation is needed.
    Incomplete,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppendError {
    NoPendingPartial,
    Restart { marker: String },
}

impl AppendError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::NoPendingPartial => FailureKind::NoPendingPartial,
            Self::Restart { .. } => FailureKind::Restart,
        }
    }
}

impl fmt::Display for AppendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoPendingPartial => f.write_str("there is no unfinished diagram to continue"),
            Self::Restart { marker } => write!(
                f,
                "the continuation starts over with `{marker}` instead of continuing the unfinished markup"
            ),
        }
    }
}

impl std::error::Error for AppendError {}

/// Accumulation buffer for one in-flight `display` call.
#[derive(Debug, Clone, Default)]
pub struct PartialAssembly {
    buffer: String,
    state: AssemblyState,
    fragments: usize,
}

impl PartialAssembly {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> AssemblyState {
        self.state
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    /// Fragments received since the current assembly began.
    pub fn fragments(&self) -> usize {
        self.fragments
    }

    pub fn is_pending(&self) -> bool {
        self.state != AssemblyState::Idle
    }

    /// Starts a new assembly, discarding any pending one.
    pub fn begin(&mut self, fragment: &str) -> Feed {
        self.clear();
        self.push(fragment)
    }

    /// Continues the pending assembly. Restarts leave the buffer untouched.
    pub fn append(&mut self, fragment: &str) -> Result<Feed, AppendError> {
        if !self.is_pending() {
            return Err(AppendError::NoPendingPartial);
        }
        if let Some(marker) = restart_marker(fragment) {
            self.state = AssemblyState::Rejected;
            return Err(AppendError::Restart { marker });
        }
        Ok(self.push(fragment))
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
        self.state = AssemblyState::Idle;
        self.fragments = 0;
    }

    fn push(&mut self, fragment: &str) -> Feed {
        self.buffer.push_str(fragment);
        self.fragments += 1;
        match trailing_state(&self.buffer) {
            Trailing::Open | Trailing::Truncated => {
                self.state = AssemblyState::Accumulating;
                Feed::Incomplete
            }
            // A buffer with no cell at all is handed on so validation can reject it.
            Trailing::Closed | Trailing::NoCell => {
                let assembled = std::mem::take(&mut self.buffer);
                self.clear();
                Feed::Complete(assembled)
            }
        }
    }
}

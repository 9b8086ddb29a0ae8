// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Cellweave-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Cellweave and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::fmt;

/// Classification of every expected failure the engine reports back to the agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// Malformed markup.
    Parse,
    /// Wrapper in a fragment, nested cells, reserved ids, dangling references.
    Structural,
    /// Duplicate id on add, missing target on update, id mismatch.
    IdConflict,
    /// Trailing element still open; drives the continuation flow.
    Truncation,
    /// A continuation started a new document instead of continuing.
    Restart,
    /// A continuation arrived with nothing to continue.
    NoPendingPartial,
}

impl FailureKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Parse => "parse_error",
            Self::Structural => "structural_error",
            Self::IdConflict => "id_conflict",
            Self::Truncation => "truncated",
            Self::Restart => "restart",
            Self::NoPendingPartial => "no_pending_partial",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

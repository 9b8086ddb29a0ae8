// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Cellweave-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Cellweave and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::engine::EditRequest;

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct DiagramDisplayParams {
    /// Bare `<mxCell>` elements, ids from "2", no wrapper and no root cells.
    pub xml: String,
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct DiagramAppendParams {
    /// Continuation of a cut-off `diagram.display`, starting exactly where it stopped.
    pub xml: String,
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct DiagramEditParams {
    pub operations: Vec<EditRequest>,
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct DiagramLoadParams {
    /// A full draw.io document (plain or compressed) or a bare cell list.
    pub xml: String,
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct DiagramReadParams {
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ToolReplyResponse {
    /// One of `committed`, `edited`, `continuation_requested`, `failed`.
    pub status: String,
    /// Failure class when `status` is `failed`; `truncated` for `continuation_requested`.
    pub failure: Option<String>,
    /// Feedback meant for the agent.
    pub message: String,
    pub rev: Option<u64>,
    pub session_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DiagramReadResponse {
    pub session_id: String,
    pub rev: u64,
    pub cells: u64,
    pub xml: String,
    /// Unfinished `display` markup waiting for `diagram.append`, if any.
    pub pending_partial: Option<String>,
}

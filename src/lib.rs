// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Cellweave-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Cellweave and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Cellweave: draw.io cell operations and streaming assembly for agent tool calls.
//!
//! Layers, leaf first: `model` (cell graph), `validate` (schema checks and safe repairs),
//! `ops` (id-based add/update/delete with cascade), `stream` (reassembly of cut-off markup),
//! `engine` (the `display`/`edit`/`append` surface) and `mcp` (tool server).

pub mod engine;
pub mod failure;
pub mod format;
pub mod mcp;
pub mod model;
pub mod ops;
pub mod stream;
pub mod validate;

// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Cellweave-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Cellweave and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Core data model: cells, the document graph, and typed ids.

pub mod cell;
pub mod document;
pub mod ids;

pub use cell::{Cell, CellRole};
pub use document::{DanglingReference, Document, DocumentError};
pub use ids::{
    is_sentinel_id, CellId, Id, IdError, SessionId, LAYER_CELL_ID, ROOT_CELL_ID,
};

// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Cellweave-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Cellweave and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Model Context Protocol (MCP) server surface.
//!
//! Exposes the diagram engine's `display`, `append` and `edit` calls, plus read-back and trusted
//! load, as MCP tools.

mod server;
mod types;

pub use server::{CellweaveMcp, DEFAULT_SESSION_ID};

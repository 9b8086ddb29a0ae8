// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Cellweave-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Cellweave and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::sync::Arc;

use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::{Json, Parameters};
use rmcp::model::{ServerCapabilities, ServerInfo};
use rmcp::{tool, tool_handler, tool_router, ErrorData, ServerHandler, ServiceExt};
use tokio::sync::Mutex;
use tracing::debug;

use crate::engine::{DiagramEngine, EngineError, ToolReply};
use crate::model::SessionId;

use super::types::*;

/// Session used when a tool call names none.
pub const DEFAULT_SESSION_ID: &str = "default";

#[derive(Clone)]
pub struct CellweaveMcp {
    engine: Arc<Mutex<DiagramEngine>>,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl CellweaveMcp {
    pub fn new(engine: DiagramEngine) -> Self {
        Self::new_shared(Arc::new(Mutex::new(engine)))
    }

    pub fn new_shared(engine: Arc<Mutex<DiagramEngine>>) -> Self {
        Self { engine, tool_router: Self::tool_router() }
    }

    pub async fn serve_stdio(self) -> Result<(), rmcp::RmcpError> {
        let service = self.serve((tokio::io::stdin(), tokio::io::stdout())).await?;
        service.waiting().await?;
        Ok(())
    }

    /// Replace the whole diagram with bare `<mxCell>` elements. If the XML is cut off, the reply
    /// asks for `diagram.append` with the continuation.
    #[tool(name = "diagram.display")]
    async fn diagram_display(
        &self,
        params: Parameters<DiagramDisplayParams>,
    ) -> Result<Json<ToolReplyResponse>, ErrorData> {
        let DiagramDisplayParams { xml, session_id } = params.0;
        let session_id = resolve_session_id(session_id.as_deref())?;
        let reply = self.engine.lock().await.display(&session_id, &xml).map_err(internal_error)?;
        Ok(Json(reply_response(&session_id, reply)))
    }

    /// Continue a cut-off `diagram.display`, starting exactly where the previous XML ended.
    #[tool(name = "diagram.append")]
    async fn diagram_append(
        &self,
        params: Parameters<DiagramAppendParams>,
    ) -> Result<Json<ToolReplyResponse>, ErrorData> {
        let DiagramAppendParams { xml, session_id } = params.0;
        let session_id = resolve_session_id(session_id.as_deref())?;
        let reply = self.engine.lock().await.append(&session_id, &xml).map_err(internal_error)?;
        Ok(Json(reply_response(&session_id, reply)))
    }

    /// Apply id-based `add`/`update`/`delete` operations. Deleting a cell also removes its
    /// children and every edge attached to them.
    #[tool(name = "diagram.edit")]
    async fn diagram_edit(
        &self,
        params: Parameters<DiagramEditParams>,
    ) -> Result<Json<ToolReplyResponse>, ErrorData> {
        let DiagramEditParams { operations, session_id } = params.0;
        let session_id = resolve_session_id(session_id.as_deref())?;
        let reply =
            self.engine.lock().await.edit(&session_id, &operations).map_err(internal_error)?;
        Ok(Json(reply_response(&session_id, reply)))
    }

    /// Read the current diagram as a full draw.io document.
    #[tool(name = "diagram.read")]
    async fn diagram_read(
        &self,
        params: Parameters<DiagramReadParams>,
    ) -> Result<Json<DiagramReadResponse>, ErrorData> {
        let session_id = resolve_session_id(params.0.session_id.as_deref())?;
        let engine = self.engine.lock().await;
        let snapshot = engine.current_xml(&session_id);
        let pending_partial = engine.pending_partial(&session_id).map(ToOwned::to_owned);
        drop(engine);
        debug!(session = %session_id, rev = snapshot.rev, "read");

        Ok(Json(DiagramReadResponse {
            session_id: session_id.into_string(),
            rev: snapshot.rev,
            cells: snapshot.cells as u64,
            xml: snapshot.xml,
            pending_partial,
        }))
    }

    /// Load a trusted draw.io document (plain or compressed) as the current diagram.
    #[tool(name = "diagram.load")]
    async fn diagram_load(
        &self,
        params: Parameters<DiagramLoadParams>,
    ) -> Result<Json<ToolReplyResponse>, ErrorData> {
        let DiagramLoadParams { xml, session_id } = params.0;
        let session_id = resolve_session_id(session_id.as_deref())?;
        let reply =
            self.engine.lock().await.load_document(&session_id, &xml).map_err(internal_error)?;
        Ok(Json(reply_response(&session_id, reply)))
    }
}

#[tool_handler]
impl ServerHandler for CellweaveMcp {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Cellweave draw.io diagram server (tools: diagram.display, diagram.append, diagram.edit, diagram.read, diagram.load). Send bare <mxCell> elements with ids starting at \"2\"; the document wrapper and root cells \"0\"/\"1\" are added automatically."
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

// Param resolution and reply mapping for the tool handlers.
include!("server/helpers.rs");

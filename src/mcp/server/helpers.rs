// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Cellweave-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Cellweave and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

/// MCP server helper functions: session id parsing and engine reply mapping.
fn resolve_session_id(session_id: Option<&str>) -> Result<SessionId, ErrorData> {
    let raw = session_id.unwrap_or(DEFAULT_SESSION_ID);
    SessionId::new(raw).map_err(|err| {
        ErrorData::invalid_params(
            format!("invalid session_id: {err}"),
            Some(serde_json::json!({ "session_id": raw })),
        )
    })
}

fn reply_response(session_id: &SessionId, reply: ToolReply) -> ToolReplyResponse {
    ToolReplyResponse {
        status: reply.status.label().to_owned(),
        failure: reply.status.failure().map(|kind| kind.label().to_owned()),
        message: reply.text,
        rev: reply.rev,
        session_id: session_id.as_str().to_owned(),
    }
}

fn internal_error(err: EngineError) -> ErrorData {
    ErrorData::internal_error(err.to_string(), None)
}

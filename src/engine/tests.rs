// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Cellweave-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Cellweave and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use rstest::{fixture, rstest};

use super::*;

const THREE_CELLS: &str = r#"<mxCell id="2" value="Group" vertex="1" parent="1"><mxGeometry x="0" y="0" width="200" height="200" as="geometry"/></mxCell>
<mxCell id="3" value="Child" vertex="1" parent="2"><mxGeometry x="20" y="20" width="80" height="40" as="geometry"/></mxCell>
<mxCell id="4" edge="1" parent="1" source="2" target="3"><mxGeometry relative="1" as="geometry"/></mxCell>"#;

fn sid(value: &str) -> SessionId {
    SessionId::new(value).expect("session id")
}

#[fixture]
fn session() -> SessionId {
    sid("default")
}

#[fixture]
fn engine() -> DiagramEngine {
    DiagramEngine::default()
}

#[fixture]
fn displayed(mut engine: DiagramEngine, session: SessionId) -> DiagramEngine {
    let reply = engine.display(&session, THREE_CELLS).expect("display");
    assert_eq!(reply.status, ReplyStatus::Committed, "{}", reply.text);
    engine
}

#[rstest]
fn display_commits_a_complete_fragment(mut engine: DiagramEngine, session: SessionId) {
    let reply = engine.display(&session, THREE_CELLS).expect("display");

    assert_eq!(reply.status, ReplyStatus::Committed);
    assert_eq!(reply.rev, Some(1));
    assert!(reply.text.contains("3 cells"), "{}", reply.text);
    let document = engine.document(&session).expect("document");
    assert_eq!(document.cell_ids().map(CellId::as_str).collect::<Vec<_>>(), vec!["2", "3", "4"]);
}

#[rstest]
fn each_full_replace_bumps_the_revision(mut displayed: DiagramEngine, session: SessionId) {
    let reply = displayed
        .display(&session, r#"<mxCell id="2" vertex="1" parent="1"/>"#)
        .expect("display");

    assert_eq!(reply.rev, Some(2));
    assert_eq!(displayed.document(&session).map(Document::len), Some(1));
}

#[rstest]
fn display_reports_fixes(mut engine: DiagramEngine, session: SessionId) {
    let reply = engine
        .display(&session, r#"<mxCell id="2" value="A" vertex="1"></mxCell>"#)
        .expect("display");

    assert_eq!(reply.status, ReplyStatus::Committed);
    assert!(reply.text.contains("Auto-fixed"), "{}", reply.text);
    assert!(reply.text.contains("parent=\"1\""), "{}", reply.text);
}

#[rstest]
#[case::wrapper(
    "<mxGraphModel><root><mxCell id=\"2\"/></root></mxGraphModel>",
    FailureKind::Structural
)]
#[case::nested(
    r#"<mxCell id="2" vertex="1" parent="1"><mxCell id="3" vertex="1" parent="2"/></mxCell>"#,
    FailureKind::Structural
)]
#[case::bad_entity(r#"<mxCell id="2" value="R&D" vertex="1" parent="1"/>"#, FailureKind::Parse)]
#[case::reserved(r#"<mxCell id="1" parent="0"/>"#, FailureKind::Structural)]
#[case::dangling(
    r#"<mxCell id="2" edge="1" parent="1" source="7" target="8"/>"#,
    FailureKind::Structural
)]
#[case::whitespace("   \n ", FailureKind::Structural)]
fn invalid_display_is_reported_not_committed(
    mut displayed: DiagramEngine,
    session: SessionId,
    #[case] xml: &str,
    #[case] kind: FailureKind,
) {
    let reply = displayed.display(&session, xml).expect("display");

    assert_eq!(reply.status, ReplyStatus::Failed(kind), "{}", reply.text);
    assert_eq!(reply.rev, Some(1));
    assert_eq!(displayed.document(&session).map(Document::len), Some(3));
}

#[rstest]
fn truncated_display_requests_a_continuation(mut engine: DiagramEngine, session: SessionId) {
    let reply = engine.display(&session, r#"<mxCell id="2" value="A"#).expect("display");

    assert_eq!(reply.status, ReplyStatus::ContinuationRequested);
    assert_eq!(reply.status.failure(), Some(FailureKind::Truncation));
    assert!(!reply.is_failure());
    assert!(reply.text.contains(r#"<mxCell id="2" value="A"#), "{}", reply.text);
    assert!(engine.has_pending_partial(&session));
    assert_eq!(engine.document(&session), None);
}

#[rstest]
fn continuation_context_is_limited_to_the_configured_tail(session: SessionId) {
    let mut engine = DiagramEngine::new(EngineConfig {
        continuation_context_chars: 8,
        ..EngineConfig::default()
    });
    let reply = engine
        .display(&session, r#"<mxCell id="2" value="ABCDEFGHIJ"#)
        .expect("display");

    assert!(reply.text.contains("\nCDEFGHIJ\n"), "{}", reply.text);
    assert!(!reply.text.contains("BCDEFGHIJ"), "{}", reply.text);
}

#[rstest]
fn append_completes_and_commits(mut engine: DiagramEngine, session: SessionId) {
    engine.display(&session, r#"<mxCell id="2" value="A"#).expect("display");
    let reply = engine
        .append(&session, r#"" vertex="1"><mxGeometry x="1" y="1" width="2" height="2" as="geometry"/></mxCell>"#)
        .expect("append");

    assert_eq!(reply.status, ReplyStatus::Committed, "{}", reply.text);
    let cell = engine.document(&session).and_then(|doc| doc.get("2")).expect("cell");
    assert_eq!(cell.value(), Some("A"));
    assert_eq!(cell.parent(), Some(&CellId::layer()));
    assert!(!engine.has_pending_partial(&session));
}

#[rstest]
fn append_restart_keeps_the_partial(mut engine: DiagramEngine, session: SessionId) {
    engine.display(&session, r#"<mxCell id="2" value="A"#).expect("display");
    let reply = engine.append(&session, "<mxGraphModel><root>").expect("append");

    assert_eq!(reply.status, ReplyStatus::Failed(FailureKind::Restart));
    assert!(reply.text.contains("<mxGraphModel"), "{}", reply.text);
    assert_eq!(engine.pending_partial(&session), Some(r#"<mxCell id="2" value="A"#));

    let reply = engine.append(&session, r#"" vertex="1"/>"#).expect("append");
    assert_eq!(reply.status, ReplyStatus::Committed, "{}", reply.text);
}

#[rstest]
fn append_without_pending_display_fails(mut displayed: DiagramEngine, session: SessionId) {
    let reply = displayed.append(&session, r#"<mxCell id="9"/>"#).expect("append");

    assert_eq!(reply.status, ReplyStatus::Failed(FailureKind::NoPendingPartial));
    assert_eq!(reply.rev, Some(1));
}

#[rstest]
fn failed_validation_after_assembly_discards_the_partial(
    mut engine: DiagramEngine,
    session: SessionId,
) {
    engine.display(&session, r#"<mxCell id="2" value="A"#).expect("display");
    let reply = engine.append(&session, r#"" vertex="1" edge="1"/>"#).expect("append");

    assert_eq!(reply.status, ReplyStatus::Failed(FailureKind::Structural));
    assert!(reply.text.contains("discarded"), "{}", reply.text);
    assert!(!engine.has_pending_partial(&session));
}

#[rstest]
fn new_display_discards_pending_partial(mut engine: DiagramEngine, session: SessionId) {
    engine.display(&session, r#"<mxCell id="2" value="old"#).expect("display");
    let reply = engine.display(&session, r#"<mxCell id="5" vertex="1" parent="1"/>"#).expect("display");

    assert_eq!(reply.status, ReplyStatus::Committed);
    assert!(!engine.has_pending_partial(&session));
    assert!(engine.document(&session).expect("doc").contains("5"));
}

#[rstest]
fn edit_delete_cascades(mut displayed: DiagramEngine, session: SessionId) {
    let reply = displayed.edit(&session, &[EditRequest::delete("2")]).expect("edit");

    assert_eq!(reply.status, ReplyStatus::Edited);
    assert!(reply.text.contains("Removed: '2', '3', '4'"), "{}", reply.text);
    assert!(displayed.document(&session).expect("doc").is_empty());
    assert_eq!(reply.rev, Some(2));
}

#[rstest]
fn edit_reports_each_failure_with_context(mut displayed: DiagramEngine, session: SessionId) {
    let reply = displayed
        .edit(
            &session,
            &[
                EditRequest::update("33", r#"<mxCell id="33" vertex="1" parent="1"/>"#),
                EditRequest::add("5", r#"<mxCell id="5" value="ok" vertex="1" parent="1"/>"#),
                EditRequest::add("3", r#"<mxCell id="3" vertex="1" parent="1"/>"#),
                EditRequest { operation: EditOperation::Add, cell_id: "6".to_owned(), new_xml: None },
            ],
        )
        .expect("edit");

    assert_eq!(reply.status, ReplyStatus::Failed(FailureKind::IdConflict));
    assert!(reply.text.contains("3 of 4 operations failed; 1 applied"), "{}", reply.text);
    assert!(reply.text.contains("#0 update '33'"), "{}", reply.text);
    assert!(reply.text.contains("Did you mean '3'"), "{}", reply.text);
    assert!(reply.text.contains("#2 add '3'"), "{}", reply.text);
    assert!(reply.text.contains("Next free id: \"6\""), "{}", reply.text);
    assert!(reply.text.contains("#3 add '6': add requires new_xml"), "{}", reply.text);
    assert!(reply.text.contains(r#"<mxCell id="5" value="ok""#), "{}", reply.text);
    assert!(displayed.document(&session).expect("doc").contains("5"));
}

#[rstest]
fn edit_before_display_starts_from_an_empty_document(
    mut engine: DiagramEngine,
    session: SessionId,
) {
    let reply = engine
        .edit(&session, &[EditRequest::add("new1", r#"<mxCell id="new1" vertex="1"/>"#)])
        .expect("edit");

    assert_eq!(reply.status, ReplyStatus::Edited, "{}", reply.text);
    let cell = engine.document(&session).and_then(|doc| doc.get("new1")).expect("cell");
    assert_eq!(cell.parent(), Some(&CellId::layer()));
}

#[rstest]
fn edit_with_invalid_id_is_reported(mut displayed: DiagramEngine, session: SessionId) {
    let reply = displayed.edit(&session, &[EditRequest::delete(" ")]).expect("edit");

    assert_eq!(reply.status, ReplyStatus::Failed(FailureKind::Structural));
    assert_eq!(reply.rev, Some(1));
}

#[rstest]
fn sessions_are_independent(mut displayed: DiagramEngine, session: SessionId) {
    let other = sid("other");
    displayed.display(&other, r#"<mxCell id="2" value="A"#).expect("display");

    assert!(displayed.has_pending_partial(&other));
    assert!(!displayed.has_pending_partial(&session));
    assert_eq!(displayed.document(&session).map(Document::len), Some(3));
}

#[rstest]
fn load_accepts_wrapped_and_bare_documents(mut engine: DiagramEngine, session: SessionId) {
    let wrapped = r#"<mxfile><diagram name="P"><mxGraphModel><root>
        <mxCell id="0"/><mxCell id="1" parent="0"/>
        <mxCell id="a" value="A" vertex="1" parent="1"/>
    </root></mxGraphModel></diagram></mxfile>"#;
    let reply = engine.load_document(&session, wrapped).expect("load");
    assert_eq!(reply.status, ReplyStatus::Committed, "{}", reply.text);
    assert_eq!(engine.document(&session).map(Document::len), Some(1));

    let reply = engine.load_document(&session, THREE_CELLS).expect("load");
    assert_eq!(reply.status, ReplyStatus::Committed, "{}", reply.text);
    assert!(reply.text.contains("wrapped"), "{}", reply.text);
    assert_eq!(reply.rev, Some(2));
}

#[rstest]
fn load_rejects_broken_documents(mut engine: DiagramEngine, session: SessionId) {
    let reply = engine.load_document(&session, "<mxfile><diagram/></mxfile>").expect("load");
    assert_eq!(reply.status, ReplyStatus::Failed(FailureKind::Parse));
    assert_eq!(engine.document(&session), None);
}

#[rstest]
fn current_xml_wraps_the_document(displayed: DiagramEngine, session: SessionId) {
    let snapshot = displayed.current_xml(&session);

    assert_eq!(snapshot.rev, 1);
    assert_eq!(snapshot.cells, 3);
    assert!(snapshot.xml.contains(r#"<diagram name="Page-1""#), "{}", snapshot.xml);
    assert!(snapshot.xml.contains(r#"<mxCell id="1" parent="0" />"#));
}

#[rstest]
fn current_xml_of_unknown_session_is_an_empty_skeleton(engine: DiagramEngine) {
    let snapshot = engine.current_xml(&sid("nobody"));
    assert_eq!(snapshot.cells, 0);
    assert!(snapshot.xml.contains(r#"<mxCell id="0" />"#));
}

#[rstest]
fn suggestions_rank_closest_ids_first(displayed: DiagramEngine, session: SessionId) {
    let document = displayed.document(&session).expect("doc");
    let suggestions = suggest_cell_ids(document, "33", 3);
    assert_eq!(suggestions.first().map(|id| id.as_str()), Some("3"));
    assert!(suggest_cell_ids(document, "zzzzzz", 3).is_empty());
}

#[rstest]
fn multi_line_labels_keep_their_line_breaks(mut engine: DiagramEngine, session: SessionId) {
    let reply = engine
        .display(&session, r#"<mxCell id="2" value="line1&#xa;line2" vertex="1" parent="1"/>"#)
        .expect("display");
    assert_eq!(reply.status, ReplyStatus::Committed, "{}", reply.text);

    let xml = engine.current_xml(&session).xml;
    assert!(xml.contains(r#"value="line1&#xa;line2""#), "{xml}");
    let cell = engine.document(&session).and_then(|document| document.get("2")).expect("cell 2");
    assert_eq!(cell.value(), Some("line1\nline2"));
}

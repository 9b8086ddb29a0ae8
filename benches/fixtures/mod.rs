// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Cellweave-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Cellweave and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

#![allow(dead_code)]

// Shared deterministic benchmark fixtures (no RNG).

use std::fmt::Write as _;

use cellweave::model::Document;
use cellweave::validate::{build_document, check_fragment};

#[derive(Debug, Clone, Copy)]
pub enum Case {
    /// 4 containers x 5 children.
    Small,
    /// 40 containers x 10 children.
    Medium,
    /// 200 containers x 20 children, long labels.
    LargeLongLabels,
}

impl Case {
    pub fn id(self) -> &'static str {
        match self {
            Self::Small => "small",
            Self::Medium => "medium",
            Self::LargeLongLabels => "large_long_labels",
        }
    }

    fn shape(self) -> (usize, usize, usize) {
        match self {
            Self::Small => (4, 5, 8),
            Self::Medium => (40, 10, 16),
            Self::LargeLongLabels => (200, 20, 120),
        }
    }
}

/// Bare cell list: each container holds a chain of children joined by edges, and a
/// top-level edge links consecutive containers.
pub fn fragment(case: Case) -> String {
    let (containers, children, label_len) = case.shape();
    let mut out = String::with_capacity(containers * children * (label_len + 160));
    let mut next_id = 2usize;

    let mut previous_container = None;
    for container in 0..containers {
        let container_id = next_id;
        next_id += 1;
        let _ = write!(
            out,
            r#"<mxCell id="{container_id}" value="{}" style="swimlane;" vertex="1" parent="1"><mxGeometry x="{}" y="0" width="200" height="400" as="geometry"/></mxCell>"#,
            label(container, label_len),
            container * 240,
        );

        let mut previous_child = None;
        for child in 0..children {
            let child_id = next_id;
            next_id += 1;
            let _ = write!(
                out,
                r#"<mxCell id="{child_id}" value="{}" style="rounded=1;" vertex="1" parent="{container_id}"><mxGeometry x="20" y="{}" width="160" height="30" as="geometry"/></mxCell>"#,
                label(child, label_len),
                40 + child * 36,
            );
            if let Some(source) = previous_child {
                let edge_id = next_id;
                next_id += 1;
                let _ = write!(
                    out,
                    r#"<mxCell id="{edge_id}" edge="1" parent="{container_id}" source="{source}" target="{child_id}"><mxGeometry relative="1" as="geometry"/></mxCell>"#,
                );
            }
            previous_child = Some(child_id);
        }

        if let Some(source) = previous_container {
            let edge_id = next_id;
            next_id += 1;
            let _ = write!(
                out,
                r#"<mxCell id="{edge_id}" edge="1" parent="1" source="{source}" target="{container_id}"><mxGeometry relative="1" as="geometry"/></mxCell>"#,
            );
        }
        previous_container = Some(container_id);
    }
    out
}

pub fn document(case: Case) -> Document {
    let markup = fragment(case);
    let checked = check_fragment(&markup).expect("fixture fragment is valid");
    build_document(&checked).expect("fixture document is consistent")
}

/// First container id of every fixture.
pub fn first_container_id() -> &'static str {
    "2"
}

fn label(index: usize, target_len: usize) -> String {
    let mut label = format!("Step {index}");
    while label.len() < target_len {
        label.push_str(" lorem");
    }
    label.truncate(target_len.max(6));
    label
}

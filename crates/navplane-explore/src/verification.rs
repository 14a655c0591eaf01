//! Phase 2c: node verification suggestion + approval (spec.md §4.5),
//! grounded in `phases/verification_manager.py`. The reference-store
//! indirection the original uses for TV text verifications
//! (`save_reference` then a `waitForTextToAppear` verification pointing at
//! it) is collapsed here into attaching the verification directly, since
//! `PersistenceBackend` doesn't model a separate reference store
//! (DESIGN.md Open Questions).

use navplane_core::{NodeId, Verification};
use serde::{Deserialize, Serialize};

/// One accumulated validation-time capture, stashed per node while
/// `validate_next_item` runs (spec.md §4.5 phase 2b step 3).
#[derive(Clone, Debug, Serialize)]
pub struct NodeVerificationData {
    pub node_id: NodeId,
    pub node_label: String,
    pub screenshot_url: String,
}

/// A proposed verification for one node, built from its capture
/// (spec.md §4.5 phase 2c `start_node_verification`).
#[derive(Clone, Debug, Serialize)]
pub struct VerificationSuggestion {
    pub node_id: NodeId,
    pub node_label: String,
    pub command: String,
    pub verification_type: String,
    pub params: serde_json::Value,
    pub screenshot_url: String,
}

/// The operator's decision for one node (spec.md §4.5 phase 2c
/// `approve_node_verifications`).
#[derive(Clone, Debug, Deserialize)]
pub struct ApprovedVerification {
    pub node_id: NodeId,
    pub command: String,
    pub verification_type: String,
    pub params: serde_json::Value,
}

/// Builds one suggestion per captured node: a click strategy gets an
/// element-existence check against the node's own label; a dpad strategy
/// gets a `waitForTextToAppear` check seeded with the node's label as the
/// text to look for (spec.md §4.5 "derived from OCR" — simplified here
/// since this crate doesn't run OCR itself, see DESIGN.md).
pub fn suggest_verifications(captures: &[NodeVerificationData], is_dpad: bool) -> Vec<VerificationSuggestion> {
    captures
        .iter()
        .map(|c| {
            if is_dpad {
                VerificationSuggestion {
                    node_id: c.node_id.clone(),
                    node_label: c.node_label.clone(),
                    command: "waitForTextToAppear".to_string(),
                    verification_type: "text".to_string(),
                    params: serde_json::json!({"text": c.node_label, "area": serde_json::Value::Null}),
                    screenshot_url: c.screenshot_url.clone(),
                }
            } else {
                VerificationSuggestion {
                    node_id: c.node_id.clone(),
                    node_label: c.node_label.clone(),
                    command: "element_exists".to_string(),
                    verification_type: "image".to_string(),
                    params: serde_json::json!({"reference": c.node_label}),
                    screenshot_url: c.screenshot_url.clone(),
                }
            }
        })
        .collect()
}

/// Skips invalid approvals (empty command or empty params object), per
/// spec.md §4.5 "Skip invalid verifications (empty params, empty
/// command)".
pub fn to_verification(approved: &ApprovedVerification) -> Option<Verification> {
    if approved.command.is_empty() {
        return None;
    }
    if approved.params.is_null() || approved.params == serde_json::json!({}) {
        return None;
    }
    Some(Verification {
        command: approved.command.clone(),
        verification_type: approved.verification_type.clone(),
        params: approved.params.clone(),
        expected: approved.params.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn capture(id: &str) -> NodeVerificationData {
        NodeVerificationData { node_id: id.into(), node_label: id.to_string(), screenshot_url: "memory://x.png".into() }
    }

    #[test]
    fn dpad_suggestions_use_wait_for_text() {
        let suggestions = suggest_verifications(&[capture("tv_guide")], true);
        assert_eq!(suggestions[0].command, "waitForTextToAppear");
    }

    #[test]
    fn click_suggestions_use_element_exists() {
        let suggestions = suggest_verifications(&[capture("settings")], false);
        assert_eq!(suggestions[0].command, "element_exists");
    }

    #[test]
    fn empty_command_is_skipped() {
        let approved = ApprovedVerification {
            node_id: "n1".into(),
            command: String::new(),
            verification_type: "image".into(),
            params: serde_json::json!({"reference": "x"}),
        };
        assert!(to_verification(&approved).is_none());
    }

    #[test]
    fn empty_params_is_skipped() {
        let approved = ApprovedVerification {
            node_id: "n1".into(),
            command: "element_exists".into(),
            verification_type: "image".into(),
            params: serde_json::json!({}),
        };
        assert!(to_verification(&approved).is_none());
    }

    #[test]
    fn valid_approval_converts() {
        let approved = ApprovedVerification {
            node_id: "n1".into(),
            command: "element_exists".into(),
            verification_type: "image".into(),
            params: serde_json::json!({"reference": "settings"}),
        };
        assert!(to_verification(&approved).is_some());
    }
}

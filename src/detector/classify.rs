//! Record classifiers (C1): pure structural predicates over a generic record.
//!
//! Store names are opaque; these predicates are the schema-version-independent
//! definition of what counts as each entity kind.

use crate::model::attribute_map::{has_key, AttributeMap};
use crate::model::attribute_map::get_str;

const STATE_TYPES: &[&str] = &["started", "unstarted", "completed", "canceled", "backlog"];

pub fn is_issue_record(r: &AttributeMap) -> bool {
    has_key(r, "number") && has_key(r, "teamId") && has_key(r, "stateId") && has_key(r, "title")
}

pub fn is_user_record(r: &AttributeMap) -> bool {
    has_key(r, "name") && has_key(r, "displayName") && has_key(r, "email")
}

pub fn is_team_record(r: &AttributeMap) -> bool {
    if !(has_key(r, "key") && has_key(r, "name")) {
        return false;
    }
    match get_str(r, "key") {
        Some(key) => is_valid_team_key(key),
        None => false,
    }
}

pub fn is_valid_team_key(key: &str) -> bool {
    let len = key.chars().count();
    (1..=10).contains(&len) && key.chars().all(|c| c.is_ascii_uppercase())
}

pub fn is_workflow_state_record(r: &AttributeMap) -> bool {
    if !(has_key(r, "name") && has_key(r, "type") && has_key(r, "color") && has_key(r, "teamId")) {
        return false;
    }
    matches!(get_str(r, "type"), Some(t) if STATE_TYPES.contains(&t))
}

pub fn is_comment_record(r: &AttributeMap) -> bool {
    has_key(r, "issueId") && has_key(r, "userId") && has_key(r, "bodyData") && has_key(r, "createdAt")
}

pub fn is_project_record(r: &AttributeMap) -> bool {
    has_key(r, "name")
        && has_key(r, "teamIds")
        && has_key(r, "slugId")
        && has_key(r, "statusId")
        && has_key(r, "memberIds")
}

pub fn is_issue_content_record(r: &AttributeMap) -> bool {
    has_key(r, "issueId") && has_key(r, "contentState")
}

pub fn is_label_record(r: &AttributeMap) -> bool {
    has_key(r, "name") && has_key(r, "color") && has_key(r, "isGroup")
}

pub fn is_initiative_record(r: &AttributeMap) -> bool {
    has_key(r, "name") && has_key(r, "ownerId") && has_key(r, "slugId") && has_key(r, "frequencyResolution")
}

pub fn is_project_status_record(r: &AttributeMap) -> bool {
    has_key(r, "name")
        && has_key(r, "color")
        && has_key(r, "position")
        && has_key(r, "type")
        && has_key(r, "indefinite")
        && !has_key(r, "teamId")
}

pub fn is_cycle_record(r: &AttributeMap) -> bool {
    has_key(r, "number") && has_key(r, "teamId") && has_key(r, "startsAt") && has_key(r, "endsAt")
}

pub fn is_document_record(r: &AttributeMap) -> bool {
    has_key(r, "title")
        && has_key(r, "slugId")
        && has_key(r, "projectId")
        && has_key(r, "sortOrder")
        && !has_key(r, "number")
        && !has_key(r, "stateId")
}

pub fn is_document_content_record(r: &AttributeMap) -> bool {
    has_key(r, "documentContentId") && has_key(r, "contentData")
}

pub fn is_milestone_record(r: &AttributeMap) -> bool {
    has_key(r, "name")
        && has_key(r, "projectId")
        && has_key(r, "sortOrder")
        && (has_key(r, "currentProgress") || has_key(r, "targetDate"))
}

pub fn is_project_update_record(r: &AttributeMap) -> bool {
    has_key(r, "body") && (has_key(r, "projectId") || has_key(r, "health")) && !has_key(r, "issueId")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(v: serde_json::Value) -> AttributeMap {
        v.as_object().unwrap().clone()
    }

    #[test]
    fn issue_record_valid() {
        let r = map(json!({"number": 1, "teamId": "T1", "stateId": "S1", "title": "x"}));
        assert!(is_issue_record(&r));
    }

    #[test]
    fn issue_record_missing_each_field() {
        let full = json!({"number": 1, "teamId": "T1", "stateId": "S1", "title": "x"});
        for key in ["number", "teamId", "stateId", "title"] {
            let mut v = full.clone();
            v.as_object_mut().unwrap().remove(key);
            assert!(!is_issue_record(&map(v)), "missing {key} should fail");
        }
    }

    #[test]
    fn user_record_valid() {
        let r = map(json!({"name": "a", "displayName": "A", "email": "a@x.com"}));
        assert!(is_user_record(&r));
    }

    #[test]
    fn user_record_missing_each_field() {
        let full = json!({"name": "a", "displayName": "A", "email": "a@x.com"});
        for key in ["name", "displayName", "email"] {
            let mut v = full.clone();
            v.as_object_mut().unwrap().remove(key);
            assert!(!is_user_record(&map(v)));
        }
    }

    #[test]
    fn team_key_boundaries() {
        assert!(is_valid_team_key("A"));
        assert!(is_valid_team_key("ENGINEERIN"));
        assert!(!is_valid_team_key("ENGINEERING"));
        assert!(!is_valid_team_key(""));
        assert!(!is_valid_team_key("eng"));
    }

    #[test]
    fn team_record_requires_valid_key() {
        let ok = map(json!({"key": "ENG", "name": "Engineering"}));
        assert!(is_team_record(&ok));
        let bad = map(json!({"key": "engineering-team", "name": "Engineering"}));
        assert!(!is_team_record(&bad));
    }

    #[test]
    fn workflow_state_vs_project_status() {
        let state = map(json!({"name": "Todo", "type": "unstarted", "color": "#fff", "teamId": "T1"}));
        assert!(is_workflow_state_record(&state));
        assert!(!is_project_status_record(&state));

        let status = map(json!({"name": "Planned", "color": "#fff", "position": 1, "type": "planned", "indefinite": false}));
        assert!(is_project_status_record(&status));
        assert!(!is_workflow_state_record(&status));
    }

    #[test]
    fn document_vs_issue() {
        let doc = map(json!({"title": "Doc", "slugId": "d1", "projectId": "P1", "sortOrder": 1.0}));
        assert!(is_document_record(&doc));

        let mut with_number = doc.clone();
        with_number.insert("number".into(), json!(5));
        assert!(!is_document_record(&with_number));

        let mut with_state = doc.clone();
        with_state.insert("stateId".into(), json!("S1"));
        assert!(!is_document_record(&with_state));
    }

    #[test]
    fn project_update_excludes_issue_comments() {
        let update = map(json!({"body": "hi", "health": "onTrack", "projectId": "P1"}));
        assert!(is_project_update_record(&update));

        let mut with_issue = update.clone();
        with_issue.insert("issueId".into(), json!("I1"));
        assert!(!is_project_update_record(&with_issue));
    }

    #[test]
    fn milestone_requires_progress_or_target_date() {
        let neither = map(json!({"name": "M1", "projectId": "P1", "sortOrder": 1.0}));
        assert!(!is_milestone_record(&neither));
        let with_target = map(json!({"name": "M1", "projectId": "P1", "sortOrder": 1.0, "targetDate": "2026-01-01"}));
        assert!(is_milestone_record(&with_target));
    }
}

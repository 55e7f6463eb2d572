//! Builds typed entities out of classified records. Unknown/missing optional
//! fields default rather than fail the whole load — a malformed single
//! record should degrade that record, not the snapshot.

use crate::model::attribute_map::{get_bool, get_i64, get_str, get_str_array, AttributeMap};
use crate::model::entities::*;
use serde_json::Value;

fn id_of(r: &AttributeMap) -> Id {
    get_str(r, "id").unwrap_or_default().to_string()
}

fn s(r: &AttributeMap, key: &str) -> String {
    get_str(r, key).unwrap_or_default().to_string()
}

fn opt_s(r: &AttributeMap, key: &str) -> Option<String> {
    get_str(r, key).map(str::to_owned)
}

fn f64_of(r: &AttributeMap, key: &str) -> f64 {
    r.get(key).and_then(Value::as_f64).unwrap_or(0.0)
}

pub fn team(r: &AttributeMap) -> Team {
    Team {
        id: id_of(r),
        key: s(r, "key"),
        name: s(r, "name"),
        description: opt_s(r, "description"),
        organization_id: s(r, "organizationId"),
        raw: r.clone(),
    }
}

pub fn user(r: &AttributeMap) -> User {
    User {
        id: id_of(r),
        name: s(r, "name"),
        display_name: s(r, "displayName"),
        email: s(r, "email"),
        organization_id: s(r, "organizationId"),
        user_account_id: opt_s(r, "userAccountId"),
        raw: r.clone(),
    }
}

pub fn workflow_state(r: &AttributeMap) -> WorkflowState {
    WorkflowState {
        id: id_of(r),
        name: s(r, "name"),
        state_type: s(r, "type"),
        color: opt_s(r, "color"),
        position: f64_of(r, "position"),
        team_id: s(r, "teamId"),
        raw: r.clone(),
    }
}

/// `description` is filled in afterwards from the decoded issue-content
/// store, if present.
pub fn issue(r: &AttributeMap) -> Issue {
    Issue {
        id: id_of(r),
        identifier: opt_s(r, "identifier").unwrap_or_default(),
        title: s(r, "title"),
        description: None,
        priority: get_i64(r, "priority"),
        estimate: r.get("estimate").and_then(Value::as_f64),
        team_id: s(r, "teamId"),
        state_id: s(r, "stateId"),
        assignee_id: opt_s(r, "assigneeId"),
        project_id: opt_s(r, "projectId"),
        due_date: opt_s(r, "dueDate"),
        created_at: s(r, "createdAt"),
        updated_at: s(r, "updatedAt"),
        raw: r.clone(),
    }
}

/// `body` must be filled by the caller after decoding `bodyData`.
pub fn comment(r: &AttributeMap, body: String) -> Comment {
    Comment {
        id: id_of(r),
        issue_id: s(r, "issueId"),
        user_id: s(r, "userId"),
        body,
        created_at: s(r, "createdAt"),
        updated_at: s(r, "updatedAt"),
        raw: r.clone(),
    }
}

pub fn project(r: &AttributeMap) -> Project {
    Project {
        id: id_of(r),
        name: s(r, "name"),
        slug_id: s(r, "slugId"),
        state: s(r, "state"),
        description: opt_s(r, "description"),
        start_date: opt_s(r, "startDate"),
        target_date: opt_s(r, "targetDate"),
        team_ids: get_str_array(r, "teamIds"),
        lead_id: opt_s(r, "leadId"),
        member_ids: get_str_array(r, "memberIds"),
        status_id: opt_s(r, "statusId"),
        raw: r.clone(),
    }
}

pub fn label(r: &AttributeMap) -> Label {
    Label {
        id: id_of(r),
        name: s(r, "name"),
        color: opt_s(r, "color"),
        is_group: get_bool(r, "isGroup").unwrap_or(false),
        team_id: opt_s(r, "teamId"),
        raw: r.clone(),
    }
}

pub fn initiative(r: &AttributeMap) -> Initiative {
    Initiative {
        id: id_of(r),
        name: s(r, "name"),
        slug_id: s(r, "slugId"),
        color: opt_s(r, "color"),
        status: s(r, "status"),
        owner_id: opt_s(r, "ownerId"),
        team_ids: get_str_array(r, "teamIds"),
        created_at: s(r, "createdAt"),
        updated_at: s(r, "updatedAt"),
        raw: r.clone(),
    }
}

pub fn project_status(r: &AttributeMap) -> ProjectStatus {
    ProjectStatus {
        id: id_of(r),
        name: s(r, "name"),
        color: opt_s(r, "color"),
        position: f64_of(r, "position"),
        status_type: s(r, "type"),
        indefinite: get_bool(r, "indefinite").unwrap_or(false),
        raw: r.clone(),
    }
}

fn progress(v: Option<&Value>) -> Option<Progress> {
    let obj = v?.as_object()?;
    Some(Progress {
        completed_issue_count: obj.get("completedIssueCount").and_then(Value::as_i64).unwrap_or(0),
        started_issue_count: obj.get("startedIssueCount").and_then(Value::as_i64).unwrap_or(0),
        unstarted_issue_count: obj.get("unstartedIssueCount").and_then(Value::as_i64).unwrap_or(0),
        scope_count: obj.get("scopeCount").and_then(Value::as_i64).unwrap_or(0),
    })
}

pub fn cycle(r: &AttributeMap) -> Cycle {
    Cycle {
        id: id_of(r),
        number: get_i64(r, "number").unwrap_or_default(),
        team_id: s(r, "teamId"),
        starts_at: s(r, "startsAt"),
        ends_at: s(r, "endsAt"),
        completed_at: opt_s(r, "completedAt"),
        current_progress: progress(r.get("currentProgress")),
        raw: r.clone(),
    }
}

/// `title` is filled in afterwards from the decoded document-content store,
/// but for documents the description is not part of §3's field list, so the
/// content store only affects any pass-through presentation in `raw`.
pub fn document(r: &AttributeMap) -> Document {
    Document {
        id: id_of(r),
        title: s(r, "title"),
        slug_id: s(r, "slugId"),
        project_id: opt_s(r, "projectId"),
        creator_id: opt_s(r, "creatorId"),
        sort_order: f64_of(r, "sortOrder"),
        created_at: s(r, "createdAt"),
        updated_at: s(r, "updatedAt"),
        raw: r.clone(),
    }
}

pub fn milestone(r: &AttributeMap) -> Milestone {
    Milestone {
        id: id_of(r),
        name: s(r, "name"),
        project_id: s(r, "projectId"),
        sort_order: f64_of(r, "sortOrder"),
        target_date: opt_s(r, "targetDate"),
        current_progress: progress(r.get("currentProgress")),
        raw: r.clone(),
    }
}

pub fn project_update(r: &AttributeMap) -> ProjectUpdate {
    ProjectUpdate {
        id: id_of(r),
        body: s(r, "body"),
        health: s(r, "health"),
        project_id: s(r, "projectId"),
        user_id: s(r, "userId"),
        created_at: s(r, "createdAt"),
        updated_at: s(r, "updatedAt"),
        raw: r.clone(),
    }
}

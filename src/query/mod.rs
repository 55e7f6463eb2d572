//! Query primitives (C6): fuzzy lookups and small helper accessors over a
//! snapshot. Lookups never raise — missing references resolve to the
//! documented sentinels ("Unknown"/"Unassigned"/"").

use crate::model::entities::*;
use crate::snapshot::Snapshot;
use std::collections::HashMap;

fn eq_ci(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn starts_with_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().starts_with(&needle.to_lowercase())
}

pub fn find_team<'a>(snapshot: &'a Snapshot, query: &str) -> Option<&'a Team> {
    if let Some(t) = snapshot.teams.values().find(|t| eq_ci(&t.key, query)) {
        return Some(t);
    }
    snapshot.teams.values().find(|t| contains_ci(&t.name, query))
}

pub fn find_project<'a>(snapshot: &'a Snapshot, query: &str) -> Option<&'a Project> {
    if let Some(p) = snapshot.projects.values().find(|p| eq_ci(&p.slug_id, query)) {
        return Some(p);
    }
    if let Some(p) = snapshot.projects.values().find(|p| starts_with_ci(&p.name, query)) {
        return Some(p);
    }
    snapshot.projects.values().find(|p| contains_ci(&p.name, query))
}

pub fn find_user<'a>(snapshot: &'a Snapshot, query: &str) -> Option<&'a User> {
    if query.is_empty() {
        return None;
    }
    if let Some(u) = snapshot.users.values().find(|u| starts_with_ci(&u.name, query)) {
        return Some(u);
    }
    if let Some(u) = snapshot.users.values().find(|u| contains_ci(&u.name, query)) {
        return Some(u);
    }
    if let Some(u) = snapshot.users.values().find(|u| starts_with_ci(&u.display_name, query)) {
        return Some(u);
    }
    snapshot.users.values().find(|u| contains_ci(&u.display_name, query))
}

pub fn find_initiative<'a>(snapshot: &'a Snapshot, query: &str) -> Option<&'a Initiative> {
    if let Some(i) = snapshot.initiatives.values().find(|i| eq_ci(&i.slug_id, query)) {
        return Some(i);
    }
    snapshot.initiatives.values().find(|i| contains_ci(&i.name, query))
}

pub fn find_document<'a>(snapshot: &'a Snapshot, query: &str) -> Option<&'a Document> {
    if let Some(d) = snapshot.documents.values().find(|d| eq_ci(&d.slug_id, query)) {
        return Some(d);
    }
    snapshot.documents.values().find(|d| contains_ci(&d.title, query))
}

pub fn find_issue_status<'a>(snapshot: &'a Snapshot, team_id: &str, query: &str) -> Option<&'a WorkflowState> {
    let in_team = || snapshot.workflow_states.values().filter(|s| s.team_id == team_id);
    if let Some(s) = in_team().find(|s| eq_ci(&s.id, query)) {
        return Some(s);
    }
    if let Some(s) = in_team().find(|s| eq_ci(&s.name, query)) {
        return Some(s);
    }
    if let Some(s) = in_team().find(|s| starts_with_ci(&s.name, query)) {
        return Some(s);
    }
    in_team().find(|s| contains_ci(&s.name, query))
}

pub fn find_milestone<'a>(snapshot: &'a Snapshot, project_id: &str, query: &str) -> Option<&'a Milestone> {
    let in_project = || snapshot.milestones.values().filter(|m| m.project_id == project_id);
    if let Some(m) = in_project().find(|m| eq_ci(&m.id, query)) {
        return Some(m);
    }
    if let Some(m) = in_project().find(|m| eq_ci(&m.name, query)) {
        return Some(m);
    }
    if let Some(m) = in_project().find(|m| starts_with_ci(&m.name, query)) {
        return Some(m);
    }
    in_project().find(|m| contains_ci(&m.name, query))
}

/// Exact, case-insensitive; no trimming, no substring.
pub fn get_issue_by_identifier<'a>(snapshot: &'a Snapshot, identifier: &str) -> Option<&'a Issue> {
    snapshot.issues.values().find(|i| eq_ci(&i.identifier, identifier))
}

pub fn get_state_name(snapshot: &Snapshot, state_id: &str) -> String {
    snapshot
        .workflow_states
        .get(state_id)
        .map(|s| s.name.clone())
        .unwrap_or_else(|| "Unknown".to_string())
}

pub fn get_state_type(snapshot: &Snapshot, state_id: &str) -> String {
    snapshot
        .workflow_states
        .get(state_id)
        .map(|s| s.state_type.clone())
        .unwrap_or_else(|| "unknown".to_string())
}

pub fn get_user_name(snapshot: &Snapshot, user_id: Option<&str>) -> String {
    let Some(id) = user_id else { return "Unassigned".to_string() };
    match snapshot.users.get(id) {
        Some(u) if !u.name.is_empty() => u.name.clone(),
        Some(u) => u.display_name.clone(),
        None => "Unknown".to_string(),
    }
}

pub fn get_project_name(snapshot: &Snapshot, project_id: Option<&str>) -> String {
    project_id
        .and_then(|id| snapshot.projects.get(id))
        .map(|p| p.name.clone())
        .unwrap_or_default()
}

pub fn issue_count_for_team(snapshot: &Snapshot, team_id: &str) -> usize {
    snapshot.issues.values().filter(|i| i.team_id == team_id).count()
}

pub fn issue_count_for_user(snapshot: &Snapshot, user_id: &str) -> usize {
    snapshot.issues.values().filter(|i| i.assignee_id.as_deref() == Some(user_id)).count()
}

pub fn issue_count_for_project(snapshot: &Snapshot, project_id: &str) -> usize {
    snapshot.issues.values().filter(|i| i.project_id.as_deref() == Some(project_id)).count()
}

fn state_histogram<'a>(issues: impl Iterator<Item = &'a Issue>) -> HashMap<String, usize> {
    let mut histogram = HashMap::new();
    for issue in issues {
        *histogram.entry(issue.state_id.clone()).or_insert(0) += 1;
    }
    histogram
}

pub fn state_histogram_for_team(snapshot: &Snapshot, team_id: &str) -> HashMap<String, usize> {
    state_histogram(snapshot.issues.values().filter(|i| i.team_id == team_id))
}

pub fn state_histogram_for_user(snapshot: &Snapshot, user_id: &str) -> HashMap<String, usize> {
    state_histogram(snapshot.issues.values().filter(|i| i.assignee_id.as_deref() == Some(user_id)))
}

pub fn state_histogram_for_project(snapshot: &Snapshot, project_id: &str) -> HashMap<String, usize> {
    state_histogram(snapshot.issues.values().filter(|i| i.project_id.as_deref() == Some(project_id)))
}

pub fn cycles_for_team<'a>(snapshot: &'a Snapshot, team_id: &str) -> Vec<&'a Cycle> {
    let mut cycles: Vec<&Cycle> = snapshot.cycles.values().filter(|c| c.team_id == team_id).collect();
    cycles.sort_by(|a, b| b.number.cmp(&a.number));
    cycles
}

pub fn milestones_for_project<'a>(snapshot: &'a Snapshot, project_id: &str) -> Vec<&'a Milestone> {
    let mut milestones: Vec<&Milestone> = snapshot.milestones.values().filter(|m| m.project_id == project_id).collect();
    milestones.sort_by(|a, b| a.sort_order.partial_cmp(&b.sort_order).unwrap_or(std::cmp::Ordering::Equal));
    milestones
}

/// Comments for `issue_id` in `comments_by_issue` order (already ascending by
/// `createdAt`), dropping any id that no longer resolves.
pub fn get_comments_for_issue<'a>(snapshot: &'a Snapshot, issue_id: &str) -> Vec<&'a Comment> {
    snapshot
        .comments_by_issue
        .get(issue_id)
        .map(|ids| ids.iter().filter_map(|id| snapshot.comments.get(id)).collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Team;
    use serde_json::json;

    fn team(id: &str, key: &str, name: &str) -> Team {
        Team {
            id: id.into(),
            key: key.into(),
            name: name.into(),
            description: None,
            organization_id: "ORG1".into(),
            raw: json!({}).as_object().unwrap().clone(),
        }
    }

    #[test]
    fn find_team_exact_key_before_name_substring() {
        let mut snapshot = Snapshot::empty();
        snapshot.teams.insert("T1".into(), team("T1", "ENG", "Engineering"));
        snapshot.teams.insert("T2".into(), team("T2", "DEV", "eng-collab"));

        let found = find_team(&snapshot, "eng").unwrap();
        assert_eq!(found.id, "T1", "exact key match wins over a substring match elsewhere");
    }

    #[test]
    fn get_issue_by_identifier_is_case_insensitive_no_trim() {
        let mut snapshot = Snapshot::empty();
        snapshot.issues.insert(
            "I1".into(),
            Issue {
                id: "I1".into(),
                identifier: "DEV-1".into(),
                title: "Fix bug".into(),
                description: None,
                priority: None,
                estimate: None,
                team_id: "T1".into(),
                state_id: "S1".into(),
                assignee_id: None,
                project_id: None,
                due_date: None,
                created_at: "2026-01-01".into(),
                updated_at: "2026-01-02".into(),
                raw: json!({}).as_object().unwrap().clone(),
            },
        );
        assert!(get_issue_by_identifier(&snapshot, "dev-1").is_some());
        assert!(get_issue_by_identifier(&snapshot, " dev-1").is_none(), "no trimming");
    }

    #[test]
    fn get_user_name_sentinels() {
        let snapshot = Snapshot::empty();
        assert_eq!(get_user_name(&snapshot, None), "Unassigned");
        assert_eq!(get_user_name(&snapshot, Some("missing")), "Unknown");
    }
}

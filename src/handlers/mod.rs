//! Local handlers (C7): one function per logical tool, pure over a snapshot.
//! Each either returns a concrete result or declares
//! [`LocalFallbackRequested`], which the router catches and turns into a
//! remote call.

pub mod args;
pub mod views;

use crate::query;
use crate::snapshot::Snapshot;
use args::*;
use thiserror::Error;
use views::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackCode {
    UnsupportedType,
    UnsupportedFilter,
}

impl std::fmt::Display for FallbackCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FallbackCode::UnsupportedType => "unsupported_type",
            FallbackCode::UnsupportedFilter => "unsupported_filter",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Error)]
#[error("{code}: {message}")]
pub struct LocalFallbackRequested {
    pub code: FallbackCode,
    pub message: String,
}

impl LocalFallbackRequested {
    fn unsupported_type(message: impl Into<String>) -> Self {
        LocalFallbackRequested { code: FallbackCode::UnsupportedType, message: message.into() }
    }
    fn unsupported_filter(message: impl Into<String>) -> Self {
        LocalFallbackRequested { code: FallbackCode::UnsupportedFilter, message: message.into() }
    }
}

type HandlerResult<T> = Result<T, LocalFallbackRequested>;

fn project_issue(snapshot: &Snapshot, issue: &crate::model::Issue) -> IssueListItem {
    IssueListItem {
        identifier: issue.identifier.clone(),
        title: issue.title.clone(),
        priority: issue.sort_priority(),
        state: query::get_state_name(snapshot, &issue.state_id),
        state_type: query::get_state_type(snapshot, &issue.state_id),
        assignee: query::get_user_name(snapshot, issue.assignee_id.as_deref()),
        due_date: issue.due_date.clone(),
    }
}

pub fn list_issues(snapshot: &Snapshot, args: &ListIssuesArgs) -> ListIssuesResult {
    let assignee_id = match &args.assignee {
        Some(q) => match query::find_user(snapshot, q) {
            Some(u) => Some(u.id.clone()),
            None => return ListIssuesResult { issues: vec![], total_count: 0 },
        },
        None => None,
    };
    let team_id = match &args.team {
        Some(q) => match query::find_team(snapshot, q) {
            Some(t) => Some(t.id.clone()),
            None => return ListIssuesResult { issues: vec![], total_count: 0 },
        },
        None => None,
    };
    let project_id = match &args.project {
        Some(q) => match query::find_project(snapshot, q) {
            Some(p) => Some(p.id.clone()),
            None => return ListIssuesResult { issues: vec![], total_count: 0 },
        },
        None => None,
    };

    let mut filtered: Vec<&crate::model::Issue> = snapshot
        .issues
        .values()
        .filter(|issue| {
            if let Some(aid) = &assignee_id {
                if issue.assignee_id.as_deref() != Some(aid.as_str()) {
                    return false;
                }
            }
            if let Some(tid) = &team_id {
                if &issue.team_id != tid {
                    return false;
                }
            }
            if let Some(pid) = &project_id {
                if issue.project_id.as_deref() != Some(pid.as_str()) {
                    return false;
                }
            }
            if let Some(state_q) = &args.state {
                let state_type = query::get_state_type(snapshot, &issue.state_id);
                let state_name = query::get_state_name(snapshot, &issue.state_id);
                if !state_type.eq_ignore_ascii_case(state_q) && !state_name.eq_ignore_ascii_case(state_q) {
                    return false;
                }
            }
            if let Some(p) = args.priority {
                if issue.sort_priority() != p {
                    return false;
                }
            }
            if let Some(q) = &args.query {
                if !issue.title.to_lowercase().contains(&q.to_lowercase()) {
                    return false;
                }
            }
            true
        })
        .collect();

    let total_count = filtered.len();

    let sort_key = |issue: &&crate::model::Issue| {
        if args.order_by == "createdAt" {
            issue.created_at.clone()
        } else {
            issue.updated_at.clone()
        }
    };
    // Stable descending sort: ties keep snapshot (insertion) order, matching
    // both the heap top-k and full-sort strategies the limit>0/limit==0
    // branches use upstream, since both resolve to the same stable ordering.
    filtered.sort_by(|a, b| sort_key(b).cmp(&sort_key(a)));

    let page: Vec<&crate::model::Issue> = if args.limit > 0 {
        filtered.into_iter().take(args.limit as usize).collect()
    } else {
        filtered
    };

    let issues = page.into_iter().map(|i| project_issue(snapshot, i)).collect();
    ListIssuesResult { issues, total_count }
}

pub fn get_issue(snapshot: &Snapshot, args: &GetIssueArgs) -> Option<IssueView> {
    let issue = query::get_issue_by_identifier(snapshot, &args.id)
        .or_else(|| snapshot.issues.get(&args.id))?;
    let comments = query::get_comments_for_issue(snapshot, &issue.id)
        .into_iter()
        .map(|c| CommentView {
            author: query::get_user_name(snapshot, Some(c.user_id.as_str())),
            body: c.body.clone(),
            created_at: c.created_at.clone(),
        })
        .collect();
    Some(IssueView {
        id: issue.id.clone(),
        identifier: issue.identifier.clone(),
        title: issue.title.clone(),
        description: issue.description.clone(),
        priority: issue.sort_priority(),
        state: query::get_state_name(snapshot, &issue.state_id),
        state_type: query::get_state_type(snapshot, &issue.state_id),
        assignee: query::get_user_name(snapshot, issue.assignee_id.as_deref()),
        project: query::get_project_name(snapshot, issue.project_id.as_deref()),
        due_date: issue.due_date.clone(),
        created_at: issue.created_at.clone(),
        updated_at: issue.updated_at.clone(),
        url: format!("https://linear.app/issue/{}", issue.identifier),
        comments,
    })
}

pub fn list_teams(snapshot: &Snapshot) -> Vec<TeamView> {
    let mut teams: Vec<&crate::model::Team> = snapshot.teams.values().collect();
    teams.sort_by(|a, b| a.key.cmp(&b.key));
    teams
        .into_iter()
        .map(|t| TeamView { id: t.id.clone(), key: t.key.clone(), name: t.name.clone(), description: t.description.clone() })
        .collect()
}

pub fn get_team(snapshot: &Snapshot, args: &QueryArg) -> Option<TeamView> {
    query::find_team(snapshot, &args.query)
        .map(|t| TeamView { id: t.id.clone(), key: t.key.clone(), name: t.name.clone(), description: t.description.clone() })
}

fn project_view(snapshot: &Snapshot, p: &crate::model::Project) -> ProjectView {
    ProjectView {
        id: p.id.clone(),
        name: p.name.clone(),
        slug_id: p.slug_id.clone(),
        state: p.state.clone(),
        description: p.description.clone(),
        start_date: p.start_date.clone(),
        target_date: p.target_date.clone(),
        lead: query::get_user_name(snapshot, p.lead_id.as_deref()),
        status: p.status_id.as_deref().and_then(|id| snapshot.project_statuses.get(id)).map(|s| s.name.clone()),
    }
}

pub fn list_projects(snapshot: &Snapshot, args: &ListProjectsArgs) -> Vec<ProjectView> {
    let team_id = match &args.team {
        Some(q) => match query::find_team(snapshot, q) {
            Some(t) => Some(t.id.clone()),
            None => return vec![],
        },
        None => None,
    };
    let mut projects: Vec<&crate::model::Project> = snapshot
        .projects
        .values()
        .filter(|p| team_id.as_ref().map(|tid| p.team_ids.contains(tid)).unwrap_or(true))
        .collect();
    projects.sort_by(|a, b| a.name.cmp(&b.name));
    projects.into_iter().map(|p| project_view(snapshot, p)).collect()
}

pub fn get_project(snapshot: &Snapshot, args: &QueryArg) -> Option<ProjectView> {
    query::find_project(snapshot, &args.query).map(|p| project_view(snapshot, p))
}

pub fn list_users(snapshot: &Snapshot) -> Vec<UserView> {
    let mut users: Vec<&crate::model::User> = snapshot.users.values().collect();
    users.sort_by(|a, b| a.name.cmp(&b.name));
    users
        .into_iter()
        .map(|u| UserView { id: u.id.clone(), name: u.name.clone(), display_name: u.display_name.clone(), email: u.email.clone() })
        .collect()
}

pub fn get_user(snapshot: &Snapshot, args: &QueryArg) -> Option<UserView> {
    query::find_user(snapshot, &args.query)
        .map(|u| UserView { id: u.id.clone(), name: u.name.clone(), display_name: u.display_name.clone(), email: u.email.clone() })
}

pub fn list_issue_statuses(snapshot: &Snapshot, args: &ListIssueStatusesArgs) -> Vec<IssueStatusView> {
    let Some(team) = query::find_team(snapshot, &args.team) else { return vec![] };
    let mut states: Vec<&crate::model::WorkflowState> =
        snapshot.workflow_states.values().filter(|s| s.team_id == team.id).collect();
    states.sort_by(|a, b| a.position.partial_cmp(&b.position).unwrap_or(std::cmp::Ordering::Equal));
    states
        .into_iter()
        .map(|s| IssueStatusView { id: s.id.clone(), name: s.name.clone(), state_type: s.state_type.clone(), color: s.color.clone(), position: s.position })
        .collect()
}

pub fn get_issue_status(snapshot: &Snapshot, args: &GetIssueStatusArgs) -> Option<IssueStatusView> {
    let team = query::find_team(snapshot, &args.team)?;
    let state = if let Some(id) = &args.id {
        snapshot.workflow_states.get(id).filter(|s| s.team_id == team.id)
    } else if let Some(name) = &args.name {
        query::find_issue_status(snapshot, &team.id, name)
    } else {
        None
    }?;
    Some(IssueStatusView { id: state.id.clone(), name: state.name.clone(), state_type: state.state_type.clone(), color: state.color.clone(), position: state.position })
}

pub fn list_comments(snapshot: &Snapshot, args: &ListCommentsArgs) -> Vec<CommentView> {
    query::get_comments_for_issue(snapshot, &args.issue_id)
        .into_iter()
        .map(|c| CommentView {
            author: query::get_user_name(snapshot, Some(c.user_id.as_str())),
            body: c.body.clone(),
            created_at: c.created_at.clone(),
        })
        .collect()
}

pub fn list_issue_labels(snapshot: &Snapshot, args: &ListIssueLabelsArgs) -> Vec<LabelView> {
    let team_id = match &args.team {
        Some(q) => match query::find_team(snapshot, q) {
            Some(t) => Some(t.id.clone()),
            None => return vec![],
        },
        None => None,
    };
    let mut labels: Vec<&crate::model::Label> = snapshot
        .labels
        .values()
        .filter(|l| match &team_id {
            Some(tid) => l.team_id.as_deref() == Some(tid.as_str()) || l.team_id.is_none(),
            None => true,
        })
        .collect();
    labels.sort_by(|a, b| a.name.cmp(&b.name));
    labels
        .into_iter()
        .map(|l| LabelView { id: l.id.clone(), name: l.name.clone(), color: l.color.clone(), is_group: l.is_group, team_id: l.team_id.clone() })
        .collect()
}

pub fn list_initiatives(snapshot: &Snapshot) -> Vec<InitiativeView> {
    let mut initiatives: Vec<&crate::model::Initiative> = snapshot.initiatives.values().collect();
    initiatives.sort_by(|a, b| a.name.cmp(&b.name));
    initiatives
        .into_iter()
        .map(|i| InitiativeView {
            id: i.id.clone(),
            name: i.name.clone(),
            slug_id: i.slug_id.clone(),
            status: i.status.clone(),
            owner: query::get_user_name(snapshot, i.owner_id.as_deref()),
        })
        .collect()
}

pub fn get_initiative(snapshot: &Snapshot, args: &QueryArg) -> Option<InitiativeView> {
    query::find_initiative(snapshot, &args.query).map(|i| InitiativeView {
        id: i.id.clone(),
        name: i.name.clone(),
        slug_id: i.slug_id.clone(),
        status: i.status.clone(),
        owner: query::get_user_name(snapshot, i.owner_id.as_deref()),
    })
}

pub fn list_cycles(snapshot: &Snapshot, args: &ListCyclesArgs) -> Vec<CycleView> {
    query::cycles_for_team(snapshot, &args.team_id)
        .into_iter()
        .map(|c| CycleView {
            id: c.id.clone(),
            number: c.number,
            starts_at: c.starts_at.clone(),
            ends_at: c.ends_at.clone(),
            completed_at: c.completed_at.clone(),
            progress: c.current_progress.as_ref().map(|p| p.serialize()),
        })
        .collect()
}

pub fn list_documents(snapshot: &Snapshot, args: &ListDocumentsArgs) -> Vec<DocumentView> {
    let project_id = match &args.project {
        Some(q) => match query::find_project(snapshot, q) {
            Some(p) => Some(p.id.clone()),
            None => return vec![],
        },
        None => None,
    };
    let mut documents: Vec<&crate::model::Document> = snapshot
        .documents
        .values()
        .filter(|d| project_id.as_ref().map(|pid| d.project_id.as_deref() == Some(pid.as_str())).unwrap_or(true))
        .collect();
    documents.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
    documents
        .into_iter()
        .map(|d| DocumentView { id: d.id.clone(), title: d.title.clone(), slug_id: d.slug_id.clone(), project_id: d.project_id.clone(), created_at: d.created_at.clone(), updated_at: d.updated_at.clone() })
        .collect()
}

pub fn get_document(snapshot: &Snapshot, args: &GetDocumentArgs) -> Option<DocumentView> {
    let d = snapshot.documents.get(&args.id)?;
    Some(DocumentView { id: d.id.clone(), title: d.title.clone(), slug_id: d.slug_id.clone(), project_id: d.project_id.clone(), created_at: d.created_at.clone(), updated_at: d.updated_at.clone() })
}

pub fn list_milestones(snapshot: &Snapshot, args: &ListMilestonesArgs) -> Vec<MilestoneView> {
    let Some(project) = query::find_project(snapshot, &args.project) else { return vec![] };
    query::milestones_for_project(snapshot, &project.id)
        .into_iter()
        .map(|m| MilestoneView { id: m.id.clone(), name: m.name.clone(), target_date: m.target_date.clone(), progress: m.current_progress.as_ref().map(|p| p.serialize()) })
        .collect()
}

pub fn get_milestone(snapshot: &Snapshot, args: &GetMilestoneArgs) -> Option<MilestoneView> {
    let project = query::find_project(snapshot, &args.project)?;
    let m = query::find_milestone(snapshot, &project.id, &args.query)?;
    Some(MilestoneView { id: m.id.clone(), name: m.name.clone(), target_date: m.target_date.clone(), progress: m.current_progress.as_ref().map(|p| p.serialize()) })
}

fn status_update_view(snapshot: &Snapshot, u: &crate::model::ProjectUpdate) -> StatusUpdateView {
    StatusUpdateView {
        id: u.id.clone(),
        body: u.body.clone(),
        health: u.health.clone(),
        author: query::get_user_name(snapshot, Some(u.user_id.as_str())),
        project: query::get_project_name(snapshot, Some(u.project_id.as_str())),
        created_at: u.created_at.clone(),
        updated_at: u.updated_at.clone(),
    }
}

/// Returns `Ok(None)` for "single-id lookup found nothing" and
/// `Ok(Some(Err(listing)))`... kept as two public entry points instead,
/// matching the two distinct external tool shapes.
pub fn get_status_update_by_id(snapshot: &Snapshot, args: &GetStatusUpdatesArgs) -> HandlerResult<Option<StatusUpdateView>> {
    let (filtered, _total) = collect_status_updates(snapshot, args)?;
    let id = args.id.as_deref().expect("caller checks args.id.is_some()");
    Ok(filtered.into_iter().find(|u| u.id == id).map(|u| status_update_view(snapshot, u)))
}

pub fn get_status_updates(snapshot: &Snapshot, args: &GetStatusUpdatesArgs) -> HandlerResult<StatusUpdatesResult> {
    let (filtered, total_count) = collect_status_updates(snapshot, args)?;
    let page: Vec<&crate::model::ProjectUpdate> = if args.limit > 0 {
        filtered.into_iter().take(args.limit as usize).collect()
    } else {
        filtered
    };
    Ok(StatusUpdatesResult { status_updates: page.into_iter().map(|u| status_update_view(snapshot, u)).collect(), total_count })
}

fn collect_status_updates<'a>(
    snapshot: &'a Snapshot,
    args: &GetStatusUpdatesArgs,
) -> HandlerResult<(Vec<&'a crate::model::ProjectUpdate>, usize)> {
    if args.kind != "project" {
        return Err(LocalFallbackRequested::unsupported_type(format!("unsupported status update type: {}", args.kind)));
    }
    if args.initiative.is_some()
        || args.cursor.is_some()
        || args.created_at.is_some()
        || args.updated_at.is_some()
        || args.include_archived.is_some()
    {
        return Err(LocalFallbackRequested::unsupported_filter(
            "initiative/cursor/createdAt/updatedAt/includeArchived filters require the remote service",
        ));
    }

    let project_id = match &args.project {
        Some(q) => match query::find_project(snapshot, q) {
            Some(p) => Some(p.id.clone()),
            None => return Ok((vec![], 0)),
        },
        None => None,
    };
    let user_id = match &args.user {
        Some(q) => match query::find_user(snapshot, q) {
            Some(u) => Some(u.id.clone()),
            None => return Ok((vec![], 0)),
        },
        None => None,
    };

    let mut updates: Vec<&crate::model::ProjectUpdate> = snapshot
        .project_updates
        .values()
        .filter(|u| project_id.as_ref().map(|pid| &u.project_id == pid).unwrap_or(true))
        .filter(|u| user_id.as_ref().map(|uid| &u.user_id == uid).unwrap_or(true))
        .collect();

    let sort_key = |u: &&crate::model::ProjectUpdate| {
        if args.order_by == "updatedAt" { u.updated_at.clone() } else { u.created_at.clone() }
    };
    updates.sort_by(|a, b| sort_key(b).cmp(&sort_key(a)));

    let total = updates.len();
    Ok((updates, total))
}

pub fn list_project_updates(snapshot: &Snapshot, args: &ListProjectUpdatesArgs) -> HandlerResult<Vec<StatusUpdateView>> {
    let inner = GetStatusUpdatesArgs {
        kind: "project".to_string(),
        id: None,
        project: Some(args.project.clone()),
        initiative: None,
        user: None,
        include_archived: None,
        order_by: "createdAt".to_string(),
        limit: 0,
        cursor: None,
        created_at: None,
        updated_at: None,
    };
    Ok(get_status_updates(snapshot, &inner)?.status_updates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Issue, Team, User, WorkflowState};
    use serde_json::json;

    fn raw() -> crate::model::AttributeMap {
        json!({}).as_object().unwrap().clone()
    }

    fn build_snapshot() -> Snapshot {
        let mut snapshot = Snapshot::empty();
        snapshot.teams.insert("T1".into(), Team { id: "T1".into(), key: "DEV".into(), name: "Dev".into(), description: None, organization_id: "ORG1".into(), raw: raw() });
        snapshot.users.insert("U1".into(), User { id: "U1".into(), name: "Alice".into(), display_name: "Alice A".into(), email: "alice@example.com".into(), organization_id: "ORG1".into(), user_account_id: None, raw: raw() });
        snapshot.workflow_states.insert("S1".into(), WorkflowState { id: "S1".into(), name: "In Progress".into(), state_type: "started".into(), color: None, position: 1.0, team_id: "T1".into(), raw: raw() });
        snapshot.issues.insert(
            "I1".into(),
            Issue {
                id: "I1".into(), identifier: "DEV-1".into(), title: "Fix bug".into(), description: None,
                priority: Some(1), estimate: None, team_id: "T1".into(), state_id: "S1".into(),
                assignee_id: Some("U1".into()), project_id: None, due_date: None,
                created_at: "2026-01-01T00:00:00Z".into(), updated_at: "2026-01-02T00:00:00Z".into(), raw: raw(),
            },
        );
        snapshot.comments.insert(
            "C1".into(),
            crate::model::Comment { id: "C1".into(), issue_id: "I1".into(), user_id: "U1".into(), body: "LGTM".into(), created_at: "2026-01-02T01:00:00Z".into(), updated_at: "2026-01-02T01:00:00Z".into(), raw: raw() },
        );
        snapshot.rebuild_comments_index();
        snapshot
    }

    #[test]
    fn get_issue_seed_scenario() {
        let snapshot = build_snapshot();
        let view = get_issue(&snapshot, &GetIssueArgs { id: "dev-1".into() }).unwrap();
        assert_eq!(view.state, "In Progress");
        assert_eq!(view.assignee, "Alice");
        assert_eq!(view.url, "https://linear.app/issue/DEV-1");
        assert_eq!(view.comments.len(), 1);
        assert_eq!(view.comments[0].author, "Alice");
    }

    #[test]
    fn list_issues_filter_and_limit() {
        let mut snapshot = build_snapshot();
        snapshot.issues.insert(
            "I2".into(),
            Issue {
                id: "I2".into(), identifier: "DEV-2".into(), title: "Other".into(), description: None,
                priority: None, estimate: None, team_id: "T1".into(), state_id: "S1".into(),
                assignee_id: None, project_id: None, due_date: None,
                created_at: "2026-01-03T00:00:00Z".into(), updated_at: "2026-01-03T00:00:00Z".into(), raw: raw(),
            },
        );
        let args = ListIssuesArgs { assignee: Some("Alice".into()), limit: 1, ..Default::default() };
        let result = list_issues(&snapshot, &args);
        assert_eq!(result.total_count, 1);
        assert_eq!(result.issues[0].identifier, "DEV-1");
    }

    #[test]
    fn get_status_updates_unsupported_filter_fallback() {
        let snapshot = build_snapshot();
        let args = GetStatusUpdatesArgs {
            kind: "project".into(), id: None, project: None, initiative: Some("north".into()), user: None,
            include_archived: None, order_by: "createdAt".into(), limit: 50, cursor: None, created_at: None, updated_at: None,
        };
        let err = get_status_updates(&snapshot, &args).unwrap_err();
        assert_eq!(err.code, FallbackCode::UnsupportedFilter);
    }

    #[test]
    fn get_status_updates_unsupported_type_fallback() {
        let snapshot = build_snapshot();
        let args = GetStatusUpdatesArgs {
            kind: "initiative".into(), id: None, project: None, initiative: None, user: None,
            include_archived: None, order_by: "createdAt".into(), limit: 50, cursor: None, created_at: None, updated_at: None,
        };
        let err = get_status_updates(&snapshot, &args).unwrap_err();
        assert_eq!(err.code, FallbackCode::UnsupportedType);
    }
}

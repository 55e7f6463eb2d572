//! Account scope filter (C4): restricts a freshly loaded snapshot to one or
//! more user accounts and prunes everything not reachable from them.

use super::Snapshot;
use std::collections::HashSet;
use thiserror::Error;

#[derive(Debug, Clone, Default)]
pub struct ScopeConfig {
    pub emails: Vec<String>,
    pub user_account_ids: Vec<String>,
}

impl ScopeConfig {
    pub fn is_enabled(&self) -> bool {
        !self.emails.is_empty() || !self.user_account_ids.is_empty()
    }
}

#[derive(Error, Debug)]
pub enum ScopeConfigurationError {
    #[error("scope is configured but matched no user")]
    NoMatchingUsers,
    #[error("scope matched users but resolved no allowed organization")]
    NoAllowedOrganizations,
}

/// Prunes `snapshot` in place to only what's reachable from the configured
/// accounts. No-op if scope is disabled (both lists empty).
pub fn apply(snapshot: &mut Snapshot, cfg: &ScopeConfig) -> Result<(), ScopeConfigurationError> {
    if !cfg.is_enabled() {
        return Ok(());
    }

    let emails: HashSet<&str> = cfg.emails.iter().map(String::as_str).collect();
    let account_ids: HashSet<&str> = cfg.user_account_ids.iter().map(String::as_str).collect();

    let matched_user_ids: HashSet<String> = snapshot
        .users
        .values()
        .filter(|u| {
            emails.contains(u.email.as_str())
                || u.user_account_id
                    .as_deref()
                    .map(|id| account_ids.contains(id))
                    .unwrap_or(false)
        })
        .map(|u| u.id.clone())
        .collect();
    if matched_user_ids.is_empty() {
        return Err(ScopeConfigurationError::NoMatchingUsers);
    }

    let allowed_orgs: HashSet<String> = snapshot
        .users
        .values()
        .filter(|u| matched_user_ids.contains(&u.id))
        .map(|u| u.organization_id.clone())
        .collect();
    if allowed_orgs.is_empty() {
        return Err(ScopeConfigurationError::NoAllowedOrganizations);
    }

    snapshot.users.retain(|_, u| allowed_orgs.contains(&u.organization_id));
    let allowed_user_ids: HashSet<String> = snapshot.users.keys().cloned().collect();

    snapshot.teams.retain(|_, t| allowed_orgs.contains(&t.organization_id));
    let allowed_team_ids: HashSet<String> = snapshot.teams.keys().cloned().collect();

    snapshot.workflow_states.retain(|_, ws| allowed_team_ids.contains(&ws.team_id));

    snapshot.issues.retain(|_, i| allowed_team_ids.contains(&i.team_id));
    let allowed_issue_ids: HashSet<String> = snapshot.issues.keys().cloned().collect();

    snapshot.comments.retain(|_, c| allowed_issue_ids.contains(&c.issue_id));

    snapshot.projects.retain(|_, p| {
        p.team_ids.iter().any(|t| allowed_team_ids.contains(t))
            || p.lead_id.as_deref().map(|id| allowed_user_ids.contains(id)).unwrap_or(false)
            || p.member_ids.iter().any(|m| allowed_user_ids.contains(m))
    });
    let allowed_project_ids: HashSet<String> = snapshot.projects.keys().cloned().collect();

    snapshot
        .labels
        .retain(|_, l| l.team_id.as_deref().map(|t| allowed_team_ids.contains(t)).unwrap_or(true));

    snapshot.initiatives.retain(|_, ini| {
        ini.team_ids.iter().any(|t| allowed_team_ids.contains(t))
            || ini.owner_id.as_deref().map(|id| allowed_user_ids.contains(id)).unwrap_or(false)
    });

    snapshot.cycles.retain(|_, c| allowed_team_ids.contains(&c.team_id));

    snapshot.documents.retain(|_, d| match &d.project_id {
        Some(pid) => allowed_project_ids.contains(pid),
        None => d.creator_id.as_deref().map(|id| allowed_user_ids.contains(id)).unwrap_or(false),
    });

    snapshot.milestones.retain(|_, m| allowed_project_ids.contains(&m.project_id));
    snapshot.project_updates.retain(|_, pu| allowed_project_ids.contains(&pu.project_id));

    let referenced_status_ids: HashSet<String> =
        snapshot.projects.values().filter_map(|p| p.status_id.clone()).collect();
    snapshot.project_statuses.retain(|id, _| referenced_status_ids.contains(id));

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Label, Team, User};
    use serde_json::json;

    fn user(id: &str, org: &str, email: &str) -> User {
        User {
            id: id.into(),
            name: id.into(),
            display_name: id.into(),
            email: email.into(),
            organization_id: org.into(),
            user_account_id: None,
            raw: json!({}).as_object().unwrap().clone(),
        }
    }

    fn team(id: &str, org: &str) -> Team {
        Team {
            id: id.into(),
            key: id.into(),
            name: id.into(),
            description: None,
            organization_id: org.into(),
            raw: json!({}).as_object().unwrap().clone(),
        }
    }

    #[test]
    fn scope_by_email_keeps_only_target_org() {
        let mut snapshot = Snapshot::empty();
        snapshot.users.insert("U1".into(), user("U1", "ORG1", "target@example.com"));
        snapshot.users.insert("U2".into(), user("U2", "ORG2", "other@example.com"));
        snapshot.teams.insert("T1".into(), team("T1", "ORG1"));
        snapshot.teams.insert("T2".into(), team("T2", "ORG2"));
        snapshot.labels.insert(
            "L1".into(),
            Label { id: "L1".into(), name: "global".into(), color: None, is_group: false, team_id: None, raw: json!({}).as_object().unwrap().clone() },
        );

        let cfg = ScopeConfig { emails: vec!["target@example.com".into()], user_account_ids: vec![] };
        apply(&mut snapshot, &cfg).unwrap();

        assert_eq!(snapshot.users.len(), 1);
        assert!(snapshot.users.contains_key("U1"));
        assert_eq!(snapshot.teams.len(), 1);
        assert!(snapshot.teams.contains_key("T1"));
        assert!(snapshot.labels.contains_key("L1"), "workspace-global labels survive scoping");
    }

    #[test]
    fn scope_with_no_matching_user_errors() {
        let mut snapshot = Snapshot::empty();
        snapshot.users.insert("U1".into(), user("U1", "ORG1", "someone@example.com"));
        let cfg = ScopeConfig { emails: vec!["nobody@example.com".into()], user_account_ids: vec![] };
        assert!(matches!(apply(&mut snapshot, &cfg), Err(ScopeConfigurationError::NoMatchingUsers)));
    }

    #[test]
    fn disabled_scope_is_noop() {
        let mut snapshot = Snapshot::empty();
        snapshot.users.insert("U1".into(), user("U1", "ORG1", "someone@example.com"));
        let cfg = ScopeConfig::default();
        apply(&mut snapshot, &cfg).unwrap();
        assert_eq!(snapshot.users.len(), 1);
    }
}

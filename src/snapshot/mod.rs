pub mod cache;
pub mod extract;
pub mod loader;
pub mod scope;
pub mod store;

use crate::model::entities::*;
use indexmap::IndexMap;
use std::time::Instant;

/// The in-memory materialization of the external store's contents at one
/// point in time (C3's output, C5's payload).
#[derive(Clone)]
pub struct Snapshot {
    pub teams: IndexMap<Id, Team>,
    pub users: IndexMap<Id, User>,
    pub workflow_states: IndexMap<Id, WorkflowState>,
    pub issues: IndexMap<Id, Issue>,
    pub comments: IndexMap<Id, Comment>,
    pub projects: IndexMap<Id, Project>,
    pub labels: IndexMap<Id, Label>,
    pub initiatives: IndexMap<Id, Initiative>,
    pub project_statuses: IndexMap<Id, ProjectStatus>,
    pub cycles: IndexMap<Id, Cycle>,
    pub documents: IndexMap<Id, Document>,
    pub milestones: IndexMap<Id, Milestone>,
    pub project_updates: IndexMap<Id, ProjectUpdate>,
    /// `issueId -> [commentId]`, sorted ascending by `createdAt`.
    pub comments_by_issue: IndexMap<Id, Vec<Id>>,
    pub loaded_at: Instant,
}

impl Snapshot {
    pub fn empty() -> Self {
        Snapshot {
            teams: IndexMap::new(),
            users: IndexMap::new(),
            workflow_states: IndexMap::new(),
            issues: IndexMap::new(),
            comments: IndexMap::new(),
            projects: IndexMap::new(),
            labels: IndexMap::new(),
            initiatives: IndexMap::new(),
            project_statuses: IndexMap::new(),
            cycles: IndexMap::new(),
            documents: IndexMap::new(),
            milestones: IndexMap::new(),
            project_updates: IndexMap::new(),
            comments_by_issue: IndexMap::new(),
            loaded_at: Instant::now(),
        }
    }

    /// Rebuilds `comments_by_issue` from the current `comments` map, sorted
    /// ascending by `createdAt`, dropping references to issues no longer
    /// present.
    pub fn rebuild_comments_index(&mut self) {
        let mut by_issue: IndexMap<Id, Vec<(String, Id)>> = IndexMap::new();
        for comment in self.comments.values() {
            if !self.issues.contains_key(&comment.issue_id) {
                continue;
            }
            by_issue
                .entry(comment.issue_id.clone())
                .or_default()
                .push((comment.created_at.clone(), comment.id.clone()));
        }
        for entries in by_issue.values_mut() {
            entries.sort_by(|a, b| a.0.cmp(&b.0));
        }
        self.comments_by_issue = by_issue
            .into_iter()
            .map(|(issue_id, entries)| (issue_id, entries.into_iter().map(|(_, id)| id).collect()))
            .collect();
    }
}

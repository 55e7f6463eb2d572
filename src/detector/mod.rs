pub mod classify;

use crate::model::attribute_map::AttributeMap;
use crate::snapshot::store::ObjectStoreDatabase;
use tracing::{debug, warn};

/// The entity kind a store was classified as, in the order predicates are
/// tried (§4.1): a store matching more than one predicate is assigned to
/// whichever comes first here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Issue,
    User,
    Team,
    WorkflowState,
    Comment,
    Project,
    IssueContent,
    Label,
    Initiative,
    ProjectStatus,
    Cycle,
    Document,
    DocumentContent,
    Milestone,
    ProjectUpdate,
}

fn classify_record(r: &AttributeMap) -> Option<EntityKind> {
    use classify::*;
    use EntityKind::*;

    if is_issue_record(r) {
        Some(Issue)
    } else if is_user_record(r) {
        Some(User)
    } else if is_team_record(r) {
        Some(Team)
    } else if is_workflow_state_record(r) {
        Some(WorkflowState)
    } else if is_comment_record(r) {
        Some(Comment)
    } else if is_project_record(r) {
        Some(Project)
    } else if is_issue_content_record(r) {
        Some(IssueContent)
    } else if is_label_record(r) {
        Some(Label)
    } else if is_initiative_record(r) {
        Some(Initiative)
    } else if is_project_status_record(r) {
        Some(ProjectStatus)
    } else if is_cycle_record(r) {
        Some(Cycle)
    } else if is_document_record(r) {
        Some(Document)
    } else if is_document_content_record(r) {
        Some(DocumentContent)
    } else if is_milestone_record(r) {
        Some(Milestone)
    } else if is_project_update_record(r) {
        Some(ProjectUpdate)
    } else {
        None
    }
}

/// Store-name -> entity-kind map produced by a single detection pass.
#[derive(Debug, Clone, Default)]
pub struct DetectedStores {
    pub issues: Option<String>,
    pub teams: Option<String>,
    pub comments: Option<String>,
    pub projects: Option<String>,
    pub issue_content: Option<String>,
    pub initiatives: Option<String>,
    pub project_statuses: Option<String>,
    pub cycles: Option<String>,
    pub documents: Option<String>,
    pub document_content: Option<String>,
    pub milestones: Option<String>,
    pub project_updates: Option<String>,
    pub users: Vec<String>,
    pub workflow_states: Vec<String>,
    pub labels: Vec<String>,
}

impl DetectedStores {
    fn assign_singleton(slot: &mut Option<String>, store_name: &str, kind: EntityKind) {
        if slot.is_some() {
            warn!(store = store_name, ?kind, "ignoring duplicate store for singleton kind");
            return;
        }
        *slot = Some(store_name.to_string());
    }

    fn assign(&mut self, store_name: &str, kind: EntityKind) {
        match kind {
            EntityKind::Issue => Self::assign_singleton(&mut self.issues, store_name, kind),
            EntityKind::Team => Self::assign_singleton(&mut self.teams, store_name, kind),
            EntityKind::Comment => Self::assign_singleton(&mut self.comments, store_name, kind),
            EntityKind::Project => Self::assign_singleton(&mut self.projects, store_name, kind),
            EntityKind::IssueContent => Self::assign_singleton(&mut self.issue_content, store_name, kind),
            EntityKind::Initiative => Self::assign_singleton(&mut self.initiatives, store_name, kind),
            EntityKind::ProjectStatus => Self::assign_singleton(&mut self.project_statuses, store_name, kind),
            EntityKind::Cycle => Self::assign_singleton(&mut self.cycles, store_name, kind),
            EntityKind::Document => Self::assign_singleton(&mut self.documents, store_name, kind),
            EntityKind::DocumentContent => Self::assign_singleton(&mut self.document_content, store_name, kind),
            EntityKind::Milestone => Self::assign_singleton(&mut self.milestones, store_name, kind),
            EntityKind::ProjectUpdate => Self::assign_singleton(&mut self.project_updates, store_name, kind),
            EntityKind::User => self.users.push(store_name.to_string()),
            EntityKind::WorkflowState => self.workflow_states.push(store_name.to_string()),
            EntityKind::Label => self.labels.push(store_name.to_string()),
        }
    }
}

fn is_staging_store(name: &str) -> bool {
    name.starts_with('_') || name.contains("_partial")
}

/// Default number of records sampled per store before giving up on it.
pub const DEFAULT_SAMPLE_LIMIT: usize = 25;

pub struct StoreDetector;

impl StoreDetector {
    pub async fn detect(db: &dyn ObjectStoreDatabase, sample_limit: usize) -> DetectedStores {
        let mut result = DetectedStores::default();
        for name in db.object_store_names() {
            if is_staging_store(&name) {
                debug!(store = %name, "skipping staging store");
                continue;
            }
            let records = match db.sample_records(&name, sample_limit).await {
                Ok(records) => records,
                Err(err) => {
                    warn!(store = %name, error = %err, "skipping unreadable store");
                    continue;
                }
            };
            let kind = records.iter().find_map(classify_record);
            match kind {
                Some(kind) => result.assign(&name, kind),
                None => debug!(store = %name, "no classifier matched sampled records"),
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::HashMap;

    struct FakeDb(HashMap<String, Vec<AttributeMap>>);

    #[async_trait]
    impl ObjectStoreDatabase for FakeDb {
        fn object_store_names(&self) -> Vec<String> {
            self.0.keys().cloned().collect()
        }
        async fn sample_records(&self, store_name: &str, limit: usize) -> anyhow::Result<Vec<AttributeMap>> {
            Ok(self.0.get(store_name).cloned().unwrap_or_default().into_iter().take(limit).collect())
        }
        async fn all_records(&self, store_name: &str) -> anyhow::Result<Vec<AttributeMap>> {
            Ok(self.0.get(store_name).cloned().unwrap_or_default())
        }
    }

    fn map(v: serde_json::Value) -> AttributeMap {
        v.as_object().unwrap().clone()
    }

    #[tokio::test]
    async fn mixed_schema_detection() {
        let mut stores = HashMap::new();
        stores.insert(
            "store_a".to_string(),
            vec![map(json!({"number": 1, "teamId": "T1", "stateId": "S1", "title": "x"}))],
        );
        stores.insert(
            "store_b".to_string(),
            vec![map(json!({"key": "ENG", "name": "Engineering"}))],
        );
        stores.insert("_staging".to_string(), vec![map(json!({"key": "ZZZ", "name": "Z"}))]);

        let db = FakeDb(stores);
        let detected = StoreDetector::detect(&db, DEFAULT_SAMPLE_LIMIT).await;

        assert_eq!(detected.issues.as_deref(), Some("store_a"));
        assert_eq!(detected.teams.as_deref(), Some("store_b"));
    }

    #[tokio::test]
    async fn skips_partial_sync_staging_stores() {
        let mut stores = HashMap::new();
        stores.insert(
            "issue_sync_partial".to_string(),
            vec![map(json!({"number": 1, "teamId": "T1", "stateId": "S1", "title": "x"}))],
        );
        let db = FakeDb(stores);
        let detected = StoreDetector::detect(&db, DEFAULT_SAMPLE_LIMIT).await;
        assert!(detected.issues.is_none());
    }
}

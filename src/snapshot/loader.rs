use super::extract;
use super::scope::{ScopeConfig, ScopeConfigurationError};
use super::store::{CrdtDecoder, ObjectStoreDatabase};
use super::Snapshot;
use crate::detector::{DetectedStores, StoreDetector, DEFAULT_SAMPLE_LIMIT};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::warn;

#[derive(Error, Debug)]
pub enum SnapshotLoadError {
    #[error("store read failed: {0}")]
    StoreRead(String),
    #[error("scope configuration error: {0}")]
    Scope(#[from] ScopeConfigurationError),
}

pub struct SnapshotLoader {
    db: Arc<dyn ObjectStoreDatabase>,
    decoder: Arc<dyn CrdtDecoder>,
    scope: Option<ScopeConfig>,
}

impl SnapshotLoader {
    pub fn new(
        db: Arc<dyn ObjectStoreDatabase>,
        decoder: Arc<dyn CrdtDecoder>,
        scope: Option<ScopeConfig>,
    ) -> Self {
        SnapshotLoader { db, decoder, scope }
    }

    pub async fn load(&self) -> Result<Snapshot, SnapshotLoadError> {
        let detected = StoreDetector::detect(self.db.as_ref(), DEFAULT_SAMPLE_LIMIT).await;
        let mut snapshot = Snapshot::empty();

        self.load_singleton(&detected.teams, &mut snapshot.teams, extract::team).await?;
        for store in &detected.workflow_states {
            self.load_into(store, &mut snapshot.workflow_states, extract::workflow_state).await?;
        }
        for store in &detected.users {
            self.load_into(store, &mut snapshot.users, extract::user).await?;
        }
        self.load_singleton(&detected.issues, &mut snapshot.issues, extract::issue).await?;
        self.load_singleton(&detected.projects, &mut snapshot.projects, extract::project).await?;
        for store in &detected.labels {
            self.load_into(store, &mut snapshot.labels, extract::label).await?;
        }
        self.load_singleton(&detected.initiatives, &mut snapshot.initiatives, extract::initiative).await?;
        self.load_singleton(&detected.project_statuses, &mut snapshot.project_statuses, extract::project_status).await?;
        self.load_singleton(&detected.cycles, &mut snapshot.cycles, extract::cycle).await?;
        self.load_singleton(&detected.documents, &mut snapshot.documents, extract::document).await?;
        self.load_singleton(&detected.milestones, &mut snapshot.milestones, extract::milestone).await?;
        self.load_singleton(&detected.project_updates, &mut snapshot.project_updates, extract::project_update).await?;

        self.merge_issue_content(&detected, &mut snapshot).await?;
        self.merge_document_content(&detected, &mut snapshot).await?;
        self.load_comments(&detected, &mut snapshot).await?;

        if let Some(cfg) = &self.scope {
            super::scope::apply(&mut snapshot, cfg)?;
        }

        snapshot.rebuild_comments_index();

        snapshot.loaded_at = Instant::now();
        Ok(snapshot)
    }

    async fn load_singleton<T, F>(
        &self,
        store_name: &Option<String>,
        into: &mut indexmap::IndexMap<String, T>,
        build: F,
    ) -> Result<(), SnapshotLoadError>
    where
        F: Fn(&crate::model::AttributeMap) -> T,
        T: HasId,
    {
        let Some(name) = store_name else { return Ok(()) };
        self.load_into(name, into, build).await
    }

    async fn load_into<T, F>(
        &self,
        store_name: &str,
        into: &mut indexmap::IndexMap<String, T>,
        build: F,
    ) -> Result<(), SnapshotLoadError>
    where
        F: Fn(&crate::model::AttributeMap) -> T,
        T: HasId,
    {
        let records = self
            .db
            .all_records(store_name)
            .await
            .map_err(|e| SnapshotLoadError::StoreRead(format!("{store_name}: {e}")))?;
        for record in records {
            let entity = build(&record);
            into.insert(entity.id().to_string(), entity);
        }
        Ok(())
    }

    async fn merge_issue_content(
        &self,
        detected: &DetectedStores,
        snapshot: &mut Snapshot,
    ) -> Result<(), SnapshotLoadError> {
        let Some(store) = &detected.issue_content else { return Ok(()) };
        let records = self
            .db
            .all_records(store)
            .await
            .map_err(|e| SnapshotLoadError::StoreRead(format!("{store}: {e}")))?;
        for record in records {
            let Some(issue_id) = record.get("issueId").and_then(|v| v.as_str()) else { continue };
            let Some(content) = record.get("contentState") else { continue };
            match self.decoder.decode(content) {
                Ok(body) => {
                    if let Some(issue) = snapshot.issues.get_mut(issue_id) {
                        issue.description = Some(body);
                    }
                }
                Err(err) => warn!(issue_id, error = %err, "failed to decode issue content"),
            }
        }
        Ok(())
    }

    async fn merge_document_content(
        &self,
        detected: &DetectedStores,
        snapshot: &mut Snapshot,
    ) -> Result<(), SnapshotLoadError> {
        let Some(store) = &detected.document_content else { return Ok(()) };
        let records = self
            .db
            .all_records(store)
            .await
            .map_err(|e| SnapshotLoadError::StoreRead(format!("{store}: {e}")))?;
        for record in records {
            let Some(document_content_id) = record.get("documentContentId").and_then(|v| v.as_str()) else { continue };
            let Some(content) = record.get("contentData") else { continue };
            match self.decoder.decode(content) {
                Ok(body) => {
                    if let Some(document) = snapshot.documents.get_mut(document_content_id) {
                        document.raw.insert("body".to_string(), serde_json::Value::String(body));
                    }
                }
                Err(err) => warn!(document_content_id, error = %err, "failed to decode document content"),
            }
        }
        Ok(())
    }

    async fn load_comments(&self, detected: &DetectedStores, snapshot: &mut Snapshot) -> Result<(), SnapshotLoadError> {
        let Some(store) = &detected.comments else { return Ok(()) };
        let records = self
            .db
            .all_records(store)
            .await
            .map_err(|e| SnapshotLoadError::StoreRead(format!("{store}: {e}")))?;
        for record in records {
            let body = match record.get("bodyData") {
                Some(data) => self.decoder.decode(data).unwrap_or_default(),
                None => String::new(),
            };
            let comment = extract::comment(&record, body);
            snapshot.comments.insert(comment.id.clone(), comment);
        }
        Ok(())
    }
}

/// Lets the generic `load_into`/`load_singleton` helpers key a map by each
/// entity's own id without repeating `.id.clone()` at every call site.
pub trait HasId {
    fn id(&self) -> &str;
}

macro_rules! impl_has_id {
    ($($ty:ty),* $(,)?) => {
        $(impl HasId for $ty { fn id(&self) -> &str { &self.id } })*
    };
}

impl_has_id!(
    crate::model::Team,
    crate::model::User,
    crate::model::WorkflowState,
    crate::model::Issue,
    crate::model::Comment,
    crate::model::Project,
    crate::model::Label,
    crate::model::Initiative,
    crate::model::ProjectStatus,
    crate::model::Cycle,
    crate::model::Document,
    crate::model::Milestone,
    crate::model::ProjectUpdate,
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AttributeMap;
    use async_trait::async_trait;
    use serde_json::{json, Value};
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

    struct IdentityDecoder;
    impl CrdtDecoder for IdentityDecoder {
        fn decode(&self, blob: &Value) -> anyhow::Result<String> {
            Ok(blob.as_str().unwrap_or_default().to_string())
        }
    }

    fn map(v: serde_json::Value) -> AttributeMap {
        v.as_object().unwrap().clone()
    }

    #[tokio::test]
    async fn loads_issue_with_decoded_content_and_comments() {
        let mut stores = HashMap::new();
        stores.insert(
            "issues".to_string(),
            vec![map(json!({
                "id": "I1", "identifier": "DEV-1", "number": 1, "teamId": "T1",
                "stateId": "S1", "title": "Fix bug", "createdAt": "2026-01-01", "updatedAt": "2026-01-02"
            }))],
        );
        stores.insert(
            "issue_content".to_string(),
            vec![map(json!({"issueId": "I1", "contentState": "decoded body"}))],
        );
        stores.insert(
            "comments".to_string(),
            vec![map(json!({
                "id": "C1", "issueId": "I1", "userId": "U1", "bodyData": "LGTM",
                "createdAt": "2026-01-03", "updatedAt": "2026-01-03"
            }))],
        );

        let db = Arc::new(FakeDb(stores));
        let loader = SnapshotLoader::new(db, Arc::new(IdentityDecoder), None);
        let snapshot = loader.load().await.unwrap();

        let issue = snapshot.issues.get("I1").unwrap();
        assert_eq!(issue.description.as_deref(), Some("decoded body"));
        assert_eq!(snapshot.comments_by_issue.get("I1").unwrap(), &vec!["C1".to_string()]);
    }
}

use super::attribute_map::AttributeMap;

pub type Id = String;

/// Raw `currentProgress` shape carried by cycles and milestones.
#[derive(Debug, Clone, PartialEq)]
pub struct Progress {
    pub completed_issue_count: i64,
    pub started_issue_count: i64,
    pub unstarted_issue_count: i64,
    pub scope_count: i64,
}

impl Progress {
    /// The `{completed, started, unstarted, total}` shape local handlers project.
    pub fn serialize(&self) -> serde_json::Value {
        serde_json::json!({
            "completed": self.completed_issue_count,
            "started": self.started_issue_count,
            "unstarted": self.unstarted_issue_count,
            "total": self.scope_count,
        })
    }
}

#[derive(Debug, Clone)]
pub struct Team {
    pub id: Id,
    pub key: String,
    pub name: String,
    pub description: Option<String>,
    pub organization_id: String,
    pub raw: AttributeMap,
}

#[derive(Debug, Clone)]
pub struct User {
    pub id: Id,
    pub name: String,
    pub display_name: String,
    pub email: String,
    pub organization_id: String,
    pub user_account_id: Option<String>,
    pub raw: AttributeMap,
}

#[derive(Debug, Clone)]
pub struct WorkflowState {
    pub id: Id,
    pub name: String,
    pub state_type: String,
    pub color: Option<String>,
    pub position: f64,
    pub team_id: Id,
    pub raw: AttributeMap,
}

#[derive(Debug, Clone)]
pub struct Issue {
    pub id: Id,
    pub identifier: String,
    pub title: String,
    pub description: Option<String>,
    /// `None` sorts as priority 4 — use [`Issue::sort_priority`] for ordering.
    pub priority: Option<i64>,
    pub estimate: Option<f64>,
    pub team_id: Id,
    pub state_id: Id,
    pub assignee_id: Option<Id>,
    pub project_id: Option<Id>,
    pub due_date: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub raw: AttributeMap,
}

impl Issue {
    pub fn sort_priority(&self) -> i64 {
        self.priority.unwrap_or(4)
    }
}

#[derive(Debug, Clone)]
pub struct Comment {
    pub id: Id,
    pub issue_id: Id,
    pub user_id: Id,
    pub body: String,
    pub created_at: String,
    pub updated_at: String,
    pub raw: AttributeMap,
}

#[derive(Debug, Clone)]
pub struct Project {
    pub id: Id,
    pub name: String,
    pub slug_id: String,
    pub state: String,
    pub description: Option<String>,
    pub start_date: Option<String>,
    pub target_date: Option<String>,
    pub team_ids: Vec<Id>,
    pub lead_id: Option<Id>,
    pub member_ids: Vec<Id>,
    pub status_id: Option<Id>,
    pub raw: AttributeMap,
}

#[derive(Debug, Clone)]
pub struct Label {
    pub id: Id,
    pub name: String,
    pub color: Option<String>,
    pub is_group: bool,
    /// Absent means workspace-global.
    pub team_id: Option<Id>,
    pub raw: AttributeMap,
}

#[derive(Debug, Clone)]
pub struct Initiative {
    pub id: Id,
    pub name: String,
    pub slug_id: String,
    pub color: Option<String>,
    pub status: String,
    pub owner_id: Option<Id>,
    pub team_ids: Vec<Id>,
    pub created_at: String,
    pub updated_at: String,
    pub raw: AttributeMap,
}

#[derive(Debug, Clone)]
pub struct ProjectStatus {
    pub id: Id,
    pub name: String,
    pub color: Option<String>,
    pub position: f64,
    pub status_type: String,
    pub indefinite: bool,
    pub raw: AttributeMap,
}

#[derive(Debug, Clone)]
pub struct Cycle {
    pub id: Id,
    pub number: i64,
    pub team_id: Id,
    pub starts_at: String,
    pub ends_at: String,
    pub completed_at: Option<String>,
    pub current_progress: Option<Progress>,
    pub raw: AttributeMap,
}

#[derive(Debug, Clone)]
pub struct Document {
    pub id: Id,
    pub title: String,
    pub slug_id: String,
    pub project_id: Option<Id>,
    pub creator_id: Option<Id>,
    pub sort_order: f64,
    pub created_at: String,
    pub updated_at: String,
    pub raw: AttributeMap,
}

#[derive(Debug, Clone)]
pub struct Milestone {
    pub id: Id,
    pub name: String,
    pub project_id: Id,
    pub sort_order: f64,
    pub target_date: Option<String>,
    pub current_progress: Option<Progress>,
    pub raw: AttributeMap,
}

#[derive(Debug, Clone)]
pub struct ProjectUpdate {
    pub id: Id,
    pub body: String,
    pub health: String,
    pub project_id: Id,
    pub user_id: Id,
    pub created_at: String,
    pub updated_at: String,
    pub raw: AttributeMap,
}

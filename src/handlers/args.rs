use serde::Deserialize;

fn default_list_issues_limit() -> i64 {
    50
}
fn default_order_by_updated() -> String {
    "updatedAt".to_string()
}
fn default_order_by_created() -> String {
    "createdAt".to_string()
}
fn default_status_updates_limit() -> i64 {
    50
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListIssuesArgs {
    pub assignee: Option<String>,
    pub team: Option<String>,
    pub state: Option<String>,
    pub priority: Option<i64>,
    pub project: Option<String>,
    pub query: Option<String>,
    #[serde(default = "default_order_by_updated")]
    pub order_by: String,
    #[serde(default = "default_list_issues_limit")]
    pub limit: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetIssueArgs {
    pub id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryArg {
    pub query: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListProjectsArgs {
    pub team: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListIssueStatusesArgs {
    pub team: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetIssueStatusArgs {
    pub team: String,
    pub name: Option<String>,
    pub id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListCommentsArgs {
    pub issue_id: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListIssueLabelsArgs {
    pub team: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListCyclesArgs {
    pub team_id: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListDocumentsArgs {
    pub project: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetDocumentArgs {
    pub id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListMilestonesArgs {
    pub project: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetMilestoneArgs {
    pub project: String,
    pub query: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetStatusUpdatesArgs {
    #[serde(rename = "type")]
    pub kind: String,
    pub id: Option<String>,
    pub project: Option<String>,
    pub initiative: Option<String>,
    pub user: Option<String>,
    pub include_archived: Option<bool>,
    #[serde(default = "default_order_by_created")]
    pub order_by: String,
    #[serde(default = "default_status_updates_limit")]
    pub limit: i64,
    pub cursor: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListProjectUpdatesArgs {
    pub project: String,
}

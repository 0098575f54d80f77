use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use crate::config::{BugPredicate, Config};

pub const LINEAR_API_URL: &str = "https://api.linear.app/graphql";

// Common GraphQL field selection for issues
const ISSUE_FIELDS: &str = r#"
    id
    identifier
    title
    description
    url
    createdAt
    triagedAt
    state {
        name
        type
    }
    labels {
        nodes {
            name
        }
    }
"#;

/// A time-boxed iteration in the tracking service, analogous to a sprint.
#[derive(Debug, Clone, Deserialize)]
pub struct Cycle {
    pub id: String,
    #[serde(default)]
    pub progress: f64,
}

/// A named body of work containing issues, tracked independently of cycles.
#[derive(Debug, Clone, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub state: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LabelConnection {
    #[serde(default)]
    pub nodes: Vec<Label>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Label {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StateNode {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub state_type: String,
}

/// A unit of trackable work.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    pub id: String,
    pub identifier: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub url: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub triaged_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub state: Option<StateNode>,
    #[serde(default)]
    pub labels: LabelConnection,
}

/// An issue's position in its completion lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowState {
    Completed,
    Started,
    Canceled,
    Triaged,
    Unstarted,
    Other,
}

impl WorkflowState {
    /// Map the service's `state.type` string onto the closed category.
    pub fn from_state_type(state_type: &str) -> Self {
        match state_type {
            "completed" => Self::Completed,
            "started" => Self::Started,
            "canceled" => Self::Canceled,
            "triaged" => Self::Triaged,
            "unstarted" => Self::Unstarted,
            _ => Self::Other,
        }
    }
}

/// Read-only queries against the tracking service.
#[allow(async_fn_in_trait)]
pub trait IssueTracker {
    /// Cycles for a team, in the service's native ordering.
    async fn list_cycles(&self, team_id: &str) -> Result<Vec<Cycle>>;

    /// Projects for a team, minus any whose name matches an exclusion entry.
    async fn list_projects(&self, team_id: &str, exclude: &[String]) -> Result<Vec<Project>>;

    async fn list_issues_for_project_and_cycle(
        &self,
        project_id: &str,
        cycle_id: &str,
    ) -> Result<Vec<Issue>>;

    /// Issues created after `since` that match the configured bug predicate.
    async fn list_recent_flagged_issues(
        &self,
        team_id: &str,
        since: NaiveDate,
    ) -> Result<Vec<Issue>>;

    /// An issue's workflow state, read lazily per issue.
    async fn resolve_issue_state(&self, issue: &Issue) -> Result<WorkflowState>;
}

/// Select the current cycle (first with nonzero progress) and the cycle at
/// the next index as its predecessor.
pub fn select_current_and_previous(cycles: &[Cycle]) -> Result<(Cycle, Option<Cycle>)> {
    let position = cycles
        .iter()
        .position(|cycle| cycle.progress > 0.0)
        .ok_or_else(|| anyhow::anyhow!("no cycle in progress found for this team"))?;

    Ok((cycles[position].clone(), cycles.get(position + 1).cloned()))
}

/// Case-insensitive substring match against the configured exclusion names.
pub fn is_excluded(name: &str, exclusions: &[String]) -> bool {
    let name_lower = name.to_lowercase();
    exclusions
        .iter()
        .any(|entry| name_lower.contains(&entry.to_lowercase()))
}

pub fn filter_excluded(projects: Vec<Project>, exclusions: &[String]) -> Vec<Project> {
    projects
        .into_iter()
        .filter(|project| !is_excluded(&project.name, exclusions))
        .collect()
}

pub struct LinearClient {
    client: Client,
    api_key: String,
    bug_predicate: BugPredicate,
}

impl LinearClient {
    pub fn new(config: &Config) -> Self {
        Self {
            client: Client::new(),
            api_key: config.linear_api_key.clone(),
            bug_predicate: config.bug_list_predicate,
        }
    }

    /// POST one GraphQL query and return its `data` payload.
    async fn graphql(&self, query: &str, variables: Value) -> Result<Value> {
        let request_body = json!({
            "query": query,
            "variables": variables,
        });

        let response = self
            .client
            .post(LINEAR_API_URL)
            .header("Content-Type", "application/json")
            .header("Authorization", &self.api_key)
            .json(&request_body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(anyhow::anyhow!(
                "Linear API request failed: {}",
                response.status()
            ));
        }

        let payload: Value = response.json().await?;

        if let Some(errors) = payload.get("errors").and_then(|e| e.as_array()) {
            let messages: Vec<String> = errors
                .iter()
                .filter_map(|error| error["message"].as_str().map(|s| s.to_string()))
                .collect();
            return Err(anyhow::anyhow!(
                "Linear API returned errors: {}",
                messages.join("; ")
            ));
        }

        Ok(payload["data"].clone())
    }

    /// Deserialize the `nodes` array of a GraphQL connection.
    fn parse_nodes<T: DeserializeOwned>(connection: &Value) -> Result<Vec<T>> {
        let nodes = connection["nodes"].clone();
        if nodes.is_null() {
            return Ok(Vec::new());
        }

        Ok(serde_json::from_value(nodes)?)
    }
}

impl IssueTracker for LinearClient {
    async fn list_cycles(&self, team_id: &str) -> Result<Vec<Cycle>> {
        let query = r#"
            query TeamCycles($teamId: String!) {
                team(id: $teamId) {
                    cycles(first: 50) {
                        nodes {
                            id
                            progress
                        }
                    }
                }
            }
        "#;

        let data = self.graphql(query, json!({ "teamId": team_id })).await?;
        if data["team"].is_null() {
            return Err(anyhow::anyhow!("team {} not found", team_id));
        }

        tracing::debug!("fetched cycles for team {}", team_id);
        Self::parse_nodes(&data["team"]["cycles"])
    }

    async fn list_projects(&self, team_id: &str, exclude: &[String]) -> Result<Vec<Project>> {
        let query = r#"
            query TeamProjects($teamId: String!) {
                team(id: $teamId) {
                    projects(first: 100) {
                        nodes {
                            id
                            name
                            url
                            state
                        }
                    }
                }
            }
        "#;

        let data = self.graphql(query, json!({ "teamId": team_id })).await?;
        if data["team"].is_null() {
            return Err(anyhow::anyhow!("team {} not found", team_id));
        }

        let projects: Vec<Project> = Self::parse_nodes(&data["team"]["projects"])?;
        Ok(filter_excluded(projects, exclude))
    }

    async fn list_issues_for_project_and_cycle(
        &self,
        project_id: &str,
        cycle_id: &str,
    ) -> Result<Vec<Issue>> {
        let query = format!(
            r#"
            query ProjectCycleIssues($filter: IssueFilter!) {{
                issues(filter: $filter, first: 100) {{
                    nodes {{
                        {ISSUE_FIELDS}
                    }}
                }}
            }}
        "#
        );

        let filter = json!({
            "project": { "id": { "eq": project_id } },
            "cycle": { "id": { "eq": cycle_id } },
        });

        let data = self.graphql(&query, json!({ "filter": filter })).await?;
        Self::parse_nodes(&data["issues"])
    }

    async fn list_recent_flagged_issues(
        &self,
        team_id: &str,
        since: NaiveDate,
    ) -> Result<Vec<Issue>> {
        let query = format!(
            r#"
            query RecentFlaggedIssues($filter: IssueFilter!) {{
                issues(filter: $filter, first: 100) {{
                    nodes {{
                        {ISSUE_FIELDS}
                    }}
                }}
            }}
        "#
        );

        let created_after = format!("{}T00:00:00.000Z", since);
        let filter = match self.bug_predicate {
            BugPredicate::LabelOrTriage => json!({
                "team": { "id": { "eq": team_id } },
                "createdAt": { "gt": created_after },
                "or": [
                    { "labels": { "name": { "eq": "Bug" } } },
                    { "triagedAt": { "null": false } },
                ],
            }),
            BugPredicate::TriageOnly => json!({
                "team": { "id": { "eq": team_id } },
                "createdAt": { "gt": created_after },
                "triagedAt": { "null": false },
            }),
        };

        let data = self.graphql(&query, json!({ "filter": filter })).await?;
        Self::parse_nodes(&data["issues"])
    }

    async fn resolve_issue_state(&self, issue: &Issue) -> Result<WorkflowState> {
        // State already came back with the issue fields
        if let Some(state) = &issue.state {
            return Ok(WorkflowState::from_state_type(&state.state_type));
        }

        let query = r#"
            query IssueState($issueId: String!) {
                issue(id: $issueId) {
                    state {
                        name
                        type
                    }
                }
            }
        "#;

        let data = self.graphql(query, json!({ "issueId": issue.id })).await?;
        let state_type = data["issue"]["state"]["type"].as_str().unwrap_or_default();
        Ok(WorkflowState::from_state_type(state_type))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cycle(id: &str, progress: f64) -> Cycle {
        Cycle {
            id: id.to_string(),
            progress,
        }
    }

    fn project(name: &str) -> Project {
        Project {
            id: format!("id-{name}"),
            name: name.to_string(),
            url: format!("https://linear.app/project/{name}"),
            state: "started".to_string(),
        }
    }

    #[test]
    fn test_select_current_and_previous_adjacency() {
        let cycles = vec![cycle("c0", 0.4), cycle("c1", 1.0), cycle("c2", 1.0)];
        let (current, previous) = select_current_and_previous(&cycles).unwrap();
        assert_eq!(current.id, "c0");
        assert_eq!(previous.unwrap().id, "c1");
    }

    #[test]
    fn test_select_current_skips_zero_progress() {
        let cycles = vec![cycle("upcoming", 0.0), cycle("active", 0.2), cycle("done", 1.0)];
        let (current, previous) = select_current_and_previous(&cycles).unwrap();
        assert_eq!(current.id, "active");
        assert_eq!(previous.unwrap().id, "done");
    }

    #[test]
    fn test_select_current_is_last_has_no_previous() {
        let cycles = vec![cycle("upcoming", 0.0), cycle("active", 0.5)];
        let (current, previous) = select_current_and_previous(&cycles).unwrap();
        assert_eq!(current.id, "active");
        assert!(previous.is_none());
    }

    #[test]
    fn test_select_current_fails_without_progress() {
        let cycles = vec![cycle("c0", 0.0), cycle("c1", 0.0)];
        let err = select_current_and_previous(&cycles).unwrap_err();
        assert!(err.to_string().contains("no cycle in progress"));

        let err = select_current_and_previous(&[]).unwrap_err();
        assert!(err.to_string().contains("no cycle in progress"));
    }

    #[test]
    fn test_is_excluded_case_insensitive_substring() {
        let exclusions = vec!["internal".to_string(), "Sandbox".to_string()];
        assert!(is_excluded("Internal Tooling", &exclusions));
        assert!(is_excluded("dev sandbox", &exclusions));
        assert!(!is_excluded("Mobile App", &exclusions));
    }

    #[test]
    fn test_is_excluded_empty_list_matches_nothing() {
        assert!(!is_excluded("Internal Tooling", &[]));
    }

    #[test]
    fn test_filter_excluded() {
        let projects = vec![project("Mobile App"), project("Internal Tooling")];
        let kept = filter_excluded(projects, &["internal".to_string()]);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].name, "Mobile App");
    }

    #[test]
    fn test_workflow_state_mapping_is_total() {
        assert_eq!(
            WorkflowState::from_state_type("completed"),
            WorkflowState::Completed
        );
        assert_eq!(
            WorkflowState::from_state_type("started"),
            WorkflowState::Started
        );
        assert_eq!(
            WorkflowState::from_state_type("canceled"),
            WorkflowState::Canceled
        );
        assert_eq!(
            WorkflowState::from_state_type("triaged"),
            WorkflowState::Triaged
        );
        assert_eq!(
            WorkflowState::from_state_type("unstarted"),
            WorkflowState::Unstarted
        );
        assert_eq!(
            WorkflowState::from_state_type("backlog"),
            WorkflowState::Other
        );
        assert_eq!(WorkflowState::from_state_type(""), WorkflowState::Other);
    }

    #[test]
    fn test_issue_deserializes_from_camel_case() {
        let node = serde_json::json!({
            "id": "issue-1",
            "identifier": "ENG-42",
            "title": "Fix login crash",
            "description": "Crash on empty password",
            "url": "https://linear.app/issue/ENG-42",
            "createdAt": "2024-05-14T09:30:00.000Z",
            "triagedAt": null,
            "state": { "name": "In Progress", "type": "started" },
            "labels": { "nodes": [{ "name": "Bug" }] }
        });

        let issue: Issue = serde_json::from_value(node).unwrap();
        assert_eq!(issue.identifier, "ENG-42");
        assert!(issue.created_at.is_some());
        assert!(issue.triaged_at.is_none());
        assert_eq!(issue.state.as_ref().unwrap().state_type, "started");
        assert_eq!(issue.labels.nodes[0].name, "Bug");
    }

    #[test]
    fn test_issue_deserializes_without_optional_fields() {
        let node = serde_json::json!({
            "id": "issue-2",
            "identifier": "ENG-43",
            "title": "Ship dark mode",
            "url": "https://linear.app/issue/ENG-43"
        });

        let issue: Issue = serde_json::from_value(node).unwrap();
        assert!(issue.description.is_none());
        assert!(issue.state.is_none());
        assert!(issue.labels.nodes.is_empty());
    }
}

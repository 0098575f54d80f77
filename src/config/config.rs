use std::env;
use anyhow::Result;

/// When the project-name exclusion filter is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExclusionPolicy {
    /// Filter inside the project listing call.
    ProjectFetch,
    /// Filter once in the orchestrator, before any section renders.
    RenderTime,
}

impl ExclusionPolicy {
    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "project-fetch" => Ok(Self::ProjectFetch),
            "render-time" => Ok(Self::RenderTime),
            other => Err(anyhow::anyhow!(
                "unknown EXCLUSION_APPLIED_AT value '{}' (expected 'project-fetch' or 'render-time')",
                other
            )),
        }
    }
}

/// Which issues count as bugs for the "since last week" list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BugPredicate {
    /// Issues carrying a "Bug" label or a triage timestamp.
    LabelOrTriage,
    /// Issues carrying a triage timestamp only.
    TriageOnly,
}

impl BugPredicate {
    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "label-or-triage" => Ok(Self::LabelOrTriage),
            "triage-only" => Ok(Self::TriageOnly),
            other => Err(anyhow::anyhow!(
                "unknown BUG_LIST_PREDICATE value '{}' (expected 'label-or-triage' or 'triage-only')",
                other
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    // Tracking service
    pub linear_api_key: String,
    pub team_id: String,

    // Report header
    pub team_name: String,
    pub team_link: String,

    // Project filtering
    pub excluded_projects: Vec<String>,
    pub exclusion_applied_at: ExclusionPolicy,
    pub bug_list_predicate: BugPredicate,

    // LLM Configuration
    pub openai_api_key: String,
    pub openai_model: String,

    // Logging
    pub log_level: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();

        Ok(Self {
            // Tracking service
            linear_api_key: require_var("LINEAR_API_KEY")?,
            team_id: require_var("LINEAR_TEAM_ID")?,

            // Report header
            team_name: env::var("TEAM_NAME").unwrap_or_default(),
            team_link: env::var("TEAM_LINK").unwrap_or_default(),

            // Project filtering
            excluded_projects: split_exclusions(
                &env::var("EXCLUDED_PROJECTS").unwrap_or_default(),
            ),
            exclusion_applied_at: ExclusionPolicy::parse(
                &env::var("EXCLUSION_APPLIED_AT")
                    .unwrap_or_else(|_| "project-fetch".to_string()),
            )?,
            bug_list_predicate: BugPredicate::parse(
                &env::var("BUG_LIST_PREDICATE")
                    .unwrap_or_else(|_| "label-or-triage".to_string()),
            )?,

            // LLM Configuration
            openai_api_key: require_var("OPENAI_API_KEY")?,
            openai_model: env::var("OPENAI_MODEL")
                .unwrap_or_else(|_| "gpt-4-turbo".to_string()),

            // Logging
            log_level: env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.linear_api_key.is_empty() {
            return Err(anyhow::anyhow!("LINEAR_API_KEY cannot be empty"));
        }

        if self.team_id.is_empty() {
            return Err(anyhow::anyhow!("LINEAR_TEAM_ID cannot be empty"));
        }

        if self.openai_api_key.is_empty() {
            return Err(anyhow::anyhow!("OPENAI_API_KEY cannot be empty"));
        }

        Ok(())
    }
}

/// Split a semicolon-delimited exclusion list, dropping blank entries.
pub fn split_exclusions(raw: &str) -> Vec<String> {
    raw.split(';')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| entry.to_string())
        .collect()
}

fn require_var(name: &str) -> Result<String> {
    env::var(name).map_err(|_| anyhow::anyhow!("{} must be set", name))
}

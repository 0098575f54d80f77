use anyhow::Result;
use swarms_rs::{llm::provider::openai::OpenAI, structs::agent::Agent};

use crate::clients::Issue;
use crate::config::Config;

const REWRITE_SYSTEM_PROMPT: &str = "You are an editor for engineering status reports. \
The user message contains an issue title and its description. Rewrite the title so it \
reads well in a report: more readable, action-oriented, and roughly the same length as \
the original.

CRITICAL: Respond with ONLY the rewritten title. No labels, no quotes, no commentary.";

/// Rewrites issue titles through the language model.
#[allow(async_fn_in_trait)]
pub trait TitleEnhancer {
    async fn enhance_title(&self, issue: &Issue) -> Result<String>;
}

pub struct TitleAgent {
    api_key: String,
    model: String,
}

impl TitleAgent {
    pub fn new(config: &Config) -> Self {
        Self {
            api_key: config.openai_api_key.clone(),
            model: config.openai_model.clone(),
        }
    }

    /// Build a single-shot agent. Each rewrite gets its own agent so calls in
    /// a batch can run concurrently.
    fn build_agent(&self) -> Box<dyn Agent> {
        let client = OpenAI::new(self.api_key.clone()).set_model(self.model.as_str());

        let agent = client
            .agent_builder()
            .agent_name("TitleRewriteAgent")
            .system_prompt(REWRITE_SYSTEM_PROMPT.to_string())
            .user_name("Reporter")
            .max_loops(1)  // One candidate per title
            .temperature(0.7)  // Some variability in phrasing
            .max_tokens(64)  // Titles only
            .build();

        Box::new(agent)
    }
}

impl TitleEnhancer for TitleAgent {
    async fn enhance_title(&self, issue: &Issue) -> Result<String> {
        let prompt = format!(
            "Title: {}\n\nDescription: {}",
            issue.title,
            issue.description.as_deref().unwrap_or("")
        );

        let mut agent = self.build_agent();
        match agent.run(prompt).await {
            Ok(response) => Ok(clean_response(&response, &issue.title)),
            Err(e) => {
                tracing::error!("title rewrite failed for {}: {}", issue.identifier, e);
                Err(anyhow::anyhow!(
                    "title rewrite failed for {}: {}",
                    issue.identifier,
                    e
                ))
            }
        }
    }
}

/// Use the model's rewrite when it produced one, minus its first embedded
/// newline; fall back to the original title otherwise.
pub fn clean_response(response: &str, original_title: &str) -> String {
    if response.trim().is_empty() {
        original_title.to_string()
    } else {
        response.replacen('\n', "", 1)
    }
}

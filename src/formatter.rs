use crate::clients::{Project, WorkflowState};

pub struct ReportFormatter;

impl ReportFormatter {
    pub fn new() -> Self {
        Self
    }

    /// Report header: team display name plus link.
    pub fn format_header(&self, team_name: &str, team_link: &str) -> String {
        format!(
            "# ☀️ Weekly Update: {}\n[{}]({})",
            team_name, team_name, team_link
        )
    }

    pub fn progress_heading(&self) -> &'static str {
        "## ✅ Progress from last cycle"
    }

    pub fn bugs_heading(&self) -> &'static str {
        "## 🐛 Bugs since last week"
    }

    pub fn preview_heading(&self) -> &'static str {
        "## 🔜 Next cycle"
    }

    /// One bulleted issue line: `- <title> ([<code>](<url>))`.
    pub fn format_issue_entry(&self, title: &str, identifier: &str, url: &str) -> String {
        format!("- {} ([{}]({}))", title, identifier, url)
    }

    /// Subsection for one project's progress in the previous cycle.
    pub fn format_project_section(&self, project: &Project, entries: &[String]) -> String {
        format!(
            "### {}\n🟢 On track\n[{}]({})\n{}",
            project.name,
            project.name,
            project.url,
            entries.join("\n")
        )
    }

    /// Nested-list preview of one project's issues in the current cycle.
    pub fn format_project_preview(&self, project: &Project, entries: &[String]) -> String {
        let mut lines = vec![format!("- {}", project.name)];
        for entry in entries {
            lines.push(format!("  {}", entry));
        }
        lines.join("\n")
    }

    /// Display annotation for a bug-list entry's workflow state.
    pub fn state_annotation(&self, state: WorkflowState) -> &'static str {
        match state {
            WorkflowState::Completed => "✅ **DONE** → ",
            WorkflowState::Started => "🏃 **WIP** → ",
            WorkflowState::Canceled => "🚫 **CANCELED** → ",
            WorkflowState::Triaged | WorkflowState::Unstarted | WorkflowState::Other => "",
        }
    }

    pub fn format_bug_entry(
        &self,
        state: WorkflowState,
        title: &str,
        identifier: &str,
        url: &str,
    ) -> String {
        format!(
            "- {}{} ([{}]({}))",
            self.state_annotation(state),
            title,
            identifier,
            url
        )
    }

    /// Static sections left for manual completion.
    pub fn format_placeholder_sections(&self) -> String {
        [
            "## ⚠️ Problems",
            "Any challenges and issues",
            "",
            "## 💬 Team Pulse",
            "Any challenges and issues",
        ]
        .join("\n")
    }
}

use std::io::Write;

use anyhow::Result;
use chrono::{Datelike, Duration, NaiveDate};
use futures::future::{try_join, try_join_all};

use crate::agents::TitleEnhancer;
use crate::clients::{Issue, IssueTracker, filter_excluded, select_current_and_previous};
use crate::config::{Config, ExclusionPolicy};
use crate::formatter::ReportFormatter;

/// Drives one report run: resolves the current and previous cycle, gathers
/// per-project issue lists, and writes the sections in a fixed order.
pub struct ReportOrchestrator<T, E> {
    config: Config,
    tracker: T,
    enhancer: E,
    formatter: ReportFormatter,
}

impl<T: IssueTracker, E: TitleEnhancer> ReportOrchestrator<T, E> {
    pub fn new(config: Config, tracker: T, enhancer: E) -> Self {
        Self {
            config,
            tracker,
            enhancer,
            formatter: ReportFormatter::new(),
        }
    }

    /// Assemble the report and emit it section by section. Sections are
    /// strictly sequential; fan-out happens only within a batch.
    pub async fn write_report<W: Write>(&self, out: &mut W, today: NaiveDate) -> Result<()> {
        tracing::info!("generating report for team {}", self.config.team_id);

        let cycles = self.tracker.list_cycles(&self.config.team_id).await?;
        let (current, previous) = select_current_and_previous(&cycles)?;

        // One eligible project set, shared by both cycle sections
        let fetch_exclusions: &[String] = match self.config.exclusion_applied_at {
            ExclusionPolicy::ProjectFetch => &self.config.excluded_projects,
            ExclusionPolicy::RenderTime => &[],
        };
        let projects = self
            .tracker
            .list_projects(&self.config.team_id, fetch_exclusions)
            .await?;
        let eligible = match self.config.exclusion_applied_at {
            ExclusionPolicy::ProjectFetch => projects,
            ExclusionPolicy::RenderTime => {
                filter_excluded(projects, &self.config.excluded_projects)
            }
        };

        writeln!(
            out,
            "{}",
            self.formatter
                .format_header(&self.config.team_name, &self.config.team_link)
        )?;
        writeln!(out)?;

        // Previous-cycle progress, one subsection per project with issues
        writeln!(out, "{}", self.formatter.progress_heading())?;
        if let Some(previous) = &previous {
            for project in &eligible {
                let issues = self
                    .tracker
                    .list_issues_for_project_and_cycle(&project.id, &previous.id)
                    .await?;
                if issues.is_empty() {
                    continue;
                }

                let entries = self.enhanced_entries(&issues).await?;
                writeln!(
                    out,
                    "{}",
                    self.formatter.format_project_section(project, &entries)
                )?;
                writeln!(out)?;
            }
        }

        // Bugs created since last week's Monday
        let since = last_week_monday(today);
        let flagged = self
            .tracker
            .list_recent_flagged_issues(&self.config.team_id, since)
            .await?;
        tracing::debug!("{} flagged issues since {}", flagged.len(), since);

        let bug_entries = try_join_all(flagged.iter().map(|issue| {
            let pair = try_join(
                self.enhancer.enhance_title(issue),
                self.tracker.resolve_issue_state(issue),
            );
            async move {
                let (title, state) = pair.await?;
                Ok::<_, anyhow::Error>(self.formatter.format_bug_entry(
                    state,
                    &title,
                    &issue.identifier,
                    &issue.url,
                ))
            }
        }))
        .await?;

        writeln!(out, "{}", self.formatter.bugs_heading())?;
        for entry in &bug_entries {
            writeln!(out, "{}", entry)?;
        }
        writeln!(out)?;

        writeln!(out, "{}", self.formatter.format_placeholder_sections())?;
        writeln!(out)?;

        // Current-cycle preview as a nested list
        writeln!(out, "{}", self.formatter.preview_heading())?;
        for project in &eligible {
            let issues = self
                .tracker
                .list_issues_for_project_and_cycle(&project.id, &current.id)
                .await?;
            if issues.is_empty() {
                continue;
            }

            let entries = self.enhanced_entries(&issues).await?;
            writeln!(
                out,
                "{}",
                self.formatter.format_project_preview(project, &entries)
            )?;
        }

        Ok(())
    }

    /// Enhance every title in the batch concurrently, then format the
    /// bulleted entries once all rewrites have resolved.
    async fn enhanced_entries(&self, issues: &[Issue]) -> Result<Vec<String>> {
        let titles = try_join_all(
            issues
                .iter()
                .map(|issue| self.enhancer.enhance_title(issue)),
        )
        .await?;

        Ok(issues
            .iter()
            .zip(titles)
            .map(|(issue, title)| {
                self.formatter
                    .format_issue_entry(&title, &issue.identifier, &issue.url)
            })
            .collect())
    }
}

/// The Monday one full week before the most recent Monday. Sunday counts as
/// the seventh day of the week, not the zeroth.
pub fn last_week_monday(today: NaiveDate) -> NaiveDate {
    let days_into_week = i64::from(today.weekday().number_from_monday()) - 1;
    today - Duration::days(days_into_week + 7)
}

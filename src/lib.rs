pub mod config;
pub mod clients;
pub mod agents;
pub mod orchestrator;
pub mod formatter;

pub use config::{BugPredicate, Config, ExclusionPolicy};
pub use clients::{Cycle, Issue, IssueTracker, LinearClient, Project, WorkflowState};
pub use agents::{TitleAgent, TitleEnhancer};
pub use orchestrator::{ReportOrchestrator, last_week_monday};
pub use formatter::ReportFormatter;

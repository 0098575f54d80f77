// Tracking-service client and data model
pub mod linear;

pub use linear::{
    Cycle, Issue, IssueTracker, Label, LabelConnection, LinearClient, Project, StateNode,
    WorkflowState, filter_excluded, is_excluded, select_current_and_previous,
};

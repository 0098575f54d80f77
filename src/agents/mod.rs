// Language-model agent for title rewriting
pub mod title;

pub use title::{TitleAgent, TitleEnhancer, clean_response};

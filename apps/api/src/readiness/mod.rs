pub mod evaluator;
pub mod handlers;
pub mod prompts;
pub mod stage;
pub mod store;
pub mod workflow;

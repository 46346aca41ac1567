pub mod assistant;
pub mod handlers;
pub mod history;
pub mod prompts;
pub mod rules;
pub mod suggest;

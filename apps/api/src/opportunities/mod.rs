// Opportunity listings: owner-checked CRUD plus discovery.

pub mod discovery;
pub mod fields;
pub mod handlers;
pub mod store;
pub mod validation;

// Applications against opportunities: one per (opportunity, applicant) pair.

pub mod access;
pub mod handlers;
pub mod store;

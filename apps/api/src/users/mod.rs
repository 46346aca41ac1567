// Identity & role store: user records keyed by Firebase uid.

pub mod handlers;
pub mod store;

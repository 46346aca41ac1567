pub mod application;
pub mod assessment;
pub mod opportunity;
pub mod timestamp;
pub mod user;
